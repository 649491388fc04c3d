//! Forty Two Token CLI Application
//!
//! A command-line interface for deploying and operating the multisig-governed
//! token, plus an HTTP API server.

use clap::{Parser, Subcommand};
use fortytwo_token::api::{create_router, ApiState};
use fortytwo_token::cli::{self, AppState};
use fortytwo_token::contract::TokenConfig;
use fortytwo_token::core::Address;
use fortytwo_token::storage::{Storage, StorageConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "f42t")]
#[command(version = "0.1.0")]
#[command(about = "Forty Two Token: a fungible token governed by an N-of-M multisig", long_about = None)]
struct Cli {
    /// Data directory for token state
    #[arg(short, long, default_value = ".f42t_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new token
    Deploy {
        /// Deployer address; receives the initial supply and ownership
        #[arg(long)]
        deployer: Address,

        /// JSON config file (fields not given fall back to defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Multisig signers (comma-separated)
        #[arg(long, value_delimiter = ',')]
        signers: Vec<Address>,

        /// Required confirmations
        #[arg(long)]
        required: Option<usize>,

        /// Initial supply in whole tokens
        #[arg(long)]
        supply: Option<u128>,

        /// Keep the owner's direct mint path
        #[arg(long)]
        owner_mint: bool,

        /// Replace an existing deployment
        #[arg(long)]
        force: bool,
    },

    /// Show token information
    Info,

    /// Show a holder's balance
    Balance {
        #[arg(short, long)]
        address: Address,
    },

    /// Show an allowance
    Allowance {
        #[arg(long)]
        owner: Address,

        #[arg(long)]
        spender: Address,
    },

    /// List holders by balance
    Holders {
        /// Number of holders to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Transfer tokens from the caller
    Transfer {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        to: Address,

        /// Raw amount (smallest unit)
        #[arg(short, long)]
        amount: u128,
    },

    /// Set the caller's allowance for a spender
    Approve {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        spender: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Spend an allowance granted by `from`
    TransferFrom {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        from: Address,

        #[arg(long)]
        to: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Burn from the caller's balance
    Burn {
        #[arg(long)]
        caller: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Direct owner mint (only when enabled at deployment)
    Mint {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        to: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Direct ownership transfer by the owner
    TransferOwnership {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        new_owner: Address,
    },

    /// Multisig operations
    Multisig {
        #[command(subcommand)]
        action: MultisigCommands,
    },

    /// Print the notification log
    Events {
        /// First sequence number to show
        #[arg(long, default_value = "0")]
        from: u64,
    },

    /// Check the supply and multisig invariants
    Validate,

    /// Export token state to file
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import token state from file
    Import {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Restore a backup of the token state (0 = most recent)
    Restore {
        #[arg(short, long, default_value = "0")]
        index: usize,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum MultisigCommands {
    /// Show signers and threshold
    Signers,

    /// Add a signer (owner only)
    AddSigner {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        signer: Address,
    },

    /// Remove a signer (owner only)
    RemoveSigner {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        signer: Address,
    },

    /// Change the required confirmations (owner only)
    SetRequired {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        required: usize,
    },

    /// Propose minting new tokens
    ProposeMint {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        target: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Propose an ownership transfer
    ProposeOwnership {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        target: Address,
    },

    /// Confirm a proposal
    Confirm {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        id: u64,
    },

    /// Revoke a confirmation
    Revoke {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        id: u64,
    },

    /// Execute a proposal that has reached quorum
    Execute {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        id: u64,
    },

    /// List proposals
    List {
        /// Only show proposals not yet executed
        #[arg(long)]
        pending: bool,
    },

    /// Show one proposal
    Show {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on for REST API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            deployer,
            config,
            signers,
            required,
            supply,
            owner_mint,
            force,
        } => {
            let mut config = match config {
                Some(path) => TokenConfig::from_file(&path)?,
                None => TokenConfig::default(),
            };
            if !signers.is_empty() {
                config.signers = signers;
            }
            if let Some(required) = required {
                config.required_signatures = required;
            }
            if let Some(supply) = supply {
                config.initial_supply = supply;
            }
            if owner_mint {
                config.owner_mint_enabled = true;
            }

            return cli::cmd_deploy(&cli.data_dir, deployer, config, force);
        }
        Commands::Import { input } => return cli::cmd_import(&cli.data_dir, &input),
        Commands::Api { action } => return run_api_command(&action, &cli.data_dir),
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Deploy { .. } | Commands::Import { .. } | Commands::Api { .. } => {
            unreachable!()
        }

        Commands::Info => cli::cmd_info(&state)?,
        Commands::Balance { address } => cli::cmd_balance(&state, &address)?,
        Commands::Allowance { owner, spender } => cli::cmd_allowance(&state, &owner, &spender)?,
        Commands::Holders { count } => cli::cmd_holders(&state, count)?,

        Commands::Transfer { caller, to, amount } => {
            cli::cmd_transfer(&mut state, &caller, &to, amount)?;
        }
        Commands::Approve {
            caller,
            spender,
            amount,
        } => {
            cli::cmd_approve(&mut state, &caller, &spender, amount)?;
        }
        Commands::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&mut state, &caller, &from, &to, amount)?;
        }
        Commands::Burn { caller, amount } => cli::cmd_burn(&mut state, &caller, amount)?,
        Commands::Mint { caller, to, amount } => {
            cli::cmd_mint(&mut state, &caller, &to, amount)?;
        }
        Commands::TransferOwnership { caller, new_owner } => {
            cli::cmd_transfer_ownership(&mut state, &caller, &new_owner)?;
        }

        Commands::Multisig { action } => match action {
            MultisigCommands::Signers => cli::cmd_signers(&state)?,
            MultisigCommands::AddSigner { caller, signer } => {
                cli::cmd_add_signer(&mut state, &caller, &signer)?;
            }
            MultisigCommands::RemoveSigner { caller, signer } => {
                cli::cmd_remove_signer(&mut state, &caller, &signer)?;
            }
            MultisigCommands::SetRequired { caller, required } => {
                cli::cmd_set_required(&mut state, &caller, required)?;
            }
            MultisigCommands::ProposeMint {
                caller,
                target,
                amount,
            } => {
                cli::cmd_propose_mint(&mut state, &caller, &target, amount)?;
            }
            MultisigCommands::ProposeOwnership { caller, target } => {
                cli::cmd_propose_ownership(&mut state, &caller, &target)?;
            }
            MultisigCommands::Confirm { caller, id } => cli::cmd_confirm(&mut state, &caller, id)?,
            MultisigCommands::Revoke { caller, id } => cli::cmd_revoke(&mut state, &caller, id)?,
            MultisigCommands::Execute { caller, id } => cli::cmd_execute(&mut state, &caller, id)?,
            MultisigCommands::List { pending } => cli::cmd_transactions(&state, pending)?,
            MultisigCommands::Show { id } => cli::cmd_transaction(&state, id)?,
        },

        Commands::Events { from } => cli::cmd_events(&state, from)?,
        Commands::Validate => cli::cmd_validate(&state)?,
        Commands::Export { output } => cli::cmd_export(&state, &output)?,
        Commands::Restore { index } => cli::cmd_restore(&mut state, index)?,
    }

    Ok(())
}

fn run_api_command(action: &ApiCommands, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match action {
            ApiCommands::Start { port } => {
                let storage = Storage::new(StorageConfig::in_dir(data_dir))?;

                if !storage.exists() {
                    return Err(format!(
                        "No token deployed in {:?}. Run `f42t deploy` first.",
                        data_dir
                    )
                    .into());
                }

                println!("📂 Loading token state...");
                let contract = storage.load()?;
                println!(
                    "   {} ({}) at {}",
                    contract.name(),
                    contract.symbol(),
                    contract.address
                );

                let state = ApiState::new(contract, storage);
                let shutdown_state = state.clone();
                let app = create_router(state);

                let addr = format!("0.0.0.0:{}", port);
                println!("🚀 REST API server starting on http://localhost:{}", port);

                println!();
                println!("📖 Available endpoints:");
                println!("   GET  /health                                  - Health check");
                println!("   GET  /ws                                      - WebSocket notifications");
                println!("   GET  /api/token                               - Token info");
                println!("   GET  /api/token/balance/{{holder}}              - Balance");
                println!("   GET  /api/token/allowance?owner=&spender=     - Allowance");
                println!("   GET  /api/token/holders                       - Holders");
                println!("   POST /api/token/transfer                      - Transfer");
                println!("   POST /api/token/approve                       - Approve");
                println!("   POST /api/token/transfer-from                 - Transfer from");
                println!("   POST /api/token/burn                          - Burn");
                println!("   POST /api/token/mint                          - Owner mint");
                println!("   POST /api/token/ownership                     - Transfer ownership");
                println!("   GET  /api/multisig                            - Signers & threshold");
                println!("   POST /api/multisig/signers                    - Add signer");
                println!("   POST /api/multisig/signers/remove             - Remove signer");
                println!("   POST /api/multisig/required                   - Set threshold");
                println!("   GET  /api/multisig/transactions               - List proposals");
                println!("   POST /api/multisig/transactions/mint          - Propose mint");
                println!("   POST /api/multisig/transactions/ownership     - Propose ownership");
                println!("   POST /api/multisig/transactions/{{id}}/confirm  - Confirm");
                println!("   POST /api/multisig/transactions/{{id}}/revoke   - Revoke");
                println!("   POST /api/multisig/transactions/{{id}}/execute  - Execute");
                println!("   GET  /api/events?from=N                       - Notification log");
                println!("   GET  /api/validate                            - Invariant check");
                println!();

                // Handle Ctrl+C with graceful shutdown
                tokio::spawn(async move {
                    tokio::signal::ctrl_c().await.ok();
                    println!("\n📴 Shutting down API server...");

                    let contract = shutdown_state.contract.read().await;
                    match shutdown_state.storage.save(&contract) {
                        Ok(()) => println!("✅ Token state saved"),
                        Err(e) => log::error!("Failed to save token state: {}", e),
                    }
                    std::process::exit(0);
                });

                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await?;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
