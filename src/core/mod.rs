//! Core types shared by every component
//!
//! - Addresses (20-byte identities, `0x` hex encoded)
//! - The error taxonomy and `TokenError`
//! - Notifications and the notification log record

pub mod address;
pub mod error;
pub mod event;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use error::{ErrorKind, TokenError, TokenResult};
pub use event::{Event, EventRecord};
