//! Types shared between the guestmount library and its front ends.

pub mod constants;
pub mod errors;

pub use errors::{BridgeError, BridgeResult};
