//! Mount orchestration.
//!
//! [`MountController`] runs the setup sequence on the caller's thread and
//! hands the bridge server to a dedicated worker. The returned
//! [`GuestMount`] owns that worker and stops it on `stop()` or drop.

mod controller;
mod handle;
mod state;
mod types;

pub use controller::MountController;
pub use handle::GuestMount;
pub use state::{MountState, MountStatus};
pub use types::{MountEndpoint, MountId};
