pub mod machine;
pub mod state;

pub use machine::{Reconciliation, TrackingMachine, TrackingStatus};
pub use state::{format_duration, CurrentWindow, RemoteStatus, TrackingAction, TrackingState};
