pub mod controller;
pub mod debounce;
pub mod engine;
pub mod loop_worker;

pub use controller::{CaptureController, CaptureHandle};
pub use debounce::{is_internal_page, Debouncer, Decision, LastEmitted, Trigger};
pub use engine::{CaptureEngine, StatusReport};
