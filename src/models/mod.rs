pub mod context;
pub mod event;

pub use context::{Context, TabRef};
pub use event::{ActivityEvent, EventType};
