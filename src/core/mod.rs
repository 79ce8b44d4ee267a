pub mod entry;
pub mod event;
pub mod frame;

pub use entry::{Action, RaceTimeline, RawEntry};
pub use event::RaceEvent;
pub use frame::{AgentSnapshot, Frame};
