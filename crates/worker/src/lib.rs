//! Worker primitives shared by the tint highlighting engine.
//!
//! Everything that leaves the owner thread goes through here: classified task
//! spawning, lifetime tokens that stop a component's tasks on disposal, and the
//! [`KeyedDebouncer`] that coalesces bursts of per-key requests.

mod class;
pub mod debounce;
mod spawn;
mod token;

pub use class::TaskClass;
pub use debounce::{DebounceHandler, KeyedDebouncer, SubmitOutcome};
pub use spawn::spawn;
pub use token::{GenerationClock, LifetimeToken};
