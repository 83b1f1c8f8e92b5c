// events/bus/mod.rs
//
// Event bus module
//
// CRITICAL: the BoxedHandler type alias is internal and must NOT be exported

pub mod event_bus;

pub use event_bus::{EventBus, EventLogEntry};
