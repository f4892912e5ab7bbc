pub use collector::*;
pub use scheduler::*;
pub use snapshot::*;

pub mod config;
pub mod snmp;

mod collector;
mod scheduler;
mod snapshot;
