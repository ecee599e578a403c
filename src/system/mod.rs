pub mod counters;
pub mod delta;
pub mod dynamic;
pub mod facts;
pub mod platform;
pub mod snapshot;
pub mod source;
