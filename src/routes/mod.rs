pub mod matches;
pub mod polls;
