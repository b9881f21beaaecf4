// Core cases module - reviewable suspected-minor cases.

pub mod case_log;

pub use case_log::*;
