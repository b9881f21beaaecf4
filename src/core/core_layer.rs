// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "age_check/mod.rs"]
pub mod age_check;

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "cases/mod.rs"]
pub mod cases;
