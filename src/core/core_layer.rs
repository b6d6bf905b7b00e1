// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "auth/mod.rs"]
pub mod auth;

#[path = "sheets/mod.rs"]
pub mod sheets;

#[path = "roster/roster_service.rs"]
pub mod roster;
