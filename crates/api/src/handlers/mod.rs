//! Request handlers.
//!
//! Each submodule groups the handlers of one route family. Handlers delegate
//! to the engine components held in [`AppState`](crate::state::AppState) and
//! map errors via [`AppError`](crate::error::AppError).

pub mod dashboard;
pub mod file_system;
pub mod syncs;
pub mod tracked_apps;
