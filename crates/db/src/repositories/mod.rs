//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&DbPool` as the first argument.

pub mod backup_repo;
pub mod tracked_app_repo;

pub use backup_repo::BackupRepo;
pub use tracked_app_repo::TrackedAppRepo;
