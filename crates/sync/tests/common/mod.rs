#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use upback_db::models::tracked_app::{CreateTrackedApp, TrackedApp};
use upback_db::DbPool;
use upback_sync::{Engine, SyncConfig};

/// Create a migrated pool backed by a database file in a fresh temp dir.
///
/// The returned `TempDir` must be kept alive for as long as the pool is used.
pub async fn test_pool() -> (DbPool, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = format!("sqlite://{}", dir.path().join("upback.db").display());
    let pool = upback_db::create_pool(&url).await.expect("create pool");
    upback_db::run_migrations(&pool)
        .await
        .expect("run migrations");
    (pool, dir)
}

/// An engine over a throwaway database, backups root and source area.
pub struct TestEngine {
    pub engine: Engine,
    pub pool: DbPool,
    pub backups: TempDir,
    pub sources: TempDir,
    _db: TempDir,
}

impl TestEngine {
    pub async fn new() -> Self {
        let (pool, db) = test_pool().await;
        let backups = tempfile::tempdir().expect("create backups dir");
        let sources = tempfile::tempdir().expect("create sources dir");

        let mut config = SyncConfig::new(backups.path());
        config.progress_interval = Duration::from_millis(20);
        config.scheduler_tick = Duration::from_millis(20);

        Self {
            engine: Engine::new(pool.clone(), &config),
            pool,
            backups,
            sources,
            _db: db,
        }
    }

    /// Path of `name` inside the source area. Nothing is created.
    pub fn source(&self, name: &str) -> PathBuf {
        self.sources.path().join(name)
    }

    /// Create directory `name` populated with `files` (relative path, body).
    pub fn tree(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let root = self.source(name);
        write_tree(&root, files);
        root
    }

    pub async fn register(&self, path: &Path, auto_update: bool, cron: &str) -> TrackedApp {
        self.engine
            .registry
            .register(CreateTrackedApp {
                path: path.to_string_lossy().into_owned(),
                auto_update,
                cron: cron.to_string(),
            })
            .await
            .expect("register app")
    }
}

pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    std::fs::create_dir_all(root).expect("create tree root");
    for (relative, body) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, body).expect("write file");
    }
}

/// Entry names of the zip at `path`, sorted.
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).expect("open archive");
    let archive = zip::ZipArchive::new(file).expect("read archive");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
