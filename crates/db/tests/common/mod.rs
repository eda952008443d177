use tempfile::TempDir;
use upback_db::DbPool;

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
