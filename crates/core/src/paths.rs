//! Path normalization and backup file naming.
//!
//! Tracked paths are compared by their normalized form: absolute, `~`
//! expanded, `.`/`..` folded, symlinks resolved wherever the path exists and
//! no trailing separator. Two inputs naming the same directory therefore
//! collide on the `tracked_apps.path` uniqueness check.

use std::path::{Component, Path, PathBuf};

use crate::error::CoreError;
use crate::types::SyncId;

/// File extension of produced archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Normalize a user-supplied directory path.
///
/// The directory does not have to exist. Components are resolved left to
/// right, so a `..` after a symlink climbs out of the link's target; once a
/// component is missing the rest is folded lexically.
pub fn normalize_path(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Path must not be empty".into()));
    }

    let expanded = expand_home(trimmed);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| CoreError::Internal(format!("Cannot read working directory: {e}")))?;
        cwd.join(expanded)
    };

    Ok(resolve_components(&absolute).to_string_lossy().into_owned())
}

/// Base name of a tracked directory, used as the archive root entry and the
/// per-app backup folder name.
pub fn app_name(path: &str) -> Result<String, CoreError> {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            CoreError::Validation(format!("Path '{path}' has no final directory name"))
        })
}

/// `{backups_root}/{app_name}` -- the stable directory holding every archive
/// of one app.
pub fn app_backup_dir(backups_root: &Path, app_name: &str) -> PathBuf {
    backups_root.join(app_name)
}

/// `{backups_root}/{app_name}/{sync_id}_{app_name}.zip`
pub fn archive_path(backups_root: &Path, app_name: &str, sync_id: SyncId) -> PathBuf {
    app_backup_dir(backups_root, app_name).join(format!(
        "{sync_id}_{app_name}.{ARCHIVE_EXTENSION}"
    ))
}

/// Zip entry name for a file at `relative` inside the tracked directory.
///
/// Entries always use `/` and are rooted at the tracked folder's name.
pub fn archive_entry_name(app_name: &str, relative: &Path) -> String {
    let mut name = String::from(app_name);
    for component in relative.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}

/// File-name component of an archive path, as exposed to API clients.
pub fn archive_file_name(archive_path: &str) -> String {
    Path::new(archive_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_path.to_string())
}

fn expand_home(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

/// Fold `.` and `..` while resolving symlinks of every component that
/// exists. `..` never climbs above the root.
fn resolve_components(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                if let Ok(real) = std::fs::canonicalize(&resolved) {
                    resolved = real;
                }
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn strips_trailing_separators() {
        let a = normalize_path("/definitely/not/here/site/").unwrap();
        let b = normalize_path("/definitely/not/here/site").unwrap();
        assert_eq!(a, b);
        assert!(!a.ends_with('/'));
    }

    #[test]
    fn folds_dot_segments() {
        let folded = normalize_path("/definitely/not/./here/../here/site").unwrap();
        assert_eq!(folded, "/definitely/not/here/site");
    }

    #[test]
    fn parent_segments_stop_at_root() {
        assert_eq!(normalize_path("/../../").unwrap(), "/");
    }

    #[test]
    fn relative_paths_become_absolute() {
        let normalized = normalize_path("some-relative-dir").unwrap();
        assert!(Path::new(&normalized).is_absolute());
        assert!(normalized.ends_with("some-relative-dir"));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_matches!(normalize_path("   "), Err(CoreError::Validation(_)));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_resolve_to_their_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let via_link = normalize_path(link.to_str().unwrap()).unwrap();
        let direct = normalize_path(target.to_str().unwrap()).unwrap();
        assert_eq!(via_link, direct);
    }

    #[cfg(unix)]
    #[test]
    fn missing_tail_keeps_resolved_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = std::fs::canonicalize(dir.path()).unwrap();
        let normalized =
            normalize_path(dir.path().join("not-yet").join("created").to_str().unwrap()).unwrap();
        assert_eq!(
            PathBuf::from(normalized),
            canonical.join("not-yet").join("created")
        );
    }

    #[cfg(unix)]
    #[test]
    fn parent_after_symlink_leaves_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("elsewhere").join("real");
        std::fs::create_dir_all(&real).unwrap();
        std::fs::create_dir(dir.path().join("links")).unwrap();
        let link = dir.path().join("links").join("l");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let normalized = normalize_path(&format!("{}/..", link.display())).unwrap();

        let expected = std::fs::canonicalize(dir.path().join("elsewhere")).unwrap();
        assert_eq!(PathBuf::from(normalized), expected);
    }

    #[test]
    fn tilde_expands_to_home_directory() {
        let Some(home) = dirs::home_dir() else { return };

        let normalized = normalize_path("~/upback-not-created").unwrap();

        assert!(!normalized.starts_with('~'));
        assert!(normalized.ends_with("upback-not-created"));
        let home = std::fs::canonicalize(&home).unwrap_or(home);
        assert_eq!(PathBuf::from(normalized), home.join("upback-not-created"));
    }

    #[test]
    fn app_name_is_the_final_component() {
        assert_eq!(app_name("/data/site").unwrap(), "site");
        assert_matches!(app_name("/"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn archive_path_layout() {
        let id = Uuid::nil();
        let path = archive_path(Path::new("/srv/backups"), "site", id);
        assert_eq!(
            path,
            PathBuf::from(format!("/srv/backups/site/{id}_site.zip"))
        );
        assert_eq!(archive_file_name(path.to_str().unwrap()), format!("{id}_site.zip"));
    }

    #[test]
    fn entry_names_are_rooted_at_app_name() {
        let rel = Path::new("assets").join("css").join("main.css");
        assert_eq!(archive_entry_name("site", &rel), "site/assets/css/main.css");
    }
}
