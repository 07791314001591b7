//! Script discovery in the configured directories.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use nightcheck_core::NightCheckConfig;
use tracing::{debug, warn};

/// Whether a file name qualifies as a script candidate.
///
/// Names must carry an extension, must not be hidden, and must not contain
/// any exclude marker.
pub fn is_candidate_name(name: &str, exclude_markers: &[String]) -> bool {
    name.contains('.')
        && !name.starts_with('.')
        && !exclude_markers
            .iter()
            .any(|m| !m.is_empty() && name.contains(m.as_str()))
}

/// List candidate scripts in one directory (non-recursive).
///
/// Paths keep the directory as configured, made absolute but with symlinks
/// left unresolved, so they match how the crontab names each script.
fn scan_directory(dir: &Path, config: &NightCheckConfig, found: &mut BTreeSet<PathBuf>) {
    let entries = match std::path::absolute(dir).and_then(|abs| fs::read_dir(&abs)) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "skipping directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_candidate_name(name, &config.exclude_markers) {
            debug!(path = %path.display(), "excluded by name");
            continue;
        }
        if config.ignore_files.iter().any(|ignored| ignored == &path) {
            debug!(path = %path.display(), "on ignore list");
            continue;
        }
        found.insert(path);
    }
}

/// Discover scripts across every configured directory.
///
/// Returns absolute paths, sorted and de-duplicated. Missing or unreadable
/// directories are logged and skipped.
pub fn discover_scripts(config: &NightCheckConfig) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    for dir in &config.directories {
        scan_directory(dir, config, &mut found);
    }
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn markers() -> Vec<String> {
        NightCheckConfig::default().exclude_markers
    }

    #[test]
    fn test_candidate_names() {
        let m = markers();
        assert!(is_candidate_name("sync_hosts.py", &m));
        assert!(is_candidate_name("rotate.pl", &m));
        assert!(!is_candidate_name("Makefile", &m));
        assert!(!is_candidate_name(".hidden.py", &m));
        assert!(!is_candidate_name("sync_hosts.pyc", &m));
        assert!(!is_candidate_name(".sync.py.swp", &m));
        assert!(!is_candidate_name("sync_old.py", &m));
        assert!(!is_candidate_name("test_sync.py", &m));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.py", "a.pl", "c.php", "README", "a.pyc", "legacy.old.py"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.d")).unwrap();

        let config = NightCheckConfig {
            directories: vec![dir.path().to_path_buf()],
            ..Default::default()
        };
        let found = discover_scripts(&config);

        let root = dir.path();
        assert_eq!(
            found,
            vec![root.join("a.pl"), root.join("b.py"), root.join("c.php")]
        );
        assert!(found.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_ignore_list_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::write(root.join("keep.py"), "x").unwrap();
        fs::write(root.join("skip.py"), "x").unwrap();

        let config = NightCheckConfig {
            directories: vec![root.clone()],
            ignore_files: vec![root.join("skip.py")],
            ..Default::default()
        };

        assert_eq!(discover_scripts(&config), vec![root.join("keep.py")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_keeps_configured_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("scripts");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();
        fs::write(real.join("job.pl"), "x").unwrap();
        fs::write(real.join("skip.pl"), "x").unwrap();

        let config = NightCheckConfig {
            directories: vec![link.clone()],
            ignore_files: vec![link.join("skip.pl")],
            ..Default::default()
        };

        assert_eq!(discover_scripts(&config), vec![link.join("job.pl")]);
    }

    #[test]
    fn test_relative_directory_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir_in(&cwd).unwrap();
        fs::write(dir.path().join("a.py"), "x").unwrap();
        let relative = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();

        let config = NightCheckConfig {
            directories: vec![relative],
            ..Default::default()
        };

        assert_eq!(discover_scripts(&config), vec![dir.path().join("a.py")]);
    }

    #[traced_test]
    #[test]
    fn test_missing_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x").unwrap();

        let config = NightCheckConfig {
            directories: vec![PathBuf::from("/nonexistent/nightcheck"), dir.path().to_path_buf()],
            ..Default::default()
        };

        assert_eq!(discover_scripts(&config).len(), 1);
        assert!(logs_contain("skipping directory"));
    }
}
