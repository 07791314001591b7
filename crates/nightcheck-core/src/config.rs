//! NightCheck configuration.
//!
//! A single immutable [`NightCheckConfig`] describes what to scan and how to
//! check it: the directories and ignore list used by discovery, the crontab
//! user, the subprocess timeout, and the ordered per-family table of
//! declaration patterns, syntax commands and extensions.
//!
//! Configuration is loaded from TOML; [`NightCheckConfig::default`] provides
//! the stock python/python3/perl/php table.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::error::{CheckError, Result};
use crate::domain::family::Family;

/// Placeholder replaced by the script path in a syntax command.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Per-family checking rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FamilyConfig {
    /// Family these rules apply to.
    pub family: Family,

    /// Regex matched against the first line to pick this family when
    /// several families share an extension.
    #[serde(default)]
    pub declaration: Option<String>,

    /// Compile-only command (first element is the executable).
    /// Empty means the family is recognised but not checked.
    #[serde(default)]
    pub syntax_command: Vec<String>,

    /// File extensions, without the leading dot.
    pub extensions: Vec<String>,

    /// Accumulate error blocks from logs in scanning mode.
    #[serde(default)]
    pub scan_error_blocks: bool,

    /// Log lines containing any of these never enter an excerpt.
    #[serde(default)]
    pub ignore_markers: Vec<String>,
}

impl FamilyConfig {
    /// Whether scripts of this family can be syntax-checked.
    pub fn is_supported(&self) -> bool {
        !self.syntax_command.is_empty()
    }

    /// Whether `path` carries one of this family's extensions.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|e| e.trim_start_matches('.') == ext)
            })
            .unwrap_or(false)
    }

    /// Compile the declaration pattern, if any.
    pub fn declaration_regex(&self) -> Result<Option<Regex>> {
        self.declaration
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| CheckError::InvalidPattern {
                    family: self.family.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Build the syntax-check argv for `path`.
    ///
    /// `{path}` placeholders are substituted; without one, the path is
    /// appended as the last argument.
    pub fn syntax_argv(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        let mut substituted = false;
        let mut argv: Vec<String> = self
            .syntax_command
            .iter()
            .map(|arg| {
                if arg.contains(PATH_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(PATH_PLACEHOLDER, &path)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted && !argv.is_empty() {
            argv.push(path.into_owned());
        }
        argv
    }
}

/// Complete NightCheck configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NightCheckConfig {
    /// User whose crontab is inspected.
    #[serde(default = "default_scheduler_user")]
    pub scheduler_user: String,

    /// Directories scanned (non-recursively) for scripts.
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// Absolute paths never checked.
    #[serde(default)]
    pub ignore_files: Vec<PathBuf>,

    /// File names containing any of these substrings are skipped.
    #[serde(default = "default_exclude_markers")]
    pub exclude_markers: Vec<String>,

    /// Timeout applied to every subprocess.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Per-family rules, in resolution order.
    #[serde(default = "default_families")]
    pub families: Vec<FamilyConfig>,
}

fn default_scheduler_user() -> String {
    "netmgt_user".to_string()
}

fn default_exclude_markers() -> Vec<String> {
    ["pyc", "swp", "old", "test"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_command_timeout_secs() -> u64 {
    60
}

fn default_families() -> Vec<FamilyConfig> {
    vec![
        FamilyConfig {
            family: Family::Python,
            declaration: Some(r"^#!/.*python$".to_string()),
            syntax_command: vec![
                "/usr/bin/python".to_string(),
                "-m".to_string(),
                "py_compile".to_string(),
                PATH_PLACEHOLDER.to_string(),
            ],
            extensions: vec!["py".to_string()],
            scan_error_blocks: true,
            ignore_markers: vec!["ERROR".to_string()],
        },
        FamilyConfig {
            family: Family::Python3,
            declaration: Some(r"^#!/.*python3$".to_string()),
            syntax_command: vec![
                "/usr/bin/python3".to_string(),
                "-m".to_string(),
                "py_compile".to_string(),
                PATH_PLACEHOLDER.to_string(),
            ],
            extensions: vec!["py".to_string()],
            scan_error_blocks: true,
            ignore_markers: vec!["ERROR".to_string()],
        },
        FamilyConfig {
            family: Family::Perl,
            declaration: Some(r"^#!/.*perl".to_string()),
            syntax_command: vec![
                "/usr/bin/perl".to_string(),
                "-c".to_string(),
                PATH_PLACEHOLDER.to_string(),
            ],
            extensions: vec!["pl".to_string()],
            scan_error_blocks: false,
            ignore_markers: Vec::new(),
        },
        FamilyConfig {
            family: Family::Php,
            declaration: None,
            syntax_command: Vec::new(),
            extensions: vec!["php".to_string()],
            scan_error_blocks: false,
            ignore_markers: Vec::new(),
        },
    ]
}

impl Default for NightCheckConfig {
    fn default() -> Self {
        Self {
            scheduler_user: default_scheduler_user(),
            directories: Vec::new(),
            ignore_files: Vec::new(),
            exclude_markers: default_exclude_markers(),
            command_timeout_secs: default_command_timeout_secs(),
            families: default_families(),
        }
    }
}

impl NightCheckConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: NightCheckConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CheckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for family in &self.families {
            if family.family == Family::Unclassified {
                return Err(CheckError::InvalidConfig(
                    "the unclassified bucket cannot be configured".to_string(),
                ));
            }
            if !seen.insert(family.family) {
                return Err(CheckError::DuplicateFamily {
                    family: family.family.to_string(),
                });
            }
            if family.extensions.is_empty() {
                return Err(CheckError::InvalidConfig(format!(
                    "family {} has no extensions",
                    family.family
                )));
            }
            family.declaration_regex()?;
        }
        if self.command_timeout_secs == 0 {
            return Err(CheckError::InvalidConfig(
                "command_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Look up the rules for a family.
    pub fn family(&self, family: Family) -> Option<&FamilyConfig> {
        self.families.iter().find(|f| f.family == family)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NightCheckConfig::default();
        config.validate().expect("default config must validate");
        assert_eq!(config.scheduler_user, "netmgt_user");
        assert_eq!(config.families.len(), 4);
        assert!(config.family(Family::Php).is_some());
        assert!(!config.family(Family::Php).unwrap().is_supported());
        assert!(config.family(Family::Perl).unwrap().is_supported());
    }

    #[test]
    fn test_syntax_argv_substitutes_placeholder() {
        let config = NightCheckConfig::default();
        let python = config.family(Family::Python3).unwrap();
        let argv = python.syntax_argv(Path::new("/opt/scripts/foo.py"));
        assert_eq!(
            argv,
            vec!["/usr/bin/python3", "-m", "py_compile", "/opt/scripts/foo.py"]
        );
    }

    #[test]
    fn test_syntax_argv_appends_path_without_placeholder() {
        let family = FamilyConfig {
            family: Family::Perl,
            declaration: None,
            syntax_command: vec!["perl".to_string(), "-c".to_string()],
            extensions: vec!["pl".to_string()],
            scan_error_blocks: false,
            ignore_markers: Vec::new(),
        };
        let argv = family.syntax_argv(Path::new("/opt/scripts/sync.pl"));
        assert_eq!(argv, vec!["perl", "-c", "/opt/scripts/sync.pl"]);
    }

    #[test]
    fn test_matches_extension_exactly() {
        let config = NightCheckConfig::default();
        let python = config.family(Family::Python).unwrap();
        assert!(python.matches_extension(Path::new("/opt/a/foo.py")));
        assert!(!python.matches_extension(Path::new("/opt/a/foo.pyc")));
        assert!(!python.matches_extension(Path::new("/opt/a/py")));
    }

    #[test]
    fn test_from_toml_str_with_defaults() {
        let config = NightCheckConfig::from_toml_str(
            r#"
            scheduler_user = "ops"
            directories = ["/opt/scripts"]
            "#,
        )
        .expect("parse");
        assert_eq!(config.scheduler_user, "ops");
        assert_eq!(config.directories, vec![PathBuf::from("/opt/scripts")]);
        assert_eq!(config.command_timeout_secs, 60);
        assert_eq!(config.families.len(), 4);
    }

    #[test]
    fn test_from_toml_str_custom_families() {
        let config = NightCheckConfig::from_toml_str(
            r#"
            command_timeout_secs = 5

            [[families]]
            family = "perl"
            syntax_command = ["perl", "-c", "{path}"]
            extensions = ["pl", "pm"]
            "#,
        )
        .expect("parse");
        assert_eq!(config.families.len(), 1);
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
        let perl = config.family(Family::Perl).unwrap();
        assert!(perl.matches_extension(Path::new("lib/Util.pm")));
        assert!(!perl.scan_error_blocks);
    }

    #[test]
    fn test_duplicate_family_rejected() {
        let err = NightCheckConfig::from_toml_str(
            r#"
            [[families]]
            family = "perl"
            extensions = ["pl"]

            [[families]]
            family = "perl"
            extensions = ["pm"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::DuplicateFamily { .. }));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = NightCheckConfig::from_toml_str(
            r#"
            [[families]]
            family = "python"
            declaration = "^#!(unclosed"
            extensions = ["py"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::InvalidPattern { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = NightCheckConfig::from_toml_str("command_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, CheckError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = NightCheckConfig::load(Path::new("/nonexistent/nightcheck.toml")).unwrap_err();
        assert!(matches!(err, CheckError::Read { .. }));
    }
}
