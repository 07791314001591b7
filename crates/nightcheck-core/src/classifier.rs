//! Grouping of discovered scripts into interpreter families.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{FamilyConfig, NightCheckConfig};
use crate::domain::error::{CheckError, Result};
use crate::domain::family::Family;
use crate::resolver::{resolve_family, Declaration};

/// Family → scripts mapping built once per run.
///
/// A path lives in at most one bucket and buckets iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFamilyIndex {
    buckets: BTreeMap<Family, BTreeSet<PathBuf>>,
}

impl FileFamilyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` is already in any bucket.
    pub fn contains(&self, path: &Path) -> bool {
        self.buckets.values().any(|set| set.contains(path))
    }

    /// Add `path` to `family`'s bucket unless it is already indexed.
    ///
    /// Returns `true` when the path was added.
    pub fn insert(&mut self, family: Family, path: PathBuf) -> bool {
        if self.contains(&path) {
            return false;
        }
        self.buckets.entry(family).or_default().insert(path)
    }

    /// Scripts of one family, sorted.
    pub fn files(&self, family: Family) -> impl Iterator<Item = &PathBuf> {
        self.buckets.get(&family).into_iter().flatten()
    }

    /// Family of an indexed path.
    pub fn family_of(&self, path: &Path) -> Option<Family> {
        self.buckets
            .iter()
            .find(|(_, set)| set.contains(path))
            .map(|(family, _)| *family)
    }

    /// Number of scripts across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extension and declaration based classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    families: Vec<FamilyConfig>,
    declarations: Vec<Declaration>,
}

impl Classifier {
    /// Build a classifier from the family table, compiling declarations once.
    pub fn new(config: &NightCheckConfig) -> Result<Self> {
        let mut declarations = Vec::new();
        for family in &config.families {
            if let Some(decl) = Declaration::from_config(family)? {
                declarations.push(decl);
            }
        }
        Ok(Self {
            families: config.families.clone(),
            declarations,
        })
    }

    /// Families whose extensions match `path`, in configuration order.
    fn candidates(&self, path: &Path) -> Vec<Family> {
        self.families
            .iter()
            .filter(|f| f.matches_extension(path))
            .map(|f| f.family)
            .collect()
    }

    /// Classify one path into `index`.
    ///
    /// Paths already indexed are left alone, so re-scanning is idempotent.
    pub fn classify_into(&self, index: &mut FileFamilyIndex, path: &Path) -> Result<()> {
        if index.contains(path) {
            return Ok(());
        }

        let candidates = self.candidates(path);
        let family = match candidates.as_slice() {
            [] => {
                debug!(path = %path.display(), "no family matches extension");
                return Ok(());
            }
            [only] => *only,
            shared => {
                let declarations: Vec<Declaration> = self
                    .declarations
                    .iter()
                    .filter(|d| shared.contains(&d.family))
                    .cloned()
                    .collect();
                let resolved =
                    resolve_family(path, &declarations).map_err(|source| CheckError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                match resolved {
                    Some(family) => family,
                    None => {
                        debug!(path = %path.display(), "declaration line did not resolve");
                        Family::Unclassified
                    }
                }
            }
        };

        index.insert(family, path.to_path_buf());
        Ok(())
    }

    /// Classify every path into a fresh index.
    pub fn classify(&self, files: &[PathBuf]) -> Result<FileFamilyIndex> {
        let mut index = FileFamilyIndex::new();
        self.classify_all(&mut index, files)?;
        Ok(index)
    }

    /// Classify every path into an existing index.
    pub fn classify_all(&self, index: &mut FileFamilyIndex, files: &[PathBuf]) -> Result<()> {
        for path in files {
            self.classify_into(index, path)?;
        }
        Ok(())
    }
}
