//! Directory scanner for discovering feature files

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of Gherkin documents
pub const FEATURE_EXTENSION: &str = "feature";

/// A feature file found during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File name without extension (e.g., "login" for "login.feature")
    pub stem: String,
    /// Path relative to the scanned root (e.g., "auth/login.feature")
    pub relative: PathBuf,
}

impl FeatureFile {
    /// Export directory for this feature under `base`, mirroring its
    /// location below the scanned root
    pub fn export_dir(&self, base: &Path) -> PathBuf {
        base.join(self.relative.with_extension(""))
    }
}

/// Result of scanning directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root directories that were scanned
    pub roots: Vec<PathBuf>,
    /// Discovered feature files, sorted by path
    pub features: Vec<FeatureFile>,
    /// Entries that could not be read
    pub skipped: usize,
}

impl ScanResult {
    /// Total number of feature files found
    pub fn total_files(&self) -> usize {
        self.features.len()
    }

    /// Find a feature file by stem
    pub fn find_feature(&self, stem: &str) -> Option<&FeatureFile> {
        self.features.iter().find(|f| f.stem == stem)
    }

    /// Pair every feature with its export directory under `base`.
    ///
    /// A feature whose directory was already claimed by an earlier one gets
    /// [`Error::OutputCollision`] instead. Directories are compared
    /// case-insensitively.
    pub fn export_plan(&self, base: &Path) -> Vec<(&FeatureFile, Result<PathBuf>)> {
        let mut claimed: HashMap<String, &Path> = HashMap::new();

        self.features
            .iter()
            .map(|feature| {
                let output_dir = feature.export_dir(base);
                let key = output_dir.to_string_lossy().to_lowercase();
                let target = match claimed.get(&key).copied() {
                    Some(existing) => Err(Error::OutputCollision {
                        path: feature.path.clone(),
                        existing: existing.to_path_buf(),
                        output_dir,
                    }),
                    None => {
                        claimed.insert(key, feature.path.as_path());
                        Ok(output_dir)
                    }
                };
                (feature, target)
            })
            .collect()
    }
}

/// Scan one or more directories for `.feature` files
pub fn scan_directory<P: AsRef<Path>>(roots: &[P]) -> Result<ScanResult> {
    let mut features = Vec::new();
    let mut skipped = 0;

    for root in roots {
        let root = root.as_ref();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                // An unreadable root is fatal; anything deeper is skipped
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    log::warn!("skipping unreadable entry under '{}': {}", root.display(), e);
                    skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == FEATURE_EXTENSION) {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                let relative = path.strip_prefix(root).unwrap_or(path);
                features.push(FeatureFile {
                    path: path.to_path_buf(),
                    stem: stem.to_string(),
                    relative: relative.to_path_buf(),
                });
            }
        }
    }

    features.sort_by(|a, b| a.path.cmp(&b.path));
    features.dedup_by(|a, b| a.path == b.path);

    Ok(ScanResult {
        roots: roots.iter().map(|r| r.as_ref().to_path_buf()).collect(),
        features,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_finds_feature_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("billing");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("login.feature"), "Feature: Login").unwrap();
        fs::write(nested.join("invoice.feature"), "Feature: Invoice").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a feature").unwrap();

        let result = scan_directory(&[dir.path()]).unwrap();

        assert_eq!(result.total_files(), 2);
        assert!(result.find_feature("login").is_some());
        assert!(result.find_feature("invoice").is_some());
        assert!(result.find_feature("notes").is_none());
    }

    #[test]
    fn test_scan_is_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.feature"), "").unwrap();
        fs::write(dir.path().join("a.feature"), "").unwrap();

        // Same root twice
        let result = scan_directory(&[dir.path(), dir.path()]).unwrap();

        let stems: Vec<&str> = result.features.iter().map(|f| f.stem.as_str()).collect();
        assert_eq!(stems, vec!["a", "b"]);
    }

    #[test]
    fn test_same_stem_in_different_folders_exports_apart() {
        let dir = tempfile::tempdir().unwrap();
        for folder in ["auth", "billing"] {
            fs::create_dir_all(dir.path().join(folder)).unwrap();
            fs::write(dir.path().join(folder).join("login.feature"), "").unwrap();
        }

        let result = scan_directory(&[dir.path()]).unwrap();
        let out = Path::new("out");
        let plan = result.export_plan(out);

        let dirs: Vec<PathBuf> = plan.into_iter().map(|(_, d)| d.unwrap()).collect();
        assert_eq!(
            dirs,
            vec![out.join("auth").join("login"), out.join("billing").join("login")]
        );
    }

    #[test]
    fn test_same_relative_path_in_two_roots_collides() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("login.feature"), "").unwrap();
        fs::write(second.path().join("login.feature"), "").unwrap();

        let result = scan_directory(&[first.path(), second.path()]).unwrap();
        let plan = result.export_plan(Path::new("out"));

        assert_eq!(plan.len(), 2);
        let collisions: Vec<&crate::Error> =
            plan.iter().filter_map(|(_, d)| d.as_ref().err()).collect();
        assert_eq!(collisions.len(), 1);
        assert!(matches!(collisions[0], crate::Error::OutputCollision { .. }));
        assert_eq!(plan.iter().filter(|(_, d)| d.is_ok()).count(), 1);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let err = scan_directory(&["definitely/not/here"]).unwrap_err();
        assert!(matches!(err, crate::Error::WalkDir(_)));
    }
}
