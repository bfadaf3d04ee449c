//! `Walker` over a directory on the local filesystem

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::warn;

use crate::entry::Entry;
use crate::error::NavigationError;

use super::walker::{Go, Walker};

/// Filesystem options for `LocalWalker`.
#[derive(Debug, Clone, Default)]
pub struct LocalConfig {
    /// Follow symbolic links instead of skipping them
    pub follow_symlinks: bool,
    /// Glob patterns matched against entry names
    pub ignore_patterns: Vec<String>,
}

pub struct LocalWalker {
    root: PathBuf,
    cwd: PathBuf,
    ignore: Vec<Pattern>,
    follow_symlinks: bool,
    listing: Option<std::vec::IntoIter<Entry>>,
}

impl LocalWalker {
    pub fn new(root: impl Into<PathBuf>, config: &LocalConfig) -> Self {
        let root = root.into();
        let ignore = config
            .ignore_patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "ignoring invalid pattern");
                    None
                }
            })
            .collect();
        Self {
            cwd: root.clone(),
            root,
            ignore,
            follow_symlinks: config.follow_symlinks,
            listing: None,
        }
    }

    /// Directory the walker currently lists.
    pub fn current_dir(&self) -> &Path {
        &self.cwd
    }

    fn should_ignore(&self, name: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(name))
    }

    fn list(&self) -> Vec<Entry> {
        let entries = match fs::read_dir(&self.cwd) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %self.cwd.display(), error = %e, "cannot read directory");
                return Vec::new();
            }
        };

        entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let name = match entry.file_name().into_string() {
                    Ok(name) => name,
                    Err(raw) => {
                        warn!(name = ?raw, "skipping entry with non UTF-8 name");
                        return None;
                    }
                };
                if name.contains('\n') {
                    warn!(name = ?name, "skipping entry with newline in name");
                    return None;
                }
                if self.should_ignore(&name) {
                    return None;
                }

                let mut file_type = entry.file_type().ok()?;
                let metadata = if file_type.is_symlink() {
                    if !self.follow_symlinks {
                        return None;
                    }
                    let meta = fs::metadata(entry.path()).ok()?;
                    file_type = meta.file_type();
                    meta
                } else {
                    entry.metadata().ok()?
                };

                if file_type.is_dir() {
                    Some(Entry::directory(name))
                } else if file_type.is_file() {
                    Some(Entry::file(name, metadata.len()))
                } else {
                    None
                }
            })
            .collect()
    }
}

impl Walker for LocalWalker {
    fn readdir(&mut self) -> Option<Entry> {
        if self.listing.is_none() {
            self.listing = Some(self.list().into_iter());
        }
        self.listing.as_mut()?.next()
    }

    fn go(&mut self, to: Go<'_>) -> Result<(), NavigationError> {
        match to {
            Go::Child(name) => {
                let target = self.cwd.join(name);
                let meta = if self.follow_symlinks {
                    fs::metadata(&target)
                } else {
                    fs::symlink_metadata(&target)
                };
                match meta {
                    Ok(m) if m.is_dir() => {}
                    Ok(_) => {
                        return Err(NavigationError::Child {
                            name: name.to_string(),
                            reason: "not a directory".to_string(),
                        });
                    }
                    Err(e) => {
                        return Err(NavigationError::Child {
                            name: name.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
                self.cwd = target;
            }
            Go::Parent => {
                if self.cwd == self.root || !self.cwd.pop() {
                    return Err(NavigationError::Parent(format!(
                        "already at {}",
                        self.root.display()
                    )));
                }
            }
        }
        self.listing = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn drain(walker: &mut LocalWalker) -> Vec<(String, bool, u64)> {
        let mut out = Vec::new();
        while let Some(e) = walker.readdir() {
            out.push((e.name.clone(), e.is_dir(), e.size));
        }
        out.sort();
        out
    }

    #[test]
    fn test_lists_and_navigates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "xy").unwrap();

        let mut walker = LocalWalker::new(dir.path(), &LocalConfig::default());
        assert_eq!(
            drain(&mut walker),
            vec![("a.txt".to_string(), false, 5), ("sub".to_string(), true, 0)]
        );

        walker.go(Go::Child("sub")).unwrap();
        assert_eq!(drain(&mut walker), vec![("b.txt".to_string(), false, 2)]);

        walker.go(Go::Parent).unwrap();
        assert!(walker.go(Go::Parent).is_err());
        assert_eq!(walker.current_dir(), dir.path());
    }

    #[test]
    fn test_ignore_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("keep.rs"), "").unwrap();
        fs::write(dir.path().join("drop.log"), "").unwrap();
        fs::write(dir.path().join("test1.tmp"), "").unwrap();

        let config = LocalConfig {
            ignore_patterns: vec!["*.log".to_string(), "test?.tmp".to_string()],
            ..Default::default()
        };
        let mut walker = LocalWalker::new(dir.path(), &config);
        assert_eq!(drain(&mut walker), vec![("keep.rs".to_string(), false, 0)]);
    }

    #[test]
    fn test_missing_child_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file"), "").unwrap();
        let mut walker = LocalWalker::new(dir.path(), &LocalConfig::default());
        assert!(matches!(
            walker.go(Go::Child("nope")),
            Err(NavigationError::Child { .. })
        ));
        assert!(walker.go(Go::Child("file")).is_err());
        assert_eq!(walker.current_dir(), dir.path());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let mut walker = LocalWalker::new(dir.path(), &LocalConfig::default());
        assert_eq!(drain(&mut walker), vec![("real".to_string(), true, 0)]);

        let config = LocalConfig {
            follow_symlinks: true,
            ..Default::default()
        };
        let mut walker = LocalWalker::new(dir.path(), &config);
        assert_eq!(drain(&mut walker).len(), 2);
        walker.go(Go::Child("link")).unwrap();
    }

    #[test]
    fn test_unreadable_root_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let mut walker = LocalWalker::new(dir.path().join("missing"), &LocalConfig::default());
        assert!(walker.readdir().is_none());
    }
}
