// src/pipeline/sources.rs

//! Source globs: compile a pattern, find its literal base directory, and
//! resolve it to the files currently on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};

use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;
use crate::watch::path_utils::relative_str;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// A compiled source pattern such as `src/images/**/*`.
///
/// - `*` and `?` never cross a `/`; `**` spans directories.
/// - The *base* is the literal directory prefix before the first wildcard
///   component (`src/images` above). Outputs keep their path relative to it.
/// - Hidden entries (any component starting with `.`) never match.
#[derive(Clone)]
pub struct SourceGlob {
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

impl fmt::Debug for SourceGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceGlob")
            .field("pattern", &self.pattern)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

/// A file matched by a [`SourceGlob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path usable with the filesystem (`root` joined with `rel`).
    pub path: PathBuf,
    /// Path relative to the project root, forward slashes.
    pub rel: String,
    /// Path relative to the glob base.
    pub base_rel: PathBuf,
}

impl SourceGlob {
    pub fn new(pattern: &str) -> Result<Self> {
        let normalized = pattern.trim().trim_start_matches("./").to_string();
        if normalized.is_empty() {
            return Err(AssetpipeError::Glob {
                pattern: pattern.to_string(),
                message: "pattern is empty".to_string(),
            });
        }
        if normalized.starts_with('/') || normalized.split('/').any(|c| c == "..") {
            return Err(AssetpipeError::Glob {
                pattern: pattern.to_string(),
                message: "pattern must stay inside the project root".to_string(),
            });
        }

        let matcher = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .map_err(|err| AssetpipeError::Glob {
                pattern: pattern.to_string(),
                message: err.to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            base: glob_base(&normalized),
            pattern: normalized,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Literal directory prefix of the pattern, relative to the project root.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns true if `rel_path` (relative to the project root, forward
    /// slashes) is selected by this glob.
    pub fn is_match(&self, rel_path: &str) -> bool {
        if rel_path.split('/').any(|c| c.starts_with('.')) {
            return false;
        }
        self.matcher.is_match(rel_path)
    }

    /// Path of `rel_path` relative to the glob base.
    pub fn relative_to_base(&self, rel_path: &str) -> Option<PathBuf> {
        Path::new(rel_path)
            .strip_prefix(&self.base)
            .ok()
            .map(Path::to_path_buf)
    }

    /// Resolve the glob under `root`, returning matching files sorted by
    /// relative path.
    ///
    /// A missing base directory resolves to no files. Symlinked directories
    /// below the base are not descended into; symlinked files are read.
    pub fn resolve(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SourceFile>> {
        let base_dir = if self.base.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(&self.base)
        };

        if !fs.is_dir(&base_dir) {
            warn!(pattern = %self.pattern, base = ?base_dir, "glob base directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut stack = vec![base_dir];

        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
                if hidden {
                    continue;
                }
                if fs.is_dir(&path) {
                    // Linked directories can point back up the tree.
                    if fs.is_symlink(&path) {
                        debug!(path = ?path, "skipping symlinked directory");
                        continue;
                    }
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Some(rel) = relative_str(root, &path) else {
                        continue;
                    };
                    if !self.is_match(&rel) {
                        continue;
                    }
                    let Some(base_rel) = self.relative_to_base(&rel) else {
                        continue;
                    };
                    files.push(SourceFile {
                        path,
                        rel,
                        base_rel,
                    });
                }
            }
        }

        files.sort_by(|a, b| a.rel.cmp(&b.rel));
        debug!(pattern = %self.pattern, matched = files.len(), "resolved source glob");
        Ok(files)
    }
}

/// Leading components of `pattern` that contain no glob metacharacters.
///
/// A pattern without any wildcard names a single file, so its base is the
/// file's directory.
fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();

    let take = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };

    components[..take].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn base_is_literal_prefix() {
        assert_eq!(SourceGlob::new("src/css/*.scss").unwrap().base(), Path::new("src/css"));
        assert_eq!(
            SourceGlob::new("./src/images/**/*").unwrap().base(),
            Path::new("src/images")
        );
        assert_eq!(SourceGlob::new("src/*.html").unwrap().base(), Path::new("src"));
        assert_eq!(SourceGlob::new("src/app.js").unwrap().base(), Path::new("src"));
        assert_eq!(SourceGlob::new("*.html").unwrap().base(), Path::new(""));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let glob = SourceGlob::new("src/css/*.scss").unwrap();
        assert!(glob.is_match("src/css/main.scss"));
        assert!(!glob.is_match("src/css/vendor/reset.scss"));
        assert!(!glob.is_match("src/css/main.css"));
    }

    #[test]
    fn double_star_spans_directories_but_skips_hidden() {
        let glob = SourceGlob::new("src/images/**/*").unwrap();
        assert!(glob.is_match("src/images/logo.png"));
        assert!(glob.is_match("src/images/icons/x/close.svg"));
        assert!(!glob.is_match("src/images/.DS_Store"));
        assert!(!glob.is_match("src/images/.cache/a.png"));
    }

    #[test]
    fn patterns_leaving_the_root_are_rejected() {
        assert!(SourceGlob::new("../secrets/*").is_err());
        assert!(SourceGlob::new("/etc/*").is_err());
        assert!(SourceGlob::new("  ").is_err());
        assert!(SourceGlob::new("src/[").is_err());
    }

    #[test]
    fn resolve_returns_sorted_matches_relative_to_base() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/images/b.png", b"b".to_vec());
        fs.add_file("./src/images/icons/a.svg", b"a".to_vec());
        fs.add_file("./src/images/.hidden", b"h".to_vec());
        fs.add_file("./src/index.html", b"<html/>".to_vec());

        let glob = SourceGlob::new("src/images/**/*").unwrap();
        let files = glob.resolve(&fs, Path::new(".")).unwrap();

        let rels: Vec<&str> = files.iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["src/images/b.png", "src/images/icons/a.svg"]);
        assert_eq!(files[1].base_rel, PathBuf::from("icons/a.svg"));
    }

    #[test]
    fn symlinked_directories_are_not_descended() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/images/a.png", b"a".to_vec());
        fs.add_file("./shared/logo.png", b"l".to_vec());
        fs.add_symlink("./src/images/loop", "./src/images");
        fs.add_symlink("./src/images/logo.png", "./shared/logo.png");

        let glob = SourceGlob::new("src/images/**/*").unwrap();
        let files = glob.resolve(&fs, Path::new(".")).unwrap();

        let rels: Vec<&str> = files.iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["src/images/a.png", "src/images/logo.png"]);
    }

    #[test]
    fn missing_base_resolves_to_nothing() {
        let fs = MockFileSystem::new();
        let glob = SourceGlob::new("src/js/*.js").unwrap();
        assert!(glob.resolve(&fs, Path::new(".")).unwrap().is_empty());
    }
}
