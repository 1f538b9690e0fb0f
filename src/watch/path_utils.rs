// src/watch/path_utils.rs

//! Path helpers shared by glob resolution and the watcher.

use std::path::{Component, Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to canonicalized paths when the direct prefix does not match
/// (symlinked temp dirs on macOS report `/private/var/...`).
///
/// Returns `None` if `path` is not below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = canonicalize_lossy(path)?;
    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(to_slash)
}

/// Canonicalize `path`, or its parent when the path itself no longer exists
/// (removed files still need to map back to a task).
fn canonicalize_lossy(path: &Path) -> Option<PathBuf> {
    if let Ok(canon) = path.canonicalize() {
        return Some(canon);
    }
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}

fn to_slash(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Drop bases that are nested inside another base; the ancestor's recursive
/// watch already covers them. An empty base stands for the project root.
pub fn outermost_dirs(mut dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    dirs.sort();
    dirs.dedup();

    let mut kept: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        if kept.iter().any(|k| dir.starts_with(k)) {
            continue;
        }
        kept.push(dir);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_str_uses_forward_slashes() {
        assert_eq!(
            relative_str(Path::new("/p"), Path::new("/p/src/css/main.scss")).as_deref(),
            Some("src/css/main.scss")
        );
        assert_eq!(
            relative_str(Path::new("."), Path::new("./src/index.html")).as_deref(),
            Some("src/index.html")
        );
        assert_eq!(relative_str(Path::new("/p"), Path::new("/elsewhere/x")), None);
    }

    #[test]
    fn nested_dirs_collapse_into_ancestor() {
        let dirs = outermost_dirs(vec![
            PathBuf::from("src/images"),
            PathBuf::from("src/css"),
            PathBuf::from("src"),
            PathBuf::from("src/css"),
            PathBuf::from("vendor"),
        ]);
        assert_eq!(dirs, vec![PathBuf::from("src"), PathBuf::from("vendor")]);
    }

    #[test]
    fn root_base_covers_everything() {
        let dirs = outermost_dirs(vec![PathBuf::from("src/css"), PathBuf::new()]);
        assert_eq!(dirs, vec![PathBuf::new()]);
    }
}
