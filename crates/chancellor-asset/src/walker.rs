//! Recursive directory walk producing `/`-joined relative paths

use chancellor_core::{ChancellorError, Result};
use log::warn;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Default recursion bound
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A regular file found under the walk root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path relative to the root, components joined with `/`
    pub relative_path: String,
    /// Location on disk
    pub location: PathBuf,
}

/// Options controlling the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Skip files and directories whose name starts with `.`
    pub skip_hidden: bool,
    /// Deepest directory level to descend into; files directly under the root are level 0
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            skip_hidden: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Walk `root` and return every regular file beneath it.
///
/// Entries are sorted by file name within each directory, so the result is
/// stable for a given tree. Symlinks are followed; a link back to one of its
/// own ancestors is skipped. Only a missing root (or a root that is not a
/// directory) is an error; unreadable entries below it are skipped.
pub fn walk(root: &Path, options: &WalkOptions) -> Result<Vec<WalkEntry>> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(ChancellorError::RootNotFound(root.to_path_buf())),
    }

    let walker = WalkDir::new(root)
        .follow_links(true)
        .max_depth(options.max_depth.saturating_add(1))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(options.skip_hidden && e.depth() > 0 && is_hidden(e)));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                match (e.path(), e.loop_ancestor()) {
                    (Some(path), Some(ancestor)) => warn!(
                        "Skipping symlink cycle {} -> {}",
                        path.display(),
                        ancestor.display()
                    ),
                    _ => warn!("Skipping unreadable entry: {}", e),
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative_path) = relative_path(root, entry.path()) else {
            warn!("Skipping non UTF-8 path: {}", entry.path().display());
            continue;
        };

        entries.push(WalkEntry {
            relative_path,
            location: entry.into_path(),
        });
    }
    Ok(entries)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// `/`-joined components of `path` below `root`; `None` if any is not UTF-8
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chancellor_walk_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn relative_paths(entries: &[WalkEntry]) -> Vec<&str> {
        let mut paths: Vec<&str> = entries.iter().map(|e| e.relative_path.as_str()).collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_nested_paths_use_forward_slash() {
        let root = temp_dir();
        touch(&root, "c.png");
        touch(&root, "a/b.txt");
        touch(&root, "sprites/player/idle.png");

        let entries = walk(&root, &WalkOptions::default()).unwrap();
        assert_eq!(
            relative_paths(&entries),
            vec!["a/b.txt", "c.png", "sprites/player/idle.png"]
        );

        let idle = entries
            .iter()
            .find(|e| e.relative_path == "sprites/player/idle.png")
            .unwrap();
        assert_eq!(idle.location, root.join("sprites").join("player").join("idle.png"));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_directories_are_not_yielded() {
        let root = temp_dir();
        fs::create_dir_all(root.join("empty/deeper")).unwrap();
        touch(&root, "only.txt");

        let entries = walk(&root, &WalkOptions::default()).unwrap();
        assert_eq!(relative_paths(&entries), vec!["only.txt"]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_missing_root() {
        let root = std::env::temp_dir().join(format!("chancellor_missing_{}", uuid::Uuid::new_v4()));
        let err = walk(&root, &WalkOptions::default()).unwrap_err();
        assert!(matches!(err, ChancellorError::RootNotFound(p) if p == root));
    }

    #[test]
    fn test_root_is_a_file() {
        let root = temp_dir();
        touch(&root, "file.txt");

        let err = walk(&root.join("file.txt"), &WalkOptions::default()).unwrap_err();
        assert!(matches!(err, ChancellorError::RootNotFound(_)));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_skip_hidden() {
        let root = temp_dir();
        touch(&root, ".secret.txt");
        touch(&root, ".git/config");
        touch(&root, "visible.txt");

        let all = walk(&root, &WalkOptions::default()).unwrap();
        assert_eq!(all.len(), 3);

        let options = WalkOptions {
            skip_hidden: true,
            ..Default::default()
        };
        let visible = walk(&root, &options).unwrap();
        assert_eq!(relative_paths(&visible), vec!["visible.txt"]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_max_depth() {
        let root = temp_dir();
        touch(&root, "top.txt");
        touch(&root, "one/mid.txt");
        touch(&root, "one/two/deep.txt");

        let options = WalkOptions {
            max_depth: 1,
            ..Default::default()
        };
        let entries = walk(&root, &options).unwrap();
        assert_eq!(relative_paths(&entries), vec!["one/mid.txt", "top.txt"]);

        let flat = WalkOptions {
            max_depth: 0,
            ..Default::default()
        };
        let entries = walk(&root, &flat).unwrap();
        assert_eq!(relative_paths(&entries), vec!["top.txt"]);

        fs::remove_dir_all(&root).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycles_are_not_followed() {
        let root = temp_dir();
        touch(&root, "a.txt");
        touch(&root, "sub/b.txt");
        std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();
        std::os::unix::fs::symlink(&root, root.join("loop2")).unwrap();
        std::os::unix::fs::symlink(root.join("sub"), root.join("sub").join("self")).unwrap();

        let entries = walk(&root, &WalkOptions::default()).unwrap();
        assert_eq!(relative_paths(&entries), vec!["a.txt", "sub/b.txt"]);

        fs::remove_dir_all(&root).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_followed() {
        let root = temp_dir();
        let outside = temp_dir();
        touch(&outside, "shared.png");
        std::os::unix::fs::symlink(&outside, root.join("linked")).unwrap();

        let entries = walk(&root, &WalkOptions::default()).unwrap();
        assert_eq!(relative_paths(&entries), vec!["linked/shared.png"]);

        fs::remove_dir_all(&root).ok();
        fs::remove_dir_all(&outside).ok();
    }

    #[test]
    fn test_order_is_stable() {
        let root = temp_dir();
        for name in ["b.txt", "a.txt", "c/d.txt", "c/a.txt"] {
            touch(&root, name);
        }

        let first = walk(&root, &WalkOptions::default()).unwrap();
        let second = walk(&root, &WalkOptions::default()).unwrap();
        assert_eq!(first, second);

        fs::remove_dir_all(&root).ok();
    }
}
