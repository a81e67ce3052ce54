//! Path keys for the listing cache and lock table.
//!
//! The same archive directory can be reached through differently spelled
//! paths (`a/./b`, `a/c/../b`, relative vs absolute, and on Windows any mix of
//! letter case). Both the cache and the lock table must treat those as one
//! directory, otherwise two workers could each believe they hold the only lock.

use std::path::{Component, Path, PathBuf};

/// Produces the lookup key for a directory path.
///
/// Purely lexical: the path is made absolute against the current directory,
/// `.` components are dropped and `..` pops its parent. Symlinks are **not**
/// resolved (that would mean I/O against a possibly slow share for every
/// lookup). On Windows the key is also lowercased.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use archivist_storage::normalize_key;
/// assert_eq!(normalize_key("/archive/./costruttivi//Am/"), Path::new("/archive/costruttivi/Am"));
/// assert_eq!(normalize_key("/archive/tmp/../costruttivi/Am"), Path::new("/archive/costruttivi/Am"));
/// ```
pub fn normalize_key(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut key = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            // Popping past the root is a no-op, same as the OS does it.
            Component::ParentDir => {
                key.pop();
            },
            other => key.push(other.as_os_str()),
        }
    }
    #[cfg(windows)]
    let key = PathBuf::from(key.to_string_lossy().to_lowercase());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_key("/a//b//c"), Path::new("/a/b/c"));
        assert_eq!(normalize_key("/a/./b/./c"), Path::new("/a/b/c"));
        assert_eq!(normalize_key("/a/b/c/"), Path::new("/a/b/c"));
        assert_eq!(normalize_key("/a/b/.."), Path::new("/a"));
        assert_eq!(normalize_key("/../.."), Path::new("/"));
    }

    #[test]
    fn test_relative_becomes_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(normalize_key("x/y"), normalize_key(cwd.join("x/y")));
        assert!(normalize_key("x/y").is_absolute());
    }

    #[cfg(windows)]
    #[test]
    fn test_case_folding() {
        assert_eq!(normalize_key(r"C:\Archive\Am"), normalize_key(r"c:\archive\AM"));
    }
}
