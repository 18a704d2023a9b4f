//! Key to path translation.
//!
//! Two independent checks keep every record inside the store root: a segment check on the
//! key itself, then a lexical containment check on the resulting path.

use crate::error::StoreError;
use std::path::{Component, Path, PathBuf};

/// Splits a key into its `/`-separated segments, rejecting traversal and malformed keys.
pub(crate) fn split_key(key: &str) -> Result<Vec<&str>, StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            message: "EMPTY".into(),
            context: Some("Key cannot be empty".into()),
        });
    }

    if key.contains('\0') {
        return Err(StoreError::InvalidKey {
            message: key.escape_debug().to_string().into(),
            context: Some("Key contains a NUL byte".into()),
        });
    }

    let segments: Vec<&str> = key.split('/').collect();

    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(StoreError::Traversal {
            message: key.to_owned().into(),
            context: Some("Relative segments are not allowed in keys".into()),
        });
    }

    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidKey {
            message: key.to_owned().into(),
            context: Some("Key contains an empty segment".into()),
        });
    }

    Ok(segments)
}

/// Resolves `key` to `root/<segments>.<extension>`.
///
/// `root` is expected to be absolute; the store guarantees this when it is opened. No
/// filesystem access happens here.
pub(crate) fn resolve_key(root: &Path, key: &str, extension: &str) -> Result<PathBuf, StoreError> {
    let segments = split_key(key)?;
    let Some((file, parents)) = segments.split_last() else {
        return Err(StoreError::InvalidKey { message: key.to_owned().into(), context: None });
    };

    let mut path = root.to_path_buf();
    path.extend(parents);
    path.push(format!("{file}.{extension}"));

    ensure_within(root, &path, key)?;
    Ok(path)
}

/// Ancestor directories of a key's record, deepest first, excluding the root.
pub(crate) fn ancestor_dirs(root: &Path, segments: &[&str]) -> Vec<PathBuf> {
    (1..segments.len())
        .rev()
        .map(|depth| {
            let mut dir = root.to_path_buf();
            dir.extend(&segments[..depth]);
            dir
        })
        .collect()
}

/// Collapse `.` / `..` lexically without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::ParentDir => {
                out.pop();
            },
            other => out.push(other),
        }
    }
    out
}

fn ensure_within(root: &Path, candidate: &Path, key: &str) -> Result<(), StoreError> {
    let root = normalize(root);
    let candidate = normalize(candidate);

    if candidate != root && candidate.starts_with(&root) {
        Ok(())
    } else {
        Err(StoreError::PathOutsideRoot {
            message: key.to_owned().into(),
            context: Some(format!("Resolved to {}", candidate.display()).into()),
        })
    }
}
