//! Core storage engine: one record per file, one readers-writer lock per store.
//!
//! Every public operation takes the instance lock for its whole duration. Mutations
//! (`put`, `move_key`, `delete`, `set_root`, `purge_tmp`) take it exclusively, reads
//! (`get`, `keys`, `exists`, `resolve`, `root`) share it. Independent stores share nothing.

use crate::builder::{self, StoreBuilder};
use crate::codec::{Codec, JsonCodec};
use crate::error::{StoreError, StoreErrorExt};
use crate::maintenance::{self, Cleanup, PurgeReport, TMP_MARKER};
use crate::security;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The internal shared state of a [`Store`] instance.
#[derive(Debug)]
pub struct StoreInner<C> {
    /// Canonical root directory. The lock around it is the store's lock.
    pub(crate) root: RwLock<PathBuf>,
    pub(crate) codec: C,
    /// Whether `set_root` creates missing directories.
    pub(crate) create: bool,
    pub(crate) atomic_writes: bool,
    /// Source of unique temporary file names.
    pub(crate) tmp_counter: AtomicU64,
}

/// A thread-safe handle to a file-per-key store.
///
/// Each value lives in its own file at `<root>/<key>.<ext>`, where the key's `/`-separated
/// segments become directories. Directories appear on write and are pruned as soon as
/// their last record leaves.
///
/// The handle is reference-counted: clones share the same root and the same lock.
///
/// # Example
///
/// ```rust
/// use fskv_store::{Store, StoreError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Order {
///     id: u32,
///     items: Vec<String>,
/// }
///
/// fn main() -> Result<(), StoreError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let store = Store::builder().root(tmp.path().join("data")).open()?;
///
///     let order = Order { id: 1000, items: vec!["one".into(), "two".into()] };
///     store.put("orders/new/1000", &order)?;
///
///     let restored: Order = store.get("orders/new/1000")?;
///     assert_eq!(restored, order);
///
///     store.move_key("orders/new/1000", "orders/done/1000")?.into_result()?;
///     assert_eq!(store.keys("orders/done")?, vec!["orders/done/1000".to_owned()]);
///
///     store.delete("orders/done/1000")?.into_result()?;
///     assert!(store.keys("")?.is_empty());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Store<C: Codec = JsonCodec> {
    pub(crate) inner: Arc<StoreInner<C>>,
}

impl<C: Codec> Clone for Store<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Codec> Deref for Store<C> {
    type Target = StoreInner<C>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Store {
    #[must_use = "The store is not opened until you call .open()"]
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }
}

impl<C: Codec> Store<C> {
    /// The canonical root directory records currently resolve against.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.root.read().clone()
    }

    #[must_use]
    pub fn codec(&self) -> &C {
        &self.inner.codec
    }

    /// Points this store at another directory.
    ///
    /// Only subsequent operations are affected; existing records are not migrated. An
    /// empty path selects [`DEFAULT_ROOT`](crate::DEFAULT_ROOT). The directory is created
    /// if the store was built with `create(true)`.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the directory cannot be created or resolved. The
    /// previous root stays in effect in that case.
    pub fn set_root(&self, dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let mut root = self.root.write();
        let next = builder::bootstrap_root(dir.as_ref(), self.create)?;
        info!(from = %root.display(), to = %next.display(), "Store root changed");
        *root = next;
        Ok(())
    }

    /// Resolves a key to the physical path of its record without touching the disk.
    ///
    /// # Errors
    /// Returns [`StoreError::Traversal`], [`StoreError::InvalidKey`] or
    /// [`StoreError::PathOutsideRoot`] if the key is rejected.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let root = self.root.read();
        self.resolve_in(&root, key)
    }

    /// Checks whether a record exists for `key`.
    ///
    /// # Errors
    /// Returns an error only if the key is rejected.
    pub fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let root = self.root.read();
        let path = self.resolve_in(&root, key)?;
        Ok(path.is_file())
    }

    /// Writes `value` under `key`, replacing any existing record.
    ///
    /// The value is encoded before anything on disk changes. Missing parent directories
    /// are created. With atomic writes (the default) the bytes go to a temporary file that
    /// is synced and renamed over the record, so readers never see a partial record.
    ///
    /// # Errors
    /// Returns a key rejection error, [`StoreError::Encode`] if the codec fails, or
    /// [`StoreError::Io`] if a directory or the record cannot be written.
    pub fn put<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let root = self.root.write();
        let path = self.resolve_in(&root, key)?;

        let bytes = self.codec.encode(value).map_err(|source| StoreError::Encode {
            source,
            context: Some(key.to_owned().into()),
        })?;

        maintenance::ensure_parent(&path)?;

        if self.atomic_writes {
            self.write_atomic(&path, &bytes)?;
        } else {
            write_direct(&path, &bytes)?;
        }

        debug!(key, path = %path.display(), bytes = bytes.len(), "Record saved");
        Ok(())
    }

    /// Reads and decodes the record stored under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if no record exists, [`StoreError::Decode`] if the
    /// stored bytes do not describe a `T`, or a key rejection error.
    pub fn get<T>(&self, key: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let root = self.root.read();
        let path = self.resolve_in(&root, key)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if is_absent(&err) => {
                return Err(StoreError::not_found(key));
            },
            Err(err) => {
                return Err(StoreError::Io {
                    source: err,
                    context: Some(format!("Read failed: {}", path.display()).into()),
                });
            },
        };

        debug!(key, path = %path.display(), "Record loaded");
        self.codec.decode(&bytes).map_err(|source| StoreError::Decode {
            source,
            context: Some(key.to_owned().into()),
        })
    }

    /// Renames the record at `from` to `to`, replacing any record already at `to`.
    ///
    /// The rename is atomic when both paths live on the same filesystem; moves across
    /// filesystems fail with [`StoreError::Io`]. Afterwards the source key's empty
    /// ancestor directories are pruned; problems with that cleanup are reported in the
    /// returned [`Cleanup`] and do not fail the move.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if `from` has no record, [`StoreError::Io`] if the
    /// rename fails, or a key rejection error for either key.
    pub fn move_key(&self, from: &str, to: &str) -> Result<Cleanup, StoreError> {
        let root = self.root.write();
        let source = self.resolve_in(&root, from)?;
        let target = self.resolve_in(&root, to)?;

        if !source.is_file() {
            return Err(StoreError::not_found(from));
        }
        if source == target {
            return Ok(Cleanup::default());
        }

        maintenance::ensure_parent(&target)?;

        if let Err(err) = fs::rename(&source, &target) {
            // The destination parents may have been created for nothing. The rename
            // error is what the caller gets; a cleanup problem is only logged.
            let cleanup = maintenance::prune(&root, &security::split_key(to)?);
            if let Some(failure) = cleanup.failure() {
                warn!(to, %failure, "Cleanup after failed rename left directories behind");
            }
            return Err(match err.kind() {
                io::ErrorKind::NotFound => StoreError::not_found(from),
                _ => StoreError::Io {
                    source: err,
                    context: Some(
                        format!("Rename failed: {} -> {}", source.display(), target.display())
                            .into(),
                    ),
                },
            });
        }

        debug!(from, to, path = %target.display(), "Record moved");
        Ok(maintenance::prune(&root, &security::split_key(from)?))
    }

    /// Removes the record at `key` and prunes the ancestor directories it leaves empty.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if there is no record, [`StoreError::Io`] if it
    /// cannot be removed, or a key rejection error.
    pub fn delete(&self, key: &str) -> Result<Cleanup, StoreError> {
        let root = self.root.write();
        let path = self.resolve_in(&root, key)?;

        match fs::remove_file(&path) {
            Ok(()) => {},
            Err(err) if is_absent(&err) => {
                return Err(StoreError::not_found(key));
            },
            Err(err) => {
                return Err(StoreError::Io {
                    source: err,
                    context: Some(format!("Failed to delete: {}", path.display()).into()),
                });
            },
        }

        debug!(key, path = %path.display(), "Record deleted");
        Ok(maintenance::prune(&root, &security::split_key(key)?))
    }

    /// Lists every key that starts with `prefix`; an empty prefix lists all keys.
    ///
    /// Matching is a plain string prefix: `"order"` also matches `"orders/1"`. Results
    /// come back in directory walk order, which is unspecified. A root that does not
    /// exist holds no keys.
    ///
    /// # Errors
    /// Returns [`StoreError::Walk`] if any part of the tree cannot be read.
    pub fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let root = self.root.read();

        match fs::metadata(&*root) {
            Ok(_) => {},
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).context(format!("Failed to open {}", root.display())),
        }

        let suffix = format!(".{}", self.codec.extension());
        let mut keys = Vec::new();

        for entry in WalkDir::new(&*root).min_depth(1) {
            let entry = entry.context(format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(key) = key_from_path(&root, entry.path(), &suffix) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        debug!(prefix, count = keys.len(), "Keys listed");
        Ok(keys)
    }

    /// Removes temporary files older than five minutes left by interrupted writes, and
    /// any directories left empty. Runs automatically when a store is opened.
    pub fn purge_tmp(&self) -> PurgeReport {
        let root = self.root.write();
        maintenance::purge_tmp(&root, self.codec.extension())
    }

    fn resolve_in(&self, root: &Path, key: &str) -> Result<PathBuf, StoreError> {
        security::resolve_key(root, key, self.codec.extension())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let temp = unique_tmp_path(path, &self.tmp_counter);

        let swapped = write_synced(&temp, bytes).and_then(|()| match fs::rename(&temp, path) {
            Ok(()) => Ok(()),
            // Platforms without atomic replace.
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                fs::remove_file(path)
                    .context(format!("Failed to replace existing file: {}", path.display()))?;
                fs::rename(&temp, path).context(format!(
                    "Atomic swap failed: {} -> {}",
                    temp.display(),
                    path.display()
                ))
            },
            Err(err) => Err(StoreError::Io {
                source: err,
                context: Some(
                    format!("Atomic swap failed: {} -> {}", temp.display(), path.display()).into(),
                ),
            }),
        });

        if swapped.is_err() {
            let _ = fs::remove_file(&temp);
        } else if let Some(parent) = path.parent() {
            sync_dir(parent);
        }

        swapped
    }
}

/// A record is absent when its path is missing or runs through a file (`x.json/y`).
fn is_absent(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

fn write_synced(temp: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = record_options()
        .create_new(true)
        .open(temp)
        .context(format!("Temp creation failed: {}", temp.display()))?;
    file.write_all(bytes).context("Write failed")?;
    file.sync_all().context("Hardware sync failed")
}

fn write_direct(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = record_options()
        .create(true)
        .truncate(true)
        .open(path)
        .context(format!("Open failed: {}", path.display()))?;
    file.write_all(bytes).context(format!("Write failed: {}", path.display()))
}

/// Records are created readable and writable by everyone, subject to the umask.
fn record_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o666);
    }
    options
}

#[cfg(unix)]
fn sync_dir(path: &Path) {
    match fs::File::open(path) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) {}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("record");
    let tmp_name = format!("{file_name}{TMP_MARKER}{}.{counter}", std::process::id());
    target.with_file_name(tmp_name)
}

/// Rebuilds a key from a record path: relative to root, `/`-joined, suffix stripped.
fn key_from_path(root: &Path, path: &Path, suffix: &str) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;

    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return None;
        };
        segments.push(segment.to_str()?);
    }

    let joined = segments.join("/");
    let key = joined.strip_suffix(suffix)?;

    if key.is_empty() || key.ends_with('/') { None } else { Some(key.to_owned()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_rebuilt_from_nested_path() {
        let root = Path::new("/data");
        let path = root.join("orders").join("new").join("1.json");
        assert_eq!(key_from_path(root, &path, ".json").as_deref(), Some("orders/new/1"));
    }

    #[test]
    fn foreign_and_temp_files_are_not_keys() {
        let root = Path::new("/data");
        assert!(key_from_path(root, &root.join("notes.txt"), ".json").is_none());
        assert!(key_from_path(root, &root.join("1.json.fskvtmp.9.1"), ".json").is_none());
        assert!(key_from_path(root, &root.join("a").join(".json"), ".json").is_none());
        assert!(key_from_path(root, &root.join(".json"), ".json").is_none());
    }

    #[test]
    fn tmp_names_are_unique_and_keep_the_record_name() {
        let counter = AtomicU64::new(1);
        let target = Path::new("/data/orders/1.json");
        let a = unique_tmp_path(target, &counter);
        let b = unique_tmp_path(target, &counter);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        let name = a.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("1.json.fskvtmp."));
        assert!(!name.ends_with(".json"));
    }
}
