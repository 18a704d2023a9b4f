use crate::codec::{Codec, JsonCodec};
use crate::config::StoreConfig;
use crate::engine::{Store, StoreInner};
use crate::error::{StoreError, StoreErrorExt};
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tracing::info;

/// Root directory used when none (or an empty path) is configured.
pub const DEFAULT_ROOT: &str = "storage";

#[derive(Debug, Clone)]
struct BuilderConfig {
    root: Option<PathBuf>,
    create: bool,
    atomic_writes: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { root: None, create: true, atomic_writes: true }
    }
}

/// Fluent configuration for a [`Store`].
#[derive(Debug, Default)]
pub struct StoreBuilder<C: Codec = JsonCodec> {
    codec: C,
    config: BuilderConfig,
}

impl StoreBuilder<JsonCodec> {
    #[must_use = "Creates a new store builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a loaded [`StoreConfig`], including the JSON layout it asks for.
    #[must_use = "Applies the configuration to the builder"]
    pub fn config(self, config: &StoreConfig) -> Self {
        let codec = if config.pretty { JsonCodec::pretty() } else { JsonCodec::compact() };
        self.root(config.root.clone())
            .create(config.create)
            .atomic_writes(config.atomic_writes)
            .codec(codec)
    }
}

impl<C: Codec> StoreBuilder<C> {
    /// Sets the root directory. Relative paths resolve against the working directory at
    /// [`open`](Self::open) time; an empty path selects [`DEFAULT_ROOT`].
    #[must_use = "Sets the root directory of the store"]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root = Some(path.into());
        self
    }

    #[must_use = "Sets whether a missing root directory is created"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    /// Writes go to a temporary file that is renamed over the record when enabled.
    #[must_use = "Sets whether puts are written atomically"]
    pub const fn atomic_writes(mut self, enable: bool) -> Self {
        self.config.atomic_writes = enable;
        self
    }

    #[must_use = "Replaces the codec used for records"]
    pub fn codec<N: Codec>(self, codec: N) -> StoreBuilder<N> {
        StoreBuilder { codec, config: self.config }
    }

    /// Consumes the configuration and opens the store.
    ///
    /// 1. **Bootstrapping**: creates the root directory if `create(true)` (the default).
    /// 2. **Canonicalization**: resolves the root to an absolute physical path, which the
    ///    key resolver compares every record path against.
    /// 3. **Self-Healing**: removes stale temporary files left by interrupted writes. This
    ///    step never fails the call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the root cannot be created or does not exist with
    /// `create(false)`.
    pub fn open(self) -> Result<Store<C>, StoreError> {
        let requested = self.config.root.unwrap_or_default();
        let root = bootstrap_root(&requested, self.config.create)?;

        let store = Store {
            inner: Arc::new(StoreInner {
                root: RwLock::new(root),
                codec: self.codec,
                create: self.config.create,
                atomic_writes: self.config.atomic_writes,
                tmp_counter: AtomicU64::new(1),
            }),
        };

        store.purge_tmp();

        Ok(store)
    }
}

/// Creates (when asked) and canonicalizes a root directory.
pub(crate) fn bootstrap_root(path: &Path, create: bool) -> Result<PathBuf, StoreError> {
    let path = if path.as_os_str().is_empty() { Path::new(DEFAULT_ROOT) } else { path };

    if create {
        fs::create_dir_all(path)
            .context(format!("Failed to bootstrap store root: {}", path.display()))?;
    }

    let canonical = fs::canonicalize(path)
        .context(format!("Failed to resolve store root: {}", path.display()))?;
    info!(path = %canonical.display(), "Store root ready");

    Ok(canonical)
}
