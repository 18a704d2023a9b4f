//! Value encoding for stored records.
//!
//! The engine treats serialization as an external capability: a [`Codec`] turns a value
//! into bytes and back, and names the file extension records carry on disk.

use crate::error::BoxError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Encode/decode capability used by a [`Store`](crate::Store).
///
/// The extension must be a plain suffix without the leading dot (`"json"`); it is how
/// [`Store::keys`](crate::Store::keys) recognizes record files during a walk.
pub trait Codec: Debug + Send + Sync + 'static {
    fn extension(&self) -> &str;

    /// # Errors
    /// Returns the codec's own error when `value` cannot be represented.
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, BoxError>
    where
        T: Serialize + ?Sized;

    /// # Errors
    /// Returns the codec's own error when `bytes` do not describe a `T`.
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, BoxError>
    where
        T: DeserializeOwned;
}

/// Human-readable JSON records. Pretty-printed with two-space indentation by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub const EXTENSION: &'static str = "json";

    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }

    #[must_use]
    pub const fn compact() -> Self {
        Self { pretty: false }
    }

    #[must_use]
    pub const fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::pretty()
    }
}

impl Codec for JsonCodec {
    fn extension(&self) -> &str {
        Self::EXTENSION
    }

    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, BoxError>
    where
        T: Serialize + ?Sized,
    {
        let bytes =
            if self.pretty { serde_json::to_vec_pretty(value) } else { serde_json::to_vec(value) };
        Ok(bytes?)
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, BoxError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_slice(bytes)?)
    }
}
