use std::borrow::Cow;

/// Boxed error produced by a [`Codec`](crate::Codec) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A specialized [`StoreError`] enum of this crate.
#[fskv_derive::fskv_error]
pub enum StoreError {
    #[error("Path traversal rejected{}: {message}", format_context(.context))]
    Traversal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path resolves outside the store root{}: {message}", format_context(.context))]
    PathOutsideRoot { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Record not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Encoding failure{}: {source}", format_context(.context))]
    Encode { source: BoxError, context: Option<Cow<'static, str>> },

    #[error("Decoding failure{}: {source}", format_context(.context))]
    Decode { source: BoxError, context: Option<Cow<'static, str>> },

    #[error("Filesystem I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Directory walk failure{}: {source}", format_context(.context))]
    Walk { source: walkdir::Error, context: Option<Cow<'static, str>> },

    #[error("Empty directory cleanup failed{}: {message}", format_context(.context))]
    Prune { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Configuration failure{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

impl StoreError {
    pub(crate) fn not_found(key: &str) -> Self {
        Self::NotFound { message: key.to_owned().into(), context: None }
    }

    /// Returns `true` for the rejections raised before any filesystem access.
    #[must_use]
    pub const fn is_key_rejection(&self) -> bool {
        matches!(self, Self::Traversal { .. } | Self::PathOutsideRoot { .. } | Self::InvalidKey { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
