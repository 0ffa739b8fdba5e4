//! Error types for message catalogs.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to build a catalog from locale files.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read message file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported message file format: {0} (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("no language tag in message file name: {0}")]
    MissingLanguageTag(PathBuf),

    #[error("invalid language tag '{tag}' in message file name: {path}")]
    InvalidLanguageTag { path: PathBuf, tag: String },

    #[error("failed to parse message file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failure to localize a single message.
///
/// The translator renders these as text in place of the translation, so the
/// `Display` output is part of the observable behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalizeError {
    #[error("message \"{message_id}\" not found in language \"{locale}\"")]
    MessageNotFound { message_id: String, locale: String },

    #[error("cannot localize an empty message id")]
    EmptyMessageId,
}
