//! The catalog seam between language resolution and message lookup.

use crate::i18n::LocalizeError;

/// A source of translated messages.
///
/// The resolver only needs the list of supported tags; the translator only
/// needs `localize`. Implementations are shared across concurrent requests
/// and must not change after construction.
pub trait Catalog: Send + Sync {
    /// Language tags this catalog can serve, in their canonical string form
    /// (e.g. "en", "fr-FR").
    fn supported_tags(&self) -> &[String];

    /// Look up `message_id` for `locale`.
    ///
    /// `description` is an optional human-readable hint supplied by the
    /// caller. Backends may use it as documentation or fallback text.
    fn localize(
        &self,
        locale: &str,
        message_id: &str,
        description: Option<&str>,
    ) -> Result<String, LocalizeError>;
}
