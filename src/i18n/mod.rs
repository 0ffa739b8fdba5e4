//! Internationalization (i18n) module: language resolution and translation.
//!
//! # Architecture
//!
//! - `catalog`: The `Catalog` trait, the boundary to message storage
//! - `bundle`: File-backed catalog loaded from JSON/TOML locale files
//! - `message`: Message definitions and message file parsing
//! - `resolver`: Decides the locale of a request and the cookie write-back
//! - `translator`: Request-scoped translation handle bound to one locale
//!
//! # Example
//!
//! ```rust,ignore
//! use locale_negotiator::i18n::{LanguageResolver, MessageBundle};
//!
//! let bundle = MessageBundle::from_files("en".parse()?, &["locales/active.fr-FR.toml"])?;
//! let resolver = LanguageResolver::new(Arc::new(bundle)).with_default_locale("en-US");
//!
//! let resolution = resolver.resolve(&request);
//! let translator = resolver.translator(&resolution.locale);
//! let title = translator.tr("page.title");
//! ```

mod bundle;
mod catalog;
mod error;
mod message;
mod resolver;
mod translator;

pub use bundle::MessageBundle;
pub use catalog::Catalog;
pub use error::{CatalogError, LocalizeError};
pub use message::{Message, MessageFormat};
pub use resolver::{
    is_cookie_name, match_accept_language, HeaderMatch, LanguageResolver, LanguageSource,
    LocaleSource, Resolution, DEFAULT_COOKIE_MAX_AGE_SECS, DEFAULT_LANGUAGE_KEY, DEFAULT_LOCALE, DEFAULT_URL_PARAMETER,
};
pub use translator::Translator;
