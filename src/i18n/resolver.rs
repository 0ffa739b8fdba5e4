//! Per-request language resolution.
//!
//! Resolution order (first non-empty source wins):
//! 1. A language already stored for this request by an earlier stage
//! 2. The URL query parameter (`?lang=fr`)
//! 3. The language cookie from a previous response
//! 4. The `Accept-Language` header, matched against the catalog's tags
//! 5. The configured default locale
//!
//! Unless the language came from an earlier stage or from the cookie, the
//! result should be persisted in the cookie so the next request from the
//! same client resolves at step 3.

use crate::i18n::{Catalog, Translator};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Fallback locale when nothing else matches.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Query parameter carrying an explicit language choice.
pub const DEFAULT_URL_PARAMETER: &str = "lang";

/// Key of the resolved language in the request value store and the name of
/// the language cookie.
pub const DEFAULT_LANGUAGE_KEY: &str = "i18n.locale";

/// Language cookie lifetime: one year.
pub const DEFAULT_COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// The request data resolution reads from.
///
/// Every accessor returns `None` (or an empty string) when the value is
/// absent; empty values are treated as absent.
pub trait LanguageSource {
    /// A value stored for this request by an earlier pipeline stage.
    fn stored_value(&self, key: &str) -> Option<String>;

    /// A URL query parameter.
    fn query_param(&self, name: &str) -> Option<String>;

    /// A request cookie.
    fn cookie(&self, name: &str) -> Option<String>;

    /// A request header.
    fn header(&self, name: &str) -> Option<String>;
}

/// Which rule produced the resolved locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleSource {
    Upstream,
    QueryParameter,
    Cookie,
    AcceptLanguage,
    Default,
}

impl LocaleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::QueryParameter => "query_parameter",
            Self::Cookie => "cookie",
            Self::AcceptLanguage => "accept_language",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for LocaleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The locale to render with (never empty)
    pub locale: String,

    /// Where the locale came from
    pub source: LocaleSource,
}

impl Resolution {
    /// Whether the locale was read from the language cookie.
    pub fn sourced_from_cookie(&self) -> bool {
        self.source == LocaleSource::Cookie
    }

    /// Whether the response should set the language cookie.
    ///
    /// False when an earlier stage already resolved this request or when the
    /// cookie already holds the locale.
    pub fn needs_cookie_write(&self) -> bool {
        !matches!(self.source, LocaleSource::Upstream | LocaleSource::Cookie)
    }
}

/// How `Accept-Language` entries are scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMatch {
    /// Keep scanning after a match; the last matching entry wins. Entries are
    /// taken as sent, so `en-US, fr-CA` compares ` fr` (leading space) and
    /// does not match `fr-FR`. Compatible with deployments that already rely
    /// on this behaviour.
    #[default]
    Last,

    /// Stop at the first matching entry (header order, quality ignored).
    /// Entries are trimmed of surrounding whitespace.
    First,
}

impl FromStr for HeaderMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" => Ok(Self::Last),
            "first" => Ok(Self::First),
            other => Err(format!(
                "invalid header match policy '{}', expected 'last' or 'first'",
                other
            )),
        }
    }
}

/// Match an `Accept-Language` header against supported tags.
///
/// Each comma-separated entry has its `;q=` suffix dropped. The entry's
/// primary subtag (text before the first `-`) matches a supported tag when
/// the tag's string form contains it. The matching entry itself is returned,
/// region included: `fr-CA` against `["fr-FR"]` yields `fr-CA`. Entries
/// left empty once the suffix is dropped are skipped.
///
/// # Returns
/// `None` when no entry matches.
pub fn match_accept_language(header: &str, supported_tags: &[String], policy: HeaderMatch) -> Option<String> {
    let mut matched = None;

    for entry in header.split(',') {
        let mut range = entry.split(';').next().unwrap_or(entry);
        if policy == HeaderMatch::First {
            range = range.trim();
        }
        if range.is_empty() {
            continue;
        }

        let primary = range.split('-').next().unwrap_or(range);
        if supported_tags.iter().any(|tag| tag.contains(primary)) {
            matched = Some(range.to_string());
            if policy == HeaderMatch::First {
                break;
            }
        }
    }

    matched
}

/// Language resolution settings plus the catalog they resolve against.
///
/// Built once at startup and shared by every request.
#[derive(Clone)]
pub struct LanguageResolver {
    default_locale: String,
    url_parameter: String,
    language_key: String,
    header_match: HeaderMatch,
    cookie_max_age: Option<u64>,
    catalog: Arc<dyn Catalog>,
}

impl LanguageResolver {
    /// Create a resolver with default settings.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            url_parameter: DEFAULT_URL_PARAMETER.to_string(),
            language_key: DEFAULT_LANGUAGE_KEY.to_string(),
            header_match: HeaderMatch::default(),
            cookie_max_age: Some(DEFAULT_COOKIE_MAX_AGE_SECS),
            catalog,
        }
    }

    /// Set the fallback locale. Blank values are ignored so the resolved
    /// locale can never be empty.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        let locale = locale.into();
        if locale.trim().is_empty() {
            warn!("Ignoring empty default locale, keeping '{}'", self.default_locale);
        } else {
            self.default_locale = locale;
        }
        self
    }

    /// Set the query parameter name.
    pub fn with_url_parameter(mut self, name: impl Into<String>) -> Self {
        self.url_parameter = name.into();
        self
    }

    /// Set the request value key, also used as the cookie name.
    pub fn with_language_key(mut self, key: impl Into<String>) -> Self {
        self.language_key = key.into();
        self
    }

    /// Set the `Accept-Language` scan policy.
    pub fn with_header_match(mut self, policy: HeaderMatch) -> Self {
        self.header_match = policy;
        self
    }

    /// Set the cookie `Max-Age`; `None` makes it a session cookie.
    pub fn with_cookie_max_age(mut self, max_age_secs: Option<u64>) -> Self {
        self.cookie_max_age = max_age_secs;
        self
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn url_parameter(&self) -> &str {
        &self.url_parameter
    }

    pub fn language_key(&self) -> &str {
        &self.language_key
    }

    pub fn header_match(&self) -> HeaderMatch {
        self.header_match
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Decide the locale for one request. Never fails.
    pub fn resolve<S: LanguageSource + ?Sized>(&self, request: &S) -> Resolution {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        if let Some(locale) = non_empty(request.stored_value(&self.language_key)) {
            return Resolution {
                locale,
                source: LocaleSource::Upstream,
            };
        }

        if let Some(locale) = non_empty(request.query_param(&self.url_parameter)) {
            return Resolution {
                locale,
                source: LocaleSource::QueryParameter,
            };
        }

        if let Some(locale) = non_empty(request.cookie(&self.language_key)) {
            return Resolution {
                locale,
                source: LocaleSource::Cookie,
            };
        }

        let from_header = non_empty(request.header("Accept-Language")).and_then(|header| {
            match_accept_language(&header, self.catalog.supported_tags(), self.header_match)
        });
        if let Some(locale) = from_header {
            return Resolution {
                locale,
                source: LocaleSource::AcceptLanguage,
            };
        }

        Resolution {
            locale: self.default_locale.clone(),
            source: LocaleSource::Default,
        }
    }

    /// Bind a translator to `locale`.
    pub fn translator(&self, locale: impl Into<String>) -> Translator {
        Translator::new(locale, Arc::clone(&self.catalog))
    }

    /// Render the `Set-Cookie` value persisting `locale`.
    ///
    /// # Returns
    /// `None` when the locale contains characters not allowed in a cookie
    /// value, or the language key is not a valid cookie name (the cookie is
    /// then not written).
    pub fn language_cookie(&self, locale: &str) -> Option<String> {
        if !is_cookie_name(&self.language_key) {
            warn!("Not persisting locale under invalid cookie name: {:?}", self.language_key);
            return None;
        }
        if locale.is_empty() || !locale.bytes().all(is_cookie_octet) {
            warn!("Not persisting locale with invalid cookie characters: {:?}", locale);
            return None;
        }

        let mut cookie = format!("{}={}; Path=/", self.language_key, locale);
        if let Some(max_age) = self.cookie_max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        cookie.push_str("; HttpOnly; SameSite=Lax");
        Some(cookie)
    }
}

impl fmt::Debug for LanguageResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageResolver")
            .field("default_locale", &self.default_locale)
            .field("url_parameter", &self.url_parameter)
            .field("language_key", &self.language_key)
            .field("header_match", &self.header_match)
            .field("cookie_max_age", &self.cookie_max_age)
            .field("supported_tags", &self.catalog.supported_tags())
            .finish()
    }
}

/// RFC 6265 cookie-name: a non-empty HTTP token.
pub fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// RFC 6265 cookie-octet.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}
