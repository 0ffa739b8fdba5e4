//! Language negotiation middleware for Axum.
//!
//! Add [`i18n_layer`] to a router to resolve each request's language and
//! bind a [`Translator`] for it:
//!
//! ```ignore
//! use axum::middleware::from_fn_with_state;
//!
//! let app = Router::new()
//!     .route("/", get(index))
//!     .layer(from_fn_with_state(resolver.clone(), i18n_layer));
//!
//! async fn index(translator: Translator) -> String {
//!     translator.tr("greeting")
//! }
//! ```
//!
//! An earlier middleware can pin the language for a request by storing it in
//! [`RequestValues`] under the resolver's language key; no cookie is written
//! in that case.

use crate::i18n::{LanguageResolver, LanguageSource, Resolution};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query, Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub use crate::i18n::Translator;

/// Per-request string values shared between pipeline stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestValues(HashMap<String, String>);

impl RequestValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value; empty values read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Read-only view of an incoming request for language resolution.
struct RequestLanguageSource<'a> {
    headers: &'a HeaderMap,
    values: Option<&'a RequestValues>,
    query: Vec<(String, String)>,
}

impl<'a> RequestLanguageSource<'a> {
    fn new(request: &'a Request) -> Self {
        // A malformed query string counts as no query parameters
        let query = Query::<Vec<(String, String)>>::try_from_uri(request.uri())
            .map(|Query(query)| query)
            .unwrap_or_default();

        Self {
            headers: request.headers(),
            values: request.extensions().get::<RequestValues>(),
            query,
        }
    }
}

impl LanguageSource for RequestLanguageSource<'_> {
    fn stored_value(&self, key: &str) -> Option<String> {
        self.values?.get(key).map(str::to_string)
    }

    /// First occurrence wins when the parameter is repeated.
    fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn cookie(&self, name: &str) -> Option<String> {
        extract_cookie(self.headers, name)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name)?.to_str().ok().map(str::to_string)
    }
}

/// Extract a cookie value by name from all `Cookie` headers.
///
/// One pair of surrounding double quotes is removed from the value.
pub fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            if name == cookie_name {
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Language negotiation middleware.
///
/// For every request this:
/// 1. Resolves the locale (stored value, query, cookie, `Accept-Language`,
///    default)
/// 2. Stores it in [`RequestValues`] under the language key
/// 3. Inserts a [`Translator`] and the [`Resolution`] as request extensions
/// 4. Runs the rest of the pipeline (never short-circuits)
/// 5. Sets the language cookie on the response unless the locale came from
///    an earlier stage or from the cookie itself
#[instrument(
    name = "i18n_layer",
    skip_all,
    fields(
        locale = tracing::field::Empty,
        source = tracing::field::Empty,
    )
)]
pub async fn i18n_layer(
    State(resolver): State<Arc<LanguageResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolution = resolver.resolve(&RequestLanguageSource::new(&request));

    let span = tracing::Span::current();
    span.record("locale", resolution.locale.as_str());
    span.record("source", resolution.source.as_str());
    debug!("Resolved request language");

    let mut values = request
        .extensions_mut()
        .remove::<RequestValues>()
        .unwrap_or_default();
    values.set(resolver.language_key(), resolution.locale.as_str());

    let extensions = request.extensions_mut();
    extensions.insert(values);
    extensions.insert(resolver.translator(resolution.locale.as_str()));
    extensions.insert(resolution.clone());

    let mut response = next.run(request).await;

    if resolution.needs_cookie_write() {
        if let Some(cookie) = resolver.language_cookie(&resolution.locale) {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => warn!("Failed to build language cookie header: {}", e),
            }
        }
    }

    response
}

#[async_trait]
impl<S> FromRequestParts<S> for Resolution
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Resolution>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "language middleware is not installed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{LocaleSource, MessageBundle};
    use axum::{
        body::Body, http::Request as HttpRequest, middleware::from_fn_with_state, routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn resolver() -> Arc<LanguageResolver> {
        let mut bundle = MessageBundle::new("en".parse().unwrap());
        bundle
            .parse_message_file_bytes(b"greeting = \"Hello\"", "en.toml")
            .unwrap();
        bundle
            .parse_message_file_bytes(b"greeting = \"Bonjour\"", "fr-FR.toml")
            .unwrap();
        Arc::new(LanguageResolver::new(Arc::new(bundle)))
    }

    async fn stored_locale(Extension(values): Extension<RequestValues>) -> String {
        values.get("i18n.locale").unwrap_or("<none>").to_string()
    }

    fn app(resolver: Arc<LanguageResolver>) -> Router {
        Router::new()
            .route("/", get(stored_locale))
            .layer(from_fn_with_state(resolver, i18n_layer))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ==================== Cookie Parsing Tests ====================

    #[test]
    fn test_extract_cookie_by_name() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=abc; i18n.locale=de-DE; x=1"));
        assert_eq!(extract_cookie(&headers, "i18n.locale"), Some("de-DE".to_string()));
        assert_eq!(extract_cookie(&headers, "locale"), None);
    }

    #[test]
    fn test_extract_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("session=abc"));
        headers.append(COOKIE, HeaderValue::from_static("i18n.locale=es"));
        assert_eq!(extract_cookie(&headers, "i18n.locale"), Some("es".to_string()));
    }

    #[test]
    fn test_extract_cookie_strips_quotes() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("i18n.locale=\"de-DE\"; x=\""));
        assert_eq!(extract_cookie(&headers, "i18n.locale"), Some("de-DE".to_string()));
        assert_eq!(extract_cookie(&headers, "x"), Some("\"".to_string()));
    }

    // ==================== Query Parameter Tests ====================

    #[test]
    fn test_repeated_query_parameter_first_wins() {
        let request = HttpRequest::get("/?lang=fr&lang=de").body(Body::empty()).unwrap();
        let source = RequestLanguageSource::new(&request);
        assert_eq!(source.query_param("lang"), Some("fr".to_string()));
        assert_eq!(source.query_param("locale"), None);
    }

    // ==================== Request Values Tests ====================

    #[test]
    fn test_request_values_empty_reads_as_absent() {
        let mut values = RequestValues::new();
        values.set("i18n.locale", "");
        assert_eq!(values.get("i18n.locale"), None);
        values.set("i18n.locale", "fr");
        assert_eq!(values.get("i18n.locale"), Some("fr"));
    }

    // ==================== Middleware Tests ====================

    #[tokio::test]
    async fn test_stores_resolved_locale_for_handlers() {
        let request = HttpRequest::get("/?lang=fr").body(Body::empty()).unwrap();
        let response = app(resolver()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "fr");
    }

    #[tokio::test]
    async fn test_repeated_query_parameter_resolves_first_value() {
        let request = HttpRequest::get("/?lang=fr&lang=de").body(Body::empty()).unwrap();
        let response = app(resolver()).oneshot(request).await.unwrap();

        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("i18n.locale=fr;"));
        assert_eq!(body_text(response).await, "fr");
    }

    #[tokio::test]
    async fn test_quoted_cookie_resolves_unquoted_locale() {
        let request = HttpRequest::get("/")
            .header(COOKIE, "i18n.locale=\"de-DE\"")
            .body(Body::empty())
            .unwrap();
        let response = app(resolver()).oneshot(request).await.unwrap();

        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_text(response).await, "de-DE");
    }

    #[tokio::test]
    async fn test_upstream_value_is_kept_and_no_cookie_written() {
        let mut request = HttpRequest::get("/?lang=fr").body(Body::empty()).unwrap();
        let mut values = RequestValues::new();
        values.set("i18n.locale", "pt-BR");
        request.extensions_mut().insert(values);

        let response = app(resolver()).oneshot(request).await.unwrap();

        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_text(response).await, "pt-BR");
    }

    #[tokio::test]
    async fn test_odd_query_string_is_tolerated() {
        let request = HttpRequest::get("/?lang=%ZZ&&=")
            .header("Accept-Language", "fr-CA")
            .body(Body::empty())
            .unwrap();
        let response = app(resolver()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_resolution_extension_is_available() {
        async fn source(resolution: Resolution) -> String {
            resolution.source.to_string()
        }

        let app = Router::new()
            .route("/", get(source))
            .layer(from_fn_with_state(resolver(), i18n_layer));
        let request = HttpRequest::get("/")
            .header(COOKIE, "i18n.locale=de-DE")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_text(response).await, LocaleSource::Cookie.as_str());
    }

    #[tokio::test]
    async fn test_extractors_reject_without_middleware() {
        async fn greet(translator: Translator) -> String {
            translator.tr("greeting")
        }

        let app = Router::new().route("/", get(greet));
        let response = app
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
