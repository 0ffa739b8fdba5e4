//! HTTP surface: catalog loading, router assembly and demo handlers.

use crate::config::Config;
use crate::i18n::{Catalog, LanguageResolver, MessageBundle, Resolution, Translator};
use crate::middleware::i18n_layer;
use anyhow::{Context, Result};
use axum::{extract::State, middleware::from_fn_with_state, routing::get, Json, Router};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use unic_langid::LanguageIdentifier;

/// Load the message catalog described by `config`.
///
/// Explicit `locale_files` take precedence; otherwise every message file in
/// `locale_dir` is loaded. A missing directory leaves only the default
/// language available.
pub fn load_catalog(config: &Config) -> Result<MessageBundle> {
    let default_language: LanguageIdentifier = config
        .catalog_language
        .parse()
        .with_context(|| format!("Invalid I18N_CATALOG_LANGUAGE '{}'", config.catalog_language))?;
    let mut bundle = MessageBundle::new(default_language);

    if !config.locale_files.is_empty() {
        for file in &config.locale_files {
            bundle
                .load_message_file(file)
                .with_context(|| format!("Failed to load locale file {}", file))?;
        }
        info!("Loaded {} locale files", config.locale_files.len());
    } else if Path::new(&config.locale_dir).is_dir() {
        let count = bundle
            .load_dir(&config.locale_dir)
            .with_context(|| format!("Failed to load locale directory {}", config.locale_dir))?;
        info!("Loaded {} locale files from {}", count, config.locale_dir);
    } else {
        warn!(
            "Locale directory {} not found, serving '{}' only",
            config.locale_dir, config.catalog_language
        );
    }

    info!("Supported languages: {}", bundle.supported_tags().join(", "));
    Ok(bundle)
}

/// Build the resolver from configuration.
pub fn build_resolver(config: &Config, catalog: Arc<dyn Catalog>) -> LanguageResolver {
    LanguageResolver::new(catalog)
        .with_default_locale(config.default_locale.as_str())
        .with_url_parameter(config.url_parameter.as_str())
        .with_language_key(config.language_key.as_str())
        .with_header_match(config.header_match)
        .with_cookie_max_age(config.cookie_max_age)
}

/// Assemble the application router with language negotiation on every route.
pub fn router(resolver: Arc<LanguageResolver>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/locale", get(locale_info))
        .route("/health", get(health))
        .layer(from_fn_with_state(Arc::clone(&resolver), i18n_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(resolver)
}

/// Response body of `GET /locale`.
#[derive(Debug, Serialize)]
pub struct LocaleInfo {
    pub locale: String,
    pub source: &'static str,
    pub supported: Vec<String>,
}

async fn index(translator: Translator) -> String {
    translator.tr("greeting")
}

async fn locale_info(
    State(resolver): State<Arc<LanguageResolver>>,
    resolution: Resolution,
) -> Json<LocaleInfo> {
    Json(LocaleInfo {
        locale: resolution.locale,
        source: resolution.source.as_str(),
        supported: resolver.catalog().supported_tags().to_vec(),
    })
}

async fn health() -> &'static str {
    "OK"
}
