use crate::i18n::{
    is_cookie_name, HeaderMatch, DEFAULT_COOKIE_MAX_AGE_SECS, DEFAULT_LANGUAGE_KEY, DEFAULT_LOCALE,
    DEFAULT_URL_PARAMETER,
};
use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Resolution
    pub default_locale: String,
    pub url_parameter: String,
    pub language_key: String,
    pub header_match: HeaderMatch,
    pub cookie_max_age: Option<u64>,

    // Catalog
    pub catalog_language: String,
    pub locale_files: Vec<String>,
    pub locale_dir: String,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_locale = std::env::var("I18N_DEFAULT_LOCALE")
            .unwrap_or_else(|_| DEFAULT_LOCALE.to_string());
        if default_locale.trim().is_empty() {
            bail!("I18N_DEFAULT_LOCALE must not be empty");
        }

        let language_key = std::env::var("I18N_LANGUAGE_KEY")
            .unwrap_or_else(|_| DEFAULT_LANGUAGE_KEY.to_string());
        if !is_cookie_name(&language_key) {
            bail!(
                "I18N_LANGUAGE_KEY '{}' is not a valid cookie name",
                language_key
            );
        }

        let header_match = match std::env::var("I18N_HEADER_MATCH") {
            Ok(value) => value
                .parse::<HeaderMatch>()
                .map_err(anyhow::Error::msg)
                .context("Invalid I18N_HEADER_MATCH")?,
            Err(_) => HeaderMatch::default(),
        };

        // 0 disables Max-Age (session cookie)
        let cookie_max_age = match std::env::var("I18N_COOKIE_MAX_AGE") {
            Ok(value) => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .context("I18N_COOKIE_MAX_AGE must be a number of seconds")?;
                (secs > 0).then_some(secs)
            }
            Err(_) => Some(DEFAULT_COOKIE_MAX_AGE_SECS),
        };

        Ok(Self {
            // Resolution
            default_locale,
            url_parameter: std::env::var("I18N_URL_PARAMETER")
                .unwrap_or_else(|_| DEFAULT_URL_PARAMETER.to_string()),
            language_key,
            header_match,
            cookie_max_age,

            // Catalog
            catalog_language: std::env::var("I18N_CATALOG_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
            locale_files: std::env::var("I18N_LOCALE_FILES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            locale_dir: std::env::var("I18N_LOCALE_DIR")
                .unwrap_or_else(|_| "locales".to_string()),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}

/// Split a comma-separated list, dropping blank items.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
