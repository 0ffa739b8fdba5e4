//! Preview binary - shows how a request would be resolved without running the server
//!
//! Usage:
//!   cargo run --bin preview -- --accept-language "fr-CA,en;q=0.8"
//!   cargo run --bin preview -- --lang es --message nav.home
//!   cargo run --bin preview -- --cookie de-DE
//!
//! Reads the same environment variables as the server (I18N_*), so the
//! preview uses the configured locale files and resolution settings.

use anyhow::{bail, Result};
use locale_negotiator::config::Config;
use locale_negotiator::i18n::LanguageSource;
use locale_negotiator::server;
use std::sync::Arc;
use tracing::info;

/// Request signals given on the command line.
#[derive(Debug, Default)]
struct PreviewRequest {
    lang: Option<String>,
    cookie: Option<String>,
    accept_language: Option<String>,
}

impl LanguageSource for PreviewRequest {
    fn stored_value(&self, _key: &str) -> Option<String> {
        None
    }

    fn query_param(&self, _name: &str) -> Option<String> {
        self.lang.clone()
    }

    fn cookie(&self, _name: &str) -> Option<String> {
        self.cookie.clone()
    }

    fn header(&self, name: &str) -> Option<String> {
        if name.eq_ignore_ascii_case("Accept-Language") {
            self.accept_language.clone()
        } else {
            None
        }
    }
}

fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("preview=info".parse()?)
                .add_directive("locale_negotiator=warn".parse()?),
        )
        .init();

    let mut request = PreviewRequest::default();
    let mut messages = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || match args.next() {
            Some(value) => Ok(value),
            None => bail!("Missing value for {}", arg),
        };
        match arg.as_str() {
            "--lang" => request.lang = Some(value()?),
            "--cookie" => request.cookie = Some(value()?),
            "--accept-language" => request.accept_language = Some(value()?),
            "--message" => messages.push(value()?),
            other => bail!("Unknown argument: {}", other),
        }
    }

    let config = Config::from_env()?;
    let catalog = Arc::new(server::load_catalog(&config)?);
    let resolver = server::build_resolver(&config, catalog);

    info!("Previewing {:?}", request);
    let resolution = resolver.resolve(&request);

    println!("Supported languages: {}", resolver.catalog().supported_tags().join(", "));
    println!("Resolved locale:     {}", resolution.locale);
    println!("Source:              {}", resolution.source);
    match resolution
        .needs_cookie_write()
        .then(|| resolver.language_cookie(&resolution.locale))
        .flatten()
    {
        Some(cookie) => println!("Set-Cookie:          {}", cookie),
        None => println!("Set-Cookie:          (none)"),
    }

    if messages.is_empty() {
        messages.push("greeting".to_string());
    }

    let translator = resolver.translator(resolution.locale.as_str());
    println!();
    for message in &messages {
        println!("{} = {}", message, translator.tr(message));
    }

    Ok(())
}
