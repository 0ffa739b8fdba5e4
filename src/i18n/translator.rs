//! Request-scoped translation handle.

use crate::i18n::Catalog;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Translates messages into the locale resolved for one request.
///
/// The locale is fixed when the translator is bound; handlers never
/// re-resolve it. Translation never fails: a catalog error is returned as
/// its message text in place of the translation.
#[derive(Clone)]
pub struct Translator {
    locale: String,
    catalog: Arc<dyn Catalog>,
}

impl Translator {
    pub fn new(locale: impl Into<String>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            locale: locale.into(),
            catalog,
        }
    }

    /// The locale this translator was bound to.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Translate `message_id`.
    ///
    /// If the first argument is a string it is passed to the catalog as the
    /// message description. Other arguments are ignored.
    ///
    /// # Example
    /// ```ignore
    /// let title = translator.translate("page.title", &[json!("Title of the landing page")]);
    /// ```
    pub fn translate(&self, message_id: &str, args: &[Value]) -> String {
        let description = args.first().and_then(Value::as_str);
        self.localize(message_id, description)
    }

    /// Translate `message_id` without a description.
    pub fn tr(&self, message_id: &str) -> String {
        self.localize(message_id, None)
    }

    /// Translate `message_id` with a description hint for the catalog.
    pub fn tr_described(&self, message_id: &str, description: &str) -> String {
        self.localize(message_id, Some(description))
    }

    fn localize(&self, message_id: &str, description: Option<&str>) -> String {
        self.catalog
            .localize(&self.locale, message_id, description)
            .unwrap_or_else(|err| err.to_string())
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Translator
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Translator>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "language middleware is not installed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocalizeError;
    use serde_json::json;
    use std::sync::Mutex;

    /// Catalog that knows one message and records the descriptions it sees.
    #[derive(Default)]
    struct RecordingCatalog {
        descriptions: Mutex<Vec<Option<String>>>,
    }

    impl Catalog for RecordingCatalog {
        fn supported_tags(&self) -> &[String] {
            &[]
        }

        fn localize(
            &self,
            locale: &str,
            message_id: &str,
            description: Option<&str>,
        ) -> Result<String, LocalizeError> {
            self.descriptions
                .lock()
                .unwrap()
                .push(description.map(str::to_string));
            match message_id {
                "greeting" => Ok(format!("hello ({})", locale)),
                _ => Err(LocalizeError::MessageNotFound {
                    message_id: message_id.to_string(),
                    locale: locale.to_string(),
                }),
            }
        }
    }

    fn translator(catalog: &Arc<RecordingCatalog>) -> Translator {
        let catalog: Arc<dyn Catalog> = Arc::clone(catalog) as Arc<dyn Catalog>;
        Translator::new("fr-CA", catalog)
    }

    // ==================== Translate Tests ====================

    #[test]
    fn test_translate_uses_bound_locale() {
        let catalog = Arc::new(RecordingCatalog::default());
        assert_eq!(translator(&catalog).tr("greeting"), "hello (fr-CA)");
    }

    #[test]
    fn test_first_string_argument_is_description() {
        let catalog = Arc::new(RecordingCatalog::default());
        let translator = translator(&catalog);

        translator.translate("greeting", &[json!("Landing page greeting"), json!(3)]);
        translator.translate("greeting", &[json!(3), json!("not a description")]);
        translator.translate("greeting", &[]);
        translator.tr_described("greeting", "described");

        let seen = catalog.descriptions.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                Some("Landing page greeting".to_string()),
                None,
                None,
                Some("described".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_message_returns_error_text() {
        let catalog = Arc::new(RecordingCatalog::default());
        let text = translator(&catalog).translate("nope", &[json!("hint"), json!({"n": 1})]);
        assert_eq!(text, "message \"nope\" not found in language \"fr-CA\"");
    }

    #[test]
    fn test_debug_shows_locale() {
        let catalog = Arc::new(RecordingCatalog::default());
        let debug = format!("{:?}", translator(&catalog));
        assert!(debug.contains("fr-CA"));
    }

    // ==================== Property Tests ====================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn unknown_messages_never_yield_empty_text(
                id in "[a-z.]{0,16}",
                description in proptest::option::of(".{0,16}"),
            ) {
                let catalog = Arc::new(RecordingCatalog::default());
                let args: Vec<Value> = description.into_iter().map(Value::String).collect();
                let text = translator(&catalog).translate(&format!("missing.{}", id), &args);
                prop_assert!(!text.is_empty());
            }
        }
    }
}
