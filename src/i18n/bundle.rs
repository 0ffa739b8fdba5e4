//! File-backed message catalog.
//!
//! Locale files are loaded once at startup. The language of each file is
//! taken from its name, the segment right before the extension:
//! `active.fr-FR.toml` holds `fr-FR` messages, `es.json` holds `es`.

use crate::i18n::message::{parse_messages, Message, MessageFormat};
use crate::i18n::{Catalog, CatalogError, LocalizeError};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use unic_langid::LanguageIdentifier;

/// Messages for every loaded language plus a default language to fall back
/// to.
#[derive(Debug, Clone)]
pub struct MessageBundle {
    default_language: LanguageIdentifier,
    /// Load order, default language first
    tags: Vec<LanguageIdentifier>,
    /// Canonical string form of `tags`, same order
    tag_names: Vec<String>,
    messages: HashMap<LanguageIdentifier, HashMap<String, Message>>,
}

impl MessageBundle {
    /// Create an empty bundle. The default language is always reported as
    /// supported, even before any file for it is loaded.
    pub fn new(default_language: LanguageIdentifier) -> Self {
        let mut bundle = Self {
            default_language: default_language.clone(),
            tags: Vec::new(),
            tag_names: Vec::new(),
            messages: HashMap::new(),
        };
        bundle.add_tag(default_language);
        bundle
    }

    /// Create a bundle and load every given message file.
    pub fn from_files<P: AsRef<Path>>(
        default_language: LanguageIdentifier,
        paths: &[P],
    ) -> Result<Self, CatalogError> {
        let mut bundle = Self::new(default_language);
        for path in paths {
            bundle.load_message_file(path)?;
        }
        Ok(bundle)
    }

    /// Load every `.json` and `.toml` file in `dir`, in file name order.
    ///
    /// # Returns
    /// The number of files loaded.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let dir = dir.as_ref();
        let io_err = |source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && MessageFormat::from_path(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_message_file(path)?;
        }
        Ok(paths.len())
    }

    /// Read and load a single message file.
    pub fn load_message_file(&mut self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_message_file_bytes(&bytes, path)?;
        Ok(())
    }

    /// Load message file contents. `path` only determines the language and
    /// the format; nothing is read from disk.
    ///
    /// # Returns
    /// The language the messages were added to.
    pub fn parse_message_file_bytes(
        &mut self,
        bytes: &[u8],
        path: impl AsRef<Path>,
    ) -> Result<LanguageIdentifier, CatalogError> {
        let path = path.as_ref();
        let format = MessageFormat::from_path(path)
            .ok_or_else(|| CatalogError::UnsupportedFormat(path.to_path_buf()))?;
        let tag = language_tag_from_path(path)?;

        let parse_err = |message| CatalogError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let document = format.decode(bytes).map_err(parse_err)?;
        let messages = parse_messages(&document).map_err(parse_err)?;

        debug!(
            "Loaded {} messages for '{}' from {}",
            messages.len(),
            tag,
            path.display()
        );
        self.add_messages(tag.clone(), messages);
        Ok(tag)
    }

    /// Add messages for `tag`. Messages with an id already present replace
    /// the earlier definition. Messages without text are skipped.
    pub fn add_messages(&mut self, tag: LanguageIdentifier, messages: impl IntoIterator<Item = Message>) {
        self.add_tag(tag.clone());
        let table = self.messages.entry(tag).or_default();
        for message in messages {
            if message.other.is_none() {
                debug!("Skipping message '{}' without text", message.id);
                continue;
            }
            table.insert(message.id.clone(), message);
        }
    }

    /// The language used when no loaded language matches a request.
    pub fn default_language(&self) -> &LanguageIdentifier {
        &self.default_language
    }

    /// Number of messages loaded for `tag` (0 for unknown or unparsable tags).
    pub fn message_count(&self, tag: &str) -> usize {
        tag.parse::<LanguageIdentifier>()
            .ok()
            .and_then(|tag| self.messages.get(&tag))
            .map(HashMap::len)
            .unwrap_or(0)
    }

    fn add_tag(&mut self, tag: LanguageIdentifier) {
        if !self.tags.contains(&tag) {
            self.tag_names.push(tag.to_string());
            self.tags.push(tag);
        }
    }

    /// Pick the loaded language serving `locale`: the exact tag, then the
    /// first tag with the same language subtag, then the default.
    fn match_tag(&self, locale: &str) -> &LanguageIdentifier {
        let Ok(requested) = locale.trim().parse::<LanguageIdentifier>() else {
            return &self.default_language;
        };

        self.tags
            .iter()
            .find(|tag| **tag == requested)
            .or_else(|| self.tags.iter().find(|tag| tag.language == requested.language))
            .unwrap_or(&self.default_language)
    }

    fn lookup(&self, tag: &LanguageIdentifier, message_id: &str) -> Option<&str> {
        self.messages
            .get(tag)?
            .get(message_id)?
            .other
            .as_deref()
    }
}

impl Catalog for MessageBundle {
    fn supported_tags(&self) -> &[String] {
        &self.tag_names
    }

    fn localize(
        &self,
        locale: &str,
        message_id: &str,
        _description: Option<&str>,
    ) -> Result<String, LocalizeError> {
        if message_id.is_empty() {
            return Err(LocalizeError::EmptyMessageId);
        }

        let tag = self.match_tag(locale);
        self.lookup(tag, message_id)
            .or_else(|| self.lookup(&self.default_language, message_id))
            .map(str::to_string)
            .ok_or_else(|| LocalizeError::MessageNotFound {
                message_id: message_id.to_string(),
                locale: tag.to_string(),
            })
    }
}

/// Extract the language tag from a message file name.
fn language_tag_from_path(path: &Path) -> Result<LanguageIdentifier, CatalogError> {
    let raw = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('.').next())
        .filter(|tag| !tag.is_empty())
        .ok_or_else(|| CatalogError::MissingLanguageTag(path.to_path_buf()))?;

    raw.parse().map_err(|_| CatalogError::InvalidLanguageTag {
        path: path.to_path_buf(),
        tag: raw.to_string(),
    })
}
