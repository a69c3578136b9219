//! Bulgarian localization: amounts in words, transliteration, glossary and
//! machine translation.

mod glossary;
mod translate;
mod translit;
mod words;

pub use glossary::{Glossary, BUILTIN_PHRASES};
pub use translate::{LibreTranslate, Translator};
pub use translit::transliterate;
pub use words::amount_in_words;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::TranslationError;
use crate::models::config::LocalizationConfig;

/// True when `text` has Cyrillic letters and no Latin ones.
pub fn is_cyrillic(text: &str) -> bool {
    text.chars().any(is_cyrillic_char) && !has_latin(text)
}

fn is_cyrillic_char(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}')
}

fn has_latin(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

/// A localized string and the warning raised while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Localized {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Localized {
    fn clean(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warning: None,
        }
    }
}

/// Renders names and descriptions in Bulgarian.
pub struct Localizer {
    glossary: Glossary,
    translator: Option<Arc<dyn Translator>>,
    target_language: String,
}

impl Localizer {
    /// Localizer using the configured translation service, if any.
    pub fn new(config: &LocalizationConfig) -> Result<Self, TranslationError> {
        let localizer = Self::offline(config);
        match &config.translator_url {
            Some(url) => {
                let client = LibreTranslate::new(
                    url.clone(),
                    config.translator_api_key.clone(),
                    Duration::from_secs(config.timeout_secs),
                )?;
                Ok(localizer.with_translator(Arc::new(client)))
            }
            None => Ok(localizer),
        }
    }

    /// Glossary and transliteration only.
    pub fn offline(config: &LocalizationConfig) -> Self {
        Self {
            glossary: Glossary::default(),
            translator: None,
            target_language: config.target_language.clone(),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    /// Bulgarian rendering of `text`.
    ///
    /// Text without Latin letters is returned as is. Otherwise the glossary
    /// is applied, and any Latin left is machine translated, or
    /// transliterated when no translator is set. A failed translation falls
    /// back to transliteration with a warning.
    pub async fn localize(&self, text: &str) -> Localized {
        if !has_latin(text) {
            return Localized::clean(text);
        }

        let glossed = self.glossary.apply(text);
        if !has_latin(&glossed) {
            debug!("Localized {:?} from glossary", text);
            return Localized::clean(glossed);
        }

        let Some(translator) = &self.translator else {
            return Localized::clean(transliterate(&glossed));
        };

        match translator.translate(&glossed, &self.target_language).await {
            Ok(translated) => Localized::clean(translated),
            Err(e) => {
                warn!("Translation of {:?} failed: {}", text, e);
                Localized {
                    text: transliterate(&glossed),
                    warning: Some(format!("Translation of \"{}\" failed, transliterated instead: {}", text, e)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTranslator {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(&self, _text: &str, _target: &str) -> Result<String, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| TranslationError::Network("connection refused".to_string()))
        }
    }

    fn translator(reply: Option<&'static str>) -> Arc<FakeTranslator> {
        Arc::new(FakeTranslator {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_is_cyrillic() {
        assert!(is_cyrillic("София 1000"));
        assert!(!is_cyrillic("Sofia"));
        assert!(!is_cyrillic("София Ltd"));
        assert!(!is_cyrillic("1234"));
    }

    #[tokio::test]
    async fn test_cyrillic_unchanged() {
        let fake = translator(Some("never"));
        let localizer = Localizer::offline(&LocalizationConfig::default()).with_translator(fake.clone());

        assert_eq!(localizer.localize("ул. Витоша 1").await, Localized::clean("ул. Витоша 1"));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_glossary_before_translation() {
        let fake = translator(Some("never"));
        let localizer = Localizer::offline(&LocalizationConfig::default()).with_translator(fake.clone());

        let localized = localizer.localize("QUESTE LTD").await;

        assert_eq!(localized, Localized::clean("Куесте ООД"));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translation_used() {
        let localizer = Localizer::offline(&LocalizationConfig::default())
            .with_translator(translator(Some("Разработка на софтуер")));

        let localized = localizer.localize("Software development").await;
        assert_eq!(localized, Localized::clean("Разработка на софтуер"));
    }

    #[tokio::test]
    async fn test_translation_failure_transliterates() {
        let localizer =
            Localizer::offline(&LocalizationConfig::default()).with_translator(translator(None));

        let localized = localizer.localize("Northwind").await;

        assert_eq!(localized.text, "Нортвинд");
        assert!(localized.warning.unwrap().contains("Northwind"));
    }

    #[tokio::test]
    async fn test_offline_transliterates() {
        let localizer = Localizer::offline(&LocalizationConfig::default());
        assert_eq!(localizer.localize("Northwind Ltd").await, Localized::clean("Нортвинд ООД"));
    }
}
