//! Fixed English to Bulgarian phrase table.

use regex::Regex;
use std::collections::HashMap;

/// Built-in phrases: cities, legal forms and names seen on invoices.
pub const BUILTIN_PHRASES: &[(&str, &str)] = &[
    ("Sofia", "София"),
    ("Varna", "Варна"),
    ("Burgas", "Бургас"),
    ("Plovdiv", "Пловдив"),
    ("Ruse", "Русе"),
    ("Stara Zagora", "Стара Загора"),
    ("Bulgaria", "България"),
    ("QUESTE LTD", "Куесте ООД"),
    ("Banana Express EOOD", "Банана Експрес ЕООД"),
    ("Aleksandar Stamboliiski", "Александър Стамболийски"),
    ("EUROBANK BULGARIA AD", "Юробанк България АД"),
    ("Ltd", "ООД"),
    ("EOOD", "ЕООД"),
    ("OOD", "ООД"),
    ("EAD", "ЕАД"),
    ("Consulting services per invoice", "Консултантски услуги по фактура"),
    ("Consulting services", "Консултантски услуги"),
];

/// Whole-word, case-insensitive phrase replacement. Longer phrases win over
/// phrases they contain.
pub struct Glossary {
    translations: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl Glossary {
    pub fn new<I, K, V>(phrases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let translations: HashMap<String, String> = phrases
            .into_iter()
            .map(|(k, v)| (k.into().to_lowercase(), v.into()))
            .filter(|(k, _)| !k.trim().is_empty())
            .collect();

        let mut keys: Vec<&String> = translations.keys().collect();
        keys.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).ok()
        };

        Self {
            translations,
            pattern,
        }
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Replace every known phrase in `text`.
    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &regex::Captures| {
                let found = &caps[0];
                self.translations
                    .get(&found.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| found.to_string())
            })
            .into_owned()
    }
}

impl Default for Glossary {
    fn default() -> Self {
        Self::new(BUILTIN_PHRASES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_names() {
        let glossary = Glossary::default();
        assert_eq!(glossary.apply("Sofia"), "София");
        assert_eq!(glossary.apply("Banana Express EOOD"), "Банана Експрес ЕООД");
        assert_eq!(glossary.apply("QUESTE LTD"), "Куесте ООД");
    }

    #[test]
    fn test_longest_phrase_wins() {
        let glossary = Glossary::default();
        assert_eq!(
            glossary.apply("Aleksandar Stamboliiski 134, Sofia"),
            "Александър Стамболийски 134, София"
        );
        assert_eq!(glossary.apply("Northwind Ltd."), "Northwind ООД.");
    }

    #[test]
    fn test_whole_words_only() {
        let glossary = Glossary::default();
        assert_eq!(glossary.apply("Sofiane Goods"), "Sofiane Goods");
        assert_eq!(glossary.apply("sofia"), "София");
    }

    #[test]
    fn test_custom_phrases() {
        let glossary = Glossary::new([("Hosting", "Хостинг")]);
        assert_eq!(glossary.len(), 1);
        assert_eq!(glossary.apply("Hosting Sofia"), "Хостинг Sofia");
        assert!(Glossary::new(Vec::<(String, String)>::new()).is_empty());
    }
}
