//! Item canonicalization.
//!
//! Collapses free-text FAOSTAT commodity labels ("Meat, cattle, boneless",
//! "Coffee, green", "Fruit, tropical fresh nes", ...) into a small taxonomy of
//! canonical items. Matching is driven entirely by [`CanonicalRules`]; the
//! matcher itself holds no knowledge of specific commodities.

use crate::error::{PipelineError, Result};
use crate::model::CanonicalItem;
use lazy_static::lazy_static;
use std::collections::HashSet;

/// Multi-word category prefixes. A label starting with one of these maps to
/// the prefix itself. No entry may be a prefix of another.
const CATEGORY_PREFIXES: &[&str] = &[
    "fruit",
    "oil, olive",
    "oil, palm",
    "other food",
    "potatoes",
    "sweet corn",
    "cotton",
    "cereal",
];

/// Canonical item -> accepted word forms, in priority order.
const WORD_SYNONYMS: &[(&str, &[&str])] = &[
    ("beef", &["beef", "cattle", "bovine", "whey", "veal"]),
    ("chicken", &["chicken", "chickens", "poultry"]),
    ("pork", &["pork", "pig", "pigs", "pigmeat", "lard", "bacon", "ham"]),
    ("turkey", &["turkey", "turkeys"]),
    ("sheep", &["sheep", "mutton", "lamb", "wool"]),
    ("goat", &["goat", "goats"]),
    ("eggs", &["egg", "eggs"]),
    ("milk", &["milk", "cheese", "butter", "cream", "yoghurt", "ghee"]),
    ("coffee", &["coffee"]),
    ("cocoa", &["cocoa", "chocolate"]),
    ("tea", &["tea"]),
    ("tobacco", &["tobacco", "cigarettes", "cigars"]),
    ("sugar", &["sugar", "molasses"]),
    ("soybeans", &["soybean", "soybeans", "soya", "soy"]),
    ("maize", &["maize", "corn"]),
    ("rice", &["rice"]),
    ("wheat", &["wheat", "bulgur"]),
    ("sorghum", &["sorghum"]),
    ("orange", &["orange", "oranges"]),
    ("banana", &["banana", "bananas", "plantains"]),
    ("grape", &["grape", "grapes", "wine", "raisins"]),
    ("apple", &["apple", "apples", "cider"]),
    ("tomato", &["tomato", "tomatoes"]),
    ("beans", &["beans"]),
    ("cashew", &["cashew"]),
    ("brazil nuts", &["brazil"]),
    ("groundnuts", &["groundnuts", "peanut", "peanuts"]),
    ("rubber", &["rubber"]),
    ("other vegetables", &["vegetables", "vegetable"]),
];

/// Prefixes consulted only when no word rule matched.
const FALLBACK_PREFIXES: &[(&str, &str)] = &[("nuts", "other nuts"), ("mat", "mat")];

lazy_static! {
    static ref DEFAULT_CANONICALIZER: ItemCanonicalizer = ItemCanonicalizer::default();
}

/// Inspectable rule table used by [`ItemCanonicalizer`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalRules {
    prefixes: Vec<String>,
    synonyms: Vec<(String, HashSet<String>)>,
    fallbacks: Vec<(String, String)>,
}

impl CanonicalRules {
    /// Rule table with no rules; every label maps to itself (lowercased).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in FAOSTAT commodity taxonomy.
    pub fn builtin() -> Self {
        let mut rules = Self::empty();
        for prefix in CATEGORY_PREFIXES {
            rules = rules.with_prefix(*prefix);
        }
        for (key, words) in WORD_SYNONYMS {
            rules = rules.with_synonyms(*key, words.iter().copied());
        }
        for (prefix, canonical) in FALLBACK_PREFIXES {
            rules = rules.with_fallback(*prefix, *canonical);
        }
        rules
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().to_lowercase();
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
        self
    }

    /// Adds word forms for `key`. An existing key keeps its position in the
    /// table and gains the new words.
    pub fn with_synonyms<I, S>(mut self, key: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let words = words.into_iter().map(|w| w.into().to_lowercase());
        match self.synonyms.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(words),
            None => self.synonyms.push((key, words.collect())),
        }
        self
    }

    pub fn with_fallback(mut self, prefix: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.fallbacks
            .push((prefix.into().to_lowercase(), canonical.into()));
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn synonyms(&self) -> impl Iterator<Item = (&str, &HashSet<String>)> {
        self.synonyms.iter().map(|(k, words)| (k.as_str(), words))
    }

    pub fn fallbacks(&self) -> &[(String, String)] {
        &self.fallbacks
    }

    /// Checks that no category prefix is itself a prefix of another, which
    /// would make the first-match result depend on table order.
    pub fn validate(&self) -> Result<()> {
        for (i, a) in self.prefixes.iter().enumerate() {
            for b in self.prefixes.iter().skip(i + 1) {
                if a.starts_with(b.as_str()) || b.starts_with(a.as_str()) {
                    return Err(PipelineError::Config(format!(
                        "Overlapping category prefixes '{}' and '{}'",
                        a, b
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Maps raw commodity labels to canonical items using a [`CanonicalRules`] table.
#[derive(Clone, Debug)]
pub struct ItemCanonicalizer {
    rules: CanonicalRules,
}

impl Default for ItemCanonicalizer {
    fn default() -> Self {
        Self::new(CanonicalRules::builtin())
    }
}

impl ItemCanonicalizer {
    pub fn new(rules: CanonicalRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &CanonicalRules {
        &self.rules
    }

    /// Canonicalize a raw label. First match wins:
    /// category prefix, then word synonyms (token order, then table order),
    /// then fallback prefixes, then the lowercased label itself.
    ///
    /// Surrounding whitespace is trimmed before lowercasing, so " Fruit x"
    /// hits the "fruit" prefix, unmatched labels come back trimmed, and a
    /// whitespace-only label yields the empty item.
    pub fn canonicalize(&self, raw_item: &str) -> CanonicalItem {
        let label = raw_item.trim().to_lowercase();

        if let Some(prefix) = self
            .rules
            .prefixes
            .iter()
            .find(|p| label.starts_with(p.as_str()))
        {
            return CanonicalItem::new(prefix.clone());
        }

        for token in tokenize(&label) {
            if let Some((key, _)) = self
                .rules
                .synonyms
                .iter()
                .find(|(_, words)| words.contains(token))
            {
                return CanonicalItem::new(key.clone());
            }
        }

        if let Some((_, canonical)) = self
            .rules
            .fallbacks
            .iter()
            .find(|(prefix, _)| label.starts_with(prefix.as_str()))
        {
            return CanonicalItem::new(canonical.clone());
        }

        CanonicalItem::new(label)
    }
}

/// Canonicalize with the built-in rule table.
pub fn canonicalize(raw_item: &str) -> CanonicalItem {
    DEFAULT_CANONICALIZER.canonicalize(raw_item)
}

/// Alphanumeric runs, in input order.
fn tokenize(label: &str) -> impl Iterator<Item = &str> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prefixes_are_mutually_exclusive() {
        assert!(CanonicalRules::builtin().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlapping_prefixes() {
        let rules = CanonicalRules::empty()
            .with_prefix("oil")
            .with_prefix("oil, palm");
        assert!(matches!(rules.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_every_synonym_maps_to_its_key() {
        let rules = CanonicalRules::builtin();
        for (key, words) in rules.synonyms() {
            for word in words {
                let label = format!("Processed ({}) - nes", word.to_uppercase());
                assert_eq!(canonicalize(&label).as_str(), key, "label {:?}", label);

                let label = format!("{}, dried", word);
                assert_eq!(canonicalize(&label).as_str(), key, "label {:?}", label);
            }
        }
    }

    #[test]
    fn test_common_fao_labels() {
        assert_eq!(canonicalize("Coffee, green").as_str(), "coffee");
        assert_eq!(canonicalize("Meat, cattle, boneless (beef & veal)").as_str(), "beef");
        assert_eq!(canonicalize("Meat, chicken").as_str(), "chicken");
        assert_eq!(canonicalize("Cake, soybeans").as_str(), "soybeans");
        assert_eq!(canonicalize("Juice, orange, concentrated").as_str(), "orange");
        assert_eq!(canonicalize("Vegetables, frozen").as_str(), "other vegetables");
    }

    #[test]
    fn test_prefix_beats_word_rules() {
        // "sweet corn" would otherwise hit the "corn" synonym of maize
        assert_eq!(canonicalize("Sweet corn, frozen").as_str(), "sweet corn");
        assert_eq!(canonicalize("Fruit, prepared nes").as_str(), "fruit");
        assert_eq!(canonicalize("Oil, palm").as_str(), "oil, palm");
        assert_eq!(canonicalize("Other food, beef extract").as_str(), "other food");
        assert_eq!(canonicalize("Cotton lint").as_str(), "cotton");
        assert_eq!(canonicalize("Cereals, breakfast").as_str(), "cereal");
    }

    #[test]
    fn test_fallback_prefixes() {
        assert_eq!(canonicalize("Nuts, prepared (exc. groundnuts)").as_str(), "groundnuts");
        assert_eq!(canonicalize("Nuts nes").as_str(), "other nuts");
        assert_eq!(canonicalize("Maté").as_str(), "mat");
        assert_eq!(canonicalize("Mate").as_str(), "mat");
    }

    #[test]
    fn test_unmatched_label_is_lowercased() {
        assert_eq!(canonicalize("Vermouths & similar").as_str(), "vermouths & similar");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(canonicalize(" Fruit x").as_str(), "fruit");
        assert_eq!(canonicalize("  Vermouths ").as_str(), "vermouths");
    }

    #[test]
    fn test_builtin_table_is_inspectable() {
        let rules = CanonicalRules::builtin();
        assert_eq!(rules.prefixes().len(), CATEGORY_PREFIXES.len());
        assert!(rules.prefixes().iter().any(|p| p == "oil, palm"));
        assert_eq!(
            rules.fallbacks(),
            &[
                ("nuts".to_string(), "other nuts".to_string()),
                ("mat".to_string(), "mat".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_and_blank_labels_pass_through() {
        assert_eq!(canonicalize("").as_str(), "");
        assert_eq!(canonicalize("   ").as_str(), "");
    }

    #[test]
    fn test_earliest_key_wins_for_shared_word() {
        let rules = CanonicalRules::empty()
            .with_synonyms("dairy", ["whey", "milk"])
            .with_synonyms("beef", ["beef", "whey"]);
        let canonicalizer = ItemCanonicalizer::new(rules);
        assert_eq!(canonicalizer.canonicalize("Whey, dry").as_str(), "dairy");
    }

    #[test]
    fn test_token_order_decides_before_table_order() {
        // "chicken" is inserted after "beef" but appears first in the label
        assert_eq!(canonicalize("Chicken and beef, canned").as_str(), "chicken");
    }

    #[test]
    fn test_with_synonyms_extends_existing_key() {
        let rules = CanonicalRules::builtin().with_synonyms("coffee", ["espresso"]);
        let canonicalizer = ItemCanonicalizer::new(rules);
        assert_eq!(canonicalizer.canonicalize("Espresso pods").as_str(), "coffee");
        let position = canonicalizer
            .rules()
            .synonyms()
            .position(|(k, _)| k == "coffee");
        assert_eq!(position, Some(8));
    }

    #[test]
    fn test_empty_rules_only_lowercase() {
        let canonicalizer = ItemCanonicalizer::new(CanonicalRules::empty());
        assert_eq!(canonicalizer.canonicalize("Coffee, Green").as_str(), "coffee, green");
    }
}
