//! Content records served by the headless content source.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Language tag attached to a content item.
///
/// The wire representation is a nullable string; absence means the item
/// belongs to the site's default language. Modelled as a tagged value so
/// "unset" and "explicitly default" cannot diverge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    /// The site's default language (no tag on the wire).
    #[default]
    Default,
    /// A specific language code, e.g. `fr` or `pt-BR`.
    Code(String),
}

impl Language {
    /// Build a language from an optional wire-level code.
    pub fn from_code(code: Option<String>) -> Self {
        match code {
            Some(code) if !code.is_empty() => Language::Code(code),
            _ => Language::Default,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Language::Default => None,
            Language::Code(code) => Some(code),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Language::Default)
    }

    /// Stable token used in query-key encoding.
    pub fn param_value(&self) -> &str {
        match self {
            Language::Default => "default",
            Language::Code(code) => code,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param_value())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Language::Default => serializer.serialize_none(),
            Language::Code(code) => serializer.serialize_some(code),
        }
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Language::from_code(Option::<String>::deserialize(
            deserializer,
        )?))
    }
}

/// The unit the catalog deals in.
///
/// `slug` plus `language` identify an item within a resource type; two
/// items may share a `slug` across different languages (localized
/// variants of the same logical content). Values are immutable once
/// returned from the source; derivations filter, reorder and slice but
/// never mutate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub taxonomy_refs: BTreeSet<String>,
    /// Set only for curriculum items; drives ordered-step extraction.
    #[serde(default)]
    pub order: Option<i64>,
}

impl ContentItem {
    /// True when this item participates in a structured curriculum.
    pub fn is_step(&self) -> bool {
        self.order.is_some()
    }
}

/// A taxonomy entry (category or tag namespace record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
