//! Query key derivation.
//!
//! A [`QueryKey`] is the canonical identity of one logical request:
//! resource type, operation, and a normalized parameter encoding. Two
//! logically identical requests always produce an identical key, however
//! the caller assembled its parameters; any differing parameter value
//! produces a different key.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{Language, Operation, ResourceType};
use crate::source::ListParams;

/// Normalized parameter set for key construction.
///
/// Backed by an ordered map so field names encode in lexicographic order
/// regardless of insertion order; absent (`None`) fields are omitted, so
/// passing a field with no value is identical to not passing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    fields: BTreeMap<&'static str, String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        self.fields.insert(name, value.into());
    }

    pub fn insert_opt(&mut self, name: &'static str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Deterministic `a=1&b=2` encoding, fields sorted by name.
    /// Delimiter characters inside values are percent-escaped so two
    /// distinct parameter sets can never encode to the same string.
    pub fn encode(&self) -> String {
        let mut encoded = String::new();
        for (name, value) in &self.fields {
            if !encoded.is_empty() {
                encoded.push('&');
            }
            encoded.push_str(name);
            encoded.push('=');
            push_escaped(&mut encoded, value);
        }
        encoded
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            _ => out.push(ch),
        }
    }
}

impl From<&ListParams> for ParamSet {
    fn from(params: &ListParams) -> Self {
        let mut set = ParamSet::new();
        set.insert_opt("category", params.category.clone());
        set.insert_opt("language", params.language.as_ref().map(|l| l.param_value().to_string()));
        set.insert_opt("page", params.page.map(|p| p.to_string()));
        set.insert_opt("per_page", params.per_page.map(|p| p.to_string()));
        set.insert_opt("sort", params.sort_field.map(|f| f.as_str().to_string()));
        set.insert_opt(
            "sort_direction",
            params.sort_direction.map(|d| d.as_str().to_string()),
        );
        set.insert_opt("tag", params.tag.clone());
        set
    }
}

/// Canonical, stable cache identity of one catalog request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: ResourceType,
    operation: Operation,
    params: String,
}

impl QueryKey {
    pub fn list(resource: ResourceType, params: &ListParams) -> Self {
        Self {
            resource,
            operation: Operation::List,
            params: ParamSet::from(params).encode(),
        }
    }

    pub fn detail(resource: ResourceType, slug: &str, language: &Language) -> Self {
        let mut set = ParamSet::new();
        set.insert("language", language.param_value());
        set.insert("slug", slug);
        Self {
            resource,
            operation: Operation::Detail,
            params: set.encode(),
        }
    }

    pub fn taxonomy(resource: ResourceType) -> Self {
        Self {
            resource: resource.taxonomy_namespace(),
            operation: Operation::Taxonomy,
            params: String::new(),
        }
    }

    /// Key for the derived curriculum of the courses namespace. The
    /// fallback language is part of the key because it changes the result.
    pub fn ordered_list(language: &Language, fallback: Option<&Language>) -> Self {
        let mut set = ParamSet::new();
        set.insert_opt("fallback", fallback.map(|l| l.param_value().to_string()));
        set.insert("language", language.param_value());
        Self {
            resource: ResourceType::Courses,
            operation: Operation::OrderedList,
            params: set.encode(),
        }
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}/{}", self.resource.as_str(), self.operation.as_str())
        } else {
            write!(
                f,
                "{}/{}?{}",
                self.resource.as_str(),
                self.operation.as_str(),
                self.params
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SortDirection, SortField};

    #[test]
    fn param_set_encodes_in_sorted_field_order() {
        let mut forward = ParamSet::new();
        forward.insert("page", "2");
        forward.insert("category", "rust");
        forward.insert("tag", "async");

        let mut reversed = ParamSet::new();
        reversed.insert("tag", "async");
        reversed.insert("category", "rust");
        reversed.insert("page", "2");

        assert_eq!(forward.encode(), reversed.encode());
        assert_eq!(forward.encode(), "category=rust&page=2&tag=async");
    }

    #[test]
    fn absent_fields_are_omitted() {
        let mut set = ParamSet::new();
        set.insert_opt("category", None::<String>);
        set.insert_opt("page", Some("1".to_string()));
        assert_eq!(set.encode(), "page=1");
    }

    #[test]
    fn identical_list_params_derive_identical_keys() {
        let params = ListParams {
            page: Some(2),
            per_page: Some(10),
            sort_field: Some(SortField::Title),
            sort_direction: Some(SortDirection::Desc),
            category: Some("rust".to_string()),
            tag: None,
            language: Some(Language::Code("fr".to_string())),
        };
        let a = QueryKey::list(ResourceType::Articles, &params);
        let b = QueryKey::list(ResourceType::Articles, &params.clone());
        assert_eq!(a, b);
    }

    #[test]
    fn changing_any_field_changes_the_key() {
        let base = ListParams {
            page: Some(1),
            ..Default::default()
        };
        let key = QueryKey::list(ResourceType::Tools, &base);

        let other_page = ListParams {
            page: Some(2),
            ..Default::default()
        };
        assert_ne!(key, QueryKey::list(ResourceType::Tools, &other_page));
        assert_ne!(key, QueryKey::list(ResourceType::Articles, &base));
    }

    #[test]
    fn delimiter_bearing_values_cannot_collide() {
        // A value smuggling `&tag=x` must not alias the request that
        // passes `tag` as its own field.
        let smuggled = ListParams {
            category: Some("rust&tag=x".to_string()),
            ..Default::default()
        };
        let split = ListParams {
            category: Some("rust".to_string()),
            tag: Some("x".to_string()),
            ..Default::default()
        };
        assert_ne!(
            QueryKey::list(ResourceType::Articles, &smuggled),
            QueryKey::list(ResourceType::Articles, &split)
        );

        let literal_escape = QueryKey::detail(ResourceType::Articles, "a%26b", &Language::Default);
        let raw_delimiter = QueryKey::detail(ResourceType::Articles, "a&b", &Language::Default);
        assert_ne!(literal_escape, raw_delimiter);

        let mut set = ParamSet::new();
        set.insert("slug", "a=b&c");
        assert_eq!(set.encode(), "slug=a%3Db%26c");
    }

    #[test]
    fn none_language_differs_from_default_language_filter() {
        let unfiltered = ListParams::default();
        let default_only = ListParams {
            language: Some(Language::Default),
            ..Default::default()
        };
        assert_ne!(
            QueryKey::list(ResourceType::Courses, &unfiltered),
            QueryKey::list(ResourceType::Courses, &default_only)
        );
    }

    #[test]
    fn detail_keys_separate_localized_variants() {
        let default = QueryKey::detail(ResourceType::Articles, "intro", &Language::Default);
        let fr = QueryKey::detail(
            ResourceType::Articles,
            "intro",
            &Language::Code("fr".to_string()),
        );
        assert_ne!(default, fr);
    }

    #[test]
    fn taxonomy_key_normalizes_to_category_namespace() {
        assert_eq!(
            QueryKey::taxonomy(ResourceType::Articles),
            QueryKey::taxonomy(ResourceType::ArticleCategories)
        );
    }

    #[test]
    fn ordered_list_key_includes_fallback() {
        let with = QueryKey::ordered_list(
            &Language::Code("fr".to_string()),
            Some(&Language::Default),
        );
        let without = QueryKey::ordered_list(&Language::Code("fr".to_string()), None);
        assert_ne!(with, without);
        assert_eq!(
            with.to_string(),
            "courses/ordered_list?fallback=default&language=fr"
        );
    }
}
