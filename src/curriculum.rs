//! Pure derivations over already-fetched collections.
//!
//! Every function here is total: no I/O, no caching, no failure modes;
//! empty input produces empty output. Inputs are never mutated, only
//! filtered, reordered or sliced.

use std::collections::BTreeSet;

use crate::domain::{ContentItem, Language};

/// Keep items whose language tag exactly equals `target`.
///
/// `Language::Default` matches only untagged items. No locale fallback,
/// no prefix matching: `pt` does not match `pt-BR`.
pub fn filter_by_language(items: &[ContentItem], target: &Language) -> Vec<ContentItem> {
    items
        .iter()
        .filter(|item| item.language == *target)
        .cloned()
        .collect()
}

/// Extract the canonical curriculum for a language.
///
/// Selects items with a defined `order`, sorted ascending, ties broken by
/// `slug` for determinism. The fallback applies at the whole-collection
/// level: only when the primary language yields zero ordered items is the
/// fallback language tried.
pub fn ordered_steps(
    items: &[ContentItem],
    language: &Language,
    fallback: Option<&Language>,
) -> Vec<ContentItem> {
    let steps = ordered_in(items, language);
    if !steps.is_empty() {
        return steps;
    }
    match fallback {
        Some(fallback) => ordered_in(items, fallback),
        None => steps,
    }
}

fn ordered_in(items: &[ContentItem], language: &Language) -> Vec<ContentItem> {
    let mut steps: Vec<ContentItem> = items
        .iter()
        .filter(|item| item.language == *language && item.is_step())
        .cloned()
        .collect();
    steps.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.slug.cmp(&b.slug)));
    steps
}

/// Select "what else is available": items in the target language that are
/// neither part of the curriculum nor the item currently being viewed,
/// truncated to `limit` while preserving the collection's relative order.
pub fn additional_resources(
    items: &[ContentItem],
    steps: &[ContentItem],
    current_slug: Option<&str>,
    language: &Language,
    limit: usize,
) -> Vec<ContentItem> {
    let step_slugs: BTreeSet<&str> = steps.iter().map(|step| step.slug.as_str()).collect();
    items
        .iter()
        .filter(|item| item.language == *language)
        .filter(|item| !step_slugs.contains(item.slug.as_str()))
        .filter(|item| current_slug != Some(item.slug.as_str()))
        .take(limit)
        .cloned()
        .collect()
}
