//! Per-resource staleness and retention policy.

use std::collections::BTreeMap;

use time::{Duration, OffsetDateTime};

use crate::domain::ResourceType;

/// Staleness/retention windows for one resource type.
///
/// A value older than `stale_after` is still returned immediately but
/// triggers a background refetch; a value older than `evict_after` is
/// dropped entirely once no reader is active. Nothing is permanently
/// fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlRule {
    pub stale_after: Duration,
    pub evict_after: Duration,
}

// Content lists and details change often; category taxonomies rarely do.
const CONTENT_RULE: TtlRule = TtlRule {
    stale_after: Duration::minutes(5),
    evict_after: Duration::minutes(30),
};
const TAXONOMY_RULE: TtlRule = TtlRule {
    stale_after: Duration::hours(1),
    evict_after: Duration::hours(24),
};

/// Per-resource-type cache freshness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalenessPolicy {
    rules: BTreeMap<ResourceType, TtlRule>,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::with_rules(CONTENT_RULE, TAXONOMY_RULE)
    }
}

impl StalenessPolicy {
    /// Build a policy from one rule for content namespaces and one for
    /// taxonomy namespaces.
    pub fn with_rules(content: TtlRule, taxonomy: TtlRule) -> Self {
        let mut rules = BTreeMap::new();
        for resource in [
            ResourceType::Articles,
            ResourceType::Tools,
            ResourceType::Courses,
            ResourceType::ArticleCategories,
            ResourceType::ToolCategories,
            ResourceType::CourseCategories,
        ] {
            let rule = if resource.is_taxonomy() {
                taxonomy
            } else {
                content
            };
            rules.insert(resource, rule);
        }
        Self { rules }
    }

    /// Override the rule for a single resource type.
    pub fn set_rule(&mut self, resource: ResourceType, rule: TtlRule) {
        self.rules.insert(resource, rule);
    }

    pub fn rule_for(&self, resource: ResourceType) -> TtlRule {
        self.rules.get(&resource).copied().unwrap_or(CONTENT_RULE)
    }

    /// A stale value is still served but due for a background refresh.
    pub fn is_stale(
        &self,
        resource: ResourceType,
        fetched_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> bool {
        now - fetched_at >= self.rule_for(resource).stale_after
    }

    /// An evictable value is dropped on next access or retention sweep.
    /// An entry with an active reader (an in-flight request for its key)
    /// is never evictable.
    pub fn is_evictable(
        &self,
        resource: ResourceType,
        fetched_at: OffsetDateTime,
        now: OffsetDateTime,
        has_active_reader: bool,
    ) -> bool {
        !has_active_reader && now - fetched_at >= self.rule_for(resource).evict_after
    }
}
