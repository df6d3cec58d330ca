//! Shared catalog enumerations aligned with the content source's namespaces.

use serde::{Deserialize, Serialize};

/// The fixed set of content namespaces the catalog serves.
///
/// Each resource type owns its own cache namespace and staleness windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Articles,
    Tools,
    Courses,
    ArticleCategories,
    ToolCategories,
    CourseCategories,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Articles => "articles",
            ResourceType::Tools => "tools",
            ResourceType::Courses => "courses",
            ResourceType::ArticleCategories => "article-categories",
            ResourceType::ToolCategories => "tool-categories",
            ResourceType::CourseCategories => "course-categories",
        }
    }

    /// True for the category namespaces.
    pub fn is_taxonomy(self) -> bool {
        matches!(
            self,
            ResourceType::ArticleCategories
                | ResourceType::ToolCategories
                | ResourceType::CourseCategories
        )
    }

    /// The taxonomy namespace serving this resource's categories.
    ///
    /// Category namespaces resolve to themselves.
    pub fn taxonomy_namespace(self) -> ResourceType {
        match self {
            ResourceType::Articles => ResourceType::ArticleCategories,
            ResourceType::Tools => ResourceType::ToolCategories,
            ResourceType::Courses => ResourceType::CourseCategories,
            taxonomy => taxonomy,
        }
    }
}

impl TryFrom<&str> for ResourceType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "articles" => Ok(ResourceType::Articles),
            "tools" => Ok(ResourceType::Tools),
            "courses" => Ok(ResourceType::Courses),
            "article-categories" => Ok(ResourceType::ArticleCategories),
            "tool-categories" => Ok(ResourceType::ToolCategories),
            "course-categories" => Ok(ResourceType::CourseCategories),
            _ => Err(()),
        }
    }
}

/// Read operations the catalog exposes per resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Detail,
    Taxonomy,
    OrderedList,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Detail => "detail",
            Operation::Taxonomy => "taxonomy",
            Operation::OrderedList => "ordered_list",
        }
    }
}
