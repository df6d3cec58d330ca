//! Domain layer: content records and catalog enumerations.

pub mod item;
pub mod types;

pub use item::{Category, ContentItem, Language};
pub use types::{Operation, ResourceType};
