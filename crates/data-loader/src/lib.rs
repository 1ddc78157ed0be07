//! # Data Loader Crate
//!
//! Typed catalog records and the relational-store contract used by the
//! recommendation engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (User, Item, Interaction, DataIndex)
//! - **parser**: Parse `.dat` files into Rust structs
//! - **index**: Build and validate the in-memory store
//! - **store**: The async `ContentStore` trait and its in-memory implementation
//! - **error**: Error types for loading and querying
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{ContentStore, DataIndex, InteractionKind};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/recs"))?;
//! let views = index.recent_interactions(1, InteractionKind::View, 100).await?;
//! let candidates = index.eligible_items(1, 1000).await?;
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use async_trait::async_trait;

pub use error::{DataLoadError, Result, StoreError, StoreResult};
pub use store::ContentStore;
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    CreatorId,
    // Core types
    User,
    Item,
    Interaction,
    RecommendationLogEntry,
    DataIndex,
    // Enums
    ItemStatus,
    Visibility,
    InteractionKind,
    // Constants
    ALGORITHM_VERSION,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        let (users, items, interactions) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(items, 0);
        assert_eq!(interactions, 0);
    }

    #[test]
    fn test_insert_item_replaces_previous_version() {
        let mut index = DataIndex::new();
        let mut item = Item {
            id: 1,
            creator_id: 9,
            category: "gaming".to_string(),
            duration_secs: 300,
            view_count: 1,
            like_count: 0,
            created_at: Utc::now(),
            status: ItemStatus::Published,
            visibility: Visibility::Public,
            tags: Default::default(),
        };
        index.insert_item(item.clone());
        assert_eq!(index.eligible_by_recency.len(), 1);

        item.status = ItemStatus::Archived;
        index.insert_item(item);
        assert_eq!(index.eligible_by_recency.len(), 0);
        assert_eq!(index.get_item(1).unwrap().status, ItemStatus::Archived);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        assert!(index.get_user(999).is_none());
        assert!(index.get_item(999).is_none());
        assert!(index.get_user_interactions(999).is_empty());
        assert!(index.recommendation_log().is_empty());
        assert!(index.get_all_user_ids().is_empty());
    }
}
