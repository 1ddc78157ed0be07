//! DataIndex building and validation.
//!
//! Loads a dataset directory into the in-memory store:
//! - Parse the three files in parallel
//! - Insert records (interactions are kept most-recent-first per user)
//! - Validate referential integrity

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::info;

impl DataIndex {
    /// Load a whole dataset directory.
    ///
    /// Expects `users.dat`, `items.dat` and `interactions.dat` inside `data_dir`.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog dataset from {:?}", data_dir);

        let users_path = data_dir.join("users.dat");
        let items_path = data_dir.join("items.dat");
        let interactions_path = data_dir.join("interactions.dat");

        // Three-way parallel parse with nested joins
        let ((users, items), interactions) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_users(&users_path),
                    || parser::parse_items(&items_path),
                )
            },
            || parser::parse_interactions(&interactions_path),
        );

        let users = users?;
        let items = items?;
        let mut interactions = interactions?;

        info!(
            "Parsed {} users, {} items, {} interactions",
            users.len(),
            items.len(),
            interactions.len()
        );

        let mut index = DataIndex::new();

        for user in users {
            index.insert_user(user);
        }

        // Sorting up front keeps every per-user insert an append
        let mut items = items;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        for item in items {
            index.insert_item(item);
        }

        interactions.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        for interaction in interactions {
            index.insert_interaction(interaction);
        }

        index.validate()?;

        info!("DataIndex successfully built and validated");
        Ok(index)
    }

    /// Validate data integrity
    ///
    /// Every interaction must point at a known user and a known item, every
    /// item must have a non-empty category, and every recency index entry
    /// must match a current eligible item.
    pub fn validate(&self) -> Result<()> {
        for item in self.items.values() {
            if item.category.is_empty() {
                return Err(DataLoadError::InvalidValue {
                    field: "category".to_string(),
                    value: format!("<empty> on item {}", item.id),
                });
            }
        }

        for (user_id, interactions) in &self.user_interactions {
            if !self.users.contains_key(user_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "User".to_string(),
                    id: *user_id,
                });
            }
            for interaction in interactions {
                if !self.items.contains_key(&interaction.item_id) {
                    return Err(DataLoadError::MissingReference {
                        entity: "Item".to_string(),
                        id: interaction.item_id,
                    });
                }
            }
        }

        for (created_at, id) in &self.eligible_by_recency {
            match self.items.get(id) {
                Some(item) if item.is_eligible() && item.created_at == *created_at => {}
                _ => {
                    return Err(DataLoadError::ValidationError(format!(
                        "recency index entry for item {} is stale",
                        id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;

    fn write_dataset(name: &str, interactions: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("data-loader-index-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("users.dat"), "1::alice\n2::bob\n").unwrap();
        fs::write(
            dir.join("items.dat"),
            "10::100::tech::700::1000::10::1700000000::published::public::rust\n\
             11::101::music::200::10::1::1700000500::published::public::\n\
             12::101::music::200::10::1::1700000900::draft::public::\n",
        )
        .unwrap();
        fs::write(dir.join("interactions.dat"), interactions).unwrap();
        dir
    }

    #[test]
    fn test_load_dataset() {
        let dir = write_dataset(
            "ok",
            "1::10::view::1700001000\n1::11::like::1700002000\n2::10::dislike::1700003000\n",
        );
        let index = DataIndex::load_from_files(&dir).unwrap();
        let (users, items, interactions) = index.counts();

        assert_eq!(users, 2);
        assert_eq!(items, 3);
        assert_eq!(interactions, 3);

        // Most recent first
        let history = index.get_user_interactions(1);
        assert_eq!(history[0].item_id, 11);
        assert_eq!(history[1].item_id, 10);

        // Draft item 12 never enters the recency index
        let eligible: Vec<ItemId> = index.eligible_by_recency.iter().map(|(_, id)| *id).collect();
        assert_eq!(eligible, vec![11, 10]);
    }

    #[test]
    fn test_dangling_interaction_is_rejected() {
        let dir = write_dataset("dangling", "1::999::view::1700001000\n");
        let result = DataIndex::load_from_files(&dir);

        assert!(matches!(
            result,
            Err(DataLoadError::MissingReference { id: 999, .. })
        ));
    }

    #[test]
    fn test_stale_recency_entry_is_rejected() {
        let dir = write_dataset("stale", "1::10::view::1700001000\n");
        let mut index = DataIndex::load_from_files(&dir).unwrap();
        assert!(index.validate().is_ok());

        // Draft item 12 smuggled into the recency index
        let draft_created_at = index.get_item(12).unwrap().created_at;
        index.eligible_by_recency.push((draft_created_at, 12));
        assert!(matches!(index.validate(), Err(DataLoadError::ValidationError(_))));

        index.eligible_by_recency.pop();
        index.eligible_by_recency.push((Utc.timestamp_opt(1, 0).unwrap(), 404));
        assert!(matches!(index.validate(), Err(DataLoadError::ValidationError(_))));
    }

    #[test]
    fn test_insert_interaction_keeps_recency_order() {
        let mut index = DataIndex::new();
        for (item_id, ts) in [(1, 100), (2, 300), (3, 200)] {
            index.insert_interaction(Interaction {
                user_id: 7,
                item_id,
                kind: InteractionKind::View,
                occurred_at: Utc.timestamp_opt(ts, 0).unwrap(),
            });
        }

        let ids: Vec<ItemId> = index.get_user_interactions(7).iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
