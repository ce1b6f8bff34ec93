//! Upsert of validated parts into the article master

use crate::db::TargetStore;
use crate::error::Result;
use crate::models::Part;

/// Tally of one load phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// One `"{part_number}: load failed: {cause}"` message per failed write
    pub failures: Vec<String>,
}

impl LoadOutcome {
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }
}

enum Upsert {
    Inserted,
    Updated,
}

/// Insert new parts and update existing ones, in the order given.
///
/// A failing record is logged and counted; the remaining records are still
/// written. Each write commits on its own.
pub fn load(store: &impl TargetStore, parts: &[Part], version: &str) -> LoadOutcome {
    tracing::info!("LOAD: Writing {} parts to article master...", parts.len());

    let mut outcome = LoadOutcome::default();
    for part in parts {
        match upsert(store, part, version) {
            Ok(Upsert::Inserted) => {
                outcome.inserted += 1;
                tracing::debug!("LOAD: Inserted {}", part.part_number);
            }
            Ok(Upsert::Updated) => {
                outcome.updated += 1;
                tracing::debug!("LOAD: Updated {}", part.part_number);
            }
            Err(error) => {
                tracing::error!("LOAD: Failed {} - {error}", part.part_number);
                outcome
                    .failures
                    .push(format!("{}: load failed: {error}", part.part_number));
            }
        }
    }

    tracing::info!(
        "LOAD: Inserted={}, Updated={}, Errors={}",
        outcome.inserted,
        outcome.updated,
        outcome.error_count()
    );
    outcome
}

fn upsert(store: &impl TargetStore, part: &Part, version: &str) -> Result<Upsert> {
    if store.article_exists(&part.part_number)? {
        store.update_article(part, version)?;
        Ok(Upsert::Updated)
    } else {
        store.insert_article(part, version)?;
        Ok(Upsert::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteTargetStore;
    use crate::test_support::FlakyStore;
    use pretty_assertions::assert_eq;

    fn part(part_number: &str, price: f64) -> Part {
        Part {
            id: part_number.to_lowercase(),
            part_number: part_number.to_string(),
            description: format!("{part_number} description"),
            category: None,
            quantity: 1,
            unit_price: price,
            bom_level: 1,
            parent_assembly: None,
            is_assembly: false,
            supplier: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn first_load_inserts_second_load_updates() {
        let store = SqliteTargetStore::open_in_memory().unwrap();
        let parts = vec![part("PRT-001", 1.0), part("PRT-002", 2.0), part("PRT-003", 3.0)];

        let first = load(&store, &parts, "SYNC-1");
        assert_eq!(
            first,
            LoadOutcome {
                inserted: 3,
                updated: 0,
                failures: Vec::new()
            }
        );

        let second = load(&store, &parts, "SYNC-2");
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(store.list_articles_by_version("SYNC-2").unwrap().len(), 3);
        assert!(store.list_articles_by_version("SYNC-1").unwrap().is_empty());
    }

    #[test]
    fn failure_does_not_abort_remaining_records() {
        let store = FlakyStore::rejecting(&["PRT-002"]);
        let parts = vec![part("PRT-001", 1.0), part("PRT-002", 2.0), part("PRT-003", 3.0)];

        let outcome = load(&store, &parts, "SYNC-1");
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.error_count(), 1);
        assert!(outcome.failures[0].starts_with("PRT-002: load failed:"));
        assert!(store.article_exists("PRT-003").unwrap());
        assert!(!store.article_exists("PRT-002").unwrap());
    }

    #[test]
    fn duplicate_part_numbers_in_one_batch_update_in_place() {
        let store = SqliteTargetStore::open_in_memory().unwrap();
        let outcome = load(
            &store,
            &[part("PRT-001", 1.0), part("PRT-001", 4.0)],
            "SYNC-1",
        );
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.updated, 1);

        let article = store.get_article("PRT-001").unwrap().unwrap();
        assert!((article.unit_price - 4.0).abs() < f64::EPSILON);
    }
}
