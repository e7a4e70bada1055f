//! Declarative database seeding.
//!
//! Seeds live in `db/seeds.yml` as an ordered list of table groups, so rows
//! land in dependency order:
//!
//! ```yaml
//! - table: users
//!   rows:
//!     - name: ada
//! - table: drink_orders
//!   rows:
//!     - item: latte
//!       user_id: 1
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;
use trellis_core::schema::SchemaRegistry;
use trellis_core::value::Value;
use trellis_store::Store;

use crate::error::Result;

/// Where a project keeps its seed data.
pub fn default_seed_path() -> PathBuf {
    PathBuf::from("db").join("seeds.yml")
}

/// Rows for one table, inserted in file order.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedGroup {
    /// Target table.
    pub table: String,
    /// Column → value per row.
    #[serde(default)]
    pub rows: Vec<BTreeMap<String, Value>>,
}

/// Inserts every seed row, returning the number inserted.
///
/// A missing seed file is not an error; there is simply nothing to do.
pub fn run_seeds(
    store: &mut dyn Store,
    schema: &SchemaRegistry,
    path: &Path,
) -> Result<usize> {
    if !path.is_file() {
        info!(path = %path.display(), "no seed file, skipping");
        return Ok(0);
    }

    let groups: Vec<SeedGroup> = serde_yaml::from_str(&fs::read_to_string(path)?)?;
    let mut inserted = 0;
    for group in groups {
        let table_schema = schema.get(&group.table)?;
        for row in group.rows {
            let values: Vec<(String, Value)> = row.into_iter().collect();
            store.insert(&group.table, table_schema, &values)?;
            inserted += 1;
        }
    }
    info!(rows = inserted, "seeded database");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_groups_parse_in_order() {
        let groups: Vec<SeedGroup> = serde_yaml::from_str(
            r#"
- table: users
  rows:
    - name: ada
- table: drink_orders
  rows:
    - item: latte
      user_id: 1
    - item: mocha
      user_id: 1
"#,
        )
        .unwrap();
        assert_eq!(groups[0].table, "users");
        assert_eq!(groups[1].table, "drink_orders");
        assert_eq!(groups[1].rows.len(), 2);
        assert_eq!(groups[1].rows[0]["user_id"], Value::Integer(1));
        assert_eq!(groups[0].rows[0]["name"], Value::from("ada"));
    }
}
