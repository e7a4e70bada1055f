//! Name transforms between model identifiers and table identifiers.
//!
//! Models are UpperCamelCase (`DrinkOrder`), tables are snake_case and
//! pluralized (`drink_orders`). The singular snake_case form is called the
//! *table ref* (`drink_order`) and names foreign-key columns and model
//! source files.
//!
//! Also provides the table-alias search used by the join builder and the
//! migration filename convention (`<14-digit-timestamp>_<snake_words>`).

use crate::error::{CoreError, Result};
use crate::grammar::{pluralize, singularize};

/// Builds the singular snake_case table ref from a model name.
///
/// ```
/// use trellis_core::naming::model_name_to_table_ref;
///
/// assert_eq!(model_name_to_table_ref("DrinkOrder"), "drink_order");
/// assert_eq!(model_name_to_table_ref("User"), "user");
/// ```
pub fn model_name_to_table_ref(model_name: &str) -> String {
    let mut table_ref = String::with_capacity(model_name.len() + 4);
    for c in model_name.chars() {
        if c.is_uppercase() {
            if !table_ref.is_empty() {
                table_ref.push('_');
            }
            table_ref.extend(c.to_lowercase());
        } else {
            table_ref.push(c);
        }
    }
    table_ref
}

/// Builds the pluralized table name from a model name.
pub fn model_name_to_table_name(model_name: &str) -> String {
    pluralize(&model_name_to_table_ref(model_name))
}

/// Builds the model name from a singular table ref.
pub fn table_ref_to_model_name(table_ref: &str) -> String {
    capitalize_words(table_ref.split('_'))
}

/// Builds the model name from a pluralized table name.
pub fn table_name_to_model_name(table_name: &str) -> String {
    table_ref_to_model_name(&singularize(table_name))
}

/// Builds the foreign-key column name for a referenced table ref.
pub fn foreign_key_column(table_ref: &str) -> String {
    format!("{table_ref}_id")
}

/// Validates that a model name follows the UpperCamelCase convention.
pub fn validate_model_name(model_name: &str) -> Result<()> {
    let starts_upper = model_name.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper || model_name.contains('_') {
        return Err(CoreError::NamingConvention(format!(
            "model name {model_name} should follow the UpperCamelCase naming convention"
        )));
    }
    Ok(())
}

/// Validates that a column name follows the snake_case convention.
pub fn validate_column_name(column: &str) -> Result<()> {
    if column.is_empty() || column != column.to_lowercase() {
        return Err(CoreError::NamingConvention(format!(
            "column name {column} should follow the snake_case naming convention"
        )));
    }
    Ok(())
}

/// Picks a unique alias for each table in `[source] + through`.
///
/// For each table, prefixes are scanned in increasing length starting at the
/// table's initial character, and the first prefix not already taken wins.
/// In the worst case the full table name is used even if it collides; the
/// caller is expected to keep through paths short enough that this does not
/// happen.
///
/// The result is deterministic for a given input.
///
/// ```
/// use trellis_core::naming::table_aliases;
///
/// let through = ["abc".to_string(), "abcdef".to_string(), "b".to_string()];
/// let (source, rest) = table_aliases("a_test_table", &through);
/// assert_eq!(source, "a");
/// assert_eq!(rest, vec!["ab", "abc", "b"]);
/// ```
pub fn table_aliases(source_table: &str, through: &[String]) -> (String, Vec<String>) {
    let mut aliases: Vec<String> = Vec::with_capacity(1 + through.len());

    for table in std::iter::once(source_table).chain(through.iter().map(String::as_str)) {
        let mut chosen = table.to_string();
        for len in 1..=table.len() {
            let candidate = &table[..len];
            if !aliases.iter().any(|taken| taken == candidate) {
                chosen = candidate.to_string();
                break;
            }
        }
        aliases.push(chosen);
    }

    let source_alias = aliases[0].clone();
    (source_alias, aliases.split_off(1))
}

/// A migration unit identity parsed from its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationName {
    /// 14-digit version timestamp, compared lexicographically.
    pub version: String,
    /// Class name derived from the filename words (`create_users` → `CreateUsers`).
    pub class_name: String,
}

/// Parses a migration file stem of the form `<14-digit>_<snake_words>`.
///
/// # Errors
///
/// Returns [`CoreError::NamingConvention`] if the stem has no underscore
/// separator or the leading component is not a 14-digit timestamp.
pub fn parse_migration_stem(stem: &str) -> Result<MigrationName> {
    let (version, words) = stem.split_once('_').ok_or_else(|| {
        CoreError::NamingConvention(format!(
            "migration filename {stem} should look like 20230101000000_create_users"
        ))
    })?;

    if version.len() != 14 || !version.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::NamingConvention(format!(
            "migration filename {stem} should start with a 14-digit timestamp"
        )));
    }

    Ok(MigrationName {
        version: version.to_string(),
        class_name: capitalize_words(words.split('_')),
    })
}

fn capitalize_words<'a>(words: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_to_table_ref() {
        assert_eq!(model_name_to_table_ref("User"), "user");
        assert_eq!(model_name_to_table_ref("DrinkOrder"), "drink_order");
        assert_eq!(model_name_to_table_ref("HttpRequestLog"), "http_request_log");
    }

    #[test]
    fn test_model_table_round_trip() {
        for model in ["User", "DrinkOrder", "Candy", "Box"] {
            let table = model_name_to_table_name(model);
            assert_eq!(table_name_to_model_name(&table), model);
        }
    }

    #[test]
    fn test_model_name_to_table_name_pluralizes() {
        assert_eq!(model_name_to_table_name("User"), "users");
        assert_eq!(model_name_to_table_name("Candy"), "candies");
        assert_eq!(model_name_to_table_name("DrinkOrder"), "drink_orders");
    }

    #[test]
    fn test_foreign_key_column() {
        assert_eq!(foreign_key_column("user"), "user_id");
        assert_eq!(foreign_key_column("drink_order"), "drink_order_id");
    }

    #[test]
    fn test_validate_model_name() {
        assert!(validate_model_name("User").is_ok());
        assert!(validate_model_name("DrinkOrder").is_ok());
        assert!(validate_model_name("user").is_err());
        assert!(validate_model_name("Drink_Order").is_err());
        assert!(validate_model_name("").is_err());
    }

    #[test]
    fn test_validate_column_name() {
        assert!(validate_column_name("name").is_ok());
        assert!(validate_column_name("unit_price").is_ok());
        assert!(validate_column_name("unitPrice").is_err());
        assert!(validate_column_name("").is_err());
    }

    #[test]
    fn test_table_aliases_first_unique_prefix() {
        let through = vec!["abc".to_string(), "abcdef".to_string(), "b".to_string()];
        let (source, rest) = table_aliases("a_test_table", &through);
        assert_eq!(source, "a");
        assert_eq!(rest, vec!["ab", "abc", "b"]);
    }

    #[test]
    fn test_table_aliases_stable() {
        let through = vec!["orders".to_string(), "items".to_string()];
        let first = table_aliases("users", &through);
        let second = table_aliases("users", &through);
        assert_eq!(first, second);
    }

    #[test]
    fn test_table_aliases_no_through() {
        let (source, rest) = table_aliases("users", &[]);
        assert_eq!(source, "u");
        assert!(rest.is_empty());
    }

    #[test]
    fn test_parse_migration_stem() {
        let name = parse_migration_stem("20230101000000_create_users").unwrap();
        assert_eq!(name.version, "20230101000000");
        assert_eq!(name.class_name, "CreateUsers");

        let name = parse_migration_stem("20230101000001_create_drink_orders").unwrap();
        assert_eq!(name.class_name, "CreateDrinkOrders");
    }

    #[test]
    fn test_parse_migration_stem_rejects_bad_shapes() {
        assert!(parse_migration_stem("create_users").is_err());
        assert!(parse_migration_stem("2023_create_users").is_err());
        assert!(parse_migration_stem("20230101000000").is_err());
    }
}
