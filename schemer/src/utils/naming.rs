//! Naming utilities for Schemer
//!
//! This module holds the foreign-key naming conventions used to infer relations, plus the
//! case and pluralization helpers shared by the exporters.

use inflector::Inflector;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::NamingConfig;
use crate::error::{Error, Result};
use crate::schema::types::Table;

/// Default suffix marking a foreign-key field
pub const DEFAULT_FOREIGN_KEY_SUFFIX: &str = "_id";

static DEFAULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<table>.+)_id$").expect("default foreign key pattern"));

/// Strategy deriving the table a field name refers to
pub trait ForeignKeyResolver: Send + Sync + std::fmt::Debug {
    /// Return the table implied by `field_name`, or `None` when the name is not a
    /// foreign-key candidate or no table carries the implied name
    fn resolve<'t>(&self, field_name: &str, tables: &[&'t Table]) -> Option<&'t Table>;
}

fn find_table<'t>(name: &str, tables: &[&'t Table]) -> Option<&'t Table> {
    tables.iter().copied().find(|t| t.name == name)
}

/// Upper-case the first character, leave the rest untouched
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `user_id` implies `User`: strip the suffix, capitalize the first character
#[derive(Debug, Clone)]
pub struct CapitalizeConvention {
    suffix: String,
}

impl CapitalizeConvention {
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
        }
    }

    /// Table name implied by a field name, if the name is a candidate
    pub fn implied_table_name(&self, field_name: &str) -> Option<String> {
        field_name
            .strip_suffix(self.suffix.as_str())
            .filter(|stem| !stem.is_empty())
            .map(capitalize)
    }
}

impl Default for CapitalizeConvention {
    fn default() -> Self {
        Self::new(DEFAULT_FOREIGN_KEY_SUFFIX)
    }
}

impl ForeignKeyResolver for CapitalizeConvention {
    fn resolve<'t>(&self, field_name: &str, tables: &[&'t Table]) -> Option<&'t Table> {
        let name = self.implied_table_name(field_name)?;
        find_table(&name, tables)
    }
}

/// `blog_post_id` implies `BlogPost`
#[derive(Debug, Clone)]
pub struct PascalCaseConvention {
    suffix: String,
}

impl PascalCaseConvention {
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
        }
    }

    pub fn implied_table_name(&self, field_name: &str) -> Option<String> {
        field_name
            .strip_suffix(self.suffix.as_str())
            .filter(|stem| !stem.is_empty())
            .map(|stem| stem.to_pascal_case())
            .filter(|name| !name.is_empty())
    }
}

impl ForeignKeyResolver for PascalCaseConvention {
    fn resolve<'t>(&self, field_name: &str, tables: &[&'t Table]) -> Option<&'t Table> {
        let name = self.implied_table_name(field_name)?;
        find_table(&name, tables)
    }
}

/// Regex with a named `table` capture; the capture is capitalized
#[derive(Debug, Clone)]
pub struct PatternConvention {
    pattern: Regex,
}

impl PatternConvention {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::ConfigError(format!("Invalid foreign key pattern: {}", e)))?;

        if !pattern.capture_names().flatten().any(|n| n == "table") {
            return Err(Error::ConfigError(
                "Foreign key pattern needs a named `table` capture".to_string(),
            ));
        }

        Ok(Self { pattern })
    }

    pub fn implied_table_name(&self, field_name: &str) -> Option<String> {
        let captures = self.pattern.captures(field_name)?;
        let stem = captures.name("table")?.as_str();
        if stem.is_empty() {
            return None;
        }
        Some(capitalize(stem))
    }
}

impl Default for PatternConvention {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl ForeignKeyResolver for PatternConvention {
    fn resolve<'t>(&self, field_name: &str, tables: &[&'t Table]) -> Option<&'t Table> {
        let name = self.implied_table_name(field_name)?;
        find_table(&name, tables)
    }
}

/// Build the resolver selected by the naming configuration
pub fn resolver_from_config(config: &NamingConfig) -> Result<Box<dyn ForeignKeyResolver>> {
    match config.convention.as_str() {
        "capitalize" => Ok(Box::new(CapitalizeConvention::new(
            &config.foreign_key_suffix,
        ))),
        "pascal_case" => Ok(Box::new(PascalCaseConvention::new(
            &config.foreign_key_suffix,
        ))),
        "pattern" => match &config.pattern {
            Some(pattern) => Ok(Box::new(PatternConvention::new(pattern)?)),
            None => Ok(Box::new(PatternConvention::default())),
        },
        other => Err(Error::ConfigError(format!(
            "Unknown naming convention: {}",
            other
        ))),
    }
}

/// Apply a naming convention to a string
pub fn apply_naming_convention(name: &str, convention: &str) -> String {
    match convention {
        "snake_case" => name.to_snake_case(),
        "camel_case" => name.to_camel_case(),
        "pascal_case" => name.to_pascal_case(),
        "kebab_case" => name.to_kebab_case(),
        "screaming_snake_case" => name.to_screaming_snake_case(),
        _ => name.to_string(),
    }
}

/// Convert a singular name to plural
pub fn pluralize(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "person" => "people".to_string(),
        "child" => "children".to_string(),
        "man" => "men".to_string(),
        "woman" => "women".to_string(),
        "foot" => "feet".to_string(),
        "tooth" => "teeth".to_string(),
        "goose" => "geese".to_string(),
        "mouse" => "mice".to_string(),
        _ => name.to_plural(),
    }
}

/// Database table name for a model: `BlogPost` becomes `blog_posts`
pub fn get_table_name(model_name: &str) -> String {
    let snake = model_name.to_snake_case();

    // Irregular plurals are matched per word
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralize(last)),
        None => pluralize(&snake),
    }
}

/// Generate a unique name with a suffix if name exists in the list
pub fn generate_unique_name(name: &str, existing_names: &[&str]) -> String {
    if !existing_names.contains(&name) {
        return name.to_string();
    }

    let mut counter = 1;
    loop {
        let new_name = format!("{}_{}", name, counter);
        if !existing_names.contains(&new_name.as_str()) {
            return new_name;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Position;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tables(names: &[&str]) -> Vec<Table> {
        names
            .iter()
            .map(|n| Table::new(n, Position::default()))
            .collect()
    }

    #[rstest]
    #[case("user_id", Some("User"))]
    #[case("blog_post_id", Some("Blog_post"))]
    #[case("User_id", Some("User"))]
    #[case("_id", None)]
    #[case("user", None)]
    #[case("user_ids", None)]
    #[case("userid", None)]
    fn test_capitalize_implied_name(#[case] field: &str, #[case] expected: Option<&str>) {
        let convention = CapitalizeConvention::default();
        assert_eq!(
            convention.implied_table_name(field).as_deref(),
            expected
        );
    }

    #[test]
    fn test_capitalize_resolves_existing_table() {
        let owned = tables(&["User", "Team"]);
        let refs: Vec<&Table> = owned.iter().collect();
        let convention = CapitalizeConvention::default();

        assert_eq!(
            convention.resolve("team_id", &refs).map(|t| t.id),
            Some(owned[1].id)
        );
        assert!(convention.resolve("post_id", &refs).is_none());
        assert!(convention.resolve("team", &refs).is_none());
    }

    #[test]
    fn test_capitalize_is_case_sensitive_after_capitalization() {
        let owned = tables(&["USER", "user"]);
        let refs: Vec<&Table> = owned.iter().collect();

        assert!(CapitalizeConvention::default()
            .resolve("user_id", &refs)
            .is_none());
    }

    #[test]
    fn test_pascal_case_convention() {
        let owned = tables(&["BlogPost"]);
        let refs: Vec<&Table> = owned.iter().collect();
        let convention = PascalCaseConvention::new("_id");

        assert_eq!(
            convention.implied_table_name("blog_post_id").as_deref(),
            Some("BlogPost")
        );
        assert_eq!(
            convention.resolve("blog_post_id", &refs).map(|t| t.id),
            Some(owned[0].id)
        );
        assert!(CapitalizeConvention::default()
            .resolve("blog_post_id", &refs)
            .is_none());
    }

    #[test]
    fn test_pattern_convention() {
        let owned = tables(&["User"]);
        let refs: Vec<&Table> = owned.iter().collect();
        let convention = PatternConvention::new(r"^fk_(?P<table>\w+)$").unwrap();

        assert_eq!(
            convention.resolve("fk_user", &refs).map(|t| t.id),
            Some(owned[0].id)
        );
        assert!(convention.resolve("user_id", &refs).is_none());
        assert!(PatternConvention::default().resolve("user_id", &refs).is_some());
    }

    #[test]
    fn test_pattern_without_table_capture_is_rejected() {
        assert!(matches!(
            PatternConvention::new(r"^(.+)_id$"),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            PatternConvention::new(r"^(?P<table>"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_resolver_from_config() {
        let mut config = NamingConfig::default();
        assert!(resolver_from_config(&config).is_ok());

        config.convention = "hungarian".to_string();
        assert!(matches!(
            resolver_from_config(&config),
            Err(Error::ConfigError(_))
        ));
    }

    #[rstest]
    #[case("User", "users")]
    #[case("BlogPost", "blog_posts")]
    #[case("Person", "people")]
    #[case("Category", "categories")]
    fn test_table_name(#[case] model: &str, #[case] expected: &str) {
        assert_eq!(get_table_name(model), expected);
    }

    #[test]
    fn test_generate_unique_name() {
        let existing = vec!["Table", "Table_1", "User"];

        assert_eq!(generate_unique_name("Post", &existing), "Post");
        assert_eq!(generate_unique_name("Table", &existing), "Table_2");
    }

    #[test]
    fn test_apply_naming_convention() {
        assert_eq!(apply_naming_convention("UserProfile", "snake_case"), "user_profile");
        assert_eq!(apply_naming_convention("user_profile", "camel_case"), "userProfile");
        assert_eq!(apply_naming_convention("user_profile", "pascal_case"), "UserProfile");
    }
}
