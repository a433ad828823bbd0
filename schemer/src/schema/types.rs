//! Type definitions for schema objects

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Canvas coordinates of a table. Owned by rendering, opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current time truncated to the millisecond precision the project file keeps
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}

/// Represents a table being modeled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub options: IndexMap<String, bool>,
}

impl Table {
    /// Create a new table with a fresh identifier
    pub fn new(name: &str, position: Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            timestamp: now_millis(),
            position,
            options: IndexMap::new(),
        }
    }

    /// Set the option toggles for the table
    pub fn with_options(mut self, options: IndexMap<String, bool>) -> Self {
        self.options = options;
        self
    }

    /// Whether an option is present and enabled
    pub fn option(&self, name: &str) -> bool {
        self.options.get(name).copied().unwrap_or(false)
    }
}

/// Represents a field owned by exactly one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    #[serde(rename = "tableID")]
    pub table_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    /// Create a new field with a fresh identifier
    pub fn new(table_id: Uuid, name: &str, field_type: FieldType) -> Self {
        Self {
            id: Uuid::new_v4(),
            table_id,
            name: name.to_string(),
            field_type,
        }
    }
}

/// A derived foreign-key edge from the table owning `field_id` to `to_table_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: Uuid,
    #[serde(rename = "fieldID")]
    pub field_id: Uuid,
    #[serde(rename = "fromTableID")]
    pub from_table_id: Uuid,
    #[serde(rename = "toTableID")]
    pub to_table_id: Uuid,
}

impl Relation {
    /// Create a new relation with a fresh identifier
    pub fn new(field_id: Uuid, from_table_id: Uuid, to_table_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            field_id,
            from_table_id,
            to_table_id,
        }
    }
}

/// Name and type of a field to create alongside a new table
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
        }
    }
}

/// Primitive storage types a field may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    BigInt,
    Binary,
    Boolean,
    Char,
    Date,
    DateTime,
    DateTimeTz,
    Decimal,
    Double,
    Enum,
    Float,
    Increment,
    Integer,
    IpAddress,
    Json,
    Jsonb,
    LongText,
    MacAddress,
    MediumInt,
    MediumText,
    Morphs,
    NullableMorphs,
    SmallInt,
    String,
    Text,
    Time,
    TimeTz,
    TinyInt,
    Timestamp,
    TimestampTz,
    UBigInt,
    UInt,
    UMediumInt,
    USmallInt,
    UTinyInt,
    Uuid,
}

impl FieldType {
    pub const ALL: [FieldType; 36] = [
        FieldType::BigInt,
        FieldType::Binary,
        FieldType::Boolean,
        FieldType::Char,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::DateTimeTz,
        FieldType::Decimal,
        FieldType::Double,
        FieldType::Enum,
        FieldType::Float,
        FieldType::Increment,
        FieldType::Integer,
        FieldType::IpAddress,
        FieldType::Json,
        FieldType::Jsonb,
        FieldType::LongText,
        FieldType::MacAddress,
        FieldType::MediumInt,
        FieldType::MediumText,
        FieldType::Morphs,
        FieldType::NullableMorphs,
        FieldType::SmallInt,
        FieldType::String,
        FieldType::Text,
        FieldType::Time,
        FieldType::TimeTz,
        FieldType::TinyInt,
        FieldType::Timestamp,
        FieldType::TimestampTz,
        FieldType::UBigInt,
        FieldType::UInt,
        FieldType::UMediumInt,
        FieldType::USmallInt,
        FieldType::UTinyInt,
        FieldType::Uuid,
    ];

    /// Tag used in project files
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::BigInt => "BIG_INT",
            FieldType::Binary => "BINARY",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Char => "CHAR",
            FieldType::Date => "DATE",
            FieldType::DateTime => "DATE_TIME",
            FieldType::DateTimeTz => "DATE_TIME_TZ",
            FieldType::Decimal => "DECIMAL",
            FieldType::Double => "DOUBLE",
            FieldType::Enum => "ENUM",
            FieldType::Float => "FLOAT",
            FieldType::Increment => "INCREMENT",
            FieldType::Integer => "INTEGER",
            FieldType::IpAddress => "IP_ADDRESS",
            FieldType::Json => "JSON",
            FieldType::Jsonb => "JSONB",
            FieldType::LongText => "LONG_TEXT",
            FieldType::MacAddress => "MAC_ADDRESS",
            FieldType::MediumInt => "MEDIUM_INT",
            FieldType::MediumText => "MEDIUM_TEXT",
            FieldType::Morphs => "MORPHS",
            FieldType::NullableMorphs => "NULLABLE_MORPHS",
            FieldType::SmallInt => "SMALL_INT",
            FieldType::String => "STRING",
            FieldType::Text => "TEXT",
            FieldType::Time => "TIME",
            FieldType::TimeTz => "TIME_TZ",
            FieldType::TinyInt => "TINY_INT",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::TimestampTz => "TIMESTAMP_TZ",
            FieldType::UBigInt => "U_BIG_INT",
            FieldType::UInt => "U_INT",
            FieldType::UMediumInt => "U_MEDIUM_INT",
            FieldType::USmallInt => "U_SMALL_INT",
            FieldType::UTinyInt => "U_TINY_INT",
            FieldType::Uuid => "UUID",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::ValidationError(format!("Unknown field type: {}", s)))
    }
}

/// Project-level metadata stored next to the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_zoom")]
    pub zoom: u32,
}

fn default_zoom() -> u32 {
    100
}

impl ProjectMeta {
    pub fn new(name: &str, zoom: u32) -> Self {
        Self {
            name: name.to_string(),
            timestamp: now_millis(),
            zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_type_tags_match_serde() {
        for field_type in FieldType::ALL {
            let json = serde_json::to_string(&field_type).unwrap();
            assert_eq!(json, format!("\"{}\"", field_type.as_str()));
        }
    }

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("INTEGER".parse::<FieldType>().unwrap(), FieldType::Integer);
        assert_eq!("u_big_int".parse::<FieldType>().unwrap(), FieldType::UBigInt);
        assert!("VARCHAR".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_legacy_field_layout() {
        let json = r#"{
            "id": "4f1b7c3e-7a43-4c62-9a43-3c1d9b3d2f10",
            "tableID": "a0e3b51c-3c4e-4f5e-8a1e-2bd0b7e3f0a1",
            "name": "user_id",
            "type": "INTEGER"
        }"#;

        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.name, "user_id");
        assert_eq!(field.field_type, FieldType::Integer);
        assert_eq!(
            field.table_id.to_string(),
            "a0e3b51c-3c4e-4f5e-8a1e-2bd0b7e3f0a1"
        );
    }

    #[test]
    fn test_table_without_options() {
        let json = r#"{
            "id": "a0e3b51c-3c4e-4f5e-8a1e-2bd0b7e3f0a1",
            "name": "NewTable",
            "timestamp": 1546300800000,
            "position": { "x": 16.0, "y": 64.0 }
        }"#;

        let table: Table = serde_json::from_str(json).unwrap();
        assert!(table.options.is_empty());
        assert!(!table.option("timestamps"));
        assert_eq!(table.timestamp.timestamp_millis(), 1546300800000);
    }
}
