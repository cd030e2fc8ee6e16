//! Entity Metadata - how application types describe their persistent shape
//!
//! The schema builder resolves table and column names from this metadata.
//! Every convention (snake_case plural table names, snake_case column names,
//! nullability from the host type, identity for an integer `id`) can be
//! overridden explicitly, and an explicit override always wins.

use serde::{Deserialize, Serialize};

use crate::identifier::{table_name_for, to_snake_case};
use crate::operations::TableName;
use crate::value::Value;

/// Host-side type of a property, mapped to a dialect type by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    Bool,
    Int16,
    Int32,
    Int64,
    Decimal { precision: u8, scale: u8 },
    Float32,
    Float64,
    String,
    Bytes,
    Uuid,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    Json,
}

impl LogicalType {
    pub fn is_integer(&self) -> bool {
        matches!(self, LogicalType::Int16 | LogicalType::Int32 | LogicalType::Int64)
    }

    /// Whether the type accepts a max length
    pub fn is_sized(&self) -> bool {
        matches!(self, LogicalType::String | LogicalType::Bytes)
    }
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalType::Decimal { precision, scale } => write!(f, "decimal({}, {})", precision, scale),
            other => write!(f, "{}", format!("{:?}", other).to_lowercase()),
        }
    }
}

/// Metadata for one entity property
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    property: String,
    column: Option<String>,
    host_type: LogicalType,
    optional: bool,
    required: Option<bool>,
    identity: Option<bool>,
    max_length: Option<u32>,
    fixed_length: bool,
    column_type: Option<String>,
    default_value: Option<Value>,
    default_sql: Option<String>,
    computed_sql: Option<String>,
}

impl ColumnMeta {
    pub fn new(property: impl Into<String>, host_type: LogicalType) -> Self {
        Self {
            property: property.into(),
            column: None,
            host_type,
            optional: false,
            required: None,
            identity: None,
            max_length: None,
            fixed_length: false,
            column_type: None,
            default_value: None,
            default_sql: None,
            computed_sql: None,
        }
    }

    /// The host type is optional (`Option<T>`), so the column is nullable by convention
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Explicit required/nullable override
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Explicit column name override
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    /// Explicit identity (auto-increment) override
    pub fn identity(mut self, identity: bool) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn fixed_length(mut self) -> Self {
        self.fixed_length = true;
        self
    }

    /// Explicit dialect type, bypassing the type mapper
    pub fn column_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn default_sql(mut self, sql: impl Into<String>) -> Self {
        self.default_sql = Some(sql.into());
        self
    }

    pub fn computed_sql(mut self, sql: impl Into<String>) -> Self {
        self.computed_sql = Some(sql.into());
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn host_type(&self) -> &LogicalType {
        &self.host_type
    }

    pub fn column_name(&self) -> String {
        self.column.clone().unwrap_or_else(|| to_snake_case(&self.property))
    }

    pub fn is_identity(&self) -> bool {
        self.identity.unwrap_or_else(|| {
            self.host_type.is_integer() && self.property.eq_ignore_ascii_case("id")
        })
    }

    pub fn is_nullable(&self) -> bool {
        match self.required {
            Some(required) => !required,
            None => self.optional && !self.is_identity(),
        }
    }

    pub fn get_max_length(&self) -> Option<u32> {
        self.max_length
    }

    pub fn is_fixed_length(&self) -> bool {
        self.fixed_length
    }

    pub fn get_column_type(&self) -> Option<&str> {
        self.column_type.as_deref()
    }

    pub fn get_default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn get_default_sql(&self) -> Option<&str> {
        self.default_sql.as_deref()
    }

    pub fn get_computed_sql(&self) -> Option<&str> {
        self.computed_sql.as_deref()
    }
}

/// Metadata for one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMeta {
    name: String,
    table: Option<String>,
    schema: Option<String>,
    columns: Vec<ColumnMeta>,
}

impl EntityMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            schema: None,
            columns: Vec::new(),
        }
    }

    /// Explicit table name override
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Explicit schema override
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn column(mut self, column: ColumnMeta) -> Self {
        self.columns.push(column);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Resolve the schema-qualified table name, falling back to `default_schema`
    pub fn table_name(&self, default_schema: Option<&str>) -> TableName {
        let name = self.table.clone().unwrap_or_else(|| table_name_for(&self.name));
        let schema = self.schema.clone().or_else(|| default_schema.map(str::to_string));
        TableName { schema, name }
    }

    /// Find a property by property name, or by resolved column name
    pub fn find(&self, property: &str) -> Option<&ColumnMeta> {
        self.columns
            .iter()
            .find(|c| c.property == property)
            .or_else(|| self.columns.iter().find(|c| c.column_name() == property))
    }
}

/// Implemented by application types whose schema a migration unit declares
///
/// ```
/// use elif_migrate::{ColumnMeta, Entity, EntityMeta, LogicalType};
///
/// struct Tenant;
///
/// impl Entity for Tenant {
///     fn metadata() -> EntityMeta {
///         EntityMeta::new("Tenant")
///             .column(ColumnMeta::new("id", LogicalType::Int64))
///             .column(ColumnMeta::new("displayName", LogicalType::String).max_length(128))
///     }
/// }
///
/// let table = Tenant::metadata().table_name(None);
/// assert_eq!(table.name, "tenants");
/// ```
pub trait Entity {
    fn metadata() -> EntityMeta;
}
