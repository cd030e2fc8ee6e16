//! SQL dialects
//!
//! A [`Dialect`] supplies the small hooks the generation rules need: identifier
//! quoting, literal escaping, type mapping and a few clause spellings. The
//! rules themselves live in [`crate::generator`].

pub mod postgres;

pub use postgres::{PostgresDialect, PostgresSqlGenerator};

use crate::entity::LogicalType;
use crate::error::{MigrationError, MigrationResult};
use crate::identifier::quote_identifier;
use crate::operations::{ReferentialAction, TableName};
use crate::value::Value;

/// Column facets that influence type mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFlags {
    pub identity: bool,
    pub fixed_length: bool,
}

/// Dialect hooks consumed by the generation rules
pub trait Dialect: Send + Sync {
    /// Dialect name used in error messages
    fn name(&self) -> &'static str;

    fn identifier_quote(&self) -> char {
        '"'
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        quote_identifier(identifier, self.identifier_quote())
    }

    /// Quote a possibly schema-qualified name
    fn qualify(&self, name: &TableName) -> String {
        match &name.schema {
            Some(schema) => format!("{}.{}", self.quote_identifier(schema), self.quote_identifier(&name.name)),
            None => self.quote_identifier(&name.name),
        }
    }

    fn statement_terminator(&self) -> &'static str {
        ";"
    }

    /// Render a literal value
    fn escape_literal(&self, value: &Value) -> String {
        ansi_literal(value)
    }

    /// Map a host type to a column type
    fn map_type(&self, host_type: &LogicalType, max_length: Option<u32>, flags: TypeFlags) -> MigrationResult<String>;

    /// Clause appended after the type of an identity column
    fn identity_clause(&self) -> Option<&'static str> {
        None
    }

    fn computed_column_clause(&self, sql: &str) -> String {
        format!("GENERATED ALWAYS AS ({}) STORED", sql)
    }

    /// Keyword placed before the column list of a clustered index or key
    fn index_clustering(&self, _clustered: bool) -> Option<&'static str> {
        None
    }

    /// Text appended after the closing parenthesis of CREATE TABLE
    fn table_storage_suffix(&self) -> Option<String> {
        None
    }

    fn referential_action(&self, action: ReferentialAction) -> &'static str {
        match action {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Quote a string literal, doubling embedded single quotes
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Literal rendering shared by dialects that follow standard SQL
pub fn ansi_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) if v.is_finite() => v.to_string(),
        Value::Float64(v) => quote_string(&v.to_string()),
        Value::String(v) => quote_string(v),
        Value::Bytes(v) => format!("X'{}'", hex::encode_upper(v)),
        Value::Uuid(v) => quote_string(&v.to_string()),
        Value::DateTime(v) => quote_string(&v.to_rfc3339()),
        Value::Date(v) => quote_string(&v.format("%Y-%m-%d").to_string()),
        Value::Json(v) => quote_string(&v.to_string()),
    }
}

/// Standard SQL types with identity columns spelled as `GENERATED BY DEFAULT AS IDENTITY`
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn map_type(&self, host_type: &LogicalType, max_length: Option<u32>, flags: TypeFlags) -> MigrationResult<String> {
        if flags.identity && !host_type.is_integer() {
            return Err(MigrationError::TypeMapping(format!(
                "identity columns must be integers, got {}",
                host_type
            )));
        }

        let mapped = match host_type {
            LogicalType::Bool => "BOOLEAN".to_string(),
            LogicalType::Int16 => "SMALLINT".to_string(),
            LogicalType::Int32 => "INTEGER".to_string(),
            LogicalType::Int64 => "BIGINT".to_string(),
            LogicalType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            LogicalType::Float32 => "REAL".to_string(),
            LogicalType::Float64 => "DOUBLE PRECISION".to_string(),
            LogicalType::String => match (max_length, flags.fixed_length) {
                (Some(length), true) => format!("CHAR({})", length),
                (Some(length), false) => format!("VARCHAR({})", length),
                (None, true) => "CHAR(1)".to_string(),
                (None, false) => "CLOB".to_string(),
            },
            LogicalType::Bytes => match max_length {
                Some(length) if flags.fixed_length => format!("BINARY({})", length),
                Some(length) => format!("VARBINARY({})", length),
                None => "BLOB".to_string(),
            },
            LogicalType::Uuid => "CHAR(36)".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::DateTime => "TIMESTAMP".to_string(),
            LogicalType::DateTimeOffset => "TIMESTAMP WITH TIME ZONE".to_string(),
            LogicalType::Json => "CLOB".to_string(),
        };
        Ok(mapped)
    }

    fn identity_clause(&self) -> Option<&'static str> {
        Some("GENERATED BY DEFAULT AS IDENTITY")
    }
}
