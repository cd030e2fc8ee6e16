//! Raw statements and data operations
//!
//! Data operations carry resolved column names and literal values; the
//! generator synthesizes the INSERT / UPDATE / DELETE text.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::TableName;
use crate::value::Value;

/// Literal SQL passed through to the generated script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlOperation {
    pub sql: String,
}

/// Row filter for update and delete operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Conjunction of `column = value` predicates (`IS NULL` for null values)
    Equals(Vec<(String, Value)>),
    /// Predicate text used verbatim after `WHERE`
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertDataOperation {
    pub table: TableName,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDataOperation {
    pub table: TableName,
    pub values: Vec<(String, Value)>,
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteDataOperation {
    pub table: TableName,
    pub filter: Option<Filter>,
}

/// Product-specific operation that only a dialect generator understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionOperation {
    pub kind: String,
    pub table: Option<TableName>,
    pub payload: JsonValue,
}
