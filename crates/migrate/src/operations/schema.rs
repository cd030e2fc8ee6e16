//! Table, column, index, key and sequence operations

use serde::{Deserialize, Serialize};

use super::{Annotatable, Annotations, ReferentialAction, TableName};
use crate::entity::LogicalType;
use crate::value::Value;

/// A fully resolved column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub host_type: LogicalType,
    /// Explicit dialect type; skips the type mapper when set
    pub column_type: Option<String>,
    pub nullable: bool,
    pub identity: bool,
    pub max_length: Option<u32>,
    pub fixed_length: bool,
    pub default_value: Option<Value>,
    pub default_sql: Option<String>,
    pub computed_sql: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, host_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            host_type,
            column_type: None,
            nullable: false,
            identity: false,
            max_length: None,
            fixed_length: false,
            default_value: None,
            default_sql: None,
            computed_sql: None,
            annotations: Annotations::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableOperation {
    pub name: TableName,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Option<AddPrimaryKeyOperation>,
    pub unique_constraints: Vec<AddUniqueConstraintOperation>,
    pub foreign_keys: Vec<AddForeignKeyOperation>,
    #[serde(default)]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTableOperation {
    pub name: TableName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTableOperation {
    pub name: TableName,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnOperation {
    pub table: TableName,
    pub column: ColumnDefinition,
}

/// Replaces a column's definition; the previous definition is not needed
/// by any generator rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterColumnOperation {
    pub table: TableName,
    pub column: ColumnDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropColumnOperation {
    pub table: TableName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameColumnOperation {
    pub table: TableName,
    pub name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexOperation {
    pub name: String,
    pub table: TableName,
    pub columns: Vec<String>,
    pub unique: bool,
    pub clustered: bool,
    #[serde(default)]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndexOperation {
    pub name: String,
    pub table: TableName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameIndexOperation {
    pub table: TableName,
    pub name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPrimaryKeyOperation {
    pub name: String,
    pub table: TableName,
    pub columns: Vec<String>,
    pub clustered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPrimaryKeyOperation {
    pub name: String,
    pub table: TableName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddUniqueConstraintOperation {
    pub name: String,
    pub table: TableName,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropUniqueConstraintOperation {
    pub name: String,
    pub table: TableName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddForeignKeyOperation {
    pub name: String,
    pub table: TableName,
    pub columns: Vec<String>,
    pub principal_table: TableName,
    pub principal_columns: Vec<String>,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropForeignKeyOperation {
    pub name: String,
    pub table: TableName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSequenceOperation {
    pub name: TableName,
    pub host_type: LogicalType,
    pub start: i64,
    pub increment: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub cycle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterSequenceOperation {
    pub name: TableName,
    pub increment: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub cycle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSequenceOperation {
    pub name: TableName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameSequenceOperation {
    pub name: TableName,
    pub new_name: String,
}

impl Annotatable for ColumnDefinition {
    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}

impl Annotatable for CreateTableOperation {
    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}

impl Annotatable for CreateIndexOperation {
    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}

impl Annotatable for AddColumnOperation {
    fn annotations(&self) -> &Annotations {
        &self.column.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.column.annotations
    }
}

impl Annotatable for AlterColumnOperation {
    fn annotations(&self) -> &Annotations {
        &self.column.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.column.annotations
    }
}
