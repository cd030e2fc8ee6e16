//! Schema Operations - declarative descriptions of single schema changes
//!
//! A migration step produces an ordered list of [`SchemaOperation`]s. They are
//! plain data: the generator decides how each one becomes SQL. Once a builder
//! has been consumed into its list, nothing mutates the operations again.

pub mod data;
pub mod schema;

pub use data::*;
pub use schema::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form per-operation settings consumed by dialect generators
pub type Annotations = BTreeMap<String, String>;

/// Well-known annotation keys
pub mod annotations {
    /// Column or table comment
    pub const COMMENT: &str = "comment";
    /// Index access method (`btree`, `gin`, ...)
    pub const INDEX_METHOD: &str = "index_method";
}

/// Implemented by operations that carry [`Annotations`]
pub trait Annotatable {
    fn annotations(&self) -> &Annotations;
    fn annotations_mut(&mut self) -> &mut Annotations;
}

/// Schema-qualified name of a table or other schema object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Action taken on dependent rows when a referenced key changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

/// One atomic schema intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum SchemaOperation {
    CreateTable(CreateTableOperation),
    DropTable(DropTableOperation),
    RenameTable(RenameTableOperation),
    AddColumn(AddColumnOperation),
    AlterColumn(AlterColumnOperation),
    DropColumn(DropColumnOperation),
    RenameColumn(RenameColumnOperation),
    CreateIndex(CreateIndexOperation),
    DropIndex(DropIndexOperation),
    RenameIndex(RenameIndexOperation),
    AddPrimaryKey(AddPrimaryKeyOperation),
    DropPrimaryKey(DropPrimaryKeyOperation),
    AddUniqueConstraint(AddUniqueConstraintOperation),
    DropUniqueConstraint(DropUniqueConstraintOperation),
    AddForeignKey(AddForeignKeyOperation),
    DropForeignKey(DropForeignKeyOperation),
    CreateSequence(CreateSequenceOperation),
    AlterSequence(AlterSequenceOperation),
    DropSequence(DropSequenceOperation),
    RenameSequence(RenameSequenceOperation),
    Sql(SqlOperation),
    InsertData(InsertDataOperation),
    UpdateData(UpdateDataOperation),
    DeleteData(DeleteDataOperation),
    Extension(ExtensionOperation),
}

impl SchemaOperation {
    /// Operation kind name, used in logs and error messages
    pub fn kind(&self) -> &str {
        match self {
            SchemaOperation::CreateTable(_) => "CreateTable",
            SchemaOperation::DropTable(_) => "DropTable",
            SchemaOperation::RenameTable(_) => "RenameTable",
            SchemaOperation::AddColumn(_) => "AddColumn",
            SchemaOperation::AlterColumn(_) => "AlterColumn",
            SchemaOperation::DropColumn(_) => "DropColumn",
            SchemaOperation::RenameColumn(_) => "RenameColumn",
            SchemaOperation::CreateIndex(_) => "CreateIndex",
            SchemaOperation::DropIndex(_) => "DropIndex",
            SchemaOperation::RenameIndex(_) => "RenameIndex",
            SchemaOperation::AddPrimaryKey(_) => "AddPrimaryKey",
            SchemaOperation::DropPrimaryKey(_) => "DropPrimaryKey",
            SchemaOperation::AddUniqueConstraint(_) => "AddUniqueConstraint",
            SchemaOperation::DropUniqueConstraint(_) => "DropUniqueConstraint",
            SchemaOperation::AddForeignKey(_) => "AddForeignKey",
            SchemaOperation::DropForeignKey(_) => "DropForeignKey",
            SchemaOperation::CreateSequence(_) => "CreateSequence",
            SchemaOperation::AlterSequence(_) => "AlterSequence",
            SchemaOperation::DropSequence(_) => "DropSequence",
            SchemaOperation::RenameSequence(_) => "RenameSequence",
            SchemaOperation::Sql(_) => "Sql",
            SchemaOperation::InsertData(_) => "InsertData",
            SchemaOperation::UpdateData(_) => "UpdateData",
            SchemaOperation::DeleteData(_) => "DeleteData",
            SchemaOperation::Extension(op) => &op.kind,
        }
    }

    /// The table this operation targets, if any
    pub fn table(&self) -> Option<&TableName> {
        match self {
            SchemaOperation::CreateTable(op) => Some(&op.name),
            SchemaOperation::DropTable(op) => Some(&op.name),
            SchemaOperation::RenameTable(op) => Some(&op.name),
            SchemaOperation::AddColumn(op) => Some(&op.table),
            SchemaOperation::AlterColumn(op) => Some(&op.table),
            SchemaOperation::DropColumn(op) => Some(&op.table),
            SchemaOperation::RenameColumn(op) => Some(&op.table),
            SchemaOperation::CreateIndex(op) => Some(&op.table),
            SchemaOperation::DropIndex(op) => Some(&op.table),
            SchemaOperation::RenameIndex(op) => Some(&op.table),
            SchemaOperation::AddPrimaryKey(op) => Some(&op.table),
            SchemaOperation::DropPrimaryKey(op) => Some(&op.table),
            SchemaOperation::AddUniqueConstraint(op) => Some(&op.table),
            SchemaOperation::DropUniqueConstraint(op) => Some(&op.table),
            SchemaOperation::AddForeignKey(op) => Some(&op.table),
            SchemaOperation::DropForeignKey(op) => Some(&op.table),
            SchemaOperation::InsertData(op) => Some(&op.table),
            SchemaOperation::UpdateData(op) => Some(&op.table),
            SchemaOperation::DeleteData(op) => Some(&op.table),
            SchemaOperation::Extension(op) => op.table.as_ref(),
            SchemaOperation::CreateSequence(_)
            | SchemaOperation::AlterSequence(_)
            | SchemaOperation::DropSequence(_)
            | SchemaOperation::RenameSequence(_)
            | SchemaOperation::Sql(_) => None,
        }
    }
}

macro_rules! into_schema_operation {
    ($($variant:ident => $operation:ty),* $(,)?) => {
        $(
            impl From<$operation> for SchemaOperation {
                fn from(operation: $operation) -> Self {
                    SchemaOperation::$variant(operation)
                }
            }
        )*
    };
}

into_schema_operation! {
    CreateTable => CreateTableOperation,
    DropTable => DropTableOperation,
    RenameTable => RenameTableOperation,
    AddColumn => AddColumnOperation,
    AlterColumn => AlterColumnOperation,
    DropColumn => DropColumnOperation,
    RenameColumn => RenameColumnOperation,
    CreateIndex => CreateIndexOperation,
    DropIndex => DropIndexOperation,
    RenameIndex => RenameIndexOperation,
    AddPrimaryKey => AddPrimaryKeyOperation,
    DropPrimaryKey => DropPrimaryKeyOperation,
    AddUniqueConstraint => AddUniqueConstraintOperation,
    DropUniqueConstraint => DropUniqueConstraintOperation,
    AddForeignKey => AddForeignKeyOperation,
    DropForeignKey => DropForeignKeyOperation,
    CreateSequence => CreateSequenceOperation,
    AlterSequence => AlterSequenceOperation,
    DropSequence => DropSequenceOperation,
    RenameSequence => RenameSequenceOperation,
    Sql => SqlOperation,
    InsertData => InsertDataOperation,
    UpdateData => UpdateDataOperation,
    DeleteData => DeleteDataOperation,
    Extension => ExtensionOperation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_display() {
        assert_eq!(TableName::new("users").to_string(), "users");
        assert_eq!(TableName::with_schema("auth", "users").to_string(), "auth.users");
    }

    #[test]
    fn test_operation_kind_and_table() {
        let op: SchemaOperation = DropTableOperation {
            name: TableName::new("users"),
        }
        .into();
        assert_eq!(op.kind(), "DropTable");
        assert_eq!(op.table(), Some(&TableName::new("users")));

        let sql: SchemaOperation = SqlOperation {
            sql: "SELECT 1".to_string(),
        }
        .into();
        assert_eq!(sql.kind(), "Sql");
        assert!(sql.table().is_none());
    }

    #[test]
    fn test_operations_serialize_with_kind_tag() {
        let op: SchemaOperation = DropColumnOperation {
            table: TableName::new("users"),
            name: "nickname".to_string(),
        }
        .into();
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["operation"], "DropColumn");
        assert_eq!(json["name"], "nickname");
    }
}
