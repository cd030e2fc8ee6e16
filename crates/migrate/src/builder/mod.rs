//! Migration Builder - fluent accumulator of schema operations
//!
//! Every method validates its arguments, resolves table and column names from
//! entity metadata, and returns an [`OperationBuilder`] that appends the
//! operation once the caller is done refining it.

pub mod operation;
pub mod table;

pub use operation::{ColumnLike, Named, OperationBuilder};
pub use table::TableBuilder;

use serde_json::Value as JsonValue;

use crate::entity::{ColumnMeta, Entity, EntityMeta, LogicalType};
use crate::error::{require_items, require_non_empty, MigrationError, MigrationResult};
use crate::naming::{constraint_name, ConstraintKind};
use crate::operations::*;
use crate::value::Value;

/// Build a column definition from property metadata
pub(crate) fn column_definition(meta: &ColumnMeta) -> ColumnDefinition {
    ColumnDefinition {
        name: meta.column_name(),
        host_type: meta.host_type().clone(),
        column_type: meta.get_column_type().map(str::to_string),
        nullable: meta.is_nullable(),
        identity: meta.is_identity(),
        max_length: meta.get_max_length(),
        fixed_length: meta.is_fixed_length(),
        default_value: meta.get_default_value().cloned(),
        default_sql: meta.get_default_sql().map(str::to_string),
        computed_sql: meta.get_computed_sql().map(str::to_string),
        annotations: Annotations::new(),
    }
}

fn resolve_column<'e>(meta: &'e EntityMeta, argument: &str, property: &str) -> MigrationResult<&'e ColumnMeta> {
    require_non_empty(argument, property)?;
    meta.find(property).ok_or_else(|| {
        MigrationError::invalid_argument(
            argument,
            format!("'{}' is not a property of {}", property, meta.name()),
        )
    })
}

/// Resolve property names to column names, preserving order
pub(crate) fn resolve_columns(meta: &EntityMeta, argument: &str, properties: &[&str]) -> MigrationResult<Vec<String>> {
    require_items(argument, properties)?;
    properties
        .iter()
        .map(|property| resolve_column(meta, argument, property).map(ColumnMeta::column_name))
        .collect()
}

/// Column name for a property that may no longer exist on the entity
fn column_or_raw(meta: &EntityMeta, name: &str) -> String {
    meta.find(name)
        .map(ColumnMeta::column_name)
        .unwrap_or_else(|| name.to_string())
}

fn resolve_filter(meta: &EntityMeta, filter: Option<Filter>) -> MigrationResult<Option<Filter>> {
    match filter {
        Some(Filter::Equals(predicates)) => {
            let predicates = predicates
                .into_iter()
                .map(|(property, value)| {
                    resolve_column(meta, "filter", &property).map(|c| (c.column_name(), value))
                })
                .collect::<MigrationResult<Vec<_>>>()?;
            Ok(Some(Filter::Equals(predicates)))
        }
        Some(Filter::Raw(sql)) => {
            require_non_empty("filter", &sql)?;
            Ok(Some(Filter::Raw(sql)))
        }
        None => Ok(None),
    }
}

/// Accumulates the ordered operations of one migration step
#[derive(Debug, Default)]
pub struct MigrationBuilder {
    operations: Vec<SchemaOperation>,
    default_schema: Option<String>,
}

impl MigrationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose unqualified tables resolve into `default_schema`
    pub fn with_default_schema(default_schema: Option<String>) -> Self {
        Self {
            operations: Vec::new(),
            default_schema,
        }
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// Operations appended so far
    pub fn operations(&self) -> &[SchemaOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<SchemaOperation> {
        self.operations
    }

    fn entity<E: Entity>(&self) -> (EntityMeta, TableName) {
        let meta = E::metadata();
        let table = meta.table_name(self.default_schema.as_deref());
        (meta, table)
    }

    fn append<T: Into<SchemaOperation>>(&mut self, operation: T) -> OperationBuilder<'_, T> {
        OperationBuilder::new(&mut self.operations, operation)
    }

    /// Create the table for entity `E`
    ///
    /// The closure declares columns and constraints. When it declares no
    /// primary key, one is added over the first identity column.
    pub fn create_table<E, F>(&mut self, build: F) -> MigrationResult<OperationBuilder<'_, CreateTableOperation>>
    where
        E: Entity,
        F: FnOnce(&mut TableBuilder<'_>) -> MigrationResult<()>,
    {
        let (meta, table) = self.entity::<E>();
        let mut table_builder = TableBuilder::new(&meta, table, self.default_schema.clone());
        build(&mut table_builder)?;
        let operation = table_builder.finish()?;
        Ok(self.append(operation))
    }

    pub fn drop_table<E: Entity>(&mut self) -> MigrationResult<OperationBuilder<'_, DropTableOperation>> {
        let (_, name) = self.entity::<E>();
        Ok(self.append(DropTableOperation { name }))
    }

    /// Rename `old_name` to the table entity `E` now maps to
    pub fn rename_table<E: Entity>(&mut self, old_name: &str) -> MigrationResult<OperationBuilder<'_, RenameTableOperation>> {
        require_non_empty("old_name", old_name)?;
        let (_, table) = self.entity::<E>();
        let name = TableName {
            schema: table.schema.clone(),
            name: old_name.to_string(),
        };
        Ok(self.append(RenameTableOperation {
            name,
            new_name: table.name,
        }))
    }

    pub fn add_column<E: Entity>(&mut self, property: &str) -> MigrationResult<OperationBuilder<'_, AddColumnOperation>> {
        let (meta, table) = self.entity::<E>();
        let column = column_definition(resolve_column(&meta, "property", property)?);
        Ok(self.append(AddColumnOperation { table, column }))
    }

    /// Replace a column's definition with the one the property now declares
    pub fn alter_column<E: Entity>(&mut self, property: &str) -> MigrationResult<OperationBuilder<'_, AlterColumnOperation>> {
        let (meta, table) = self.entity::<E>();
        let column = column_definition(resolve_column(&meta, "property", property)?);
        Ok(self.append(AlterColumnOperation { table, column }))
    }

    /// Drop a column; `column` may name a property that no longer exists
    pub fn drop_column<E: Entity>(&mut self, column: &str) -> MigrationResult<OperationBuilder<'_, DropColumnOperation>> {
        require_non_empty("column", column)?;
        let (meta, table) = self.entity::<E>();
        let name = column_or_raw(&meta, column);
        Ok(self.append(DropColumnOperation { table, name }))
    }

    pub fn rename_column<E: Entity>(
        &mut self,
        old_column: &str,
        property: &str,
    ) -> MigrationResult<OperationBuilder<'_, RenameColumnOperation>> {
        require_non_empty("old_column", old_column)?;
        let (meta, table) = self.entity::<E>();
        let new_name = resolve_column(&meta, "property", property)?.column_name();
        Ok(self.append(RenameColumnOperation {
            table,
            name: old_column.to_string(),
            new_name,
        }))
    }

    pub fn create_index<E: Entity>(&mut self, properties: &[&str]) -> MigrationResult<OperationBuilder<'_, CreateIndexOperation>> {
        let (meta, table) = self.entity::<E>();
        let columns = resolve_columns(&meta, "properties", properties)?;
        Ok(self.append(CreateIndexOperation {
            name: constraint_name(ConstraintKind::Index, &table, &columns, None),
            table,
            columns,
            unique: false,
            clustered: false,
            annotations: Annotations::new(),
        }))
    }

    /// Drop the conventionally named index over `properties`
    pub fn drop_index<E: Entity>(&mut self, properties: &[&str]) -> MigrationResult<OperationBuilder<'_, DropIndexOperation>> {
        let (meta, table) = self.entity::<E>();
        require_items("properties", properties)?;
        let columns: Vec<String> = properties.iter().map(|p| column_or_raw(&meta, p)).collect();
        Ok(self.append(DropIndexOperation {
            name: constraint_name(ConstraintKind::Index, &table, &columns, None),
            table,
        }))
    }

    pub fn rename_index<E: Entity>(
        &mut self,
        name: &str,
        new_name: &str,
    ) -> MigrationResult<OperationBuilder<'_, RenameIndexOperation>> {
        require_non_empty("name", name)?;
        require_non_empty("new_name", new_name)?;
        let (_, table) = self.entity::<E>();
        Ok(self.append(RenameIndexOperation {
            table,
            name: name.to_string(),
            new_name: new_name.to_string(),
        }))
    }

    pub fn add_primary_key<E: Entity>(&mut self, properties: &[&str]) -> MigrationResult<OperationBuilder<'_, AddPrimaryKeyOperation>> {
        let (meta, table) = self.entity::<E>();
        let columns = resolve_columns(&meta, "properties", properties)?;
        Ok(self.append(AddPrimaryKeyOperation {
            name: constraint_name(ConstraintKind::PrimaryKey, &table, &columns, None),
            table,
            columns,
            clustered: false,
        }))
    }

    pub fn drop_primary_key<E: Entity>(&mut self, properties: &[&str]) -> MigrationResult<OperationBuilder<'_, DropPrimaryKeyOperation>> {
        let (meta, table) = self.entity::<E>();
        require_items("properties", properties)?;
        let columns: Vec<String> = properties.iter().map(|p| column_or_raw(&meta, p)).collect();
        Ok(self.append(DropPrimaryKeyOperation {
            name: constraint_name(ConstraintKind::PrimaryKey, &table, &columns, None),
            table,
        }))
    }

    pub fn add_unique_constraint<E: Entity>(
        &mut self,
        properties: &[&str],
    ) -> MigrationResult<OperationBuilder<'_, AddUniqueConstraintOperation>> {
        let (meta, table) = self.entity::<E>();
        let columns = resolve_columns(&meta, "properties", properties)?;
        Ok(self.append(AddUniqueConstraintOperation {
            name: constraint_name(ConstraintKind::UniqueConstraint, &table, &columns, None),
            table,
            columns,
        }))
    }

    pub fn drop_unique_constraint<E: Entity>(
        &mut self,
        properties: &[&str],
    ) -> MigrationResult<OperationBuilder<'_, DropUniqueConstraintOperation>> {
        let (meta, table) = self.entity::<E>();
        require_items("properties", properties)?;
        let columns: Vec<String> = properties.iter().map(|p| column_or_raw(&meta, p)).collect();
        Ok(self.append(DropUniqueConstraintOperation {
            name: constraint_name(ConstraintKind::UniqueConstraint, &table, &columns, None),
            table,
        }))
    }

    /// Reference principal entity `P` from dependent entity `E`
    pub fn add_foreign_key<E: Entity, P: Entity>(
        &mut self,
        properties: &[&str],
        principal_properties: &[&str],
    ) -> MigrationResult<OperationBuilder<'_, AddForeignKeyOperation>> {
        let (meta, table) = self.entity::<E>();
        let (principal, principal_table) = self.entity::<P>();
        let columns = resolve_columns(&meta, "properties", properties)?;
        let principal_columns = resolve_columns(&principal, "principal_properties", principal_properties)?;
        if columns.len() != principal_columns.len() {
            return Err(MigrationError::invalid_argument(
                "principal_properties",
                "must have as many entries as properties",
            ));
        }
        Ok(self.append(AddForeignKeyOperation {
            name: constraint_name(ConstraintKind::ForeignKey, &table, &columns, Some(&principal_table)),
            table,
            columns,
            principal_table,
            principal_columns,
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::NoAction,
        }))
    }

    pub fn drop_foreign_key<E: Entity, P: Entity>(
        &mut self,
        properties: &[&str],
    ) -> MigrationResult<OperationBuilder<'_, DropForeignKeyOperation>> {
        let (meta, table) = self.entity::<E>();
        let (_, principal_table) = self.entity::<P>();
        require_items("properties", properties)?;
        let columns: Vec<String> = properties.iter().map(|p| column_or_raw(&meta, p)).collect();
        Ok(self.append(DropForeignKeyOperation {
            name: constraint_name(ConstraintKind::ForeignKey, &table, &columns, Some(&principal_table)),
            table,
        }))
    }

    fn sequence_name(&self, name: &str) -> MigrationResult<TableName> {
        require_non_empty("name", name)?;
        Ok(TableName {
            schema: self.default_schema.clone(),
            name: name.to_string(),
        })
    }

    /// Create a sequence in the default schema; `start` and `increment` default to 1
    pub fn create_sequence(&mut self, name: &str) -> MigrationResult<OperationBuilder<'_, CreateSequenceOperation>> {
        let name = self.sequence_name(name)?;
        Ok(self.append(CreateSequenceOperation {
            name,
            host_type: LogicalType::Int64,
            start: 1,
            increment: 1,
            min_value: None,
            max_value: None,
            cycle: false,
        }))
    }

    pub fn alter_sequence(&mut self, name: &str) -> MigrationResult<OperationBuilder<'_, AlterSequenceOperation>> {
        let name = self.sequence_name(name)?;
        Ok(self.append(AlterSequenceOperation {
            name,
            increment: 1,
            min_value: None,
            max_value: None,
            cycle: false,
        }))
    }

    pub fn drop_sequence(&mut self, name: &str) -> MigrationResult<OperationBuilder<'_, DropSequenceOperation>> {
        let name = self.sequence_name(name)?;
        Ok(self.append(DropSequenceOperation { name }))
    }

    pub fn rename_sequence(&mut self, name: &str, new_name: &str) -> MigrationResult<OperationBuilder<'_, RenameSequenceOperation>> {
        let name = self.sequence_name(name)?;
        require_non_empty("new_name", new_name)?;
        Ok(self.append(RenameSequenceOperation {
            name,
            new_name: new_name.to_string(),
        }))
    }

    /// Raw SQL passed through verbatim
    pub fn sql(&mut self, sql: &str) -> MigrationResult<OperationBuilder<'_, SqlOperation>> {
        require_non_empty("sql", sql)?;
        Ok(self.append(SqlOperation { sql: sql.to_string() }))
    }

    /// Insert rows; every row supplies one value per property
    pub fn insert_data<E: Entity>(
        &mut self,
        properties: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> MigrationResult<OperationBuilder<'_, InsertDataOperation>> {
        let (meta, table) = self.entity::<E>();
        let columns = resolve_columns(&meta, "properties", properties)?;
        if rows.is_empty() {
            return Err(MigrationError::invalid_argument("rows", "must contain at least one row"));
        }
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(MigrationError::invalid_argument(
                "rows",
                format!("row has {} values, expected {}", row.len(), columns.len()),
            ));
        }
        Ok(self.append(InsertDataOperation { table, columns, rows }))
    }

    pub fn update_data<E: Entity>(
        &mut self,
        values: Vec<(&str, Value)>,
        filter: Option<Filter>,
    ) -> MigrationResult<OperationBuilder<'_, UpdateDataOperation>> {
        let (meta, table) = self.entity::<E>();
        if values.is_empty() {
            return Err(MigrationError::invalid_argument("values", "must contain at least one entry"));
        }
        let values = values
            .into_iter()
            .map(|(property, value)| resolve_column(&meta, "values", property).map(|c| (c.column_name(), value)))
            .collect::<MigrationResult<Vec<_>>>()?;
        let filter = resolve_filter(&meta, filter)?;
        Ok(self.append(UpdateDataOperation { table, values, filter }))
    }

    /// Delete rows matching `filter`, or every row when it is `None`
    pub fn delete_data<E: Entity>(&mut self, filter: Option<Filter>) -> MigrationResult<OperationBuilder<'_, DeleteDataOperation>> {
        let (meta, table) = self.entity::<E>();
        let filter = resolve_filter(&meta, filter)?;
        Ok(self.append(DeleteDataOperation { table, filter }))
    }

    /// Product-specific operation handled by a dialect generator
    pub fn extension(&mut self, kind: &str, payload: JsonValue) -> MigrationResult<OperationBuilder<'_, ExtensionOperation>> {
        require_non_empty("kind", kind)?;
        Ok(self.append(ExtensionOperation {
            kind: kind.to_string(),
            table: None,
            payload,
        }))
    }
}
