//! Table Builder - column and constraint declarations inside `create_table`

use super::{column_definition, resolve_columns};
use crate::builder::operation::OperationBuilder;
use crate::entity::{Entity, EntityMeta};
use crate::error::{require_non_empty, MigrationError, MigrationResult};
use crate::naming::{constraint_name, ConstraintKind};
use crate::operations::{
    AddForeignKeyOperation, AddPrimaryKeyOperation, AddUniqueConstraintOperation, Annotations,
    ColumnDefinition, CreateTableOperation, ReferentialAction, TableName,
};

/// Collects the columns and constraints of one `CreateTable` operation
pub struct TableBuilder<'m> {
    meta: &'m EntityMeta,
    table: TableName,
    default_schema: Option<String>,
    columns: Vec<ColumnDefinition>,
    primary_keys: Vec<AddPrimaryKeyOperation>,
    unique_constraints: Vec<AddUniqueConstraintOperation>,
    foreign_keys: Vec<AddForeignKeyOperation>,
}

impl<'m> TableBuilder<'m> {
    pub(crate) fn new(meta: &'m EntityMeta, table: TableName, default_schema: Option<String>) -> Self {
        Self {
            meta,
            table,
            default_schema,
            columns: Vec::new(),
            primary_keys: Vec::new(),
            unique_constraints: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Table the builder declares
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Add a column for one entity property
    pub fn column(&mut self, property: &str) -> MigrationResult<OperationBuilder<'_, ColumnDefinition, ColumnDefinition>> {
        require_non_empty("property", property)?;
        let meta = self.meta.find(property).ok_or_else(|| {
            MigrationError::invalid_argument(
                "property",
                format!("'{}' is not a property of {}", property, self.meta.name()),
            )
        })?;
        let definition = column_definition(meta);
        if self.columns.iter().any(|c| c.name == definition.name) {
            return Err(MigrationError::invalid_argument(
                "property",
                format!("column '{}' is already declared on {}", definition.name, self.table),
            ));
        }
        Ok(OperationBuilder::new(&mut self.columns, definition))
    }

    /// Add columns for several properties with their conventional settings
    pub fn columns(&mut self, properties: &[&str]) -> MigrationResult<&mut Self> {
        for property in properties {
            self.column(property)?;
        }
        Ok(self)
    }

    /// Add every property not declared yet, in metadata order
    pub fn all_columns(&mut self) -> MigrationResult<&mut Self> {
        let pending: Vec<String> = self
            .meta
            .columns()
            .iter()
            .filter(|meta| !self.columns.iter().any(|c| c.name == meta.column_name()))
            .map(|meta| meta.property().to_string())
            .collect();
        for property in &pending {
            self.column(property)?;
        }
        Ok(self)
    }

    pub fn primary_key(
        &mut self,
        properties: &[&str],
    ) -> MigrationResult<OperationBuilder<'_, AddPrimaryKeyOperation, AddPrimaryKeyOperation>> {
        let columns = resolve_columns(self.meta, "properties", properties)?;
        let operation = AddPrimaryKeyOperation {
            name: constraint_name(ConstraintKind::PrimaryKey, &self.table, &columns, None),
            table: self.table.clone(),
            columns,
            clustered: false,
        };
        Ok(OperationBuilder::new(&mut self.primary_keys, operation))
    }

    pub fn unique(
        &mut self,
        properties: &[&str],
    ) -> MigrationResult<OperationBuilder<'_, AddUniqueConstraintOperation, AddUniqueConstraintOperation>> {
        let columns = resolve_columns(self.meta, "properties", properties)?;
        let operation = AddUniqueConstraintOperation {
            name: constraint_name(ConstraintKind::UniqueConstraint, &self.table, &columns, None),
            table: self.table.clone(),
            columns,
        };
        Ok(OperationBuilder::new(&mut self.unique_constraints, operation))
    }

    /// Reference the principal entity `P`
    pub fn foreign_key<P: Entity>(
        &mut self,
        properties: &[&str],
        principal_properties: &[&str],
    ) -> MigrationResult<OperationBuilder<'_, AddForeignKeyOperation, AddForeignKeyOperation>> {
        let principal = P::metadata();
        let columns = resolve_columns(self.meta, "properties", properties)?;
        let principal_columns = resolve_columns(&principal, "principal_properties", principal_properties)?;
        if columns.len() != principal_columns.len() {
            return Err(MigrationError::invalid_argument(
                "principal_properties",
                "must have as many entries as properties",
            ));
        }
        let principal_table = principal.table_name(self.default_schema.as_deref());
        let operation = AddForeignKeyOperation {
            name: constraint_name(ConstraintKind::ForeignKey, &self.table, &columns, Some(&principal_table)),
            table: self.table.clone(),
            columns,
            principal_table,
            principal_columns,
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::NoAction,
        };
        Ok(OperationBuilder::new(&mut self.foreign_keys, operation))
    }

    /// Assemble the composite operation, adding a primary key over the first
    /// identity column when none was declared
    pub(crate) fn finish(mut self) -> MigrationResult<CreateTableOperation> {
        if self.columns.is_empty() {
            return Err(MigrationError::invalid_argument(
                "columns",
                format!("table {} declares no columns", self.table),
            ));
        }
        if self.primary_keys.len() > 1 {
            return Err(MigrationError::invalid_argument(
                "primary_key",
                format!("table {} declares more than one primary key", self.table),
            ));
        }

        let primary_key = match self.primary_keys.pop() {
            Some(key) => Some(key),
            None => self.columns.iter().find(|c| c.identity).map(|identity| {
                let columns = vec![identity.name.clone()];
                AddPrimaryKeyOperation {
                    name: constraint_name(ConstraintKind::PrimaryKey, &self.table, &columns, None),
                    table: self.table.clone(),
                    columns,
                    clustered: false,
                }
            }),
        };

        Ok(CreateTableOperation {
            name: self.table,
            columns: self.columns,
            primary_key,
            unique_constraints: self.unique_constraints,
            foreign_keys: self.foreign_keys,
            annotations: Annotations::new(),
        })
    }
}
