//! Operation-specific refinement builders
//!
//! An [`OperationBuilder`] holds the operation it refines and a back-reference
//! to the list that will own it. The operation is appended when the builder is
//! dropped, so a statement such as `builder.create_index::<User>(&["email"])?.unique();`
//! appends exactly one fully refined operation, and the borrow keeps the parent
//! from appending anything else in between.

use crate::entity::LogicalType;
use crate::operations::*;
use crate::value::Value;

/// Refines one pending operation, appending it to its list on drop
pub struct OperationBuilder<'a, T, I = SchemaOperation>
where
    T: Into<I>,
{
    sink: &'a mut Vec<I>,
    operation: Option<T>,
}

impl<'a, T, I> OperationBuilder<'a, T, I>
where
    T: Into<I>,
{
    pub(crate) fn new(sink: &'a mut Vec<I>, operation: T) -> Self {
        Self {
            sink,
            operation: Some(operation),
        }
    }

    fn update(mut self, f: impl FnOnce(&mut T)) -> Self {
        if let Some(operation) = self.operation.as_mut() {
            f(operation);
        }
        self
    }

    /// The pending operation
    pub fn get(&self) -> Option<&T> {
        self.operation.as_ref()
    }
}

impl<'a, T, I> Drop for OperationBuilder<'a, T, I>
where
    T: Into<I>,
{
    fn drop(&mut self) {
        if let Some(operation) = self.operation.take() {
            self.sink.push(operation.into());
        }
    }
}

/// Operations whose name may be overridden
pub trait Named {
    fn name_mut(&mut self) -> &mut String;
}

macro_rules! impl_named {
    ($($operation:ty),* $(,)?) => {
        $(
            impl Named for $operation {
                fn name_mut(&mut self) -> &mut String {
                    &mut self.name
                }
            }
        )*
    };
}

impl_named! {
    CreateIndexOperation,
    DropIndexOperation,
    AddPrimaryKeyOperation,
    DropPrimaryKeyOperation,
    AddUniqueConstraintOperation,
    DropUniqueConstraintOperation,
    AddForeignKeyOperation,
    DropForeignKeyOperation,
}

/// Operations that carry a column definition
pub trait ColumnLike {
    fn column_mut(&mut self) -> &mut ColumnDefinition;
}

impl ColumnLike for ColumnDefinition {
    fn column_mut(&mut self) -> &mut ColumnDefinition {
        self
    }
}

impl ColumnLike for AddColumnOperation {
    fn column_mut(&mut self) -> &mut ColumnDefinition {
        &mut self.column
    }
}

impl ColumnLike for AlterColumnOperation {
    fn column_mut(&mut self) -> &mut ColumnDefinition {
        &mut self.column
    }
}

impl<'a, T, I> OperationBuilder<'a, T, I>
where
    T: Into<I> + Named,
{
    /// Replace the conventional name
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.update(|op| *op.name_mut() = name)
    }
}

impl<'a, T, I> OperationBuilder<'a, T, I>
where
    T: Into<I> + Annotatable,
{
    pub fn annotation(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.update(|op| {
            op.annotations_mut().insert(key, value);
        })
    }

    pub fn comment(self, comment: impl Into<String>) -> Self {
        self.annotation(annotations::COMMENT, comment)
    }
}

impl<'a, T, I> OperationBuilder<'a, T, I>
where
    T: Into<I> + ColumnLike,
{
    pub fn nullable(self, nullable: bool) -> Self {
        self.update(|op| op.column_mut().nullable = nullable)
    }

    pub fn identity(self, identity: bool) -> Self {
        self.update(|op| {
            let column = op.column_mut();
            column.identity = identity;
            if identity {
                column.nullable = false;
            }
        })
    }

    pub fn max_length(self, max_length: u32) -> Self {
        self.update(|op| op.column_mut().max_length = Some(max_length))
    }

    pub fn fixed_length(self, fixed_length: bool) -> Self {
        self.update(|op| op.column_mut().fixed_length = fixed_length)
    }

    /// Explicit dialect type, bypassing the type mapper
    pub fn column_type(self, column_type: impl Into<String>) -> Self {
        let column_type = column_type.into();
        self.update(|op| op.column_mut().column_type = Some(column_type))
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.update(|op| {
            let column = op.column_mut();
            column.default_value = Some(value);
            column.default_sql = None;
        })
    }

    pub fn default_sql(self, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        self.update(|op| {
            let column = op.column_mut();
            column.default_sql = Some(sql);
            column.default_value = None;
        })
    }

    pub fn computed_sql(self, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        self.update(|op| op.column_mut().computed_sql = Some(sql))
    }
}

impl<'a, I> OperationBuilder<'a, CreateIndexOperation, I>
where
    CreateIndexOperation: Into<I>,
{
    pub fn unique(self) -> Self {
        self.update(|op| op.unique = true)
    }

    pub fn clustered(self) -> Self {
        self.update(|op| op.clustered = true)
    }

    /// Index access method, e.g. `gin`
    pub fn method(self, method: impl Into<String>) -> Self {
        self.annotation(annotations::INDEX_METHOD, method)
    }
}

impl<'a, I> OperationBuilder<'a, AddPrimaryKeyOperation, I>
where
    AddPrimaryKeyOperation: Into<I>,
{
    pub fn clustered(self) -> Self {
        self.update(|op| op.clustered = true)
    }
}

impl<'a, I> OperationBuilder<'a, AddForeignKeyOperation, I>
where
    AddForeignKeyOperation: Into<I>,
{
    pub fn on_delete(self, action: ReferentialAction) -> Self {
        self.update(|op| op.on_delete = action)
    }

    pub fn on_update(self, action: ReferentialAction) -> Self {
        self.update(|op| op.on_update = action)
    }
}

impl<'a> OperationBuilder<'a, CreateSequenceOperation> {
    pub fn host_type(self, host_type: LogicalType) -> Self {
        self.update(|op| op.host_type = host_type)
    }

    pub fn start_with(self, start: i64) -> Self {
        self.update(|op| op.start = start)
    }

    pub fn increment_by(self, increment: i64) -> Self {
        self.update(|op| op.increment = increment)
    }

    pub fn min_value(self, min_value: i64) -> Self {
        self.update(|op| op.min_value = Some(min_value))
    }

    pub fn max_value(self, max_value: i64) -> Self {
        self.update(|op| op.max_value = Some(max_value))
    }

    pub fn cycle(self) -> Self {
        self.update(|op| op.cycle = true)
    }
}

impl<'a> OperationBuilder<'a, AlterSequenceOperation> {
    pub fn increment_by(self, increment: i64) -> Self {
        self.update(|op| op.increment = increment)
    }

    pub fn min_value(self, min_value: Option<i64>) -> Self {
        self.update(|op| op.min_value = min_value)
    }

    pub fn max_value(self, max_value: Option<i64>) -> Self {
        self.update(|op| op.max_value = max_value)
    }

    pub fn cycle(self, cycle: bool) -> Self {
        self.update(|op| op.cycle = cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_on_drop() {
        let mut operations: Vec<SchemaOperation> = Vec::new();
        {
            let pending = OperationBuilder::new(
                &mut operations,
                DropTableOperation {
                    name: TableName::new("users"),
                },
            );
            assert!(pending.get().is_some());
        }
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].kind(), "DropTable");
    }

    #[test]
    fn test_refinements_apply_before_append() {
        let mut operations: Vec<SchemaOperation> = Vec::new();
        OperationBuilder::new(
            &mut operations,
            CreateIndexOperation {
                name: "IX_users_email".to_string(),
                table: TableName::new("users"),
                columns: vec!["email".to_string()],
                unique: false,
                clustered: false,
                annotations: Annotations::new(),
            },
        )
        .unique()
        .named("users_email_key")
        .method("btree");

        match &operations[0] {
            SchemaOperation::CreateIndex(index) => {
                assert!(index.unique);
                assert_eq!(index.name, "users_email_key");
                assert_eq!(index.annotations.get(annotations::INDEX_METHOD), Some(&"btree".to_string()));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_column_refinements() {
        let mut columns: Vec<ColumnDefinition> = Vec::new();
        OperationBuilder::new(&mut columns, ColumnDefinition::new("score", LogicalType::Int32))
            .nullable(true)
            .default_value(0)
            .default_sql("42");

        assert_eq!(columns.len(), 1);
        assert!(columns[0].nullable);
        assert_eq!(columns[0].default_sql.as_deref(), Some("42"));
        assert!(columns[0].default_value.is_none());
    }
}
