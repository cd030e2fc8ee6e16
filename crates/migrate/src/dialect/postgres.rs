//! PostgreSQL dialect and generator
//!
//! Identity columns map to the serial types, column changes are issued as
//! separate `ALTER COLUMN` commands, and the `comment` and `index_method`
//! annotations become `COMMENT ON` and `USING` clauses.

use super::{ansi_literal, quote_string, Dialect, TypeFlags};
use crate::entity::LogicalType;
use crate::error::{MigrationError, MigrationResult};
use crate::generator::{column_list, default_add_column, default_create_table, MigrationSqlGenerator};
use crate::operations::*;
use crate::script::ScriptBuilder;
use crate::value::Value;

/// Extension operation kinds understood by [`PostgresSqlGenerator`]
pub mod extensions {
    /// `CREATE EXTENSION IF NOT EXISTS`; payload `{"name": "..."}`
    pub const CREATE_EXTENSION: &str = "postgres.create_extension";
    /// `DROP EXTENSION IF EXISTS`; payload `{"name": "..."}`
    pub const DROP_EXTENSION: &str = "postgres.drop_extension";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn escape_literal(&self, value: &Value) -> String {
        match value {
            Value::Bytes(bytes) => format!("'\\x{}'::bytea", hex::encode(bytes)),
            Value::Json(json) => format!("{}::jsonb", quote_string(&json.to_string())),
            Value::Uuid(uuid) => format!("'{}'::uuid", uuid),
            other => ansi_literal(other),
        }
    }

    fn map_type(&self, host_type: &LogicalType, max_length: Option<u32>, flags: TypeFlags) -> MigrationResult<String> {
        if flags.identity {
            return match host_type {
                LogicalType::Int16 => Ok("SMALLSERIAL".to_string()),
                LogicalType::Int32 => Ok("SERIAL".to_string()),
                LogicalType::Int64 => Ok("BIGSERIAL".to_string()),
                other => Err(MigrationError::TypeMapping(format!(
                    "identity columns must be integers, got {}",
                    other
                ))),
            };
        }

        let mapped = match host_type {
            LogicalType::Bool => "BOOLEAN".to_string(),
            LogicalType::Int16 => "SMALLINT".to_string(),
            LogicalType::Int32 => "INTEGER".to_string(),
            LogicalType::Int64 => "BIGINT".to_string(),
            LogicalType::Decimal { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
            LogicalType::Float32 => "REAL".to_string(),
            LogicalType::Float64 => "DOUBLE PRECISION".to_string(),
            LogicalType::String => match (max_length, flags.fixed_length) {
                (Some(length), true) => format!("CHAR({})", length),
                (Some(length), false) => format!("VARCHAR({})", length),
                (None, true) => "CHAR(1)".to_string(),
                (None, false) => "TEXT".to_string(),
            },
            LogicalType::Bytes => "BYTEA".to_string(),
            LogicalType::Uuid => "UUID".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::DateTime => "TIMESTAMP".to_string(),
            LogicalType::DateTimeOffset => "TIMESTAMPTZ".to_string(),
            LogicalType::Json => "JSONB".to_string(),
        };
        Ok(mapped)
    }
}

/// Generator for PostgreSQL
#[derive(Debug, Clone, Default)]
pub struct PostgresSqlGenerator {
    dialect: PostgresDialect,
}

impl PostgresSqlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn column_comment(&self, table: &TableName, column: &ColumnDefinition, script: &mut ScriptBuilder) {
        if let Some(comment) = column.annotations.get(annotations::COMMENT) {
            script
                .append("COMMENT ON COLUMN ")
                .append(&self.dialect.qualify(table))
                .append(".")
                .append(&self.dialect.quote_identifier(&column.name))
                .append(" IS ")
                .append(&quote_string(comment));
            self.end_statement(script);
        }
    }

    fn alter_table_prefix(&self, table: &TableName, column: &str, script: &mut ScriptBuilder) {
        script
            .append("ALTER TABLE ")
            .append(&self.dialect.qualify(table))
            .append(" ALTER COLUMN ")
            .append(&self.dialect.quote_identifier(column));
    }

    fn extension_name(op: &ExtensionOperation) -> MigrationResult<&str> {
        op.payload
            .get("name")
            .and_then(|name| name.as_str())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| MigrationError::invalid_argument("payload", format!("{} requires a 'name' entry", op.kind)))
    }
}

impl MigrationSqlGenerator for PostgresSqlGenerator {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn create_table(&self, op: &CreateTableOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        default_create_table(self, op, script)?;
        if let Some(comment) = op.annotations.get(annotations::COMMENT) {
            script
                .append("COMMENT ON TABLE ")
                .append(&self.dialect.qualify(&op.name))
                .append(" IS ")
                .append(&quote_string(comment));
            self.end_statement(script);
        }
        for column in &op.columns {
            self.column_comment(&op.name, column, script);
        }
        Ok(())
    }

    fn rename_table(&self, op: &RenameTableOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script
            .append("ALTER TABLE ")
            .append(&self.dialect.qualify(&op.name))
            .append(" RENAME TO ")
            .append(&self.dialect.quote_identifier(&op.new_name));
        self.end_statement(script);
        Ok(())
    }

    fn add_column(&self, op: &AddColumnOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        default_add_column(self, op, script)?;
        self.column_comment(&op.table, &op.column, script);
        Ok(())
    }

    /// Type, nullability and default are changed by separate commands
    fn alter_column(&self, op: &AlterColumnOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let column = &op.column;
        if column.computed_sql.is_some() {
            return Err(MigrationError::invalid_argument(
                "column",
                format!("cannot alter computed column '{}' in place", column.name),
            ));
        }

        // serial is not a real type; the sequence default stays as it is
        let column_type = match &column.column_type {
            Some(explicit) => explicit.clone(),
            None => self.dialect.map_type(
                &column.host_type,
                column.max_length,
                TypeFlags {
                    identity: false,
                    fixed_length: column.fixed_length,
                },
            )?,
        };

        self.alter_table_prefix(&op.table, &column.name, script);
        script.append(" TYPE ").append(&column_type);
        self.end_statement(script);

        self.alter_table_prefix(&op.table, &column.name, script);
        script.append(if column.nullable { " DROP NOT NULL" } else { " SET NOT NULL" });
        self.end_statement(script);

        if !column.identity {
            self.alter_table_prefix(&op.table, &column.name, script);
            if let Some(sql) = &column.default_sql {
                script.append(" SET DEFAULT ").append(sql);
            } else if let Some(value) = &column.default_value {
                script.append(" SET DEFAULT ").append(&self.dialect.escape_literal(value));
            } else {
                script.append(" DROP DEFAULT");
            }
            self.end_statement(script);
        }

        self.column_comment(&op.table, column, script);
        Ok(())
    }

    fn rename_column(&self, op: &RenameColumnOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script
            .append("ALTER TABLE ")
            .append(&self.dialect.qualify(&op.table))
            .append(" RENAME COLUMN ")
            .append(&self.dialect.quote_identifier(&op.name))
            .append(" TO ")
            .append(&self.dialect.quote_identifier(&op.new_name));
        self.end_statement(script);
        Ok(())
    }

    /// PostgreSQL has no clustered index; `CLUSTER` reorders the table once
    fn create_index(&self, op: &CreateIndexOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script.append("CREATE ");
        if op.unique {
            script.append("UNIQUE ");
        }
        script
            .append("INDEX ")
            .append(&self.dialect.quote_identifier(&op.name))
            .append(" ON ")
            .append(&self.dialect.qualify(&op.table));
        if let Some(method) = op.annotations.get(annotations::INDEX_METHOD) {
            script.append(" USING ").append(method);
        }
        script.append(&format!(" ({})", column_list(&self.dialect, &op.columns)));
        self.end_statement(script);

        if op.clustered {
            script
                .append("CLUSTER ")
                .append(&self.dialect.qualify(&op.table))
                .append(" USING ")
                .append(&self.dialect.quote_identifier(&op.name));
            self.end_statement(script);
        }
        Ok(())
    }

    fn rename_index(&self, op: &RenameIndexOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let index = TableName {
            schema: op.table.schema.clone(),
            name: op.name.clone(),
        };
        script
            .append("ALTER INDEX ")
            .append(&self.dialect.qualify(&index))
            .append(" RENAME TO ")
            .append(&self.dialect.quote_identifier(&op.new_name));
        self.end_statement(script);
        Ok(())
    }

    fn rename_sequence(&self, op: &RenameSequenceOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script
            .append("ALTER SEQUENCE ")
            .append(&self.dialect.qualify(&op.name))
            .append(" RENAME TO ")
            .append(&self.dialect.quote_identifier(&op.new_name));
        self.end_statement(script);
        Ok(())
    }

    fn extension(&self, op: &ExtensionOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        match op.kind.as_str() {
            extensions::CREATE_EXTENSION => {
                let name = Self::extension_name(op)?;
                script
                    .append("CREATE EXTENSION IF NOT EXISTS ")
                    .append(&self.dialect.quote_identifier(name));
            }
            extensions::DROP_EXTENSION => {
                let name = Self::extension_name(op)?;
                script
                    .append("DROP EXTENSION IF EXISTS ")
                    .append(&self.dialect.quote_identifier(name));
            }
            other => return Err(MigrationError::UnknownOperation(other.to_string())),
        }
        self.end_statement(script);
        Ok(())
    }
}
