//! Migration SQL Generator - turns schema operations into executable commands
//!
//! Dispatch is an exhaustive match over [`SchemaOperation`], so adding a
//! variant forces every generator to decide how to handle it. Each kind has a
//! rule method with a standard-SQL default; dialect generators override the
//! rules they spell differently. Rules a standard dialect cannot express
//! (renames and column alteration) fail with `Unimplemented` until a dialect
//! supplies them.

use crate::dialect::{Dialect, TypeFlags};
use crate::error::{MigrationError, MigrationResult};
use crate::operations::*;
use crate::script::ScriptBuilder;

/// Generates dialect SQL for a list of operations
pub trait MigrationSqlGenerator: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Generate every operation, in order, into one command list
    fn generate(&self, operations: &[SchemaOperation]) -> MigrationResult<Vec<String>> {
        let mut script = ScriptBuilder::new();
        for operation in operations {
            self.generate_operation(operation, &mut script)?;
        }
        Ok(script.into_commands())
    }

    fn generate_operation(&self, operation: &SchemaOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        match operation {
            SchemaOperation::CreateTable(op) => self.create_table(op, script),
            SchemaOperation::DropTable(op) => self.drop_table(op, script),
            SchemaOperation::RenameTable(op) => self.rename_table(op, script),
            SchemaOperation::AddColumn(op) => self.add_column(op, script),
            SchemaOperation::AlterColumn(op) => self.alter_column(op, script),
            SchemaOperation::DropColumn(op) => self.drop_column(op, script),
            SchemaOperation::RenameColumn(op) => self.rename_column(op, script),
            SchemaOperation::CreateIndex(op) => self.create_index(op, script),
            SchemaOperation::DropIndex(op) => self.drop_index(op, script),
            SchemaOperation::RenameIndex(op) => self.rename_index(op, script),
            SchemaOperation::AddPrimaryKey(op) => self.add_primary_key(op, script),
            SchemaOperation::DropPrimaryKey(op) => self.drop_primary_key(op, script),
            SchemaOperation::AddUniqueConstraint(op) => self.add_unique_constraint(op, script),
            SchemaOperation::DropUniqueConstraint(op) => self.drop_unique_constraint(op, script),
            SchemaOperation::AddForeignKey(op) => self.add_foreign_key(op, script),
            SchemaOperation::DropForeignKey(op) => self.drop_foreign_key(op, script),
            SchemaOperation::CreateSequence(op) => self.create_sequence(op, script),
            SchemaOperation::AlterSequence(op) => self.alter_sequence(op, script),
            SchemaOperation::DropSequence(op) => self.drop_sequence(op, script),
            SchemaOperation::RenameSequence(op) => self.rename_sequence(op, script),
            SchemaOperation::Sql(op) => self.sql(op, script),
            SchemaOperation::InsertData(op) => self.insert_data(op, script),
            SchemaOperation::UpdateData(op) => self.update_data(op, script),
            SchemaOperation::DeleteData(op) => self.delete_data(op, script),
            SchemaOperation::Extension(op) => self.extension(op, script),
        }
    }

    fn create_table(&self, op: &CreateTableOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        default_create_table(self, op, script)
    }

    fn drop_table(&self, op: &DropTableOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script.append("DROP TABLE ").append(&self.dialect().qualify(&op.name));
        self.end_statement(script);
        Ok(())
    }

    fn rename_table(&self, _op: &RenameTableOperation, _script: &mut ScriptBuilder) -> MigrationResult<()> {
        Err(self.unimplemented("RenameTable"))
    }

    fn add_column(&self, op: &AddColumnOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        default_add_column(self, op, script)
    }

    fn alter_column(&self, _op: &AlterColumnOperation, _script: &mut ScriptBuilder) -> MigrationResult<()> {
        Err(self.unimplemented("AlterColumn"))
    }

    fn drop_column(&self, op: &DropColumnOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let dialect = self.dialect();
        script
            .append("ALTER TABLE ")
            .append(&dialect.qualify(&op.table))
            .append(" DROP COLUMN ")
            .append(&dialect.quote_identifier(&op.name));
        self.end_statement(script);
        Ok(())
    }

    fn rename_column(&self, _op: &RenameColumnOperation, _script: &mut ScriptBuilder) -> MigrationResult<()> {
        Err(self.unimplemented("RenameColumn"))
    }

    fn create_index(&self, op: &CreateIndexOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        default_create_index(self, op, script)
    }

    fn drop_index(&self, op: &DropIndexOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let index = TableName {
            schema: op.table.schema.clone(),
            name: op.name.clone(),
        };
        script.append("DROP INDEX ").append(&self.dialect().qualify(&index));
        self.end_statement(script);
        Ok(())
    }

    fn rename_index(&self, _op: &RenameIndexOperation, _script: &mut ScriptBuilder) -> MigrationResult<()> {
        Err(self.unimplemented("RenameIndex"))
    }

    fn add_primary_key(&self, op: &AddPrimaryKeyOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script
            .append("ALTER TABLE ")
            .append(&self.dialect().qualify(&op.table))
            .append(" ADD ");
        primary_key_clause(self.dialect(), op, script);
        self.end_statement(script);
        Ok(())
    }

    fn drop_primary_key(&self, op: &DropPrimaryKeyOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        self.drop_constraint(&op.table, &op.name, script);
        Ok(())
    }

    fn add_unique_constraint(&self, op: &AddUniqueConstraintOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script
            .append("ALTER TABLE ")
            .append(&self.dialect().qualify(&op.table))
            .append(" ADD ");
        unique_clause(self.dialect(), op, script);
        self.end_statement(script);
        Ok(())
    }

    fn drop_unique_constraint(&self, op: &DropUniqueConstraintOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        self.drop_constraint(&op.table, &op.name, script);
        Ok(())
    }

    fn add_foreign_key(&self, op: &AddForeignKeyOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script
            .append("ALTER TABLE ")
            .append(&self.dialect().qualify(&op.table))
            .append(" ADD ");
        foreign_key_clause(self.dialect(), op, script);
        self.end_statement(script);
        Ok(())
    }

    fn drop_foreign_key(&self, op: &DropForeignKeyOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        self.drop_constraint(&op.table, &op.name, script);
        Ok(())
    }

    fn create_sequence(&self, op: &CreateSequenceOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let dialect = self.dialect();
        let sequence_type = dialect.map_type(&op.host_type, None, TypeFlags::default())?;
        script
            .append("CREATE SEQUENCE ")
            .append(&dialect.qualify(&op.name))
            .append(" AS ")
            .append(&sequence_type)
            .append(&format!(" START WITH {} INCREMENT BY {}", op.start, op.increment));
        sequence_options(op.min_value, op.max_value, op.cycle, script);
        self.end_statement(script);
        Ok(())
    }

    fn alter_sequence(&self, op: &AlterSequenceOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script
            .append("ALTER SEQUENCE ")
            .append(&self.dialect().qualify(&op.name))
            .append(&format!(" INCREMENT BY {}", op.increment));
        sequence_options(op.min_value, op.max_value, op.cycle, script);
        self.end_statement(script);
        Ok(())
    }

    fn drop_sequence(&self, op: &DropSequenceOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        script.append("DROP SEQUENCE ").append(&self.dialect().qualify(&op.name));
        self.end_statement(script);
        Ok(())
    }

    fn rename_sequence(&self, _op: &RenameSequenceOperation, _script: &mut ScriptBuilder) -> MigrationResult<()> {
        Err(self.unimplemented("RenameSequence"))
    }

    /// Raw SQL is emitted verbatim as its own command
    fn sql(&self, op: &SqlOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let terminator = self.dialect().statement_terminator();
        let sql = op.sql.trim_end();
        let sql = sql.strip_suffix(terminator).unwrap_or(sql);
        script.append(sql);
        self.end_statement(script);
        Ok(())
    }

    /// One INSERT per row
    fn insert_data(&self, op: &InsertDataOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let dialect = self.dialect();
        let columns = column_list(dialect, &op.columns);
        for row in &op.rows {
            if row.len() != op.columns.len() {
                return Err(MigrationError::invalid_argument(
                    "rows",
                    format!("row has {} values, expected {}", row.len(), op.columns.len()),
                ));
            }
            let values: Vec<String> = row.iter().map(|v| dialect.escape_literal(v)).collect();
            script
                .append("INSERT INTO ")
                .append(&dialect.qualify(&op.table))
                .append(&format!(" ({}) VALUES ({})", columns, values.join(", ")));
            self.end_statement(script);
        }
        Ok(())
    }

    fn update_data(&self, op: &UpdateDataOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        if op.values.is_empty() {
            return Err(MigrationError::invalid_argument("values", "must contain at least one entry"));
        }
        let dialect = self.dialect();
        let assignments: Vec<String> = op
            .values
            .iter()
            .map(|(column, value)| format!("{} = {}", dialect.quote_identifier(column), dialect.escape_literal(value)))
            .collect();
        script
            .append("UPDATE ")
            .append(&dialect.qualify(&op.table))
            .append(" SET ")
            .append(&assignments.join(", "));
        where_clause(dialect, op.filter.as_ref(), script);
        self.end_statement(script);
        Ok(())
    }

    fn delete_data(&self, op: &DeleteDataOperation, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let dialect = self.dialect();
        script.append("DELETE FROM ").append(&dialect.qualify(&op.table));
        where_clause(dialect, op.filter.as_ref(), script);
        self.end_statement(script);
        Ok(())
    }

    /// Extension operations have no standard rule
    fn extension(&self, op: &ExtensionOperation, _script: &mut ScriptBuilder) -> MigrationResult<()> {
        Err(MigrationError::UnknownOperation(op.kind.clone()))
    }

    /// Render one column definition inside CREATE TABLE or ADD COLUMN
    fn column_definition(&self, column: &ColumnDefinition, script: &mut ScriptBuilder) -> MigrationResult<()> {
        let dialect = self.dialect();
        let column_type = self.column_type(column)?;
        script
            .append(&dialect.quote_identifier(&column.name))
            .append(" ")
            .append(&column_type);

        if let Some(computed) = &column.computed_sql {
            script.append(" ").append(&dialect.computed_column_clause(computed));
            return Ok(());
        }

        if column.identity {
            if let Some(clause) = dialect.identity_clause() {
                script.append(" ").append(clause);
            }
        }
        if !column.nullable {
            script.append(" NOT NULL");
        }
        if !column.identity {
            if let Some(sql) = &column.default_sql {
                script.append(" DEFAULT ").append(sql);
            } else if let Some(value) = &column.default_value {
                script.append(" DEFAULT ").append(&dialect.escape_literal(value));
            }
        }
        Ok(())
    }

    /// Explicit column type, or the dialect's mapping of the host type
    fn column_type(&self, column: &ColumnDefinition) -> MigrationResult<String> {
        match &column.column_type {
            Some(explicit) => Ok(explicit.clone()),
            None => self.dialect().map_type(
                &column.host_type,
                column.max_length,
                TypeFlags {
                    identity: column.identity,
                    fixed_length: column.fixed_length,
                },
            ),
        }
    }

    fn drop_constraint(&self, table: &TableName, name: &str, script: &mut ScriptBuilder) {
        let dialect = self.dialect();
        script
            .append("ALTER TABLE ")
            .append(&dialect.qualify(table))
            .append(" DROP CONSTRAINT ")
            .append(&dialect.quote_identifier(name));
        self.end_statement(script);
    }

    /// Terminate the open statement and close it as one command
    fn end_statement(&self, script: &mut ScriptBuilder) {
        script.append(self.dialect().statement_terminator());
        script.end_command();
    }

    fn unimplemented(&self, operation: &str) -> MigrationError {
        MigrationError::unimplemented(self.dialect().name(), operation)
    }
}

/// Standard CREATE TABLE rule, reusable by overriding generators
pub fn default_create_table<G>(generator: &G, op: &CreateTableOperation, script: &mut ScriptBuilder) -> MigrationResult<()>
where
    G: MigrationSqlGenerator + ?Sized,
{
    let dialect = generator.dialect();
    script
        .append("CREATE TABLE ")
        .append(&dialect.qualify(&op.name))
        .append_line(" (");
    {
        let mut body = script.indent();
        let mut first = true;
        for column in &op.columns {
            separate(&mut body, &mut first);
            generator.column_definition(column, &mut body)?;
        }
        if let Some(key) = &op.primary_key {
            separate(&mut body, &mut first);
            primary_key_clause(dialect, key, &mut body);
        }
        for unique in &op.unique_constraints {
            separate(&mut body, &mut first);
            unique_clause(dialect, unique, &mut body);
        }
        for foreign_key in &op.foreign_keys {
            separate(&mut body, &mut first);
            foreign_key_clause(dialect, foreign_key, &mut body);
        }
        body.append_line("");
    }
    script.append(")");
    if let Some(suffix) = dialect.table_storage_suffix() {
        script.append(" ").append(&suffix);
    }
    generator.end_statement(script);
    Ok(())
}

/// Standard ADD COLUMN rule
pub fn default_add_column<G>(generator: &G, op: &AddColumnOperation, script: &mut ScriptBuilder) -> MigrationResult<()>
where
    G: MigrationSqlGenerator + ?Sized,
{
    script
        .append("ALTER TABLE ")
        .append(&generator.dialect().qualify(&op.table))
        .append(" ADD ");
    generator.column_definition(&op.column, script)?;
    generator.end_statement(script);
    Ok(())
}

/// Standard CREATE INDEX rule
pub fn default_create_index<G>(generator: &G, op: &CreateIndexOperation, script: &mut ScriptBuilder) -> MigrationResult<()>
where
    G: MigrationSqlGenerator + ?Sized,
{
    let dialect = generator.dialect();
    script.append("CREATE ");
    if op.unique {
        script.append("UNIQUE ");
    }
    if let Some(clustering) = dialect.index_clustering(op.clustered) {
        script.append(clustering).append(" ");
    }
    script
        .append("INDEX ")
        .append(&dialect.quote_identifier(&op.name))
        .append(" ON ")
        .append(&dialect.qualify(&op.table))
        .append(&format!(" ({})", column_list(dialect, &op.columns)));
    generator.end_statement(script);
    Ok(())
}

fn separate(script: &mut ScriptBuilder, first: &mut bool) {
    if !*first {
        script.append_line(",");
    }
    *first = false;
}

/// Comma separated quoted identifiers
pub fn column_list(dialect: &dyn Dialect, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn primary_key_clause(dialect: &dyn Dialect, op: &AddPrimaryKeyOperation, script: &mut ScriptBuilder) {
    script
        .append("CONSTRAINT ")
        .append(&dialect.quote_identifier(&op.name))
        .append(" PRIMARY KEY ");
    if let Some(clustering) = dialect.index_clustering(op.clustered) {
        script.append(clustering).append(" ");
    }
    script.append(&format!("({})", column_list(dialect, &op.columns)));
}

fn unique_clause(dialect: &dyn Dialect, op: &AddUniqueConstraintOperation, script: &mut ScriptBuilder) {
    script
        .append("CONSTRAINT ")
        .append(&dialect.quote_identifier(&op.name))
        .append(&format!(" UNIQUE ({})", column_list(dialect, &op.columns)));
}

fn foreign_key_clause(dialect: &dyn Dialect, op: &AddForeignKeyOperation, script: &mut ScriptBuilder) {
    script
        .append("CONSTRAINT ")
        .append(&dialect.quote_identifier(&op.name))
        .append(&format!(" FOREIGN KEY ({})", column_list(dialect, &op.columns)))
        .append(" REFERENCES ")
        .append(&dialect.qualify(&op.principal_table))
        .append(&format!(" ({})", column_list(dialect, &op.principal_columns)));
    if op.on_update != ReferentialAction::NoAction {
        script.append(" ON UPDATE ").append(dialect.referential_action(op.on_update));
    }
    if op.on_delete != ReferentialAction::NoAction {
        script.append(" ON DELETE ").append(dialect.referential_action(op.on_delete));
    }
}

fn sequence_options(min_value: Option<i64>, max_value: Option<i64>, cycle: bool, script: &mut ScriptBuilder) {
    match min_value {
        Some(min) => script.append(&format!(" MINVALUE {}", min)),
        None => script.append(" NO MINVALUE"),
    };
    match max_value {
        Some(max) => script.append(&format!(" MAXVALUE {}", max)),
        None => script.append(" NO MAXVALUE"),
    };
    script.append(if cycle { " CYCLE" } else { " NO CYCLE" });
}

fn where_clause(dialect: &dyn Dialect, filter: Option<&Filter>, script: &mut ScriptBuilder) {
    let predicate = match filter {
        Some(Filter::Equals(predicates)) if !predicates.is_empty() => predicates
            .iter()
            .map(|(column, value)| {
                let column = dialect.quote_identifier(column);
                if value.is_null() {
                    format!("{} IS NULL", column)
                } else {
                    format!("{} = {}", column, dialect.escape_literal(value))
                }
            })
            .collect::<Vec<_>>()
            .join(" AND "),
        Some(Filter::Raw(sql)) => sql.clone(),
        _ => return,
    };
    script.append(" WHERE ").append(&predicate);
}

/// Generator that applies the standard rules with a given dialect
#[derive(Debug, Clone, Default)]
pub struct BaseSqlGenerator<D> {
    dialect: D,
}

impl<D: Dialect> BaseSqlGenerator<D> {
    pub fn new(dialect: D) -> Self {
        Self { dialect }
    }
}

impl<D: Dialect> MigrationSqlGenerator for BaseSqlGenerator<D> {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::AnsiDialect;
    use crate::entity::LogicalType;
    use crate::value::Value;

    fn generator() -> BaseSqlGenerator<AnsiDialect> {
        BaseSqlGenerator::new(AnsiDialect)
    }

    fn users_table() -> CreateTableOperation {
        let mut id = ColumnDefinition::new("id", LogicalType::Int64);
        id.identity = true;
        let mut email = ColumnDefinition::new("email", LogicalType::String);
        email.max_length = Some(255);
        let mut nickname = ColumnDefinition::new("nickname", LogicalType::String);
        nickname.nullable = true;
        nickname.max_length = Some(50);
        nickname.default_value = Some(Value::from("anon"));

        CreateTableOperation {
            name: TableName::new("users"),
            columns: vec![id, email, nickname],
            primary_key: Some(AddPrimaryKeyOperation {
                name: "PK_users_id".to_string(),
                table: TableName::new("users"),
                columns: vec!["id".to_string()],
                clustered: false,
            }),
            unique_constraints: Vec::new(),
            foreign_keys: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    #[test]
    fn test_create_table() {
        let commands = generator().generate(&[users_table().into()]).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0],
            "CREATE TABLE \"users\" (\n    \"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL,\n    \"email\" VARCHAR(255) NOT NULL,\n    \"nickname\" VARCHAR(50) DEFAULT 'anon',\n    CONSTRAINT \"PK_users_id\" PRIMARY KEY (\"id\")\n);"
        );
    }

    #[test]
    fn test_each_operation_is_its_own_command() {
        let operations: Vec<SchemaOperation> = vec![
            DropColumnOperation {
                table: TableName::new("users"),
                name: "nickname".to_string(),
            }
            .into(),
            SqlOperation {
                sql: "UPDATE users SET email = lower(email);".to_string(),
            }
            .into(),
            DropTableOperation {
                name: TableName::with_schema("auth", "users"),
            }
            .into(),
        ];
        let commands = generator().generate(&operations).unwrap();
        assert_eq!(
            commands,
            vec![
                "ALTER TABLE \"users\" DROP COLUMN \"nickname\";".to_string(),
                "UPDATE users SET email = lower(email);".to_string(),
                "DROP TABLE \"auth\".\"users\";".to_string(),
            ]
        );
    }

    #[test]
    fn test_renames_are_unimplemented_in_base_dialect() {
        let rename: SchemaOperation = RenameTableOperation {
            name: TableName::new("users"),
            new_name: "accounts".to_string(),
        }
        .into();
        match generator().generate(&[rename]) {
            Err(MigrationError::Unimplemented { dialect, operation }) => {
                assert_eq!(dialect, "ansi");
                assert_eq!(operation, "RenameTable");
            }
            other => panic!("expected Unimplemented, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_is_unknown() {
        let op: SchemaOperation = ExtensionOperation {
            kind: "CreateFulltextCatalog".to_string(),
            table: None,
            payload: serde_json::json!({}),
        }
        .into();
        assert!(matches!(
            generator().generate(&[op]),
            Err(MigrationError::UnknownOperation(kind)) if kind == "CreateFulltextCatalog"
        ));
    }

    #[test]
    fn test_data_operations() {
        let operations: Vec<SchemaOperation> = vec![
            InsertDataOperation {
                table: TableName::new("roles"),
                columns: vec!["id".to_string(), "name".to_string()],
                rows: vec![
                    vec![Value::from(1), Value::from("admin")],
                    vec![Value::from(2), Value::from("o'brien")],
                ],
            }
            .into(),
            UpdateDataOperation {
                table: TableName::new("roles"),
                values: vec![("name".to_string(), Value::from("root"))],
                filter: Some(Filter::Equals(vec![("id".to_string(), Value::from(1))])),
            }
            .into(),
            DeleteDataOperation {
                table: TableName::new("roles"),
                filter: Some(Filter::Equals(vec![("name".to_string(), Value::Null)])),
            }
            .into(),
        ];

        let commands = generator().generate(&operations).unwrap();
        assert_eq!(
            commands,
            vec![
                "INSERT INTO \"roles\" (\"id\", \"name\") VALUES (1, 'admin');".to_string(),
                "INSERT INTO \"roles\" (\"id\", \"name\") VALUES (2, 'o''brien');".to_string(),
                "UPDATE \"roles\" SET \"name\" = 'root' WHERE \"id\" = 1;".to_string(),
                "DELETE FROM \"roles\" WHERE \"name\" IS NULL;".to_string(),
            ]
        );
    }

    #[test]
    fn test_foreign_key_actions() {
        let op: SchemaOperation = AddForeignKeyOperation {
            name: "FK_posts_users_author_id".to_string(),
            table: TableName::new("posts"),
            columns: vec!["author_id".to_string()],
            principal_table: TableName::new("users"),
            principal_columns: vec!["id".to_string()],
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::Cascade,
        }
        .into();
        let commands = generator().generate(&[op]).unwrap();
        assert_eq!(
            commands[0],
            "ALTER TABLE \"posts\" ADD CONSTRAINT \"FK_posts_users_author_id\" FOREIGN KEY (\"author_id\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE;"
        );
    }

    #[test]
    fn test_failed_operation_stops_generation() {
        let operations: Vec<SchemaOperation> = vec![
            DropTableOperation {
                name: TableName::new("a"),
            }
            .into(),
            RenameColumnOperation {
                table: TableName::new("a"),
                name: "x".to_string(),
                new_name: "y".to_string(),
            }
            .into(),
        ];
        assert!(generator().generate(&operations).is_err());
    }
}
