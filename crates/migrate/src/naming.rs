//! Conventional constraint and index names
//!
//! Names are a pure function of (kind, table, columns[, principal table]) so
//! the same declaration produces the same name on every run and a later step
//! can drop what an earlier step created without repeating the name.

use crate::operations::TableName;

/// Kind of named schema object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    UniqueConstraint,
    ForeignKey,
    Index,
}

impl ConstraintKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PK",
            ConstraintKind::UniqueConstraint => "AK",
            ConstraintKind::ForeignKey => "FK",
            ConstraintKind::Index => "IX",
        }
    }
}

/// Build the conventional name for a constraint or index
///
/// ```
/// use elif_migrate::naming::{constraint_name, ConstraintKind};
/// use elif_migrate::TableName;
///
/// let posts = TableName::new("posts");
/// let users = TableName::with_schema("auth", "users");
///
/// assert_eq!(constraint_name(ConstraintKind::Index, &posts, &["author_id"], None), "IX_posts_author_id");
/// assert_eq!(
///     constraint_name(ConstraintKind::ForeignKey, &posts, &["author_id"], Some(&users)),
///     "FK_posts_users_author_id"
/// );
/// ```
pub fn constraint_name<S: AsRef<str>>(
    kind: ConstraintKind,
    table: &TableName,
    columns: &[S],
    principal: Option<&TableName>,
) -> String {
    let mut name = format!("{}_{}", kind.prefix(), table.name);
    if let Some(principal) = principal {
        name.push('_');
        name.push_str(&principal.name);
    }
    for column in columns {
        name.push('_');
        name.push_str(column.as_ref());
    }
    name
}
