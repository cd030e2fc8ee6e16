//! Identifier utilities
//!
//! Quoting and validation of SQL identifiers, plus the naming conventions used
//! to derive table and column names from entity metadata.

use crate::error::{MigrationError, MigrationResult};

/// Characters allowed in bookkeeping identifiers (alphanumeric, underscore, dollar)
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// PostgreSQL truncates identifiers beyond this length
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Quote an identifier, doubling any embedded quote character
///
/// ```
/// use elif_migrate::identifier::quote_identifier;
///
/// assert_eq!(quote_identifier("users", '"'), "\"users\"");
/// assert_eq!(quote_identifier("odd\"name", '"'), "\"odd\"\"name\"");
/// assert_eq!(quote_identifier("users", '`'), "`users`");
/// ```
pub fn quote_identifier(identifier: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    let escaped = identifier.replace(quote, &doubled);
    format!("{}{}{}", quote, escaped, quote)
}

/// Validate an identifier that is interpolated outside of generated DDL,
/// such as the ledger table name
pub fn validate_identifier(identifier: &str) -> MigrationResult<()> {
    let first = identifier
        .chars()
        .next()
        .ok_or_else(|| MigrationError::Configuration("Identifier cannot be empty".to_string()))?;

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrationError::Configuration(format!(
            "Identifier '{}' is too long (max {} characters)",
            identifier, MAX_IDENTIFIER_LENGTH
        )));
    }

    if let Some(c) = identifier.chars().find(|c| !ALLOWED_IDENTIFIER_CHARS.contains(*c)) {
        return Err(MigrationError::Configuration(format!(
            "Identifier '{}' contains invalid character '{}'",
            identifier, c
        )));
    }

    if first.is_ascii_digit() {
        return Err(MigrationError::Configuration(format!(
            "Identifier '{}' cannot start with a number",
            identifier
        )));
    }

    Ok(())
}

/// Convert `UserRole` / `userRole` / `user role` to `user_role`
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for c in name.chars() {
        if c == ' ' || c == '-' {
            if !result.ends_with('_') && !result.is_empty() {
                result.push('_');
            }
            previous = Some('_');
            continue;
        }
        if c.is_uppercase() {
            let after_word = previous.map_or(false, |p| p.is_lowercase() || p.is_ascii_digit());
            if after_word && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
        previous = Some(c);
    }

    result
}

/// Conventional table name for an entity: snake_case, naive plural
pub fn table_name_for(entity: &str) -> String {
    let snake = to_snake_case(entity);
    if snake.ends_with('s') {
        snake
    } else if snake.ends_with('y') && !snake.ends_with("ay") && !snake.ends_with("ey") {
        format!("{}ies", &snake[..snake.len() - 1])
    } else {
        format!("{}s", snake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("__elif_schema_migrations").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1table").is_err());
        assert!(validate_identifier("drop table;").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("UserRole"), "user_role");
        assert_eq!(to_snake_case("userRole"), "user_role");
        assert_eq!(to_snake_case("user_role"), "user_role");
        assert_eq!(to_snake_case("Oauth2Client"), "oauth2_client");
        assert_eq!(to_snake_case("display name"), "display_name");
    }

    #[test]
    fn test_table_name_convention() {
        assert_eq!(table_name_for("User"), "users");
        assert_eq!(table_name_for("UserRole"), "user_roles");
        assert_eq!(table_name_for("Policy"), "policies");
        assert_eq!(table_name_for("Key"), "keys");
        assert_eq!(table_name_for("Address"), "address");
    }
}
