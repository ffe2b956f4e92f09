//! Statement text helpers
//!
//! Statements are written with `?` placeholders and rewritten to whatever the
//! driver expects right before execution. Values always travel separately.

use crate::core::{DbError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap());

static OPTION_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?[0-9]+|[A-Za-z_][A-Za-z0-9_]*)$").unwrap());

/// Native placeholder syntax of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?`, left untouched
    #[default]
    Qmark,
    /// `?1`, `?2`, ...
    Numbered,
    /// `%s`, as used by the Python DB-API MySQL drivers
    Format,
}

/// Rewrites every `?` outside quoted text and comments into the given
/// placeholder style.
///
/// Single quotes, double quotes and backticks open a literal that runs until
/// the matching quote. A doubled quote inside a literal closes and reopens
/// it, which leaves the scanner in the right state. `--` comments run to the
/// end of the line and `/* */` comments to their terminator. A `?` already
/// followed by digits is an explicit parameter number and is kept as is.
pub fn translate_placeholders(sql: &str, style: PlaceholderStyle) -> String {
    match style {
        PlaceholderStyle::Qmark => sql.to_string(),
        PlaceholderStyle::Numbered => scan(sql, |n, out| out.push_str(&format!("?{}", n))).0,
        PlaceholderStyle::Format => scan(sql, |_, out| out.push_str("%s")).0,
    }
}

/// Counts the `?` placeholders that [`translate_placeholders`] would rewrite.
pub fn count_placeholders(sql: &str) -> usize {
    scan(sql, |_, out| out.push('?')).1
}

fn scan(sql: &str, mut placeholder: impl FnMut(usize, &mut String)) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\'' | '"' | '`' => {
                for next in chars.by_ref() {
                    out.push(next);
                    if next == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    out.push(next);
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                // The opening '*' cannot also close the comment.
                let mut prev = ' ';
                if let Some(star) = chars.next() {
                    out.push(star);
                }
                for next in chars.by_ref() {
                    out.push(next);
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '?' if !chars.peek().map_or(false, char::is_ascii_digit) => {
                out.pop();
                count += 1;
                placeholder(count, &mut out);
            }
            _ => {}
        }
    }
    (out, count)
}

/// Returns `name` if it is a plain (optionally schema-qualified) identifier.
pub fn check_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(DbError::Query(format!("invalid identifier: {:?}", name)))
    }
}

/// Returns `value` if it is safe to splice into a driver option statement:
/// a bare word or a signed integer.
pub fn check_option_value(value: &str) -> Result<&str> {
    if OPTION_VALUE.is_match(value) {
        Ok(value)
    } else {
        Err(DbError::Configuration(format!("invalid option value: {:?}", value)))
    }
}

/// Builds `INSERT INTO table (c1, c2) VALUES (?, ?)` for the given columns.
pub fn build_insert(table: &str, columns: &[&str]) -> Result<String> {
    let table = check_identifier(table)?;
    if columns.is_empty() {
        return Err(DbError::Query(format!("insert into {} without any fields", table)));
    }
    let names = columns
        .iter()
        .map(|c| check_identifier(c))
        .collect::<Result<Vec<_>>>()?;
    let marks = vec!["?"; names.len()];
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        marks.join(", ")
    ))
}

/// Represents different SQL statement types for introspection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    /// BEGIN/COMMIT/ROLLBACK transaction commands
    Transaction,
    Other,
}

impl StatementType {
    /// Determines the statement type from the leading keyword
    pub fn from_sql(sql: &str) -> Self {
        let sql_upper = sql.trim().to_uppercase();
        let keyword = sql_upper.split_whitespace().next().unwrap_or("");

        match keyword {
            "SELECT" | "WITH" | "PRAGMA" | "EXPLAIN" => StatementType::Select,
            "INSERT" | "REPLACE" => StatementType::Insert,
            "UPDATE" => StatementType::Update,
            "DELETE" => StatementType::Delete,
            "CREATE" => StatementType::Create,
            "DROP" => StatementType::Drop,
            "ALTER" => StatementType::Alter,
            "BEGIN" | "COMMIT" | "ROLLBACK" => StatementType::Transaction,
            _ => StatementType::Other,
        }
    }

    /// Whether the statement produces a result set worth fetching
    pub fn returns_rows(self) -> bool {
        self == StatementType::Select
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_numbered() {
        let sql = translate_placeholders("select * from users where id = ? and name = ?", PlaceholderStyle::Numbered);
        assert_eq!(sql, "select * from users where id = ?1 and name = ?2");
    }

    #[test]
    fn test_translate_format_skips_literals() {
        let sql = translate_placeholders(
            "update t set note = 'why?', `odd?` = ? where id = ?",
            PlaceholderStyle::Format,
        );
        assert_eq!(sql, "update t set note = 'why?', `odd?` = %s where id = %s");
    }

    #[test]
    fn test_translate_doubled_quote() {
        let sql = translate_placeholders("select 'it''s ?', ?", PlaceholderStyle::Numbered);
        assert_eq!(sql, "select 'it''s ?', ?1");
        assert_eq!(count_placeholders("select 'it''s ?', ?"), 1);
    }

    #[test]
    fn test_translate_keeps_numbered_parameters() {
        let sql = translate_placeholders("select * from t where a = ?1 or b = ?1", PlaceholderStyle::Numbered);
        assert_eq!(sql, "select * from t where a = ?1 or b = ?1");
        assert_eq!(count_placeholders("select ?12, ?"), 1);
    }

    #[test]
    fn test_translate_skips_comments() {
        let sql = "-- don't touch ?\nselect ? /* why? isn't it */ , ?";
        assert_eq!(
            translate_placeholders(sql, PlaceholderStyle::Numbered),
            "-- don't touch ?\nselect ?1 /* why? isn't it */ , ?2"
        );
        assert_eq!(
            translate_placeholders("select a - ? / ? -- tail ?", PlaceholderStyle::Format),
            "select a - %s / %s -- tail ?"
        );
        assert_eq!(count_placeholders("/*/ ? */ ?"), 1);
    }

    #[test]
    fn test_option_values() {
        assert_eq!(check_option_value("WAL").unwrap(), "WAL");
        assert_eq!(check_option_value("-2000").unwrap(), "-2000");
        assert!(matches!(check_option_value("ON; DROP TABLE users"), Err(DbError::Configuration(_))));
        assert!(matches!(check_option_value(""), Err(DbError::Configuration(_))));
    }

    #[test]
    fn test_qmark_is_identity() {
        let sql = "select ? from t where a = '?'";
        assert_eq!(translate_placeholders(sql, PlaceholderStyle::Qmark), sql);
    }

    #[test]
    fn test_build_insert() {
        let sql = build_insert("users", &["name", "age"]).unwrap();
        insta::assert_snapshot!(sql, @"INSERT INTO users (name, age) VALUES (?, ?)");
    }

    #[test]
    fn test_build_insert_rejects_bad_identifiers() {
        assert!(matches!(build_insert("users; drop table x", &["a"]), Err(DbError::Query(_))));
        assert!(matches!(build_insert("users", &["a b"]), Err(DbError::Query(_))));
        assert!(matches!(build_insert("users", &[]), Err(DbError::Query(_))));
        assert!(build_insert("main.users", &["_id"]).is_ok());
    }

    #[test]
    fn test_statement_type_classification() {
        assert_eq!(StatementType::from_sql("SELECT * FROM users"), StatementType::Select);
        assert_eq!(StatementType::from_sql("  with x as (select 1) select * from x"), StatementType::Select);
        assert_eq!(StatementType::from_sql("INSERT INTO users VALUES (1, 'test')"), StatementType::Insert);
        assert_eq!(StatementType::from_sql("UPDATE users SET name = 'new'"), StatementType::Update);
        assert_eq!(StatementType::from_sql("DELETE FROM users WHERE id = 1"), StatementType::Delete);
        assert_eq!(StatementType::from_sql("CREATE TABLE test (id INTEGER)"), StatementType::Create);
        assert_eq!(StatementType::from_sql("DROP TABLE test"), StatementType::Drop);
        assert_eq!(StatementType::from_sql("BEGIN TRANSACTION"), StatementType::Transaction);
        assert_eq!(StatementType::from_sql("VACUUM"), StatementType::Other);
        assert!(StatementType::from_sql("select 1").returns_rows());
        assert!(!StatementType::from_sql("delete from t").returns_rows());
    }
}
