use indexmap::IndexMap;
use regex::{Captures, Regex};

/// Matches, in order of preference: a quoted string, a backticked
/// identifier, a comment, a raw positional `?`, or a named placeholder.
///
/// Only the last two are rewritten; everything else is copied through.
const PLACEHOLDER: &str = concat!(
    r"'(?:[^'\\]|\\(?s:.)|'')*'",
    r#"|"(?:[^"\\]|\\(?s:.)|"")*""#,
    r"|`(?:[^`]|``)*`",
    r"|--[ \t][^\n]*|#[^\n]*|/\*(?s:.*?)\*/",
    r"|\?",
    r"|:([a-zA-Z0-9_]+)",
);

/// Converts named placeholders (`:name`) to positional placeholders (`?`) for MySQL.
///
/// Text inside string literals, backticked identifiers and comments is left
/// untouched.
///
/// # Examples
///
/// ```
/// use sqlx_named_entity::builder::build_query;
///
/// let sql = build_query("SELECT * FROM users WHERE id = :id AND name = :name")?;
/// assert_eq!(sql, "SELECT * FROM users WHERE id = ? AND name = ?");
/// # Ok::<(), sqlx_named_entity::Error>(())
/// ```
pub fn build_query(template: &str) -> crate::Result<String> {
    Ok(ParsedSql::parse(template)?.sql)
}

/// A SQL template rewritten to positional placeholders, together with the
/// positions each named parameter occupies.
///
/// Positions are 1-based and assigned left to right, once per placeholder
/// occurrence. Raw `?` markers count as anonymous positions, so a template
/// mixing both styles numbers them the way the database will.
///
/// ```
/// use sqlx_named_entity::builder::ParsedSql;
///
/// let parsed = ParsedSql::parse("select * from times where year = :y and month = :y")?;
/// assert_eq!(parsed.sql(), "select * from times where year = ? and month = ?");
/// assert_eq!(parsed.positions("y"), Some(&[1, 2][..]));
/// assert_eq!(parsed.param_count(), 1);
/// # Ok::<(), sqlx_named_entity::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSql {
    template: String,
    sql: String,
    positions: IndexMap<String, Vec<usize>>,
    anonymous: Vec<usize>,
    placeholder_count: usize,
}

impl ParsedSql {
    /// Scans `template` and rewrites every named placeholder to `?`.
    ///
    /// # Errors
    ///
    /// Returns an error if the placeholder pattern cannot be compiled.
    pub fn parse<T>(template: T) -> crate::Result<Self>
    where
        T: Into<String>,
    {
        let template = template.into();
        let regex = Regex::new(PLACEHOLDER)?;

        let mut positions: IndexMap<String, Vec<usize>> = IndexMap::new();
        let mut anonymous = Vec::new();
        let mut current = 0;

        let sql = regex
            .replace_all(&template, |caps: &Captures<'_>| {
                let matched = &caps[0];
                let name = caps.get(1);
                if name.is_none() && matched != "?" {
                    return matched.to_owned();
                }

                // increment first, so we match SQL numbering
                current += 1;
                match name {
                    Some(name) => positions
                        .entry(name.as_str().to_owned())
                        .or_default()
                        .push(current),
                    None => anonymous.push(current),
                }
                "?".to_owned()
            })
            .into_owned();

        Ok(Self {
            template,
            sql,
            positions,
            anonymous,
            placeholder_count: current,
        })
    }

    /// The template as it was given, with named placeholders.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The rewritten statement with positional placeholders only.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Positions occupied by `name`, without the leading colon.
    pub fn positions(&self, name: &str) -> Option<&[usize]> {
        self.positions.get(name).map(Vec::as_slice)
    }

    /// Declared parameter names in order of first appearance.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    /// Positions of raw `?` markers in the template.
    pub fn anonymous_positions(&self) -> &[usize] {
        &self.anonymous
    }

    /// Number of distinct named parameters.
    pub fn param_count(&self) -> usize {
        self.positions.len()
    }

    /// Total number of placeholders, named and anonymous.
    pub fn placeholder_count(&self) -> usize {
        self.placeholder_count
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_single_param() {
        let result = build_query("SELECT * FROM users WHERE id = :id").unwrap();
        assert_eq!(result, "SELECT * FROM users WHERE id = ?");
    }

    #[test]
    fn test_build_query_multiple_params() {
        let result = build_query("SELECT * FROM users WHERE id = :id AND name = :name").unwrap();
        assert_eq!(result, "SELECT * FROM users WHERE id = ? AND name = ?");
    }

    #[test]
    fn test_build_query_no_params() {
        let result = build_query("SELECT * FROM users").unwrap();
        assert_eq!(result, "SELECT * FROM users");
    }

    #[test]
    fn test_build_query_with_underscores() {
        let result = build_query("SELECT * FROM users WHERE user_id = :user_id").unwrap();
        assert_eq!(result, "SELECT * FROM users WHERE user_id = ?");
    }

    #[test]
    fn test_build_query_skips_string_literals() {
        let result =
            build_query("SELECT * FROM events WHERE at = '10:30' AND note = 'it''s :x' AND id = :id")
                .unwrap();
        assert_eq!(
            result,
            "SELECT * FROM events WHERE at = '10:30' AND note = 'it''s :x' AND id = ?"
        );
    }

    #[test]
    fn test_build_query_skips_quoted_text_and_comments() {
        let template = concat!(
            "SELECT `a:b` FROM t /* :skip ? */ WHERE x = \"c:d\" -- :tail ?\n",
            "AND y = 'it\\'s :e' # :hash\n",
            "AND z = :z",
        );
        let parsed = ParsedSql::parse(template).unwrap();
        assert_eq!(
            parsed.sql(),
            concat!(
                "SELECT `a:b` FROM t /* :skip ? */ WHERE x = \"c:d\" -- :tail ?\n",
                "AND y = 'it\\'s :e' # :hash\n",
                "AND z = ?",
            )
        );
        assert_eq!(parsed.names().collect::<Vec<_>>(), vec!["z"]);
        assert_eq!(parsed.placeholder_count(), 1);
        assert!(parsed.anonymous_positions().is_empty());
    }

    #[test]
    fn test_parse_counts_every_occurrence() {
        let parsed = ParsedSql::parse(
            "UPDATE t SET a = :a, b = :b WHERE a = :a OR c = :c OR b = :b",
        )
        .unwrap();

        assert_eq!(parsed.sql().matches('?').count(), 5);
        assert_eq!(parsed.placeholder_count(), 5);
        assert_eq!(parsed.param_count(), 3);
        assert_eq!(parsed.positions("a"), Some(&[1, 3][..]));
        assert_eq!(parsed.positions("b"), Some(&[2, 5][..]));
        assert_eq!(parsed.positions("c"), Some(&[4][..]));
        assert_eq!(parsed.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_repeated_name() {
        let parsed =
            ParsedSql::parse("select * from times where year = :y and month = :y").unwrap();
        assert_eq!(parsed.sql(), "select * from times where year = ? and month = ?");
        assert_eq!(parsed.param_count(), 1);
        assert_eq!(parsed.positions("y"), Some(&[1, 2][..]));
    }

    #[test]
    fn test_parse_mixed_positional_and_named() {
        let parsed = ParsedSql::parse("select * from t where a = ? and b = :b and c = ?").unwrap();
        assert_eq!(parsed.sql(), "select * from t where a = ? and b = ? and c = ?");
        assert_eq!(parsed.anonymous_positions(), &[1, 3]);
        assert_eq!(parsed.positions("b"), Some(&[2][..]));
        assert_eq!(parsed.placeholder_count(), 3);
    }

    #[test]
    fn test_parse_keeps_template() {
        let parsed = ParsedSql::parse("select :a").unwrap();
        assert_eq!(parsed.template(), "select :a");
        assert!(parsed.contains("a"));
        assert!(!parsed.contains(":a"));
        assert_eq!(parsed.positions("missing"), None);
    }
}
