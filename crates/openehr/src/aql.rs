//! Parameterized AQL construction.
//!
//! Query fragments are written as templates containing `$name` placeholders. Values are bound
//! by name and rendered as single-quoted AQL string literals with `\` and `'` escaped, so a
//! caller-supplied identifier can never close the literal and append its own query text.
//!
//! ```
//! use openehr::AqlTemplate;
//!
//! let clause = AqlTemplate::new(" and a/uid/value=$uid")
//!     .bind("uid", "abc'123")
//!     .render()
//!     .unwrap();
//! assert_eq!(clause.as_str(), r" and a/uid/value='abc\'123'");
//! ```

use crate::validation::validate_literal_value;
use crate::{OpenEhrError, OpenEhrResult};
use std::collections::BTreeMap;
use std::fmt;

/// Rendered AQL text.
///
/// Built fresh for every request: a resource's base query followed by zero or more filter
/// clauses, each of which starts with ` and `.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aql(String);

impl Aql {
    /// Wrap trusted AQL text.
    ///
    /// Only use this for text that contains no caller-supplied values, such as a resource's
    /// base query. Anything derived from input goes through [`AqlTemplate`].
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Append a filter clause.
    pub fn and(mut self, clause: Aql) -> Self {
        self.0.push_str(&clause.0);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Aql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Aql {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An AQL fragment with named `$placeholders` awaiting values.
#[derive(Clone, Debug)]
pub struct AqlTemplate {
    text: String,
    bindings: BTreeMap<String, String>,
}

impl AqlTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bindings: BTreeMap::new(),
        }
    }

    /// Bind a string value to the placeholder `$name`.
    ///
    /// Binding the same name twice keeps the last value.
    pub fn bind(mut self, name: &str, value: impl Into<String>) -> Self {
        self.bindings.insert(name.to_owned(), value.into());
        self
    }

    /// Substitute every placeholder with its bound value as an escaped string literal.
    ///
    /// # Errors
    ///
    /// - [`OpenEhrError::InvalidPlaceholder`] if a `$` is not followed by a placeholder name.
    /// - [`OpenEhrError::UnboundParameter`] if a placeholder has no bound value.
    /// - [`OpenEhrError::InvalidInput`] if a bound value fails literal validation.
    pub fn render(&self) -> OpenEhrResult<Aql> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !is_placeholder_char(c))
                .unwrap_or(after.len());

            if name_len == 0 {
                return Err(OpenEhrError::InvalidPlaceholder(format!(
                    "'$' without a name at offset {}",
                    self.text.len() - rest.len() + pos
                )));
            }

            let name = &after[..name_len];
            let value = self
                .bindings
                .get(name)
                .ok_or_else(|| OpenEhrError::UnboundParameter(name.to_owned()))?;
            validate_literal_value(value)?;

            out.push('\'');
            out.push_str(&escape_literal(value));
            out.push('\'');

            rest = &after[name_len..];
        }

        out.push_str(rest);
        Ok(Aql(out))
    }
}

fn is_placeholder_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Escape a value for use inside a single-quoted AQL string literal.
///
/// Backslashes are escaped first so the escape introduced for `'` is not doubled.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders_as_literals() {
        let aql = AqlTemplate::new(" and e/ehr_id/value=$ehr_id")
            .bind("ehr_id", "7d44b88c")
            .render()
            .expect("render should succeed");
        assert_eq!(aql.as_str(), " and e/ehr_id/value='7d44b88c'");
    }

    #[test]
    fn test_render_handles_multiple_and_adjacent_placeholders() {
        let aql = AqlTemplate::new("x=$a and y=$b_2")
            .bind("a", "1")
            .bind("b_2", "2")
            .render()
            .expect("render should succeed");
        assert_eq!(aql.as_str(), "x='1' and y='2'");
    }

    #[test]
    fn test_render_escapes_quote_injection() {
        let aql = AqlTemplate::new(" and a/uid/value=$uid")
            .bind("uid", "x' or '1'='1")
            .render()
            .expect("render should succeed");
        assert_eq!(aql.as_str(), r" and a/uid/value='x\' or \'1\'=\'1'");
    }

    #[test]
    fn test_render_rejects_unbound_placeholder() {
        let err = AqlTemplate::new("a=$missing")
            .render()
            .expect_err("should reject unbound placeholder");
        assert!(matches!(err, OpenEhrError::UnboundParameter(name) if name == "missing"));
    }

    #[test]
    fn test_render_rejects_dangling_dollar() {
        let err = AqlTemplate::new("a=$ and b")
            .render()
            .expect_err("should reject '$' without name");
        assert!(matches!(err, OpenEhrError::InvalidPlaceholder(msg) if msg.contains("offset 2")));
    }

    #[test]
    fn test_render_rejects_control_characters_in_values() {
        let err = AqlTemplate::new("a=$v")
            .bind("v", "line\nbreak")
            .render()
            .expect_err("should reject control characters");
        assert!(matches!(err, OpenEhrError::InvalidInput(_)));
    }

    #[test]
    fn test_escape_literal_escapes_backslash_before_quote() {
        assert_eq!(escape_literal(r"a\'b"), r"a\\\'b");
        assert_eq!(escape_literal("plain"), "plain");
    }

    #[test]
    fn test_and_appends_clauses_in_order() {
        let aql = Aql::new("select a from EHR e where x=1")
            .and(Aql::new(" and y=2"))
            .and(Aql::new(" and z=3"));
        assert_eq!(aql.to_string(), "select a from EHR e where x=1 and y=2 and z=3");
    }
}
