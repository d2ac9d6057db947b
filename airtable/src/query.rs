//! List query parameters and formula helpers

use serde::{Deserialize, Serialize};

/// Sort direction accepted by the list endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

impl SortDirection {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Field and direction to sort by
    pub sort: Option<(String, SortDirection)>,
    /// Airtable formula records must satisfy
    pub filter_by_formula: Option<String>,
}

impl ListQuery {
    /// Sort by one field
    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    /// Restrict to records matching `formula`
    #[must_use]
    pub fn filtered_by(mut self, formula: impl Into<String>) -> Self {
        self.filter_by_formula = Some(formula.into());
        self
    }

    /// Query-string pairs, unencoded, in request order
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);

        if let Some((field, direction)) = &self.sort {
            pairs.push(("sort[0][field]", field.clone()));
            pairs.push(("sort[0][direction]", direction.as_str().to_string()));
        }
        if let Some(formula) = &self.filter_by_formula {
            pairs.push(("filterByFormula", formula.clone()));
        }

        pairs
    }
}

/// Quote `text` as a formula string literal
///
/// Produces a double-quoted literal with quotes, backslashes and control
/// characters escaped, so user text cannot terminate the literal early.
#[must_use]
pub fn string_literal(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pairs_follow_sort_then_filter() {
        let query = ListQuery::default()
            .sorted_by("createdTime", SortDirection::Desc)
            .filtered_by("{isCompleted}=FALSE()");

        assert_eq!(
            query.to_pairs(),
            vec![
                ("sort[0][field]", "createdTime".to_string()),
                ("sort[0][direction]", "desc".to_string()),
                ("filterByFormula", "{isCompleted}=FALSE()".to_string()),
            ]
        );
    }

    #[test]
    fn string_literal_escapes_quotes() {
        assert_eq!(string_literal("cat"), r#""cat""#);
        assert_eq!(string_literal(r#"cat "dog""#), r#""cat \"dog\"""#);
        assert_eq!(string_literal(r"a\b"), r#""a\\b""#);
        assert_eq!(string_literal("(bird)%"), r#""(bird)%""#);
    }

    proptest! {
        #[test]
        fn string_literal_round_trips(text in ".*") {
            let literal = string_literal(&text);
            let decoded: String = serde_json::from_str(&literal).unwrap_or_default();
            prop_assert_eq!(decoded, text);
        }
    }
}
