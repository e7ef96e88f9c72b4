use crate::SelectorKind;
use std::fmt;

/// First segment of every usage label.
pub const LABEL_PREFIX: &str = "parser";
/// Final segment appended when a rule produced nothing.
pub const MISSING_SUFFIX: &str = "missing";

/// Canonical counter key for one rule outcome.
///
/// Renders as `parser/<Loader>/<field>/<kind>/<position>[/<name>][/missing]`.
/// The label is a pure function of its fields, so the same rule in the same
/// place always accumulates into the same counter across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsageLabel {
    loader: &'static str,
    field: String,
    kind: SelectorKind,
    position: usize,
    name: Option<String>,
    missing: bool,
}

impl UsageLabel {
    /// Build a label. An empty `name` is treated as absent so the rendered
    /// label never contains an empty segment.
    pub fn new(
        loader: &'static str,
        field: &str,
        kind: SelectorKind,
        position: usize,
        name: Option<&str>,
        missing: bool,
    ) -> Self {
        Self {
            loader,
            field: field.to_string(),
            kind,
            position,
            name: name.filter(|n| !n.is_empty()).map(str::to_string),
            missing,
        }
    }

    /// Whether a raw rule result counts as "nothing found": absent or empty.
    pub fn is_missing_result<T>(raw: Option<&[T]>) -> bool {
        raw.is_none_or(|values| values.is_empty())
    }

    pub fn loader(&self) -> &'static str {
        self.loader
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_missing(&self) -> bool {
        self.missing
    }
}

impl fmt::Display for UsageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LABEL_PREFIX}/{}/{}/{}/{}", self.loader, self.field, self.kind, self.position)?;
        if let Some(name) = &self.name {
            write!(f, "/{name}")?;
        }
        if self.missing {
            write!(f, "/{MISSING_SUFFIX}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_plain_label() {
        let label = UsageLabel::new("QuotesItemLoader", "author", SelectorKind::Css, 1, None, false);
        assert_eq!(label.to_string(), "parser/QuotesItemLoader/author/css/1");
    }

    #[test]
    fn name_precedes_missing_suffix() {
        let label =
            UsageLabel::new("QuotesItemLoader", "quote", SelectorKind::Css, 1, Some("Quotes inside the box"), true);
        assert_eq!(label.to_string(), "parser/QuotesItemLoader/quote/css/1/Quotes inside the box/missing");
    }

    #[test]
    fn empty_name_leaves_no_empty_segment() {
        let label = UsageLabel::new("ItemLoader", "title", SelectorKind::XPath, 3, Some(""), true);
        assert_eq!(label.to_string(), "parser/ItemLoader/title/xpath/3/missing");
        assert!(!label.to_string().contains("//"));
        assert_eq!(label.name(), None);
    }

    #[test]
    fn missing_means_absent_or_empty() {
        assert!(UsageLabel::is_missing_result::<String>(None));
        assert!(UsageLabel::is_missing_result(Some(&[] as &[String])));
        assert!(!UsageLabel::is_missing_result(Some(&[String::new()][..])));
        assert!(!UsageLabel::is_missing_result(Some(&["0".to_string()][..])));
    }
}
