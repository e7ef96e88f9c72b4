/// Identity of a loader definition.
///
/// `NAME` becomes the `<SessionTypeName>` segment of every label a loader of
/// this type reports, so distinct loader definitions sharing one stats sink
/// keep disjoint counter namespaces. Declare one with
/// [`loader_type!`](crate::loader_type).
pub trait LoaderType {
    const NAME: &'static str;
}

/// Loader type used when no specific definition is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseLoader;

impl LoaderType for BaseLoader {
    const NAME: &'static str = "ItemLoader";
}

/// Options that affect position assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Position assigned to the first rule evaluated for a (field, kind) pair.
    pub start_position: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { start_position: 1 }
    }
}

/// Ordered fallback rules for one field, with an optional human-readable name.
///
/// A lone expression converts into a one-element list, so callers can pass
/// either `"h1::text"` or `["h1::text", "h2::text"]` wherever `impl Into<Rules>`
/// is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules<'r> {
    expressions: Vec<&'r str>,
    name: Option<&'r str>,
}

impl<'r> Rules<'r> {
    pub fn new(expressions: impl IntoIterator<Item = &'r str>) -> Self {
        Self { expressions: expressions.into_iter().collect(), name: None }
    }

    /// Attach a name; it is reported as an extra label segment after the position.
    pub fn named(mut self, name: &'r str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn expressions(&self) -> &[&'r str] {
        &self.expressions
    }

    pub fn name(&self) -> Option<&'r str> {
        self.name
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

impl<'r> From<&'r str> for Rules<'r> {
    fn from(expression: &'r str) -> Self {
        Rules::new([expression])
    }
}

impl<'r> From<&'r String> for Rules<'r> {
    fn from(expression: &'r String) -> Self {
        Rules::new([expression.as_str()])
    }
}

impl<'r, const N: usize> From<[&'r str; N]> for Rules<'r> {
    fn from(expressions: [&'r str; N]) -> Self {
        Rules::new(expressions)
    }
}

impl<'r> From<&'r [&'r str]> for Rules<'r> {
    fn from(expressions: &'r [&'r str]) -> Self {
        Rules::new(expressions.iter().copied())
    }
}

impl<'r> From<Vec<&'r str>> for Rules<'r> {
    fn from(expressions: Vec<&'r str>) -> Self {
        Self { expressions, name: None }
    }
}

impl<'r> From<&'r [String]> for Rules<'r> {
    fn from(expressions: &'r [String]) -> Self {
        Rules::new(expressions.iter().map(String::as_str))
    }
}

impl<'r> From<&'r Vec<String>> for Rules<'r> {
    fn from(expressions: &'r Vec<String>) -> Self {
        Rules::from(expressions.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_expression_becomes_single_rule() {
        let rules = Rules::from("h1::text");
        assert_eq!(rules.expressions(), ["h1::text"]);
        assert_eq!(rules.name(), None);
    }

    #[test]
    fn owned_lists_keep_order_and_name() {
        let owned = vec!["h1::text".to_string(), "h2::text".to_string()];
        let rules = Rules::from(&owned).named("headline");
        assert_eq!(rules.expressions(), ["h1::text", "h2::text"]);
        assert_eq!(rules.name(), Some("headline"));
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn empty_list_is_allowed() {
        let rules = Rules::from(Vec::<&str>::new());
        assert!(rules.is_empty());
    }

    #[test]
    fn default_options_start_at_one() {
        assert_eq!(Options::default().start_position, 1);
        assert_eq!(BaseLoader::NAME, "ItemLoader");
    }
}
