use super::{Query, Scope};
use crate::{Error, Result, SelectorKind};
use scraper::Selector;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::trace;

/// What a CSS rule yields for each matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Extract {
    /// Serialized element.
    Element,
    /// `::text`: the element's direct text children.
    Text,
    /// `sel ::text`: every text node of the element and its descendants.
    DeepText,
    /// `::attr(name)`: the attribute value, when present.
    Attr(String),
}

/// CSS rule, e.g. `.quote > span[itemprop="text"]::text`.
///
/// Matching is descendant-or-self: the scope element itself can match.
#[derive(Debug, Clone)]
pub struct CssQuery {
    expression: String,
    selector: Selector,
    extract: Extract,
}

impl CssQuery {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Matched elements as sub-scopes; `None` when the rule extracts text or attributes.
    pub(crate) fn elements<'d>(&self, scope: &Scope<'d>) -> Option<Vec<Scope<'d>>> {
        if self.extract != Extract::Element {
            return None;
        }
        Some(self.matches(scope).map(Scope::new).collect())
    }

    fn matches<'d>(&self, scope: &Scope<'d>) -> impl Iterator<Item = scraper::ElementRef<'d>> {
        let root = scope.element();
        let own = self.selector.matches(&root).then_some(root);
        own.into_iter().chain(root.select(&self.selector))
    }
}

impl Query for CssQuery {
    const KIND: SelectorKind = SelectorKind::Css;

    fn compile(expression: &str) -> Result<Self> {
        let (source, extract) = split_pseudo_element(expression);
        let (source, extract) = selector_source(source, extract);
        let selector = Selector::parse(&source)
            .map_err(|err| Error::invalid_selector(SelectorKind::Css, expression, err.to_string()))?;

        trace!(expression, ?extract, "compiled css query");
        Ok(Self { expression: expression.to_string(), selector, extract })
    }

    fn evaluate(&self, scope: &Scope<'_>) -> Vec<String> {
        let mut out = Vec::new();
        // Nested matches share text nodes; each node is reported once.
        let mut seen = HashSet::new();
        for element in self.matches(scope) {
            match &self.extract {
                Extract::Element => out.push(element.html()),
                Extract::Text => {
                    out.extend(element.children().filter_map(|node| node.value().as_text()).map(|t| String::from(&**t)))
                }
                Extract::DeepText => {
                    for node in element.descendants() {
                        let Some(text) = node.value().as_text() else { continue };
                        if seen.insert(node.id()) {
                            out.push(String::from(&**text));
                        }
                    }
                }
                Extract::Attr(name) => out.extend(element.value().attr(name).map(str::to_string)),
            }
        }
        out
    }
}

/// Split a trailing `::text` / `::attr(name)` off the selector.
fn split_pseudo_element(expression: &str) -> (&str, Extract) {
    let re = regex!(r"::(?:(text)|attr\(\s*([^()\s]+)\s*\))\s*$");
    let Some(caps) = re.captures(expression) else {
        return (expression, Extract::Element);
    };
    let Some(whole) = caps.get(0) else {
        return (expression, Extract::Element);
    };

    let extract = match caps.get(2) {
        Some(name) => Extract::Attr(name.as_str().to_string()),
        None => Extract::Text,
    };
    (&expression[..whole.start()], extract)
}

/// Selector text to compile for what precedes the pseudo-element.
///
/// `p ::text` keeps `p` and switches to descendant-or-self text. Other rules
/// ending in a combinator, and an empty selector, get an implicit `*`.
fn selector_source(source: &str, extract: Extract) -> (Cow<'_, str>, Extract) {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return (Cow::Borrowed("*"), extract);
    }
    if trimmed.ends_with(['>', '+', '~']) {
        return (Cow::Owned(format!("{trimmed} *")), extract);
    }
    if source.ends_with(char::is_whitespace) {
        return match extract {
            Extract::Text => (Cow::Borrowed(trimmed), Extract::DeepText),
            other => (Cow::Owned(format!("{trimmed} *")), other),
        };
    }
    (Cow::Borrowed(trimmed), extract)
}
