//! Selector capability.
//!
//! Loaders do not know how a rule is evaluated: they compile each expression
//! into a [`CompiledQuery`] for its [`SelectorKind`] and run it against the
//! bound [`Scope`]. Queries are pure: they never mutate the document.
//!
//! - `css.rs`: CSS selectors (via `scraper`) with the scraping pseudo-elements
//!   `::text` and `::attr(name)`.
//! - `xpath.rs`: a compact XPath 1.0 subset evaluated over the same DOM.
//!
//! Both return strings: serialized HTML for elements, raw text for text nodes
//! and attribute values.

#[path = "selector/css.rs"]
mod css;
#[path = "selector/xpath.rs"]
mod xpath;

pub use css::CssQuery;
pub use xpath::XPathQuery;

use crate::{Error, Result, SelectorKind};
use scraper::{ElementRef, Html};

/// Parsed HTML document that loaders query.
#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Parse an HTML fragment (no implied `<head>`/`<body>` handling).
    pub fn fragment(html: &str) -> Self {
        Self { html: Html::parse_fragment(html) }
    }

    /// Scope covering the whole document.
    pub fn root(&self) -> Scope<'_> {
        Scope { element: self.html.root_element() }
    }
}

/// An element of a [`Document`] that queries are evaluated against.
///
/// Rules are relative to the scope. Absolute XPath expressions (`/…`, `//…`)
/// still start from the document root.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'d> {
    element: ElementRef<'d>,
}

impl<'d> Scope<'d> {
    pub(crate) fn new(element: ElementRef<'d>) -> Self {
        Self { element }
    }

    pub(crate) fn element(&self) -> ElementRef<'d> {
        self.element
    }

    /// Element sub-scopes matching a CSS selector, e.g. one per `div.quote`.
    pub fn css(&self, expression: &str) -> Result<Vec<Scope<'d>>> {
        CssQuery::compile(expression)?
            .elements(self)
            .ok_or_else(|| Error::InvalidScope { expression: expression.to_string() })
    }

    /// Element sub-scopes matching an XPath expression.
    pub fn xpath(&self, expression: &str) -> Result<Vec<Scope<'d>>> {
        XPathQuery::compile(expression)?
            .elements(self)
            .ok_or_else(|| Error::InvalidScope { expression: expression.to_string() })
    }

    /// Run one expression of `kind` against this scope.
    pub fn query(&self, kind: SelectorKind, expression: &str) -> Result<Vec<String>> {
        Ok(CompiledQuery::compile(kind, expression)?.evaluate(self))
    }

    /// Serialized HTML of the scope element.
    pub fn html(&self) -> String {
        self.element.html()
    }

    /// Concatenated text of the scope element and its descendants.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }
}

/// "Evaluate an expression against the current scope" contract.
pub trait Query: Sized {
    const KIND: SelectorKind;

    fn compile(expression: &str) -> Result<Self>;

    /// Matches in document order; an empty vector when nothing matched.
    fn evaluate(&self, scope: &Scope<'_>) -> Vec<String>;
}

/// A compiled rule for one of the supported selector kinds.
#[derive(Debug, Clone)]
pub enum CompiledQuery {
    Css(CssQuery),
    XPath(XPathQuery),
}

impl CompiledQuery {
    pub fn compile(kind: SelectorKind, expression: &str) -> Result<Self> {
        match kind {
            SelectorKind::Css => CssQuery::compile(expression).map(CompiledQuery::Css),
            SelectorKind::XPath => XPathQuery::compile(expression).map(CompiledQuery::XPath),
        }
    }

    pub fn kind(&self) -> SelectorKind {
        match self {
            CompiledQuery::Css(_) => CssQuery::KIND,
            CompiledQuery::XPath(_) => XPathQuery::KIND,
        }
    }

    pub fn evaluate(&self, scope: &Scope<'_>) -> Vec<String> {
        match self {
            CompiledQuery::Css(query) => query.evaluate(scope),
            CompiledQuery::XPath(query) => query.evaluate(scope),
        }
    }
}
