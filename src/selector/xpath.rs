//! Compact XPath evaluator.
//!
//! Supported grammar (a location-path subset of XPath 1.0):
//!
//! ```text
//! path      := ('/' | '//')? step (('/' | '//') step)*
//! step      := '.' | '..' | 'text()' | '@' (name | '*') | (name | '*') predicate*
//! predicate := '[' integer | operand ('=' literal)? | 'contains(' operand ',' literal ')' ']'
//! operand   := '@' name | 'text()' | '.'
//! ```
//!
//! Element results serialize to HTML; text and attribute results are returned
//! verbatim. Explicit axes (`child::`), unions and functions other than
//! `contains` and `text` are rejected at compile time.

use super::{Query, Scope};
use crate::{Error, Result, SelectorKind};
use scraper::{ElementRef, Node};
use std::collections::{HashMap, HashSet};
use std::ptr;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    AnyElement,
    Text,
    Attribute(String),
    AnyAttribute,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Attribute(String),
    Text,
    StringValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// 1-based position among the step's matches for one context node.
    Index(usize),
    Exists(Operand),
    Equals(Operand, String),
    Contains(Operand, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    /// Reached through `//` rather than `/`.
    descendant: bool,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// XPath rule, e.g. `//div[@class='quote']/span[1]/text()`.
#[derive(Debug, Clone)]
pub struct XPathQuery {
    expression: String,
    absolute: bool,
    steps: Vec<Step>,
}

/// One member of a node-set.
#[derive(Debug, Clone, Copy)]
enum Hit<'d> {
    /// The document node; holds the root element.
    Document(ElementRef<'d>),
    Element(ElementRef<'d>),
    /// A text node and its content.
    Text(&'d Node, &'d str),
    /// Owner element, index among its attributes, value.
    Attribute(ElementRef<'d>, usize, &'d str),
}

impl Hit<'_> {
    fn into_value(self) -> String {
        match self {
            Hit::Document(root) | Hit::Element(root) => root.html(),
            Hit::Text(_, s) | Hit::Attribute(_, _, s) => s.to_string(),
        }
    }
}

/// Document-order index of every node under the root element.
///
/// Keys double as node identities: two hits are the same node exactly when
/// their keys are equal. Attributes sort after their owner element and
/// before its children.
struct DocumentOrder {
    index: HashMap<*const Node, usize>,
}

impl DocumentOrder {
    fn new(root: ElementRef<'_>) -> Self {
        let index = root.descendants().enumerate().map(|(at, node)| (ptr::from_ref(node.value()), at)).collect();
        Self { index }
    }

    fn position(&self, node: &Node) -> usize {
        self.index.get(&ptr::from_ref(node)).map_or(usize::MAX, |at| at + 1)
    }

    fn key(&self, hit: &Hit<'_>) -> (usize, usize) {
        match *hit {
            Hit::Document(_) => (0, 0),
            Hit::Element(element) => (self.position(node_of(element)), 0),
            Hit::Text(node, _) => (self.position(node), 0),
            Hit::Attribute(owner, slot, _) => (self.position(node_of(owner)), slot + 1),
        }
    }
}

impl XPathQuery {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether the final step selects elements (and not text or attributes).
    fn selects_elements(&self) -> bool {
        !matches!(
            self.steps.last().map(|step| &step.test),
            Some(NodeTest::Text | NodeTest::Attribute(_) | NodeTest::AnyAttribute)
        )
    }

    /// Matched elements as sub-scopes; `None` when the path ends in text or attributes.
    pub(crate) fn elements<'d>(&self, scope: &Scope<'d>) -> Option<Vec<Scope<'d>>> {
        if !self.selects_elements() {
            return None;
        }
        let scopes = self
            .select(scope)
            .into_iter()
            .filter_map(|hit| match hit {
                Hit::Document(root) | Hit::Element(root) => Some(Scope::new(root)),
                Hit::Text(..) | Hit::Attribute(..) => None,
            })
            .collect();
        Some(scopes)
    }

    /// Node-set of the path, deduplicated and in document order.
    fn select<'d>(&self, scope: &Scope<'d>) -> Vec<Hit<'d>> {
        let root = root_of(scope.element());
        let order = DocumentOrder::new(root);
        let start = if self.absolute { Hit::Document(root) } else { Hit::Element(scope.element()) };
        let mut context = vec![start];

        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next: Vec<Hit<'d>> = Vec::new();
            for hit in &context {
                let origins = if step.descendant { descendants_or_self(*hit) } else { vec![*hit] };
                for origin in origins {
                    let mut selected = apply_test(origin, &step.test);
                    for predicate in &step.predicates {
                        selected = filter(selected, predicate);
                    }
                    next.extend(selected.into_iter().filter(|candidate| seen.insert(order.key(candidate))));
                }
            }
            next.sort_by_key(|hit| order.key(hit));
            context = next;
        }
        context
    }
}

impl Query for XPathQuery {
    const KIND: SelectorKind = SelectorKind::XPath;

    fn compile(expression: &str) -> Result<Self> {
        let (absolute, steps) = PathParser::new(expression).parse()?;
        trace!(expression, steps = steps.len(), "compiled xpath query");
        Ok(Self { expression: expression.to_string(), absolute, steps })
    }

    fn evaluate(&self, scope: &Scope<'_>) -> Vec<String> {
        self.select(scope).into_iter().map(Hit::into_value).collect()
    }
}

// --- Evaluation ---------------------------------------------------------------

fn node_of(element: ElementRef<'_>) -> &Node {
    (*element).value()
}

fn root_of(element: ElementRef<'_>) -> ElementRef<'_> {
    element.ancestors().filter_map(ElementRef::wrap).last().unwrap_or(element)
}

fn child_elements(hit: Hit<'_>) -> Vec<Hit<'_>> {
    match hit {
        Hit::Document(root) => vec![Hit::Element(root)],
        Hit::Element(element) => element.children().filter_map(ElementRef::wrap).map(Hit::Element).collect(),
        Hit::Text(..) | Hit::Attribute(..) => Vec::new(),
    }
}

fn descendants_or_self(hit: Hit<'_>) -> Vec<Hit<'_>> {
    match hit {
        Hit::Document(root) => std::iter::once(hit)
            .chain(root.descendants().filter_map(ElementRef::wrap).map(Hit::Element))
            .collect(),
        Hit::Element(element) => element.descendants().filter_map(ElementRef::wrap).map(Hit::Element).collect(),
        Hit::Text(..) | Hit::Attribute(..) => vec![hit],
    }
}

fn text_children(element: ElementRef<'_>) -> impl Iterator<Item = &str> {
    element.children().filter_map(|node| node.value().as_text()).map(|t| &**t)
}

fn apply_test<'d>(hit: Hit<'d>, test: &NodeTest) -> Vec<Hit<'d>> {
    match test {
        NodeTest::Name(name) => child_elements(hit)
            .into_iter()
            .filter(|child| matches!(child, Hit::Element(e) if e.value().name().eq_ignore_ascii_case(name)))
            .collect(),
        NodeTest::AnyElement => child_elements(hit),
        NodeTest::Text => match hit {
            Hit::Element(element) => element
                .children()
                .filter_map(|child| child.value().as_text().map(|text| Hit::Text(child.value(), &**text)))
                .collect(),
            _ => Vec::new(),
        },
        NodeTest::Attribute(name) => match hit {
            Hit::Element(element) => element
                .value()
                .attrs()
                .enumerate()
                .find(|(_, (attr, _))| *attr == name.as_str())
                .map(|(slot, (_, value))| Hit::Attribute(element, slot, value))
                .into_iter()
                .collect(),
            _ => Vec::new(),
        },
        NodeTest::AnyAttribute => match hit {
            Hit::Element(element) => element
                .value()
                .attrs()
                .enumerate()
                .map(|(slot, (_, value))| Hit::Attribute(element, slot, value))
                .collect(),
            _ => Vec::new(),
        },
        NodeTest::SelfNode => vec![hit],
        NodeTest::Parent => match hit {
            Hit::Element(element) => match element.parent() {
                Some(parent) => match ElementRef::wrap(parent) {
                    Some(parent) => vec![Hit::Element(parent)],
                    None => vec![Hit::Document(element)],
                },
                None => Vec::new(),
            },
            _ => Vec::new(),
        },
    }
}

fn filter<'d>(hits: Vec<Hit<'d>>, predicate: &Predicate) -> Vec<Hit<'d>> {
    match predicate {
        Predicate::Index(index) => hits.into_iter().nth(index.saturating_sub(1)).into_iter().collect(),
        Predicate::Exists(operand) => hits.into_iter().filter(|hit| !operand_values(*hit, operand).is_empty()).collect(),
        Predicate::Equals(operand, literal) => hits
            .into_iter()
            .filter(|hit| operand_values(*hit, operand).iter().any(|value| value == literal))
            .collect(),
        Predicate::Contains(operand, literal) => hits
            .into_iter()
            .filter(|hit| operand_values(*hit, operand).iter().any(|value| value.contains(literal.as_str())))
            .collect(),
    }
}

fn operand_values(hit: Hit<'_>, operand: &Operand) -> Vec<String> {
    match (hit, operand) {
        (Hit::Element(element), Operand::Attribute(name)) => {
            element.value().attr(name).map(str::to_string).into_iter().collect()
        }
        (Hit::Element(element), Operand::Text) => text_children(element).map(str::to_string).collect(),
        (Hit::Element(element) | Hit::Document(element), Operand::StringValue) => vec![element.text().collect()],
        (Hit::Text(_, s) | Hit::Attribute(_, _, s), Operand::StringValue) => vec![s.to_string()],
        _ => Vec::new(),
    }
}

// --- Parsing ------------------------------------------------------------------

struct PathParser<'e> {
    src: &'e str,
    pos: usize,
}

impl<'e> PathParser<'e> {
    fn new(src: &'e str) -> Self {
        Self { src: src.trim(), pos: 0 }
    }

    fn parse(mut self) -> Result<(bool, Vec<Step>)> {
        if self.src.is_empty() {
            return Err(self.error("empty expression"));
        }

        let mut steps = Vec::new();
        let absolute = self.rest().starts_with('/');
        let mut descendant = self.eat_separator();
        if absolute && self.at_end() {
            if descendant {
                return Err(self.error("expected a step after '//'"));
            }
            return Ok((true, steps));
        }

        loop {
            steps.push(self.step(descendant)?);
            if self.at_end() {
                break;
            }
            if !self.rest().starts_with('/') {
                return Err(self.error("expected '/' between steps"));
            }
            descendant = self.eat_separator();
        }
        Ok((absolute, steps))
    }

    /// Consume `/` or `//`; returns true for `//`.
    fn eat_separator(&mut self) -> bool {
        if self.eat("//") {
            true
        } else {
            self.eat("/");
            false
        }
    }

    fn step(&mut self, descendant: bool) -> Result<Step> {
        let test = if self.eat("..") {
            NodeTest::Parent
        } else if self.eat(".") {
            NodeTest::SelfNode
        } else if self.eat("text()") {
            NodeTest::Text
        } else if self.eat("@") {
            if self.eat("*") { NodeTest::AnyAttribute } else { NodeTest::Attribute(self.name()?) }
        } else if self.eat("*") {
            NodeTest::AnyElement
        } else {
            let name = self.name()?;
            if self.rest().starts_with("::") {
                return Err(self.error("explicit axes are not supported"));
            }
            if self.rest().starts_with('(') {
                return Err(self.error("unsupported function"));
            }
            NodeTest::Name(name)
        };

        let mut predicates = Vec::new();
        while self.eat("[") {
            predicates.push(self.predicate()?);
            self.skip_ws();
            if !self.eat("]") {
                return Err(self.error("expected ']'"));
            }
        }
        if !predicates.is_empty() && !matches!(test, NodeTest::Name(_) | NodeTest::AnyElement) {
            return Err(self.error("predicates are only supported on element steps"));
        }
        Ok(Step { descendant, test, predicates })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        self.skip_ws();
        if let Some(index) = self.integer() {
            if index == 0 {
                return Err(self.error("positions start at 1"));
            }
            return Ok(Predicate::Index(index));
        }
        if self.eat("contains(") {
            self.skip_ws();
            let operand = self.operand()?;
            self.skip_ws();
            if !self.eat(",") {
                return Err(self.error("expected ',' in contains()"));
            }
            self.skip_ws();
            let literal = self.literal()?;
            self.skip_ws();
            if !self.eat(")") {
                return Err(self.error("expected ')' after contains()"));
            }
            return Ok(Predicate::Contains(operand, literal));
        }

        let operand = self.operand()?;
        self.skip_ws();
        if self.eat("=") {
            self.skip_ws();
            return Ok(Predicate::Equals(operand, self.literal()?));
        }
        Ok(Predicate::Exists(operand))
    }

    fn operand(&mut self) -> Result<Operand> {
        if self.eat("@") {
            Ok(Operand::Attribute(self.name()?))
        } else if self.eat("text()") {
            Ok(Operand::Text)
        } else if self.eat(".") {
            Ok(Operand::StringValue)
        } else {
            Err(self.error("expected '@name', 'text()' or '.'"))
        }
    }

    fn name(&mut self) -> Result<String> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(self.error("expected a name")),
        }
        let end = chars
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let name = rest[..end].to_string();
        self.pos += end;
        Ok(name)
    }

    fn literal(&mut self) -> Result<String> {
        let rest = self.rest();
        let Some(quote) = rest.chars().next().filter(|c| matches!(c, '\'' | '"')) else {
            return Err(self.error("expected a quoted literal"));
        };
        let Some(close) = rest[1..].find(quote) else {
            return Err(self.error("unterminated literal"));
        };
        let literal = rest[1..1 + close].to_string();
        self.pos += close + 2;
        Ok(literal)
    }

    fn integer(&mut self) -> Option<usize> {
        let rest = self.rest();
        let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        let value = rest[..end].parse().ok()?;
        self.pos += end;
        Some(value)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn rest(&self) -> &'e str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, reason: &str) -> Error {
        Error::invalid_selector(SelectorKind::XPath, self.src, format!("{reason} at offset {}", self.pos))
    }
}
