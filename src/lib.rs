extern crate self as loader_upkeep;

use std::fmt;

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod loader;
mod selector;
mod stats;

pub use api::{BaseLoader, LoaderType, Options, Rules};
pub use engine::{
    Evaluation, LABEL_PREFIX, MISSING_SUFFIX, PositionTracker, RuleOutcome, RuleSetEvaluator, UsageLabel,
    UsageReporter,
};
pub use error::{Error, Result, SinkError};
pub use loader::{Item, ItemLoader};
pub use selector::{CompiledQuery, CssQuery, Document, Query, Scope, XPathQuery};
pub use stats::{MemoryStats, StatsDump, StatsSink};

// --- Selector kinds ---------------------------------------------------------

/// Query dialect a rule is written in.
///
/// The set is closed: each kind maps to one concrete [`Query`] implementation
/// (see [`CompiledQuery`]). The lowercase name is the `<kind>` segment of a
/// [`UsageLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectorKind {
    Css,
    XPath,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 2] = [SelectorKind::Css, SelectorKind::XPath];

    pub fn as_str(self) -> &'static str {
        match self {
            SelectorKind::Css => "css",
            SelectorKind::XPath => "xpath",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
