//! Extraction sessions.
//!
//! An [`ItemLoader`] is created per document (or per repeated block of a
//! document), fills one [`Item`] and is consumed by [`ItemLoader::load_item`].
//! It owns its position table, so positions keep counting across calls for
//! the same field and kind, and never leak between sessions. The stats sink
//! is shared by every session of a job.
//!
//! ```
//! use loader_upkeep::{Document, ItemLoader, MemoryStats, Rules};
//! use std::sync::Arc;
//!
//! loader_upkeep::loader_type!(ArticleLoader);
//!
//! let doc = Document::parse("<h2>Hello</h2>");
//! let stats = Arc::new(MemoryStats::new());
//! let mut loader = ItemLoader::<ArticleLoader>::new().with_scope(doc.root()).with_stats(stats.clone());
//!
//! loader.add_css("title", Rules::from(["h1::text", "h2::text"]))?;
//! assert_eq!(loader.load_item().get("title"), Some(&["Hello".to_string()][..]));
//! assert_eq!(stats.get_value("parser/ArticleLoader/title/css/1/missing"), Some(1));
//! assert_eq!(stats.get_value("parser/ArticleLoader/title/css/2"), Some(1));
//! # Ok::<(), loader_upkeep::Error>(())
//! ```

use crate::engine::{Evaluation, PositionTracker, RuleSetEvaluator, UsageReporter};
use crate::{BaseLoader, LoaderType, Options, Result, Rules, Scope, SelectorKind, StatsSink};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// --- Item ---------------------------------------------------------------------

/// Field values collected by a loader, in first-assignment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    fields: Vec<(String, Vec<String>)>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.iter().find(|(name, _)| name == field).map(|(_, values)| values.as_slice())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Append values to a field. Nothing is recorded for an empty batch.
    pub fn add(&mut self, field: &str, values: Vec<String>) {
        if values.is_empty() {
            return;
        }
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, existing)) => existing.extend(values),
            None => self.fields.push((field.to_string(), values)),
        }
    }

    /// Replace a field's values; an empty batch removes the field.
    pub fn replace(&mut self, field: &str, values: Vec<String>) {
        self.fields.retain(|(name, _)| name != field);
        self.add(field, values);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// --- Loader -------------------------------------------------------------------

/// One extraction session.
///
/// `L` names the loader definition; it is the `<SessionTypeName>` segment of
/// every reported label.
pub struct ItemLoader<'d, L: LoaderType = BaseLoader> {
    scope: Option<Scope<'d>>,
    positions: PositionTracker,
    reporter: UsageReporter,
    item: Item,
    _loader: PhantomData<L>,
}

impl<'d, L: LoaderType> ItemLoader<'d, L> {
    /// Loader with default [`Options`], no scope and no stats sink.
    pub fn new() -> Self {
        Self::with_options(&Options::default())
    }

    pub fn with_options(options: &Options) -> Self {
        Self {
            scope: None,
            positions: PositionTracker::new(options.start_position),
            reporter: UsageReporter::new(L::NAME, None),
            item: Item::new(),
            _loader: PhantomData,
        }
    }

    /// Bind the document scope rules are evaluated against.
    pub fn with_scope(mut self, scope: Scope<'d>) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Bind the sink usage labels are reported to.
    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.reporter = UsageReporter::new(L::NAME, Some(stats));
        self
    }

    pub fn loader_name(&self) -> &'static str {
        L::NAME
    }

    pub fn scope(&self) -> Option<&Scope<'d>> {
        self.scope.as_ref()
    }

    pub fn positions(&self) -> &PositionTracker {
        &self.positions
    }

    /// Evaluate `rules` of `kind` and report each rule under `field`.
    ///
    /// With `field == None` the rules are still evaluated but nothing is
    /// reported. See [`RuleSetEvaluator::evaluate`].
    pub fn get_selector_values<'r>(
        &mut self,
        field: Option<&str>,
        kind: SelectorKind,
        rules: impl Into<Rules<'r>>,
    ) -> Result<Vec<String>> {
        self.evaluator().evaluate(field, kind, rules)
    }

    /// Like [`get_selector_values`](Self::get_selector_values) with the per-rule trace.
    pub fn get_selector_values_verbose<'r>(
        &mut self,
        field: Option<&str>,
        kind: SelectorKind,
        rules: impl Into<Rules<'r>>,
    ) -> Result<Evaluation> {
        self.evaluator().evaluate_verbose(field, kind, rules)
    }

    fn evaluator(&mut self) -> RuleSetEvaluator<'_, 'd> {
        RuleSetEvaluator::new(self.scope.as_ref(), &mut self.positions, &self.reporter)
    }

    pub fn add_css<'r>(&mut self, field: &str, rules: impl Into<Rules<'r>>) -> Result<()> {
        let values = self.get_selector_values(Some(field), SelectorKind::Css, rules)?;
        self.item.add(field, values);
        Ok(())
    }

    pub fn replace_css<'r>(&mut self, field: &str, rules: impl Into<Rules<'r>>) -> Result<()> {
        let values = self.get_selector_values(Some(field), SelectorKind::Css, rules)?;
        self.item.replace(field, values);
        Ok(())
    }

    /// Query without assigning a field; the rules are not reported.
    pub fn get_css<'r>(&mut self, rules: impl Into<Rules<'r>>) -> Result<Vec<String>> {
        self.get_selector_values(None, SelectorKind::Css, rules)
    }

    pub fn add_xpath<'r>(&mut self, field: &str, rules: impl Into<Rules<'r>>) -> Result<()> {
        let values = self.get_selector_values(Some(field), SelectorKind::XPath, rules)?;
        self.item.add(field, values);
        Ok(())
    }

    pub fn replace_xpath<'r>(&mut self, field: &str, rules: impl Into<Rules<'r>>) -> Result<()> {
        let values = self.get_selector_values(Some(field), SelectorKind::XPath, rules)?;
        self.item.replace(field, values);
        Ok(())
    }

    /// Query without assigning a field; the rules are not reported.
    pub fn get_xpath<'r>(&mut self, rules: impl Into<Rules<'r>>) -> Result<Vec<String>> {
        self.get_selector_values(None, SelectorKind::XPath, rules)
    }

    /// Append literal values; no rule is involved so nothing is reported.
    pub fn add_value<S: Into<String>>(&mut self, field: &str, values: impl IntoIterator<Item = S>) {
        self.item.add(field, values.into_iter().map(Into::into).collect());
    }

    pub fn replace_value<S: Into<String>>(&mut self, field: &str, values: impl IntoIterator<Item = S>) {
        self.item.replace(field, values.into_iter().map(Into::into).collect());
    }

    /// Values collected so far for `field`.
    pub fn get_output_value(&self, field: &str) -> Option<&[String]> {
        self.item.get(field)
    }

    /// Finish the session and hand over the item.
    pub fn load_item(self) -> Item {
        self.item
    }
}

impl<L: LoaderType> Default for ItemLoader<'_, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: LoaderType> fmt::Debug for ItemLoader<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemLoader")
            .field("loader", &L::NAME)
            .field("scope", &self.scope.is_some())
            .field("reporter", &self.reporter)
            .field("positions", &self.positions)
            .field("item", &self.item)
            .finish()
    }
}

#[cfg(test)]
#[path = "loader/tests.rs"]
mod tests;
