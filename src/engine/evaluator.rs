use super::label::UsageLabel;
use super::positions::PositionTracker;
use super::reporter::UsageReporter;
use crate::{CompiledQuery, Error, Result, Rules, Scope, SelectorKind};
use tracing::{debug, warn};

/// Result of evaluating exactly one rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Field the rule populates; `None` for unreported `get_*` queries.
    pub field: Option<String>,
    pub kind: SelectorKind,
    pub expression: String,
    pub position: usize,
    /// Raw matches of this rule, in document order.
    pub values: Vec<String>,
    pub name: Option<String>,
    /// Label incremented on the sink, when the outcome was reported.
    pub label: Option<UsageLabel>,
}

impl RuleOutcome {
    pub fn is_missing(&self) -> bool {
        self.values.is_empty()
    }
}

/// Flattened values bundled with the per-rule trace that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub values: Vec<String>,
    pub outcomes: Vec<RuleOutcome>,
}

/// Evaluates an ordered list of fallback rules and reports each one.
///
/// Borrowed from a loader for the duration of one call: the scope, the
/// session's position table and its reporter.
#[derive(Debug)]
pub struct RuleSetEvaluator<'a, 'd> {
    scope: Option<&'a Scope<'d>>,
    positions: &'a mut PositionTracker,
    reporter: &'a UsageReporter,
}

impl<'a, 'd> RuleSetEvaluator<'a, 'd> {
    pub fn new(scope: Option<&'a Scope<'d>>, positions: &'a mut PositionTracker, reporter: &'a UsageReporter) -> Self {
        Self { scope, positions, reporter }
    }

    /// Evaluate every rule in order and return all matches, earlier rules first.
    pub fn evaluate<'r>(
        &mut self,
        field: Option<&str>,
        kind: SelectorKind,
        rules: impl Into<Rules<'r>>,
    ) -> Result<Vec<String>> {
        Ok(self.evaluate_verbose(field, kind, rules)?.values)
    }

    /// Like [`evaluate`](Self::evaluate), also returning one [`RuleOutcome`] per rule.
    ///
    /// Fails with [`Error::MissingSelector`] before touching any rule when no
    /// scope is bound, and with [`Error::InvalidSelector`] before evaluating
    /// anything when one of the expressions does not compile. Otherwise every
    /// rule is evaluated and reported, even after an earlier rule matched.
    pub fn evaluate_verbose<'r>(
        &mut self,
        field: Option<&str>,
        kind: SelectorKind,
        rules: impl Into<Rules<'r>>,
    ) -> Result<Evaluation> {
        let scope = self.scope.ok_or_else(|| Error::MissingSelector { loader: self.reporter.loader() })?;
        let rules = rules.into();
        if rules.is_empty() {
            warn!(loader = self.reporter.loader(), field = field.unwrap_or("-"), %kind, "no rules to evaluate");
            return Ok(Evaluation::default());
        }

        let queries =
            rules.expressions().iter().map(|expr| CompiledQuery::compile(kind, expr)).collect::<Result<Vec<_>>>()?;

        let mut outcomes = Vec::with_capacity(queries.len());
        for (query, expression) in queries.iter().zip(rules.expressions()) {
            let values = query.evaluate(scope);
            let position = self.positions.next_position(field.unwrap_or_default(), kind);
            let label = self.reporter.report(field, Some(values.as_slice()), position, kind, rules.name())?;

            let reported = label.as_ref().map(ToString::to_string);
            debug!(
                loader = self.reporter.loader(),
                field = field.unwrap_or("-"),
                %kind,
                position,
                found = values.len(),
                label = reported.as_deref().unwrap_or("-"),
                "evaluated rule {expression:?}"
            );

            outcomes.push(RuleOutcome {
                field: field.map(str::to_string),
                kind,
                expression: expression.to_string(),
                position,
                values,
                name: rules.name().map(str::to_string),
                label,
            });
        }

        let values = outcomes.iter().flat_map(|outcome| outcome.values.iter().cloned()).collect();
        Ok(Evaluation { values, outcomes })
    }
}
