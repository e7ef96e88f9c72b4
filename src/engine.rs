//! Usage-accounting engine.
//!
//! This module is the core of the crate: it assigns every evaluated fallback
//! rule a stable identity and forwards "did this rule produce output?" to a
//! stats sink. Selector evaluation itself is delegated to `crate::selector`.
//!
//! ## How the parts work together
//!
//! ```text
//! ItemLoader::add_css(field, rules)
//!        │
//!        v
//! RuleSetEvaluator::evaluate          (evaluator.rs)
//!   - guard: a scope must be bound
//!   - compile every rule up front
//!   - for each rule, in order:
//!        query ── PositionTracker::next_position   (positions.rs)
//!                 UsageReporter::report            (reporter.rs)
//!                   └─ UsageLabel ─> StatsSink::increment   (label.rs)
//!        │
//!        v
//! flattened values (rule order preserved)
//! ```
//!
//! Every rule is evaluated and reported even when an earlier rule already
//! produced data. A rule shadowed by a working predecessor still shows up in
//! the counters, which is what lets an operator see it is dead.
//!
//! ## Responsibilities by module
//!
//! - `positions.rs`: per-session counter table keyed by (field, kind).
//! - `label.rs`: the canonical label grammar
//!   `parser/<Loader>/<field>/<kind>/<position>[/<name>][/missing]`.
//! - `reporter.rs`: guards (no sink, no field) and sink forwarding.
//! - `evaluator.rs`: the rule loop, plus the `RuleOutcome`/`Evaluation` trace
//!   types returned by the verbose entry points.
//!
//! ## Debugging
//!
//! Every outcome is logged at `debug` level under the `loader_upkeep` target;
//! run the CLI with `UPKEEP_LOG=loader_upkeep=debug` to see them.

#[path = "engine/evaluator.rs"]
mod evaluator;
#[path = "engine/label.rs"]
mod label;
#[path = "engine/positions.rs"]
mod positions;
#[path = "engine/reporter.rs"]
mod reporter;

pub use evaluator::{Evaluation, RuleOutcome, RuleSetEvaluator};
pub use label::{LABEL_PREFIX, MISSING_SUFFIX, UsageLabel};
pub use positions::PositionTracker;
pub use reporter::UsageReporter;
