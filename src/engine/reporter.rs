use super::label::UsageLabel;
use crate::{Error, Result, SelectorKind, StatsSink};
use std::fmt;
use std::sync::Arc;

/// Turns rule outcomes into label increments on an optional stats sink.
///
/// Reporting is silently skipped when no sink is bound or when the call has
/// no field name (`get_css`/`get_xpath` style queries). Neither case is an
/// error: the loader then works as a plain extractor.
#[derive(Clone)]
pub struct UsageReporter {
    loader: &'static str,
    stats: Option<Arc<dyn StatsSink>>,
}

impl UsageReporter {
    pub fn new(loader: &'static str, stats: Option<Arc<dyn StatsSink>>) -> Self {
        Self { loader, stats }
    }

    pub fn loader(&self) -> &'static str {
        self.loader
    }

    pub fn is_enabled(&self) -> bool {
        self.stats.is_some()
    }

    /// Report one rule outcome.
    ///
    /// Returns the label that was incremented, or `None` when reporting was
    /// skipped. A sink failure is returned as [`Error::Sink`]; it is not
    /// retried.
    pub fn report<T>(
        &self,
        field: Option<&str>,
        raw: Option<&[T]>,
        position: usize,
        kind: SelectorKind,
        name: Option<&str>,
    ) -> Result<Option<UsageLabel>> {
        let Some(stats) = self.stats.as_deref() else {
            return Ok(None);
        };
        let Some(field) = field.filter(|f| !f.is_empty()) else {
            return Ok(None);
        };

        let label = UsageLabel::new(self.loader, field, kind, position, name, UsageLabel::is_missing_result(raw));
        let key = label.to_string();
        if let Err(source) = stats.increment(&key) {
            return Err(Error::Sink { label: key, source });
        }
        Ok(Some(label))
    }
}

impl fmt::Debug for UsageReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageReporter")
            .field("loader", &self.loader)
            .field("stats", &self.stats.as_ref().map(|_| "<sink>"))
            .finish()
    }
}
