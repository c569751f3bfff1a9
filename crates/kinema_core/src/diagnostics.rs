//! Warning channel
//!
//! Degraded input never fails an animation. Every problem is reported here
//! and the engine carries on with a neutral value. The process-wide sink
//! defaults to [`TracingSink`]; hosts may replace it, and tests can install
//! a sink for the current thread only with [`with_warning_sink`].

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::error::KinemaError;

/// Category of a reported problem
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// Malformed number, color, ease, transform or placement
    Parse,
    /// Property unknown to the target or value rejected by it
    UnsupportedProperty,
    /// Unit could not be converted
    UnitConversion,
    /// Label missing or malformed
    UnresolvedLabel,
    /// Target lookup came back empty
    TargetNotFound,
    /// Option or configuration value ignored
    InvalidOption,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningKind::Parse => "parse",
            WarningKind::UnsupportedProperty => "unsupported-property",
            WarningKind::UnitConversion => "unit-conversion",
            WarningKind::UnresolvedLabel => "unresolved-label",
            WarningKind::TargetNotFound => "target-not-found",
            WarningKind::InvalidOption => "invalid-option",
        };
        f.write_str(name)
    }
}

/// A single diagnostic
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&KinemaError> for Warning {
    fn from(err: &KinemaError) -> Self {
        Warning::new(err.kind(), err.to_string())
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Receiver of engine diagnostics
pub trait WarningSink: Send + Sync {
    fn warn(&self, warning: &Warning);
}

/// Forwards warnings to `tracing` at WARN level
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, warning: &Warning) {
        tracing::warn!(kind = %warning.kind, "{}", warning.message);
    }
}

/// Stores every warning it receives
#[derive(Debug, Default)]
pub struct CollectingSink {
    warnings: Mutex<Vec<Warning>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the warnings received so far
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings
            .lock()
            .map(|w| w.iter().filter(|w| w.kind == kind).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().map(|w| w.is_empty()).unwrap_or(true)
    }

    pub fn clear(&self) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.clear();
        }
    }
}

impl WarningSink for CollectingSink {
    fn warn(&self, warning: &Warning) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning.clone());
        }
    }
}

/// Process-wide sink
static GLOBAL_SINK: OnceLock<RwLock<Arc<dyn WarningSink>>> = OnceLock::new();

thread_local! {
    static SCOPED_SINK: RefCell<Option<Arc<dyn WarningSink>>> = const { RefCell::new(None) };
}

fn global_sink() -> &'static RwLock<Arc<dyn WarningSink>> {
    GLOBAL_SINK.get_or_init(|| RwLock::new(Arc::new(TracingSink)))
}

/// Replace the process-wide warning sink
pub fn set_warning_sink(sink: Arc<dyn WarningSink>) {
    if let Ok(mut slot) = global_sink().write() {
        *slot = sink;
    }
}

/// Restore the default tracing sink
pub fn reset_warning_sink() {
    set_warning_sink(Arc::new(TracingSink));
}

/// Run `f` with `sink` receiving every warning raised on this thread
pub fn with_warning_sink<R>(sink: Arc<dyn WarningSink>, f: impl FnOnce() -> R) -> R {
    let previous = SCOPED_SINK.with(|slot| slot.borrow_mut().replace(sink));
    let result = f();
    SCOPED_SINK.with(|slot| *slot.borrow_mut() = previous);
    result
}

/// Report a warning on the active sink
pub fn warn(kind: WarningKind, message: impl Into<String>) {
    emit(&Warning::new(kind, message));
}

/// Report an error as a warning
pub fn report(err: &KinemaError) {
    emit(&Warning::from(err));
}

fn emit(warning: &Warning) {
    let scoped = SCOPED_SINK.with(|slot| slot.borrow().clone());
    if let Some(sink) = scoped {
        sink.warn(warning);
        return;
    }
    match global_sink().read() {
        Ok(sink) => sink.warn(warning),
        Err(_) => TracingSink.warn(warning),
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_sink_collects() {
        let sink = Arc::new(CollectingSink::new());
        with_warning_sink(sink.clone(), || {
            warn(WarningKind::Parse, "bad number");
            report(&KinemaError::TargetNotFound("#missing".into()));
        });

        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, WarningKind::Parse);
        assert_eq!(warnings[1].kind, WarningKind::TargetNotFound);
    }

    #[test]
    fn test_scoped_sink_restored() {
        let outer = Arc::new(CollectingSink::new());
        let inner = Arc::new(CollectingSink::new());
        with_warning_sink(outer.clone(), || {
            with_warning_sink(inner.clone(), || warn(WarningKind::Parse, "inner"));
            warn(WarningKind::Parse, "outer");
        });

        assert_eq!(inner.warnings().len(), 1);
        assert_eq!(outer.warnings().len(), 1);
        assert_eq!(outer.warnings()[0].message, "outer");
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::new(WarningKind::UnitConversion, "cannot convert");
        assert_eq!(w.to_string(), "[unit-conversion] cannot convert");
    }
}
