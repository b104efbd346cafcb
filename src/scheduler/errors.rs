//! Error taxonomy shared by every scheduler component.
//!
//! Mirrors the severity-first design of `crawl_events::errors::EventBusError`
//! in spirit: one `thiserror` enum of causes, each tagged with the severity
//! that the scheduler's propagation rules (never the stage itself) act on.

/// How the scheduler reacts to a [`ClassifiedError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Breaks the run loop. Final stats are still recorded.
    Fatal,
    /// `totalErrors` increments by one; the current page is abandoned.
    Recoverable,
}

/// The specific cause of a `ClassifiedError`, one variant per row of the
/// cause table. Each cause knows its own default severity via
/// [`Cause::default_severity`], but callers that need a different mapping
/// for the same cause in context (e.g. `ConversionFailure` marked
/// non-retryable) pass an explicit [`Severity`] into [`ClassifiedError::new`].
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Cause {
    #[error("configuration file missing")]
    ConfigMissing,
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),
    #[error("seed_urls is empty")]
    SeedsEmpty,

    #[error("robots.txt fetch returned 429")]
    RobotsHttpTooManyRequests,
    #[error("robots.txt fetch returned 5xx")]
    RobotsHttpServerError,
    #[error("robots.txt fetch returned unexpected status: {0}")]
    RobotsHttpUnexpectedStatus(u16),
    #[error("robots.txt transport error: {0}")]
    RobotsTransport(String),
    #[error("robots.txt parse error: {0}")]
    RobotsParse(String),

    #[error("fetch transport error: {0}")]
    FetchTransport(String),
    #[error("fetch timed out")]
    FetchTimeout,
    #[error("fetch returned non-2xx status: {0}")]
    FetchNon2xx(u16),

    #[error("extraction failed: response was not HTML")]
    ExtractionNotHtml,
    #[error("extraction failed: no content found")]
    ExtractionEmpty,

    #[error("sanitizer found an ambiguous DOM")]
    SanitizeAmbiguousDom,
    #[error("sanitizer found competing content roots")]
    SanitizeCompetingRoots,

    #[error("markdown conversion failed: {0}")]
    ConversionFailure(String),

    #[error("asset resolution failed: {0}")]
    ResolveFailure(String),

    #[error("markdown normalization failed: {0}")]
    NormalizeFailure(String),

    #[error("storage write failed: {0}")]
    StorageFailure(String),

    #[error("run cancelled")]
    Cancelled,
}

impl Cause {
    /// The severity this cause carries absent any stage-specific override.
    pub fn default_severity(&self) -> Severity {
        use Cause::*;
        match self {
            ConfigMissing | ConfigInvalid(_) | SeedsEmpty => Severity::Fatal,
            RobotsHttpTooManyRequests
            | RobotsHttpServerError
            | RobotsHttpUnexpectedStatus(_)
            | RobotsTransport(_)
            | RobotsParse(_) => Severity::Recoverable,
            FetchTransport(_) | FetchTimeout | FetchNon2xx(_) => Severity::Recoverable,
            ExtractionNotHtml | ExtractionEmpty => Severity::Recoverable,
            SanitizeAmbiguousDom | SanitizeCompetingRoots => Severity::Fatal,
            ConversionFailure(_) => Severity::Recoverable,
            ResolveFailure(_) => Severity::Recoverable,
            NormalizeFailure(_) => Severity::Recoverable,
            StorageFailure(_) => Severity::Recoverable,
            Cancelled => Severity::Fatal,
        }
    }

    /// Whether the rate-limiter's backoff should be invoked before this
    /// error is returned from the Admission Gate's robots consultation.
    pub fn triggers_backoff(&self) -> bool {
        matches!(self, Cause::RobotsHttpTooManyRequests | Cause::RobotsHttpServerError)
    }
}

/// An error that has crossed a component boundary and been tagged with a
/// severity. Never constructed with both a result and `Fatal` — callers
/// that hit a fatal condition return `Err(ClassifiedError)` instead of a
/// result tuple.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{severity:?}: {cause}")]
pub struct ClassifiedError {
    pub severity: Severity,
    pub cause: Cause,
}

impl ClassifiedError {
    pub fn new(cause: Cause, severity: Severity) -> Self {
        Self { severity, cause }
    }

    /// Construct using the cause's own default severity mapping.
    pub fn from_cause(cause: Cause) -> Self {
        let severity = cause.default_severity();
        Self { severity, cause }
    }

    pub fn fatal(cause: Cause) -> Self {
        Self::new(cause, Severity::Fatal)
    }

    pub fn recoverable(cause: Cause) -> Self {
        Self::new(cause, Severity::Recoverable)
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}
