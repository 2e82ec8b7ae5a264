//! Error types for GdlAtlas

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed clause at top level: {0}")]
    MalformedClause(String),

    #[error("Program is not stratifiable: {unresolved} predicates left unresolved")]
    Unstratifiable { unresolved: usize },

    #[error("{what} fixpoint exceeded {limit} passes")]
    FixpointLimit { what: &'static str, limit: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, TranslationError>;

/// Recoverable conditions raised while grounding a single clause.
///
/// These never abort a translation; the session collects them so callers
/// can report which clauses were skipped and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationWarning {
    /// A substituted candidate value failed to re-parse into a term.
    RegroundFailure { clause: String, detail: String },
    /// A variable had an empty constant domain, so the clause produced
    /// no ground instances.
    EmptyDomain { clause: String, variable: String },
}

impl std::fmt::Display for TranslationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationWarning::RegroundFailure { clause, detail } => {
                write!(f, "skipped clause {}: reground failed: {}", clause, detail)
            }
            TranslationWarning::EmptyDomain { clause, variable } => {
                write!(f, "dropped clause {}: empty domain for {}", clause, variable)
            }
        }
    }
}
