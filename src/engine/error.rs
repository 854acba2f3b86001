use crate::dates::DateInterval;

/// Failures of the reservation flow. All are user-correctable: the workflow
/// keeps its previous state and shows the message inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Missing or invalid input.
    Validation(&'static str),
    /// The selected range collides with an existing reservation.
    RangeUnavailable(DateInterval),
    /// No reservation matches the selection (stale view).
    NotFound(DateInterval),
}

impl WorkflowError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::RangeUnavailable(_) => "range_unavailable",
            WorkflowError::NotFound(_) => "not_found",
        }
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowError::Validation(msg) => write!(f, "{msg}"),
            WorkflowError::RangeUnavailable(span) => write!(
                f,
                "dates {} to {} are not available",
                span.start, span.end
            ),
            WorkflowError::NotFound(span) => write!(
                f,
                "no reservation found from {} to {}",
                span.start, span.end
            ),
        }
    }
}

impl std::error::Error for WorkflowError {}
