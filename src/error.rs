use thiserror::Error;

/// Failures raised by the scheduling pipeline.
///
/// Every failure is fatal: nothing in this crate retries, backs off, or
/// grants partial credit. The kind tells callers where in the pipeline the
/// failure originated.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A script or settings rule was violated before any work started.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The pipeline produced an impossible shape, e.g. an empty plan set.
    #[error("structural error: {0}")]
    Structural(String),

    /// A collaborator (load engine, worker spawn, alert) failed mid-run.
    #[error("execution error: {0}")]
    Execution(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Structural,
    Execution,
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::Configuration(_) => ErrorKind::Configuration,
            TaskError::Structural(_) => ErrorKind::Structural,
            TaskError::Execution(_) => ErrorKind::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            TaskError::Configuration("bad".to_string()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            TaskError::Structural("empty".to_string()).kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            TaskError::Execution("boom".to_string()).kind(),
            ErrorKind::Execution
        );
    }

    #[test]
    fn test_error_display() {
        let error = TaskError::Execution("engine exited".to_string());
        assert_eq!(error.to_string(), "execution error: engine exited");
    }
}
