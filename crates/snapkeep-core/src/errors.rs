use thiserror::Error;

/// Result type alias using SnapkeepError
pub type Result<T> = std::result::Result<T, SnapkeepError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in log events, the run report
/// and CLI output. Only `ConfigUnreadable` and `ConfigParse` abort a run;
/// every other kind is scoped to the dataset or target that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    InvalidPolicySpec,
    InvalidInput,
    ConfigUnreadable,
    ConfigParse,

    // Collaborator (storage tool)
    Collaborator,
    DatasetMissing,

    // Integration/IO
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidPolicySpec => "ERR_INVALID_POLICY_SPEC",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ConfigUnreadable => "ERR_CONFIG_UNREADABLE",
            ExErrorKind::ConfigParse => "ERR_CONFIG_PARSE",
            ExErrorKind::Collaborator => "ERR_COLLABORATOR",
            ExErrorKind::DatasetMissing => "ERR_DATASET_MISSING",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind aborts the whole run rather than a single item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExErrorKind::ConfigUnreadable | ExErrorKind::ConfigParse
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification plus whatever context the failing call site
/// knows about: the operation, the dataset, the target and the snapshot.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    dataset: Option<String>,
    target: Option<String>,
    snapshot: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            dataset: None,
            target: None,
            snapshot: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add dataset context
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Add target dataset context
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Add snapshot name context
    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the dataset context, if any
    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// Get the target context, if any
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Get the snapshot context, if any
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(dataset) = &self.dataset {
            write!(f, " (dataset: {})", dataset)?;
        }
        if let Some(target) = &self.target {
            write!(f, " (target: {})", target)?;
        }
        if let Some(snapshot) = &self.snapshot {
            write!(f, " (snapshot: {})", snapshot)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for snapkeep decisions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapkeepError {
    /// A retention or period-offset setting has the wrong shape or range
    #[error("Invalid policy spec for {field}: {reason}")]
    InvalidPolicySpec { field: String, reason: String },

    /// The snapshot timestamp format cannot round-trip a minute-precision instant
    #[error("Invalid timestamp format '{format}': {reason}")]
    InvalidTimestampFormat { format: String, reason: String },

    /// A dataset path cannot be used to build snapshot names
    #[error("Invalid dataset path '{path}': {reason}")]
    InvalidDatasetPath { path: String, reason: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SnapkeepError {
    pub(crate) fn policy(field: &str, reason: impl Into<String>) -> Self {
        SnapkeepError::InvalidPolicySpec {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Conversion from SnapkeepError to ExError
impl From<SnapkeepError> for ExError {
    fn from(err: SnapkeepError) -> Self {
        match err {
            SnapkeepError::InvalidPolicySpec { field, reason } => {
                ExError::new(ExErrorKind::InvalidPolicySpec)
                    .with_op("normalize_policy")
                    .with_message(format!("{}: {}", field, reason))
            }
            SnapkeepError::InvalidTimestampFormat { format, reason } => {
                ExError::new(ExErrorKind::InvalidPolicySpec)
                    .with_op("validate_timestamp_format")
                    .with_message(format!("timestamp_format '{}': {}", format, reason))
            }
            SnapkeepError::InvalidDatasetPath { path, reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("validate_dataset_path")
                    .with_dataset(path)
                    .with_message(reason)
            }
            SnapkeepError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}
