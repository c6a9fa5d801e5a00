use thiserror::Error;

/// Which side of a comparison an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Probe,
    Gallery,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Probe => write!(f, "probe"),
            Role::Gallery => write!(f, "gallery"),
        }
    }
}

#[derive(Error, Debug)]
pub enum NbisError {
    /// Wrong image shape or channel count, non-sequence arguments, bad parameters.
    /// Raised before any detector, matcher or quality call runs.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{} minutiae detection failed (status {status})", role_label(.role))]
    DetectionFailed { role: Option<Role>, status: i32 },

    #[error("Quality computation failed (status {status})")]
    QualityInternalError { status: i32 },

    #[error("Malformed minutia record at index {index}: field '{field}' {reason}")]
    MalformedRecord {
        index: usize,
        field: &'static str,
        reason: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn role_label(role: &Option<Role>) -> String {
    match role {
        Some(Role::Probe) => "Probe".to_string(),
        Some(Role::Gallery) => "Gallery".to_string(),
        None => "Image".to_string(),
    }
}

impl NbisError {
    /// Attach a comparison role to a detection failure; other kinds pass through.
    pub fn with_role(self, role: Role) -> Self {
        match self {
            NbisError::DetectionFailed { status, .. } => NbisError::DetectionFailed {
                role: Some(role),
                status,
            },
            other => other,
        }
    }
}

pub type NbisResult<T> = Result<T, NbisError>;
