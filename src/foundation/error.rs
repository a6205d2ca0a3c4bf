use crate::record::validate::ValidationIssue;

/// Convenience result type used across easel.
pub type EaselResult<T> = Result<T, EaselError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum EaselError {
    /// A transform inverse was requested but the determinant is (numerically) zero.
    #[error("singular transform: determinant {determinant:e} is too close to zero")]
    SingularTransform {
        /// Determinant `a*d - b*c` of the offending transform.
        determinant: f64,
    },

    /// A viewport was asked to hold more than its three fixed scenes.
    #[error("too many scenes: {0}")]
    TooManyScenes(String),

    /// A scene or surface was attached while it already belongs to another container.
    #[error("already owned: {0}")]
    AlreadyOwned(String),

    /// Reconstruction met a child record of the wrong node kind.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A pixel buffer length does not match its channel layout.
    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),

    /// Invalid user-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Several problems found while rebuilding nodes from a record, each still typed.
    #[error("{}", join_issues(.0))]
    InvalidRecord(Vec<ValidationIssue>),

    /// Errors while encoding pixels into an export format.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing records.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    let mut out = format!("{} record issues:", issues.len());
    for issue in issues {
        out.push_str("\n");
        out.push_str(&issue.to_string());
    }
    out
}

impl EaselError {
    /// Build a [`EaselError::TooManyScenes`] value.
    pub fn too_many_scenes(msg: impl Into<String>) -> Self {
        Self::TooManyScenes(msg.into())
    }

    /// Build a [`EaselError::AlreadyOwned`] value.
    pub fn already_owned(msg: impl Into<String>) -> Self {
        Self::AlreadyOwned(msg.into())
    }

    /// Build a [`EaselError::TypeMismatch`] value.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Build a [`EaselError::MalformedBuffer`] value.
    pub fn malformed_buffer(msg: impl Into<String>) -> Self {
        Self::MalformedBuffer(msg.into())
    }

    /// Build a [`EaselError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`EaselError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`EaselError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
