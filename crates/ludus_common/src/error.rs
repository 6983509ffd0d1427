//! Error types for Ludus.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable reason codes for access-gate denials.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DenialReason {
    /// Game is age-restricted and the learner has no birth date on file.
    /// Retryable once the profile is completed.
    AgeIncompleteProfile,
    AgeRestricted,
    SubscriptionRestricted,
}

#[derive(Error, Debug)]
pub enum LudusError {
    #[error("{message}")]
    AccessDenied {
        reason: DenialReason,
        message: String,
        /// Per-pillar game allowance, set for subscription denials.
        games_allowed: Option<u32>,
    },

    #[error("Insufficient balance: {required} coins required, {available} available")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Unknown game: {0}")]
    GameNotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LudusError {
    pub fn code(&self) -> i32 {
        match self {
            LudusError::AccessDenied { .. } => -32010,
            LudusError::InsufficientBalance { .. } => -32011,
            LudusError::GameNotFound(_) => -32012,
            LudusError::Validation(_) => -32602,
            LudusError::Io(_) => -32006,
            LudusError::Json(_) => -32700,
            LudusError::Internal(_) => -32603,
        }
    }

    /// Convenience constructor for access denials.
    pub fn denied(reason: DenialReason, message: impl Into<String>) -> Self {
        LudusError::AccessDenied {
            reason,
            message: message.into(),
            games_allowed: None,
        }
    }
}
