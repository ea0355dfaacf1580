// Mon Oct 19 2026 - Alex

use crate::structure::TypeLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error or diagnostic was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Extract,
    Build,
    Persist,
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Extract => "extract",
            Stage::Build => "build",
            Stage::Persist => "persist",
            Stage::Config => "config",
        };
        write!(f, "{}", name)
    }
}

/// Fatal errors. Anything recoverable is a [`Diagnostic`] instead.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("[{stage}] unsupported format: {detail}")]
    UnsupportedFormat { stage: Stage, detail: String },

    #[error("[{stage}] truncated input at offset 0x{offset:x}: {detail}")]
    TruncatedInput {
        stage: Stage,
        offset: u64,
        detail: String,
    },

    #[error("[build] conflicting definitions of `{name}`: {} bytes (align {}) vs {} bytes (align {})",
        .first.size, .first.align, .second.size, .second.align)]
    ConflictingDefinition {
        name: String,
        first: Box<TypeLayout>,
        second: Box<TypeLayout>,
    },

    #[error("[load] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[persist] snapshot error: {0}")]
    Snapshot(String),

    #[error("[config] invalid configuration: {0}")]
    Config(String),
}

impl AuditError {
    pub fn unsupported(stage: Stage, detail: impl Into<String>) -> Self {
        AuditError::UnsupportedFormat {
            stage,
            detail: detail.into(),
        }
    }

    pub fn truncated(stage: Stage, offset: u64, detail: impl Into<String>) -> Self {
        AuditError::TruncatedInput {
            stage,
            offset,
            detail: detail.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            AuditError::UnsupportedFormat { stage, .. } => *stage,
            AuditError::TruncatedInput { stage, .. } => *stage,
            AuditError::ConflictingDefinition { .. } => Stage::Build,
            AuditError::Io(_) => Stage::Load,
            AuditError::Snapshot(_) => Stage::Persist,
            AuditError::Config(_) => Stage::Config,
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        AuditError::Snapshot(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    MalformedRecord,
    UnresolvedType,
}

/// A recovered problem attached to otherwise successful output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn malformed(offset: u64, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::MalformedRecord,
            stage: Stage::Extract,
            offset: Some(offset),
            type_name: None,
            member: None,
            message: message.into(),
        }
    }

    pub fn unresolved(type_name: &str, member: &str, referenced: &str) -> Self {
        Self {
            kind: DiagnosticKind::UnresolvedType,
            stage: Stage::Build,
            offset: None,
            type_name: Some(type_name.to_string()),
            member: Some(member.to_string()),
            message: format!("member references undefined type `{}`", referenced),
        }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:?}", self.stage, self.kind)?;
        if let Some(offset) = self.offset {
            write!(f, " @ 0x{:x}", offset)?;
        }
        match (&self.type_name, &self.member) {
            (Some(ty), Some(member)) => write!(f, " {}::{}", ty, member)?,
            (Some(ty), None) => write!(f, " {}", ty)?,
            _ => {}
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_carry_stage() {
        let err = AuditError::truncated(Stage::Extract, 0x40, "unit length exceeds section");
        assert_eq!(err.stage(), Stage::Extract);
        assert!(err.to_string().contains("0x40"));

        let err = AuditError::unsupported(Stage::Load, "fat Mach-O");
        assert_eq!(err.stage(), Stage::Load);
        assert!(err.to_string().starts_with("[load]"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::unresolved("Outer", "inner", "Inner");
        let text = diag.to_string();
        assert!(text.contains("Outer::inner"));
        assert!(text.contains("`Inner`"));
        assert_eq!(diag.kind, DiagnosticKind::UnresolvedType);
    }
}
