//! 工具契约层错误
//!
//! 所有工具统一返回 ToolError{kind, message}；kind 决定 ReAct 循环的处理方式：
//! UpstreamUnavailable 由 ToolExecutor 退避重试，InternalFault 终止会话，其余作为 Observation 回灌给 Oracle。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collaborators::CollaboratorError;

/// 工具错误类别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// 输入不符合 Schema 或参数取值非法
    InvalidInput,
    /// 外部协作方不可达或超时（可重试）
    UpstreamUnavailable,
    /// 外部协作方返回领域错误（如未知产品 ID）
    UpstreamRejected,
    /// 内部不变量被破坏
    InternalFault,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::InvalidInput => "InvalidInput",
            ToolErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
            ToolErrorKind::UpstreamRejected => "UpstreamRejected",
            ToolErrorKind::InternalFault => "InternalFault",
        }
    }

    /// 仅瞬时故障值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolErrorKind::UpstreamUnavailable)
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidInput, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::UpstreamUnavailable, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::UpstreamRejected, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InternalFault, message)
    }
}

impl From<CollaboratorError> for ToolError {
    fn from(err: CollaboratorError) -> Self {
        let kind = match &err {
            CollaboratorError::Unavailable(_) => ToolErrorKind::UpstreamUnavailable,
            CollaboratorError::NotFound(_)
            | CollaboratorError::NoRoute { .. }
            | CollaboratorError::Rejected(_)
            | CollaboratorError::Malformed(_) => ToolErrorKind::UpstreamRejected,
            CollaboratorError::NotConfigured(_) => ToolErrorKind::UpstreamUnavailable,
        };
        ToolError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_mapping() {
        let e: ToolError = CollaboratorError::NotFound("product 42".into()).into();
        assert_eq!(e.kind, ToolErrorKind::UpstreamRejected);

        let e: ToolError = CollaboratorError::Unavailable("connection refused".into()).into();
        assert_eq!(e.kind, ToolErrorKind::UpstreamUnavailable);
        assert!(e.kind.is_retryable());

        let e: ToolError = CollaboratorError::NoRoute {
            origin: "A".into(),
            destination: "B".into(),
        }
        .into();
        assert_eq!(e.kind, ToolErrorKind::UpstreamRejected);
        assert!(!e.kind.is_retryable());
    }

    #[test]
    fn test_display_includes_kind() {
        let e = ToolError::invalid_input("forecast_days must be positive");
        assert_eq!(e.to_string(), "InvalidInput: forecast_days must be positive");
    }
}
