use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UndefinedVariable,
    InvalidQuantifier,
    AmbiguousExpression,
    TypeMismatch,
}

impl DiagnosticKind {
    /// 警告级诊断只让本语句没有结果；其余的是本语句的硬错误
    pub fn is_warning(self) -> bool {
        matches!(self, DiagnosticKind::UndefinedVariable | DiagnosticKind::InvalidQuantifier)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SemanticDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// 加全括号后的建议写法（仅歧义诊断）
    pub suggested_rewrite: Option<String>,
}

impl SemanticDiagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggested_rewrite: None,
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            DiagnosticKind::UndefinedVariable,
            format!("Undefined variable '{}'", name),
        )
    }

    pub fn ambiguous(suggestion: String) -> Self {
        Self {
            kind: DiagnosticKind::AmbiguousExpression,
            message: format!(
                "Ambiguous expression detected. Please use parentheses to clarify. Suggested: {}",
                suggestion
            ),
            suggested_rewrite: Some(suggestion),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.kind.is_warning()
    }
}
