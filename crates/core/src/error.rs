use crate::condition::NodeId;

/// Structural edit errors. Everything else an edit can run into (missing
/// ids, leaf parents) degrades to returning the input unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The caller tried to remove the root group of a tree.
    #[error("cannot remove root group '{id}'")]
    RootRemoval { id: NodeId },
}

/// Errors produced while lexing, parsing or evaluating a condition
/// expression. The evaluator turns every one of these into `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("lex error at offset {offset}: {message}")]
    Lex { offset: usize, message: String },

    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow in '{op}'")]
    Overflow { op: String },

    #[error("type error: {message}")]
    Type { message: String },
}

impl ExprError {
    pub fn lex(offset: usize, message: impl Into<String>) -> Self {
        ExprError::Lex {
            offset,
            message: message.into(),
        }
    }

    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        ExprError::Parse {
            offset,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        ExprError::Type {
            message: message.into(),
        }
    }
}
