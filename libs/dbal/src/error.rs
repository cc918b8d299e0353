use std::fmt;

use crate::value::TypeTag;

/// Identifier domain of a value source. Carried by `InvalidIdentifier` so the
/// caller sees which range the id missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdDomain {
    /// 0-based positional argument index, valid range `[0, count)`.
    Argument { count: usize },
    /// 1-based field number, valid range `[1, count]`.
    Field { count: usize },
}

impl fmt::Display for IdDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdDomain::Argument { count } => write!(f, "argument index in [0, {count})"),
            IdDomain::Field { count } => write!(f, "field number in [1, {count}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DbalError {
    #[error("invalid identifier {id}: expected {domain}")]
    InvalidIdentifier { id: u32, domain: IdDomain },

    #[error("unsupported type {tag}: {context}")]
    UnsupportedType { tag: TypeTag, context: String },

    #[error("null value of type {tag} used where a value is required")]
    NullDereference { tag: TypeTag },

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("descriptor error: {0}")]
    Descriptor(String),
}

impl DbalError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        DbalError::Malformed(msg.into())
    }

    pub fn unsupported(tag: TypeTag, context: impl Into<String>) -> Self {
        DbalError::UnsupportedType {
            tag,
            context: context.into(),
        }
    }

    /// Add context to the error.
    ///
    /// Message-carrying variants get the context prepended; structured
    /// variants are returned unchanged.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            DbalError::UnsupportedType { tag, context } => DbalError::UnsupportedType {
                tag,
                context: format!("{ctx}: {context}"),
            },
            DbalError::Malformed(msg) => DbalError::Malformed(format!("{ctx}: {msg}")),
            DbalError::Descriptor(msg) => DbalError::Descriptor(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
