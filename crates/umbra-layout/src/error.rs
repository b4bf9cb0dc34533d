use thiserror::Error;

/// Failure to parse or lay out a type.
///
/// Layouts are computed once at setup time, so every variant is fatal to the
/// operation that produced it. Nothing is ever defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Source text does not follow the type / struct grammar.
    #[error("layout syntax error at {line}:{col}: {message}")]
    Syntax {
        message: String,
        /// 1-based source line number where the error occurred.
        line: usize,
        /// 1-based source column number where the error occurred.
        col: usize,
    },

    /// A template type (`vec3`, `array`, ...) was used with bad parameters.
    #[error("invalid type `{ty}` at {line}:{col}: {reason}")]
    InvalidType {
        ty: String,
        reason: String,
        /// 1-based position where the type begins; 0 until the parser places it.
        line: usize,
        col: usize,
    },

    /// Size or offset arithmetic does not fit in 32 bits.
    #[error("layout of `{ty}` exceeds the 32-bit size range")]
    SizeOverflow { ty: String },

    /// A named type that is neither built in nor present in the registry.
    #[error("unknown struct `{name}`")]
    UnknownStruct { name: String },

    /// A struct that (transitively) contains itself.
    #[error("struct `{name}` contains itself (path: {path})")]
    RecursiveStruct { name: String, path: String },

    /// `array<T>` has no fixed size and cannot be placed inside a sized layout.
    #[error("runtime-sized array `{ty}` has no fixed layout")]
    RuntimeSizedArray { ty: String },

    /// `@size` / `@align` override rejected.
    #[error("invalid override on `{field}`: {reason}")]
    InvalidOverride { field: String, reason: String },

    #[error("struct `{name}` has no fields")]
    EmptyStruct { name: String },

    #[error("duplicate field `{field}` in struct `{name}`")]
    DuplicateField { name: String, field: String },

    #[error("struct `{name}` is declared more than once")]
    DuplicateStruct { name: String },
}

impl LayoutError {
    pub(crate) fn syntax(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self::Syntax { message: msg.into(), line, col }
    }

    pub(crate) fn invalid_type(ty: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidType { ty: ty.into(), reason: reason.into(), line: 0, col: 0 }
    }
}
