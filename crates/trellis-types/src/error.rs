use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypesError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("unexpected `{found}` at offset {offset} in type expression `{input}`")]
    UnexpectedChar {
        input: String,
        offset: usize,
        found: char,
    },
    #[error("unexpected end of type expression `{0}`")]
    UnexpectedEof(String),
    #[error("trailing input at offset {offset} in type expression `{input}`")]
    TrailingInput { input: String, offset: usize },
    #[error("`{class}` declares {expected} type parameter(s) but {found} argument(s) were given")]
    GenericArity {
        class: String,
        expected: usize,
        found: usize,
    },
    #[error("array type `{0}` exceeds the maximum of 255 dimensions")]
    TooManyDimensions(String),
    #[error("wildcards are only allowed as type arguments or at the top level (`{0}`)")]
    MisplacedWildcard(String),
    #[error("`{class}` has no member `{member}`")]
    UnknownMember { class: String, member: String },
    #[error("method `{method}` of `{class}` has no parameter #{index}")]
    UnknownParameter {
        class: String,
        method: String,
        index: usize,
    },
}
