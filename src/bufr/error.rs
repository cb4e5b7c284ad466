// Interpreter errors.
//
// Two families matter to callers driving the per-subset loop:
//   - consistency errors: the data or the descriptor program contradicts itself
//   - unimplemented errors: well-formed input using a feature we do not handle
//
// Everything else (table lookups, input parsing, I/O) is classified separately
// so callers can tell a bad bulletin from a bad environment.

use thiserror::Error;

use super::varcode::Varcode;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Consistency,
    Unimplemented,
    NotFound,
    Parse,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    // --- consistency ---------------------------------------------------------
    #[error("data present bitmap has length 0")]
    EmptyBitmap,

    #[error("data present bitmap is anchored at start of subset")]
    BitmapAtSubsetStart,

    #[error("bitmap refers to variables before the start of the subset")]
    BitmapBeforeSubsetStart,

    #[error("found {code} with no active bitmap")]
    NoActiveBitmap { code: Varcode },

    #[error("found {code} while at the end of active bitmap")]
    BitmapExhausted { code: Varcode },

    #[error("requested variable #{pos} out of a maximum of {max} in subset {subset}")]
    VarOutOfRange { pos: usize, max: usize, subset: usize },

    #[error("requested subset #{subset} out of a maximum of {max}")]
    SubsetOutOfRange { subset: usize, max: usize },

    #[error("variable at {pos} is {code} and not a data present bitmap")]
    NotABitmap { pos: usize, code: Varcode },

    #[error("C modifier {code} not yet supported")]
    UnsupportedOperator { code: Varcode },

    #[error("input variable {found} at {pos} differs from expected variable {expected}")]
    VarMismatch {
        pos: usize,
        expected: Varcode,
        found: Varcode,
    },

    #[error("malformed descriptor program: {0}")]
    MalformedProgram(String),

    #[error("replication nested {depth} levels deep")]
    NestingTooDeep { depth: usize },

    // --- unimplemented -------------------------------------------------------
    #[error("nested C04 modifiers are not yet implemented")]
    NestedAssociatedField,

    #[error("C04 modifier wants {bits} bits but only at most 32 are supported")]
    AssociatedFieldTooWide { bits: u32 },

    #[error("C06 modifier found for {bits} bits but only at most 32 are supported")]
    LocalDescriptorTooWide { bits: u32 },

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    // --- environment ---------------------------------------------------------
    #[error("variable {0} not found in table")]
    UnknownVarcode(Varcode),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyBitmap
            | Self::BitmapAtSubsetStart
            | Self::BitmapBeforeSubsetStart
            | Self::NoActiveBitmap { .. }
            | Self::BitmapExhausted { .. }
            | Self::VarOutOfRange { .. }
            | Self::SubsetOutOfRange { .. }
            | Self::NotABitmap { .. }
            | Self::UnsupportedOperator { .. }
            | Self::VarMismatch { .. }
            | Self::MalformedProgram(_)
            | Self::NestingTooDeep { .. } => ErrorKind::Consistency,
            Self::NestedAssociatedField
            | Self::AssociatedFieldTooWide { .. }
            | Self::LocalDescriptorTooWide { .. }
            | Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::UnknownVarcode(_) => ErrorKind::NotFound,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub fn is_consistency(&self) -> bool {
        self.kind() == ErrorKind::Consistency
    }

    pub fn is_unimplemented(&self) -> bool {
        self.kind() == ErrorKind::Unimplemented
    }
}
