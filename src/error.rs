use thiserror::Error;

/// Error kinds surfaced to the user.
///
/// Every variant here is recoverable: the driver catches it, reports it
/// through the line I/O collaborator's `err()` sink, and rolls the stack
/// back to the last snapshot. Only a panic (an internal invariant
/// violation) terminates the process.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum CalcError {
    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("{name} requires {expected} argument(s), found {found} on the stack")]
    InsufficientArgs {
        name: String,
        expected: i32,
        found: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("domain error: {0}")]
    Domain(String),

    #[error("units mismatch: {0}")]
    UnitsMismatch(String),

    #[error("units prohibited: {0}")]
    UnitsProhibited(String),

    #[error("overflow: {0}")]
    Overflow(String),

    #[error("conversion loss: {0}")]
    ConversionLoss(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("unknown function: {0}")]
    UnknownFunction(String),
}

pub type CalcResult<T> = std::result::Result<T, CalcError>;
