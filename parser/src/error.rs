use thiserror::Error;

use crate::Rule;

/// Everything that can go wrong turning one input line into a
/// [`smrtclcltr_core::program::Program`]: a grammar-level rejection from
/// `pest`, or a value-level failure (bad literal, unknown unit, ...)
/// surfaced while building instructions out of an otherwise
/// well-formed parse tree.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] pest::error::Error<Rule>),
    #[error(transparent)]
    Value(#[from] smrtclcltr_core::CalcError),
}

pub type Result<T> = std::result::Result<T, Error>;
