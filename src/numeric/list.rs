use std::fmt;

use crate::error::CalcResult;
use crate::numeric::atom::NumericAtom;
use crate::numeric::ops::{self, BinOp};

/// An ordered, homogeneous-by-convention sequence of numeric atoms,
/// entered as a brace-delimited literal (`{ 1 2 3 }`) and consumed
/// elementwise by the arithmetic operators.
#[derive(Clone, Debug)]
pub struct CalcList {
    pub items: Vec<NumericAtom>,
}

impl CalcList {
    pub fn new(items: Vec<NumericAtom>) -> CalcList {
        CalcList { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elementwise binary op against another list of the same length, or
    /// broadcast a scalar across every element.
    pub fn broadcast(&self, op: BinOp, other: &NumericAtom, prec_bits: u32) -> CalcResult<CalcList> {
        let mut out = Vec::with_capacity(self.items.len());
        for item in &self.items {
            out.push(ops::binary_op(op, item, other, prec_bits)?);
        }
        Ok(CalcList::new(out))
    }

    pub fn zip_with(&self, op: BinOp, other: &CalcList, prec_bits: u32) -> CalcResult<CalcList> {
        if self.items.len() != other.items.len() {
            return Err(crate::error::CalcError::Domain(format!(
                "list length mismatch: {} vs {}",
                self.items.len(),
                other.items.len()
            )));
        }
        let mut out = Vec::with_capacity(self.items.len());
        for (a, b) in self.items.iter().zip(other.items.iter()) {
            out.push(ops::binary_op(op, a, b, prec_bits)?);
        }
        Ok(CalcList::new(out))
    }
}

impl fmt::Display for CalcList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for item in &self.items {
            write!(f, "{item} ")?;
        }
        write!(f, "}}")
    }
}

impl PartialEq for CalcList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}
