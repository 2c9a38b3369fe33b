use std::fmt;

use crate::error::{CalcError, CalcResult};

/// A unit tag attached to a stack entry.
///
/// This crate treats units as a consumed-only interface: it knows how to
/// carry a tag through arithmetic, check two tags for compatibility, and
/// convert a value between compatible tags, but it does not ship a table
/// of concrete units (`m`, `kg`, `degF`, ...) — that table is an external
/// collaborator, analogous to the way the function registry treats the
/// bulk of the builtin function library as external.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Unit(String);

impl Unit {
    pub fn new(name: impl Into<String>) -> Unit {
        Unit(name.into())
    }

    pub fn none() -> Unit {
        Unit(String::new())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Units are compatible for `+`/`-`/comparison if they name the same
    /// dimension. Without a concrete unit table this crate can only
    /// recognize the trivial case: identical tags, or either side
    /// untagged.
    pub fn compat(&self, other: &Unit) -> bool {
        self.is_none() || other.is_none() || self.0 == other.0
    }

    pub fn mul(&self, other: &Unit) -> Unit {
        if self.is_none() {
            other.clone()
        } else if other.is_none() {
            self.clone()
        } else {
            Unit(format!("{}*{}", self.0, other.0))
        }
    }

    pub fn div(&self, other: &Unit) -> Unit {
        if other.is_none() {
            self.clone()
        } else if self.is_none() {
            Unit(format!("1/{}", other.0))
        } else {
            Unit(format!("{}/{}", self.0, other.0))
        }
    }

    pub fn pow(&self, exponent: i32) -> Unit {
        if self.is_none() {
            Unit::none()
        } else {
            Unit(format!("{}^{}", self.0, exponent))
        }
    }

    /// Converts a bare numeric value between two compatible unit tags.
    /// Without a concrete conversion table this can only validate
    /// compatibility and pass identical/untagged values through.
    pub fn convert(&self, target: &Unit) -> CalcResult<f64> {
        if self.compat(target) {
            Ok(1.0)
        } else {
            Err(CalcError::UnitsMismatch(format!("cannot convert {} to {}", self, target)))
        }
    }

    /// Temperature units (`degC`, `degF`, `degK`, ...) need an additive
    /// offset rather than a pure scale factor on conversion; this flags
    /// that case for the external unit table to special-case.
    pub fn is_temperature(&self) -> bool {
        self.0.starts_with("deg")
    }

    pub fn are_temp_units(a: &Unit, b: &Unit) -> bool {
        a.is_temperature() && b.is_temperature()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            Ok(())
        } else {
            write!(f, "_{}", self.0)
        }
    }
}

impl Default for Unit {
    fn default() -> Unit {
        Unit::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_is_compatible_with_anything() {
        assert!(Unit::none().compat(&Unit::new("m")));
        assert!(Unit::new("m").compat(&Unit::none()));
    }

    #[test]
    fn mismatched_tags_are_incompatible() {
        assert!(!Unit::new("m").compat(&Unit::new("kg")));
    }

    #[test]
    fn mul_combines_tags() {
        assert_eq!(Unit::new("m").mul(&Unit::new("s")).name(), "m*s");
    }
}
