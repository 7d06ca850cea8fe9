//! Residue masses and the rule syntax used to configure protein graph construction

pub mod errors;
mod mass;
pub mod mass_table;
pub mod rules;

// Standard Library Imports
use std::num::NonZeroU64;

// External Crate Imports
use derive_more::{Add, AddAssign, Display, From, Into, Neg, Sub, Sum};
use rust_decimal::Decimal;
use serde::Serialize;

pub use errors::{ConfigError, Result};
pub use mass_table::MassTable;
pub use rules::{Enzyme, ModificationCode, ModificationRules, ReplacementRule, Terminus};

// NOTE: Masses are fixed-point `Decimal`s all the way through. Graph passes only ever add them together, so there is
// never any floating-point drift between two paths that sum the same residues in a different order
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    Display,
    Serialize,
    Add,
    AddAssign,
    Sub,
    Neg,
    Sum,
    From,
    Into,
)]
pub struct Mass(Decimal);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum MassKind {
    Monoisotopic,
    Average,
}

/// How tabulated and configured masses are represented once loaded
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum MassScale {
    /// Masses are kept as exact decimals
    #[default]
    Exact,
    /// Masses are multiplied by the factor and rounded to whole numbers
    Integral(NonZeroU64),
}
