// Standard Library Imports
use std::collections::{BTreeMap, btree_map::Entry};

// External Crate Imports
use knus::{
    Decode,
    span::{Span, Spanned},
};
use miette::{Diagnostic, LabeledSpan, NamedSource, Result};
use rust_decimal::Decimal;
use thiserror::Error;

// Local Crate Imports
use crate::{Mass, MassKind, MassScale};

const DEFAULT_KDL: &str = include_str!("../data/mass_table.kdl");

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MassTable {
    scale: MassScale,
    residues: BTreeMap<char, ResidueMasses>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ResidueMasses {
    pub name: String,
    pub monoisotopic: Mass,
    pub average: Mass,
}

impl MassTable {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>, scale: MassScale) -> Result<Self> {
        let parsed_table: MassTableKdl = knus::parse(file_name.as_ref(), kdl_text.as_ref())?;
        parsed_table
            .validate(scale)
            .map_err(|e| e.finalize(file_name, kdl_text).into())
    }

    pub fn with_scale(scale: MassScale) -> Self {
        // SAFETY: The embedded table is checked by the `default_table` test, so this can't fail at runtime
        Self::new("mass_table.kdl", DEFAULT_KDL, scale).unwrap()
    }

    #[must_use]
    pub const fn scale(&self) -> MassScale {
        self.scale
    }

    #[must_use]
    pub fn contains(&self, residue: char) -> bool {
        self.residues.contains_key(&residue)
    }

    #[must_use]
    pub fn residue(&self, residue: char) -> Option<&ResidueMasses> {
        self.residues.get(&residue)
    }

    #[must_use]
    pub fn mass(&self, residue: char, kind: MassKind) -> Option<Mass> {
        self.residue(residue).map(|masses| masses.mass(kind))
    }

    /// Sums the residue masses of `residues`, returning the first residue missing from the table as an error
    pub fn sequence_mass(&self, residues: &str, kind: MassKind) -> Result<Mass, char> {
        residues
            .chars()
            .map(|residue| self.mass(residue, kind).ok_or(residue))
            .sum()
    }

    /// Converts a configured mass offset (like a modification delta) into this table's representation
    #[must_use]
    pub fn delta(&self, value: Decimal) -> Mass {
        self.scale.apply(value)
    }
}

impl Default for MassTable {
    fn default() -> Self {
        Self::with_scale(MassScale::default())
    }
}

impl ResidueMasses {
    #[must_use]
    pub const fn mass(&self, kind: MassKind) -> Mass {
        match kind {
            MassKind::Monoisotopic => self.monoisotopic,
            MassKind::Average => self.average,
        }
    }
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct MassTableKdl {
    #[knus(child, unwrap(children))]
    residues: Vec<ResidueKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct ResidueKdl {
    #[knus(span)]
    span: Span,
    #[knus(argument)]
    code: Spanned<String, Span>,
    #[knus(argument)]
    name: String,
    #[knus(property(name = "mono"))]
    monoisotopic: MassKdl,
    #[knus(property(name = "average"))]
    average: MassKdl,
}

// NOTE: Masses are written as strings so that they are read as exact decimals, and never pass through an `f64`
type MassKdl = Spanned<String, Span>;

// Mass Table Validation ===============================================================================================

type TableResult<T> = std::result::Result<T, MassTableErrorKind>;

impl MassTableKdl {
    fn validate(self, scale: MassScale) -> TableResult<MassTable> {
        let mut residues = BTreeMap::new();
        let mut first_defined = BTreeMap::new();

        for residue in self.residues {
            let (code, span, masses) = residue.validate(scale)?;
            match residues.entry(code) {
                Entry::Occupied(_) => {
                    return Err(MassTableErrorKind::DuplicateResidue(
                        first_defined[&code],
                        span,
                        code,
                    ));
                }
                Entry::Vacant(e) => {
                    first_defined.insert(code, span);
                    e.insert(masses);
                }
            }
        }

        Ok(MassTable { scale, residues })
    }
}

impl ResidueKdl {
    fn validate(self, scale: MassScale) -> TableResult<(char, Span, ResidueMasses)> {
        let code_span = *self.code.span();
        let mut chars = self.code.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => c,
            _ => return Err(MassTableErrorKind::InvalidCode(code_span, (*self.code).clone())),
        };

        let masses = ResidueMasses {
            name: self.name,
            monoisotopic: validate_mass(&self.monoisotopic, scale)?,
            average: validate_mass(&self.average, scale)?,
        };

        Ok((code, self.span, masses))
    }
}

fn validate_mass(mass: &MassKdl, scale: MassScale) -> TableResult<Mass> {
    Decimal::from_str_exact(mass.trim())
        .map(|value| scale.apply(value))
        .map_err(|_| MassTableErrorKind::InvalidMass(*mass.span(), (**mass).clone()))
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate mass table file")]
struct MassTableError {
    kdl: NamedSource<String>,
    #[source]
    kind: MassTableErrorKind,
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for MassTableError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
enum MassTableErrorKind {
    #[error("the residue {2:?} has already been defined")]
    #[diagnostic(help("remove one of the duplicate residue definitions"))]
    DuplicateResidue(Span, Span, char),

    #[error("residue codes must be a single uppercase letter, but found {1:?}")]
    #[diagnostic(help("use the one-letter IUPAC code for this residue"))]
    InvalidCode(Span, String),

    #[error("could not read {1:?} as a decimal mass")]
    #[diagnostic(help("masses must be written as decimal strings, like \"71.037114\""))]
    InvalidMass(Span, String),
}

impl MassTableErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateResidue(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::InvalidCode(s, _) => vec![(s, "invalid residue code")],
            Self::InvalidMass(s, _) => vec![(s, "invalid mass")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> MassTableError {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        MassTableError { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_table() {
        let table = MassTable::default();
        assert_eq!(table.scale(), MassScale::Exact);
        for residue in "ACDEFGHIKLMNPQRSTVWYUOBZJX".chars() {
            assert!(table.contains(residue), "missing residue {residue}");
        }
        assert!(!table.contains('-'));
        assert_eq!(
            table.mass('A', MassKind::Monoisotopic),
            Some(Mass(dec!(71.037114)))
        );
        assert_eq!(table.mass('W', MassKind::Average), Some(Mass(dec!(186.2099))));
        assert_eq!(table.mass('X', MassKind::Monoisotopic), Some(Mass::ZERO));
        assert_eq!(table.residue('K').unwrap().name, "Lysine");
    }

    #[test]
    fn sequence_masses() {
        let table = MassTable::default();
        assert_eq!(
            table.sequence_mass("MAK", MassKind::Monoisotopic),
            Ok(Mass(dec!(330.172562)))
        );
        assert_eq!(table.sequence_mass("", MassKind::Average), Ok(Mass::ZERO));
        assert_eq!(table.sequence_mass("MA7K", MassKind::Monoisotopic), Err('7'));
    }

    #[test]
    fn integral_table() {
        let table = MassTable::with_scale(MassScale::integral(1_000).unwrap());
        assert_eq!(table.mass('G', MassKind::Monoisotopic), Some(Mass(dec!(57021))));
        assert_eq!(table.mass('G', MassKind::Average), Some(Mass(dec!(57051))));
        assert_eq!(table.delta(dec!(15.994915)), Mass(dec!(15995)));
    }

    fn parse_table(kdl: &str) -> Result<MassTable> {
        MassTable::new("test.kdl", kdl, MassScale::Exact)
    }

    #[test]
    fn custom_table() {
        let kdl = indoc! {r#"
            residues {
                residue "G" "Glycine" mono="57.021464" average="57.0513"
                residue "X" "Unknown" mono="110" average="110"
            }
        "#};
        let table = parse_table(kdl).unwrap();
        assert!(!table.contains('A'));
        assert_eq!(table.mass('X', MassKind::Average), Some(Mass(dec!(110))));
    }

    #[test]
    fn duplicate_residue() {
        let kdl = indoc! {r#"
            residues {
                residue "G" "Glycine" mono="57.021464" average="57.0513"
                residue "G" "Glycine Again" mono="57" average="57"
            }
        "#};
        let error = parse_table(kdl).unwrap_err();
        assert_snapshot!(error, @"failed to validate mass table file");
        let cause = error.diagnostic_source().unwrap().to_string();
        assert_snapshot!(cause, @r#"the residue 'G' has already been defined"#);
    }

    #[test]
    fn invalid_residues() {
        let multiple_letters = indoc! {r#"
            residues {
                residue "Gly" "Glycine" mono="57.021464" average="57.0513"
            }
        "#};
        let error = parse_table(multiple_letters).unwrap_err();
        let cause = error.diagnostic_source().unwrap().to_string();
        assert_snapshot!(cause, @r#"residue codes must be a single uppercase letter, but found "Gly""#);

        let bad_mass = indoc! {r#"
            residues {
                residue "G" "Glycine" mono="57.02.1464" average="57.0513"
            }
        "#};
        let error = parse_table(bad_mass).unwrap_err();
        let cause = error.diagnostic_source().unwrap().to_string();
        assert_snapshot!(cause, @r#"could not read "57.02.1464" as a decimal mass"#);
    }
}
