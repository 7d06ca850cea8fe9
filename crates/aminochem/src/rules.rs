//! Parsers for the rule syntax used to configure graph construction

// Standard Library Imports
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

// External Crate Imports
use itertools::Itertools;
use nom::{
    Finish, IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of, satisfy, space0},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    error::{VerboseError, VerboseErrorKind, context},
    multi::separated_list1,
    sequence::{delimited, pair, separated_pair, terminated, tuple},
};
use rust_decimal::Decimal;

// Local Crate Imports
use crate::{ConfigError, MassTable, Result};

// Public API ==========================================================================================================

/// Replaces every occurrence of one residue with each of several alternatives: `J->I,L`
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ReplacementRule {
    pub source: char,
    pub targets: Vec<char>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Terminus {
    N,
    C,
}

// NOTE: The variant order matters! Rules are applied in this order, and the terminus rules rewire the sentinel edges
// that the residue-level rules use to find terminal residues
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ModificationCode {
    /// Any occurrence of a residue: `M`
    Residue(char),
    /// A residue, but only when it starts or ends a peptide: `NPEPQ`
    PeptideTerminalResidue(Terminus, char),
    /// A residue, but only when it starts or ends the protein: `NPROM`
    ProteinTerminalResidue(Terminus, char),
    /// The N- or C-terminus of the protein itself: `NPROTERM` / `CPROTERM`
    ProteinTerminus(Terminus),
    /// The N- or C-terminus of any peptide: `NPEPTERM` / `CPEPTERM`
    PeptideTerminus(Terminus),
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ModificationRules {
    fixed: BTreeMap<ModificationCode, Decimal>,
    variable: BTreeMap<ModificationCode, Vec<Decimal>>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Enzyme {
    Skip,
    Trypsin,
    GluC,
    Full,
}

impl ReplacementRule {
    pub fn parse(rule: impl AsRef<str>, table: &MassTable) -> Result<Self> {
        let rule = rule.as_ref();
        let (source, targets) = final_parser(
            "amino-acid replacement rule",
            "replacement rules look like J->I,L",
            replacement,
        )(rule)?;

        if let Some(&residue) = targets.iter().find(|&&t| !table.contains(t)) {
            return Err(ConfigError::UnknownResidue {
                kind: "replacement rule",
                residue,
            });
        }

        Ok(Self { source, targets })
    }
}

impl ModificationCode {
    #[must_use]
    pub const fn residue(self) -> Option<char> {
        match self {
            Self::Residue(r)
            | Self::PeptideTerminalResidue(_, r)
            | Self::ProteinTerminalResidue(_, r) => Some(r),
            Self::PeptideTerminus(_) | Self::ProteinTerminus(_) => None,
        }
    }
}

impl ModificationRules {
    pub fn parse(
        fixed: &[impl AsRef<str>],
        variable: &[impl AsRef<str>],
        table: &MassTable,
    ) -> Result<Self> {
        let mut rules = Self::default();

        for rule in fixed {
            let (code, delta) = final_parser(
                "fixed modification rule",
                "fixed modification rules look like C:57.021464 or NPEPTERM:42.010565",
                fixed_modification,
            )(rule.as_ref())?;
            Self::check_residue(code, "fixed modification", table)?;
            if rules.fixed.insert(code, delta).is_some() {
                return Err(ConfigError::DuplicateFixedModification(code.to_string()));
            }
        }

        for rule in variable {
            let (code, deltas) = final_parser(
                "variable modification rule",
                "variable modification rules look like M:15.994915 or S:79.966331,-18.010565",
                variable_modification,
            )(rule.as_ref())?;
            Self::check_residue(code, "variable modification", table)?;
            rules.variable.entry(code).or_default().extend(deltas);
        }

        Ok(rules)
    }

    pub fn fixed(&self) -> impl Iterator<Item = (ModificationCode, Decimal)> + '_ {
        self.fixed.iter().map(|(&code, &delta)| (code, delta))
    }

    pub fn variable(&self) -> impl Iterator<Item = (ModificationCode, &[Decimal])> + '_ {
        self.variable
            .iter()
            .map(|(&code, deltas)| (code, deltas.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.variable.is_empty()
    }

    fn check_residue(code: ModificationCode, kind: &'static str, table: &MassTable) -> Result<()> {
        match code.residue() {
            Some(residue) if !table.contains(residue) => {
                Err(ConfigError::UnknownResidue { kind, residue })
            }
            _ => Ok(()),
        }
    }
}

impl FromStr for Enzyme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "trypsin" => Ok(Self::Trypsin),
            "gluc" | "glu_c" | "glu-c" => Ok(Self::GluC),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::UnknownEnzyme(s.to_owned())),
        }
    }
}

// Display Trait Implementations =======================================================================================

impl Display for Terminus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::N => write!(f, "N"),
            Self::C => write!(f, "C"),
        }
    }
}

impl Display for ModificationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Residue(r) => write!(f, "{r}"),
            Self::PeptideTerminus(t) => write!(f, "{t}PEPTERM"),
            Self::ProteinTerminus(t) => write!(f, "{t}PROTERM"),
            Self::PeptideTerminalResidue(t, r) => write!(f, "{t}PEP{r}"),
            Self::ProteinTerminalResidue(t, r) => write!(f, "{t}PRO{r}"),
        }
    }
}

impl Display for ReplacementRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.targets.iter().join(","))
    }
}

impl Display for Enzyme {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Skip => "skip",
            Self::Trypsin => "trypsin",
            Self::GluC => "gluc",
            Self::Full => "full",
        };
        write!(f, "{name}")
    }
}

// Private Parsers =====================================================================================================

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

fn final_parser<'a, O>(
    kind: &'static str,
    help: &'static str,
    mut parser: impl FnMut(&'a str) -> ParseResult<'a, O>,
) -> impl FnMut(&'a str) -> Result<O> {
    move |input| {
        all_consuming(&mut parser)(input)
            .finish()
            .map(|(_, output)| output)
            .map_err(|e| {
                // NOTE: `VerboseError` lists errors innermost-first, so the first context is the most specific one
                let (remaining, expected) = e
                    .errors
                    .iter()
                    .find_map(|(i, k)| match k {
                        VerboseErrorKind::Context(c) => Some((*i, *c)),
                        _ => None,
                    })
                    .or_else(|| e.errors.first().map(|&(i, _)| (i, "unexpected input")))
                    .unwrap_or((input, "unexpected input"));
                let offset = input.len() - remaining.len();
                ConfigError::malformed_rule(kind, help, input, offset, expected)
            })
    }
}

/// Residue = uppercase ;
fn residue(i: &str) -> ParseResult<char> {
    context(
        "expected an uppercase residue code",
        satisfy(|c| c.is_ascii_uppercase()),
    )(i)
}

/// Replacement = Residue , "->" , Residue , { "," , Residue } ;
fn replacement(i: &str) -> ParseResult<(char, Vec<char>)> {
    let arrow = context("expected '->'", delimited(space0, tag("->"), space0));
    let comma = delimited(space0, char(','), space0);
    map(
        tuple((residue, arrow, separated_list1(comma, residue))),
        |(source, _, targets)| (source, targets),
    )(i)
}

/// Terminus = "N" | "C" ;
fn terminus(i: &str) -> ParseResult<Terminus> {
    alt((value(Terminus::N, char('N')), value(Terminus::C, char('C'))))(i)
}

/// Modification Code = Terminus , "PEPTERM" | Terminus , "PROTERM"
///   | Terminus , "PEP" , Residue | Terminus , "PRO" , Residue
///   | Residue ;
fn modification_code(i: &str) -> ParseResult<ModificationCode> {
    use ModificationCode as M;

    let parser = alt((
        map(terminated(terminus, tag("PEPTERM")), M::PeptideTerminus),
        map(terminated(terminus, tag("PROTERM")), M::ProteinTerminus),
        map(pair(terminated(terminus, tag("PEP")), residue), |(t, r)| {
            M::PeptideTerminalResidue(t, r)
        }),
        map(pair(terminated(terminus, tag("PRO")), residue), |(t, r)| {
            M::ProteinTerminalResidue(t, r)
        }),
        map(residue, M::Residue),
    ));
    context(
        "expected a residue, or a terminus like NPEPTERM or CPROK",
        parser,
    )(i)
}

/// Delta = [ "+" | "-" ] , digit , { digit } , [ "." , digit , { digit } ] ;
fn delta(i: &str) -> ParseResult<Decimal> {
    let number = recognize(tuple((opt(one_of("+-")), digit1, opt(pair(char('.'), digit1)))));
    context(
        "expected a decimal mass offset",
        map_res(number, |n: &str| Decimal::from_str_exact(n.trim_start_matches('+'))),
    )(i)
}

/// Fixed Modification = Modification Code , ":" , Delta ;
fn fixed_modification(i: &str) -> ParseResult<(ModificationCode, Decimal)> {
    separated_pair(modification_code, context("expected ':'", char(':')), delta)(i)
}

/// Variable Modification = Modification Code , ":" , Delta , { "," , Delta } ;
fn variable_modification(i: &str) -> ParseResult<(ModificationCode, Vec<Decimal>)> {
    separated_pair(
        modification_code,
        context("expected ':'", char(':')),
        separated_list1(char(','), delta),
    )(i)
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use once_cell::sync::Lazy;
    use rust_decimal_macros::dec;

    use super::*;

    static TABLE: Lazy<MassTable> = Lazy::new(MassTable::default);

    #[test]
    fn test_replacement_rules() {
        let parse = |rule| ReplacementRule::parse(rule, &TABLE);
        // Valid Rules
        assert_eq!(
            parse("J->I,L"),
            Ok(ReplacementRule {
                source: 'J',
                targets: vec!['I', 'L']
            })
        );
        assert_eq!(
            parse("X -> A"),
            Ok(ReplacementRule {
                source: 'X',
                targets: vec!['A']
            })
        );
        assert_eq!(parse("B->D, N").unwrap().to_string(), "B->D,N");
        // Invalid Rules
        assert!(parse("J=>I").is_err());
        assert!(parse("j->I").is_err());
        assert!(parse("J->").is_err());
        assert!(parse("J->I,").is_err());
        assert!(parse("J->IL").is_err());
    }

    #[test]
    fn test_replacement_rule_errors() {
        let error = ReplacementRule::parse("J=>I", &TABLE).unwrap_err();
        assert_snapshot!(error, @r#"could not parse the amino-acid replacement rule "J=>I""#);
        let ConfigError::MalformedRule { span, expected, .. } = error else {
            panic!("expected a malformed rule error");
        };
        assert_eq!(span.offset(), 1);
        assert_eq!(expected, "expected '->'");

        let ConfigError::MalformedRule { span, expected, .. } =
            ReplacementRule::parse("J->I,L?", &TABLE).unwrap_err()
        else {
            panic!("expected a malformed rule error");
        };
        assert_eq!(span.offset(), 6);
        assert_eq!(expected, "unexpected input");
    }

    #[test]
    fn test_modification_codes() {
        use ModificationCode as M;

        fn code(rule: &str) -> Option<ModificationCode> {
            fixed_modification(rule).ok().map(|(_, (code, _))| code)
        }
        assert_eq!(code("C:1"), Some(M::Residue('C')));
        assert_eq!(code("N:1"), Some(M::Residue('N')));
        assert_eq!(code("NPEPTERM:1"), Some(M::PeptideTerminus(Terminus::N)));
        assert_eq!(code("CPEPTERM:1"), Some(M::PeptideTerminus(Terminus::C)));
        assert_eq!(code("NPROTERM:1"), Some(M::ProteinTerminus(Terminus::N)));
        assert_eq!(code("CPROTERM:1"), Some(M::ProteinTerminus(Terminus::C)));
        assert_eq!(
            code("NPEPT:1"),
            Some(M::PeptideTerminalResidue(Terminus::N, 'T'))
        );
        assert_eq!(
            code("CPROK:1"),
            Some(M::ProteinTerminalResidue(Terminus::C, 'K'))
        );
        // Codes round-trip through their `Display` implementation
        for rule in ["C", "NPEPTERM", "CPROTERM", "NPEPQ", "CPROK"] {
            let parsed = code(&format!("{rule}:0")).unwrap();
            assert_eq!(parsed.to_string(), rule);
        }
    }

    #[test]
    fn test_deltas() {
        assert_eq!(delta("57.021464"), Ok(("", dec!(57.021464))));
        assert_eq!(delta("+42"), Ok(("", dec!(42))));
        assert_eq!(delta("-18.010565,"), Ok((",", dec!(-18.010565))));
        assert!(delta(".5").is_err());
        assert!(delta("-").is_err());
    }

    #[test]
    fn test_modification_rules() {
        let rules = ModificationRules::parse(
            &["C:57.021464", "NPEPTERM:42.010565"],
            &["M:15.994915", "S:79.966331,-18.010565", "M:31.989829"],
            &TABLE,
        )
        .unwrap();

        let fixed: Vec<_> = rules.fixed().collect();
        assert_eq!(
            fixed,
            [
                (ModificationCode::Residue('C'), dec!(57.021464)),
                (
                    ModificationCode::PeptideTerminus(Terminus::N),
                    dec!(42.010565)
                ),
            ]
        );

        let variable: Vec<_> = rules.variable().collect();
        assert_eq!(
            variable,
            [
                (
                    ModificationCode::Residue('M'),
                    &[dec!(15.994915), dec!(31.989829)][..]
                ),
                (
                    ModificationCode::Residue('S'),
                    &[dec!(79.966331), dec!(-18.010565)][..]
                ),
            ]
        );
        assert!(!rules.is_empty());
        let no_rules: &[&str] = &[];
        assert!(ModificationRules::parse(no_rules, no_rules, &TABLE).unwrap().is_empty());
    }

    #[test]
    fn test_modification_rule_errors() {
        let duplicate = ModificationRules::parse(&["C:57.021464", "C:58"], &[] as &[&str], &TABLE);
        assert_snapshot!(
            duplicate.unwrap_err(),
            @"the fixed modification target C was given more than once"
        );

        let multiple_fixed = ModificationRules::parse(&["C:57,58"], &[] as &[&str], &TABLE);
        assert_snapshot!(
            multiple_fixed.unwrap_err(),
            @r#"could not parse the fixed modification rule "C:57,58""#
        );

        let missing_colon = ModificationRules::parse(&[] as &[&str], &["M15.99"], &TABLE);
        let Err(ConfigError::MalformedRule { span, expected, .. }) = missing_colon else {
            panic!("expected a malformed rule error");
        };
        assert_eq!(span.offset(), 1);
        assert_eq!(expected, "expected ':'");

        let bad_code = ModificationRules::parse(&["m:15.99"], &[] as &[&str], &TABLE);
        let Err(ConfigError::MalformedRule { span, expected, .. }) = bad_code else {
            panic!("expected a malformed rule error");
        };
        assert_eq!(span.offset(), 0);
        assert_eq!(expected, "expected an uppercase residue code");
    }

    #[test]
    fn test_enzymes() {
        assert_eq!("trypsin".parse(), Ok(Enzyme::Trypsin));
        assert_eq!("Trypsin".parse(), Ok(Enzyme::Trypsin));
        assert_eq!("glu_c".parse(), Ok(Enzyme::GluC));
        assert_eq!("GluC".parse(), Ok(Enzyme::GluC));
        assert_eq!("full".parse(), Ok(Enzyme::Full));
        assert_eq!("skip".parse(), Ok(Enzyme::Skip));
        assert_snapshot!(
            "pepsin".parse::<Enzyme>().unwrap_err(),
            @r#"the enzyme "pepsin" is not supported"#
        );
        assert_eq!(Enzyme::GluC.to_string(), "gluc");
    }
}
