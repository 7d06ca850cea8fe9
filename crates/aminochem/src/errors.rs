use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

// NOTE: Every one of these is fatal at startup, and none of them should ever be raised once proteins are being processed
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[diagnostic(help("{help}"))]
    #[error("could not parse the {kind} {rule:?}")]
    MalformedRule {
        kind: &'static str,
        help: &'static str,
        rule: String,
        #[source_code]
        input: String,
        #[label("{expected}")]
        span: SourceSpan,
        expected: &'static str,
    },

    #[diagnostic(help("supported enzymes are: skip, trypsin, gluc, and full"))]
    #[error("the enzyme {0:?} is not supported")]
    UnknownEnzyme(String),

    #[diagnostic(help(
        "supported features are: INIT_MET, SIGNAL, VARIANT, MUTAGEN, CONFLICT, PROPEP, PEPTIDE, CHAIN, and VAR_SEQ"
    ))]
    #[error("the feature kind {0:?} is not supported")]
    UnknownFeatureKind(String),

    #[diagnostic(help("fixed modifications are applied in place, so only one can target each residue or terminus"))]
    #[error("the fixed modification target {0} was given more than once")]
    DuplicateFixedModification(String),

    #[diagnostic(help("double-check for typos, or add the residue to the mass table"))]
    #[error("the {kind} targets the residue {residue:?}, which is missing from the mass table")]
    UnknownResidue { kind: &'static str, residue: char },

    #[error("the mass scaling factor must be greater than zero")]
    ZeroMassFactor,
}

impl ConfigError {
    pub(crate) fn malformed_rule(
        kind: &'static str,
        help: &'static str,
        rule: &str,
        offset: usize,
        expected: &'static str,
    ) -> Self {
        // NOTE: The additional space is added so that labels can point to the end of an input
        let input = format!("{rule} ");
        let rule = rule.to_owned();
        let span = SourceSpan::from((offset, 1));

        Self::MalformedRule {
            kind,
            help,
            rule,
            input,
            span,
            expected,
        }
    }
}
