//! The annotated protein records that graphs are built from

// Standard Library Imports
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

// External Crate Imports
use aminochem::ConfigError;
use serde::{Deserialize, Serialize};

// Local Crate Imports
use crate::{Feature, FeatureKind};

// Public API ==========================================================================================================

/// One parsed annotation record. Reading records from disk is left to the caller
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub accessions: Vec<String>,
    pub entry_name: String,
    pub sequence: String,
    pub description: String,
    pub comments: Vec<String>,
    pub features: Vec<RawFeature>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct RawFeature {
    pub kind: String,
    // NOTE: Annotation databases sometimes leave an endpoint unknown, and those features are skipped
    pub start: Option<u32>,
    pub end: Option<u32>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub isoform_ref: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl Entry {
    /// The primary accession, falling back to the entry name if there are no accessions
    #[must_use]
    pub fn accession(&self) -> &str {
        self.accessions.first().unwrap_or(&self.entry_name)
    }
}

impl RawFeature {
    pub fn new(kind: impl Into<String>, start: u32, end: u32, note: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            start: Some(start),
            end: Some(end),
            note: note.into(),
            isoform_ref: None,
            id: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_isoform_ref(mut self, isoform: impl Into<String>) -> Self {
        self.isoform_ref = Some(isoform.into());
        self
    }
}

impl Feature {
    pub(crate) fn new(kind: FeatureKind, start: u32, end: u32, note: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            end,
            note: note.into(),
            isoform_ref: None,
            id: None,
        }
    }

    /// Converts a raw feature into a `Feature`, returning `None` for kinds that don't affect the graph or for features
    /// with unknown endpoints
    #[must_use]
    pub fn from_raw(raw: &RawFeature) -> Option<Self> {
        let kind = raw.kind.parse().ok()?;
        let (start, end) = raw.start.zip(raw.end)?;
        Some(Self {
            kind,
            start,
            end,
            note: raw.note.clone(),
            isoform_ref: raw.isoform_ref.clone(),
            id: raw.id.clone(),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> FeatureKind {
        self.kind
    }

    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    #[must_use]
    pub fn isoform_ref(&self) -> Option<&str> {
        self.isoform_ref.as_deref()
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FeatureKind {
    /// Every kind of feature read from an `Entry`, in the order they're executed
    pub const EXECUTABLE: [Self; 9] = [
        Self::VarSeq,
        Self::InitMet,
        Self::Signal,
        Self::Propep,
        Self::Peptide,
        Self::Chain,
        Self::Variant,
        Self::Mutagen,
        Self::Conflict,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::VarSeq => "VAR_SEQ",
            Self::InitMet => "INIT_MET",
            Self::Signal => "SIGNAL",
            Self::Propep => "PROPEP",
            Self::Peptide => "PEPTIDE",
            Self::Chain => "CHAIN",
            Self::Variant => "VARIANT",
            Self::Mutagen => "MUTAGEN",
            Self::Conflict => "CONFLICT",
            Self::FixMod => "FIXMOD",
            Self::VarMod => "VARMOD",
        }
    }
}

impl FromStr for FeatureKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        [Self::FixMod, Self::VarMod]
            .into_iter()
            .chain(Self::EXECUTABLE)
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::UnknownFeatureKind(s.to_owned()))
    }
}

impl Display for FeatureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Module Tests ========================================================================================================
