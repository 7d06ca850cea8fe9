//! Key-based access to node and edge attributes, for exporters that shouldn't depend on the graph's internals

// Standard Library Imports
use std::fmt::{self, Display, Formatter};

// External Crate Imports
use aminochem::Mass;
use itertools::Itertools;

// Local Crate Imports
use crate::{Edge, Feature, MassKind, Node, OrGroup, Qualifier};

// Public API ==========================================================================================================

/// The value of an attribute that is present. Absent attributes are `None` instead, so that they can be told apart
/// from attributes that are present but `Null`
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Attr<'g> {
    Null,
    Text(&'g str),
    Integer(u64),
    Boolean(bool),
    Mass(Mass),
    Qualifiers(&'g [Qualifier]),
}

impl Node {
    pub const KEYS: [&'static str; 10] = [
        "residues",
        "position",
        "accession",
        "isoform_accession",
        "isoform_position",
        "delta_mass",
        "monoisotopic_mass",
        "average_mass",
        "monoisotopic_mass_to_end",
        "average_mass_to_end",
    ];

    /// Positional attributes are always present, but may be `Null`. Masses are only present once they've been set
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<Attr<'_>> {
        let integer = |value: Option<u32>| value.map_or(Attr::Null, |v| Attr::Integer(v.into()));
        let attr = match key {
            "residues" => Attr::Text(&self.residues),
            "position" => integer(self.position),
            "accession" => Attr::Text(&self.accession),
            "isoform_accession" => self.isoform_accession.as_deref().map_or(Attr::Null, Attr::Text),
            "isoform_position" => integer(self.isoform_position),
            "delta_mass" => Attr::Mass(self.delta_mass?),
            "monoisotopic_mass" => Attr::Mass(self.mass(MassKind::Monoisotopic)?),
            "average_mass" => Attr::Mass(self.mass(MassKind::Average)?),
            "monoisotopic_mass_to_end" => Attr::Mass(self.mass_to_end(MassKind::Monoisotopic)?),
            "average_mass_to_end" => Attr::Mass(self.mass_to_end(MassKind::Average)?),
            _ => return None,
        };
        Some(attr)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&'static str, Attr<'_>)> + '_ {
        Self::KEYS
            .into_iter()
            .filter_map(|key| Some((key, self.attr(key)?)))
    }
}

impl Edge {
    pub const KEYS: [&'static str; 2] = ["cleaved", "qualifiers"];

    /// `cleaved` is absent until the graph has been digested, and `qualifiers` is `Null` on unannotated edges
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<Attr<'_>> {
        match key {
            "cleaved" => self.cleaved.map(Attr::Boolean),
            "qualifiers" => Some(self.qualifiers().map_or(Attr::Null, Attr::Qualifiers)),
            _ => None,
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&'static str, Attr<'_>)> + '_ {
        Self::KEYS
            .into_iter()
            .filter_map(|key| Some((key, self.attr(key)?)))
    }
}

impl OrGroup {
    #[must_use]
    pub fn alternatives(&self) -> &[Vec<Qualifier>] {
        &self.0
    }
}

// Display Trait Implementations =======================================================================================

impl Display for Attr<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(text) => write!(f, "{text}"),
            Self::Integer(integer) => write!(f, "{integer}"),
            Self::Boolean(boolean) => write!(f, "{boolean}"),
            Self::Mass(mass) => write!(f, "{mass}"),
            Self::Qualifiers(qualifiers) => write!(f, "{}", qualifiers.iter().join(",")),
        }
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}-{}]", self.kind, self.start, self.end)
    }
}

impl Display for Qualifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feature(feature) => write!(f, "{feature}"),
            Self::Or(group) => write!(f, "{group}"),
        }
    }
}

impl Display for OrGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let alternatives = self.0.iter().map(|alt| alt.iter().join(","));
        write!(f, "({})", alternatives.format("|"))
    }
}

// Module Tests ========================================================================================================
