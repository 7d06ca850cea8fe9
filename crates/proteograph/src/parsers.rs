//! Parsers for the free-text parts of an `Entry`: feature notes, and the isoform declarations found in comments

// External Crate Imports
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till, take_till1, take_until, take_while1},
    character::complete::{char, satisfy, space0},
    combinator::{map, not, value, verify},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated, tuple},
};

// Public API ==========================================================================================================

/// What a feature does to the residues it spans
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum Note {
    /// The residues are deleted
    Missing,
    /// The residues are replaced, once by each of these sequences
    Substitution(Vec<String>),
}

/// An isoform built by applying the VAR_SEQ features with the listed ids to the canonical sequence
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct IsoformDeclaration {
    pub accession: String,
    pub var_seq_ids: Vec<String>,
}

pub(crate) fn parse_note(note: &str) -> Option<Note> {
    note_parser(note.trim()).ok().map(|(_, note)| note)
}

/// Finds every isoform declared in `comment` that is described by VAR_SEQ features. Isoforms that are displayed
/// as the canonical sequence, or whose sequence is external, aren't returned
pub(crate) fn parse_isoform_declarations(comment: &str) -> Vec<IsoformDeclaration> {
    let mut records = many0(preceded(
        take_until("IsoId="),
        alt((map(isoform_record, Some), value(None, tag("IsoId=")))),
    ));
    let parsed: IResult<_, _> = records(comment);
    parsed
        .map(|(_, records)| records.into_iter().flatten().collect())
        .unwrap_or_default()
}

// Private Parsers =====================================================================================================

/// Residues = uppercase , { uppercase } ;
fn residues(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_uppercase())(i)
}

/// Word Boundary = ? end of input, or any character that isn't alphanumeric ? ;
fn word_boundary(i: &str) -> IResult<&str, ()> {
    not(satisfy(char::is_alphanumeric))(i)
}

/// Missing = "Missing" , Word Boundary ;
fn missing(i: &str) -> IResult<&str, Note> {
    value(Note::Missing, terminated(tag_no_case("missing"), word_boundary))(i)
}

/// Substitution = Residues , "->" , Residues , { "," , Residues } , Word Boundary ;
fn substitution(i: &str) -> IResult<&str, Note> {
    let arrow = delimited(space0, tag("->"), space0);
    let comma = delimited(space0, char(','), space0);
    let targets = terminated(separated_list1(comma, residues), word_boundary);
    map(preceded(tuple((residues, arrow)), targets), |targets| {
        Note::Substitution(targets.into_iter().map(str::to_owned).collect())
    })(i)
}

/// Note = Missing | Substitution , ? anything ? ;
fn note_parser(i: &str) -> IResult<&str, Note> {
    alt((missing, substitution))(i)
}

/// Isoform Record = "IsoId=" , Isoform Id , ? anything ? , "Sequence=" , Sequence , ";" ;
fn isoform_record(i: &str) -> IResult<&str, IsoformDeclaration> {
    let isoform_id = take_till1(|c: char| c == ';' || c == ',' || c.is_whitespace());
    let sequence = take_till(|c: char| c == ';');
    // NOTE: An isoform without a `Sequence=` mustn't steal the sequence of the next isoform
    let same_record = verify(take_until("Sequence="), |skipped: &str| !skipped.contains("IsoId="));
    let (rest, (_, accession, _, _, sequence)) = tuple((
        tag("IsoId="),
        isoform_id,
        same_record,
        tag("Sequence="),
        sequence,
    ))(i)?;

    let var_seq_ids: Vec<_> = sequence
        .split(',')
        .map(str::trim)
        .filter(|id| id.starts_with("VSP_"))
        .map(str::to_owned)
        .collect();

    if var_seq_ids.is_empty() {
        Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Verify,
        )))
    } else {
        let accession = accession.to_owned();
        Ok((rest, IsoformDeclaration { accession, var_seq_ids }))
    }
}

// Module Tests ========================================================================================================
