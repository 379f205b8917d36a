use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt::{Debug, Display, Write};

use derive_more::{AsMut, AsRef, Deref, DerefMut, Index, IndexMut};

/// Single code unit of the input alphabet.
pub type CodeUnit = u32;
/// Numeric identifier of a piece.
pub type PieceId = u32;
/// Score of a piece.
pub type PieceScore = f32;
/// Code sequence of a piece.
pub type PieceCodes = Vec<CodeUnit>;

/// Reserved code substituted for configured delimiter bytes.
///
/// Inputs are split on this value, and no piece ever contains it.
pub const DELIMITER: CodeUnit = CodeUnit::MAX;

/// Piece structure.
///
/// Pairs a code sequence with its vocabulary id. Returned by encoding and
/// used when assembling a vocabulary.
#[derive(Clone, AsRef, AsMut, Deref, DerefMut, Index, IndexMut)]
pub struct Piece {
    pub id:    PieceId,
    #[as_ref]
    #[as_mut]
    #[deref]
    #[deref_mut]
    #[index]
    #[index_mut]
    pub codes: PieceCodes,
}
impl Display for Piece {
    #[inline(never)]
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_tuple("Piece").field(&self.id).field(&format_codes(&self.codes)).finish()
    }
}
impl Debug for Piece {
    #[inline(never)]
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Piece")
            .field("id", &self.id)
            .field("codes", &format_codes(&self.codes))
            .finish()
    }
}
impl PartialEq for Piece {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.codes == other.codes
    }
}
impl Eq for Piece {}
impl PartialOrd for Piece {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Piece {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
impl Borrow<PieceCodes> for Piece {
    #[inline(always)]
    fn borrow(&self) -> &PieceCodes {
        &self.codes
    }
}
impl Borrow<[CodeUnit]> for Piece {
    #[inline(always)]
    fn borrow(&self) -> &[CodeUnit] {
        &self.codes
    }
}
impl IntoIterator for Piece {
    type IntoIter = alloc::vec::IntoIter<CodeUnit>;
    type Item = CodeUnit;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.codes.into_iter()
    }
}
impl<'a> IntoIterator for &'a Piece {
    type IntoIter = alloc::slice::Iter<'a, CodeUnit>;
    type Item = &'a CodeUnit;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.codes.iter()
    }
}
impl From<Piece> for (PieceCodes, PieceId) {
    #[inline(always)]
    fn from(value: Piece) -> (PieceCodes, PieceId) {
        (value.codes, value.id)
    }
}
impl From<Piece> for (PieceId, PieceCodes) {
    #[inline(always)]
    fn from(value: Piece) -> (PieceId, PieceCodes) {
        (value.id, value.codes)
    }
}
impl From<(PieceCodes, PieceId)> for Piece {
    #[inline(always)]
    fn from(value: (PieceCodes, PieceId)) -> Piece {
        Piece {
            id:    value.1,
            codes: value.0,
        }
    }
}
impl From<(PieceId, PieceCodes)> for Piece {
    #[inline(always)]
    fn from(value: (PieceId, PieceCodes)) -> Piece {
        Piece {
            id:    value.0,
            codes: value.1,
        }
    }
}

/// List of pieces.
pub type Pieces = Vec<Piece>;
/// List of piece scores.
pub type Scores = Vec<PieceScore>;

/// Formats a code sequence as an underscore-joined decimal string, e.g. `12_7_405`.
///
/// This is the representation pieces use in model and vocabulary files.
#[inline(never)]
pub fn format_codes(codes: &[CodeUnit]) -> String {
    let mut out = String::with_capacity(codes.len() * 4);
    for (i, code) in codes.iter().enumerate() {
        if i > 0 {
            out.push('_');
        }
        write!(out, "{}", code).unwrap();
    }
    out
}

/// Parses an underscore-joined decimal string back into a code sequence.
///
/// Returns `None` if the string is empty or any element fails to parse.
#[inline(never)]
pub fn parse_codes(piece: &str) -> Option<PieceCodes> {
    if piece.is_empty() {
        return None;
    }
    piece.split('_').map(|part| part.parse::<CodeUnit>().ok()).collect()
}
