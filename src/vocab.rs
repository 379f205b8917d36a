//! Frozen piece vocabulary.

use alloc::format;
use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;

use crate::{
    CodeUnit, DELIMITER, InitializationError, PieceCodes, PieceId, PieceScore, Scores, format_codes,
};

type IdMap = HashMap<PieceCodes, PieceId>;

/// Frozen mapping between piece contents, ids and scores.
///
/// Ids are dense and assigned in insertion order. Built once by the trainer
/// or from a loaded model definition, never mutated afterwards.
#[derive(Clone)]
pub struct Vocabulary {
    codes:  Vec<PieceCodes>,
    scores: Scores,
    ids:    IdMap,

    max_piece_len: usize,
}
impl Debug for Vocabulary {
    #[inline(never)]
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("pieces", &format!("IdMap({})", self.ids.len()))
            .field("max_piece_len", &self.max_piece_len)
            .finish()
    }
}
impl Vocabulary {
    /// Creates a vocabulary from pieces in id order.
    ///
    /// Returns an error if any piece is empty, contains the delimiter
    /// sentinel, or occurs more than once.
    #[inline(never)]
    pub fn new(
        pieces: impl IntoIterator<Item = (PieceCodes, PieceScore)>,
    ) -> Result<Self, InitializationError> {
        let pieces = pieces.into_iter();
        let mut codes = Vec::with_capacity(pieces.size_hint().0);
        let mut scores = Scores::with_capacity(pieces.size_hint().0);
        let mut ids = IdMap::with_capacity(pieces.size_hint().0);
        for (piece, score) in pieces {
            if piece.is_empty() {
                return Err(InitializationError::EmptyPiece);
            }
            if piece.contains(&DELIMITER) {
                return Err(InitializationError::DelimiterInPiece(format_codes(&piece)));
            }
            let id = codes.len() as PieceId;
            if ids.insert(piece.clone(), id).is_some() {
                return Err(InitializationError::DuplicatePiece(format_codes(&piece)));
            }
            codes.push(piece);
            scores.push(score);
        }
        let max_piece_len = codes.iter().map(|piece| piece.len()).max().unwrap_or(0);
        Ok(Self {
            codes,
            scores,
            ids,
            max_piece_len,
        })
    }

    /// Returns the id of the given piece.
    #[inline(always)]
    pub fn piece_to_id(&self, piece: &[CodeUnit]) -> Option<PieceId> {
        self.ids.get(piece).copied()
    }

    /// Returns the piece with the given id.
    #[inline(always)]
    pub fn id_to_piece(&self, id: PieceId) -> Option<&[CodeUnit]> {
        self.codes.get(id as usize).map(Vec::as_slice)
    }

    /// Returns the score of the piece with the given id.
    #[inline(always)]
    pub fn score(&self, id: PieceId) -> Option<PieceScore> {
        self.scores.get(id as usize).copied()
    }

    /// Returns the id and score of the given piece.
    #[inline(always)]
    pub(crate) fn lookup(&self, piece: &[CodeUnit]) -> Option<(PieceId, PieceScore)> {
        self.ids.get(piece).map(|&id| (id, self.scores[id as usize]))
    }

    /// Returns the number of pieces.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` if the vocabulary contains no pieces.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Returns the length of the longest piece in code units.
    #[inline(always)]
    pub fn max_piece_len(&self) -> usize {
        self.max_piece_len
    }

    /// Iterates over pieces and scores in id order.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = (&[CodeUnit], PieceScore)> {
        self.codes.iter().map(Vec::as_slice).zip(self.scores.iter().copied())
    }
}
