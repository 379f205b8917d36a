//! Greedy merge encoder for code sequences.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

use orx_priority_queue::{DaryHeap, PriorityQueue};

use crate::{CodeUnit, Piece, PieceCodes, PieceScore, Pieces, Vocabulary, format_codes};

/// Errors encountered during encoding.
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum EncodeError {
    /// A piece is not part of the vocabulary.
    #[cfg_attr(feature = "std", error("unknown piece {0}"))]
    UnknownPiece(String),
}

/// Merge-time symbol. Merged symbols keep empty codes and stay out of the
/// linked order.
#[derive(Debug, Clone)]
struct MergeSymbol {
    codes: PieceCodes,
    prev:  i32,
    next:  i32,
}

/// Candidate merge of two adjacent symbols.
///
/// `size` records the combined length at insertion time. Entries whose
/// sides have been resized or emptied by earlier merges fail the size
/// check at pop time and are discarded.
#[derive(Debug, Clone, Copy)]
struct MergeCandidate {
    left:  u32,
    right: u32,
    size:  u32,
}

#[derive(Debug, Clone, Copy)]
struct MergeKey {
    score: PieceScore,
    left:  u32,
}
impl PartialEq for MergeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.left == other.left
    }
}
impl Eq for MergeKey {}
impl PartialOrd for MergeKey {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for MergeKey {
    // The agenda pops its least key first. Higher scores order first,
    // ties prefer the leftmost pair.
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap()
            .then_with(|| self.left.cmp(&other.left))
    }
}

type MergeAgenda = DaryHeap<MergeCandidate, MergeKey, 4>;

/// Encodes a delimiter-free run into pieces from the vocabulary.
///
/// Builds a doubly-linked symbol list over the input codes, seeds the
/// agenda with every adjacent pair present in the vocabulary, and applies
/// the highest-scoring merge until no candidate remains.
///
/// Returns an error if a resulting piece is not in the vocabulary, which
/// can only happen for codes outside the trained alphabet.
#[inline(never)]
pub(crate) fn encode_run(vocab: &Vocabulary, run: &[CodeUnit]) -> Result<Pieces, EncodeError> {
    if run.is_empty() {
        return Ok(Pieces::new());
    }

    let mut symbols = Vec::with_capacity(run.len());
    for (index, &code) in run.iter().enumerate() {
        symbols.push(MergeSymbol {
            codes: vec![code],
            prev:  if index == 0 { -1 } else { index as i32 - 1 },
            next:  if index + 1 == run.len() { -1 } else { index as i32 + 1 },
        });
    }

    let mut agenda = MergeAgenda::with_capacity(symbols.len());
    for index in 1..symbols.len() {
        maybe_push_pair(vocab, &symbols, &mut agenda, index as i32 - 1, index as i32);
    }

    while let Some((candidate, _)) = agenda.pop() {
        let left = candidate.left as usize;
        let right = candidate.right as usize;
        if symbols[left].codes.is_empty()
            || symbols[right].codes.is_empty()
            || symbols[left].codes.len() + symbols[right].codes.len() != candidate.size as usize
        {
            continue;
        }

        let merged = core::mem::take(&mut symbols[right].codes);
        symbols[left].codes.extend(merged);

        // Relink [prev, left], [left, right], [right, next]
        // into [prev, left], [left, next].
        symbols[left].next = symbols[right].next;
        let next = symbols[right].next;
        if next >= 0 {
            symbols[next as usize].prev = left as i32;
        }

        let prev = symbols[left].prev;
        maybe_push_pair(vocab, &symbols, &mut agenda, prev, left as i32);
        maybe_push_pair(vocab, &symbols, &mut agenda, left as i32, next);
    }

    let mut output = Pieces::new();
    let mut index = 0i32;
    while index != -1 {
        let symbol = &symbols[index as usize];
        let id = vocab
            .piece_to_id(&symbol.codes)
            .ok_or_else(|| EncodeError::UnknownPiece(format_codes(&symbol.codes)))?;
        output.push(Piece {
            id,
            codes: symbol.codes.clone(),
        });
        index = symbol.next;
    }
    Ok(output)
}

/// Enqueues the concatenation of two adjacent symbols if it is a piece.
#[inline(always)]
fn maybe_push_pair(
    vocab: &Vocabulary, symbols: &[MergeSymbol], agenda: &mut MergeAgenda, left: i32, right: i32,
) {
    if left == -1 || right == -1 {
        return;
    }
    let left = left as usize;
    let right = right as usize;
    let mut piece = symbols[left].codes.clone();
    piece.extend_from_slice(&symbols[right].codes);
    if let Some((_, score)) = vocab.lookup(&piece) {
        agenda.push(
            MergeCandidate {
                left:  left as u32,
                right: right as u32,
                size:  piece.len() as u32,
            },
            MergeKey {
                score,
                left: left as u32,
            },
        );
    }
}
