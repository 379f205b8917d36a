//! Symbol arena and fingerprint interning for training.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{CodeUnit, DELIMITER, PieceCodes};

/// Stable handle into the arena.
pub(crate) type SymbolId = u32;

/// Combines two fingerprints into the fingerprint of their pair.
///
/// `combine(combine(a, b), c)` and `combine(a, combine(b, c))` differ, so
/// fingerprints encode the merge structure and not just the flat content.
#[inline(always)]
pub(crate) fn combine_fingerprints(left: u64, right: u64) -> u64 {
    left.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ right
}

/// Unary or pair symbol tracked during training.
#[derive(Debug, Clone)]
pub(crate) struct Symbol {
    /// Interning key. Equal to the code value for unary symbols.
    pub fingerprint: u64,
    /// Code content of the symbol.
    pub codes: PieceCodes,
    /// Constituents. `None` for unary symbols.
    pub left:  Option<SymbolId>,
    pub right: Option<SymbolId>,
    /// Aggregate corpus frequency. `None` marks a stale value that must be
    /// recomputed from `positions`.
    pub freq: Option<i64>,
    /// Packed `(row, left_slot, right_slot)` corpus positions. Ordered so
    /// rewrites walk each row left to right.
    pub positions: BTreeSet<u64>,
}
impl Symbol {
    #[inline(always)]
    pub fn is_pair(&self) -> bool {
        self.left.is_some()
    }
}

/// Arena owning every symbol created during a training run, with a
/// fingerprint interning table.
///
/// Symbols are never deallocated individually; `evict` only unlinks a
/// symbol from the interning table so it cannot be returned again.
#[derive(Debug)]
pub(crate) struct SymbolArena {
    symbols: Vec<Symbol>,
    cache:   HashMap<u64, SymbolId>,

    max_piece_length: usize,
}
impl SymbolArena {
    #[inline(always)]
    pub fn new(max_piece_length: usize) -> Self {
        Self {
            symbols: Vec::new(),
            cache: HashMap::new(),
            max_piece_length,
        }
    }

    #[inline(always)]
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id as usize]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id as usize]
    }

    /// Interns the unary symbol for a code.
    ///
    /// `freq` is the aggregate corpus weight of the code and is only used
    /// when the symbol does not exist yet.
    #[inline(never)]
    pub fn intern_unary(&mut self, code: CodeUnit, freq: i64) -> SymbolId {
        let fingerprint = code as u64;
        if let Some(&id) = self.cache.get(&fingerprint) {
            return id;
        }
        let id = self.symbols.len() as SymbolId;
        self.symbols.push(Symbol {
            fingerprint,
            codes: Vec::from([code]),
            left: None,
            right: None,
            freq: Some(freq),
            positions: BTreeSet::new(),
        });
        self.cache.insert(fingerprint, id);
        id
    }

    /// Interns the pair symbol joining two existing symbols.
    ///
    /// Returns `None` if the concatenation is not a valid piece. New pair
    /// symbols start with a stale frequency.
    #[inline(never)]
    pub fn intern_pair(&mut self, left: SymbolId, right: SymbolId) -> Option<SymbolId> {
        let fingerprint = combine_fingerprints(
            self.symbols[left as usize].fingerprint,
            self.symbols[right as usize].fingerprint,
        );
        if let Some(&id) = self.cache.get(&fingerprint) {
            return Some(id);
        }
        let mut codes = self.symbols[left as usize].codes.clone();
        codes.extend_from_slice(&self.symbols[right as usize].codes);
        if !self.is_valid_piece(&codes) {
            return None;
        }
        let id = self.symbols.len() as SymbolId;
        self.symbols.push(Symbol {
            fingerprint,
            codes,
            left: Some(left),
            right: Some(right),
            freq: None,
            positions: BTreeSet::new(),
        });
        self.cache.insert(fingerprint, id);
        Some(id)
    }

    /// Removes a symbol from the interning table.
    #[inline(always)]
    pub fn evict(&mut self, id: SymbolId) {
        self.cache.remove(&self.symbols[id as usize].fingerprint);
    }

    /// Returns the ids of all interned pair symbols.
    #[inline(never)]
    pub fn cached_pairs(&self) -> Vec<SymbolId> {
        self.cache
            .values()
            .copied()
            .filter(|&id| self.symbols[id as usize].is_pair())
            .collect()
    }

    /// Returns the number of interned symbols.
    #[inline(always)]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Returns `true` if `codes` is a valid piece: non-empty, within the
    /// length bound and free of the delimiter sentinel.
    #[inline(always)]
    pub fn is_valid_piece(&self, codes: &[CodeUnit]) -> bool {
        !codes.is_empty()
            && codes.len() <= self.max_piece_length
            && !codes.contains(&DELIMITER)
    }
}
