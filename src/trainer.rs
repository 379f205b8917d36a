//! BPE trainer for code sequences.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use hashbrown::HashSet;

use crate::{ConfigError, Definition, ModelPiece, PieceCodes, PieceKind, TrainerSpec, format_codes};

mod corpus;
mod symbols;

use corpus::Corpus;
use symbols::{SymbolArena, SymbolId};

/// Refresh the active working set every this many emitted pieces.
const ACTIVE_REFRESH_INTERVAL: usize = 100;
/// The active working set never selects fewer than this many pairs.
const MIN_ACTIVE_SYMBOLS: usize = 1000;

/// Errors encountered during training.
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum TrainError {
    /// The configuration failed to validate.
    #[cfg_attr(feature = "std", error("invalid config: {0}"))]
    InvalidConfig(ConfigError),
    /// A corpus row could not be read.
    #[cfg(feature = "std")]
    #[error("{0}")]
    Row(crate::io::RowError),
    /// An emitted piece failed validation.
    #[cfg_attr(feature = "std", error("invalid piece: {0}"))]
    InvalidPiece(String),
    /// A training post-condition failed.
    #[cfg_attr(feature = "std", error("internal invariant violated: {0}"))]
    Internal(String),
    /// A model or vocabulary file could not be written.
    #[cfg(feature = "std")]
    #[error("{0}")]
    Io(std::io::Error),
}
impl From<ConfigError> for TrainError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e)
    }
}
#[cfg(feature = "std")]
impl From<crate::io::RowError> for TrainError {
    fn from(e: crate::io::RowError) -> Self {
        Self::Row(e)
    }
}

/// BPE trainer.
///
/// Learns a piece vocabulary from a corpus of code sequences by greedily
/// merging the most frequent adjacent pair, and always covers the full
/// corpus alphabet with single-code fallback pieces.
#[derive(Debug, Clone)]
pub struct Trainer {
    spec: TrainerSpec,
}
impl Trainer {
    /// Creates a trainer with the given configuration.
    ///
    /// Returns an error if the configuration fails to validate.
    pub fn new(spec: TrainerSpec) -> Result<Self, TrainError> {
        spec.validate()?;
        Ok(Self { spec })
    }

    /// Returns the training configuration.
    #[inline(always)]
    pub fn spec(&self) -> &TrainerSpec {
        &self.spec
    }

    /// Trains from the corpus files listed in the configuration and writes
    /// `<model_prefix>.model` and `<model_prefix>.vocab` when a prefix is
    /// configured.
    #[cfg(all(feature = "std", feature = "serialization"))]
    pub fn train(&self) -> Result<Definition, TrainError> {
        if self.spec.input.is_empty() {
            return Err(ConfigError::MissingInput.into());
        }
        let reader = crate::io::CorpusReader::new(&self.spec);
        let mut failure = None;
        let rows = reader.map_while(|row| match row {
            Ok(row) => Some(row),
            Err(error) => {
                failure = Some(error);
                None
            }
        });
        let definition = self.train_from_rows(rows);
        if let Some(error) = failure {
            return Err(error.into());
        }
        let definition = definition?;

        if !self.spec.model_prefix.is_empty() {
            let model_path = format!("{}.model", self.spec.model_prefix);
            log::info!("Saving model: {}", model_path);
            definition.to_file(&model_path).map_err(TrainError::Io)?;
            let vocab_path = format!("{}.vocab", self.spec.model_prefix);
            log::info!("Saving vocab: {}", vocab_path);
            definition.vocab_to_file(&vocab_path).map_err(TrainError::Io)?;
        }
        Ok(definition)
    }

    /// Trains from an iterator of code sequences.
    ///
    /// Rows may contain the delimiter sentinel; they are split into
    /// delimiter-free runs before merging starts. Returns the trained model
    /// definition without writing any files.
    #[inline(never)]
    pub fn train_from_rows(
        &self, rows: impl IntoIterator<Item = PieceCodes>,
    ) -> Result<Definition, TrainError> {
        let mut corpus = Corpus::load(
            rows,
            self.spec.input_sentence_size,
            self.spec.shuffle_input_sentence,
            self.spec.reservoir_seed(),
        );
        corpus.split_on_delimiter();

        let mut state = TrainState::new(&self.spec, corpus);
        let final_pieces = state.run()?;
        self.build_definition(final_pieces)
    }

    /// Assembles the model definition from the emitted pieces.
    ///
    /// Enforces the training post-conditions: the piece count matches the
    /// configured vocabulary size, and no piece is empty or duplicated.
    #[inline(never)]
    fn build_definition(
        &self, final_pieces: Vec<(PieceCodes, f32)>,
    ) -> Result<Definition, TrainError> {
        if final_pieces.len() != self.spec.vocab_size as usize {
            return Err(TrainError::Internal(format!(
                "final piece count {} does not match vocab_size {}",
                final_pieces.len(),
                self.spec.vocab_size
            )));
        }
        let mut seen = HashSet::with_capacity(final_pieces.len());
        let mut pieces = Vec::with_capacity(final_pieces.len());
        for (codes, score) in final_pieces {
            if codes.is_empty() {
                return Err(TrainError::InvalidPiece(String::from("piece must not be empty")));
            }
            let piece = format_codes(&codes);
            if !seen.insert(codes) {
                return Err(TrainError::InvalidPiece(format!("{} is already defined", piece)));
            }
            pieces.push(ModelPiece {
                piece,
                score,
                kind: PieceKind::Normal,
            });
        }
        Ok(Definition {
            trainer_spec: self.spec.clone(),
            pieces,
        })
    }
}

/// Packs a corpus position into the inverted-index representation.
#[inline(always)]
fn encode_pos(sid: usize, left: usize, right: usize) -> u64 {
    ((sid as u64) << 32) | ((left as u64) << 16) | right as u64
}

/// Unpacks a corpus position.
#[inline(always)]
fn decode_pos(pos: u64) -> (usize, usize, usize) {
    ((pos >> 32) as usize, ((pos >> 16) & 0xFFFF) as usize, (pos & 0xFFFF) as usize)
}

/// Mutable state of one training run: the symbol arena, the per-row symbol
/// slots and the active working set.
struct TrainState<'a> {
    spec:   &'a TrainerSpec,
    corpus: Corpus,
    arena:  SymbolArena,
    slots:  Vec<Vec<Option<SymbolId>>>,
    active: HashSet<SymbolId>,
}
impl<'a> TrainState<'a> {
    fn new(spec: &'a TrainerSpec, corpus: Corpus) -> Self {
        let arena = SymbolArena::new(spec.max_piece_length as usize);
        Self {
            spec,
            corpus,
            arena,
            slots: Vec::new(),
            active: HashSet::new(),
        }
    }

    /// Runs the merge loop and returns the emitted pieces in order,
    /// including the trailing single-code fallback pieces.
    fn run(&mut self) -> Result<Vec<(PieceCodes, f32)>, TrainError> {
        let alphabet_size = self.corpus.required_codes.len();
        let vocab_size = self.spec.vocab_size as usize;
        if vocab_size < alphabet_size {
            return Err(ConfigError::VocabSizeTooSmall {
                vocab_size: self.spec.vocab_size,
                alphabet_size,
            }
            .into());
        }
        let merge_target = vocab_size - alphabet_size;
        log::info!(
            "Unique code count: {}; BPE will find {} pieces",
            alphabet_size,
            merge_target
        );

        self.materialize_slots()?;
        for sid in 0..self.slots.len() {
            for index in 1..self.slots[sid].len() {
                self.add_new_pair(sid, Some(index - 1), Some(index));
            }
        }

        let mut final_pieces: Vec<(PieceCodes, f32)> = Vec::with_capacity(vocab_size);
        // Distinct merge paths can produce the same content. Only the first
        // emission counts; later twins are dropped from the caches.
        let mut emitted = HashSet::<PieceCodes>::new();
        while final_pieces.len() < merge_target {
            if final_pieces.len() % ACTIVE_REFRESH_INTERVAL == 0 {
                self.update_active_symbols();
            }

            let candidates = self.active.iter().copied().collect::<Vec<_>>();
            let mut best: Option<SymbolId> = None;
            for id in candidates {
                self.compute_freq(id);
                best = Some(match best {
                    None => id,
                    Some(current) if self.candidate_order(id, current) == Ordering::Less => id,
                    Some(current) => current,
                });
            }
            let Some(best) = best else {
                log::warn!("No valid symbol found");
                break;
            };

            let codes = self.arena.get(best).codes.clone();
            if !emitted.insert(codes.clone()) {
                self.arena.evict(best);
                self.active.remove(&best);
                continue;
            }

            final_pieces.push((codes.clone(), -(final_pieces.len() as f32)));
            if final_pieces.len() % 20 == 0 {
                log::info!(
                    "Added: freq={} size={} all={} active={} piece={}",
                    self.arena.get(best).freq.unwrap_or(0),
                    final_pieces.len(),
                    self.arena.cache_len(),
                    self.active.len(),
                    format_codes(&codes)
                );
            }

            // Rewrite the corpus around every occurrence. Positions iterate
            // in row order, so for overlapping occurrences of a self-pair
            // the leftmost wins and the next one finds its left slot empty.
            let positions = self.arena.get(best).positions.iter().copied().collect::<Vec<_>>();
            for pos in positions {
                let (sid, left, right) = decode_pos(pos);
                if self.slots[sid][left].is_none() {
                    continue;
                }
                debug_assert!(self.slots[sid][right].is_some());

                let next = self.next_index(sid, right);
                let prev = self.prev_index(sid, left);

                // The pairs straddling the merge point keep their position
                // entries but lose occurrences; force recomputation.
                self.reset_freq(sid, prev, Some(left), best);
                self.reset_freq(sid, Some(right), next, best);

                self.slots[sid][left] = Some(best);
                self.slots[sid][right] = None;

                self.add_new_pair(sid, prev, Some(left));
                self.add_new_pair(sid, Some(left), next);
            }

            self.arena.evict(best);
            self.active.remove(&best);
        }

        // The alphabet always makes it into the vocabulary, heaviest codes
        // first.
        let mut required = self.corpus.required_codes.iter().map(|(&c, &w)| (c, w)).collect::<Vec<_>>();
        required.sort_unstable_by(|(code_a, weight_a), (code_b, weight_b)| {
            weight_b.cmp(weight_a).then_with(|| code_a.cmp(code_b))
        });
        for (code, _) in required {
            final_pieces.push((Vec::from([code]), -(final_pieces.len() as f32)));
        }

        Ok(final_pieces)
    }

    /// Fills the per-row slots with interned unary symbols.
    fn materialize_slots(&mut self) -> Result<(), TrainError> {
        if self.corpus.rows.len() > u32::MAX as usize {
            return Err(TrainError::Internal(String::from("corpus exceeds 2^32 rows")));
        }
        self.slots = Vec::with_capacity(self.corpus.rows.len());
        for sid in 0..self.corpus.rows.len() {
            let row_len = self.corpus.rows[sid].0.len();
            if row_len > u16::MAX as usize {
                return Err(TrainError::Internal(format!(
                    "row {} has {} codes, exceeding the supported 65535",
                    sid, row_len
                )));
            }
            let mut row_slots = Vec::with_capacity(row_len);
            for index in 0..row_len {
                let code = self.corpus.rows[sid].0[index];
                let freq = self.corpus.required_codes.get(&code).copied().unwrap_or(1);
                row_slots.push(Some(self.arena.intern_unary(code, freq)));
            }
            self.slots.push(row_slots);
        }
        Ok(())
    }

    /// Returns the nearest occupied slot after `index`, if any.
    #[inline(always)]
    fn next_index(&self, sid: usize, index: usize) -> Option<usize> {
        self.slots[sid][index + 1..]
            .iter()
            .position(Option::is_some)
            .map(|offset| index + 1 + offset)
    }

    /// Returns the nearest occupied slot before `index`, if any.
    #[inline(always)]
    fn prev_index(&self, sid: usize, index: usize) -> Option<usize> {
        self.slots[sid][..index].iter().rposition(Option::is_some)
    }

    /// Interns the pair at the two slots and registers the occurrence in
    /// its inverted index and the active set.
    fn add_new_pair(&mut self, sid: usize, left: Option<usize>, right: Option<usize>) {
        let (Some(left), Some(right)) = (left, right) else {
            return;
        };
        let (Some(left_symbol), Some(right_symbol)) = (self.slots[sid][left], self.slots[sid][right])
        else {
            return;
        };
        if let Some(pair) = self.arena.intern_pair(left_symbol, right_symbol) {
            self.active.insert(pair);
            self.arena.get_mut(pair).positions.insert(encode_pos(sid, left, right));
        }
    }

    /// Marks the frequency of the pair at the two slots as stale, unless it
    /// is the pair currently being merged.
    fn reset_freq(&mut self, sid: usize, left: Option<usize>, right: Option<usize>, best: SymbolId) {
        let (Some(left), Some(right)) = (left, right) else {
            return;
        };
        let (Some(left_symbol), Some(right_symbol)) = (self.slots[sid][left], self.slots[sid][right])
        else {
            return;
        };
        if let Some(pair) = self.arena.intern_pair(left_symbol, right_symbol) {
            if pair != best {
                self.arena.get_mut(pair).freq = None;
            }
        }
    }

    /// Recomputes a stale frequency from the symbol's positions, culling
    /// entries whose slots no longer hold the constituents.
    fn compute_freq(&mut self, id: SymbolId) {
        let symbol = self.arena.get(id);
        if symbol.freq.is_some() {
            return;
        }
        let (Some(left), Some(right)) = (symbol.left, symbol.right) else {
            return;
        };
        let mut freq = 0i64;
        let mut culled = Vec::new();
        for &pos in &symbol.positions {
            let (sid, l, r) = decode_pos(pos);
            if self.slots[sid][l] == Some(left) && self.slots[sid][r] == Some(right) {
                freq += self.corpus.rows[sid].1;
            } else {
                culled.push(pos);
            }
        }
        let symbol = self.arena.get_mut(id);
        for pos in culled {
            symbol.positions.remove(&pos);
        }
        symbol.freq = Some(freq);
    }

    /// Total order over merge candidates: higher frequency first, then
    /// shorter content, then lexicographically smaller content. The
    /// fingerprint settles the residual case of content-equal twins from
    /// different merge paths, keeping selection fully deterministic.
    fn candidate_order(&self, a: SymbolId, b: SymbolId) -> Ordering {
        let symbol_a = self.arena.get(a);
        let symbol_b = self.arena.get(b);
        symbol_b
            .freq
            .unwrap_or(0)
            .cmp(&symbol_a.freq.unwrap_or(0))
            .then_with(|| symbol_a.codes.len().cmp(&symbol_b.codes.len()))
            .then_with(|| symbol_a.codes.cmp(&symbol_b.codes))
            .then_with(|| symbol_a.fingerprint.cmp(&symbol_b.fingerprint))
    }

    /// Recomputes all cached pair frequencies and selects the most frequent
    /// pairs as the new active working set.
    fn update_active_symbols(&mut self) {
        let mut candidates = self.arena.cached_pairs();
        for index in 0..candidates.len() {
            self.compute_freq(candidates[index]);
        }
        if candidates.is_empty() {
            self.active.clear();
            return;
        }

        let size = MIN_ACTIVE_SYMBOLS
            .max(self.arena.cache_len() * 5 / 100)
            .min(candidates.len());
        candidates.sort_unstable_by(|&a, &b| self.candidate_order(a, b));
        candidates.truncate(size);
        log::info!(
            "Updating active symbols. max_freq={} min_freq={}",
            self.arena.get(candidates[0]).freq.unwrap_or(0),
            self.arena.get(candidates[size - 1]).freq.unwrap_or(0)
        );
        self.active = candidates.into_iter().collect();
    }
}
