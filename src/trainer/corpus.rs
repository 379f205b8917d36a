//! Corpus model and row sampling.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{CodeUnit, DELIMITER, PieceCodes};

/// Row of delimiter-free codes with its aggregate weight.
pub(crate) type Row = (PieceCodes, i64);

/// Corpora larger than this trigger a sampling recommendation.
const TOO_MANY_ROWS: usize = 1_000_000;

/// Deterministic 64-bit generator (splitmix64).
///
/// The reservoir subset must be bit-identical across runs and builds for
/// the same seed, so the generator is pinned here instead of relying on an
/// external source whose stream may change between versions.
struct SplitMix64 {
    state: u64,
}
impl SplitMix64 {
    #[inline(always)]
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    #[inline(always)]
    fn next_below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

/// Uniform reservoir over a stream of rows (algorithm R).
struct ReservoirSampler {
    rows:     Vec<PieceCodes>,
    capacity: usize,
    total:    u64,
    rng:      SplitMix64,
}
impl ReservoirSampler {
    fn new(capacity: usize, seed: u64) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            capacity,
            total: 0,
            rng: SplitMix64::new(seed),
        }
    }

    fn add(&mut self, row: PieceCodes) {
        self.total += 1;
        if self.rows.len() < self.capacity {
            self.rows.push(row);
        } else {
            let slot = self.rng.next_below(self.total);
            if (slot as usize) < self.capacity {
                self.rows[slot as usize] = row;
            }
        }
    }
}

/// Loaded corpus: weighted rows plus the per-code aggregate weights of the
/// alphabet.
#[derive(Debug)]
pub(crate) struct Corpus {
    pub rows: Vec<Row>,
    pub required_codes: HashMap<CodeUnit, i64>,
}
impl Corpus {
    /// Loads rows from the iterator, applying the sentence cap.
    ///
    /// With `shuffle`, rows are reservoir-sampled down to the cap using the
    /// seeded generator; without it, reading stops once the cap is reached.
    /// Empty rows are skipped. Each loaded row gets weight 1, and
    /// `required_codes` accumulates the row weight once per occurrence of
    /// every non-delimiter code.
    #[inline(never)]
    pub fn load(
        rows: impl IntoIterator<Item = PieceCodes>, input_sentence_size: u64, shuffle: bool,
        seed: u64,
    ) -> Self {
        let rows = rows.into_iter().filter(|row| !row.is_empty());
        let (loaded, total) = if input_sentence_size == 0 {
            let loaded = rows.collect::<Vec<_>>();
            let total = loaded.len() as u64;
            (loaded, total)
        } else if shuffle {
            let mut sampler = ReservoirSampler::new(input_sentence_size as usize, seed);
            for row in rows {
                sampler.add(row);
            }
            (sampler.rows, sampler.total)
        } else {
            log::info!(
                "First {} sentences are selected. Remaining sentences are discarded.",
                input_sentence_size
            );
            let loaded = rows.take(input_sentence_size as usize).collect::<Vec<_>>();
            let total = loaded.len() as u64;
            (loaded, total)
        };
        if loaded.len() as u64 == total {
            log::info!("Loaded all {} sentences", loaded.len());
        } else {
            log::info!("Sampled {} sentences from {} sentences", loaded.len(), total);
        }
        if loaded.len() > TOO_MANY_ROWS {
            log::warn!(
                "Too many sentences are loaded! ({}), which may slow down training. Consider \
                 input_sentence_size and shuffle_input_sentence to randomly sample a subset.",
                loaded.len()
            );
        }

        let mut required_codes = HashMap::new();
        let weight = 1i64;
        for row in &loaded {
            for &code in row {
                if code == DELIMITER {
                    continue;
                }
                *required_codes.entry(code).or_insert(0) += weight;
            }
        }
        log::info!("Alphabet size={}", required_codes.len());

        Self {
            rows: loaded.into_iter().map(|row| (row, weight)).collect(),
            required_codes,
        }
    }

    /// Splits every row on the delimiter sentinel and replaces the corpus
    /// with the resulting runs, grouping identical runs and summing their
    /// weights.
    ///
    /// The grouped rows are sorted by descending weight with an ascending
    /// lexicographic tie-break, which fixes row ids deterministically.
    #[inline(never)]
    pub fn split_on_delimiter(&mut self) {
        log::info!("Splitting {} sentences on the delimiter", self.rows.len());
        let mut runs = HashMap::<PieceCodes, i64>::new();
        for (codes, weight) in self.rows.drain(..) {
            for run in codes.split(|&code| code == DELIMITER) {
                if run.is_empty() {
                    continue;
                }
                *runs.entry(run.to_vec()).or_insert(0) += weight;
            }
        }
        let mut rows = runs.into_iter().collect::<Vec<_>>();
        rows.sort_unstable_by(|(codes_a, weight_a), (codes_b, weight_b)| {
            weight_b.cmp(weight_a).then_with(|| codes_a.cmp(codes_b))
        });
        self.rows = rows;
        log::info!("Done! {} rows", self.rows.len());
    }
}
