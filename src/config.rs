//! Training configuration.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Display;
use core::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Model algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
#[cfg_attr(feature = "serialization", derive(Deserialize, Serialize))]
pub enum ModelType {
    /// Greedy byte-pair encoding over code sequences.
    #[default]
    Bpe,
}
impl Display for ModelType {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Bpe => f.write_str("bpe"),
        }
    }
}
impl FromStr for ModelType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "bpe" => Ok(Self::Bpe),
            other => Err(ConfigError::UnsupportedModelType(String::from(other))),
        }
    }
}

/// Sentinel for an unset `random_seed`.
pub const RANDOM_SEED_UNSET: u32 = u32::MAX;

/// Seed used by the reservoir sampler when `random_seed` is unset.
const DEFAULT_RESERVOIR_SEED: u64 = 12345678;

/// Errors returned when the training configuration fails to validate.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ConfigError {
    /// The vocabulary size must be positive.
    #[cfg_attr(feature = "std", error("vocab_size must be positive"))]
    InvalidVocabSize,
    /// The vocabulary size is smaller than the corpus alphabet.
    #[cfg_attr(
        feature = "std",
        error("vocab_size {vocab_size} is smaller than the corpus alphabet size {alphabet_size}")
    )]
    VocabSizeTooSmall {
        vocab_size:    u32,
        alphabet_size: usize,
    },
    /// The thread count must be between 1 and 1024.
    #[cfg_attr(feature = "std", error("num_threads {0} is out of range 1..=1024"))]
    InvalidNumThreads(u32),
    /// The sub-iteration count must be between 1 and 10.
    #[cfg_attr(feature = "std", error("num_sub_iterations {0} is out of range 1..=10"))]
    InvalidNumSubIterations(u32),
    /// The sentence cap must be 0 (unlimited) or greater than 100.
    #[cfg_attr(feature = "std", error("input_sentence_size {0} must be 0 or greater than 100"))]
    InvalidInputSentenceSize(u64),
    /// Only the empty or `text` input format is supported.
    #[cfg_attr(feature = "std", error("unsupported input format {0:?}"))]
    UnsupportedInputFormat(String),
    /// Only the `bpe` model type is supported.
    #[cfg_attr(feature = "std", error("unsupported model type {0:?}"))]
    UnsupportedModelType(String),
    /// Training requires at least one input file.
    #[cfg_attr(feature = "std", error("no input files specified"))]
    MissingInput,
}

/// Training configuration.
///
/// Carried in the model file alongside the learned pieces, so a trained
/// model records the settings that produced it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Deserialize, Serialize))]
pub struct TrainerSpec {
    /// Corpus file paths.
    pub input: Vec<String>,
    /// Input format. Empty or `text`.
    pub input_format: String,
    /// Output file stem for `.model` and `.vocab`.
    pub model_prefix: String,
    /// Model algorithm.
    pub model_type: ModelType,
    /// Final vocabulary size, including the single-code fallback pieces.
    pub vocab_size: u32,
    /// Maximum number of rows the trainer loads. 0 loads everything.
    pub input_sentence_size: u64,
    /// Reservoir-sample rows when `input_sentence_size` caps the corpus.
    pub shuffle_input_sentence: bool,
    /// Thread count. Validated for forward compatibility; training is serial.
    pub num_threads: u32,
    /// Sub-iteration count. Reserved for future model types; unused by BPE.
    pub num_sub_iterations: u32,
    /// Upper bound on piece length in code units.
    pub max_piece_length: u32,
    /// Include the score column in the vocabulary file.
    pub vocabulary_output_piece_score: bool,
    /// Bytes remapped to the delimiter sentinel at load time.
    pub delimiter: String,
    /// Seed for the reservoir sampler. `RANDOM_SEED_UNSET` uses the default.
    pub random_seed: u32,
}
impl Default for TrainerSpec {
    fn default() -> Self {
        Self {
            input: Vec::new(),
            input_format: String::new(),
            model_prefix: String::new(),
            model_type: ModelType::Bpe,
            vocab_size: 8000,
            input_sentence_size: 0,
            shuffle_input_sentence: true,
            num_threads: 16,
            num_sub_iterations: 2,
            max_piece_length: 16,
            vocabulary_output_piece_score: true,
            delimiter: String::new(),
            random_seed: RANDOM_SEED_UNSET,
        }
    }
}
impl TrainerSpec {
    /// Validates the configuration.
    ///
    /// Returns an error if any option is out of its supported range.
    #[inline(never)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vocab_size == 0 {
            return Err(ConfigError::InvalidVocabSize);
        }
        if !(1..=1024).contains(&self.num_threads) {
            return Err(ConfigError::InvalidNumThreads(self.num_threads));
        }
        if !(1..=10).contains(&self.num_sub_iterations) {
            return Err(ConfigError::InvalidNumSubIterations(self.num_sub_iterations));
        }
        if self.input_sentence_size != 0 && self.input_sentence_size <= 100 {
            return Err(ConfigError::InvalidInputSentenceSize(self.input_sentence_size));
        }
        if !self.input_format.is_empty() && self.input_format != "text" {
            return Err(ConfigError::UnsupportedInputFormat(self.input_format.clone()));
        }
        Ok(())
    }

    /// Bytes remapped to the delimiter sentinel during corpus loading.
    #[inline(always)]
    pub fn delimiter_bytes(&self) -> &[u8] {
        self.delimiter.as_bytes()
    }

    /// Seed for the reservoir sampler.
    #[inline(always)]
    pub fn reservoir_seed(&self) -> u64 {
        if self.random_seed == RANDOM_SEED_UNSET {
            DEFAULT_RESERVOIR_SEED
        } else {
            self.random_seed as u64
        }
    }
}
