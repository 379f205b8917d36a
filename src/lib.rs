//! **BPE tokenizer and trainer for discrete code sequences.**
//!
//! Learns and applies byte-pair encoding over sequences of non-negative
//! integer codes, such as the codebook indices produced by speech
//! self-supervised models. Usable in native and embedded environments.
//!
//! # Overview
//!
//! Codepiece discovers a vocabulary of code-sequence *pieces* that greedily
//! compress a training corpus, persists it as a model file, and segments
//! new code sequences into pieces from that vocabulary. Pieces are never
//! strings; the alphabet is an open set of `u32` codes.
//!
//! See [`Trainer`] for training and [`Codepiece`] for encoding and
//! decoding.
//!
//! # Examples
//!
//! ### Training a model
//! ```
//! use codepiece::{Trainer, TrainerSpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = TrainerSpec {
//!     vocab_size: 5,
//!     ..TrainerSpec::default()
//! };
//! let trainer = Trainer::new(spec)?;
//! let definition = trainer.train_from_rows([vec![1, 2, 1, 2, 1, 2], vec![1, 2, 3]])?;
//! assert_eq!(definition.pieces.len(), 5);
//! # Ok(())
//! # }
//! ```
//!
//! ### Encoding and decoding
//! ```
//! # use codepiece::{Codepiece, Trainer, TrainerSpec};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let spec = TrainerSpec {
//! #     vocab_size: 5,
//! #     ..TrainerSpec::default()
//! # };
//! # let definition =
//! #     Trainer::new(spec)?.train_from_rows([vec![1, 2, 1, 2, 1, 2], vec![1, 2, 3]])?;
//! let processor = Codepiece::try_from(definition)?;
//! let ids = processor.encode_ids(&[1, 2, 1, 2, 3])?;
//! assert_eq!(processor.decode(&ids)?, vec![1, 2, 1, 2, 3]);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo features
//!
//! ### Default features
//!
//! - `std`: Enables standard library features, including training from
//!   corpus files and reading and writing model files.
//! - `serialization`: Enables serialization and deserialization of model
//!   definitions.
//! - `convert`: Enables conversion from external SentencePiece subword
//!   models trained on offset-shifted codes.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod config;
mod definition;
mod encoder;
mod piece;
mod trainer;
mod vocab;

#[cfg(feature = "std")]
mod io;

#[cfg(feature = "serialization")]
mod serialization;

#[cfg(feature = "convert")]
pub mod convert;

use alloc::string::String;
use alloc::vec::Vec;

pub use crate::config::*;
pub use crate::definition::*;
pub use crate::encoder::EncodeError;
pub use crate::piece::*;
pub use crate::trainer::*;
pub use crate::vocab::*;

#[cfg(feature = "std")]
pub use crate::io::*;

#[cfg(feature = "serialization")]
pub use crate::serialization::*;

/// Errors encountered during initialization.
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum InitializationError {
    /// The configuration failed to validate.
    #[cfg_attr(feature = "std", error("invalid config: {0}"))]
    InvalidConfig(ConfigError),
    /// A piece is empty.
    #[cfg_attr(feature = "std", error("piece must not be empty"))]
    EmptyPiece,
    /// A piece contains the delimiter sentinel.
    #[cfg_attr(feature = "std", error("piece {0} contains the delimiter sentinel"))]
    DelimiterInPiece(String),
    /// A piece occurs more than once.
    #[cfg_attr(feature = "std", error("piece {0} is already defined"))]
    DuplicatePiece(String),
    /// A stored piece string could not be parsed.
    #[cfg_attr(feature = "std", error("malformed piece string {0:?}"))]
    MalformedPiece(String),
}
impl From<ConfigError> for InitializationError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e)
    }
}

/// Errors encountered during decoding.
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum DecodeError {
    /// A piece id is out of range.
    #[cfg_attr(feature = "std", error("invalid piece id {0}"))]
    InvalidId(PieceId),
}

/// Codepiece processor.
///
/// Segments code sequences into pieces from a frozen vocabulary and
/// restores code sequences from piece ids.
#[derive(Debug, Clone)]
pub struct Codepiece {
    vocab: Vocabulary,
    spec:  TrainerSpec,
}
impl Codepiece {
    /// Creates a processor from a vocabulary and the configuration it was
    /// trained with.
    ///
    /// Returns an error if the configuration fails to validate.
    #[inline(never)]
    pub fn new(vocab: Vocabulary, spec: TrainerSpec) -> Result<Self, InitializationError> {
        spec.validate()?;
        Ok(Self { vocab, spec })
    }

    /// Returns the vocabulary.
    #[inline(always)]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Returns the training configuration carried by the model.
    #[inline(always)]
    pub fn spec(&self) -> &TrainerSpec {
        &self.spec
    }

    /// Encodes the given code sequence into a sequence of pieces.
    ///
    /// The input is split on the delimiter sentinel and each run is encoded
    /// independently; delimiters produce no output piece. The concatenation
    /// of the returned piece contents equals the input with delimiters
    /// removed.
    ///
    /// Returns an error if a code outside the trained alphabet appears.
    #[inline(never)]
    pub fn encode(&self, input: &[CodeUnit]) -> Result<Pieces, EncodeError> {
        let mut output = Pieces::new();
        for run in input.split(|&code| code == DELIMITER) {
            output.extend(encoder::encode_run(&self.vocab, run)?);
        }
        Ok(output)
    }

    /// Encodes the given code sequence into a sequence of piece ids.
    ///
    /// See [`Codepiece::encode`] for the delimiter handling.
    #[inline(never)]
    pub fn encode_ids(&self, input: &[CodeUnit]) -> Result<Vec<PieceId>, EncodeError> {
        Ok(self.encode(input)?.into_iter().map(|piece| piece.id).collect())
    }

    /// Decodes the given piece ids back into a code sequence.
    ///
    /// Returns an error if an id is outside the vocabulary.
    #[inline(never)]
    pub fn decode(&self, ids: &[PieceId]) -> Result<Vec<CodeUnit>, DecodeError> {
        let mut output = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            let codes = self.vocab.id_to_piece(id).ok_or(DecodeError::InvalidId(id))?;
            output.extend_from_slice(codes);
        }
        Ok(output)
    }

    /// Concatenates piece contents back into a code sequence.
    #[inline(never)]
    pub fn decode_pieces(&self, pieces: &[PieceCodes]) -> Vec<CodeUnit> {
        let mut output = Vec::with_capacity(pieces.len() * 2);
        for piece in pieces {
            output.extend_from_slice(piece);
        }
        output
    }
}
