//! Model definition format.

use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::{
    Codepiece, InitializationError, PieceScore, TrainerSpec, Vocabulary, parse_codes,
};

/// Kind of a model piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
#[cfg_attr(feature = "serialization", derive(Deserialize, Serialize))]
pub enum PieceKind {
    /// Regular learned piece.
    #[default]
    Normal,
}

/// Piece entry of a model definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Deserialize, Serialize))]
pub struct ModelPiece {
    /// Underscore-joined code sequence, e.g. `12_7_405`.
    pub piece: String,
    /// Piece score maximized by the encoder.
    pub score: PieceScore,
    /// Piece kind.
    pub kind:  PieceKind,
}

/// Model definition.
///
/// The logical content of a model file: the learned pieces in id order and
/// the configuration that produced them. Used for initializing the
/// processor and for serialization and deserialization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Deserialize, Serialize))]
pub struct Definition {
    /// The configuration the model was trained with.
    pub trainer_spec: TrainerSpec,
    /// Learned pieces in id order.
    pub pieces: Vec<ModelPiece>,
}
impl Definition {
    /// Builds the frozen vocabulary from the stored pieces.
    ///
    /// Returns an error if a piece string is malformed, or a piece is
    /// empty, contains the delimiter sentinel or occurs more than once.
    #[inline(never)]
    pub fn vocabulary(&self) -> Result<Vocabulary, InitializationError> {
        let mut pieces = Vec::<(Vec<_>, PieceScore)>::with_capacity(self.pieces.len());
        for entry in &self.pieces {
            let codes = parse_codes(&entry.piece)
                .ok_or_else(|| InitializationError::MalformedPiece(entry.piece.clone()))?;
            pieces.push((codes, entry.score));
        }
        Vocabulary::new(pieces)
    }
}

impl TryFrom<Definition> for Codepiece {
    type Error = InitializationError;

    fn try_from(value: Definition) -> Result<Self, Self::Error> {
        Codepiece::from_definition(value)
    }
}

impl From<Codepiece> for Definition {
    fn from(value: Codepiece) -> Self {
        value.to_definition()
    }
}

impl Codepiece {
    /// Creates a processor from the given definition.
    ///
    /// See [`Definition`] and [`Codepiece::new`] for more details.
    #[inline(always)]
    pub fn from_definition(definition: Definition) -> Result<Self, InitializationError> {
        let vocab = definition.vocabulary()?;
        Codepiece::new(vocab, definition.trainer_spec)
    }

    /// Creates a definition from this processor.
    ///
    /// The definition can be used for serialization and initializing the
    /// processor with [`Codepiece::from_definition`].
    #[inline(never)]
    pub fn to_definition(&self) -> Definition {
        let pieces = self
            .vocabulary()
            .iter()
            .map(|(codes, score)| ModelPiece {
                piece: crate::format_codes(codes),
                score,
                kind: PieceKind::Normal,
            })
            .collect();
        Definition {
            trainer_spec: self.spec().clone(),
            pieces,
        }
    }
}
