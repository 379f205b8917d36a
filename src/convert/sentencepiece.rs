//! Conversion from SentencePiece subword models.

use alloc::format;
use alloc::vec::Vec;

use sentencepiece_model::{SentencePieceModel, Type};

use crate::convert::ConversionError;
use crate::{CodeUnit, Definition, ModelPiece, PieceKind, TrainerSpec, format_codes};

/// Offset between piece scalars in compatibility models and the codes they
/// stand for. Exporters shift codes into the CJK block so every code
/// becomes a single printable character.
const COMPAT_CODE_OFFSET: u32 = 19968;

/// Converts a SentencePiece subword model trained on offset-shifted codes
/// into a model definition.
///
/// `data` is the raw serialized model generated by the `sentencepiece`
/// trainer. Only `Normal` pieces are imported; control and unknown entries
/// have no counterpart here. Each Unicode scalar of an imported piece is
/// mapped back to its code by subtracting the fixed offset, and scores
/// carry over unchanged.
///
/// Returns the model definition with a default training configuration, or
/// an error if the model cannot be parsed or a scalar is below the offset.
pub fn convert_sentencepiece(data: impl AsRef<[u8]>) -> Result<Definition, ConversionError> {
    let model = SentencePieceModel::from_slice(data.as_ref()).map_err(|e| {
        ConversionError::InvalidData(format!("failed to parse sentencepiece model: {:?}", e))
    })?;

    let mut pieces = Vec::new();
    for (index, piece) in model.pieces.iter().enumerate() {
        if piece.r#type() != Type::Normal {
            continue;
        }
        let text = piece
            .piece
            .as_ref()
            .ok_or_else(|| ConversionError::InvalidData(format!("piece {} has no text", index)))?;
        let codes = text
            .chars()
            .map(|c| (c as u32).checked_sub(COMPAT_CODE_OFFSET))
            .collect::<Option<Vec<CodeUnit>>>()
            .ok_or_else(|| {
                ConversionError::InvalidData(format!(
                    "piece {} contains a scalar below the code offset",
                    index
                ))
            })?;
        pieces.push(ModelPiece {
            piece: format_codes(&codes),
            score: piece.score(),
            kind:  PieceKind::Normal,
        });
    }

    Ok(Definition {
        trainer_spec: TrainerSpec::default(),
        pieces,
    })
}
