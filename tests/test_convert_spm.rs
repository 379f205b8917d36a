//! Conversion from SentencePiece compatibility models.

use codepiece::PieceKind;
use codepiece::convert::{ConversionError, convert_sentencepiece};

mod util;
use util::*;

const OFFSET: u32 = 19968;

fn push_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            out.push(byte | 0x80);
        } else {
            out.push(byte);
            break;
        }
    }
}

/// Serializes one `SentencePiece { piece = 1, score = 2, type = 3 }`
/// message wrapped as field 1 of the model proto.
fn push_piece(text: &str, score: f32, kind: u64, out: &mut Vec<u8>) {
    let mut body = Vec::new();
    body.push(0x0A);
    push_varint(text.len() as u64, &mut body);
    body.extend_from_slice(text.as_bytes());
    body.push(0x15);
    body.extend_from_slice(&score.to_le_bytes());
    body.push(0x18);
    push_varint(kind, &mut body);

    out.push(0x0A);
    push_varint(body.len() as u64, out);
    out.extend_from_slice(&body);
}

fn offset_text(codes: &[u32]) -> String {
    codes.iter().map(|&code| char::from_u32(OFFSET + code).unwrap()).collect()
}

const NORMAL: u64 = 1;
const UNKNOWN: u64 = 2;
const CONTROL: u64 = 3;

#[test]
fn test_convert_normal_pieces() {
    init_env();
    let mut model = Vec::new();
    push_piece("<unk>", 0.0, UNKNOWN, &mut model);
    push_piece("<s>", 0.0, CONTROL, &mut model);
    push_piece(&offset_text(&[7, 3]), -1.5, NORMAL, &mut model);
    push_piece(&offset_text(&[12, 0, 405]), -2.0, NORMAL, &mut model);

    let definition = convert_sentencepiece(&model).unwrap();
    assert_eq!(definition.pieces.len(), 2, "control and unknown entries are skipped");
    assert_eq!(definition.pieces[0].piece, "7_3");
    assert_eq!(definition.pieces[0].score, -1.5);
    assert_eq!(definition.pieces[0].kind, PieceKind::Normal);
    assert_eq!(definition.pieces[1].piece, "12_0_405");
    assert_eq!(definition.pieces[1].score, -2.0);

    let vocab = definition.vocabulary().unwrap();
    assert_eq!(vocab.piece_to_id(&[7, 3]), Some(0));
    assert_eq!(vocab.piece_to_id(&[12, 0, 405]), Some(1));
}

#[test]
fn test_convert_rejects_scalar_below_offset() {
    init_env();
    let mut model = Vec::new();
    push_piece("ab", -1.0, NORMAL, &mut model);
    assert!(matches!(convert_sentencepiece(&model), Err(ConversionError::InvalidData(_))));
}

#[test]
fn test_convert_rejects_garbage() {
    init_env();
    assert!(matches!(
        convert_sentencepiece(b"\xFF\xFF\xFF\xFF"),
        Err(ConversionError::InvalidData(_))
    ));
}
