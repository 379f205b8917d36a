//! Model and vocabulary file round trips.

use codepiece::{Codepiece, Definition, DeserializationError};

mod util;
use util::*;

fn toy_definition() -> Definition {
    train_rows(toy_spec(5), &[&[1, 2, 1, 2, 1, 2], &[1, 2, 3]])
}

#[test]
fn test_slice_round_trip() {
    init_env();
    let definition = toy_definition();
    let restored = Definition::from_slice(&definition.to_vec()).unwrap();
    assert_eq!(definition, restored, "definitions are equal after a byte round trip");
}

#[test]
fn test_file_round_trip() {
    init_env();
    let definition = toy_definition();
    let path = temp_path("round-trip.model");
    definition.to_file(&path).unwrap();
    let restored = Definition::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(definition, restored, "definitions are equal after a file round trip");
}

#[test]
fn test_processor_round_trip() {
    init_env();
    let definition = toy_definition();
    let processor = Codepiece::try_from(definition).unwrap();
    let restored = Codepiece::from_slice(&processor.to_vec()).unwrap();
    assert_eq!(
        processor.encode_ids(&[1, 2, 1, 2, 3]).unwrap(),
        restored.encode_ids(&[1, 2, 1, 2, 3]).unwrap(),
        "restored processor encodes identically"
    );
}

#[test]
fn test_rejects_invalid_data() {
    init_env();
    assert!(matches!(
        Definition::from_slice(b"xx"),
        Err(DeserializationError::InvalidData(_))
    ));
    assert!(matches!(
        Definition::from_slice(b"notcodepiece data"),
        Err(DeserializationError::InvalidData(_))
    ));

    let mut bad_version = toy_definition().to_vec();
    bad_version[9] = 9;
    assert!(matches!(
        Definition::from_slice(&bad_version),
        Err(DeserializationError::InvalidData(_))
    ));
}

#[test]
fn test_vocab_file_with_scores() {
    init_env();
    let definition = toy_definition();
    let mut output = Vec::new();
    definition.vocab_to_writer(&mut output).unwrap();
    let output = String::from_utf8(output).unwrap();
    let lines = output.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), definition.pieces.len());
    assert!(lines[0].starts_with("1_2\t"), "first line is the first piece with its score");
    assert!(lines[1].starts_with("1_2_1_2\t"));
}

#[test]
fn test_vocab_file_without_scores() {
    init_env();
    let mut definition = toy_definition();
    definition.trainer_spec.vocabulary_output_piece_score = false;
    let mut output = Vec::new();
    definition.vocab_to_writer(&mut output).unwrap();
    let output = String::from_utf8(output).unwrap();
    assert_eq!(
        output.lines().collect::<Vec<_>>(),
        vec!["1_2", "1_2_1_2", "1", "2", "3"],
        "score column is omitted"
    );
}
