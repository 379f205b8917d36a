//! Encoder and decoder behavior.

use codepiece::{
    Codepiece, DELIMITER, DecodeError, EncodeError, InitializationError, TrainerSpec, Vocabulary,
};

mod util;
use util::*;

fn toy_processor() -> Codepiece {
    let definition = train_rows(toy_spec(5), &[&[1, 2, 1, 2, 1, 2], &[1, 2, 3]]);
    Codepiece::try_from(definition).unwrap()
}

fn processor_with(pieces: &[(&[u32], f32)]) -> Codepiece {
    let vocab =
        Vocabulary::new(pieces.iter().map(|(codes, score)| (codes.to_vec(), *score))).unwrap();
    Codepiece::new(vocab, TrainerSpec::default()).unwrap()
}

#[test]
fn test_encode_toy() {
    init_env();
    let processor = toy_processor();
    let pieces = processor.encode(&[1, 2, 1, 2, 3]).unwrap();
    let codes = pieces.iter().map(|piece| piece.codes.clone()).collect::<Vec<_>>();
    assert_eq!(codes, vec![vec![1, 2, 1, 2], vec![3]]);
    assert_eq!(processor.encode_ids(&[1, 2, 1, 2, 3]).unwrap(), vec![1, 4]);
}

#[test]
fn test_empty_input() {
    init_env();
    let processor = toy_processor();
    assert!(processor.encode(&[]).unwrap().is_empty());
    assert!(processor.decode(&[]).unwrap().is_empty());
}

#[test]
fn test_round_trip() {
    init_env();
    let processor = toy_processor();
    let inputs: &[&[u32]] = &[
        &[1],
        &[3, 3, 3],
        &[1, 2],
        &[2, 1],
        &[1, 2, 1, 2, 1, 2, 1, 2],
        &[3, 1, 2, 1, 2, 3, 1],
    ];
    for input in inputs {
        let ids = processor.encode_ids(input).unwrap();
        assert_eq!(processor.decode(&ids).unwrap(), input.to_vec(), "{:?} round-trips", input);
    }
}

#[test]
fn test_greedy_fixed_point() {
    init_env();
    let processor = toy_processor();
    let pieces = processor.encode(&[1, 2, 1, 2, 1, 2, 3, 1, 2]).unwrap();
    for pair in pieces.windows(2) {
        let mut concat = pair[0].codes.clone();
        concat.extend_from_slice(&pair[1].codes);
        assert!(
            processor.vocabulary().piece_to_id(&concat).is_none(),
            "no adjacent output pair {:?} is itself a piece",
            concat
        );
    }
}

#[test]
fn test_unknown_code_fails() {
    init_env();
    let processor = toy_processor();
    assert!(matches!(processor.encode(&[42]), Err(EncodeError::UnknownPiece(_))));
    assert!(matches!(processor.encode(&[1, 2, 42]), Err(EncodeError::UnknownPiece(_))));
}

#[test]
fn test_delimiter_splits_runs() {
    init_env();
    let processor = toy_processor();
    let split = processor.encode_ids(&[1, 2, DELIMITER, 1, 2]).unwrap();
    let mut expected = processor.encode_ids(&[1, 2]).unwrap();
    expected.extend(processor.encode_ids(&[1, 2]).unwrap());
    assert_eq!(split, expected, "runs encode independently");

    // Restoring the delimiter between the decoded runs reproduces the input.
    let left = processor.encode_ids(&[1, 2]).unwrap();
    let mut restored = processor.decode(&left).unwrap();
    restored.push(DELIMITER);
    restored.extend(processor.decode(&left).unwrap());
    assert_eq!(restored, vec![1, 2, DELIMITER, 1, 2]);
}

#[test]
fn test_higher_score_merges_first() {
    init_env();
    let processor = processor_with(&[
        (&[1], -3.0),
        (&[2], -4.0),
        (&[3], -5.0),
        (&[1, 2], -1.0),
        (&[2, 3], 0.0),
    ]);
    let pieces = processor.encode(&[1, 2, 3]).unwrap();
    let codes = pieces.iter().map(|piece| piece.codes.clone()).collect::<Vec<_>>();
    assert_eq!(codes, vec![vec![1], vec![2, 3]], "the higher-scoring merge wins");
}

#[test]
fn test_leftmost_merge_wins_on_tie() {
    init_env();
    let processor = processor_with(&[(&[1], -1.0), (&[1, 1], 0.0)]);
    let pieces = processor.encode(&[1, 1, 1]).unwrap();
    let codes = pieces.iter().map(|piece| piece.codes.clone()).collect::<Vec<_>>();
    assert_eq!(codes, vec![vec![1, 1], vec![1]], "equal scores prefer the leftmost pair");
}

#[test]
fn test_decode_invalid_id_fails() {
    init_env();
    let processor = toy_processor();
    assert!(matches!(processor.decode(&[99]), Err(DecodeError::InvalidId(99))));
}

#[test]
fn test_vocabulary_rejects_invalid_pieces() {
    init_env();
    let duplicate = Vocabulary::new([(vec![1, 2], 0.0), (vec![1, 2], -1.0)]);
    assert!(matches!(duplicate, Err(InitializationError::DuplicatePiece(_))));

    let empty = Vocabulary::new([(vec![], 0.0)]);
    assert!(matches!(empty, Err(InitializationError::EmptyPiece)));

    let delimiter = Vocabulary::new([(vec![1, DELIMITER], 0.0)]);
    assert!(matches!(delimiter, Err(InitializationError::DelimiterInPiece(_))));
}
