#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use console::style;

use codepiece::{Definition, PieceCodes, Trainer, TrainerSpec, parse_codes};

pub fn init_env() {
    static INIT_ENV: Once = Once::new();
    INIT_ENV.call_once(|| {
        simple_logger::init_with_level(log::Level::Debug).unwrap();
    });
}

pub fn toy_spec(vocab_size: u32) -> TrainerSpec {
    TrainerSpec {
        vocab_size,
        ..TrainerSpec::default()
    }
}

pub fn train_rows(spec: TrainerSpec, rows: &[&[u32]]) -> Definition {
    let trainer = Trainer::new(spec).unwrap();
    trainer.train_from_rows(rows.iter().map(|row| row.to_vec())).unwrap()
}

pub fn definition_codes(definition: &Definition) -> Vec<PieceCodes> {
    definition.pieces.iter().map(|piece| parse_codes(&piece.piece).unwrap()).collect()
}

pub fn check_pieces(definition: &Definition, expected: &[&[u32]]) {
    let actual = definition_codes(definition);
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        if a.as_slice() != *e {
            let line = style(format!("piece mismatch #{}", i)).on_red();
            eprintln!("{}: {:?}, expected {:?}", line, a, e);
        }
    }
    assert_eq!(actual.len(), expected.len(), "piece counts are equal");
    assert!(
        actual.iter().zip(expected.iter()).all(|(a, e)| a.as_slice() == *e),
        "pieces match"
    );
}

/// Deterministic corpus generator for property tests.
pub fn pseudo_rows(count: usize, alphabet: u32) -> Vec<PieceCodes> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    let mut step = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        state >> 33
    };
    let mut rows = Vec::with_capacity(count);
    for _ in 0..count {
        let len = 5 + step() % 20;
        let mut row = Vec::with_capacity(len as usize);
        for _ in 0..len {
            row.push((step() % alphabet as u64) as u32);
        }
        rows.push(row);
    }
    rows
}

pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("codepiece-test-{}-{}", std::process::id(), name))
}
