//! Text row adapters and file-based training.

use std::io::Cursor;

use codepiece::{
    Codepiece, ConfigError, DELIMITER, RowError, RowReader, RowWriter, TrainError, Trainer,
    TrainerSpec,
};

mod util;
use util::*;

#[test]
fn test_row_reader() {
    init_env();
    let reader = RowReader::new(Cursor::new("utt1 1 2 3\n\nutt2 7\n"));
    let rows = reader.collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(rows, vec![
        ("utt1".to_string(), vec![1, 2, 3]),
        ("utt2".to_string(), vec![7]),
    ]);
}

#[test]
fn test_row_reader_remaps_delimiter() {
    init_env();
    let reader = RowReader::with_delimiter(Cursor::new("utt1 10 10 # 10 10\n"), b"#");
    let rows = reader.collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(rows, vec![("utt1".to_string(), vec![10, 10, DELIMITER, 10, 10])]);
}

#[test]
fn test_row_reader_rejects_bad_tokens() {
    init_env();
    let mut reader = RowReader::new(Cursor::new("utt1 1\nutt2 x 3\n"));
    assert!(reader.next().unwrap().is_ok());
    let error = reader.next().unwrap();
    assert!(
        matches!(error, Err(RowError::InvalidCode { line: 2, ref token }) if token == "x"),
        "{:?} reports the bad token and line",
        error
    );
}

#[test]
fn test_row_writer() {
    init_env();
    let mut output = Vec::new();
    {
        let mut writer = RowWriter::new(&mut output);
        writer.write_codes("utt1", &[1, 2, 3]).unwrap();
        writer.write_pieces("utt2", &["1_2".to_string(), "3".to_string()]).unwrap();
    }
    assert_eq!(String::from_utf8(output).unwrap(), "utt1 1 2 3\nutt2 1_2 3\n");
}

#[test]
fn test_train_from_files() {
    init_env();
    let corpus_path = temp_path("corpus.txt");
    std::fs::write(&corpus_path, "u1 1 2 1 2 1 2\nu2 1 2 3\n").unwrap();
    let prefix = temp_path("toy");
    let spec = TrainerSpec {
        input: vec![corpus_path.to_string_lossy().into_owned()],
        model_prefix: prefix.to_string_lossy().into_owned(),
        ..toy_spec(5)
    };
    let definition = Trainer::new(spec).unwrap().train().unwrap();
    check_pieces(&definition, &[&[1, 2], &[1, 2, 1, 2], &[1], &[2], &[3]]);

    let model_path = prefix.with_extension("model");
    let vocab_path = prefix.with_extension("vocab");
    let processor = Codepiece::from_file(&model_path).unwrap();
    assert_eq!(processor.encode_ids(&[1, 2, 1, 2, 3]).unwrap(), vec![1, 4]);
    let vocab = std::fs::read_to_string(&vocab_path).unwrap();
    assert_eq!(vocab.lines().count(), 5);

    std::fs::remove_file(&corpus_path).unwrap();
    std::fs::remove_file(&model_path).unwrap();
    std::fs::remove_file(&vocab_path).unwrap();
}

#[test]
fn test_train_requires_input() {
    init_env();
    let trainer = Trainer::new(TrainerSpec::default()).unwrap();
    assert!(matches!(
        trainer.train(),
        Err(TrainError::InvalidConfig(ConfigError::MissingInput))
    ));
}

#[test]
fn test_train_reports_missing_file() {
    init_env();
    let spec = TrainerSpec {
        input: vec![temp_path("does-not-exist.txt").to_string_lossy().into_owned()],
        ..toy_spec(5)
    };
    let trainer = Trainer::new(spec).unwrap();
    assert!(matches!(trainer.train(), Err(TrainError::Row(RowError::Io(_)))));
}
