use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::sync::Once;

use clap::{ArgAction, Parser};
use codepiece::convert::convert_sentencepiece;
use codepiece::{
    Codepiece, ModelType, RANDOM_SEED_UNSET, RowReader, RowWriter, Trainer, TrainerSpec,
    format_codes,
};

#[derive(Parser)]
enum Command {
    #[clap(name = "train", about = "Train a BPE model from code sequence corpora")]
    Train {
        #[arg(long, help = "Comma separated list of corpus files")]
        input: String,
        #[arg(long, default_value = "", help = "Input format, empty or `text`")]
        input_format: String,
        #[arg(long, help = "Output model prefix for `.model` and `.vocab`")]
        model_prefix: String,
        #[arg(long, default_value = "bpe", help = "Model algorithm")]
        model_type: String,
        #[arg(long, default_value_t = 8000, help = "Vocabulary size")]
        vocab_size: u32,
        #[arg(long, default_value_t = 0, help = "Maximum number of rows the trainer loads")]
        input_sentence_size: u64,
        #[arg(
            long,
            default_value_t = true,
            action = ArgAction::Set,
            help = "Randomly sample rows in advance. Valid when --input-sentence-size > 0"
        )]
        shuffle_input_sentence: bool,
        #[arg(long, default_value_t = 16, help = "Number of threads for training")]
        num_threads: u32,
        #[arg(long, default_value_t = 2, help = "Number of EM sub-iterations")]
        num_sub_iterations: u32,
        #[arg(long, default_value_t = 16, help = "Maximum length of a piece")]
        max_piece_length: u32,
        #[arg(
            long,
            default_value_t = true,
            action = ArgAction::Set,
            help = "Include the score column in the vocab file"
        )]
        vocabulary_output_piece_score: bool,
        #[arg(long, default_value = "", help = "Bytes remapped to the delimiter sentinel")]
        delimiter: String,
        #[arg(
            long,
            default_value_t = RANDOM_SEED_UNSET,
            help = "Seed value for the reservoir sampler"
        )]
        random_seed: u32,
    },
    #[clap(name = "encode", about = "Encode code sequence rows with a trained model")]
    Encode {
        #[arg(long, help = "Path to the model file")]
        model: String,
        #[arg(long, help = "Path to the input rows")]
        input: String,
        #[arg(long, help = "Path to the output rows")]
        output: String,
        #[arg(long, default_value = "piece", help = "Choose from piece or id")]
        output_format: String,
    },
    #[clap(name = "convert", about = "Convert a SentencePiece compatibility model")]
    Convert {
        #[arg(long, help = "Model file to convert")]
        input_model: String,
        #[arg(long, help = "Model prefix after conversion")]
        output_model_prefix: String,
    },
}

#[derive(Parser)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

static INIT_ENV: Once = Once::new();

pub fn init_env() {
    INIT_ENV.call_once(|| {
        simple_logger::SimpleLogger::new()
            .with_level(log::Level::Info.to_level_filter())
            .env()
            .init()
            .unwrap();
    });
}

pub fn main() {
    init_env();

    let args = Args::parse();
    match args.command {
        Command::Train {
            input,
            input_format,
            model_prefix,
            model_type,
            vocab_size,
            input_sentence_size,
            shuffle_input_sentence,
            num_threads,
            num_sub_iterations,
            max_piece_length,
            vocabulary_output_piece_score,
            delimiter,
            random_seed,
        } => {
            if input.is_empty() {
                eprintln!("--input must not be empty");
                std::process::exit(1);
            }
            if model_prefix.is_empty() {
                eprintln!("--model-prefix must not be empty");
                std::process::exit(1);
            }
            let model_type = model_type.parse::<ModelType>().unwrap_or_else(|error| {
                eprintln!("{}", error);
                std::process::exit(1);
            });
            let spec = TrainerSpec {
                input: input.split(',').map(str::to_string).collect(),
                input_format,
                model_prefix,
                model_type,
                vocab_size,
                input_sentence_size,
                shuffle_input_sentence,
                num_threads,
                num_sub_iterations,
                max_piece_length,
                vocabulary_output_piece_score,
                delimiter,
                random_seed,
            };
            let trainer = Trainer::new(spec).unwrap_or_else(|error| {
                eprintln!("{}", error);
                std::process::exit(1);
            });
            log::info!("Starting training with: {:#?}", trainer.spec());
            trainer.train().unwrap_or_else(|error| {
                eprintln!("{}", error);
                std::process::exit(1);
            });
        }
        Command::Encode {
            model,
            input,
            output,
            output_format,
        } => {
            if output_format != "piece" && output_format != "id" {
                eprintln!("--output-format should be piece or id");
                std::process::exit(1);
            }
            let processor = Codepiece::from_file(&model).unwrap_or_else(|error| {
                eprintln!("{}", error);
                std::process::exit(1);
            });
            let reader = File::open(&input).unwrap_or_else(|error| {
                eprintln!("cannot open {}: {}", input, error);
                std::process::exit(1);
            });
            let writer = File::create(&output).unwrap_or_else(|error| {
                eprintln!("cannot create {}: {}", output, error);
                std::process::exit(1);
            });
            let reader = RowReader::new(BufReader::new(reader));
            let mut writer = RowWriter::new(BufWriter::new(writer));
            for row in reader {
                let (key, codes) = row.unwrap_or_else(|error| {
                    eprintln!("{}", error);
                    std::process::exit(1);
                });
                let result = if output_format == "piece" {
                    let pieces = processor.encode(&codes).unwrap_or_else(|error| {
                        eprintln!("{}", error);
                        std::process::exit(1);
                    });
                    let pieces =
                        pieces.iter().map(|piece| format_codes(&piece.codes)).collect::<Vec<_>>();
                    writer.write_pieces(&key, &pieces)
                } else {
                    let ids = processor.encode_ids(&codes).unwrap_or_else(|error| {
                        eprintln!("{}", error);
                        std::process::exit(1);
                    });
                    writer.write_codes(&key, &ids)
                };
                result.unwrap_or_else(|error| {
                    eprintln!("{}", error);
                    std::process::exit(1);
                });
            }
            writer.flush().unwrap_or_else(|error| {
                eprintln!("{}", error);
                std::process::exit(1);
            });
        }
        Command::Convert {
            input_model,
            output_model_prefix,
        } => {
            if input_model.is_empty() {
                eprintln!("--input-model must not be empty");
                std::process::exit(1);
            }
            if output_model_prefix.is_empty() {
                eprintln!("--output-model-prefix must not be empty");
                std::process::exit(1);
            }
            let data = std::fs::read(&input_model).unwrap_or_else(|error| {
                eprintln!("cannot read {}: {}", input_model, error);
                std::process::exit(1);
            });
            let definition = convert_sentencepiece(&data).unwrap_or_else(|error| {
                eprintln!("{}", error);
                std::process::exit(1);
            });
            definition.to_file(format!("{}.model", output_model_prefix)).unwrap_or_else(|error| {
                eprintln!("{}", error);
                std::process::exit(1);
            });
            definition
                .vocab_to_file(format!("{}.vocab", output_model_prefix))
                .unwrap_or_else(|error| {
                    eprintln!("{}", error);
                    std::process::exit(1);
                });
            log::info!("Converted {} pieces from {}", definition.pieces.len(), input_model);
        }
    }
}
