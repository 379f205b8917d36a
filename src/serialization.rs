//! Serialization and deserialization of model definitions.

#[cfg(feature = "std")]
use std::fs::File;
#[cfg(feature = "std")]
use std::io::{Read, Result as IOResult, Write};

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::{Codepiece, Definition, InitializationError};

const MAGIC: &[u8] = b"codepiece";
const VERSION: &[u8] = &[0, 1];

/// Errors encountered when deserializing a model definition.
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum DeserializationError {
    /// The data is invalid. See the error message for more information.
    #[cfg_attr(feature = "std", error("{0}"))]
    InvalidData(String),
    /// The processor failed to initialize.
    #[cfg_attr(feature = "std", error("{0}"))]
    InitializationError(InitializationError),
    /// Reading the data failed.
    #[cfg(feature = "std")]
    #[error("{0}")]
    IOError(#[from] std::io::Error),
}
impl From<InitializationError> for DeserializationError {
    fn from(e: InitializationError) -> Self {
        Self::InitializationError(e)
    }
}

impl Definition {
    /// Deserializes the model definition from a reader.
    #[cfg(feature = "std")]
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DeserializationError> {
        let data = {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            data
        };
        Self::from_slice(&data)
    }

    /// Deserializes the model definition from a file.
    #[cfg(feature = "std")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, DeserializationError> {
        let mut file = File::open(path)?;
        Self::from_reader(&mut file)
    }

    /// Deserializes the model definition from bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, DeserializationError> {
        if slice.len() < MAGIC.len() + VERSION.len() {
            return Err(DeserializationError::InvalidData("invalid size".to_string()));
        }
        if &slice[..MAGIC.len()] != MAGIC {
            return Err(DeserializationError::InvalidData("invalid magic".to_string()));
        }
        if &slice[MAGIC.len()..MAGIC.len() + VERSION.len()] != VERSION {
            return Err(DeserializationError::InvalidData("invalid version".to_string()));
        }
        let definition = postcard::from_bytes(&slice[MAGIC.len() + VERSION.len()..])
            .map_err(|e| DeserializationError::InvalidData(e.to_string()))?;
        Ok(definition)
    }

    /// Serializes the model definition to a writer.
    #[cfg(feature = "std")]
    pub fn to_writer<W: Write>(&self, writer: &mut W) -> IOResult<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(VERSION)?;
        let data = postcard::to_allocvec(self).unwrap();
        writer.write_all(&data)?;
        Ok(())
    }

    /// Serializes the model definition to a file.
    #[cfg(feature = "std")]
    pub fn to_file<P: AsRef<std::path::Path>>(&self, path: P) -> IOResult<()> {
        let mut file = File::create(path)?;
        self.to_writer(&mut file)
    }

    /// Serializes the model definition to bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        let data = postcard::to_allocvec(self).unwrap();
        let mut vec = Vec::with_capacity(MAGIC.len() + VERSION.len() + data.len());
        vec.extend_from_slice(MAGIC);
        vec.extend_from_slice(VERSION);
        vec.extend_from_slice(&data);
        vec
    }

    /// Writes the vocabulary file: one piece per line, with a tab-separated
    /// score column when `vocabulary_output_piece_score` is set.
    #[cfg(feature = "std")]
    pub fn vocab_to_writer<W: Write>(&self, writer: &mut W) -> IOResult<()> {
        if self.trainer_spec.vocabulary_output_piece_score {
            for piece in &self.pieces {
                writeln!(writer, "{}\t{}", piece.piece, piece.score)?;
            }
        } else {
            for piece in &self.pieces {
                writeln!(writer, "{}", piece.piece)?;
            }
        }
        Ok(())
    }

    /// Writes the vocabulary file.
    ///
    /// See [`Definition::vocab_to_writer`] for the format.
    #[cfg(feature = "std")]
    pub fn vocab_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> IOResult<()> {
        let mut file = File::create(path)?;
        self.vocab_to_writer(&mut file)
    }
}

impl Codepiece {
    /// Deserializes a model definition from a reader and initializes the
    /// processor. See [`Codepiece::from_definition`] for more details.
    #[cfg(feature = "std")]
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DeserializationError> {
        let definition = Definition::from_reader(reader)?;
        Ok(Self::from_definition(definition)?)
    }

    /// Deserializes a model definition from a file and initializes the
    /// processor. See [`Codepiece::from_definition`] for more details.
    #[cfg(feature = "std")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, DeserializationError> {
        let definition = Definition::from_file(path)?;
        Ok(Self::from_definition(definition)?)
    }

    /// Deserializes a model definition from bytes and initializes the
    /// processor. See [`Codepiece::from_definition`] for more details.
    pub fn from_slice(slice: &[u8]) -> Result<Self, DeserializationError> {
        let definition = Definition::from_slice(slice)?;
        Ok(Self::from_definition(definition)?)
    }

    /// Creates a definition from this processor and serializes it to a
    /// writer. See [`Codepiece::to_definition`] for more details.
    #[cfg(feature = "std")]
    pub fn to_writer<W: Write>(&self, writer: &mut W) -> IOResult<()> {
        let definition = self.to_definition();
        definition.to_writer(writer)
    }

    /// Creates a definition from this processor and serializes it to a
    /// file. See [`Codepiece::to_definition`] for more details.
    #[cfg(feature = "std")]
    pub fn to_file<P: AsRef<std::path::Path>>(&self, path: P) -> IOResult<()> {
        let definition = self.to_definition();
        definition.to_file(path)
    }

    /// Creates a definition from this processor and serializes it to
    /// bytes. See [`Codepiece::to_definition`] for more details.
    pub fn to_vec(&self) -> Vec<u8> {
        let definition = self.to_definition();
        definition.to_vec()
    }
}
