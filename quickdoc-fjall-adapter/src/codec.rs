use quickdoc::errors::{ErrorKind, QuickDocError};
use quickdoc::Record;
use thiserror::Error;

/// Failure to turn a [Record] into bytes or back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordCodecError {
    #[error("Record encoding failed: {0}")]
    Encode(String),
    #[error("Record decoding failed: {0}")]
    Decode(String),
    #[error("Trailing bytes after record: {0} of {1} consumed")]
    TrailingBytes(usize, usize),
}

impl From<RecordCodecError> for QuickDocError {
    fn from(err: RecordCodecError) -> Self {
        log::error!("{}", err);
        QuickDocError::new(&err.to_string(), ErrorKind::ObjectMappingError)
    }
}

pub type RecordCodecResult<T> = Result<T, RecordCodecError>;

pub(crate) fn encode_record(record: &Record) -> RecordCodecResult<Vec<u8>> {
    bincode::serde::encode_to_vec(record, bincode::config::legacy())
        .map_err(|e| RecordCodecError::Encode(e.to_string()))
}

pub(crate) fn decode_record(bytes: &[u8]) -> RecordCodecResult<Record> {
    let (record, consumed): (Record, usize) =
        bincode::serde::decode_from_slice(bytes, bincode::config::legacy())
            .map_err(|e| RecordCodecError::Decode(e.to_string()))?;
    if consumed != bytes.len() {
        return Err(RecordCodecError::TrailingBytes(consumed, bytes.len()));
    }
    Ok(record)
}
