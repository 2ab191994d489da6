use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqzError {
    #[error("Not enough memory")]
    NotEnoughMemory = 1,
    #[error("Invalid parameter")]
    InvalidParameter = 2,
    #[error("Destination buffer too small")]
    BufferTooSmall = 3,
    #[error("Data corrupted")]
    DataCorrupted = 4,
}
