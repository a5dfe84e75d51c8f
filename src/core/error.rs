//! Error types for the event-vol engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Pricing error: {0}")]
    Pricing(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

pub type EvResult<T> = Result<T, EvError>;

impl EvError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn pricing(msg: impl Into<String>) -> Self {
        Self::Pricing(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }
}
