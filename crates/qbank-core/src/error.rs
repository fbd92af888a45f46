use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed offset: {0}")]
    MalformedOffset(String),

    #[error("offset arithmetic overflowed: {0}")]
    OffsetOverflow(String),

    #[error("invalid questionnaire bank '{bank_id}': {reason}")]
    InvalidBank { bank_id: String, reason: String },

    #[error("duplicate questionnaire bank: {0}")]
    DuplicateBank(String),

    #[error("unknown instrument '{instrument}' in bank '{bank_id}'")]
    UnknownInstrument { bank_id: String, instrument: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<jiff::Error> for CoreError {
    fn from(err: jiff::Error) -> Self {
        CoreError::OffsetOverflow(err.to_string())
    }
}
