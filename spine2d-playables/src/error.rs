use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown animation: {name}")]
    UnknownAnimation { name: String },

    #[error("unknown bone: {name}")]
    UnknownBone { name: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },
}
