use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Unknown link type: {0}")]
    UnknownLinkType(String),
}
