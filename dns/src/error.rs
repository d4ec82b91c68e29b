use thiserror::Error;

/// A malformed, truncated or unencodable DNS message.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("DNS packet was truncated")]
    Truncated,

    #[error("DNS name contains illegal characters ({0})")]
    IllegalCharacters(String),

    #[error("DNS name can't be longer than 253 characters")]
    NameTooLong,

    #[error("DNS labels must be between 1 and 63 characters")]
    BadLabelLength,

    #[error("DNS packet contains recursive pointers")]
    PointerDepth,

    #[error("invalid {0} record")]
    InvalidRecord(&'static str),

    #[error("TXT data can't be longer than 255 bytes")]
    TxtTooLong,

    #[error("record data can't be longer than 65535 bytes")]
    RecordTooLong,

    #[error("a section can't hold more than 65535 entries")]
    TooManyRecords,
}

// Every read happens on an in-memory slice and every write on a Vec, so the
// only error byteorder can hand back is running off the end of the input.
impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Error::Truncated
    }
}

pub type Result<T> = std::result::Result<T, Error>;
