use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed DNS message: {0}")]
    Format(#[from] dns::Error),

    #[error("transaction was already answered")]
    AlreadySent,

    #[error("no answer from the DNS server within {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("reply writer has shut down")]
    ReplyChannelClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
