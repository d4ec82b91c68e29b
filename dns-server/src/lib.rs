//! Serving and querying DNS over UDP on top of the `dns` codec.

mod error;
#[cfg(test)]
mod fake_socket;
mod query;
mod reply;
mod server;
mod socket;
mod transaction;

pub use error::{Error, Result};
pub use query::{query, query_with, DEFAULT_TIMEOUT};
pub use reply::{Reply, ReplyHandle};
pub use server::{HandlerResult, Server};
pub use socket::{DatagramSocket, MAX_DATAGRAM_SIZE};
pub use transaction::Transaction;
