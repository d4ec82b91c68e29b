use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::socket::DatagramSocket;

/// One serialized response and where it goes.
#[derive(Debug, Clone)]
pub struct Reply {
    pub peer: SocketAddr,
    pub bytes: Bytes,
}

/// Queues replies for the task that owns the socket's send side.
///
/// Replies come from the listener and from passthrough tasks at the same
/// time; funnelling them through one writer keeps every datagram whole.
#[derive(Clone, Debug)]
pub struct ReplyHandle {
    sender: mpsc::UnboundedSender<Reply>,
}

impl ReplyHandle {
    /// A handle whose replies land in the returned receiver instead of a
    /// socket.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Reply>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Starts the writer for `socket`. It stops once every clone of the
    /// handle is gone, so replies still owed by passthrough tasks get sent
    /// after the listener stops.
    pub fn spawn<S: DatagramSocket>(socket: Arc<S>) -> (Self, JoinHandle<()>) {
        let (handle, receiver) = Self::channel();
        let writer = tokio::spawn(run_writer(socket, receiver));

        (handle, writer)
    }

    pub fn send(&self, peer: SocketAddr, bytes: Bytes) -> Result<()> {
        self.sender
            .send(Reply { peer, bytes })
            .map_err(|_| Error::ReplyChannelClosed)
    }
}

async fn run_writer<S: DatagramSocket>(socket: Arc<S>, mut receiver: mpsc::UnboundedReceiver<Reply>) {
    while let Some(reply) = receiver.recv().await {
        match socket.send_to(&reply.bytes, reply.peer).await {
            Ok(size) => tracing::debug!("sent {} byte reply to {}", size, reply.peer),
            Err(e) => tracing::warn!("failed to send reply to {}: {}", reply.peer, e),
        }
    }

    tracing::debug!("reply writer finished");
}
