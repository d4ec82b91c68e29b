//! An in-memory [`DatagramSocket`] for tests.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::sync::{mpsc, Mutex};

use crate::socket::DatagramSocket;

pub(crate) type Datagram = (Vec<u8>, SocketAddr);

/// Hands out the queued datagrams in order, then blocks forever. Everything
/// sent through it shows up on the receiver returned by [`FakeSocket::new`].
pub(crate) struct FakeSocket {
    incoming: Mutex<mpsc::UnboundedReceiver<Datagram>>,
    outgoing: mpsc::UnboundedSender<Datagram>,
}

impl FakeSocket {
    pub(crate) fn new(incoming: Vec<Datagram>) -> (Self, mpsc::UnboundedReceiver<Datagram>) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        for datagram in incoming {
            let _ = in_tx.send(datagram);
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let socket = Self {
            incoming: Mutex::new(in_rx),
            outgoing: out_tx,
        };

        (socket, out_rx)
    }
}

impl DatagramSocket for FakeSocket {
    fn recv_from<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send + 'a {
        async move {
            let next = self.incoming.lock().await.recv().await;
            match next {
                Some((data, from)) => {
                    let size = data.len().min(buf.len());
                    buf[..size].copy_from_slice(&data[..size]);
                    Ok((size, from))
                }
                None => std::future::pending().await,
            }
        }
    }

    fn send_to<'a>(
        &'a self,
        buf: &'a [u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a {
        async move {
            let _ = self.outgoing.send((buf.to_vec(), target));
            Ok(buf.len())
        }
    }
}
