use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use dns::{Packet, Question};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};
use crate::socket::{DatagramSocket, MAX_DATAGRAM_SIZE};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn query(server: SocketAddr, question: Question, timeout: Duration) -> Result<Packet> {
    let local_addr: SocketAddr = if server.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local_addr).await?;

    query_with(&socket, server, question, timeout).await
}

// 只接受来自 server、且 id 相同的响应
pub async fn query_with<S: DatagramSocket>(
    socket: &S,
    server: SocketAddr,
    question: Question,
    timeout: Duration,
) -> Result<Packet> {
    let request = Packet::query(rand::random(), question);
    let bytes = request.to_bytes()?;

    tracing::debug!("{} to {}", request.brief(), server);
    socket.send_to(&bytes, server).await?;

    match tokio::time::timeout(timeout, wait_for_response(socket, server, request.trn_id)).await {
        Ok(ret) => ret,
        Err(_) => Err(Error::Timeout(timeout)),
    }
}

async fn wait_for_response<S: DatagramSocket>(socket: &S, server: SocketAddr, trn_id: u16) -> Result<Packet> {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (size, from) = socket.recv_from(&mut buf).await?;
        if from != server {
            tracing::debug!("ignoring {} bytes from {}", size, from);
            continue;
        }

        let response = Packet::parse(&buf[..size])?;
        if response.trn_id != trn_id {
            tracing::debug!("ignoring stale response 0x{:04x} (want 0x{:04x})", response.trn_id, trn_id);
            continue;
        }

        tracing::debug!("{} from {}", response.brief(), server);
        return Ok(response);
    }
}
