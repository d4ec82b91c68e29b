use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use dns::constants::{RCODE_FORMAT_ERROR, RCODE_SERVER_FAILURE, RCODE_SUCCESS};
use dns::{Answer, Packet};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::query;
use crate::reply::ReplyHandle;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum State {
    Open,
    Sent,
}

/// One incoming request, answered exactly once by `answer`, `error`, `reply`
/// or `passthrough`; later calls fail with [`Error::AlreadySent`].
pub struct Transaction {
    request: Packet,
    response: Packet,
    peer: SocketAddr,
    replies: ReplyHandle,
    state: State,
}

impl Transaction {
    pub fn new(request: Packet, peer: SocketAddr, replies: ReplyHandle) -> Self {
        let response = request.answer(Vec::new(), None);

        Self {
            request,
            response,
            peer,
            replies,
            state: State::Open,
        }
    }

    pub fn request(&self) -> &Packet {
        &self.request
    }

    pub fn response(&self) -> &Packet {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Packet {
        &mut self.response
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    pub fn is_sent(&self) -> bool {
        self.state == State::Sent
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Sent => Err(Error::AlreadySent),
        }
    }

    pub fn answer(&mut self, answers: Vec<Answer>) -> Result<()> {
        self.ensure_open()?;

        let pending = self.response.answers.len();
        self.response.answers.extend(answers);
        let ret = self.reply();
        if ret.is_err() && self.is_open() {
            // 发送失败时撤回这次加上的 answers
            self.response.answers.truncate(pending);
        }
        ret
    }

    pub fn error(&mut self, rcode: u8) -> Result<()> {
        self.ensure_open()?;

        self.response.rcode = rcode;
        self.reply()
    }

    pub fn reply(&mut self) -> Result<()> {
        self.ensure_open()?;

        // serialize first: an unencodable response leaves the transaction open
        let bytes = self.response.to_bytes()?;
        self.state = State::Sent;

        tracing::debug!("{} to {}", self.response.brief(), self.peer);
        self.replies.send(self.peer, Bytes::from(bytes))
    }

    /// Closes the transaction at once; the spawned task sends the one reply.
    pub fn passthrough(&mut self, upstream: SocketAddr, timeout: Duration) -> Result<JoinHandle<()>> {
        self.ensure_open()?;

        let question = match self.request.questions.first() {
            Some(q) => q.clone(),
            None => {
                self.error(RCODE_FORMAT_ERROR)?;
                return Ok(tokio::spawn(async {}));
            }
        };
        self.state = State::Sent;

        let mut response = self.response.clone();
        let peer = self.peer;
        let replies = self.replies.clone();

        let task = tokio::spawn(async move {
            match forward(upstream, question, timeout).await {
                Ok(upstream_response) if upstream_response.rcode == RCODE_SUCCESS => {
                    response.answers.extend(upstream_response.answers);
                }
                Ok(upstream_response) => {
                    response.rcode = upstream_response.rcode;
                    response.answers.clear();
                }
                Err(e) => {
                    tracing::warn!("passthrough to {} failed: {}", upstream, e);
                    response.rcode = RCODE_SERVER_FAILURE;
                    response.answers.clear();
                }
            }

            let bytes = match response.to_bytes() {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("couldn't encode the upstream response: {}", e);
                    response.answers.clear();
                    response.rcode = RCODE_SERVER_FAILURE;
                    match response.to_bytes() {
                        Ok(bytes) => bytes,
                        Err(_) => return,
                    }
                }
            };

            tracing::debug!("{} to {} (via {})", response.brief(), peer, upstream);
            if let Err(e) = replies.send(peer, Bytes::from(bytes)) {
                tracing::warn!("dropping passthrough reply to {}: {}", peer, e);
            }
        });

        Ok(task)
    }
}

// 每次转发都用新的 socket，不和监听的 socket 混用
async fn forward(upstream: SocketAddr, question: dns::Question, timeout: Duration) -> Result<Packet> {
    let local_addr: SocketAddr = if upstream.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let sock = UdpSocket::bind(local_addr).await?;

    query::query_with(&sock, upstream, question, timeout).await
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "== DNS Transaction ==")?;
        writeln!(f, "-- Request --")?;
        writeln!(f, "{}", self.request)?;
        match self.state {
            State::Open => writeln!(f, "-- Response [not sent yet] --")?,
            State::Sent => writeln!(f, "-- Response [sent] --")?,
        }
        write!(f, "{}", self.response)
    }
}
