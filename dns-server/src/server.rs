use std::io;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use dns::constants::RCODE_SERVER_FAILURE;
use dns::{Packet, Unpacker};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::reply::ReplyHandle;
use crate::socket::{DatagramSocket, MAX_DATAGRAM_SIZE};
use crate::transaction::Transaction;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct Server {
    listener: JoinHandle<()>,
    local_addr: Option<SocketAddr>,
}

impl Server {
    /// Must be called from inside a tokio runtime.
    pub fn listen<S, H>(socket: S, handler: H) -> Self
    where
        S: DatagramSocket,
        H: Fn(&mut Transaction) -> HandlerResult + Send + 'static,
    {
        let socket = Arc::new(socket);
        let (replies, _writer) = ReplyHandle::spawn(socket.clone());
        let listener = tokio::spawn(run_listener(socket, replies, handler));

        Self {
            listener,
            local_addr: None,
        }
    }

    pub async fn bind<H>(addr: SocketAddr, handler: H) -> io::Result<Self>
    where
        H: Fn(&mut Transaction) -> HandlerResult + Send + 'static,
    {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        tracing::info!("listening on {}", local_addr);

        let mut server = Self::listen(socket, handler);
        server.local_addr = Some(local_addr);
        Ok(server)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    // 只停监听，已经发出的 passthrough 仍会回复
    pub fn stop(&self) {
        self.listener.abort();
    }

    pub async fn wait(self) {
        match self.listener.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => tracing::debug!("listener stopped"),
            Err(e) => tracing::error!("listener ended abnormally: {}", e),
        }
    }
}

async fn run_listener<S, H>(socket: Arc<S>, replies: ReplyHandle, handler: H)
where
    S: DatagramSocket,
    H: Fn(&mut Transaction) -> HandlerResult,
{
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (size, peer) = match socket.recv_from(&mut buf).await {
            Ok(ret) => ret,
            Err(e) => {
                tracing::warn!("recv_from failed: {}", e);
                continue;
            }
        };
        let data = &buf[..size];

        let request = match Packet::parse(data) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("dropping {} bytes from {}: {}", size, peer, e);
                tracing::debug!("\n{}", Unpacker::new(data));
                continue;
            }
        };
        tracing::debug!("{} from {}", request.brief(), peer);

        let mut transaction = Transaction::new(request, peer, replies.clone());
        dispatch(&handler, &mut transaction);
    }
}

fn dispatch<H>(handler: &H, transaction: &mut Transaction)
where
    H: Fn(&mut Transaction) -> HandlerResult,
{
    let failed = match panic::catch_unwind(AssertUnwindSafe(|| handler(transaction))) {
        Ok(Ok(())) => false,
        Ok(Err(e)) => {
            tracing::error!("handler failed on {}: {}", transaction.request().brief(), e);
            true
        }
        Err(_) => {
            tracing::error!("handler panicked on {}", transaction.request().brief());
            true
        }
    };

    if !transaction.is_open() {
        return;
    }

    if failed {
        transaction.response_mut().answers.clear();
        if let Err(e) = transaction.error(RCODE_SERVER_FAILURE) {
            tracing::error!("couldn't send SERVFAIL to {}: {}", transaction.peer(), e);
        }
    } else {
        tracing::debug!("handler left {} unanswered", transaction.request().brief());
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use super::*;
    use crate::fake_socket::FakeSocket;
    use crate::query::query;
    use dns::constants::*;
    use dns::{Answer, Question, ResourceRecord};
    use tokio::sync::oneshot;

    fn peer() -> SocketAddr {
        "192.0.2.1:6112".parse().unwrap()
    }

    fn request_bytes(trn_id: u16, name: &str) -> Vec<u8> {
        Packet::query(trn_id, Question::new(name, TYPE_A, CLS_IN)).to_bytes().unwrap()
    }

    fn a_record(name: &str, address: Ipv4Addr) -> Answer {
        Answer::new(name, TYPE_A, CLS_IN, 60, ResourceRecord::A(address))
    }

    fn answer_localhost(transaction: &mut Transaction) -> HandlerResult {
        let name = transaction.request().questions[0].name.clone();
        transaction.answer(vec![a_record(&name, Ipv4Addr::LOCALHOST)])?;
        Ok(())
    }

    #[tokio::test]
    async fn answers_request() {
        let (socket, mut sent) = FakeSocket::new(vec![(request_bytes(0x1337, "test.com"), peer())]);
        let server = Server::listen(socket, answer_localhost);

        let (bytes, to) = sent.recv().await.unwrap();
        assert_eq!(to, peer());

        let response = Packet::parse(&bytes).unwrap();
        assert_eq!(response.trn_id, 0x1337);
        assert_eq!(response.qr, Qr::Response);
        assert_eq!(response.rcode, RCODE_SUCCESS);
        assert_eq!(response.answers, vec![a_record("test.com", Ipv4Addr::LOCALHOST)]);

        server.stop();
        server.wait().await;
    }

    #[tokio::test]
    async fn drops_garbage() {
        let incoming = vec![
            (b"\x00\x01\x01".to_vec(), peer()),
            // name pointing at itself
            (b"\x00\x02\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\xc0\x0c".to_vec(), peer()),
            (request_bytes(3, "test.com"), peer()),
        ];
        let (socket, mut sent) = FakeSocket::new(incoming);
        let server = Server::listen(socket, answer_localhost);

        let (bytes, _) = sent.recv().await.unwrap();
        assert_eq!(Packet::parse(&bytes).unwrap().trn_id, 3);
        assert!(sent.try_recv().is_err());

        server.stop();
    }

    #[tokio::test]
    async fn handler_error_is_servfail() {
        let (socket, mut sent) = FakeSocket::new(vec![(request_bytes(1, "test.com"), peer())]);
        let server = Server::listen(socket, |transaction: &mut Transaction| -> HandlerResult {
            // half-built answers don't leak into the SERVFAIL
            transaction.response_mut().add_answer(a_record("test.com", Ipv4Addr::LOCALHOST));
            Err("no records".into())
        });

        let (bytes, _) = sent.recv().await.unwrap();
        let response = Packet::parse(&bytes).unwrap();
        assert_eq!(response.trn_id, 1);
        assert_eq!(response.rcode, RCODE_SERVER_FAILURE);
        assert!(response.answers.is_empty());

        server.stop();
    }

    #[tokio::test]
    async fn handler_panic_is_servfail() {
        let incoming = vec![
            (request_bytes(1, "panic.test.com"), peer()),
            (request_bytes(2, "test.com"), peer()),
        ];
        let (socket, mut sent) = FakeSocket::new(incoming);
        let server = Server::listen(socket, |transaction: &mut Transaction| {
            if transaction.request().questions[0].name.starts_with("panic") {
                panic!("handler bug");
            }
            answer_localhost(transaction)
        });

        let (bytes, _) = sent.recv().await.unwrap();
        let response = Packet::parse(&bytes).unwrap();
        assert_eq!(response.trn_id, 1);
        assert_eq!(response.rcode, RCODE_SERVER_FAILURE);

        // and the listener is still going
        let (bytes, _) = sent.recv().await.unwrap();
        let response = Packet::parse(&bytes).unwrap();
        assert_eq!(response.trn_id, 2);
        assert_eq!(response.rcode, RCODE_SUCCESS);

        server.stop();
    }

    #[tokio::test]
    async fn one_reply_per_request() {
        let incoming = vec![
            (request_bytes(1, "quiet.test.com"), peer()),
            (request_bytes(2, "late-error.test.com"), peer()),
            (request_bytes(3, "test.com"), peer()),
        ];
        let (socket, mut sent) = FakeSocket::new(incoming);
        let server = Server::listen(socket, |transaction: &mut Transaction| -> HandlerResult {
            match transaction.request().trn_id {
                1 => Ok(()),
                2 => {
                    answer_localhost(transaction)?;
                    Err("failed after answering".into())
                }
                _ => answer_localhost(transaction),
            }
        });

        let (bytes, _) = sent.recv().await.unwrap();
        let response = Packet::parse(&bytes).unwrap();
        assert_eq!(response.trn_id, 2);
        assert_eq!(response.rcode, RCODE_SUCCESS);

        let (bytes, _) = sent.recv().await.unwrap();
        assert_eq!(Packet::parse(&bytes).unwrap().trn_id, 3);
        assert!(sent.try_recv().is_err());

        server.stop();
    }

    // answers 10.0.0.1, NXDOMAIN for nx.*, nothing for silent.*
    async fn spawn_upstream(delay: Duration, seen: Option<oneshot::Sender<()>>) -> SocketAddr {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = upstream.local_addr().unwrap();

        tokio::spawn(async move {
            let mut seen = seen;
            let mut buf = vec![0u8; 512];
            loop {
                let (size, from) = upstream.recv_from(&mut buf).await.unwrap();
                if let Some(seen) = seen.take() {
                    let _ = seen.send(());
                }

                let request = Packet::parse(&buf[..size]).unwrap();
                let name = request.questions[0].name.clone();
                let response = if name.starts_with("silent") {
                    continue;
                } else if name.starts_with("nx") {
                    request.error(RCODE_NAME_ERROR, None)
                } else {
                    request.answer(vec![a_record(&name, Ipv4Addr::new(10, 0, 0, 1))], None)
                };

                tokio::time::sleep(delay).await;
                upstream.send_to(&response.to_bytes().unwrap(), from).await.unwrap();
            }
        });

        addr
    }

    async fn passthrough_server(upstream: SocketAddr) -> (Server, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let server = Server::listen(socket, move |transaction: &mut Transaction| -> HandlerResult {
            transaction.passthrough(upstream, Duration::from_millis(300))?;
            Ok(())
        });

        (server, addr)
    }

    #[tokio::test]
    async fn passthrough_test() {
        let upstream = spawn_upstream(Duration::ZERO, None).await;
        let (server, addr) = passthrough_server(upstream).await;
        let timeout = Duration::from_secs(3);

        let question = Question::new("www.test.com", TYPE_A, CLS_IN);
        let response = query(addr, question.clone(), timeout).await.unwrap();
        assert_eq!(response.rcode, RCODE_SUCCESS);
        assert_eq!(response.questions, vec![question]);
        assert_eq!(response.answers, vec![a_record("www.test.com", Ipv4Addr::new(10, 0, 0, 1))]);

        let question = Question::new("nx.test.com", TYPE_A, CLS_IN);
        let response = query(addr, question, timeout).await.unwrap();
        assert_eq!(response.rcode, RCODE_NAME_ERROR);
        assert!(response.answers.is_empty());

        let question = Question::new("silent.test.com", TYPE_A, CLS_IN);
        let response = query(addr, question, timeout).await.unwrap();
        assert_eq!(response.rcode, RCODE_SERVER_FAILURE);
        assert!(response.answers.is_empty());

        server.stop();
        server.wait().await;
    }

    #[tokio::test]
    async fn passthrough_keeps_pending_answers() {
        let upstream = spawn_upstream(Duration::ZERO, None).await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let server = Server::listen(socket, move |transaction: &mut Transaction| -> HandlerResult {
            let name = transaction.request().questions[0].name.clone();
            transaction.response_mut().add_answer(a_record(&name, Ipv4Addr::LOCALHOST));
            transaction.passthrough(upstream, Duration::from_millis(300))?;
            Ok(())
        });

        let question = Question::new("both.test.com", TYPE_A, CLS_IN);
        let response = query(addr, question, Duration::from_secs(3)).await.unwrap();
        assert_eq!(response.rcode, RCODE_SUCCESS);
        assert_eq!(
            response.answers,
            vec![
                a_record("both.test.com", Ipv4Addr::LOCALHOST),
                a_record("both.test.com", Ipv4Addr::new(10, 0, 0, 1)),
            ]
        );

        server.stop();
        server.wait().await;
    }

    #[tokio::test]
    async fn passthrough_outlives_stop() {
        let (seen_tx, seen_rx) = oneshot::channel();
        let upstream = spawn_upstream(Duration::from_millis(100), Some(seen_tx)).await;
        let (server, addr) = passthrough_server(upstream).await;

        let question = Question::new("late.test.com", TYPE_A, CLS_IN);
        let client = tokio::spawn(query(addr, question, Duration::from_secs(3)));

        // the passthrough task is in flight once upstream sees the request
        seen_rx.await.unwrap();
        server.stop();
        server.wait().await;

        let response = client.await.unwrap().unwrap();
        assert_eq!(response.answers, vec![a_record("late.test.com", Ipv4Addr::new(10, 0, 0, 1))]);
    }

    #[tokio::test]
    async fn concurrent_queries() {
        let server = Server::bind("127.0.0.1:0".parse().unwrap(), answer_localhost).await.unwrap();
        let addr = server.local_addr().unwrap();

        let names: Vec<String> = (0..16).map(|i| format!("host{}.test.com", i)).collect();
        let queries = names
            .iter()
            .map(|name| query(addr, Question::new(name, TYPE_A, CLS_IN), Duration::from_secs(3)));
        let responses = futures::future::join_all(queries).await;

        for (name, response) in names.iter().zip(responses) {
            let response = response.unwrap();
            assert_eq!(response.answers, vec![a_record(name, Ipv4Addr::LOCALHOST)]);
        }

        server.stop();
        server.wait().await;
    }
}
