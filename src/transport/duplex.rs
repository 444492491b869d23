//! Queued duplex message transport over a delimited byte stream.
//!
//! A [`DuplexTransport`] owns the peer link through two background tasks:
//!
//! ```text
//!   send() ──► SendQueue (bounded) ──► writer task ──► link write half
//! receive() ◄── RecvQueue (bounded) ◄── reader task ◄── link read half
//! ```
//!
//! Each queue is a single-producer/single-consumer FIFO, so wire order and
//! delivery order always match. Backpressure is local only: a full receive
//! queue stops the reader, but the peer can keep filling the socket buffer.
//!
//! A read or write failure ends the session. The failing task logs it,
//! signals shutdown, and later calls report [`TransportError::Closed`].

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, warn};

use super::codec::FrameCodec;
use super::locator::PeerLink;
use crate::core::{
    ConfigError, MessageTransport, TransportError, DEFAULT_CLOSE_TIMEOUT,
    DEFAULT_MAX_FRAME_LENGTH, DEFAULT_QUEUE_CAPACITY,
};

/// Tuning for a duplex transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplexConfig {
    /// Capacity of each of the send and receive queues.
    pub queue_capacity: usize,
    /// Largest frame payload accepted in either direction.
    pub max_frame_length: usize,
    /// How long `close()` waits for the send queue to drain.
    pub close_timeout: Duration,
}

impl Default for DuplexConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl DuplexConfig {
    /// Check the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.max_frame_length == 0 {
            return Err(ConfigError::ZeroFrameLength);
        }
        Ok(())
    }
}

type Inbound = Result<String, TransportError>;

/// Plain message transport over one peer link.
///
/// Must be created inside a tokio runtime; construction spawns the reader
/// and writer tasks. Dropping the transport cancels both.
#[derive(Debug)]
pub struct DuplexTransport {
    outbound: mpsc::Sender<String>,
    inbound: mpsc::Receiver<Inbound>,
    reader: JoinHandle<()>,
    writer: JoinHandle<Result<(), TransportError>>,
    shutdown: DropGuard,
    /// Outbound validation only; the writer owns its own codec.
    codec: FrameCodec,
    peer_addr: Option<SocketAddr>,
    /// Set once the reader has reported its terminal error.
    finished: bool,
    close_timeout: Duration,
}

impl DuplexTransport {
    /// Start a transport over `link` with the default configuration.
    pub fn new(link: PeerLink) -> Self {
        Self::from_link(link, DuplexConfig::default())
    }

    /// Start a transport over `link`.
    pub fn from_link(link: PeerLink, config: DuplexConfig) -> Self {
        let peer_addr = link.peer_addr();
        let (read_half, write_half) = link.into_split();
        let mut transport = Self::from_io(read_half, write_half, config);
        transport.peer_addr = Some(peer_addr);
        transport
    }

    /// Start a transport over any reader/writer pair.
    ///
    /// `config` is used as given; zero capacities are raised to one.
    pub fn from_io<R, W>(reader: R, writer: W, config: DuplexConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let capacity = config.queue_capacity.max(1);
        let codec = FrameCodec::with_max_length(config.max_frame_length.max(1));

        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let token = CancellationToken::new();

        let reader = tokio::spawn(read_loop(
            FramedRead::new(reader, codec.clone()),
            inbound_tx,
            token.clone(),
        ));
        let writer = tokio::spawn(write_loop(
            FramedWrite::new(writer, codec.clone()),
            outbound_rx,
            token.clone(),
        ));

        Self {
            outbound: outbound_tx,
            inbound: inbound_rx,
            reader,
            writer,
            shutdown: token.drop_guard(),
            codec,
            peer_addr: None,
            finished: false,
            close_timeout: config.close_timeout,
        }
    }

    /// Get the remote address, if the transport runs over a TCP link.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Number of messages that can still be queued without waiting.
    pub fn send_capacity(&self) -> usize {
        self.outbound.capacity()
    }

    /// Get the largest frame payload this transport accepts.
    pub fn max_frame_length(&self) -> usize {
        self.codec.max_length()
    }

    /// Queue a message for the peer, waiting while the send queue is full.
    pub async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        self.codec.check(message).map_err(TransportError::Rejected)?;
        self.send_with(|| message.to_owned()).await
    }

    /// Wait for a free slot in the send queue, then build and queue a message.
    ///
    /// `encode` runs only once the slot is held, so a call cancelled while
    /// waiting never runs it. Stateful encoders rely on this.
    pub async fn send_with<F>(&mut self, encode: F) -> Result<(), TransportError>
    where
        F: FnOnce() -> String,
    {
        let permit = self
            .outbound
            .reserve()
            .await
            .map_err(|_| TransportError::Closed)?;
        let message = encode();
        self.codec.check(&message).map_err(TransportError::Rejected)?;
        permit.send(message);
        Ok(())
    }

    /// Wait for the next message from the peer.
    pub async fn receive(&mut self) -> Result<String, TransportError> {
        if self.finished {
            return Err(TransportError::Closed);
        }
        match self.inbound.recv().await {
            Some(Ok(message)) => Ok(message),
            Some(Err(err)) => {
                self.finished = true;
                Err(err)
            }
            None => {
                self.finished = true;
                Err(TransportError::Closed)
            }
        }
    }

    /// Flush queued messages, shut the link down and stop both tasks.
    ///
    /// The writer drains the send queue before closing its half; the reader
    /// is cancelled afterwards. Returns the writer's failure, if any.
    ///
    /// A peer that stops reading can stall the drain. After the configured
    /// close timeout the writer is cancelled, the unsent messages are lost
    /// and a [`TimedOut`](io::ErrorKind::TimedOut) error is returned.
    pub async fn close(self) -> Result<(), TransportError> {
        let Self {
            outbound,
            inbound,
            reader,
            mut writer,
            shutdown,
            close_timeout,
            ..
        } = self;

        // Still cancels both tasks if this future is dropped midway.
        let token = shutdown.disarm();
        let _shutdown = token.clone().drop_guard();

        drop(outbound);
        let written = match tokio::time::timeout(close_timeout, &mut writer).await {
            Ok(joined) => joined_result(joined),
            Err(_) => {
                warn!(timeout = ?close_timeout, "send queue not drained in time, dropping it");
                token.cancel();
                joined_result(writer.await).and(Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "peer did not drain the link before the close timeout",
                ))))
            }
        };

        token.cancel();
        drop(inbound);
        if let Err(err) = reader.await {
            warn!(error = %err, "reader task did not finish cleanly");
        }
        debug!("transport closed");
        written
    }
}

fn joined_result(
    joined: Result<Result<(), TransportError>, tokio::task::JoinError>,
) -> Result<(), TransportError> {
    joined.unwrap_or_else(|err| Err(TransportError::TaskFailed(err.to_string())))
}

impl MessageTransport for DuplexTransport {
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        DuplexTransport::send(self, message).await
    }

    async fn receive(&mut self) -> Result<String, TransportError> {
        DuplexTransport::receive(self).await
    }

    async fn close(self) -> Result<(), TransportError> {
        DuplexTransport::close(self).await
    }
}

/// Reader task: frames from the link into the receive queue.
///
/// The first failure (including peer EOF) is pushed into the queue as the
/// last item, then the task exits.
async fn read_loop<R>(
    mut frames: FramedRead<R, FrameCodec>,
    inbound: mpsc::Sender<Inbound>,
    shutdown: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    debug!("reader started");
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = frames.next() => next,
        };

        let item = match next {
            Some(Ok(message)) => Ok(message),
            Some(Err(err)) => {
                error!(error = %err, "read failed, session terminated");
                Err(TransportError::Frame(err))
            }
            None => {
                warn!("peer closed the link");
                Err(TransportError::PeerClosed)
            }
        };
        let terminal = item.is_err();

        let pushed = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            pushed = inbound.send(item) => pushed,
        };
        if pushed.is_err() || terminal {
            break;
        }
    }
    debug!("reader stopped");
}

/// Writer task: messages from the send queue onto the link.
///
/// Ends cleanly once the send queue is closed and drained; a write failure
/// cancels the whole transport.
async fn write_loop<W>(
    mut frames: FramedWrite<W, FrameCodec>,
    mut outbound: mpsc::Receiver<String>,
    shutdown: CancellationToken,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    debug!("writer started");
    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            message = outbound.recv() => message,
        };

        let Some(message) = message else {
            debug!("send queue closed, shutting down write half");
            let closed = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                closed = frames.close() => closed,
            };
            if let Err(err) = closed {
                warn!(error = %err, "failed to shut down write half");
                return Err(err.into());
            }
            break;
        };

        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = frames.send(message) => result,
        };
        if let Err(err) = result {
            error!(error = %err, "write failed, session terminated");
            shutdown.cancel();
            return Err(err.into());
        }
    }
    debug!("writer stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameError;

    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

    /// Write half of a link whose peer has gone away.
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Transport whose far end is an in-memory stream driven by the test.
    fn transport_with_raw_peer(
        config: DuplexConfig,
    ) -> (DuplexTransport, tokio::io::DuplexStream) {
        let (local, remote) = tokio::io::duplex(64 * 1024);
        let (read_half, write_half) = tokio::io::split(local);
        (DuplexTransport::from_io(read_half, write_half, config), remote)
    }

    fn transport_pair() -> (DuplexTransport, DuplexTransport) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let (a_read, a_write) = tokio::io::split(a);
        let (b_read, b_write) = tokio::io::split(b);
        (
            DuplexTransport::from_io(a_read, a_write, DuplexConfig::default()),
            DuplexTransport::from_io(b_read, b_write, DuplexConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_send_writes_frames_in_order() {
        let (mut transport, remote) = transport_with_raw_peer(DuplexConfig::default());

        for message in ["A", "B", "C"] {
            transport.send(message).await.unwrap();
        }

        let mut lines = BufReader::new(remote).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("A"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("B"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn test_receive_strips_delimiter() {
        let (mut transport, mut remote) = transport_with_raw_peer(DuplexConfig::default());

        remote.write_all(b"hello\nhi\n").await.unwrap();

        assert_eq!(transport.receive().await.unwrap(), "hello");
        assert_eq!(transport.receive().await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_peer_order_preserved() {
        let (mut a, mut b) = transport_pair();

        for message in ["A", "B", "C"] {
            a.send(message).await.unwrap();
        }
        for expected in ["A", "B", "C"] {
            assert_eq!(b.receive().await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_send_rejects_delimiter() {
        let (mut transport, _remote) = transport_with_raw_peer(DuplexConfig::default());

        let err = transport.send("two\nlines").await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));
        assert!(!err.is_fatal());

        // The session is still usable.
        transport.send("one line").await.unwrap();
    }

    #[tokio::test]
    async fn test_full_send_queue_blocks_fifth_message() {
        // A one-byte pipe nobody reads from stalls the writer on its first
        // frame, so the queue fills up behind it.
        let (local, _remote) = tokio::io::duplex(1);
        let (read_half, write_half) = tokio::io::split(local);
        let mut transport =
            DuplexTransport::from_io(read_half, write_half, DuplexConfig::default());

        // The writer holds one message in flight; four more fill the queue.
        transport.send("in flight").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        for i in 0..DEFAULT_QUEUE_CAPACITY {
            transport.send(&format!("queued {i}")).await.unwrap();
        }
        assert_eq!(transport.send_capacity(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(100), transport.send("fifth"));
        assert!(blocked.await.is_err(), "send should wait while the queue is full");
    }

    #[tokio::test]
    async fn test_blocked_send_resumes_when_drained() {
        let (local, mut remote) = tokio::io::duplex(1);
        let (read_half, write_half) = tokio::io::split(local);
        let mut transport =
            DuplexTransport::from_io(read_half, write_half, DuplexConfig::default());

        transport.send("in flight").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        for i in 0..DEFAULT_QUEUE_CAPACITY {
            transport.send(&format!("queued {i}")).await.unwrap();
        }

        let drain = tokio::spawn(async move {
            let mut buf = vec![0u8; 256];
            let mut seen = Vec::new();
            while !seen.ends_with(b"fifth\n") {
                let n = remote.read(&mut buf).await.unwrap();
                assert!(n > 0);
                seen.extend_from_slice(&buf[..n]);
            }
            seen
        });

        tokio::time::timeout(Duration::from_secs(5), transport.send("fifth"))
            .await
            .expect("send should resume once the peer drains")
            .unwrap();

        let seen = drain.await.unwrap();
        assert!(seen.starts_with(b"in flight\nqueued 0\n"));
    }

    #[tokio::test]
    async fn test_peer_eof_reported_once() {
        let (mut transport, remote) = transport_with_raw_peer(DuplexConfig::default());
        drop(remote);

        assert!(matches!(
            transport.receive().await,
            Err(TransportError::PeerClosed)
        ));
        assert!(matches!(
            transport.receive().await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_oversized_inbound_frame_is_fatal() {
        let config = DuplexConfig {
            max_frame_length: 8,
            ..DuplexConfig::default()
        };
        let (mut transport, mut remote) = transport_with_raw_peer(config);

        remote.write_all(b"way too long for this\n").await.unwrap();

        let err = transport.receive().await.unwrap_err();
        assert!(matches!(err, TransportError::Frame(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_close_flushes_queued_messages() {
        let (mut transport, remote) = transport_with_raw_peer(DuplexConfig::default());

        transport.send("last words").await.unwrap();
        transport.send("goodbye").await.unwrap();
        transport.close().await.unwrap();

        let mut received = String::new();
        let mut remote = remote;
        remote.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "last words\ngoodbye\n");
    }

    #[tokio::test]
    async fn test_close_gives_up_on_unread_link() {
        let config = DuplexConfig {
            close_timeout: Duration::from_millis(100),
            ..DuplexConfig::default()
        };
        // One-byte pipe that nobody reads: the writer can never finish.
        let (local, _remote) = tokio::io::duplex(1);
        let (read_half, write_half) = tokio::io::split(local);
        let mut transport = DuplexTransport::from_io(read_half, write_half, config);

        transport.send("stuck").await.unwrap();

        let closed = tokio::time::timeout(Duration::from_secs(2), transport.close())
            .await
            .expect("close should give up once the timeout passes");
        assert!(matches!(
            closed,
            Err(TransportError::Io(ref err)) if err.kind() == io::ErrorKind::TimedOut
        ));
    }

    #[tokio::test]
    async fn test_write_failure_ends_session() {
        // Keep the far end open so only the writer fails.
        let (local, _remote) = tokio::io::duplex(64);
        let (read_half, _) = tokio::io::split(local);
        let mut transport =
            DuplexTransport::from_io(read_half, BrokenPipe, DuplexConfig::default());

        transport.send("doomed").await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), transport.receive())
            .await
            .expect("reader should stop once the writer fails");
        assert!(matches!(received, Err(TransportError::Closed)));
        assert!(matches!(
            transport.send("too late").await,
            Err(TransportError::Closed)
        ));

        let closed = transport.close().await;
        assert!(matches!(
            closed,
            Err(TransportError::Frame(FrameError::Io(ref err)))
                if err.kind() == io::ErrorKind::BrokenPipe
        ));
    }

    #[tokio::test]
    async fn test_peer_sees_eof_after_close() {
        let (a, mut b) = transport_pair();

        a.close().await.unwrap();

        assert!(matches!(b.receive().await, Err(TransportError::PeerClosed)));
    }

    #[test]
    fn test_config_validation() {
        assert!(DuplexConfig::default().validate().is_ok());

        let zero_capacity = DuplexConfig {
            queue_capacity: 0,
            ..DuplexConfig::default()
        };
        assert_eq!(
            zero_capacity.validate(),
            Err(ConfigError::ZeroQueueCapacity)
        );
    }
}
