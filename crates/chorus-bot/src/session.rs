//! Session lifecycle and inbound dispatch.
//!
//! # Concurrency model
//!
//! Two activities share the transport for the lifetime of an open session:
//! the single inbound reader task and outbound writers (the setup pipeline,
//! operator messages, throttled automated replies). All writes and state
//! transitions go through one `Mutex` so two writers never interleave
//! partial lines on the wire and a send never races a concurrent close.
//!
//! The reader never sleeps outside its socket read: convergence alerts are
//! pushed into the responder channel and the randomized pre-send delay runs
//! on the responder task, keeping the bot responsive to keep-alive probes.

use std::sync::Arc;
use std::time::Duration;

use chorus_converge::ConvergenceTracker;
use chorus_protocol::{command, outbound, IrcMessage};
use rustls::pki_types::ServerName;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

/// Fixed chat service endpoint.
pub const SERVER: &str = "irc.chat.twitch.tv";

/// TLS port of the chat service.
pub const PORT: u16 = 6697;

/// Two-byte line terminator required by the protocol.
const LINE_TERMINATOR: &[u8] = b"\r\n";

/// How long `close()` waits for the reader to exit before aborting it.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Session lifecycle states. Only `Joined` permits chat traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport. The only state `open()` accepts.
    Disconnected,
    /// TLS handshake in progress.
    Connecting,
    /// Transport up, reader running, setup pipeline being written.
    Open,
    /// Setup pipeline written, waiting for the auth-success numeric.
    Authenticating,
    /// Authenticated and joined; chat traffic enabled.
    Joined,
    /// Leave notice sent, waiting for teardown.
    Closing,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Joined => write!(f, "Joined"),
            Self::Closing => write!(f, "Closing"),
        }
    }
}

/// Credentials and target channel, injected at construction.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub oauth_token: String,
    pub nickname: String,
    pub channel: String,
}

/// State behind the session's single critical section.
struct SessionInner {
    state: SessionState,
    writer: Option<WriteHalf<TlsStream<TcpStream>>>,
    reader_task: Option<JoinHandle<()>>,
}

/// One long-lived chat session: socket lifecycle, inbound dispatch, and
/// serialized outbound writes.
pub struct Session {
    credentials: Credentials,
    tracker: Arc<Mutex<ConvergenceTracker>>,
    reply_tx: mpsc::Sender<String>,
    inner: Mutex<SessionInner>,
    shutdown: Notify,
}

impl Session {
    /// Create a session in the `Disconnected` state. Convergence alerts on
    /// inbound chat push reply candidates into `reply_tx`.
    pub fn new(
        credentials: Credentials,
        tracker: Arc<Mutex<ConvergenceTracker>>,
        reply_tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            credentials,
            tracker,
            reply_tx,
            inner: Mutex::new(SessionInner {
                state: SessionState::Disconnected,
                writer: None,
                reader_task: None,
            }),
            shutdown: Notify::new(),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Establish the encrypted transport, start the inbound reader, and
    /// pipeline the setup writes (credential presentation, identity
    /// announcement, channel join).
    ///
    /// The setup writes are fire-and-forget: success is confirmed later by
    /// the server's numeric replies, not by these calls. Transport failures
    /// leave the session `Disconnected` and are not retried here.
    pub async fn open(self: &Arc<Self>) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != SessionState::Disconnected {
                return Err(Error::AlreadyOpen);
            }
            inner.state = SessionState::Connecting;
        }

        let stream = match connect_tls().await {
            Ok(stream) => stream,
            Err(e) => {
                self.inner.lock().await.state = SessionState::Disconnected;
                return Err(e);
            }
        };
        info!(server = SERVER, port = PORT, "transport established");

        let (read_half, write_half) = tokio::io::split(stream);
        {
            let mut inner = self.inner.lock().await;
            inner.writer = Some(write_half);
            inner.state = SessionState::Open;
            let session = Arc::clone(self);
            inner.reader_task = Some(tokio::spawn(async move {
                session.read_loop(read_half).await;
            }));
        }

        self.write_line(&outbound::pass(&self.credentials.oauth_token))
            .await?;
        self.write_line(&outbound::nick(&self.credentials.nickname))
            .await?;
        self.write_line(&outbound::join(&self.credentials.channel))
            .await?;

        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Open {
            inner.state = SessionState::Authenticating;
        }
        Ok(())
    }

    /// Send the polite leave notice and tear the session down. Idempotent:
    /// closing an already-closed session logs and returns Ok.
    ///
    /// The reader gets a bounded grace period to exit before being aborted,
    /// so `close()` always settles `Disconnected` within [`CLOSE_GRACE`].
    pub async fn close(&self) -> Result<()> {
        let reader_task = {
            let mut inner = self.inner.lock().await;
            if inner.state == SessionState::Disconnected {
                warn!("{}", Error::AlreadyClosed);
                return Ok(());
            }
            inner.state = SessionState::Closing;
            // Best effort on a possibly dying connection.
            if let Some(writer) = inner.writer.as_mut() {
                let line = outbound::part(&self.credentials.channel);
                let _ = writer.write_all(line.as_bytes()).await;
                let _ = writer.write_all(LINE_TERMINATOR).await;
                let _ = writer.flush().await;
            }
            inner.reader_task.take()
        };

        self.shutdown.notify_waiters();
        if let Some(mut task) = reader_task {
            if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
                warn!("reader did not exit within the grace period, aborting");
                task.abort();
            }
        }

        self.teardown().await;
        Ok(())
    }

    /// Send a chat message to the joined channel.
    pub async fn send_chat(&self, text: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Joined {
            return Err(Error::NotConnected);
        }
        let line = outbound::privmsg(&self.credentials.channel, text);
        write_locked(&mut inner, &line).await?;
        debug!(text, "chat message sent");
        Ok(())
    }

    /// Write one raw line through the critical section. Used for the setup
    /// pipeline and keep-alive acknowledgments, which are legal outside
    /// `Joined`.
    async fn write_line(&self, line: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        write_locked(&mut inner, line).await
    }

    /// Inbound loop: runs until the state machine leaves the active states
    /// or the transport ends. A physical read may carry several logical
    /// lines or a partial one; the buffered reader reassembles them.
    async fn read_loop(self: Arc<Self>, read_half: ReadHalf<TlsStream<TcpStream>>) {
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        loop {
            if !self.is_active().await {
                break;
            }
            line.clear();
            tokio::select! {
                _ = self.shutdown.notified() => break,
                read = reader.read_line(&mut line) => match read {
                    Ok(0) => {
                        info!("server closed the connection");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim_end_matches(&['\r', '\n'][..]);
                        if !trimmed.is_empty() {
                            self.dispatch(trimmed).await;
                        }
                    }
                    Err(e) => {
                        warn!("read error: {e}");
                        break;
                    }
                },
            }
        }
        self.teardown().await;
    }

    async fn is_active(&self) -> bool {
        matches!(
            self.inner.lock().await.state,
            SessionState::Open | SessionState::Authenticating | SessionState::Joined
        )
    }

    /// Route one complete line through the parser and the command table.
    /// Nothing here is fatal: malformed or unexpected lines are logged and
    /// dropped so one bad line never terminates the session.
    async fn dispatch(&self, line: &str) {
        let msg = match chorus_protocol::parse(line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(line, "dropping unparseable line: {e}");
                return;
            }
        };
        trace!(command = %msg.command, "inbound");

        match msg.command.as_str() {
            command::PING => {
                let reply = outbound::pong(msg.params.as_deref());
                if let Err(e) = self.write_line(&reply).await {
                    warn!("keep-alive reply failed: {e}");
                }
            }
            command::PRIVMSG => self.on_chat(&msg).await,
            command::PART => {
                let mut inner = self.inner.lock().await;
                if inner.state != SessionState::Closing {
                    info!("server closed the channel");
                    inner.state = SessionState::Closing;
                }
            }
            command::NOTICE => {
                // Carries authentication rejections; no retry policy here.
                warn!(notice = msg.params.as_deref().unwrap_or(""), "server notice");
            }
            command::RPL_WELCOME => {
                self.inner.lock().await.state = SessionState::Joined;
                info!("authenticated and joined, chat traffic enabled");
            }
            command::ERR_UNKNOWNCOMMAND => {
                debug!(notice = msg.params.as_deref().unwrap_or(""), "server rejected a command");
            }
            other if command::is_informational(other) => {
                trace!(command = other, "informational reply ignored");
            }
            other => {
                debug!(command = other, "unrecognized command ignored");
            }
        }
    }

    /// Feed one chat line to the tracker; on alert, hand the rendered echo
    /// utterance to the responder. `try_send` keeps the reader from ever
    /// blocking on a busy responder.
    async fn on_chat(&self, msg: &IrcMessage) {
        let Some(author) = msg.author() else {
            debug!("chat line without source, ignored");
            return;
        };
        let Some(text) = msg.params.as_deref() else {
            return;
        };

        let (alert, reply, score) = {
            let mut tracker = self.tracker.lock().await;
            let alert = tracker.add(author, text);
            let state = tracker.state();
            (alert, state.reply_text(), state.convergence_score)
        };

        if alert {
            debug!(score, %reply, "herd convergence detected");
            if self.reply_tx.try_send(reply).is_err() {
                debug!("responder busy, candidate dropped");
            }
        }
    }

    /// Release the transport and settle `Disconnected`. Idempotent.
    async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut writer) = inner.writer.take() {
            let _ = writer.shutdown().await;
        }
        if inner.state != SessionState::Disconnected {
            inner.state = SessionState::Disconnected;
            info!("session disconnected");
        }
    }
}

async fn write_locked(inner: &mut SessionInner, line: &str) -> Result<()> {
    let writer = inner.writer.as_mut().ok_or(Error::NotConnected)?;
    writer
        .write_all(line.as_bytes())
        .await
        .map_err(transport)?;
    writer.write_all(LINE_TERMINATOR).await.map_err(transport)?;
    writer.flush().await.map_err(transport)?;
    Ok(())
}

fn transport(e: std::io::Error) -> Error {
    Error::Transport(e.to_string())
}

/// Connect and handshake with the fixed endpoint, verifying against the
/// platform's native root certificates.
async fn connect_tls() -> Result<TlsStream<TcpStream>> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = roots.add(cert);
    }
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let tcp = TcpStream::connect((SERVER, PORT))
        .await
        .map_err(transport)?;
    let name = ServerName::try_from(SERVER).map_err(|e| Error::Transport(e.to_string()))?;
    connector.connect(name, tcp).await.map_err(transport)
}
