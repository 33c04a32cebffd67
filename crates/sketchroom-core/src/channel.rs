//! Connection channel to the room server.
//!
//! The engine only needs fire-and-forget sends and non-blocking polling, so
//! the transport sits behind the [`Channel`] trait. [`WsChannel`] runs a
//! WebSocket on a background thread; [`LoopbackChannel`] keeps everything in
//! process.

use crate::protocol::{ClientMessage, ProtocolError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tungstenite::Message;
use tungstenite::protocol::CloseFrame;
use url::Url;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
    #[error("channel is closed")]
    Closed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Connection lifecycle as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Closed,
}

/// Events surfaced by [`Channel::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The connection is open.
    Connected,
    /// A text frame from the server.
    Message(String),
    /// The server closed the connection.
    Closed { code: Option<u16>, reason: String },
    /// The connection failed.
    Error(String),
}

/// A bidirectional text-frame channel.
pub trait Channel {
    /// Queue a frame for delivery. Does not wait for it to be written.
    fn send(&mut self, frame: String) -> Result<(), ChannelError>;

    /// Drain events received since the last poll.
    fn poll_events(&mut self) -> Vec<ChannelEvent>;
}

#[derive(Debug, Default)]
struct LoopbackState {
    sent: Vec<String>,
    inbound: VecDeque<ChannelEvent>,
    closed: bool,
}

/// An in-process channel. Clones share the same queues, so one handle can be
/// given to the engine while another feeds it frames and inspects sends.
#[derive(Debug, Clone, Default)]
pub struct LoopbackChannel {
    state: Rc<RefCell<LoopbackState>>,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().sent)
    }

    /// Queue a frame as if the server had sent it.
    pub fn push_incoming(&self, frame: impl Into<String>) {
        self.state
            .borrow_mut()
            .inbound
            .push_back(ChannelEvent::Message(frame.into()));
    }

    /// Reject further sends.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.inbound.push_back(ChannelEvent::Closed {
            code: None,
            reason: String::new(),
        });
    }
}

impl Channel for LoopbackChannel {
    fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(ChannelError::Closed);
        }
        state.sent.push(frame);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<ChannelEvent> {
        self.state.borrow_mut().inbound.drain(..).collect()
    }
}

/// Instructions for the socket worker thread.
enum WsCommand {
    Send(String),
    Close,
}

/// WebSocket channel for native platforms.
///
/// Uses a background thread for non-blocking operation. The thread sends
/// `join_room` as soon as the socket opens.
pub struct WsChannel {
    state: ConnectionState,
    cmd_tx: Option<Sender<WsCommand>>,
    event_rx: Receiver<ChannelEvent>,
    _thread: Option<JoinHandle<()>>,
}

/// Build the connection URL with the token as a query parameter.
///
/// Only plain `ws` is accepted; the socket is built without TLS support.
pub fn channel_url(server: &str, token: &str) -> Result<Url, ChannelError> {
    let mut url = Url::parse(server).map_err(|e| ChannelError::InvalidUrl(e.to_string()))?;
    if url.scheme() != "ws" {
        return Err(ChannelError::InvalidUrl(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

impl WsChannel {
    /// Connect to `server`, authenticating with `token`, and join `room_id`.
    pub fn connect(server: &str, token: &str, room_id: &str) -> Result<Self, ChannelError> {
        let url = channel_url(server, token)?;
        let join = ClientMessage::join(room_id).to_json()?;

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<ChannelEvent>();

        let handle = thread::spawn(move || run_socket(url, join, cmd_rx, event_tx));

        Ok(Self {
            state: ConnectionState::Connecting,
            cmd_tx: Some(cmd_tx),
            event_rx,
            _thread: Some(handle),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Close the socket. Further sends fail.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.state = ConnectionState::Closed;
    }
}

impl Channel for WsChannel {
    fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        let tx = self.cmd_tx.as_ref().ok_or(ChannelError::Closed)?;
        tx.send(WsCommand::Send(frame))
            .map_err(|_| ChannelError::Closed)
    }

    fn poll_events(&mut self) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            match &event {
                ChannelEvent::Connected => self.state = ConnectionState::Connected,
                ChannelEvent::Closed { .. } | ChannelEvent::Error(_) => {
                    self.state = ConnectionState::Closed;
                    self.cmd_tx = None;
                }
                ChannelEvent::Message(_) => {}
            }
            events.push(event);
        }
        events
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn close_event(frame: Option<CloseFrame<'_>>) -> ChannelEvent {
    match frame {
        Some(frame) => ChannelEvent::Closed {
            code: Some(u16::from(frame.code)),
            reason: frame.reason.to_string(),
        },
        None => ChannelEvent::Closed {
            code: None,
            reason: String::new(),
        },
    }
}

fn run_socket(url: Url, join: String, cmd_rx: Receiver<WsCommand>, event_tx: Sender<ChannelEvent>) {
    log::info!("WebSocket thread: connecting to {}", url.host_str().unwrap_or("?"));

    let mut socket = match tungstenite::connect(url.as_str()) {
        Ok((socket, response)) => {
            log::info!("Channel connected ({})", response.status());
            socket
        }
        Err(tungstenite::Error::Http(response)) => {
            log::error!("WebSocket handshake rejected: {}", response.status());
            let _ = event_tx.send(ChannelEvent::Error(format!(
                "handshake rejected: {}",
                response.status()
            )));
            return;
        }
        Err(e) => {
            log::error!("WebSocket connection failed: {e}");
            let _ = event_tx.send(ChannelEvent::Error(format!("connection failed: {e}")));
            return;
        }
    };

    match socket.get_mut() {
        tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("non-plain stream, relying on default timeouts"),
    }

    let _ = event_tx.send(ChannelEvent::Connected);
    if let Err(e) = socket.send(Message::Text(join)) {
        log::error!("WebSocket join failed: {e}");
        let _ = event_tx.send(ChannelEvent::Error(e.to_string()));
        return;
    }

    let closed = loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(frame)) => {
                if let Err(e) = socket.send(Message::Text(frame)) {
                    log::error!("WebSocket send error: {e}");
                    break ChannelEvent::Error(e.to_string());
                }
            }
            Ok(WsCommand::Close) | Err(TryRecvError::Disconnected) => {
                log::info!("Channel close requested");
                let _ = socket.close(None);
                break close_event(None);
            }
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                let _ = event_tx.send(ChannelEvent::Message(text));
            }
            Ok(Message::Close(frame)) => {
                log::info!("Channel closed by peer");
                break close_event(frame);
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(tungstenite::Error::ConnectionClosed) => break close_event(None),
            Err(e) => {
                log::error!("WebSocket read error: {e}");
                break ChannelEvent::Error(e.to_string());
            }
        }
    };

    log::debug!("Socket worker stopped");
    let _ = event_tx.send(closed);
}
