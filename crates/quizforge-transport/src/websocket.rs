//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::handshake::select_subprotocol;
use crate::{
    CloseCode, Connection, ConnectionId, Handshake, Transport, TransportError,
};

type WsStream = WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    /// Sub-protocols the server is willing to speak, in preference order.
    subprotocols: Vec<String>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            subprotocols: Vec::new(),
        })
    }

    /// Sets the sub-protocols offered during the upgrade.
    pub fn with_subprotocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subprotocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(
        &mut self,
    ) -> Result<(Self::Connection, Handshake), Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // The upgrade callback is the only place the HTTP request is
        // visible, so everything the handlers need is copied out here.
        let supported = &self.subprotocols;
        let mut captured = Handshake::default();
        let callback = |req: &Request,
                        mut resp: Response|
         -> Result<Response, ErrorResponse> {
            let mut handshake = Handshake::new(req.uri().path());
            if let Some(query) = req.uri().query() {
                handshake = handshake.with_query(query);
            }
            for (name, value) in req.headers() {
                if let Ok(value) = value.to_str() {
                    handshake = handshake.with_header(name.as_str(), value);
                }
            }

            let selected = req
                .headers()
                .get(SEC_WEBSOCKET_PROTOCOL)
                .and_then(|v| v.to_str().ok())
                .and_then(|offered| select_subprotocol(offered, supported));
            if let Some(protocol) = selected {
                if let Ok(value) = HeaderValue::from_str(&protocol) {
                    resp.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
                    handshake = handshake.with_subprotocol(protocol);
                }
            }

            captured = handshake;
            Ok(resp)
        };

        let ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .map_err(|e| TransportError::HandshakeFailed(e.to_string()))?;

        let id = ConnectionId::next();
        tracing::debug!(
            %id,
            %addr,
            path = captured.path(),
            subprotocol = ?captured.subprotocol(),
            "accepted WebSocket connection"
        );

        let (sink, stream) = ws.split();
        let conn = WebSocketConnection {
            id,
            peer: addr,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        };
        Ok((conn, captured))
    }
}

/// A single WebSocket connection.
///
/// The socket is split so that a task blocked in [`recv`](Connection::recv)
/// never holds up writers: the room actor sends on the sink half while the
/// connection's handler waits on the stream half.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// The remote address of the client.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        // JSON payloads go out as text frames so browsers get strings.
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        self.sink
            .lock()
            .await
            .send(msg)
            .await
            .map_err(send_error)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(
                    WsError::ConnectionClosed | WsError::AlreadyClosed,
                )) => return Ok(None),
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(
        &self,
        code: CloseCode,
        reason: &str,
    ) -> Result<(), Self::Error> {
        let frame = CloseFrame {
            code: ws_close_code(code),
            reason: reason.to_owned().into(),
        };
        self.sink
            .lock()
            .await
            .send(Message::Close(Some(frame)))
            .await
            .map_err(send_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

fn ws_close_code(code: CloseCode) -> WsCloseCode {
    match code {
        CloseCode::Normal => WsCloseCode::Normal,
        CloseCode::PolicyViolation => WsCloseCode::Policy,
        CloseCode::InternalError => WsCloseCode::Error,
    }
}

fn send_error(e: WsError) -> TransportError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            TransportError::ConnectionClosed(e.to_string())
        }
        other => TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            other,
        )),
    }
}
