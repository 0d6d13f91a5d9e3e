//! # MBAP Transport Layer
//!
//! This module frames protocol data units with the 7-byte MBAP header and
//! moves them over any async byte stream.
//!
//! ## Supported Streams
//!
//! ### Modbus TCP (`TcpTransport`)
//! - A plain `tokio::net::TcpStream`
//!
//! ### Modbus UDP (`UdpTransport`)
//! - A connected `UdpSocket` behind the [`UdpStream`] adapter, so the
//!   framing code is the same as for TCP
//!
//! Any other `AsyncRead + AsyncWrite` (TLS streams, in-memory pipes) works
//! through [`MbapTransport::new`].
//!
//! ## Usage Examples
//!
//! ### Client
//!
//! ```rust,no_run
//! use mbap_transport::{ModbusTransport, Pdu, TcpTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut transport = TcpTransport::connect(
//!         "127.0.0.1:502".parse()?,
//!         TransportConfig::default(),
//!     ).await?;
//!
//!     // read holding registers 0x006B..0x006D of unit 0x11
//!     let request = Pdu::new(0x11, 0x03, vec![0x00, 0x6B, 0x00, 0x03]);
//!     let response = transport.execute_request(&request).await?;
//!     println!("Response: {}", response);
//!
//!     transport.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Server
//!
//! ```rust,no_run
//! use mbap_transport::{ModbusTransport, Pdu, TcpTransport, TransportConfig};
//! use tokio::net::TcpListener;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listener = TcpListener::bind("127.0.0.1:5020").await?;
//! let (socket, _) = listener.accept().await?;
//! let mut transport = TcpTransport::new(socket, TransportConfig::default());
//!
//! let request = transport.read_request().await?;
//! let response = Pdu::new(request.unit_id(), request.function_code(), request.payload().to_vec());
//! transport.write_response(&response).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};

use crate::config::TransportConfig;
use crate::datagram::UdpStream;
use crate::error::{ModbusError, ModbusResult};
use crate::logging::{CallbackLogger, LogLevel};
use crate::protocol::{encode_frame, pdu_from_frame, MbapHeader, Pdu, TransactionId};
use crate::utils::OperationTimer;
use crate::MBAP_HEADER_SIZE;

/// Run `fut` against an absolute deadline, reporting `operation` on expiry
async fn with_deadline<T, F>(deadline: Instant, operation: &str, limit: Duration, fut: F) -> ModbusResult<T>
where
    F: Future<Output = ModbusResult<T>>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ModbusError::timeout(operation, limit.as_millis() as u64)),
    }
}

/// Byte-stream capability required by the framing code
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// Transport layer abstraction consumed by client and server logic
///
/// ## Concurrency
///
/// Every operation takes `&mut self`: one exchange is in flight per
/// transport at a time. Run one transport per connection to go parallel.
#[async_trait]
pub trait ModbusTransport: Send {
    /// Send a request and wait for the response carrying the same transaction id
    ///
    /// One deadline covers the write and every read. Frames with a foreign
    /// protocol id or a stale transaction id are discarded and reading
    /// continues until the deadline.
    ///
    /// # Errors
    ///
    /// - `ModbusError::Timeout` - no matching response before the deadline
    /// - `ModbusError::Io` - connection broken or header truncated
    /// - `ModbusError::Protocol` - illegal MBAP length field
    /// - `ModbusError::Frame` - request too large for one frame
    async fn execute_request(&mut self, request: &Pdu) -> ModbusResult<Pdu>;

    /// Read exactly one request frame and remember its transaction id
    ///
    /// Unlike `execute_request` there is no matching loop, so a frame with
    /// a foreign protocol id is returned as `ModbusError::UnknownProtocolId`.
    async fn read_request(&mut self) -> ModbusResult<Pdu>;

    /// Write a response echoing the transaction id of the last request read
    async fn write_response(&mut self, response: &Pdu) -> ModbusResult<()>;

    /// Check if the transport still owns its connection
    fn is_connected(&self) -> bool;

    /// Close the underlying connection
    async fn close(&mut self) -> ModbusResult<()>;

    /// Get communication statistics
    fn get_stats(&self) -> TransportStats;
}

/// Transport layer statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub requests_received: u64,
    pub responses_sent: u64,
    /// Frames discarded because their transaction id did not match
    pub stale_frames: u64,
    /// Frames discarded because their protocol id was not 0
    pub foreign_protocol_frames: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// MBAP framing transport over a byte stream
pub struct MbapTransport<S> {
    stream: Option<S>,
    timeout: Duration,
    /// Last transaction id sent (client) or received (server)
    last_txn_id: TransactionId,
    stats: TransportStats,
    logger: CallbackLogger,
    /// Enable packet logging for debugging
    packet_logging: bool,
}

/// Modbus TCP transport
pub type TcpTransport = MbapTransport<TcpStream>;

/// Modbus UDP transport
pub type UdpTransport = MbapTransport<UdpStream>;

impl MbapTransport<TcpStream> {
    /// Connect to a Modbus TCP peer
    pub async fn connect(address: SocketAddr, config: TransportConfig) -> ModbusResult<Self> {
        config.validate()?;

        let stream = timeout(config.timeout(), TcpStream::connect(address))
            .await
            .map_err(|_| ModbusError::timeout(format!("connect to {}", address), config.timeout_ms))?
            .map_err(|e| ModbusError::connection(format!("Failed to connect to {}: {}", address, e)))?;

        Ok(Self::new(stream, config).labelled(format!("tcp-transport({})", address)))
    }
}

impl MbapTransport<UdpStream> {
    /// Open a UDP socket connected to a Modbus peer
    pub async fn connect(address: SocketAddr, config: TransportConfig) -> ModbusResult<Self> {
        config.validate()?;

        let stream = UdpStream::connect(address)
            .await
            .map_err(|e| ModbusError::connection(format!("Failed to connect to {}: {}", address, e)))?;

        Ok(Self::new(stream, config).labelled(format!("udp-transport({})", address)))
    }
}

impl<S: ByteStream> MbapTransport<S> {
    /// Wrap an established byte stream
    ///
    /// Diagnostics go to the `log` facade until a logger is injected with
    /// [`MbapTransport::with_logger`].
    pub fn new(stream: S, config: TransportConfig) -> Self {
        Self {
            stream: Some(stream),
            timeout: config.timeout(),
            last_txn_id: 0,
            stats: TransportStats::default(),
            logger: CallbackLogger::facade().with_prefix("mbap-transport"),
            packet_logging: config.packet_logging,
        }
    }

    /// Replace the diagnostics logger
    ///
    /// A logger without a prefix inherits the transport's label.
    pub fn with_logger(mut self, logger: CallbackLogger) -> Self {
        self.logger = if logger.prefix().is_empty() {
            logger.with_prefix(self.logger.prefix().to_string())
        } else {
            logger
        };
        self
    }

    fn labelled(mut self, label: String) -> Self {
        self.logger = self.logger.with_prefix(label);
        self
    }

    /// Enable or disable packet logging
    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.packet_logging = enabled;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Transaction id of the last request sent or received
    pub fn last_transaction_id(&self) -> TransactionId {
        self.last_txn_id
    }

    /// Reference to the underlying stream, `None` once closed
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    fn closed() -> ModbusError {
        ModbusError::connection("transport closed")
    }

    fn record<T>(&mut self, result: &ModbusResult<T>) {
        if let Err(error) = result {
            self.stats.errors += 1;
            if matches!(error, ModbusError::Timeout { .. }) {
                self.stats.timeouts += 1;
            }
        }
    }

    /// Write one complete frame
    async fn write_frame(&mut self, frame: &[u8]) -> ModbusResult<()> {
        let stream = self.stream.as_mut().ok_or_else(Self::closed)?;
        stream.write_all(frame).await?;
        stream.flush().await?;

        self.stats.bytes_sent += frame.len() as u64;
        if self.packet_logging {
            self.logger.log_packet(LogLevel::Debug, "send", frame);
        }
        Ok(())
    }

    /// Read one frame (MBAP header + PDU) off the stream
    async fn read_frame(&mut self) -> ModbusResult<(Pdu, TransactionId)> {
        let stream = self.stream.as_mut().ok_or_else(Self::closed)?;

        let mut header_buf = [0u8; MBAP_HEADER_SIZE];
        stream.read_exact(&mut header_buf).await?;
        let header = MbapHeader::decode(&header_buf);

        // never read more than the max allowed frame length
        let body_len = header.body_len()?;
        let mut body = vec![0u8; body_len];
        stream.read_exact(&mut body).await?;

        self.stats.bytes_received += (MBAP_HEADER_SIZE + body_len) as u64;
        if self.packet_logging {
            self.logger
                .log_packet(LogLevel::Debug, "receive", &[&header_buf[..], &body[..]].concat());
        }

        if !header.is_modbus() {
            self.stats.foreign_protocol_frames += 1;
            self.logger.warn(&format!(
                "received unexpected protocol id 0x{:04x}",
                header.protocol_id
            ));
            return Err(ModbusError::unknown_protocol_id(header.protocol_id));
        }

        Ok((pdu_from_frame(&header, &body), header.transaction_id))
    }

    /// Send the request, then read until the matching response shows up
    async fn exchange(&mut self, request: &Pdu) -> ModbusResult<Pdu> {
        let txn_id = self.last_txn_id.wrapping_add(1);
        let frame = encode_frame(txn_id, request)?;
        self.last_txn_id = txn_id;

        self.write_frame(&frame).await?;
        self.stats.requests_sent += 1;

        loop {
            let (response, response_txn_id) = match self.read_frame().await {
                Ok(frame) => frame,
                // already logged by read_frame
                Err(ModbusError::UnknownProtocolId { .. }) => continue,
                Err(error) => return Err(error),
            };

            if response_txn_id != txn_id {
                self.stats.stale_frames += 1;
                self.logger.warn(&format!(
                    "received unexpected transaction id (expected 0x{:04x}, received 0x{:04x})",
                    txn_id, response_txn_id
                ));
                continue;
            }

            self.stats.responses_received += 1;
            return Ok(response);
        }
    }
}

#[async_trait]
impl<S: ByteStream> ModbusTransport for MbapTransport<S> {
    async fn execute_request(&mut self, request: &Pdu) -> ModbusResult<Pdu> {
        let timer = OperationTimer::start("execute request");
        let limit = self.timeout;

        let result = with_deadline(self.deadline(), "execute request", limit, self.exchange(request)).await;

        timer.stop();
        self.record(&result);
        result
    }

    async fn read_request(&mut self) -> ModbusResult<Pdu> {
        let limit = self.timeout;

        let outcome = with_deadline(self.deadline(), "read request", limit, self.read_frame()).await;

        let result = match outcome {
            Ok((request, txn_id)) => {
                // echoed back by write_response
                self.last_txn_id = txn_id;
                self.stats.requests_received += 1;
                Ok(request)
            }
            Err(error) => Err(error),
        };

        self.record(&result);
        result
    }

    async fn write_response(&mut self, response: &Pdu) -> ModbusResult<()> {
        let limit = self.timeout;
        let deadline = self.deadline();

        let result = match encode_frame(self.last_txn_id, response) {
            Ok(frame) => with_deadline(deadline, "write response", limit, self.write_frame(&frame)).await,
            Err(error) => Err(error),
        };

        if result.is_ok() {
            self.stats.responses_sent += 1;
        }
        self.record(&result);
        result
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> ModbusResult<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn get_stats(&self) -> TransportStats {
        self.stats.clone()
    }
}
