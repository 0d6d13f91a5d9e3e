//! # MBAP Transport - Modbus framing over TCP and UDP
//!
//! The transport layer of a Modbus stack. It turns a protocol data unit
//! (unit id, function code, opaque payload) into an MBAP frame, sends it,
//! and rebuilds PDUs from the bytes coming back. Responses are correlated to
//! requests by transaction id. Stale frames and frames of foreign protocols
//! sharing the port are skipped.
//!
//! ## Features
//!
//! - **Async I/O**: built on Tokio, one deadline per exchange
//! - **One framing path for two socket kinds**: UDP runs through a
//!   byte-stream adapter, so TCP and UDP share the same decoder
//! - **Opaque payloads**: function codes and payloads pass through untouched
//! - **Injected diagnostics**: warnings go through a caller-supplied logger
//!
//! ## Wire Format
//!
//! | Field | Size | Notes |
//! |-------|------|-------|
//! | Transaction ID | 2 | big-endian, correlates request and response |
//! | Protocol ID | 2 | always 0x0000 |
//! | Length | 2 | big-endian, unit id + function code + payload |
//! | Unit ID | 1 | |
//! | Function Code | 1 | |
//! | Payload | 0-252 | |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mbap_transport::{ModbusTransport, ModbusResult, Pdu, UdpTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let mut transport = UdpTransport::connect(
//!         "192.168.1.20:502".parse().unwrap(),
//!         TransportConfig::default(),
//!     ).await?;
//!
//!     let response = transport.execute_request(&Pdu::new(1, 0x03, vec![0x00, 0x00, 0x00, 0x0A])).await?;
//!     println!("Response: {}", response);
//!
//!     transport.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  Client logic   │    │  Server logic   │
//! └─────────────────┘    └─────────────────┘
//!          │                       │
//! ┌─────────────────────────────────────────┐
//! │        MbapTransport (framing)          │
//! └─────────────────────────────────────────┘
//!          │                       │
//! ┌─────────────────┐    ┌─────────────────┐
//! │    TcpStream    │    │    UdpStream    │
//! │                 │    │ (datagram → byte│
//! │                 │    │    adapter)     │
//! └─────────────────┘    └─────────────────┘
//! ```

/// Core error types and result handling
pub mod error;

/// Protocol data unit and MBAP header codec
pub mod protocol;

/// Datagram-to-byte-stream adapter
pub mod datagram;

/// MBAP framing transport
pub mod transport;

/// Transport configuration
pub mod config;

/// Fixed-width integer conversion and timing helpers
pub mod utils;

/// Injected diagnostics logger
pub mod logging;

// Re-export main types for convenience
pub use error::{ModbusError, ModbusResult};
pub use protocol::{MbapHeader, Pdu, TransactionId, UnitId};
pub use datagram::{DatagramSocket, UdpStream};
pub use transport::{ByteStream, MbapTransport, ModbusTransport, TcpTransport, TransportStats, UdpTransport};
pub use config::TransportConfig;
pub use logging::{CallbackLogger, LogCallback, LogLevel};

/// Default timeout for operations (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Maximum Modbus TCP frame size (MBAP header + PDU)
pub const MAX_TCP_FRAME_SIZE: usize = 260;

/// MBAP header size, unit id included
pub const MBAP_HEADER_SIZE: usize = 7;

/// Modbus TCP default port
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
