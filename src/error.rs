//! # MBAP Transport Error Handling
//!
//! This module defines the error type shared by the stream transport, the
//! datagram adapter and the configuration loaders.
//!
//! ## Error Categories
//!
//! ### Transport Errors
//! - **I/O Errors**: broken connections, short reads on the fixed header, socket failures
//! - **Connection Errors**: use of a transport after it was closed
//! - **Timeout Errors**: the exchange deadline expired
//!
//! ### Protocol Errors
//! - **Protocol Errors**: an MBAP length field that is zero or implies an oversize frame
//! - **Unknown Protocol Identifier**: a well-formed frame carrying a protocol id other than 0
//! - **Frame Errors**: a PDU too large to be encoded into a single frame
//!
//! ### System Errors
//! - **Configuration Errors**: malformed or invalid transport configuration
//!
//! ## Error Recovery
//!
//! The client matching loop recovers from [`ModbusError::UnknownProtocolId`] on its
//! own. Everything else aborts the current call and is handed to the caller, who
//! decides whether to re-issue the request:
//!
//! ```rust
//! use mbap_transport::{ModbusError, ModbusResult, Pdu};
//!
//! fn handle(result: ModbusResult<Pdu>) {
//!     match result {
//!         Ok(pdu) => println!("Response: {}", pdu),
//!         Err(error) if error.is_recoverable() => println!("Retryable error: {}", error),
//!         Err(error) => println!("Fatal error: {}", error),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Result type alias for transport operations
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Transport error types
///
/// Each variant carries enough context to diagnose the failure without
/// access to the raw frame.
#[derive(Error, Debug, Clone)]
pub enum ModbusError {
    /// I/O related errors (network socket)
    ///
    /// The original `std::io::ErrorKind` is preserved so callers can tell a
    /// truncated header (`UnexpectedEof`) from a reset connection.
    #[error("I/O error: {message}")]
    Io { kind: io::ErrorKind, message: String },

    /// Connection errors
    ///
    /// # Examples
    /// - Connection refused by remote host
    /// - Transport used after `close()`
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Timeout errors
    ///
    /// Raised when the deadline covering an exchange expires.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Protocol-level errors
    ///
    /// # Examples
    /// - MBAP length field of 0
    /// - MBAP length field implying a frame larger than 260 bytes
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Frame carried a protocol identifier other than 0x0000
    #[error("Unknown protocol identifier: 0x{protocol_id:04x}")]
    UnknownProtocolId { protocol_id: u16 },

    /// Frame encoding errors
    #[error("Frame error: {message}")]
    Frame { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ModbusError {
    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { kind: io::ErrorKind::Other, message: message.into() }
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection { message: message.into() }
    }

    /// Create a new timeout error
    ///
    /// # Arguments
    ///
    /// * `operation` - Description of the operation that timed out
    /// * `timeout_ms` - Timeout duration in milliseconds
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol { message: message.into() }
    }

    /// Create an unknown protocol identifier error
    pub fn unknown_protocol_id(protocol_id: u16) -> Self {
        Self::UnknownProtocolId { protocol_id }
    }

    /// Create a frame error
    pub fn frame<S: Into<String>>(message: S) -> Self {
        Self::Frame { message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Check if the error is recoverable (the caller may re-issue the request)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mbap_transport::ModbusError;
    ///
    /// let timeout_error = ModbusError::timeout("execute request", 5000);
    /// assert!(timeout_error.is_recoverable());
    ///
    /// let protocol_error = ModbusError::protocol("MBAP length of 0");
    /// assert!(!protocol_error.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. } => true,
            Self::Timeout { .. } => true,
            Self::UnknownProtocolId { .. } => true,
            _ => false,
        }
    }

    /// Check if the error is a network/transport issue
    pub fn is_transport_error(&self) -> bool {
        matches!(self,
            Self::Io { .. } |
            Self::Connection { .. } |
            Self::Timeout { .. }
        )
    }

    /// Check if the error is a protocol issue
    pub fn is_protocol_error(&self) -> bool {
        matches!(self,
            Self::Protocol { .. } |
            Self::UnknownProtocolId { .. } |
            Self::Frame { .. }
        )
    }
}

/// Convert from std::io::Error
///
/// Keeps both the error kind and its message.
impl From<io::Error> for ModbusError {
    fn from(err: io::Error) -> Self {
        Self::Io { kind: err.kind(), message: err.to_string() }
    }
}

/// Convert from serde JSON errors
impl From<serde_json::Error> for ModbusError {
    fn from(err: serde_json::Error) -> Self {
        Self::configuration(format!("JSON error: {}", err))
    }
}

/// Convert from serde YAML errors
impl From<serde_yaml::Error> for ModbusError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::configuration(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ModbusError::timeout("execute request", 5000);
        assert!(err.is_recoverable());
        assert!(err.is_transport_error());

        let err = ModbusError::protocol("MBAP length of 0");
        assert!(!err.is_recoverable());
        assert!(err.is_protocol_error());

        let err = ModbusError::unknown_protocol_id(0x0001);
        assert!(err.is_protocol_error());
        assert!(!err.is_transport_error());
    }

    #[test]
    fn test_error_display() {
        let err = ModbusError::unknown_protocol_id(0x00ab);
        let msg = format!("{}", err);
        assert!(msg.contains("Unknown protocol identifier"));
        assert!(msg.contains("0x00ab"));

        let err = ModbusError::timeout("read request", 250);
        assert_eq!(err.to_string(), "Timeout after 250ms: read request");
    }

    #[test]
    fn test_io_error_keeps_kind() {
        let err: ModbusError = io::Error::new(io::ErrorKind::UnexpectedEof, "early eof").into();
        match err {
            ModbusError::Io { kind, message } => {
                assert_eq!(kind, io::ErrorKind::UnexpectedEof);
                assert!(message.contains("early eof"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
