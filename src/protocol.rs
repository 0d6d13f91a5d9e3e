/// MBAP protocol definitions and data structures
///
/// This module contains the protocol data unit exchanged with upper layers
/// and the 7-byte MBAP header that frames it on stream transports.

use std::fmt;
use bytes::{BufMut, BytesMut};

use crate::error::{ModbusError, ModbusResult};
use crate::utils::{bytes_to_uint16, uint16_to_bytes};
use crate::{MAX_TCP_FRAME_SIZE, MBAP_HEADER_SIZE};

/// Modbus unit identifier of the addressed downstream device
pub type UnitId = u8;

/// Transaction identifier correlating a request with its response
pub type TransactionId = u16;

/// Protocol identifier carried by every Modbus frame
pub const MODBUS_PROTOCOL_ID: u16 = 0x0000;

/// Largest payload that still fits in one frame (header + function code + payload)
pub const MAX_PAYLOAD_SIZE: usize = MAX_TCP_FRAME_SIZE - MBAP_HEADER_SIZE - 1;

/// Protocol data unit: unit id, function code and an opaque payload
///
/// The transport never interprets the function code or the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pdu {
    unit_id: UnitId,
    function_code: u8,
    payload: Vec<u8>,
}

impl Pdu {
    /// Create a new PDU
    pub fn new(unit_id: UnitId, function_code: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            unit_id,
            function_code,
            payload: payload.into(),
        }
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    pub fn function_code(&self) -> u8 {
        self.function_code
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the PDU, returning `(unit_id, function_code, payload)`
    pub fn into_parts(self) -> (UnitId, u8, Vec<u8>) {
        (self.unit_id, self.function_code, self.payload)
    }

    /// Value of the MBAP length field for this PDU (unit id + function code + payload)
    pub fn mbap_length(&self) -> usize {
        2 + self.payload.len()
    }

    /// Total size of the frame carrying this PDU
    pub fn frame_len(&self) -> usize {
        MBAP_HEADER_SIZE + 1 + self.payload.len()
    }
}

impl fmt::Display for Pdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unit:{} fc:0x{:02X} payload:{} bytes",
            self.unit_id,
            self.function_code,
            self.payload.len()
        )
    }
}

/// Decoded MBAP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: TransactionId,
    pub protocol_id: u16,
    pub length: u16,
    pub unit_id: UnitId,
}

impl MbapHeader {
    /// Decode the fixed 7-byte header
    pub fn decode(buf: &[u8; MBAP_HEADER_SIZE]) -> Self {
        Self {
            transaction_id: bytes_to_uint16(&buf[0..2]),
            protocol_id: bytes_to_uint16(&buf[2..4]),
            length: bytes_to_uint16(&buf[4..6]),
            unit_id: buf[6],
        }
    }

    /// Number of bytes following the header (function code + payload)
    ///
    /// The length field counts the unit id, which is already part of the
    /// header. A length of 0 or 1, or one implying a frame above
    /// `MAX_TCP_FRAME_SIZE`, is a protocol violation.
    pub fn body_len(&self) -> ModbusResult<usize> {
        let remaining = self.length as i32 - 1;

        if remaining + MBAP_HEADER_SIZE as i32 > MAX_TCP_FRAME_SIZE as i32 {
            return Err(ModbusError::protocol(format!(
                "MBAP length {} exceeds maximum frame size of {} bytes",
                self.length, MAX_TCP_FRAME_SIZE
            )));
        }

        if remaining <= 0 {
            return Err(ModbusError::protocol(format!(
                "illegal MBAP length {}",
                self.length
            )));
        }

        Ok(remaining as usize)
    }

    pub fn is_modbus(&self) -> bool {
        self.protocol_id == MODBUS_PROTOCOL_ID
    }
}

/// Build a PDU from the header and the bytes that followed it
///
/// `body` must hold at least the function code, which `MbapHeader::body_len`
/// guarantees for any header it accepts.
pub fn pdu_from_frame(header: &MbapHeader, body: &[u8]) -> Pdu {
    Pdu::new(header.unit_id, body[0], &body[1..])
}

/// Turn a PDU into a complete MBAP frame
///
/// Layout: transaction id (BE), protocol id 0x0000, length (BE), unit id,
/// function code, payload. There is no padding and no checksum.
pub fn encode_frame(transaction_id: TransactionId, pdu: &Pdu) -> ModbusResult<Vec<u8>> {
    if pdu.frame_len() > MAX_TCP_FRAME_SIZE {
        return Err(ModbusError::frame(format!(
            "PDU payload of {} bytes exceeds maximum of {}",
            pdu.payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(pdu.frame_len());
    frame.put_slice(&uint16_to_bytes(transaction_id));
    frame.put_slice(&uint16_to_bytes(MODBUS_PROTOCOL_ID));
    frame.put_slice(&uint16_to_bytes(pdu.mbap_length() as u16));
    frame.put_u8(pdu.unit_id);
    frame.put_u8(pdu.function_code);
    frame.put_slice(&pdu.payload);

    Ok(frame.to_vec())
}
