/// Utility functions and helpers for MBAP framing
///
/// This module contains fixed-width integer conversion, hex formatting
/// and exchange timing helpers.

use std::time::{Duration, Instant};
use byteorder::{BigEndian, ByteOrder};
use log::debug;

/// Encode a u16 into two bytes, most significant first (network order)
pub fn uint16_to_bytes(value: u16) -> [u8; 2] {
    let mut out = [0u8; 2];
    BigEndian::write_u16(&mut out, value);
    out
}

/// Decode a big-endian u16 from the first two bytes of `data`
///
/// # Panics
///
/// Panics if `data` holds fewer than two bytes.
pub fn bytes_to_uint16(data: &[u8]) -> u16 {
    BigEndian::read_u16(data)
}

/// Timer for measuring operation duration
pub struct OperationTimer {
    start: Instant,
    operation_name: String,
}

impl OperationTimer {
    /// Start a new timer
    pub fn start(operation_name: &str) -> Self {
        debug!("Starting operation: {}", operation_name);
        Self {
            start: Instant::now(),
            operation_name: operation_name.to_string(),
        }
    }

    /// Stop the timer and return duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        debug!(
            "Operation '{}' completed in {}",
            self.operation_name,
            format::format_duration(duration)
        );
        duration
    }
}

/// Formatting and display utilities
pub mod format {
    use super::*;

    /// Format byte array as hex string
    pub fn bytes_to_hex(bytes: &[u8]) -> String {
        bytes.iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Format duration in a human-readable way
    pub fn format_duration(duration: Duration) -> String {
        let millis = duration.as_millis();
        if millis < 1000 {
            format!("{}ms", millis)
        } else if millis < 60_000 {
            format!("{:.2}s", duration.as_secs_f64())
        } else {
            let mins = millis / 60_000;
            let secs = (millis % 60_000) as f64 / 1000.0;
            format!("{}m {:.1}s", mins, secs)
        }
    }
}

/// Logging utilities
pub mod logging {
    /// Initialize simple logger for testing
    pub fn init_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint16_conversion() {
        assert_eq!(uint16_to_bytes(0x1234), [0x12, 0x34]);
        assert_eq!(uint16_to_bytes(0xFFFF), [0xFF, 0xFF]);

        assert_eq!(bytes_to_uint16(&[0x00, 0x01]), 0x0001);
        assert_eq!(bytes_to_uint16(&uint16_to_bytes(0xBEEF)), 0xBEEF);

        // only the first two bytes count
        assert_eq!(bytes_to_uint16(&[0xFF, 0xFE, 0x99]), 0xFFFE);
    }

    #[test]
    fn test_formatting() {
        let bytes = vec![0x00, 0x01, 0x00, 0x00, 0xFF];
        assert_eq!(format::bytes_to_hex(&bytes), "00 01 00 00 FF");

        assert_eq!(format::format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format::format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_operation_timer() {
        logging::init_test_logger();
        let timer = OperationTimer::start("noop");
        let elapsed = timer.stop();
        assert!(elapsed < Duration::from_secs(5));
    }
}
