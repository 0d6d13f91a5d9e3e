use std::sync::Arc;

/// Log levels for the callback logging system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Error messages
    Error,
    /// Warning messages
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
}

impl LogLevel {
    /// Convert log level to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Type alias for log callback functions
///
/// The callback receives a log level and message string
pub type LogCallback = Box<dyn Fn(LogLevel, &str) + Send + Sync>;

/// Logger that uses callbacks for flexible logging
///
/// This is the diagnostics capability injected into a transport. Every
/// message is prefixed with the component name, e.g.
/// `tcp-transport(10.0.0.5:502): received unexpected protocol id 0x0001`.
#[derive(Clone)]
pub struct CallbackLogger {
    callback: Option<Arc<LogCallback>>,
    min_level: LogLevel,
    prefix: String,
}

impl CallbackLogger {
    /// Create a new callback logger
    pub fn new(callback: Option<LogCallback>, min_level: LogLevel) -> Self {
        Self {
            callback: callback.map(Arc::new),
            min_level,
            prefix: String::new(),
        }
    }

    /// Create a logger that forwards to the `log` facade
    pub fn facade() -> Self {
        let callback: LogCallback = Box::new(|level, message| match level {
            LogLevel::Error => log::error!("{}", message),
            LogLevel::Warn => log::warn!("{}", message),
            LogLevel::Info => log::info!("{}", message),
            LogLevel::Debug => log::debug!("{}", message),
        });
        Self::new(Some(callback), LogLevel::Debug)
    }

    /// Create a logger with default console output
    pub fn console() -> Self {
        let callback: LogCallback = Box::new(|level, message| {
            let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
            match level {
                LogLevel::Error | LogLevel::Warn => {
                    eprintln!("[{}] {}: {}", timestamp, level.as_str(), message)
                }
                LogLevel::Info | LogLevel::Debug => {
                    println!("[{}] {}: {}", timestamp, level.as_str(), message)
                }
            }
        });
        Self::new(Some(callback), LogLevel::Info)
    }

    /// Create a logger that outputs nothing (disabled)
    pub fn disabled() -> Self {
        Self::new(None, LogLevel::Error)
    }

    /// Return a copy of this logger that prefixes messages with `prefix`
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Current message prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Log a message at the specified level
    pub fn log(&self, level: LogLevel, message: &str) {
        if self.should_log(level) {
            if let Some(ref callback) = self.callback {
                if self.prefix.is_empty() {
                    callback(level, message);
                } else {
                    callback(level, &format!("{}: {}", self.prefix, message));
                }
            }
        }
    }

    /// Log an error message
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Log a warning message
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Log an info message
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log a debug message
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Check if a message at the given level should be logged
    fn should_log(&self, level: LogLevel) -> bool {
        self.callback.is_some() && level as u8 <= self.min_level as u8
    }

    /// Log packet data with hex dump
    pub fn log_packet(&self, level: LogLevel, direction: &str, data: &[u8]) {
        if !self.should_log(level) {
            return;
        }

        let message = format!("{} packet ({} bytes): {}", direction, data.len(), hex::encode(data));
        self.log(level, &message);
    }
}

impl Default for CallbackLogger {
    fn default() -> Self {
        Self::facade()
    }
}

impl std::fmt::Debug for CallbackLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackLogger")
            .field("enabled", &self.callback.is_some())
            .field("min_level", &self.min_level)
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Convenience macro for creating a custom logger
#[macro_export]
macro_rules! custom_logger {
    ($callback:expr) => {
        $crate::logging::CallbackLogger::new(Some($callback), $crate::logging::LogLevel::Info)
    };
    ($callback:expr, $level:expr) => {
        $crate::logging::CallbackLogger::new(Some($callback), $level)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn capturing(min_level: LogLevel) -> (CallbackLogger, Arc<Mutex<Vec<(LogLevel, String)>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let callback: LogCallback = Box::new(move |level, message| {
            sink.lock().unwrap().push((level, message.to_string()));
        });
        (CallbackLogger::new(Some(callback), min_level), lines)
    }

    #[test]
    fn test_level_filtering() {
        let (logger, lines) = capturing(LogLevel::Warn);
        logger.error("e");
        logger.warn("w");
        logger.info("i");
        logger.debug("d");

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (LogLevel::Error, "e".to_string()));
        assert_eq!(lines[1], (LogLevel::Warn, "w".to_string()));
    }

    #[test]
    fn test_prefix() {
        let (logger, lines) = capturing(LogLevel::Debug);
        let logger = logger.with_prefix("tcp-transport(127.0.0.1:502)");
        logger.warn("received unexpected protocol id 0x0001");

        assert_eq!(
            lines.lock().unwrap()[0].1,
            "tcp-transport(127.0.0.1:502): received unexpected protocol id 0x0001"
        );
    }

    #[test]
    fn test_log_packet_hex() {
        let (logger, lines) = capturing(LogLevel::Debug);
        logger.log_packet(LogLevel::Debug, "send", &[0x00, 0x01, 0xAB]);
        assert_eq!(lines.lock().unwrap()[0].1, "send packet (3 bytes): 0001ab");
    }

    #[test]
    fn test_console_and_facade_loggers() {
        let console = CallbackLogger::console().with_prefix("console");
        assert!(console.should_log(LogLevel::Info));
        assert!(!console.should_log(LogLevel::Debug));
        console.info("console logger ready");

        let facade = CallbackLogger::default();
        assert!(facade.should_log(LogLevel::Debug));
        facade.warn("forwarded to the log facade");
    }

    #[test]
    fn test_disabled_logger() {
        let logger = CallbackLogger::disabled();
        // must not panic without a callback
        logger.error("nothing");
        assert!(!logger.should_log(LogLevel::Error));
    }

    #[test]
    fn test_custom_logger_macro() {
        let callback: LogCallback = Box::new(|_, _| {});
        let logger = custom_logger!(callback, LogLevel::Warn);
        assert!(logger.should_log(LogLevel::Warn));
        assert!(!logger.should_log(LogLevel::Info));
    }
}
