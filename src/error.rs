use std::time::Duration;
use thiserror::Error;

/// Errors arising from talking to a GMC device.
#[derive(Debug, Error)]
pub enum GmcError {
    /// The serial device could not be opened.
    #[error("failed to open serial port {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },
    /// The serial connection failed mid-exchange.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The device did not produce a full response within the read window.
    #[error("no response from device within {0:?}")]
    Timeout(Duration),
    /// The device responded with bytes that do not match the expected shape.
    #[error("malformed response: {0}")]
    Protocol(&'static str),
}
