//! The GQ-RFC1201 command set. Each module owns the verbatim request frame for
//! one command and the parsing of its fixed-length response.

pub(crate) mod config;
pub(crate) mod cpm;
pub(crate) mod datetime;
pub(crate) mod gyroscope;
pub(crate) mod heartbeat;
pub(crate) mod power;
pub(crate) mod serial_number;
pub(crate) mod temperature;
pub(crate) mod version;
pub(crate) mod voltage;

/// Multi-field responses and single-byte acknowledgements end with this byte.
pub(crate) const RESPONSE_TERMINATOR: u8 = 0xAA;

/// Commands that acknowledge do so with a single terminator byte.
pub(crate) const ACK_RESPONSE_LEN: usize = 1;
