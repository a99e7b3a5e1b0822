//! Read radiation data from GQ GMC Geiger counters over a serial connection
//!
//! Tested with a GMC-300E Plus; other GMC devices speaking the GQ-RFC1201
//! command set should work too.
//!
//! The device exposes a USB serial port (57600 baud on recent firmware) and a
//! simple command/response protocol: ASCII command frames like `<GETCPM>>`
//! answered with fixed-length binary responses.
//!
//! Currently the following data can be accessed:
//!
//! - Counts per minute, and the derived dose rate (µSv/h)
//! - Battery voltage (V)
//! - Hardware model, firmware revision and serial number
//! - Device calibration, clock and temperature
//! - Per-second counts via heartbeat mode
//!
//! # Example
//!
//! ```no_run
//! # use std::time::Duration;
//! #
//! # #[tokio::main]
//! # pub async fn main() {
//!     let mut client = gmcread::GmcClient::open_default_baud("/dev/ttyUSB0").unwrap();
//!     let factor = client
//!         .get_calibration_factor()
//!         .await
//!         .unwrap_or(gmcread::DEFAULT_CALIBRATION_FACTOR);
//!     loop {
//!         let reading = client.fetch_reading(factor).await.unwrap();
//!         println!("{reading:?}");
//!         tokio::time::sleep(Duration::from_secs(30)).await;
//!     }
//! # }
//! ```

mod command;
mod error;
mod gmc_client;
mod poller;
mod reading;

pub use command::datetime::DeviceDateTime;
pub use command::gyroscope::GyroscopePosition;
pub use command::version::DeviceVersion;
pub use error::GmcError;
pub use gmc_client::{GmcClient, DEFAULT_BAUD};
pub use poller::{Poller, SensorState};
pub use reading::{convert, Reading, DEFAULT_CALIBRATION_FACTOR};
