//! Talk to GQ GMC Geiger counters over a serial connection.
//!
//! The device speaks the GQ-RFC1201 protocol: commands are ASCII frames of the
//! form `<CMD>>` and every response is a fixed number of raw bytes, so an
//! exchange is "write the frame, read exactly N bytes within a timeout".
//! Stale bytes (e.g. leftover heartbeat samples) are drained before each
//! command so a response is never misattributed.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;
use tokio_serial::SerialStream;
use tracing::debug;

use crate::command;
use crate::command::datetime::DeviceDateTime;
use crate::command::gyroscope::GyroscopePosition;
use crate::command::version::DeviceVersion;
use crate::error::GmcError;
use crate::reading::Reading;

/// Baud rate used by GMC-300 V3.xx and later firmware
pub const DEFAULT_BAUD: u32 = 57600;

/// A client for a single GMC device. Owns the serial handle exclusively;
/// dropping the client releases it.
pub struct GmcClient<T> {
    transport: T,
    read_timeout: Duration,
}

impl GmcClient<SerialStream> {
    /// Open the serial device at the given path and baud rate.
    pub fn open(path: &str, baud: u32) -> Result<Self, GmcError> {
        let transport = tokio_serial::new(path, baud)
            .open_native_async()
            .map_err(|source| GmcError::Connect {
                path: path.to_owned(),
                source,
            })?;
        debug!(path, baud, "opened serial connection");
        Ok(Self::from_transport(transport))
    }

    /// Open the serial device at the default GMC baud rate.
    pub fn open_default_baud(path: &str) -> Result<Self, GmcError> {
        Self::open(path, DEFAULT_BAUD)
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> GmcClient<T> {
    // How long to wait for a complete response before giving up
    const READ_TIMEOUT: Duration = Duration::from_secs(1);
    // How long to wait for further stale bytes when clearing the input side
    const DRAIN_TIMEOUT: Duration = Duration::from_millis(5);
    // Heartbeat samples arrive once per second, so the wait must cover a
    // full sample period plus slack
    const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Wrap an already-open transport. Used by tests to run the protocol over
    /// an in-memory pipe.
    pub fn from_transport(transport: T) -> Self {
        Self {
            transport,
            read_timeout: Self::READ_TIMEOUT,
        }
    }

    /// Override the per-command response window.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Close the serial connection, releasing the OS handle.
    pub fn close(self) {}

    /// Read one snapshot of all polled values from the device. The dose rate
    /// is derived from the CPM with the given calibration factor.
    pub async fn fetch_reading(&mut self, calibration_factor: f64) -> Result<Reading, GmcError> {
        let cpm = self.get_cpm().await?;
        let battery_voltage_v = self.get_voltage().await?;
        Ok(Reading::new(cpm, battery_voltage_v, calibration_factor))
    }

    /// Get the current counts-per-minute value.
    pub async fn get_cpm(&mut self) -> Result<u16, GmcError> {
        let rsp = self
            .request_response(command::cpm::REQUEST, command::cpm::RESPONSE_LEN)
            .await?;
        Ok(command::cpm::parse(&rsp))
    }

    /// Get the battery voltage in volts.
    pub async fn get_voltage(&mut self) -> Result<f64, GmcError> {
        let rsp = self
            .request_response(command::voltage::REQUEST, command::voltage::RESPONSE_LEN)
            .await?;
        command::voltage::parse(&rsp)
    }

    /// Get the hardware model and firmware revision.
    pub async fn get_version(&mut self) -> Result<DeviceVersion, GmcError> {
        let rsp = self
            .request_response(command::version::REQUEST, command::version::RESPONSE_LEN)
            .await?;
        command::version::parse(&rsp)
    }

    /// Get the device serial number as an uppercase hex string.
    pub async fn get_serial_number(&mut self) -> Result<String, GmcError> {
        let rsp = self
            .request_response(
                command::serial_number::REQUEST,
                command::serial_number::RESPONSE_LEN,
            )
            .await?;
        Ok(command::serial_number::parse(&rsp))
    }

    /// Get the CPM → µSv/h conversion factor stored in the device
    /// configuration. Fails if the calibration points are unusable, in which
    /// case callers fall back to a per-model default.
    pub async fn get_calibration_factor(&mut self) -> Result<f64, GmcError> {
        let rsp = self
            .request_response(command::config::REQUEST, command::config::RESPONSE_LEN)
            .await?;
        command::config::parse_calibration_factor(&rsp)
    }

    /// Get the internal temperature in °C. Only supported by GMC-320
    /// Re 3.01 or later.
    pub async fn get_temperature(&mut self) -> Result<f64, GmcError> {
        let rsp = self
            .request_response(
                command::temperature::REQUEST,
                command::temperature::RESPONSE_LEN,
            )
            .await?;
        command::temperature::parse(&rsp)
    }

    /// Get the gyroscope position. Only supported by GMC-320 Re 3.01 or
    /// later.
    pub async fn get_gyroscope(&mut self) -> Result<GyroscopePosition, GmcError> {
        let rsp = self
            .request_response(
                command::gyroscope::REQUEST,
                command::gyroscope::RESPONSE_LEN,
            )
            .await?;
        command::gyroscope::parse(&rsp)
    }

    /// Get the device clock.
    pub async fn get_datetime(&mut self) -> Result<DeviceDateTime, GmcError> {
        let rsp = self
            .request_response(
                command::datetime::GET_REQUEST,
                command::datetime::GET_RESPONSE_LEN,
            )
            .await?;
        command::datetime::parse(&rsp)
    }

    /// Set the device clock.
    pub async fn set_datetime(&mut self, datetime: &DeviceDateTime) -> Result<(), GmcError> {
        let rq = command::datetime::set_request(datetime)?;
        let rsp = self
            .request_response(&rq, command::ACK_RESPONSE_LEN)
            .await?;
        Self::check_ack(&rsp)
    }

    /// Turn on heartbeat mode. The device then pushes one counts-per-second
    /// sample every second; read them with [`Self::read_heartbeat`].
    pub async fn enable_heartbeat(&mut self) -> Result<(), GmcError> {
        self.request_response(command::heartbeat::ENABLE_REQUEST, 0)
            .await?;
        Ok(())
    }

    /// Turn off heartbeat mode and discard any samples still in flight.
    pub async fn disable_heartbeat(&mut self) -> Result<(), GmcError> {
        self.request_response(command::heartbeat::DISABLE_REQUEST, 0)
            .await?;
        self.drain_input().await
    }

    /// Read one counts-per-second sample while heartbeat mode is on.
    pub async fn read_heartbeat(&mut self) -> Result<u16, GmcError> {
        let mut buf = [0u8; command::heartbeat::SAMPLE_LEN];
        self.read_response(&mut buf, Self::HEARTBEAT_TIMEOUT).await?;
        Ok(command::heartbeat::parse_sample(&buf))
    }

    /// Power the device on.
    pub async fn power_on(&mut self) -> Result<(), GmcError> {
        self.request_response(command::power::ON_REQUEST, 0).await?;
        Ok(())
    }

    /// Power the device off.
    pub async fn power_off(&mut self) -> Result<(), GmcError> {
        self.request_response(command::power::OFF_REQUEST, 0)
            .await?;
        Ok(())
    }

    /// Reboot the device.
    pub async fn reboot(&mut self) -> Result<(), GmcError> {
        self.request_response(command::power::REBOOT_REQUEST, 0)
            .await?;
        Ok(())
    }

    /// Reset the device to factory defaults.
    pub async fn factory_reset(&mut self) -> Result<(), GmcError> {
        let rsp = self
            .request_response(
                command::power::FACTORY_RESET_REQUEST,
                command::ACK_RESPONSE_LEN,
            )
            .await?;
        Self::check_ack(&rsp)
    }

    /// Issue one command frame and read its fixed-length response. A
    /// `response_len` of zero means the command produces no response.
    async fn request_response(
        &mut self,
        rq: &[u8],
        response_len: usize,
    ) -> Result<Vec<u8>, GmcError> {
        self.drain_input().await?;

        debug!(command = %String::from_utf8_lossy(rq), "TX");
        self.transport.write_all(rq).await?;
        self.transport.flush().await?;

        if response_len == 0 {
            return Ok(Vec::new());
        }

        let mut rsp = vec![0u8; response_len];
        self.read_response(&mut rsp, self.read_timeout).await?;
        debug!(response = %hex::encode(&rsp), "RX");
        Ok(rsp)
    }

    /// Fill `buf` from the transport within `window`. A closed transport
    /// mid-response is a protocol failure; anything else that prevents a full
    /// read within the window is a timeout.
    async fn read_response(&mut self, buf: &mut [u8], window: Duration) -> Result<(), GmcError> {
        match timeout(window, self.transport.read_exact(buf)).await {
            Err(_) => Err(GmcError::Timeout(window)),
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(GmcError::Protocol("short response"))
            }
            Ok(Err(err)) => Err(GmcError::Io(err)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Discard any bytes already waiting on the input side, so the next read
    /// sees only the response to the next command.
    async fn drain_input(&mut self) -> Result<(), GmcError> {
        let mut scratch = [0u8; 64];
        loop {
            match timeout(Self::DRAIN_TIMEOUT, self.transport.read(&mut scratch)).await {
                // Nothing pending
                Err(_) => return Ok(()),
                // EOF; surfaced properly by the next read
                Ok(Ok(0)) => return Ok(()),
                Ok(Ok(n)) => {
                    debug!(discarded = %hex::encode(&scratch[..n]), "drained stale input");
                }
                Ok(Err(err)) => return Err(GmcError::Io(err)),
            }
        }
    }

    fn check_ack(rsp: &[u8]) -> Result<(), GmcError> {
        if rsp == [command::RESPONSE_TERMINATOR] {
            Ok(())
        } else {
            Err(GmcError::Protocol("unexpected acknowledgement"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    const TEST_TIMEOUT: Duration = Duration::from_millis(100);

    fn test_client() -> (GmcClient<DuplexStream>, DuplexStream) {
        let (near, far) = tokio::io::duplex(1024);
        let client = GmcClient::from_transport(near).with_read_timeout(TEST_TIMEOUT);
        (client, far)
    }

    /// Expect exactly `rq` on the far end, then answer with `rsp`.
    async fn serve_one(device: &mut DuplexStream, rq: &[u8], rsp: &[u8]) {
        let mut buf = vec![0u8; rq.len()];
        device.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, rq);
        device.write_all(rsp).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_cpm() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<GETCPM>>", &[0x00, 0x64]).await;
            device
        });
        assert_eq!(client.get_cpm().await.unwrap(), 100);
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_voltage() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<GETVOLT>>", &[42]).await;
            device
        });
        assert_eq!(client.get_voltage().await.unwrap(), 4.2);
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_cpm_timeout() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            // Swallow the request, never respond
            let mut buf = [0u8; 9];
            device.read_exact(&mut buf).await.unwrap();
            device
        });
        assert!(matches!(
            client.get_cpm().await,
            Err(GmcError::Timeout(_))
        ));
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_cpm_short_response() {
        let (mut client, mut device) = test_client();
        tokio::spawn(async move {
            let mut buf = [0u8; 9];
            device.read_exact(&mut buf).await.unwrap();
            // One byte instead of two, then hang up
            device.write_all(&[0x00]).await.unwrap();
        });
        assert!(matches!(
            client.get_cpm().await,
            Err(GmcError::Protocol("short response"))
        ));
    }

    #[tokio::test]
    async fn test_get_datetime_bad_terminator() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<GETDATETIME>>", &[26, 8, 31, 13, 45, 7, 0x00]).await;
            device
        });
        assert!(matches!(
            client.get_datetime().await,
            Err(GmcError::Protocol(_))
        ));
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_input_is_drained_before_command() {
        let (mut client, mut device) = test_client();
        // Leftover heartbeat sample from before the mode was switched off
        device.write_all(&[0x00, 0x07]).await.unwrap();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<GETCPM>>", &[0x00, 0x64]).await;
            device
        });
        assert_eq!(client.get_cpm().await.unwrap(), 100);
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_reading() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<GETCPM>>", &[0x00, 0x64]).await;
            serve_one(&mut device, b"<GETVOLT>>", &[42]).await;
            device
        });
        let reading = client.fetch_reading(0.0065).await.unwrap();
        assert_eq!(reading.cpm, 100);
        assert_eq!(reading.dose_rate_usv_h, 0.65);
        assert_eq!(reading.battery_voltage_v, 4.2);
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_factory_reset_ack() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<FACTORYRESET>>", &[0xaa]).await;
            device
        });
        client.factory_reset().await.unwrap();
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_factory_reset_bad_ack() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<FACTORYRESET>>", &[0x00]).await;
            device
        });
        assert!(matches!(
            client.factory_reset().await,
            Err(GmcError::Protocol(_))
        ));
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_gyroscope() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<GETGYRO>>", &[0x01, 0x00, 0x00, 0x02, 0x00, 0x03, 0xaa])
                .await;
            device
        });
        let position = client.get_gyroscope().await.unwrap();
        assert_eq!((position.x, position.y, position.z), (256, 2, 3));
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_heartbeat() {
        let (mut client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<HEARTBEAT1>>", &[]).await;
            device.write_all(&[0xc0, 0x05]).await.unwrap();
            device
        });
        client.enable_heartbeat().await.unwrap();
        assert_eq!(client.read_heartbeat().await.unwrap(), 5);
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_calibration_factor() {
        let (mut client, mut device) = test_client();
        let mut cfg = vec![0u8; 256];
        for (cpm_at, usv_at, cpm, usv) in
            [(8, 10, 60u16, 0.39f32), (14, 16, 240, 1.56), (20, 22, 1000, 6.5)]
        {
            cfg[cpm_at..cpm_at + 2].copy_from_slice(&cpm.to_be_bytes());
            cfg[usv_at..usv_at + 4].copy_from_slice(&usv.to_le_bytes());
        }
        let device_task = tokio::spawn(async move {
            serve_one(&mut device, b"<GETCFG>>", &cfg).await;
            device
        });
        let factor = client.get_calibration_factor().await.unwrap();
        assert!((factor - 0.0065).abs() < 1e-7);
        device_task.await.unwrap();
    }
}
