//! Periodic polling of a GMC device.
//!
//! The poller owns the client and ticks at a fixed interval, publishing each
//! cycle's outcome on a watch channel. A failed cycle publishes
//! [`SensorState::Unavailable`] and the next tick tries again; no device error
//! ever escapes the poll task. Stopping the poller cancels the task and drops
//! the client, which releases the serial handle.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::GmcError;
use crate::gmc_client::GmcClient;
use crate::reading::Reading;

/// What the sensors should currently show.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorState {
    /// The last poll cycle succeeded
    Available(Reading),
    /// The last poll cycle failed; stale values must not be shown
    Unavailable,
}

/// A handle to a running poll task.
pub struct Poller {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Poller {
    // How many times a cycle retries a failed fetch before going unavailable
    const FETCH_ATTEMPTS: u32 = 3;

    /// Spawn a poll task over the given client. The first cycle runs
    /// immediately; the receiver starts out [`SensorState::Unavailable`] until
    /// it completes.
    pub fn spawn<T>(
        client: GmcClient<T>,
        interval: Duration,
        calibration_factor: f64,
    ) -> (Self, watch::Receiver<SensorState>)
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(SensorState::Unavailable);
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut client = client;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let state = match Self::fetch_with_retry(&mut client, calibration_factor).await {
                            Ok(reading) => {
                                debug!(cpm = reading.cpm, "poll cycle complete");
                                SensorState::Available(reading)
                            }
                            Err(err) => {
                                warn!(%err, "poll cycle failed, sensors unavailable");
                                SensorState::Unavailable
                            }
                        };
                        if state_tx.send(state).is_err() {
                            // Nobody is listening any more
                            break;
                        }
                    }
                }
            }
            // The client is dropped here, releasing the serial handle
        });

        (Self { shutdown, task }, state_rx)
    }

    /// Stop the poll task and release the device.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }

    async fn fetch_with_retry<T>(
        client: &mut GmcClient<T>,
        calibration_factor: f64,
    ) -> Result<Reading, GmcError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut attempt = 1;
        loop {
            match client.fetch_reading(calibration_factor).await {
                Ok(reading) => return Ok(reading),
                Err(err) if attempt < Self::FETCH_ATTEMPTS => {
                    warn!(%err, attempt, "fetch failed, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    const POLL_INTERVAL: Duration = Duration::from_millis(20);

    fn test_client() -> (GmcClient<DuplexStream>, DuplexStream) {
        let (near, far) = tokio::io::duplex(1024);
        let client = GmcClient::from_transport(near).with_read_timeout(Duration::from_millis(50));
        (client, far)
    }

    /// Answer CPM and voltage requests for `cycles` full poll cycles, then
    /// go quiet while keeping the port open.
    async fn serve_cycles(device: &mut DuplexStream, cycles: usize) {
        let mut buf = [0u8; 64];
        for _ in 0..cycles * 2 {
            let n = device.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            match &buf[..n] {
                b"<GETCPM>>" => device.write_all(&[0x00, 0x64]).await.unwrap(),
                b"<GETVOLT>>" => device.write_all(&[42]).await.unwrap(),
                other => panic!("unexpected request: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_poller_publishes_reading() {
        let (client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            serve_cycles(&mut device, 1).await;
            device
        });

        let (poller, mut state_rx) = Poller::spawn(client, POLL_INTERVAL, 0.0065);
        state_rx.changed().await.unwrap();
        match &*state_rx.borrow_and_update() {
            SensorState::Available(reading) => {
                assert_eq!(reading.cpm, 100);
                assert_eq!(reading.dose_rate_usv_h, 0.65);
                assert_eq!(reading.battery_voltage_v, 4.2);
            }
            SensorState::Unavailable => panic!("expected a reading"),
        }

        poller.stop().await;
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_poller_goes_unavailable_when_device_stops_responding() {
        let (client, mut device) = test_client();
        let device_task = tokio::spawn(async move {
            // One good cycle, then silence
            serve_cycles(&mut device, 1).await;
            device
        });

        let (poller, mut state_rx) = Poller::spawn(client, POLL_INTERVAL, 0.0065);

        state_rx.changed().await.unwrap();
        assert!(matches!(
            &*state_rx.borrow_and_update(),
            SensorState::Available(_)
        ));

        // The next cycle exhausts its retries against a silent device and
        // must mark the sensors unavailable rather than fail out of the loop
        state_rx.changed().await.unwrap();
        assert!(matches!(
            &*state_rx.borrow_and_update(),
            SensorState::Unavailable
        ));

        poller.stop().await;
        device_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_releases_the_transport() {
        let (client, mut device) = test_client();
        let (poller, mut state_rx) = Poller::spawn(client, POLL_INTERVAL, 0.0065);

        let device_task = tokio::spawn(async move {
            serve_cycles(&mut device, 1).await;
            // After the poller stops, the near end is dropped and we see EOF
            let mut buf = [0u8; 16];
            loop {
                match device.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(_) => continue,
                    Err(err) => panic!("expected EOF, got {err}"),
                }
            }
            // The handle stays released: further reads keep reporting EOF
            assert_eq!(device.read(&mut buf).await.unwrap(), 0);
        });

        state_rx.changed().await.unwrap();
        poller.stop().await;
        device_task.await.unwrap();
    }
}
