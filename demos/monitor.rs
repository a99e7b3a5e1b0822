use std::time::Duration;

#[tokio::main]
pub async fn main() {
    let mut client = gmcread::GmcClient::open_default_baud("/dev/ttyUSB0").unwrap();
    let factor = client
        .get_calibration_factor()
        .await
        .unwrap_or(gmcread::DEFAULT_CALIBRATION_FACTOR);
    loop {
        let reading = client.fetch_reading(factor).await.unwrap();
        println!("{reading:?}");
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
}
