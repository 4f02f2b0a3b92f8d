//! Enroll and match through a serial-over-TCP bridge (e.g. ser2net)

use std::time::Duration;

use anyhow::Context;
use fpm383::{AutoEnroll, Device};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let addr = std::env::var("FPM383_ADDR").unwrap_or_else(|_| "192.168.1.50:4001".to_string());
    let (host, port) = addr
        .rsplit_once(':')
        .context("FPM383_ADDR must look like host:port")?;
    let port: u16 = port.parse().context("invalid port in FPM383_ADDR")?;

    let mut device = Device::tcp(host, port);
    device.connect().await?;

    let slot = 1;
    if device.fingerprint_exists(slot).await? {
        println!("Slot {} is taken, deleting it", slot);
        device.delete_fingerprint(slot).await?;
    }

    println!("Place the same finger on the sensor four times...");
    let progress = device
        .auto_enroll(AutoEnroll::new(slot, 4).with_finger_lift(true))
        .await?;
    println!("{}", progress);

    println!("Place a finger to match...");
    if device.wait_for_finger(Duration::from_secs(10)).await? {
        println!("{}", device.match_sync().await?);
    } else {
        println!("No finger detected");
    }

    device.disconnect().await?;
    Ok(())
}
