//! Serial port example: check the module and print what it reports

use tracing_subscriber::EnvFilter;
use fpm383::{Device, LedColor, LedSettings};

#[tokio::main]
async fn main() -> fpm383::Result<()> {
    // RUST_LOG=fpm383=trace shows every frame on the wire
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = std::env::var("FPM383_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    println!("Connecting to {}...", port);

    let mut device = Device::serial(port);
    device.connect().await?;
    println!("Connected");

    println!("Module: {}", device.module_id().await?);
    println!("Templates stored: {}", device.template_count().await?);

    device.set_led(LedSettings::on(LedColor::GREEN)).await?;

    device.disconnect().await?;
    println!("Disconnected");

    Ok(())
}
