//! Minimal end-to-end demo: a sensor entity publishing readings while its
//! gain is reconfigured through the parameter service.
//!
//! Run with: cargo run -p tether-entity --example sensor

use std::time::Duration;

use tether_bus::{MessageBus, ParameterService};
use tether_entity::Entity;
use tether_types::ParamEntry;

#[derive(Debug, Clone)]
struct Reading {
    celsius: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bus = MessageBus::new();
    let (_service, params) = ParameterService::spawn();

    // The subscriber side: same class name and id address the same topic.
    let receiver = Entity::<Reading>::builder(1u64, "Thermometer")
        .on_message(|msg| println!("entity handler: {:.1} °C", msg.celsius))
        .build_subscriber(&bus, params.clone())?;
    receiver.add_listener(|msg| println!("listener: {:.1} °C", msg.celsius));

    // The publisher side, with reflected configuration.
    let sensor = Entity::<Reading>::builder(1u64, "Thermometer")
        .with_field("gain", 1.0)
        .with_field("offset", 0.0)
        .with_field("inverted", false)
        .build_publisher(&bus, params.clone())?;

    sensor.publish_meta_information().await?;
    println!("published meta information: {:?}", sensor.meta_batch());

    sensor.publish(Reading { celsius: 21.5 })?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Reconfigure the sensor externally.
    params
        .set_parameters(vec![ParamEntry::new("Thermometer1.gain", 2.5)])
        .await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("gain is now {:?}", sensor.field("gain"));
    Ok(())
}
