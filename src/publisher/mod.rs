// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Event publication to the message bus

use std::time::Duration;

use anyhow::{anyhow, Result};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tracing::{info, warn};

use crate::config::BrokerConfig;

/// How long to wait for the broker to acknowledge the initial connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Downstream publish primitive consumed by the dispatch loop.
///
/// Steady-state delivery is the client's own concern; the dispatch loop
/// calls [`publish`](Publisher::publish) and never retries on its behalf.
pub trait Publisher: Send + Sync {
    /// Hand one serialized event to the bus.
    fn publish(&self, payload: &str);

    /// Tear down the connection.
    fn close(&self);
}

/// MQTT client wrapper.
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
}

impl MqttPublisher {
    /// Connect to the broker.
    ///
    /// Blocks until the broker acknowledges the connection; failure here is
    /// a startup-fatal condition, not a runtime retry case.
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);

        loop {
            match tokio::time::timeout(CONNECT_TIMEOUT, eventloop.poll()).await {
                Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => {
                    info!("Connected to broker at {}:{}", config.host, config.port);
                    break;
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => {
                    return Err(anyhow!(
                        "Couldn't establish a connection to the broker at {}:{}: {}",
                        config.host,
                        config.port,
                        e
                    ));
                }
                Err(_) => {
                    return Err(anyhow!(
                        "Timed out connecting to the broker at {}:{}",
                        config.host,
                        config.port
                    ));
                }
            }
        }

        // The event loop must keep being polled for the client to make
        // progress; reconnects after a broker outage happen here.
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Broker connection re-established");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT error: {:?}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        Ok(Self {
            client,
            topic: config.topic.clone(),
        })
    }
}

impl Publisher for MqttPublisher {
    fn publish(&self, payload: &str) {
        if let Err(e) = self
            .client
            .try_publish(&self.topic, QoS::AtLeastOnce, false, payload)
        {
            warn!("MQTT publish failed: {}", e);
        }
    }

    fn close(&self) {
        let _ = self.client.try_disconnect();
    }
}
