//! Parameter service
//!
//! A process-wide table of named, typed parameters with a change-event
//! stream. The service runs as a command loop on its own task; clients
//! talk to it through a cheap, cloneable [`ParameterClient`] handle.
//!
//! Every accepted batch produces exactly one [`ParameterEvent`] splitting
//! the batch into entries never seen before ("new") and entries whose name
//! already existed ("changed"). Re-submitting an identical value still
//! counts as changed; the service does not diff values.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use tether_types::{ParamEntry, ParamValue};

use crate::config::BusConfig;
use crate::error::BusError;

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Event
// ─────────────────────────────────────────────────────────────────────────────

/// Notification that parameters were created or updated
#[derive(Debug, Clone, Default)]
pub struct ParameterEvent {
    /// Entries whose name was not in the table before this batch
    pub new_parameters: Vec<ParamEntry>,

    /// Entries whose name already existed
    pub changed_parameters: Vec<ParamEntry>,
}

impl ParameterEvent {
    /// Total number of entries in the event
    pub fn len(&self) -> usize {
        self.new_parameters.len() + self.changed_parameters.len()
    }

    /// True if the event carries no entries
    pub fn is_empty(&self) -> bool {
        self.new_parameters.is_empty() && self.changed_parameters.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Command
// ─────────────────────────────────────────────────────────────────────────────

enum ParameterCommand {
    Submit {
        entries: Vec<ParamEntry>,
        reply: oneshot::Sender<Result<(), BusError>>,
    },
    Get {
        name: String,
        reply: oneshot::Sender<Option<ParamValue>>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Service
// ─────────────────────────────────────────────────────────────────────────────

/// The running parameter service
///
/// Owns the table and the command loop. The loop exits once every client
/// handle has been dropped.
pub struct ParameterService {
    task: JoinHandle<()>,
}

impl ParameterService {
    /// Spawn the service with default capacities; returns the service and a client
    pub fn spawn() -> (Self, ParameterClient) {
        Self::spawn_with_config(&BusConfig::default())
    }

    /// Spawn the service honoring a [`BusConfig`]
    pub fn spawn_with_config(config: &BusConfig) -> (Self, ParameterClient) {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(config.parameter_channel_capacity.max(1));
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));

        let loop_event_tx = event_tx.clone();
        let task = tokio::spawn(async move {
            let mut table: HashMap<String, ParamValue> = HashMap::new();

            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    ParameterCommand::Submit { entries, reply } => {
                        let event = apply_batch(&mut table, entries);
                        tracing::debug!(
                            new = event.new_parameters.len(),
                            changed = event.changed_parameters.len(),
                            "parameter batch applied"
                        );
                        // No subscribers is fine; the event is simply unobserved.
                        let _ = loop_event_tx.send(event);
                        let _ = reply.send(Ok(()));
                    }
                    ParameterCommand::Get { name, reply } => {
                        let _ = reply.send(table.get(&name).cloned());
                    }
                }
            }
            tracing::debug!("parameter service loop exited");
        });

        let client = ParameterClient { cmd_tx, event_tx };
        (Self { task }, client)
    }
}

impl Drop for ParameterService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Apply a batch to the table, classifying each entry as new or changed
fn apply_batch(table: &mut HashMap<String, ParamValue>, entries: Vec<ParamEntry>) -> ParameterEvent {
    let mut event = ParameterEvent::default();
    for entry in entries {
        let existed = table.contains_key(&entry.name);
        table.insert(entry.name.clone(), entry.value.clone());
        if existed {
            event.changed_parameters.push(entry);
        } else {
            event.new_parameters.push(entry);
        }
    }
    event
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Client
// ─────────────────────────────────────────────────────────────────────────────

/// Cloneable handle to the parameter service
#[derive(Clone)]
pub struct ParameterClient {
    cmd_tx: mpsc::Sender<ParameterCommand>,
    event_tx: broadcast::Sender<ParameterEvent>,
}

impl ParameterClient {
    /// Submit a parameter batch and wait until the service has applied it
    pub async fn set_parameters(&self, entries: Vec<ParamEntry>) -> Result<(), BusError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(ParameterCommand::Submit {
                entries,
                reply: reply_tx,
            })
            .await
            .map_err(|_| BusError::ServiceUnavailable)?;

        reply_rx.await.map_err(|_| BusError::ServiceUnavailable)?
    }

    /// Like [`set_parameters`](Self::set_parameters) but gives up after `timeout`
    pub async fn set_parameters_timeout(
        &self,
        entries: Vec<ParamEntry>,
        timeout: Duration,
    ) -> Result<(), BusError> {
        tokio::time::timeout(timeout, self.set_parameters(entries))
            .await
            .map_err(|_| BusError::Timeout)?
    }

    /// Look up the current value of one parameter
    pub async fn get_parameter(&self, name: &str) -> Result<Option<ParamValue>, BusError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(ParameterCommand::Get {
                name: name.to_owned(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| BusError::ServiceUnavailable)?;

        reply_rx.await.map_err(|_| BusError::ServiceUnavailable)
    }

    /// Subscribe to the change-event stream
    ///
    /// `on_event` runs on a dedicated task for every event published after
    /// this call. Dropping the returned handle detaches the callback.
    pub fn on_parameter_event<F>(&self, on_event: F) -> ParameterEventSubscription
    where
        F: Fn(&ParameterEvent) + Send + Sync + 'static,
    {
        let mut rx = self.event_tx.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => on_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "parameter event subscription lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        ParameterEventSubscription { task }
    }
}

/// Handle to a live parameter-event subscription; dropping it detaches
#[derive(Debug)]
pub struct ParameterEventSubscription {
    task: JoinHandle<()>,
}

impl Drop for ParameterEventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_set_and_get_parameter() {
        let (_service, client) = ParameterService::spawn();

        tokio_test::assert_ok!(
            client
                .set_parameters(vec![ParamEntry::new("Sensor1.gain", 2.5)])
                .await
        );

        let value = client.get_parameter("Sensor1.gain").await.unwrap();
        assert_eq!(value, Some(ParamValue::Double(2.5)));
        assert_eq!(client.get_parameter("Sensor1.missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_event_classifies_new_and_changed() {
        let (_service, client) = ParameterService::spawn();
        let events: Arc<Mutex<Vec<ParameterEvent>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&events);
        let _sub = client.on_parameter_event(move |event| {
            sink.lock().push(event.clone());
        });

        client
            .set_parameters(vec![ParamEntry::new("Sensor1.gain", 1.0)])
            .await
            .unwrap();
        client
            .set_parameters(vec![
                ParamEntry::new("Sensor1.gain", 2.5),
                ParamEntry::new("Sensor1.offset", 0.1),
            ])
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].new_parameters.len(), 1);
        assert!(events[0].changed_parameters.is_empty());

        // Second batch: gain existed, offset did not
        assert_eq!(events[1].new_parameters.len(), 1);
        assert_eq!(events[1].new_parameters[0].name, "Sensor1.offset");
        assert_eq!(events[1].changed_parameters.len(), 1);
        assert_eq!(events[1].changed_parameters[0].name, "Sensor1.gain");
    }

    #[tokio::test]
    async fn test_set_parameters_timeout_succeeds_when_service_is_live() {
        let (_service, client) = ParameterService::spawn();
        tokio_test::assert_ok!(
            client
                .set_parameters_timeout(
                    vec![ParamEntry::new("Sensor1.enabled", true)],
                    Duration::from_secs(1),
                )
                .await
        );
    }

    #[tokio::test]
    async fn test_client_fails_after_service_dropped() {
        let (service, client) = ParameterService::spawn();
        drop(service);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let result = client
            .set_parameters(vec![ParamEntry::new("Sensor1.gain", 1.0)])
            .await;
        assert!(matches!(result, Err(BusError::ServiceUnavailable)));
    }
}
