//! Typed entity
//!
//! Binds a message type to exactly one publish or subscribe endpoint
//! addressed by the entity's name, and keeps the entity's reflected fields
//! synchronized with the process-wide parameter service.
//!
//! Inbound messages run the entity's own handler first, then every
//! registered listener in registration order. Inbound parameter events are
//! scope-filtered to this entity's name before each surviving entry is
//! decoded and assigned to the field registry.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use tether_bus::{
    BusError, MessageBus, ParameterClient, ParameterEvent, ParameterEventSubscription, Publisher,
    QosProfile, Subscription,
};
use tether_types::{PARAM_SEPARATOR, ParamEntry, ParamValue};

use crate::base::{EntityId, EntityInfo, EntityRole};
use crate::error::EntityError;
use crate::registry::{AssignOutcome, FieldRegistry};

/// Endpoint depth used unless the builder overrides it
const ENTITY_QOS_DEPTH: usize = 7;

/// Default wait for meta information submission
const META_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

type Listener<M> = Arc<dyn Fn(&M) + Send + Sync>;
type Handler<M> = Box<dyn Fn(&M) + Send + Sync>;

enum Endpoint<M> {
    Publisher(Publisher<M>),
    Subscriber(Subscription),
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────────────────────────────────────

/// A named, addressable pub/sub endpoint with reflected configuration fields
///
/// Construction acquires the endpoint and subscribes to the parameter-event
/// stream; the entity is active immediately and stays active until dropped,
/// which releases the endpoint and detaches the parameter subscription.
pub struct Entity<M> {
    info: EntityInfo,
    registry: Arc<Mutex<FieldRegistry>>,
    listeners: Arc<RwLock<Vec<Listener<M>>>>,
    endpoint: Endpoint<M>,
    params: ParameterClient,
    meta_timeout: Duration,
    _param_events: ParameterEventSubscription,
}

impl<M> Entity<M>
where
    M: Send + Sync + 'static,
{
    /// Start building an entity
    pub fn builder(id: impl Into<EntityId>, class_name: impl Into<String>) -> EntityBuilder<M> {
        EntityBuilder {
            id: id.into(),
            class_name: class_name.into(),
            virtual_entity: false,
            fields: Vec::new(),
            handler: None,
            qos: QosProfile::with_depth(ENTITY_QOS_DEPTH),
            meta_timeout: META_PUBLISH_TIMEOUT,
            _marker: PhantomData,
        }
    }

    /// The process-unique id
    pub fn id(&self) -> EntityId {
        self.info.id()
    }

    /// The addressable name: class name + id
    pub fn name(&self) -> String {
        self.info.name()
    }

    /// The concrete entity kind
    pub fn class_name(&self) -> &str {
        self.info.class_name()
    }

    /// True if this entity has no physical counterpart
    pub fn is_virtual(&self) -> bool {
        self.info.is_virtual()
    }

    /// True for subscriber-role entities
    pub fn is_subscriber(&self) -> bool {
        self.info.is_subscriber()
    }

    /// The full identity record
    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    /// Publish one message
    ///
    /// Returns `Ok(true)` once the message is handed to the endpoint. For
    /// subscriber-role entities this is a no-op returning `Ok(false)`.
    pub fn publish(&self, msg: M) -> Result<bool, EntityError> {
        match &self.endpoint {
            Endpoint::Publisher(publisher) => {
                publisher.send(msg)?;
                Ok(true)
            }
            Endpoint::Subscriber(_) => Ok(false),
        }
    }

    /// Append a listener to the fan-out list
    ///
    /// Listeners run after the entity's own handler, in the order they were
    /// added, for every inbound message. Registration never blocks dispatch
    /// and is safe while a message is being delivered.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
        tracing::debug!(entity = %self.info.name(), "listener added");
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Current value of one reflected field
    pub fn field(&self, key: &str) -> Option<ParamValue> {
        self.registry.lock().find(key).map(|f| f.value().clone())
    }

    /// The registry serialized as a parameter batch scoped to this entity
    pub fn meta_batch(&self) -> Vec<ParamEntry> {
        self.registry.lock().to_param_batch(&self.info.name())
    }

    /// Submit the registry's current contents to the parameter service
    ///
    /// Blocks (asynchronously) until the service has applied the batch, or
    /// until the configured timeout elapses. Must not be called from a
    /// context the bus's own delivery tasks depend on.
    pub async fn publish_meta_information(&self) -> Result<(), EntityError> {
        let batch = self.meta_batch();
        tracing::info!(entity = %self.info.name(), fields = batch.len(), "publishing meta information");
        self.params
            .set_parameters_timeout(batch, self.meta_timeout)
            .await
            .map_err(|e| match e {
                BusError::Timeout => EntityError::MetaPublishTimeout,
                other => EntityError::Bus(other),
            })
    }
}

impl<M> std::fmt::Debug for Entity<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.info.name())
            .field("role", &self.info.role())
            .field("fields", &self.registry.lock().len())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Synchronization
// ─────────────────────────────────────────────────────────────────────────────

/// Extract the field key from a qualified name scoped to `scope`
///
/// The name must start with `scope` followed by the separator; the key is
/// the last separator-delimited segment of the remainder. This is an exact
/// prefix match: "Sensor1" never claims "Sensor10.offset".
fn scoped_field_key<'a>(scope: &str, qualified: &'a str) -> Option<&'a str> {
    let rest = qualified.strip_prefix(scope)?;
    let rest = rest.strip_prefix(PARAM_SEPARATOR)?;
    rest.rsplit(PARAM_SEPARATOR).next()
}

/// Apply one parameter event to an entity's registry
///
/// The registry lock is held for the whole event, so a concurrent reader
/// sees either none or all of the event's field updates. Unknown keys and
/// kind mismatches are dropped per field; many entities share one event
/// stream and cross-talk is expected.
fn apply_parameter_event(scope: &str, registry: &Mutex<FieldRegistry>, event: &ParameterEvent) {
    let mut registry = registry.lock();
    for entry in event
        .new_parameters
        .iter()
        .chain(event.changed_parameters.iter())
    {
        let Some(key) = scoped_field_key(scope, &entry.name) else {
            continue;
        };
        match registry.assign(key, entry.value.clone()) {
            AssignOutcome::Updated => {
                tracing::debug!(entity = %scope, key = %key, value = %entry.value, "field updated");
            }
            AssignOutcome::UnknownKey => {
                tracing::debug!(entity = %scope, key = %key, "ignoring unknown field");
            }
            AssignOutcome::KindMismatch { expected, actual } => {
                tracing::debug!(
                    entity = %scope,
                    key = %key,
                    %expected,
                    %actual,
                    "ignoring kind mismatch"
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder collecting identity, fields, and the message handler
///
/// Fields are declared up front and registered during `build_*`, so the
/// registry is fully populated before the endpoint goes live.
pub struct EntityBuilder<M> {
    id: EntityId,
    class_name: String,
    virtual_entity: bool,
    fields: Vec<(String, ParamValue)>,
    handler: Option<Handler<M>>,
    qos: QosProfile,
    meta_timeout: Duration,
    _marker: PhantomData<fn(&M)>,
}

impl<M> EntityBuilder<M>
where
    M: Send + Sync + 'static,
{
    /// Mark the entity as virtual (no physical counterpart)
    pub fn virtual_entity(mut self, virtual_entity: bool) -> Self {
        self.virtual_entity = virtual_entity;
        self
    }

    /// Declare a reflected field with its initial value
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Set the entity's own message handler, invoked before any listener
    ///
    /// Only meaningful for subscriber-role entities; without one, inbound
    /// messages go straight to the listener fan-out.
    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Override the endpoint QoS
    pub fn qos(mut self, qos: QosProfile) -> Self {
        self.qos = qos;
        self
    }

    /// Override the meta information submission timeout
    pub fn meta_timeout(mut self, timeout: Duration) -> Self {
        self.meta_timeout = timeout;
        self
    }

    /// Build a publisher-role entity
    pub fn build_publisher(
        self,
        bus: &MessageBus,
        params: ParameterClient,
    ) -> Result<Entity<M>, EntityError> {
        self.build(bus, params, EntityRole::Publisher)
    }

    /// Build a subscriber-role entity
    pub fn build_subscriber(
        self,
        bus: &MessageBus,
        params: ParameterClient,
    ) -> Result<Entity<M>, EntityError> {
        self.build(bus, params, EntityRole::Subscriber)
    }

    fn build(
        self,
        bus: &MessageBus,
        params: ParameterClient,
        role: EntityRole,
    ) -> Result<Entity<M>, EntityError> {
        let info = EntityInfo::new(self.id, self.class_name, role, self.virtual_entity);
        let name = info.name();

        // A duplicate key is a programming defect; construction aborts.
        let mut registry = FieldRegistry::new();
        for (key, value) in self.fields {
            registry.register(key, value)?;
        }
        let registry = Arc::new(Mutex::new(registry));
        let listeners: Arc<RwLock<Vec<Listener<M>>>> = Arc::new(RwLock::new(Vec::new()));

        let endpoint = match role {
            EntityRole::Publisher => {
                Endpoint::Publisher(bus.create_publisher::<M>(&name, self.qos))
            }
            EntityRole::Subscriber => {
                let handler = self.handler.unwrap_or_else(|| Box::new(|_: &M| {}));
                let fanout = Arc::clone(&listeners);
                let dispatch_name = name.clone();
                let subscription = bus.create_subscription::<M, _>(&name, self.qos, move |msg| {
                    tracing::debug!(entity = %dispatch_name, "message received");
                    handler(msg);
                    // Snapshot so a listener may register further listeners
                    // without deadlocking the fan-out.
                    let snapshot: Vec<Listener<M>> = fanout.read().clone();
                    for listener in &snapshot {
                        listener(msg);
                    }
                });
                Endpoint::Subscriber(subscription)
            }
        };

        let sync_registry = Arc::clone(&registry);
        let scope = name.clone();
        let param_events = params.on_parameter_event(move |event| {
            apply_parameter_event(&scope, &sync_registry, event);
        });

        tracing::info!(entity = %name, role = %info.role(), "entity created");

        Ok(Entity {
            info,
            registry,
            listeners,
            endpoint,
            params,
            meta_timeout: self.meta_timeout,
            _param_events: param_events,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
