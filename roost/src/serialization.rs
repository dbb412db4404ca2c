//! # Message Serialization
//!
//! Registry of serializers used to verify that messages survive a trip
//! through bytes. With `Settings::serialize_all_messages` on, every user
//! message is round-tripped before it is enqueued and the receiver gets the
//! deserialized copy.
//!
//! Types opt in with [`Serialization::register`] and opt out with
//! [`Serialization::exempt`]. Kernel messages that carry references
//! (`Terminated`, router management) are exempt from the start.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use roost_api::errors::ActorError;
use roost_api::message::Terminated;
use roost_api::routing::{AddRoutee, Broadcast, GetRoutees, RemoveRoutee, Routees};
use roost_api::types::{ActorResult, Message};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Id of the built-in JSON serializer.
pub const JSON_SERIALIZER_ID: u32 = 1;

/// Converts messages to and from bytes.
pub trait Serializer: Send + Sync {
    /// Stable id written next to the bytes.
    fn identifier(&self) -> u32;

    fn to_binary(&self, message: &Message) -> ActorResult<Vec<u8>>;

    fn from_binary(&self, bytes: &[u8], type_id: TypeId) -> ActorResult<Message>;
}

type EncodeFn = fn(&(dyn Any + Send + Sync)) -> ActorResult<Vec<u8>>;
type DecodeFn = fn(&[u8]) -> ActorResult<Message>;

#[derive(Clone, Copy)]
struct Codec {
    encode: EncodeFn,
    decode: DecodeFn,
}

fn encode_json<M: Serialize + 'static>(message: &(dyn Any + Send + Sync)) -> ActorResult<Vec<u8>> {
    let message = message
        .downcast_ref::<M>()
        .ok_or_else(|| ActorError::Serialization(format!("not a {}", type_name::<M>())))?;
    serde_json::to_vec(message)
        .map_err(|e| ActorError::Serialization(format!("{}: {}", type_name::<M>(), e)))
}

fn decode_json<M: DeserializeOwned + Any + Send + Sync>(bytes: &[u8]) -> ActorResult<Message> {
    serde_json::from_slice::<M>(bytes)
        .map(|message| Arc::new(message) as Message)
        .map_err(|e| ActorError::Serialization(format!("{}: {}", type_name::<M>(), e)))
}

/// `serde_json` backed serializer for registered types.
#[derive(Default)]
pub struct JsonSerializer {
    codecs: DashMap<TypeId, Codec>,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M>(&self)
    where
        M: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        self.codecs.insert(
            TypeId::of::<M>(),
            Codec {
                encode: encode_json::<M>,
                decode: decode_json::<M>,
            },
        );
    }

    fn codec(&self, type_id: TypeId) -> ActorResult<Codec> {
        self.codecs
            .get(&type_id)
            .map(|c| *c.value())
            .ok_or_else(|| ActorError::Serialization(format!("no JSON codec for {:?}", type_id)))
    }
}

impl Serializer for JsonSerializer {
    fn identifier(&self) -> u32 {
        JSON_SERIALIZER_ID
    }

    fn to_binary(&self, message: &Message) -> ActorResult<Vec<u8>> {
        let codec = self.codec((**message).type_id())?;
        (codec.encode)(&**message)
    }

    fn from_binary(&self, bytes: &[u8], type_id: TypeId) -> ActorResult<Message> {
        let codec = self.codec(type_id)?;
        (codec.decode)(bytes)
    }
}

/// Serializer registry of one actor system.
pub struct Serialization {
    json: Arc<JsonSerializer>,
    serializers: DashMap<u32, Arc<dyn Serializer>>,
    bindings: DashMap<TypeId, u32>,
    exempt: DashSet<TypeId>,
}

impl Serialization {
    pub fn new() -> Self {
        let json = Arc::new(JsonSerializer::new());
        let serialization = Self {
            json: json.clone(),
            serializers: DashMap::new(),
            bindings: DashMap::new(),
            exempt: DashSet::new(),
        };
        serialization.add_serializer(json);
        serialization.exempt::<Terminated>();
        serialization.exempt::<Broadcast>();
        serialization.exempt::<GetRoutees>();
        serialization.exempt::<Routees>();
        serialization.exempt::<AddRoutee>();
        serialization.exempt::<RemoveRoutee>();
        serialization
    }

    /// Binds `M` to the JSON serializer.
    pub fn register<M>(&self)
    where
        M: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        self.json.register::<M>();
        self.bindings.insert(TypeId::of::<M>(), JSON_SERIALIZER_ID);
    }

    /// Binds `M` to an already added serializer.
    pub fn bind<M: Any>(&self, serializer_id: u32) -> ActorResult<()> {
        if !self.serializers.contains_key(&serializer_id) {
            return Err(ActorError::Serialization(format!(
                "serializer {} not registered",
                serializer_id
            )));
        }
        self.bindings.insert(TypeId::of::<M>(), serializer_id);
        Ok(())
    }

    pub fn add_serializer(&self, serializer: Arc<dyn Serializer>) {
        self.serializers.insert(serializer.identifier(), serializer);
    }

    /// Skips verification for `M`.
    pub fn exempt<M: Any>(&self) {
        self.exempt.insert(TypeId::of::<M>());
    }

    pub fn is_exempt(&self, message: &Message) -> bool {
        self.exempt.contains(&(**message).type_id())
    }

    pub fn find_serializer_for(&self, message: &Message) -> ActorResult<Arc<dyn Serializer>> {
        let type_id = (**message).type_id();
        let id = self
            .bindings
            .get(&type_id)
            .map(|b| *b.value())
            .ok_or_else(|| ActorError::Serialization(format!("no serializer bound for {:?}", type_id)))?;
        self.serializer(id)
    }

    pub fn serializer(&self, id: u32) -> ActorResult<Arc<dyn Serializer>> {
        self.serializers
            .get(&id)
            .map(|s| s.value().clone())
            .ok_or_else(|| ActorError::Serialization(format!("serializer {} not registered", id)))
    }

    pub fn serialize(&self, message: &Message) -> ActorResult<(u32, Vec<u8>)> {
        let serializer = self.find_serializer_for(message)?;
        Ok((serializer.identifier(), serializer.to_binary(message)?))
    }

    pub fn deserialize(&self, bytes: &[u8], serializer_id: u32, type_id: TypeId) -> ActorResult<Message> {
        self.serializer(serializer_id)?.from_binary(bytes, type_id)
    }

    /// Round-trips `message`, returning the copy to deliver. Exempt messages
    /// are returned as they are.
    pub fn verify(&self, message: Message) -> ActorResult<Message> {
        if self.is_exempt(&message) {
            return Ok(message);
        }
        let type_id = (*message).type_id();
        let (id, bytes) = self.serialize(&message)?;
        self.deserialize(&bytes, id, type_id)
    }
}

impl Default for Serialization {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Serialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serialization")
            .field("serializers", &self.serializers.len())
            .field("bindings", &self.bindings.len())
            .field("exempt", &self.exempt.len())
            .finish()
    }
}
