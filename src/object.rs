use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{EchoError, Result};
use crate::serialize::{write_varint, ByteSerializable};

pub const PROTOCOL_SPACE: u8 = 1;
pub const IMPLEMENTATION_SPACE: u8 = 2;

pub const ACCOUNT_TYPE: u8 = 2;
pub const ASSET_TYPE: u8 = 3;
pub const CONTRACT_TYPE: u8 = 9;
pub const OPERATION_HISTORY_TYPE: u8 = 10;

/// Id of a chain object, written `space.type.instance`.
///
/// Only the instance reaches the binary form; the space and type are implied by the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    space: u8,
    object_type: u8,
    instance: u64,
}

impl ObjectId {
    pub const fn new(space: u8, object_type: u8, instance: u64) -> Self {
        ObjectId {
            space,
            object_type,
            instance,
        }
    }

    pub fn account(instance: u64) -> Self {
        ObjectId::new(PROTOCOL_SPACE, ACCOUNT_TYPE, instance)
    }

    pub fn asset(instance: u64) -> Self {
        ObjectId::new(PROTOCOL_SPACE, ASSET_TYPE, instance)
    }

    pub fn contract(instance: u64) -> Self {
        ObjectId::new(PROTOCOL_SPACE, CONTRACT_TYPE, instance)
    }

    pub fn operation_history(instance: u64) -> Self {
        ObjectId::new(PROTOCOL_SPACE, OPERATION_HISTORY_TYPE, instance)
    }

    pub fn space(&self) -> u8 {
        self.space
    }

    pub fn object_type(&self) -> u8 {
        self.object_type
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn is_account(&self) -> bool {
        self.space == PROTOCOL_SPACE && self.object_type == ACCOUNT_TYPE
    }
}

impl FromStr for ObjectId {
    type Err = EchoError;

    fn from_str(id: &str) -> Result<Self> {
        let malformed = || EchoError::MalformedInput(format!("`{}` is not an object id", id));
        let mut parts = id.split('.');
        let space = parts.next().and_then(|part| part.parse::<u8>().ok()).ok_or_else(malformed)?;
        let object_type = parts.next().and_then(|part| part.parse::<u8>().ok()).ok_or_else(malformed)?;
        let instance = parts.next().and_then(|part| part.parse::<u64>().ok()).ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(ObjectId::new(space, object_type, instance))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.object_type, self.instance)
    }
}

impl ByteSerializable for ObjectId {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes = vec![];
        write_varint(&mut vbytes, self.instance);
        vbytes
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        id.parse().map_err(de::Error::custom)
    }
}

/// A chain object as the node returned it. Only the id is interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct GrapheneObject {
    id: ObjectId,
    data: Value,
}

impl GrapheneObject {
    pub fn from_json(data: Value) -> Result<Self> {
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| EchoError::decoding("object has no string `id`"))?
            .parse()?;
        Ok(GrapheneObject { id, data })
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl<'de> Deserialize<'de> for GrapheneObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let data = Value::deserialize(deserializer)?;
        GrapheneObject::from_json(data).map_err(de::Error::custom)
    }
}

impl Serialize for GrapheneObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}
