/*!
# Binary codec

Transactions are signed over a canonical binary layout which the chain rebuilds byte for byte
before it checks signatures:

```bytes
integers      little-endian, fixed width (u8, u16, u32, u64)
lengths       unsigned LEB128 varint
strings       varint(len) || utf8 bytes
byte arrays   varint(len) || bytes
optional<T>   0x00  |  0x01 || T
vectors       varint(count) || T*
extensions    varint(count) || 0x00* (only the void extension exists)
```

A zero-length collection always keeps its `0x00` length byte.

Nothing in the client decodes this form. Values coming back from the node are read from JSON.
*/

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Types with a canonical binary encoding.
pub trait ByteSerializable {
    fn to_bytes(&self) -> Vec<u8>;
}

pub fn write_varint(vbytes: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            vbytes.push(byte);
            return;
        }
        vbytes.push(byte | 0x80);
    }
}

pub fn varint(value: u64) -> Vec<u8> {
    let mut vbytes = Vec::with_capacity(10);
    write_varint(&mut vbytes, value);
    vbytes
}

pub fn serialize_bytes(data: &[u8]) -> Vec<u8> {
    let mut vbytes = varint(data.len() as u64);
    vbytes.extend(data);
    vbytes
}

pub fn serialize_string(data: &str) -> Vec<u8> {
    serialize_bytes(data.as_bytes())
}

pub fn serialize_vec<T: ByteSerializable>(items: &[T]) -> Vec<u8> {
    let mut vbytes = varint(items.len() as u64);
    for item in items {
        vbytes.extend(item.to_bytes());
    }
    vbytes
}

pub fn serialize_optional<T: ByteSerializable>(item: &Option<T>) -> Vec<u8> {
    match item {
        Some(value) => {
            let mut vbytes = vec![1];
            vbytes.extend(value.to_bytes());
            vbytes
        }
        None => vec![0],
    }
}

impl ByteSerializable for u8 {
    fn to_bytes(&self) -> Vec<u8> {
        vec![*self]
    }
}

impl ByteSerializable for u16 {
    fn to_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl ByteSerializable for u32 {
    fn to_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl ByteSerializable for u64 {
    fn to_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl ByteSerializable for bool {
    fn to_bytes(&self) -> Vec<u8> {
        vec![*self as u8]
    }
}

impl ByteSerializable for String {
    fn to_bytes(&self) -> Vec<u8> {
        serialize_string(self)
    }
}

/// The trailing extension list every operation and transaction carries.
///
/// Entries received in JSON are kept verbatim so a decoded object re-encodes to the same JSON.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Extensions(Vec<Value>);

impl Extensions {
    pub fn new() -> Self {
        Extensions(vec![])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ByteSerializable for Extensions {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes = varint(self.0.len() as u64);
        vbytes.extend(std::iter::repeat(0u8).take(self.0.len()));
        vbytes
    }
}

/// Serde helpers for 64-bit integers the node sends either as JSON numbers or as decimal strings.
pub mod u64_number_or_string {
    use super::*;

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NumberOrStringVisitor)
    }

    struct NumberOrStringVisitor;

    impl<'de> Visitor<'de> for NumberOrStringVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an unsigned integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u64, E> {
            u64::try_from(value).map_err(|_| E::custom(format!("negative amount {}", value)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
            value.parse::<u64>().map_err(E::custom)
        }
    }
}
