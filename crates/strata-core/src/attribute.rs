//! Typed node attributes.
//!
//! Attribute records carry a type discriminator and one populated payload
//! field. Records written before the discriminator existed leave it unset, so
//! resolution falls back to probing the payload fields in a fixed order.

use std::collections::HashMap;
use std::fmt;

use strata_onnx::AttributeProto;
use strata_onnx::onnx::attribute_proto::AttributeType;
use tracing::{debug, trace, warn};

use crate::tensor::{Tensor, TensorOptions};
use crate::{Error, Result};

/// Variant tag of an [`Attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Int,
    Ints,
    Float,
    Floats,
    String,
    Strings,
    Tensor,
    Tensors,
    Null,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Int => "INT",
            AttributeKind::Ints => "INTS",
            AttributeKind::Float => "FLOAT",
            AttributeKind::Floats => "FLOATS",
            AttributeKind::String => "STRING",
            AttributeKind::Strings => "STRINGS",
            AttributeKind::Tensor => "TENSOR",
            AttributeKind::Tensors => "TENSORS",
            AttributeKind::Null => "NULL",
        };
        f.write_str(name)
    }
}

/// A decoded attribute value.
#[derive(Debug, PartialEq)]
pub enum Attribute {
    Int(i64),
    Ints(Vec<i64>),
    Float(f32),
    Floats(Vec<f32>),
    String(String),
    Strings(Vec<String>),
    Tensor(Tensor),
    Tensors(Vec<Tensor>),
    /// A kind the IR does not model (graphs, sparse tensors, type protos).
    Null,
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Int(_) => AttributeKind::Int,
            Attribute::Ints(_) => AttributeKind::Ints,
            Attribute::Float(_) => AttributeKind::Float,
            Attribute::Floats(_) => AttributeKind::Floats,
            Attribute::String(_) => AttributeKind::String,
            Attribute::Strings(_) => AttributeKind::Strings,
            Attribute::Tensor(_) => AttributeKind::Tensor,
            Attribute::Tensors(_) => AttributeKind::Tensors,
            Attribute::Null => AttributeKind::Null,
        }
    }

    /// Resolve one attribute record.
    ///
    /// Returns `Ok(None)` for a legacy record with no populated payload.
    /// Tensor payloads are decoded eagerly with `options`.
    pub fn from_proto(proto: &AttributeProto, options: &TensorOptions) -> Result<Option<Self>> {
        let Ok(attr_type) = AttributeType::try_from(proto.r#type) else {
            debug!(name = %proto.name, code = proto.r#type, "unknown attribute type");
            return Ok(Some(Attribute::Null));
        };

        let attribute = match attr_type {
            AttributeType::Int => Attribute::Int(proto.i),
            AttributeType::Ints => Attribute::Ints(proto.ints.clone()),
            AttributeType::Float => Attribute::Float(proto.f),
            AttributeType::Floats => Attribute::Floats(proto.floats.clone()),
            AttributeType::String => Attribute::String(decode_utf8(&proto.name, &proto.s)?),
            AttributeType::Strings => Attribute::Strings(decode_strings(proto)?),
            AttributeType::Tensor => match &proto.t {
                Some(t) => Attribute::Tensor(Tensor::from_proto(t, options)?),
                None => Attribute::Null,
            },
            AttributeType::Tensors => Attribute::Tensors(decode_tensors(proto, options)?),
            AttributeType::Undefined => return Self::from_legacy(proto, options),
            other => {
                debug!(name = %proto.name, kind = ?other, "unsupported attribute kind");
                Attribute::Null
            }
        };
        Ok(Some(attribute))
    }

    /// Probe the payload fields of an untyped record in priority order.
    fn from_legacy(proto: &AttributeProto, options: &TensorOptions) -> Result<Option<Self>> {
        let attribute = if proto.i != 0 {
            Attribute::Int(proto.i)
        } else if !proto.ints.is_empty() {
            Attribute::Ints(proto.ints.clone())
        } else if proto.f != 0.0 {
            Attribute::Float(proto.f)
        } else if !proto.floats.is_empty() {
            Attribute::Floats(proto.floats.clone())
        } else if !proto.s.is_empty() {
            Attribute::String(decode_utf8(&proto.name, &proto.s)?)
        } else if !proto.strings.is_empty() {
            Attribute::Strings(decode_strings(proto)?)
        } else if let Some(t) = &proto.t {
            Attribute::Tensor(Tensor::from_proto(t, options)?)
        } else if !proto.tensors.is_empty() {
            Attribute::Tensors(decode_tensors(proto, options)?)
        } else {
            return Ok(None);
        };

        trace!(name = %proto.name, kind = %attribute.kind(), "resolved untyped attribute");
        Ok(Some(attribute))
    }

    /// Release every tensor payload, returning how many buffers were freed.
    fn release(&mut self, name: &str) -> usize {
        let tensors = match self {
            Attribute::Tensor(tensor) => std::slice::from_mut(tensor),
            Attribute::Tensors(tensors) => tensors.as_mut_slice(),
            _ => return 0,
        };

        let mut released = 0;
        for (index, tensor) in tensors.iter_mut().enumerate() {
            if tensor.release() {
                released += 1;
            } else {
                warn!(attribute = name, index, "attribute tensor was already released");
            }
        }
        released
    }
}

fn decode_utf8(name: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8 {
        name: name.to_string(),
    })
}

fn decode_strings(proto: &AttributeProto) -> Result<Vec<String>> {
    proto
        .strings
        .iter()
        .map(|s| decode_utf8(&proto.name, s))
        .collect()
}

fn decode_tensors(proto: &AttributeProto, options: &TensorOptions) -> Result<Vec<Tensor>> {
    proto
        .tensors
        .iter()
        .map(|t| Tensor::from_proto(t, options))
        .collect()
}

/// A Rust type that can be read out of an [`Attribute`].
pub trait AttributeValue: Sized {
    /// The attribute variant this type is read from.
    const KIND: AttributeKind;

    /// Extract the value, or `None` if `attribute` is another variant.
    fn from_attribute(attribute: &Attribute) -> Option<Self>;
}

macro_rules! impl_attribute_value {
    ($ty:ty, $variant:ident) => {
        impl AttributeValue for $ty {
            const KIND: AttributeKind = AttributeKind::$variant;

            fn from_attribute(attribute: &Attribute) -> Option<Self> {
                match attribute {
                    Attribute::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_attribute_value!(i64, Int);
impl_attribute_value!(Vec<i64>, Ints);
impl_attribute_value!(f32, Float);
impl_attribute_value!(Vec<f32>, Floats);
impl_attribute_value!(String, String);
impl_attribute_value!(Vec<String>, Strings);

/// Attributes of one node, keyed by name.
#[derive(Debug, Default, PartialEq)]
pub struct Attributes {
    values: HashMap<String, Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a node's attribute records.
    ///
    /// Legacy records with no payload are dropped. A repeated name keeps the
    /// last record.
    pub fn from_protos(protos: &[AttributeProto], options: &TensorOptions) -> Result<Self> {
        let mut attributes = Self::new();
        for proto in protos {
            match Attribute::from_proto(proto, options)? {
                Some(attribute) => {
                    if attributes.insert(proto.name.clone(), attribute).is_some() {
                        debug!(name = %proto.name, "attribute declared twice, keeping the last");
                    }
                }
                None => debug!(name = %proto.name, "dropped attribute with no payload"),
            }
        }
        Ok(attributes)
    }

    /// Insert an attribute, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) -> Option<Attribute> {
        self.values.insert(name.into(), attribute)
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read an attribute as `T`, or return `default` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns `AttributeKind` if the attribute exists as another variant.
    pub fn value<T: AttributeValue>(&self, name: &str, default: T) -> Result<T> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    /// Read an attribute as `T`, or `None` if it is absent.
    pub fn optional<T: AttributeValue>(&self, name: &str) -> Result<Option<T>> {
        let Some(attribute) = self.values.get(name) else {
            return Ok(None);
        };
        T::from_attribute(attribute)
            .map(Some)
            .ok_or_else(|| kind_error(name, T::KIND, attribute))
    }

    /// Borrow a tensor attribute.
    pub fn tensor(&self, name: &str) -> Result<Option<&Tensor>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Attribute::Tensor(tensor)) => Ok(Some(tensor)),
            Some(other) => Err(kind_error(name, AttributeKind::Tensor, other)),
        }
    }

    /// Borrow a tensor-list attribute.
    pub fn tensors(&self, name: &str) -> Result<Option<&[Tensor]>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Attribute::Tensors(tensors)) => Ok(Some(tensors)),
            Some(other) => Err(kind_error(name, AttributeKind::Tensors, other)),
        }
    }

    /// Release every owned tensor payload.
    ///
    /// A tensor that fails to release is logged and skipped so the rest are
    /// still freed. Returns the number of buffers freed by this call.
    pub fn release(&mut self) -> usize {
        self.values
            .iter_mut()
            .map(|(name, attribute)| attribute.release(name))
            .sum()
    }
}

fn kind_error(name: &str, expected: AttributeKind, actual: &Attribute) -> Error {
    Error::AttributeKind {
        name: name.to_string(),
        expected,
        actual: actual.kind(),
    }
}
