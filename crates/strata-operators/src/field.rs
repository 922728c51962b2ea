//! Typed fields binding node inputs and attributes to an operator version.
//!
//! A [`Field`] holds one value pulled from a node together with the type
//! constraint of its slot. Binding a tensor checks its element type against
//! the constraint, and binding an attribute checks presence, so a contract
//! violation surfaces when the input bundle is built rather than inside a
//! kernel.

use strata_core::{AttributeValue, Attributes, DataType, Node, Tensor};

use crate::{Error, Result};

/// Live tensors of a node, by slot. `None` marks an omitted optional slot.
pub type LiveTensors<'a> = [Option<&'a Tensor>];

/// Allow-list of element types for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeConstraint {
    /// Constraint name as used in operator docs (e.g. "T", "T1").
    pub name: &'static str,
    pub allowed: &'static [DataType],
}

impl TypeConstraint {
    pub const fn new(name: &'static str, allowed: &'static [DataType]) -> Self {
        Self { name, allowed }
    }

    pub fn allows(&self, data_type: DataType) -> bool {
        self.allowed.contains(&data_type)
    }

    fn check(&self, op_type: &str, slot: usize, name: &str, actual: DataType) -> Result<()> {
        if self.allows(actual) {
            return Ok(());
        }
        Err(Error::TypeConstraint {
            op_type: op_type.to_string(),
            slot,
            name: name.to_string(),
            allowed: self.allowed.to_vec(),
            actual,
        })
    }
}

/// A value bound to one operator slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    pub slot: usize,
    pub name: &'static str,
    pub constraint: Option<TypeConstraint>,
    pub optional: bool,
    pub value: T,
}

/// A live tensor bound to an input or output slot.
pub type TensorField<'a> = Field<&'a Tensor>;

impl<'a> Field<&'a Tensor> {
    /// Bind a required tensor slot.
    ///
    /// # Errors
    ///
    /// Returns `MissingInput` if the slot is empty and `TypeConstraint` if the
    /// tensor's element type is not allowed.
    pub fn required(
        op_type: &str,
        tensors: &LiveTensors<'a>,
        slot: usize,
        name: &'static str,
        constraint: TypeConstraint,
    ) -> Result<Self> {
        let tensor = tensors.get(slot).copied().flatten().ok_or_else(|| Error::MissingInput {
            op_type: op_type.to_string(),
            slot,
            name: name.to_string(),
        })?;
        Self::bind(op_type, tensor, slot, name, constraint, false)
    }

    /// Bind an optional tensor slot, returning `None` if it is empty.
    pub fn optional(
        op_type: &str,
        tensors: &LiveTensors<'a>,
        slot: usize,
        name: &'static str,
        constraint: TypeConstraint,
    ) -> Result<Option<Self>> {
        tensors
            .get(slot)
            .copied()
            .flatten()
            .map(|tensor| Self::bind(op_type, tensor, slot, name, constraint, true))
            .transpose()
    }

    /// Bind every slot from 0 on. At least one tensor is required and none
    /// may be omitted.
    pub fn variadic(
        op_type: &str,
        tensors: &LiveTensors<'a>,
        name: &'static str,
        constraint: TypeConstraint,
    ) -> Result<Vec<Self>> {
        if tensors.is_empty() {
            return Err(Error::MissingInput {
                op_type: op_type.to_string(),
                slot: 0,
                name: name.to_string(),
            });
        }
        (0..tensors.len())
            .map(|slot| Self::required(op_type, tensors, slot, name, constraint))
            .collect()
    }

    fn bind(
        op_type: &str,
        tensor: &'a Tensor,
        slot: usize,
        name: &'static str,
        constraint: TypeConstraint,
        optional: bool,
    ) -> Result<Self> {
        constraint.check(op_type, slot, name, tensor.data_type())?;
        Ok(Self {
            slot,
            name,
            constraint: Some(constraint),
            optional,
            value: tensor,
        })
    }

    /// Re-check the bound tensor under another version's constraint.
    pub fn constrain(self, op_type: &str, constraint: TypeConstraint) -> Result<Self> {
        Self::bind(op_type, self.value, self.slot, self.name, constraint, self.optional)
    }

    pub fn tensor(&self) -> &'a Tensor {
        self.value
    }

    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

/// An attribute resolved against a declared default.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeField<T> {
    pub name: &'static str,
    pub required: bool,
    pub value: T,
    /// Whether the value came from the node rather than the default.
    pub explicit: bool,
}

impl<T: AttributeValue> AttributeField<T> {
    /// Read an optional attribute, falling back to `default`.
    pub fn with_default(attributes: &Attributes, name: &'static str, default: T) -> Result<Self> {
        Ok(match attributes.optional::<T>(name)? {
            Some(value) => Self::explicit(name, value, false),
            None => Self {
                name,
                required: false,
                value: default,
                explicit: false,
            },
        })
    }

    /// Read an optional attribute that has no default.
    pub fn optional(attributes: &Attributes, name: &'static str) -> Result<Option<Self>> {
        Ok(attributes
            .optional::<T>(name)?
            .map(|value| Self::explicit(name, value, false)))
    }

    /// Read a required attribute.
    ///
    /// # Errors
    ///
    /// Returns a `MissingAttribute` core error naming `op_type` and the
    /// attribute if the node does not carry it.
    pub fn required(op_type: &str, attributes: &Attributes, name: &'static str) -> Result<Self> {
        let value = attributes.optional::<T>(name)?.ok_or_else(|| {
            strata_core::Error::MissingAttribute {
                op_type: op_type.to_string(),
                name: name.to_string(),
            }
        })?;
        Ok(Self::explicit(name, value, true))
    }

    fn explicit(name: &'static str, value: T, required: bool) -> Self {
        Self {
            name,
            required,
            value,
            explicit: true,
        }
    }
}

/// The inputs and attributes of one operator version.
pub trait OperatorInputs<'a>: Sized {
    const OP_TYPE: &'static str;

    /// First operator-set version this bundle describes.
    const SINCE_VERSION: i64;

    /// Bind a node's attributes and live input tensors.
    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self>;
}

/// The outputs of one operator version.
pub trait OperatorOutputs<'a>: Sized {
    /// Bind a node's live output tensors.
    fn from_node(node: &'a Node, outputs: &LiveTensors<'a>) -> Result<Self>;
}

/// Declare the single-output bundle of an operator version.
macro_rules! single_output {
    ($(#[$meta:meta])* $name:ident, $op_type:literal, $constraint:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name<'a> {
            pub output: $crate::field::TensorField<'a>,
        }

        impl<'a> $crate::field::OperatorOutputs<'a> for $name<'a> {
            fn from_node(
                _node: &'a strata_core::Node,
                outputs: &$crate::field::LiveTensors<'a>,
            ) -> $crate::Result<Self> {
                Ok(Self {
                    output: $crate::field::TensorField::required(
                        $op_type, outputs, 0, "output", $constraint,
                    )?,
                })
            }
        }
    };
}

pub(crate) use single_output;

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Attribute, Shape, TensorOptions};

    const FLOATS: TypeConstraint = TypeConstraint::new("T", DataType::FLOAT_TYPES);

    fn tensor(data_type: DataType) -> Tensor {
        Tensor::allocate(data_type, Shape::new(vec![2]), &TensorOptions::default()).unwrap()
    }

    #[test]
    fn test_required_tensor_checks_type() {
        let x = tensor(DataType::Float);
        let field = TensorField::required("Relu", &[Some(&x)], 0, "X", FLOATS).unwrap();
        assert_eq!(field.data_type(), DataType::Float);
        assert!(!field.optional);

        let i = tensor(DataType::Int32);
        let err = TensorField::required("Relu", &[Some(&i)], 0, "X", FLOATS).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeConstraint {
                slot: 0,
                actual: DataType::Int32,
                ref op_type,
                ..
            } if op_type == "Relu"
        ));
    }

    #[test]
    fn test_missing_and_optional_slots() {
        let x = tensor(DataType::Float);
        let err = TensorField::required("Clip", &[Some(&x)], 1, "min", FLOATS).unwrap_err();
        assert!(matches!(err, Error::MissingInput { slot: 1, .. }));

        let inputs = [Some(&x), None];
        assert!(TensorField::optional("Clip", &inputs, 1, "min", FLOATS).unwrap().is_none());
        assert!(TensorField::optional("Clip", &inputs, 5, "max", FLOATS).unwrap().is_none());
        assert!(TensorField::optional("Clip", &inputs, 0, "X", FLOATS).unwrap().is_some());
    }

    #[test]
    fn test_variadic() {
        let a = tensor(DataType::Float);
        let b = tensor(DataType::Double);
        let fields =
            TensorField::variadic("Concat", &[Some(&a), Some(&b)], "inputs", FLOATS).unwrap();
        assert_eq!(fields.iter().map(|f| f.slot).collect::<Vec<_>>(), vec![0, 1]);

        assert!(TensorField::variadic("Concat", &[], "inputs", FLOATS).is_err());
        assert!(TensorField::variadic("Concat", &[Some(&a), None], "inputs", FLOATS).is_err());
    }

    #[test]
    fn test_constrain_rechecks() {
        let x = tensor(DataType::Int64);
        let wide = TypeConstraint::new("T", DataType::NUMERIC_TYPES);
        let field = TensorField::required("Add", &[Some(&x)], 0, "A", wide).unwrap();
        assert!(field.clone().constrain("Add", FLOATS).is_err());
        assert!(field.constrain("Add", wide).is_ok());
    }

    #[test]
    fn test_attribute_fields() {
        let mut attributes = Attributes::new();
        attributes.insert("axis", Attribute::Int(2));

        let axis = AttributeField::<i64>::required("Concat", &attributes, "axis").unwrap();
        assert_eq!(axis.value, 2);
        assert!(axis.explicit && axis.required);

        let alpha = AttributeField::with_default(&attributes, "alpha", 0.5f32).unwrap();
        assert_eq!(alpha.value, 0.5);
        assert!(!alpha.explicit);

        assert!(AttributeField::<Vec<i64>>::optional(&attributes, "perm").unwrap().is_none());

        let err = AttributeField::<String>::required("Cast", &attributes, "to").unwrap_err();
        assert!(matches!(
            err,
            Error::Core(strata_core::Error::MissingAttribute { ref op_type, ref name })
                if op_type == "Cast" && name == "to"
        ));

        let err = AttributeField::<f32>::required("Concat", &attributes, "axis").unwrap_err();
        assert!(matches!(err, Error::Core(strata_core::Error::AttributeKind { .. })));
    }
}
