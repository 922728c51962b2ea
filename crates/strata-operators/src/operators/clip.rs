//! Clip contract, versions 1, 6, 11 and 12.
//!
//! - v1: bounds as `min`/`max` attributes, legacy `consumed_inputs`
//! - v6: `consumed_inputs` retracted, bounds default to the float range
//! - v11: bounds move to optional scalar inputs, attributes retracted
//! - v12: every numeric type allowed

use strata_core::{DataType, Node, Tensor};

use crate::field::{
    AttributeField, LiveTensors, OperatorInputs, TensorField, TypeConstraint, single_output,
};
use crate::operator::operator_version;
use crate::{Error, Result};

const OP_TYPE: &str = "Clip";

const T_V1: TypeConstraint = TypeConstraint::new("T", DataType::FLOAT_TYPES);
const T_V12: TypeConstraint = TypeConstraint::new("T", DataType::NUMERIC_TYPES);

#[derive(Debug)]
pub struct ClipV1Inputs<'a> {
    pub input: TensorField<'a>,
    pub min: Option<AttributeField<f32>>,
    pub max: Option<AttributeField<f32>>,
    pub consumed_inputs: Option<AttributeField<Vec<i64>>>,
}

impl<'a> OperatorInputs<'a> for ClipV1Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 1;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            input: TensorField::required(OP_TYPE, inputs, 0, "input", T_V1)?,
            min: AttributeField::optional(&node.attributes, "min")?,
            max: AttributeField::optional(&node.attributes, "max")?,
            consumed_inputs: AttributeField::optional(&node.attributes, "consumed_inputs")?,
        })
    }
}

#[derive(Debug)]
pub struct ClipV6Inputs<'a> {
    pub input: TensorField<'a>,
    pub min: AttributeField<f32>,
    pub max: AttributeField<f32>,
}

impl<'a> ClipV6Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    /// Carry v1 inputs forward. Unset bounds take the v6 defaults.
    pub fn upgrade(prev: ClipV1Inputs<'a>) -> Result<Self> {
        let bound = |field: Option<AttributeField<f32>>, name, default| {
            field.unwrap_or(AttributeField {
                name,
                required: false,
                value: default,
                explicit: false,
            })
        };
        Ok(Self {
            input: prev.input.constrain(OP_TYPE, T_V1)?,
            min: bound(prev.min, "min", f32::MIN),
            max: bound(prev.max, "max", f32::MAX),
        })
    }
}

impl<'a> OperatorInputs<'a> for ClipV6Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 6;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            input: TensorField::required(OP_TYPE, inputs, 0, "input", T_V1)?,
            min: AttributeField::with_default(&node.attributes, "min", f32::MIN)?,
            max: AttributeField::with_default(&node.attributes, "max", f32::MAX)?,
        })
    }
}

#[derive(Debug)]
pub struct ClipV11Inputs<'a> {
    pub input: TensorField<'a>,
    pub min: Option<TensorField<'a>>,
    pub max: Option<TensorField<'a>>,
}

impl<'a> ClipV11Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    /// The `min` attribute. Bounds are inputs as of version 11.
    pub fn min_attribute(&self) -> Result<f32> {
        Err(Error::deprecated(OP_TYPE, "min", 11))
    }

    /// The `max` attribute. Bounds are inputs as of version 11.
    pub fn max_attribute(&self) -> Result<f32> {
        Err(Error::deprecated(OP_TYPE, "max", 11))
    }

    /// Carry v6 inputs forward with the bounds now supplied as tensors.
    ///
    /// The v6 attribute values are discarded; the caller provides the
    /// scalar tensors holding them.
    pub fn upgrade(
        prev: ClipV6Inputs<'a>,
        min: Option<&'a Tensor>,
        max: Option<&'a Tensor>,
    ) -> Result<Self> {
        let bounds = [Some(prev.input.tensor()), min, max];
        Ok(Self {
            input: prev.input.constrain(OP_TYPE, T_V1)?,
            min: TensorField::optional(OP_TYPE, &bounds, 1, "min", T_V1)?,
            max: TensorField::optional(OP_TYPE, &bounds, 2, "max", T_V1)?,
        })
    }
}

impl<'a> OperatorInputs<'a> for ClipV11Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 11;

    fn from_node(_node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            input: TensorField::required(OP_TYPE, inputs, 0, "input", T_V1)?,
            min: TensorField::optional(OP_TYPE, inputs, 1, "min", T_V1)?,
            max: TensorField::optional(OP_TYPE, inputs, 2, "max", T_V1)?,
        })
    }
}

#[derive(Debug)]
pub struct ClipV12Inputs<'a> {
    pub input: TensorField<'a>,
    pub min: Option<TensorField<'a>>,
    pub max: Option<TensorField<'a>>,
}

impl<'a> ClipV12Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    pub fn min_attribute(&self) -> Result<f32> {
        Err(Error::deprecated(OP_TYPE, "min", 11))
    }

    pub fn max_attribute(&self) -> Result<f32> {
        Err(Error::deprecated(OP_TYPE, "max", 11))
    }

    pub fn upgrade(prev: ClipV11Inputs<'a>) -> Result<Self> {
        Ok(Self {
            input: prev.input.constrain(OP_TYPE, T_V12)?,
            min: prev.min.map(|f| f.constrain(OP_TYPE, T_V12)).transpose()?,
            max: prev.max.map(|f| f.constrain(OP_TYPE, T_V12)).transpose()?,
        })
    }
}

impl<'a> OperatorInputs<'a> for ClipV12Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 12;

    fn from_node(_node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            input: TensorField::required(OP_TYPE, inputs, 0, "input", T_V12)?,
            min: TensorField::optional(OP_TYPE, inputs, 1, "min", T_V12)?,
            max: TensorField::optional(OP_TYPE, inputs, 2, "max", T_V12)?,
        })
    }
}

single_output!(ClipV1Outputs, "Clip", T_V1);
single_output!(ClipV12Outputs, "Clip", T_V12);

operator_version!(
    /// Clip, versions 1 to 5.
    ClipV1,
    ClipV1Inputs,
    ClipV1Outputs
);
operator_version!(
    /// Clip, versions 6 to 10.
    ClipV6,
    ClipV6Inputs,
    ClipV1Outputs
);
operator_version!(
    /// Clip, version 11.
    ClipV11,
    ClipV11Inputs,
    ClipV1Outputs
);
operator_version!(
    /// Clip, version 12 and later.
    ClipV12,
    ClipV12Inputs,
    ClipV12Outputs
);
