//! Relu contract, versions 1, 6 and 14.
//!
//! - v1: input X (float types), attribute `consumed_inputs` (legacy
//!   in-place optimisation hint)
//! - v6: `consumed_inputs` retracted
//! - v14: signed integer element types allowed

use strata_core::{DataType, Node};

use crate::field::{
    AttributeField, LiveTensors, OperatorInputs, TensorField, TypeConstraint, single_output,
};
use crate::operator::operator_version;
use crate::{Error, Result};

const OP_TYPE: &str = "Relu";

const T_V1: TypeConstraint = TypeConstraint::new("T", DataType::FLOAT_TYPES);

const T_V14: TypeConstraint = TypeConstraint::new(
    "T",
    &[
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float16,
        DataType::Float,
        DataType::Double,
    ],
);

#[derive(Debug)]
pub struct ReluV1Inputs<'a> {
    pub x: TensorField<'a>,
    pub consumed_inputs: Option<AttributeField<Vec<i64>>>,
}

impl<'a> OperatorInputs<'a> for ReluV1Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 1;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            x: TensorField::required(OP_TYPE, inputs, 0, "X", T_V1)?,
            consumed_inputs: AttributeField::optional(&node.attributes, "consumed_inputs")?,
        })
    }
}

#[derive(Debug)]
pub struct ReluV6Inputs<'a> {
    pub x: TensorField<'a>,
}

impl<'a> ReluV6Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    /// Carry v1 inputs forward, dropping `consumed_inputs`.
    pub fn upgrade(prev: ReluV1Inputs<'a>) -> Result<Self> {
        Ok(Self {
            x: prev.x.constrain(OP_TYPE, T_V1)?,
        })
    }
}

impl<'a> OperatorInputs<'a> for ReluV6Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 6;

    fn from_node(_node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            x: TensorField::required(OP_TYPE, inputs, 0, "X", T_V1)?,
        })
    }
}

#[derive(Debug)]
pub struct ReluV14Inputs<'a> {
    pub x: TensorField<'a>,
}

impl<'a> ReluV14Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    pub fn upgrade(prev: ReluV6Inputs<'a>) -> Result<Self> {
        Ok(Self {
            x: prev.x.constrain(OP_TYPE, T_V14)?,
        })
    }
}

impl<'a> OperatorInputs<'a> for ReluV14Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 14;

    fn from_node(_node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            x: TensorField::required(OP_TYPE, inputs, 0, "X", T_V14)?,
        })
    }
}

single_output!(ReluV1Outputs, "Relu", T_V1);
single_output!(ReluV14Outputs, "Relu", T_V14);

operator_version!(
    /// Relu, versions 1 to 5.
    ReluV1,
    ReluV1Inputs,
    ReluV1Outputs
);
operator_version!(
    /// Relu, versions 6 to 13.
    ReluV6,
    ReluV6Inputs,
    ReluV1Outputs
);
operator_version!(
    /// Relu, version 14 and later.
    ReluV14,
    ReluV14Inputs,
    ReluV14Outputs
);
