//! Add contract, versions 1, 6, 7 and 14.
//!
//! - v1: float types, explicit `broadcast`/`axis` attributes and the legacy
//!   `consumed_inputs`
//! - v6: 32/64-bit integers allowed, `consumed_inputs` retracted
//! - v7: multidirectional broadcasting, `broadcast` and `axis` retracted
//! - v14: every numeric type allowed

use strata_core::{DataType, Node};

use crate::field::{
    AttributeField, LiveTensors, OperatorInputs, TensorField, TypeConstraint, single_output,
};
use crate::operator::operator_version;
use crate::{Error, Result};

const OP_TYPE: &str = "Add";

const T_V1: TypeConstraint = TypeConstraint::new("T", DataType::FLOAT_TYPES);
const T_V6: TypeConstraint = TypeConstraint::new("T", DataType::HIGH_PRECISION_NUMERIC);
const T_V14: TypeConstraint = TypeConstraint::new("T", DataType::NUMERIC_TYPES);

#[derive(Debug)]
pub struct AddV1Inputs<'a> {
    pub a: TensorField<'a>,
    pub b: TensorField<'a>,
    pub broadcast: AttributeField<i64>,
    pub axis: Option<AttributeField<i64>>,
    pub consumed_inputs: Option<AttributeField<Vec<i64>>>,
}

impl<'a> OperatorInputs<'a> for AddV1Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 1;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            a: TensorField::required(OP_TYPE, inputs, 0, "A", T_V1)?,
            b: TensorField::required(OP_TYPE, inputs, 1, "B", T_V1)?,
            broadcast: AttributeField::with_default(&node.attributes, "broadcast", 0)?,
            axis: AttributeField::optional(&node.attributes, "axis")?,
            consumed_inputs: AttributeField::optional(&node.attributes, "consumed_inputs")?,
        })
    }
}

#[derive(Debug)]
pub struct AddV6Inputs<'a> {
    pub a: TensorField<'a>,
    pub b: TensorField<'a>,
    pub broadcast: AttributeField<i64>,
    pub axis: Option<AttributeField<i64>>,
}

impl<'a> AddV6Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    pub fn upgrade(prev: AddV1Inputs<'a>) -> Result<Self> {
        Ok(Self {
            a: prev.a.constrain(OP_TYPE, T_V6)?,
            b: prev.b.constrain(OP_TYPE, T_V6)?,
            broadcast: prev.broadcast,
            axis: prev.axis,
        })
    }
}

impl<'a> OperatorInputs<'a> for AddV6Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 6;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            a: TensorField::required(OP_TYPE, inputs, 0, "A", T_V6)?,
            b: TensorField::required(OP_TYPE, inputs, 1, "B", T_V6)?,
            broadcast: AttributeField::with_default(&node.attributes, "broadcast", 0)?,
            axis: AttributeField::optional(&node.attributes, "axis")?,
        })
    }
}

#[derive(Debug)]
pub struct AddV7Inputs<'a> {
    pub a: TensorField<'a>,
    pub b: TensorField<'a>,
}

impl<'a> AddV7Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    pub fn broadcast(&self) -> Result<i64> {
        Err(Error::deprecated(OP_TYPE, "broadcast", 7))
    }

    pub fn axis(&self) -> Result<i64> {
        Err(Error::deprecated(OP_TYPE, "axis", 7))
    }

    /// Carry v6 inputs forward. Broadcasting becomes implicit, so the
    /// `broadcast` and `axis` attributes are dropped.
    pub fn upgrade(prev: AddV6Inputs<'a>) -> Result<Self> {
        Ok(Self {
            a: prev.a.constrain(OP_TYPE, T_V6)?,
            b: prev.b.constrain(OP_TYPE, T_V6)?,
        })
    }
}

impl<'a> OperatorInputs<'a> for AddV7Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 7;

    fn from_node(_node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            a: TensorField::required(OP_TYPE, inputs, 0, "A", T_V6)?,
            b: TensorField::required(OP_TYPE, inputs, 1, "B", T_V6)?,
        })
    }
}

#[derive(Debug)]
pub struct AddV14Inputs<'a> {
    pub a: TensorField<'a>,
    pub b: TensorField<'a>,
}

impl<'a> AddV14Inputs<'a> {
    pub fn consumed_inputs(&self) -> Result<&[i64]> {
        Err(Error::deprecated(OP_TYPE, "consumed_inputs", 6))
    }

    pub fn broadcast(&self) -> Result<i64> {
        Err(Error::deprecated(OP_TYPE, "broadcast", 7))
    }

    pub fn axis(&self) -> Result<i64> {
        Err(Error::deprecated(OP_TYPE, "axis", 7))
    }

    pub fn upgrade(prev: AddV7Inputs<'a>) -> Result<Self> {
        Ok(Self {
            a: prev.a.constrain(OP_TYPE, T_V14)?,
            b: prev.b.constrain(OP_TYPE, T_V14)?,
        })
    }
}

impl<'a> OperatorInputs<'a> for AddV14Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 14;

    fn from_node(_node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            a: TensorField::required(OP_TYPE, inputs, 0, "A", T_V14)?,
            b: TensorField::required(OP_TYPE, inputs, 1, "B", T_V14)?,
        })
    }
}

single_output!(AddV1Outputs, "Add", T_V1);
single_output!(AddV6Outputs, "Add", T_V6);
single_output!(AddV14Outputs, "Add", T_V14);

operator_version!(
    /// Add, versions 1 to 5.
    AddV1,
    AddV1Inputs,
    AddV1Outputs
);
operator_version!(
    /// Add, version 6.
    AddV6,
    AddV6Inputs,
    AddV6Outputs
);
operator_version!(
    /// Add, versions 7 to 13.
    AddV7,
    AddV7Inputs,
    AddV6Outputs
);
operator_version!(
    /// Add, version 14 and later.
    AddV14,
    AddV14Inputs,
    AddV14Outputs
);
