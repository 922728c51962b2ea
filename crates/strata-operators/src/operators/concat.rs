//! Concat contract, versions 1 and 4.
//!
//! - v1: float types, `axis` optional with default 1
//! - v4: every non-complex type, `axis` required

use strata_core::{DataType, Node};

use crate::field::{
    AttributeField, LiveTensors, OperatorInputs, TensorField, TypeConstraint, single_output,
};
use crate::operator::operator_version;
use crate::Result;

const OP_TYPE: &str = "Concat";

const T_V1: TypeConstraint = TypeConstraint::new("T", DataType::FLOAT_TYPES);
const T_V4: TypeConstraint = TypeConstraint::new("T", DataType::ALL_TYPES_WITHOUT_COMPLEX);

#[derive(Debug)]
pub struct ConcatV1Inputs<'a> {
    pub inputs: Vec<TensorField<'a>>,
    pub axis: AttributeField<i64>,
}

impl<'a> OperatorInputs<'a> for ConcatV1Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 1;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            inputs: TensorField::variadic(OP_TYPE, inputs, "inputs", T_V1)?,
            axis: AttributeField::with_default(&node.attributes, "axis", 1)?,
        })
    }
}

#[derive(Debug)]
pub struct ConcatV4Inputs<'a> {
    pub inputs: Vec<TensorField<'a>>,
    pub axis: AttributeField<i64>,
}

impl<'a> ConcatV4Inputs<'a> {
    /// Carry v1 inputs forward. A defaulted axis becomes explicit, since v4
    /// has no default.
    pub fn upgrade(prev: ConcatV1Inputs<'a>) -> Result<Self> {
        let inputs = prev
            .inputs
            .into_iter()
            .map(|field| field.constrain(OP_TYPE, T_V4))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            inputs,
            axis: AttributeField {
                required: true,
                explicit: true,
                ..prev.axis
            },
        })
    }
}

impl<'a> OperatorInputs<'a> for ConcatV4Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 4;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            inputs: TensorField::variadic(OP_TYPE, inputs, "inputs", T_V4)?,
            axis: AttributeField::required(OP_TYPE, &node.attributes, "axis")?,
        })
    }
}

single_output!(ConcatV1Outputs, "Concat", T_V1);
single_output!(ConcatV4Outputs, "Concat", T_V4);

operator_version!(
    /// Concat, versions 1 to 3.
    ConcatV1,
    ConcatV1Inputs,
    ConcatV1Outputs
);
operator_version!(
    /// Concat, version 4 and later.
    ConcatV4,
    ConcatV4Inputs,
    ConcatV4Outputs
);
