//! Cast contract, versions 1 and 6.
//!
//! The required `to` attribute names the target element type: as a type
//! name string ("FLOAT", "INT64", ...) in version 1 and as an element-type
//! code from version 6 on.

use strata_core::{DataType, Node};

use crate::field::{
    AttributeField, LiveTensors, OperatorInputs, TensorField, TypeConstraint, single_output,
};
use crate::operator::operator_version;
use crate::Result;

const OP_TYPE: &str = "Cast";

const T1: TypeConstraint =
    TypeConstraint::new("T1", DataType::ALL_TYPES_WITHOUT_STRING_AND_COMPLEX);
const T2: TypeConstraint =
    TypeConstraint::new("T2", DataType::ALL_TYPES_WITHOUT_STRING_AND_COMPLEX);

/// Look up an element type by its upper-case name.
fn data_type_named(name: &str) -> Result<DataType> {
    DataType::ALL_TYPES
        .iter()
        .copied()
        .find(|dt| dt.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            strata_core::Error::IllegalArgument(format!("Cast: unknown target type '{name}'"))
                .into()
        })
}

#[derive(Debug)]
pub struct CastV1Inputs<'a> {
    pub input: TensorField<'a>,
    pub to: AttributeField<String>,
}

impl CastV1Inputs<'_> {
    pub fn target(&self) -> Result<DataType> {
        data_type_named(&self.to.value)
    }
}

impl<'a> OperatorInputs<'a> for CastV1Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 1;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            input: TensorField::required(OP_TYPE, inputs, 0, "input", T1)?,
            to: AttributeField::required(OP_TYPE, &node.attributes, "to")?,
        })
    }
}

#[derive(Debug)]
pub struct CastV6Inputs<'a> {
    pub input: TensorField<'a>,
    pub to: AttributeField<i64>,
}

impl<'a> CastV6Inputs<'a> {
    pub fn target(&self) -> Result<DataType> {
        let code = i32::try_from(self.to.value).map_err(|_| {
            strata_core::Error::IllegalArgument(format!(
                "Cast: target type code {} out of range",
                self.to.value
            ))
        })?;
        Ok(DataType::from_onnx(code)?)
    }

    /// Carry v1 inputs forward, converting the target name to its code.
    pub fn upgrade(prev: CastV1Inputs<'a>) -> Result<Self> {
        let target = prev.target()?;
        Ok(Self {
            input: prev.input.constrain(OP_TYPE, T1)?,
            to: AttributeField {
                name: "to",
                required: true,
                value: i64::from(target.to_onnx()),
                explicit: prev.to.explicit,
            },
        })
    }
}

impl<'a> OperatorInputs<'a> for CastV6Inputs<'a> {
    const OP_TYPE: &'static str = OP_TYPE;
    const SINCE_VERSION: i64 = 6;

    fn from_node(node: &'a Node, inputs: &LiveTensors<'a>) -> Result<Self> {
        Ok(Self {
            input: TensorField::required(OP_TYPE, inputs, 0, "input", T1)?,
            to: AttributeField::required(OP_TYPE, &node.attributes, "to")?,
        })
    }
}

single_output!(CastOutputs, "Cast", T2);

operator_version!(
    /// Cast, versions 1 to 5.
    CastV1,
    CastV1Inputs,
    CastOutputs
);
operator_version!(
    /// Cast, version 6 and later.
    CastV6,
    CastV6Inputs,
    CastOutputs
);
