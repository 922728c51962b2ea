//! Core types for element types, shapes and value metadata.

use crate::{Error, Result};
use std::fmt;
use strata_onnx::onnx::tensor_proto::DataType as OnnxDataType;
use strata_onnx::onnx::tensor_shape_proto::dimension::Value as DimValue;
use strata_onnx::onnx::type_proto::Value as TypeValue;
use strata_onnx::ValueInfoProto;
use tracing::debug;

/// Tensor element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float,
    Double,
    String,
    Bool,
    Complex64,
    Complex128,
}

impl DataType {
    /// Floating-point types.
    pub const FLOAT_TYPES: &'static [DataType] =
        &[DataType::Float16, DataType::Float, DataType::Double];

    /// Every integer and floating-point type.
    pub const NUMERIC_TYPES: &'static [DataType] = &[
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float16,
        DataType::Float,
        DataType::Double,
    ];

    /// 32- and 64-bit integers plus floating-point types.
    pub const HIGH_PRECISION_NUMERIC: &'static [DataType] = &[
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int32,
        DataType::Int64,
        DataType::Float16,
        DataType::Float,
        DataType::Double,
    ];

    pub const ALL_TYPES: &'static [DataType] = &[
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float16,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::Bool,
        DataType::Complex64,
        DataType::Complex128,
    ];

    pub const ALL_TYPES_WITHOUT_COMPLEX: &'static [DataType] = &[
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float16,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::Bool,
    ];

    pub const ALL_TYPES_WITHOUT_STRING_AND_COMPLEX: &'static [DataType] = &[
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float16,
        DataType::Float,
        DataType::Double,
        DataType::Bool,
    ];

    /// Size of one element in bytes.
    ///
    /// Returns `None` for element types without a fixed width (strings and
    /// complex numbers). Those types can be named in type constraints but
    /// cannot back a live buffer.
    pub fn unit_size(&self) -> Option<usize> {
        match self {
            DataType::Uint8 | DataType::Int8 | DataType::Bool => Some(1),
            DataType::Uint16 | DataType::Int16 | DataType::Float16 => Some(2),
            DataType::Uint32 | DataType::Int32 | DataType::Float => Some(4),
            DataType::Uint64 | DataType::Int64 | DataType::Double => Some(8),
            DataType::String | DataType::Complex64 | DataType::Complex128 => None,
        }
    }

    /// Check if this is a floating-point type.
    pub fn is_float(&self) -> bool {
        Self::FLOAT_TYPES.contains(self)
    }

    /// Check if this is an integer or floating-point type.
    pub fn is_numeric(&self) -> bool {
        Self::NUMERIC_TYPES.contains(self)
    }

    /// Convert an ONNX element-type code.
    pub fn from_onnx(code: i32) -> Result<Self> {
        let onnx = OnnxDataType::try_from(code)
            .map_err(|_| Error::UnsupportedOperation(format!("unknown element type {code}")))?;

        match onnx {
            OnnxDataType::Uint8 => Ok(DataType::Uint8),
            OnnxDataType::Uint16 => Ok(DataType::Uint16),
            OnnxDataType::Uint32 => Ok(DataType::Uint32),
            OnnxDataType::Uint64 => Ok(DataType::Uint64),
            OnnxDataType::Int8 => Ok(DataType::Int8),
            OnnxDataType::Int16 => Ok(DataType::Int16),
            OnnxDataType::Int32 => Ok(DataType::Int32),
            OnnxDataType::Int64 => Ok(DataType::Int64),
            OnnxDataType::Float16 => Ok(DataType::Float16),
            OnnxDataType::Float => Ok(DataType::Float),
            OnnxDataType::Double => Ok(DataType::Double),
            OnnxDataType::String => Ok(DataType::String),
            OnnxDataType::Bool => Ok(DataType::Bool),
            OnnxDataType::Complex64 => Ok(DataType::Complex64),
            OnnxDataType::Complex128 => Ok(DataType::Complex128),
            OnnxDataType::Undefined | OnnxDataType::Bfloat16 => Err(
                Error::UnsupportedOperation(format!("element type {onnx:?} is not supported")),
            ),
        }
    }

    /// The ONNX element-type code.
    pub fn to_onnx(&self) -> i32 {
        let onnx = match self {
            DataType::Uint8 => OnnxDataType::Uint8,
            DataType::Uint16 => OnnxDataType::Uint16,
            DataType::Uint32 => OnnxDataType::Uint32,
            DataType::Uint64 => OnnxDataType::Uint64,
            DataType::Int8 => OnnxDataType::Int8,
            DataType::Int16 => OnnxDataType::Int16,
            DataType::Int32 => OnnxDataType::Int32,
            DataType::Int64 => OnnxDataType::Int64,
            DataType::Float16 => OnnxDataType::Float16,
            DataType::Float => OnnxDataType::Float,
            DataType::Double => OnnxDataType::Double,
            DataType::String => OnnxDataType::String,
            DataType::Bool => OnnxDataType::Bool,
            DataType::Complex64 => OnnxDataType::Complex64,
            DataType::Complex128 => OnnxDataType::Complex128,
        };
        onnx as i32
    }

    /// ONNX spelling of the type name (e.g. `FLOAT`, `INT64`).
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Uint8 => "UINT8",
            DataType::Uint16 => "UINT16",
            DataType::Uint32 => "UINT32",
            DataType::Uint64 => "UINT64",
            DataType::Int8 => "INT8",
            DataType::Int16 => "INT16",
            DataType::Int32 => "INT32",
            DataType::Int64 => "INT64",
            DataType::Float16 => "FLOAT16",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::String => "STRING",
            DataType::Bool => "BOOL",
            DataType::Complex64 => "COMPLEX64",
            DataType::Complex128 => "COMPLEX128",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered dimension sizes of a tensor.
///
/// Equality treats dimension 0 as a wildcard: two shapes of equal rank compare
/// equal when every dimension after the first matches, whatever the batch
/// size. Use [`Shape::dims`] for an exact comparison.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a shape from dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Create a rank-0 shape.
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    /// Convert signed dimensions from a serialized record.
    ///
    /// # Errors
    ///
    /// Returns `IllegalArgument` if any dimension is negative.
    pub fn from_dims(dims: &[i64]) -> Result<Self> {
        let dims = dims
            .iter()
            .map(|&d| {
                usize::try_from(d).map_err(|_| {
                    Error::IllegalArgument(format!("negative dimension {d} in shape {dims:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { dims })
    }

    /// Dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements. A rank-0 shape holds one element.
    ///
    /// Returns `None` if the product overflows `usize`.
    pub fn num_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.dims.len() == other.dims.len()
            && self.dims.iter().skip(1).eq(other.dims.iter().skip(1))
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dims)
    }
}

/// Element type and shape of a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInfo {
    pub data_type: DataType,
    pub shape: Shape,
}

impl ValueInfo {
    pub fn new(data_type: DataType, shape: impl Into<Shape>) -> Self {
        Self {
            data_type,
            shape: shape.into(),
        }
    }

    /// Decode the tensor type of a value-info record.
    ///
    /// Symbolic or unset dimensions become 0. A record without a tensor type
    /// falls back to a rank-0 FLOAT.
    pub fn from_proto(proto: &ValueInfoProto) -> Result<Self> {
        let tensor_type = match proto.r#type.as_ref().and_then(|t| t.value.as_ref()) {
            Some(TypeValue::TensorType(tensor_type)) => tensor_type,
            None => {
                debug!(name = %proto.name, "value info has no tensor type, assuming FLOAT");
                return Ok(Self::new(DataType::Float, Shape::scalar()));
            }
        };

        let data_type = DataType::from_onnx(tensor_type.elem_type)?;
        let dims = match &tensor_type.shape {
            Some(shape) => shape
                .dim
                .iter()
                .map(|dim| match &dim.value {
                    Some(DimValue::DimValue(v)) => usize::try_from(*v).map_err(|_| {
                        Error::IllegalArgument(format!(
                            "negative dimension {v} for value '{}'",
                            proto.name
                        ))
                    }),
                    Some(DimValue::DimParam(_)) | None => Ok(0),
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self::new(data_type, dims))
    }
}

impl fmt::Display for ValueInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.data_type, self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_onnx::onnx::tensor_shape_proto::Dimension;
    use strata_onnx::onnx::type_proto::Tensor as TensorTypeProto;
    use strata_onnx::{TensorShapeProto, TypeProto};

    #[test]
    fn test_unit_sizes() {
        assert_eq!(DataType::Float.unit_size(), Some(4));
        assert_eq!(DataType::Int64.unit_size(), Some(8));
        assert_eq!(DataType::Float16.unit_size(), Some(2));
        assert_eq!(DataType::Bool.unit_size(), Some(1));
        assert_eq!(DataType::Complex64.unit_size(), None);
        assert_eq!(DataType::Complex128.unit_size(), None);
    }

    #[test]
    fn test_type_groups() {
        assert!(DataType::Float16.is_float());
        assert!(!DataType::Int32.is_float());
        assert!(DataType::Uint8.is_numeric());
        assert!(!DataType::Bool.is_numeric());
        assert!(!DataType::HIGH_PRECISION_NUMERIC.contains(&DataType::Int8));
        assert!(!DataType::ALL_TYPES_WITHOUT_COMPLEX.contains(&DataType::Complex64));
        assert!(!DataType::ALL_TYPES_WITHOUT_STRING_AND_COMPLEX.contains(&DataType::String));
        assert_eq!(DataType::ALL_TYPES.len(), 15);
    }

    #[test]
    fn test_onnx_codes() {
        for &dtype in DataType::ALL_TYPES {
            assert_eq!(DataType::from_onnx(dtype.to_onnx()).unwrap(), dtype);
        }
        assert!(DataType::from_onnx(0).is_err());
        assert!(DataType::from_onnx(16).is_err());
        assert!(DataType::from_onnx(1000).is_err());
    }

    #[test]
    fn test_shape_batch_wildcard() {
        let a = Shape::new(vec![1, 3, 224, 224]);
        let b = Shape::new(vec![8, 3, 224, 224]);
        let c = Shape::new(vec![8, 3, 224, 225]);

        assert_eq!(a, b);
        assert_ne!(b, c);
        assert_ne!(a.dims(), b.dims());
        assert_ne!(Shape::new(vec![4]), Shape::new(vec![4, 1]));
    }

    #[test]
    fn test_shape_num_elements() {
        assert_eq!(Shape::new(vec![2, 3, 4]).num_elements(), Some(24));
        assert_eq!(Shape::scalar().num_elements(), Some(1));
        assert_eq!(Shape::new(vec![2, 0]).num_elements(), Some(0));
        assert_eq!(Shape::new(vec![usize::MAX, 2]).num_elements(), None);
    }

    #[test]
    fn test_shape_from_negative_dims() {
        assert!(Shape::from_dims(&[2, -1]).is_err());
        assert_eq!(Shape::from_dims(&[2, 5]).unwrap().dims(), &[2, 5]);
    }

    #[test]
    fn test_value_info_from_proto() {
        let proto = ValueInfoProto {
            name: "input".to_string(),
            r#type: Some(TypeProto {
                value: Some(TypeValue::TensorType(TensorTypeProto {
                    elem_type: DataType::Float.to_onnx(),
                    shape: Some(TensorShapeProto {
                        dim: vec![
                            Dimension {
                                value: Some(DimValue::DimParam("batch".to_string())),
                                ..Default::default()
                            },
                            Dimension {
                                value: Some(DimValue::DimValue(3)),
                                ..Default::default()
                            },
                        ],
                    }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        };

        let info = ValueInfo::from_proto(&proto).unwrap();
        assert_eq!(info.data_type, DataType::Float);
        assert_eq!(info.shape.dims(), &[0, 3]);
        assert_eq!(info, ValueInfo::new(DataType::Float, vec![16, 3]));
    }
}
