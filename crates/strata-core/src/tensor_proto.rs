//! Decoding of serialized tensor records.

use strata_onnx::TensorProto;
use strata_onnx::onnx::tensor_proto::DataLocation;
use tracing::trace;

use crate::tensor::{ByteOrder, Tensor, TensorOptions};
use crate::types::{DataType, Shape};
use crate::{Error, Result};

/// Encode a typed value list as bytes, narrowing each entry to `$ty`.
macro_rules! encode_values {
    ($values:expr, $ty:ty, $order:expr) => {{
        let order = $order;
        $values
            .iter()
            .flat_map(|&v| {
                let v = v as $ty;
                match order {
                    ByteOrder::LittleEndian => v.to_le_bytes(),
                    ByteOrder::BigEndian => v.to_be_bytes(),
                }
            })
            .collect::<Vec<u8>>()
    }};
}

impl Tensor {
    /// Decode a serialized tensor record.
    ///
    /// Packed `raw_data` is copied verbatim and keeps its little-endian wire
    /// order. Otherwise the typed value list matching the element type is
    /// encoded in `options.byte_order`. A record without dims is read as a
    /// rank-1 tensor holding every decoded element.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for element types without a byte
    /// conversion (STRING, COMPLEX64, COMPLEX128) and for externally stored
    /// data, and `IllegalArgument` if the content does not fit the declared
    /// dims.
    pub fn from_proto(proto: &TensorProto, options: &TensorOptions) -> Result<Self> {
        if proto.data_location == Some(DataLocation::External as i32) {
            return Err(Error::UnsupportedOperation(format!(
                "tensor '{}' uses external data",
                proto.name
            )));
        }

        let data_type = DataType::from_onnx(proto.data_type)?;
        let unit = data_type.unit_size().ok_or_else(|| {
            Error::UnsupportedOperation(format!(
                "tensor '{}' has element type {data_type}, which has no byte conversion",
                proto.name
            ))
        })?;

        let (bytes, byte_order) = if proto.raw_data.is_empty() {
            let order = options.byte_order;
            (encode_typed_values(proto, data_type, order)?, order)
        } else {
            (proto.raw_data.clone(), ByteOrder::LittleEndian)
        };

        let shape = if proto.dims.is_empty() {
            Shape::new(vec![bytes.len() / unit])
        } else {
            Shape::from_dims(&proto.dims)?
        };

        trace!(
            name = %proto.name,
            %data_type,
            %shape,
            raw = !proto.raw_data.is_empty(),
            "decoded tensor record"
        );
        Tensor::from_bytes(data_type, shape, &bytes, byte_order, options).map_err(|e| match e {
            Error::IllegalArgument(msg) => {
                Error::IllegalArgument(format!("tensor '{}': {msg}", proto.name))
            }
            other => other,
        })
    }
}

fn encode_typed_values(
    proto: &TensorProto,
    data_type: DataType,
    order: ByteOrder,
) -> Result<Vec<u8>> {
    let bytes = match data_type {
        DataType::Float => encode_values!(proto.float_data, f32, order),
        DataType::Double => encode_values!(proto.double_data, f64, order),
        DataType::Int64 => encode_values!(proto.int64_data, i64, order),
        DataType::Int32 => encode_values!(proto.int32_data, i32, order),
        DataType::Int16 => encode_values!(proto.int32_data, i16, order),
        DataType::Int8 => encode_values!(proto.int32_data, i8, order),
        DataType::Uint16 | DataType::Float16 => encode_values!(proto.int32_data, u16, order),
        DataType::Uint8 | DataType::Bool => encode_values!(proto.int32_data, u8, order),
        DataType::Uint32 => encode_values!(proto.uint64_data, u32, order),
        DataType::Uint64 => encode_values!(proto.uint64_data, u64, order),
        DataType::String | DataType::Complex64 | DataType::Complex128 => {
            return Err(Error::UnsupportedOperation(format!(
                "tensor '{}' has element type {data_type}, which has no byte conversion",
                proto.name
            )));
        }
    };
    Ok(bytes)
}
