//! Typed, shaped, buffer-backed tensor values.
//!
//! A [`Tensor`] exclusively owns its bytes. Reads go through a [`TensorView`],
//! a read-only cursor over the buffer that never moves or mutates the owner.
//! Memory is returned to the allocator either when the tensor is dropped or
//! earlier through [`Tensor::release`], which is safe to call more than once.

use std::fmt;
use std::io;

use bytemuck::Pod;
use tracing::trace;

use crate::buffer::Buffer;
use crate::types::{DataType, Shape, ValueInfo};
use crate::{Error, Result};

/// Byte order of multi-byte elements in a tensor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the target platform.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

/// Where tensor buffers are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllocationPolicy {
    /// Ordinary vector storage.
    #[default]
    Heap,

    /// Aligned storage from the global allocator, outside any vector.
    Direct,
}

/// Options applied to every tensor allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TensorOptions {
    pub allocation: AllocationPolicy,

    /// Byte order used when encoding typed values. Raw serialized bytes keep
    /// their little-endian wire order.
    pub byte_order: ByteOrder,
}

impl TensorOptions {
    /// Heap allocation in native byte order.
    pub fn heap() -> Self {
        Self::default()
    }

    /// Direct allocation in native byte order.
    pub fn direct() -> Self {
        Self::default().with_allocation(AllocationPolicy::Direct)
    }

    pub fn with_allocation(mut self, allocation: AllocationPolicy) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

/// A typed, shaped block of values.
///
/// Invariant: while live, the buffer is non-empty and its length is exactly
/// `shape.num_elements() * data_type.unit_size()`.
pub struct Tensor {
    value_info: ValueInfo,
    byte_order: ByteOrder,
    buffer: Option<Buffer>,
}

impl Tensor {
    /// Allocate a zero-filled tensor.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the element type has no fixed width,
    /// and `IllegalArgument` if the computed buffer size is zero or cannot be
    /// allocated.
    pub fn allocate(data_type: DataType, shape: Shape, options: &TensorOptions) -> Result<Self> {
        let len = buffer_len(data_type, &shape)?;
        let buffer = match options.allocation {
            AllocationPolicy::Heap => Buffer::heap_zeroed(len)?,
            AllocationPolicy::Direct => Buffer::direct_zeroed(len)?,
        };
        trace!(%data_type, %shape, len, allocation = ?options.allocation, "allocated tensor");

        Ok(Self {
            value_info: ValueInfo { data_type, shape },
            byte_order: options.byte_order,
            buffer: Some(buffer),
        })
    }

    /// Create a tensor holding a copy of `bytes`, laid out in `byte_order`.
    ///
    /// # Errors
    ///
    /// Returns `IllegalArgument` if `bytes` does not match the size implied by
    /// `data_type` and `shape`, or that size is zero.
    pub fn from_bytes(
        data_type: DataType,
        shape: Shape,
        bytes: &[u8],
        byte_order: ByteOrder,
        options: &TensorOptions,
    ) -> Result<Self> {
        let len = buffer_len(data_type, &shape)?;
        if bytes.len() != len {
            return Err(Error::IllegalArgument(format!(
                "{data_type}{shape} needs {len} bytes, got {}",
                bytes.len()
            )));
        }

        let buffer = match options.allocation {
            AllocationPolicy::Heap => Buffer::heap_from(bytes),
            AllocationPolicy::Direct => Buffer::direct_from(bytes)?,
        };

        Ok(Self {
            value_info: ValueInfo { data_type, shape },
            byte_order,
            buffer: Some(buffer),
        })
    }

    /// Create a tensor from typed values in native byte order.
    pub fn from_values<T: Pod>(
        data_type: DataType,
        shape: Shape,
        values: &[T],
        options: &TensorOptions,
    ) -> Result<Self> {
        check_element_width::<T>(data_type)?;
        Self::from_bytes(
            data_type,
            shape,
            bytemuck::cast_slice(values),
            ByteOrder::native(),
            options,
        )
    }

    pub fn value_info(&self) -> &ValueInfo {
        &self.value_info
    }

    pub fn data_type(&self) -> DataType {
        self.value_info.data_type
    }

    pub fn shape(&self) -> &Shape {
        &self.value_info.shape
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Number of elements described by the shape.
    pub fn element_count(&self) -> usize {
        self.value_info.shape.num_elements().unwrap_or(0)
    }

    /// Buffer length in bytes, or 0 once released.
    pub fn byte_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.len())
    }

    /// Check if the buffer was allocated outside vector storage.
    pub fn is_direct(&self) -> bool {
        self.buffer.as_ref().is_some_and(Buffer::is_direct)
    }

    pub fn is_released(&self) -> bool {
        self.buffer.is_none()
    }

    /// Read-only view over the tensor's bytes with its own cursor.
    ///
    /// # Errors
    ///
    /// Returns `TensorReleased` if the buffer has been released.
    pub fn data(&self) -> Result<TensorView<'_>> {
        let bytes = self.live_buffer()?;
        Ok(TensorView::new(bytes, self.byte_order))
    }

    /// Mutable access to the tensor's bytes, for the tensor's owner.
    pub fn data_mut(&mut self) -> Result<&mut [u8]> {
        self.buffer
            .as_deref_mut()
            .ok_or_else(|| Error::TensorReleased(self.value_info.to_string()))
    }

    /// Copy the elements out as `T`, converting from the tensor's byte order.
    ///
    /// # Errors
    ///
    /// Returns `IllegalArgument` if `T` is not as wide as the element type.
    pub fn to_vec<T: Pod>(&self) -> Result<Vec<T>> {
        check_element_width::<T>(self.data_type())?;
        let bytes = self.live_buffer()?;

        if self.byte_order.is_native() || size_of::<T>() == 1 {
            return Ok(bytemuck::pod_collect_to_vec(bytes));
        }

        let mut swapped = bytes.to_vec();
        for chunk in swapped.chunks_exact_mut(size_of::<T>()) {
            chunk.reverse();
        }
        Ok(bytemuck::pod_collect_to_vec(&swapped))
    }

    /// Return the buffer to the allocator.
    ///
    /// Returns `true` if memory was freed by this call and `false` if the
    /// tensor had already been released. Every accessor fails with
    /// `TensorReleased` afterwards.
    pub fn release(&mut self) -> bool {
        match self.buffer.take() {
            Some(buffer) => {
                trace!(value = %self.value_info, direct = buffer.is_direct(), "released tensor");
                drop(buffer);
                true
            }
            None => false,
        }
    }

    fn live_buffer(&self) -> Result<&[u8]> {
        self.buffer
            .as_deref()
            .ok_or_else(|| Error::TensorReleased(self.value_info.to_string()))
    }
}

/// Tensors are equal when their value info, byte order and live bytes match.
/// A released tensor equals nothing, itself included.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        match (self.buffer.as_deref(), other.buffer.as_deref()) {
            (Some(lhs), Some(rhs)) => {
                self.value_info == other.value_info
                    && self.byte_order == other.byte_order
                    && lhs == rhs
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("value_info", &self.value_info)
            .field("byte_order", &self.byte_order)
            .field("byte_len", &self.byte_len())
            .field("direct", &self.is_direct())
            .field("released", &self.is_released())
            .finish()
    }
}

fn buffer_len(data_type: DataType, shape: &Shape) -> Result<usize> {
    let unit = data_type.unit_size().ok_or_else(|| {
        Error::UnsupportedOperation(format!("{data_type} tensors cannot be allocated"))
    })?;
    let len = shape
        .num_elements()
        .and_then(|n| n.checked_mul(unit))
        .ok_or_else(|| Error::IllegalArgument(format!("{data_type}{shape} is too large")))?;

    if len == 0 {
        return Err(Error::IllegalArgument(format!(
            "{data_type}{shape} has a non-positive buffer size"
        )));
    }
    Ok(len)
}

fn check_element_width<T>(data_type: DataType) -> Result<()> {
    if data_type.unit_size() != Some(size_of::<T>()) {
        return Err(Error::IllegalArgument(format!(
            "{} is not a {data_type} element",
            std::any::type_name::<T>()
        )));
    }
    Ok(())
}

/// Read-only cursor over a tensor's bytes.
///
/// The view borrows the owner's buffer, so the owner cannot be mutated or
/// released while the view is alive. Advancing the view does not affect the
/// owner or any other view.
#[derive(Debug, Clone)]
pub struct TensorView<'a> {
    bytes: &'a [u8],
    position: usize,
    byte_order: ByteOrder,
}

macro_rules! read_fn {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("Read the next `", stringify!($ty), "` and advance the cursor.")]
        pub fn $name(&mut self) -> Option<$ty> {
            let bytes = self.take::<{ size_of::<$ty>() }>()?;
            Some(match self.byte_order {
                ByteOrder::LittleEndian => <$ty>::from_le_bytes(bytes),
                ByteOrder::BigEndian => <$ty>::from_be_bytes(bytes),
            })
        }
    };
}

impl<'a> TensorView<'a> {
    fn new(bytes: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            bytes,
            position: 0,
            byte_order,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// All bytes of the view, independent of the cursor.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor. Positions past the end are rejected.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.bytes.len() {
            return Err(Error::IllegalArgument(format!(
                "position {position} is past the end of a {}-byte view",
                self.bytes.len()
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Bytes left between the cursor and the end.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    read_fn!(read_u16, u16);
    read_fn!(read_i32, i32);
    read_fn!(read_u32, u32);
    read_fn!(read_i64, i64);
    read_fn!(read_u64, u64);
    read_fn!(read_f32, f32);
    read_fn!(read_f64, f64);

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.position.checked_add(N)?;
        let bytes: [u8; N] = self.bytes.get(self.position..end)?.try_into().ok()?;
        self.position = end;
        Some(bytes)
    }
}

impl io::Read for TensorView<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.bytes[self.position..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.position += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_allocate_heap_and_direct() {
        for options in [TensorOptions::heap(), TensorOptions::direct()] {
            let tensor =
                Tensor::allocate(DataType::Float, Shape::new(vec![2, 3]), &options).unwrap();
            assert_eq!(tensor.byte_len(), 24);
            assert_eq!(tensor.element_count(), 6);
            assert_eq!(tensor.is_direct(), options.allocation == AllocationPolicy::Direct);
            assert!(tensor.data().unwrap().as_bytes().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_allocate_non_positive_size() {
        let result = Tensor::allocate(
            DataType::Float,
            Shape::new(vec![4, 0]),
            &TensorOptions::default(),
        );
        assert!(matches!(result, Err(Error::IllegalArgument(_))));
    }

    #[test]
    fn test_allocate_oversized_is_error_for_both_policies() {
        for options in [TensorOptions::heap(), TensorOptions::direct()] {
            let result = Tensor::allocate(DataType::Uint8, Shape::new(vec![usize::MAX]), &options);
            assert!(matches!(result, Err(Error::IllegalArgument(_))));
        }
    }

    #[test]
    fn test_allocate_complex_rejected() {
        let result = Tensor::allocate(
            DataType::Complex64,
            Shape::new(vec![2]),
            &TensorOptions::default(),
        );
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }

    #[test]
    fn test_from_bytes_length_mismatch() {
        let result = Tensor::from_bytes(
            DataType::Int64,
            Shape::new(vec![2]),
            &[0; 12],
            ByteOrder::LittleEndian,
            &TensorOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_view_cursor_is_independent() {
        let tensor = Tensor::from_values(
            DataType::Float,
            Shape::new(vec![2]),
            &[1.5f32, -2.0],
            &TensorOptions::default(),
        )
        .unwrap();

        let mut first = tensor.data().unwrap();
        assert_eq!(first.read_f32(), Some(1.5));
        assert_eq!(first.position(), 4);

        let mut second = tensor.data().unwrap();
        assert_eq!(second.position(), 0);
        assert_eq!(second.read_f32(), Some(1.5));
        assert_eq!(second.read_f32(), Some(-2.0));
        assert_eq!(second.read_f32(), None);
        assert_eq!(first.remaining(), 4);
    }

    #[test]
    fn test_view_honours_big_endian() {
        let tensor = Tensor::from_bytes(
            DataType::Int32,
            Shape::new(vec![1]),
            &[0, 0, 1, 2],
            ByteOrder::BigEndian,
            &TensorOptions::default(),
        )
        .unwrap();

        let mut view = tensor.data().unwrap();
        assert_eq!(view.byte_order(), ByteOrder::BigEndian);
        assert_eq!(view.read_i32(), Some(0x0102));
        assert_eq!(tensor.to_vec::<i32>().unwrap(), vec![0x0102]);
    }

    #[test]
    fn test_view_io_read() {
        let tensor = Tensor::from_values(
            DataType::Uint8,
            Shape::new(vec![3]),
            &[7u8, 8, 9],
            &TensorOptions::direct(),
        )
        .unwrap();

        let mut view = tensor.data().unwrap();
        view.set_position(1).unwrap();
        let mut out = Vec::new();
        view.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![8, 9]);
        assert!(view.set_position(4).is_err());
    }

    #[test]
    fn test_to_vec_width_mismatch() {
        let tensor = Tensor::from_values(
            DataType::Int64,
            Shape::new(vec![2]),
            &[1i64, 2],
            &TensorOptions::default(),
        )
        .unwrap();

        assert_eq!(tensor.to_vec::<i64>().unwrap(), vec![1, 2]);
        assert!(tensor.to_vec::<f32>().is_err());
    }

    #[test]
    fn test_release_twice() {
        let mut tensor =
            Tensor::allocate(DataType::Double, Shape::new(vec![8]), &TensorOptions::direct())
                .unwrap();

        assert!(tensor.release());
        assert!(tensor.is_released());
        assert!(!tensor.release());
        assert_eq!(tensor.byte_len(), 0);
        assert!(matches!(tensor.data(), Err(Error::TensorReleased(_))));
        assert!(tensor.data_mut().is_err());
    }

    #[test]
    fn test_equality_compares_contents() {
        let options = TensorOptions::default();
        let a = Tensor::from_values(DataType::Int32, Shape::new(vec![2]), &[1i32, 2], &options)
            .unwrap();
        let b = Tensor::from_values(
            DataType::Int32,
            Shape::new(vec![2]),
            &[1i32, 2],
            &TensorOptions::direct(),
        )
        .unwrap();
        let c = Tensor::from_values(DataType::Int32, Shape::new(vec![2]), &[1i32, 3], &options)
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_equality_respects_byte_order_and_release() {
        let bytes = [0u8, 1, 0, 2];
        let tensor = |byte_order| {
            Tensor::from_bytes(
                DataType::Uint16,
                Shape::new(vec![2]),
                &bytes,
                byte_order,
                &TensorOptions::default(),
            )
            .unwrap()
        };

        let mut a = tensor(ByteOrder::LittleEndian);
        let mut b = tensor(ByteOrder::LittleEndian);
        assert_eq!(a, b);
        assert_ne!(a, tensor(ByteOrder::BigEndian));

        a.release();
        b.release();
        assert_ne!(a, b);
    }

    #[test]
    fn test_data_mut_writes_through() {
        let mut tensor =
            Tensor::allocate(DataType::Uint8, Shape::new(vec![2]), &TensorOptions::default())
                .unwrap();
        tensor.data_mut().unwrap()[1] = 5;
        assert_eq!(tensor.data().unwrap().as_bytes(), &[0, 5]);
    }
}
