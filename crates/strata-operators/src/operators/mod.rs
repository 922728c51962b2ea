//! Versioned operator contracts.
//!
//! Each operator version has its own input bundle holding only the fields
//! legal for that version, an `upgrade` from the previous bundle, and a unit
//! struct implementing [`Operator`](crate::Operator) for dispatch.

pub mod add;
pub mod cast;
pub mod clip;
pub mod concat;
pub mod relu;

use crate::operator::Operator;

pub use add::{AddV1, AddV6, AddV7, AddV14};
pub use cast::{CastV1, CastV6};
pub use clip::{ClipV1, ClipV6, ClipV11, ClipV12};
pub use concat::{ConcatV1, ConcatV4};
pub use relu::{ReluV1, ReluV6, ReluV14};

/// Every known version of every default-domain operator.
pub fn all_versions() -> Vec<Box<dyn Operator>> {
    vec![
        Box::new(AddV1),
        Box::new(AddV6),
        Box::new(AddV7),
        Box::new(AddV14),
        Box::new(CastV1),
        Box::new(CastV6),
        Box::new(ClipV1),
        Box::new(ClipV6),
        Box::new(ClipV11),
        Box::new(ClipV12),
        Box::new(ConcatV1),
        Box::new(ConcatV4),
        Box::new(ReluV1),
        Box::new(ReluV6),
        Box::new(ReluV14),
    ]
}
