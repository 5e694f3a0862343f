//! Shape inference implementations for the operator catalog.
//!
//! Each operator kind is a struct implementing
//! [`InferShapes`](crate::InferShapes). `*D` variants read their
//! configuration from compile-time attributes; the others read it from a
//! constant-folded input tensor and degrade to a dynamic result when the
//! value cannot be resolved.

mod broadcast;
mod fill;
mod pad;
mod structural;

pub use broadcast::{BroadcastTo, BroadcastToD};
pub use fill::{Fill, FillD, FillV2, FillV2D, InferOutcome, InputFeedback};
pub use pad::{Pad, PadD, PadLayout, PadV2, PadV2D, PadV3, PadV3D, PaddingSpec};
pub use structural::{AscendPadding, Diag, EmbeddingRankId};
