//! DAVIS2016 frame-pair feeder for foreground/background segmentation
//! training: two frames of a clip, the binary label of the first frame and
//! a class-balancing weight map, emitted as candle tensors.

pub mod core;
pub mod datasets;
mod error;

pub use error::{FeederError, Result};
