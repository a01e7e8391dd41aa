//! Normalized convolution building blocks on top of `tch`.

mod common;

pub mod batch_norm;
pub mod conv_norm_2d;
pub mod frozen_batch_norm;
pub mod norm;

pub use batch_norm::*;
pub use conv_norm_2d::*;
pub use frozen_batch_norm::*;
pub use norm::*;
