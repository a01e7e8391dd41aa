//! ResNet-vd style convolutional backbone for dense prediction models.

mod common;

pub mod block;
pub mod config;
pub mod model;
pub mod stage;
pub mod weights;

pub use block::*;
pub use config::*;
pub use model::*;
pub use stage::*;
pub use weights::*;
