#[cfg(feature = "tch")]
pub use impls::*;
#[cfg(feature = "tch")]
mod impls;

#[cfg(feature = "tch")]
pub use r#trait::*;
#[cfg(feature = "tch")]
mod r#trait;

use strum::{AsRefStr, Display, EnumString};

/// Element-wise activation applied after a normalized convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Activation {
    Relu,
    Relu6,
    LeakyRelu,
    Gelu,
    #[cfg_attr(feature = "serde", serde(alias = "swish"))]
    #[strum(to_string = "silu", serialize = "swish")]
    Silu,
    HardSwish,
    Mish,
    Sigmoid,
    Tanh,
    /// Identity, used where a layer carries no activation.
    Linear,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Relu
    }
}

impl Activation {
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Linear)
    }
}
