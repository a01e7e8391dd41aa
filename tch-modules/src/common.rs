pub use log::warn;
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{borrow::Borrow, sync::Once};
pub use strum::{AsRefStr, Display, EnumString};
pub use tch::{
    nn::{self, Module as _, ModuleT as _},
    Device, Kind, Tensor,
};
pub use tch_act::{Activation, TensorActivationExt as _};
