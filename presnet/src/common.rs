pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use itertools::Itertools;
pub use log::{debug, info, warn};
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use serde_repr::{Deserialize_repr, Serialize_repr};
pub use std::{
    borrow::Borrow,
    convert::TryFrom,
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
};
pub use strum::{AsRefStr, EnumString};
pub use tch::{
    nn::{self, Module as _, ModuleT as _},
    Device, Kind, Tensor,
};
pub use tch_act::{Activation, TensorActivationExt as _};
pub use tch_modules::{ConvNorm2D, ConvNorm2DInit, NormInit, NormKind};
