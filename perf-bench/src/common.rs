pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use indexmap::IndexMap;
pub use itertools::{iproduct, Itertools};
pub use log::{debug, info, warn};
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt::{self, Display, Formatter},
    io::Read,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};
pub use strum::{AsRefStr, EnumString};
