//! Backbone configuration format.

use crate::{block::BlockKind, common::*};

/// Stage widths before block expansion.
pub const STAGE_CHANNELS: [usize; 4] = [64, 128, 256, 512];

/// Down-sampling factor of each stage output relative to the input image.
pub const STAGE_STRIDES: [usize; 4] = [4, 8, 16, 32];

/// Number of stem output channels.
pub const STEM_CHANNELS: usize = 64;

/// Network depth. It is written as a plain integer in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(usize)]
pub enum Depth {
    R18 = 18,
    R34 = 34,
    R50 = 50,
    R101 = 101,
}

impl Depth {
    pub const ALL: [Depth; 4] = [Depth::R18, Depth::R34, Depth::R50, Depth::R101];

    /// Number of residual blocks per stage.
    pub fn block_nums(&self) -> [usize; 4] {
        match self {
            Self::R18 => [2, 2, 2, 2],
            Self::R34 | Self::R50 => [3, 4, 6, 3],
            Self::R101 => [3, 4, 23, 3],
        }
    }

    pub fn block_kind(&self) -> BlockKind {
        match self {
            Self::R18 | Self::R34 => BlockKind::Basic,
            Self::R50 | Self::R101 => BlockKind::BottleNeck,
        }
    }

    pub fn value(&self) -> usize {
        *self as usize
    }
}

impl TryFrom<usize> for Depth {
    type Error = Error;

    fn try_from(depth: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .find(|candidate| candidate.value() == depth)
            .copied()
            .ok_or_else(|| format_err!("unsupported depth {}, expect one of 18, 34, 50, 101", depth))
    }
}

impl Display for Depth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Stem and down-sampling layout.
///
/// Variants `c` and `d` replace the 7x7 stem with three 3x3 convolutions.
/// Variant `d` additionally down-samples projection shortcuts with average
/// pooling instead of a strided 1x1 convolution. Variant `a` places the
/// bottleneck stride on the first 1x1 convolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    A,
    B,
    C,
    D,
}

impl Default for Variant {
    fn default() -> Self {
        Self::D
    }
}

impl Variant {
    pub fn has_deep_stem(&self) -> bool {
        matches!(self, Self::C | Self::D)
    }
}

/// Batch normalization hyper-parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormConfig {
    #[serde(default = "default_eps")]
    pub eps: R64,
    #[serde(default = "default_momentum")]
    pub momentum: R64,
}

impl Default for NormConfig {
    fn default() -> Self {
        Self {
            eps: default_eps(),
            momentum: default_momentum(),
        }
    }
}

/// The backbone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPResNetInit")]
pub struct PResNetInit {
    pub depth: Depth,
    pub variant: Variant,
    pub num_stages: usize,
    /// Indexes of stages whose outputs are returned, in increasing order.
    pub return_idx: Vec<usize>,
    pub activation: Activation,
    pub norm: NormConfig,
    /// Freeze the stem and this many leading stages.
    pub freeze_at: Option<usize>,
    /// Replace every batch norm by a frozen batch norm.
    pub freeze_norm: bool,
    pub in_channels: usize,
    /// Checkpoint file loaded after construction.
    pub pretrained: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPResNetInit {
    pub depth: Depth,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default = "default_num_stages")]
    pub num_stages: usize,
    pub return_idx: Option<Vec<usize>>,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub norm: NormConfig,
    pub freeze_at: Option<i64>,
    #[serde(default = "default_freeze_norm")]
    pub freeze_norm: bool,
    #[serde(default = "default_in_channels")]
    pub in_channels: usize,
    pub pretrained: Option<PathBuf>,
}

impl TryFrom<RawPResNetInit> for PResNetInit {
    type Error = Error;

    fn try_from(raw: RawPResNetInit) -> Result<Self, Self::Error> {
        let RawPResNetInit {
            depth,
            variant,
            num_stages,
            return_idx,
            activation,
            norm,
            freeze_at,
            freeze_norm,
            in_channels,
            pretrained,
        } = raw;

        let return_idx = return_idx.unwrap_or_else(|| (0..num_stages.min(4)).collect());
        // negative values disable freezing
        let freeze_at = freeze_at.and_then(|freeze_at| usize::try_from(freeze_at).ok());

        let init = Self {
            depth,
            variant,
            num_stages,
            return_idx,
            activation,
            norm,
            freeze_at,
            freeze_norm,
            in_channels,
            pretrained,
        };
        init.validate()?;
        Ok(init)
    }
}

impl PResNetInit {
    pub fn new(depth: Depth) -> Self {
        Self {
            depth,
            variant: Variant::default(),
            num_stages: default_num_stages(),
            return_idx: vec![0, 1, 2, 3],
            activation: Activation::default(),
            norm: NormConfig::default(),
            freeze_at: None,
            freeze_norm: default_freeze_norm(),
            in_channels: default_in_channels(),
            pretrained: None,
        }
    }

    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let init: Self = json5::from_str(&text)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        Ok(init)
    }

    pub fn validate(&self) -> Result<()> {
        let Self {
            num_stages,
            ref return_idx,
            in_channels,
            ref norm,
            ..
        } = *self;

        ensure!(
            (1..=4).contains(&num_stages),
            "num_stages must be in range 1..=4, but get {}",
            num_stages
        );
        ensure!(in_channels > 0, "in_channels must be positive");
        ensure!(!return_idx.is_empty(), "return_idx must not be empty");
        ensure!(
            return_idx.iter().all(|&index| index < num_stages),
            "return_idx {:?} refers to stages beyond num_stages {}",
            return_idx,
            num_stages
        );
        ensure!(
            return_idx.iter().tuple_windows().all(|(lhs, rhs)| lhs < rhs),
            "return_idx {:?} must be strictly increasing",
            return_idx
        );
        ensure!(norm.eps.raw() > 0.0, "norm eps must be positive");
        ensure!(
            (0.0..=1.0).contains(&norm.momentum.raw()),
            "norm momentum must be in range [0, 1]"
        );

        Ok(())
    }

    pub fn block_kind(&self) -> BlockKind {
        self.depth.block_kind()
    }

    pub fn norm_init(&self) -> NormInit {
        let NormConfig { eps, momentum } = self.norm;
        let kind = if self.freeze_norm {
            NormKind::FrozenBatchNorm
        } else {
            NormKind::BatchNorm
        };

        NormInit {
            kind,
            eps,
            momentum,
        }
    }

    /// Output channels of every built stage.
    pub fn stage_out_channels(&self) -> Vec<usize> {
        let expansion = self.block_kind().expansion();
        STAGE_CHANNELS[..self.num_stages]
            .iter()
            .map(|&channels| channels * expansion)
            .collect()
    }

    pub fn out_channels(&self) -> Vec<usize> {
        let stage_channels = self.stage_out_channels();
        self.return_idx
            .iter()
            .map(|&index| stage_channels[index])
            .collect()
    }

    pub fn out_strides(&self) -> Vec<usize> {
        self.return_idx
            .iter()
            .map(|&index| STAGE_STRIDES[index])
            .collect()
    }

    /// Number of leading stages whose parameters are frozen.
    pub fn num_frozen_stages(&self) -> usize {
        self.freeze_at
            .map(|freeze_at| freeze_at.min(self.num_stages))
            .unwrap_or(0)
    }

    pub fn is_stem_frozen(&self) -> bool {
        self.freeze_at.is_some()
    }
}

fn default_eps() -> R64 {
    r64(1e-5)
}

fn default_momentum() -> R64 {
    r64(0.1)
}

fn default_num_stages() -> usize {
    4
}

fn default_freeze_norm() -> bool {
    true
}

fn default_in_channels() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_table_test() {
        assert_eq!(Depth::R18.block_nums(), [2, 2, 2, 2]);
        assert_eq!(Depth::R101.block_nums(), [3, 4, 23, 3]);
        assert_eq!(Depth::R34.block_kind(), BlockKind::Basic);
        assert_eq!(Depth::R50.block_kind(), BlockKind::BottleNeck);
        assert_eq!(Depth::try_from(50).unwrap(), Depth::R50);
        assert!(Depth::try_from(152).is_err());
    }

    #[test]
    fn config_defaults_test() -> Result<()> {
        let init: PResNetInit = json5::from_str("{ depth: 50 }")?;
        assert_eq!(init, PResNetInit::new(Depth::R50));
        assert_eq!(init.out_channels(), vec![256, 512, 1024, 2048]);
        assert_eq!(init.out_strides(), vec![4, 8, 16, 32]);
        assert_eq!(init.norm_init().kind, NormKind::FrozenBatchNorm);
        assert_eq!(init.num_frozen_stages(), 0);
        assert!(!init.is_stem_frozen());
        Ok(())
    }

    #[test]
    fn config_partial_stages_test() -> Result<()> {
        let init: PResNetInit = json5::from_str(
            r#"{
                depth: 18,
                variant: "b",
                num_stages: 3,
                freeze_at: 5,
                freeze_norm: false,
                activation: "gelu",
            }"#,
        )?;
        assert_eq!(init.return_idx, vec![0, 1, 2]);
        assert_eq!(init.out_channels(), vec![64, 128, 256]);
        assert_eq!(init.num_frozen_stages(), 3);
        assert!(init.is_stem_frozen());
        assert_eq!(init.activation, Activation::Gelu);
        assert_eq!(init.norm_init().kind, NormKind::BatchNorm);
        Ok(())
    }

    #[test]
    fn config_negative_freeze_at_test() -> Result<()> {
        let init: PResNetInit = json5::from_str("{ depth: 34, freeze_at: -1 }")?;
        assert_eq!(init.freeze_at, None);
        Ok(())
    }

    #[test]
    fn config_invalid_test() {
        assert!(json5::from_str::<PResNetInit>("{ depth: 42 }").is_err());
        assert!(json5::from_str::<PResNetInit>("{ depth: 50, num_stages: 0 }").is_err());
        assert!(json5::from_str::<PResNetInit>("{ depth: 50, num_stages: 2, return_idx: [1, 2] }").is_err());
        assert!(json5::from_str::<PResNetInit>("{ depth: 50, return_idx: [2, 1] }").is_err());
        assert!(json5::from_str::<PResNetInit>("{ depth: 50, variant: \"e\" }").is_err());
    }

    #[test]
    fn config_serde_round_trip_test() -> Result<()> {
        let init = PResNetInit {
            return_idx: vec![1, 3],
            freeze_at: Some(1),
            ..PResNetInit::new(Depth::R101)
        };
        let text = serde_json::to_string_pretty(&init)?;
        let recovered: PResNetInit = serde_json::from_str(&text)?;
        assert_eq!(init, recovered);
        Ok(())
    }
}
