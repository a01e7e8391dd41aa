use crate::{
    batch_norm::{BatchNorm2D, BatchNorm2DInit},
    common::*,
    frozen_batch_norm::{FrozenBatchNorm2D, FrozenBatchNorm2DInit},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NormKind {
    BatchNorm,
    FrozenBatchNorm,
}

impl Default for NormKind {
    fn default() -> Self {
        Self::BatchNorm
    }
}

#[derive(Debug, Clone)]
pub struct NormInit {
    pub kind: NormKind,
    pub eps: R64,
    pub momentum: R64,
}

impl Default for NormInit {
    fn default() -> Self {
        Self {
            kind: NormKind::default(),
            eps: r64(1e-5),
            momentum: r64(0.1),
        }
    }
}

impl NormInit {
    pub fn new(kind: NormKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>, out_dim: i64) -> Norm2D {
        let Self {
            kind,
            eps,
            momentum,
        } = self;

        match kind {
            NormKind::BatchNorm => Norm2D::BatchNorm(
                BatchNorm2DInit {
                    eps,
                    momentum,
                    ..Default::default()
                }
                .build(path, out_dim),
            ),
            NormKind::FrozenBatchNorm => {
                Norm2D::FrozenBatchNorm(FrozenBatchNorm2DInit { eps }.build(path, out_dim))
            }
        }
    }
}

#[derive(Debug)]
pub enum Norm2D {
    BatchNorm(BatchNorm2D),
    FrozenBatchNorm(FrozenBatchNorm2D),
}

impl nn::ModuleT for Norm2D {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        match self {
            Self::BatchNorm(norm) => norm.forward_t(xs, train),
            Self::FrozenBatchNorm(norm) => norm.forward(xs),
        }
    }
}

impl Norm2D {
    pub fn kind(&self) -> NormKind {
        match self {
            Self::BatchNorm(_) => NormKind::BatchNorm,
            Self::FrozenBatchNorm(_) => NormKind::FrozenBatchNorm,
        }
    }

    /// Toggles gradients of the affine parameters. Frozen norms have none.
    pub fn set_trainable(&self, trainable: bool) {
        if let Self::BatchNorm(norm) = self {
            norm.set_trainable(trainable);
        }
    }

    pub fn running_mean(&self) -> &Tensor {
        match self {
            Self::BatchNorm(norm) => norm.running_mean(),
            Self::FrozenBatchNorm(norm) => norm.running_mean(),
        }
    }

    pub fn running_var(&self) -> &Tensor {
        match self {
            Self::BatchNorm(norm) => norm.running_var(),
            Self::FrozenBatchNorm(norm) => norm.running_var(),
        }
    }
}
