use crate::{common::*, config::Variant};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Two 3x3 convolutions.
    Basic,
    /// 1x1 reduce, 3x3, 1x1 expand.
    BottleNeck,
}

impl BlockKind {
    /// Ratio of block output channels to the block width.
    pub fn expansion(&self) -> usize {
        match self {
            Self::Basic => 1,
            Self::BottleNeck => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockInit {
    pub kind: BlockKind,
    pub in_c: usize,
    /// Block width. The output has `out_c * expansion` channels.
    pub out_c: usize,
    pub stride: usize,
    /// Add the input directly instead of through a projection.
    pub shortcut: bool,
    pub variant: Variant,
    pub activation: Activation,
    pub norm: NormInit,
}

impl BlockInit {
    pub fn new(kind: BlockKind, in_c: usize, out_c: usize) -> Self {
        Self {
            kind,
            in_c,
            out_c,
            stride: 1,
            shortcut: true,
            variant: Variant::default(),
            activation: Activation::Relu,
            norm: NormInit::default(),
        }
    }

    pub fn build<'p, P>(self, path: P) -> Block
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self {
            kind,
            in_c,
            out_c,
            stride,
            shortcut,
            variant,
            activation,
            norm,
        } = self;

        let conv = |in_c: usize, out_c: usize, k: usize, s: usize, activation: Activation| {
            ConvNorm2DInit {
                s,
                activation,
                norm: Some(norm.clone()),
                ..ConvNorm2DInit::new(in_c, out_c, k)
            }
        };

        let (branch2a, branch2b, branch2c) = match kind {
            BlockKind::Basic => {
                let branch2a = conv(in_c, out_c, 3, stride, activation).build(path / "branch2a");
                let branch2b =
                    conv(out_c, out_c, 3, 1, Activation::Linear).build(path / "branch2b");
                (branch2a, branch2b, None)
            }
            BlockKind::BottleNeck => {
                let (stride1, stride2) = match variant {
                    Variant::A => (stride, 1),
                    _ => (1, stride),
                };
                let width = out_c;

                let branch2a = conv(in_c, width, 1, stride1, activation).build(path / "branch2a");
                let branch2b =
                    conv(width, width, 3, stride2, activation).build(path / "branch2b");
                let branch2c = conv(width, out_c * kind.expansion(), 1, 1, Activation::Linear)
                    .build(path / "branch2c");
                (branch2a, branch2b, Some(branch2c))
            }
        };

        let short_c = out_c * kind.expansion();
        let short = if shortcut {
            Shortcut::Identity
        } else if variant == Variant::D && stride == 2 {
            let short_path = path / "short";
            Shortcut::PoolProjection(
                conv(in_c, short_c, 1, 1, Activation::Linear).build(&short_path / "conv"),
            )
        } else {
            Shortcut::Projection(
                conv(in_c, short_c, 1, stride, Activation::Linear).build(path / "short"),
            )
        };

        Block {
            kind,
            branch2a,
            branch2b,
            branch2c,
            short,
            activation,
        }
    }
}

#[derive(Debug)]
pub enum Shortcut {
    Identity,
    Projection(ConvNorm2D),
    /// 2x2 average pooling with ceil mode followed by a 1x1 projection.
    PoolProjection(ConvNorm2D),
}

impl nn::ModuleT for Shortcut {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        match self {
            Self::Identity => xs.shallow_clone(),
            Self::Projection(conv) => conv.forward_t(xs, train),
            Self::PoolProjection(conv) => {
                let xs = xs.avg_pool2d(&[2, 2], &[2, 2], &[0, 0], true, true, None::<i64>);
                conv.forward_t(&xs, train)
            }
        }
    }
}

impl Shortcut {
    pub fn set_trainable(&self, trainable: bool) {
        match self {
            Self::Identity => {}
            Self::Projection(conv) | Self::PoolProjection(conv) => conv.set_trainable(trainable),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

/// A residual block.
#[derive(Debug)]
pub struct Block {
    kind: BlockKind,
    branch2a: ConvNorm2D,
    branch2b: ConvNorm2D,
    branch2c: Option<ConvNorm2D>,
    short: Shortcut,
    activation: Activation,
}

impl nn::ModuleT for Block {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let Self {
            ref branch2a,
            ref branch2b,
            ref branch2c,
            ref short,
            activation,
            ..
        } = *self;

        let out = branch2a.forward_t(xs, train);
        let out = branch2b.forward_t(&out, train);
        let out = match branch2c {
            Some(branch2c) => branch2c.forward_t(&out, train),
            None => out,
        };

        (out + short.forward_t(xs, train)).activation(activation)
    }
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn shortcut(&self) -> &Shortcut {
        &self.short
    }

    pub fn out_c(&self) -> usize {
        self.branch2c.as_ref().unwrap_or(&self.branch2b).out_c()
    }

    /// True if none of the block's convolutions receives gradients.
    pub fn is_frozen(&self) -> bool {
        let Self {
            branch2a,
            branch2b,
            branch2c,
            short,
            ..
        } = self;

        let short_trainable = match short {
            Shortcut::Identity => false,
            Shortcut::Projection(conv) | Shortcut::PoolProjection(conv) => conv.is_trainable(),
        };

        !(branch2a.is_trainable()
            || branch2b.is_trainable()
            || branch2c.as_ref().map_or(false, |conv| conv.is_trainable())
            || short_trainable)
    }

    pub fn set_trainable(&self, trainable: bool) {
        let Self {
            branch2a,
            branch2b,
            branch2c,
            short,
            ..
        } = self;

        branch2a.set_trainable(trainable);
        branch2b.set_trainable(trainable);
        if let Some(branch2c) = branch2c {
            branch2c.set_trainable(trainable);
        }
        short.set_trainable(trainable);
    }
}
