use crate::{
    block::BlockKind,
    common::*,
    config::{Depth, PResNetInit, STAGE_CHANNELS, STAGE_STRIDES, STEM_CHANNELS},
    stage::{Stage, StageInit},
    weights,
};

impl PResNetInit {
    /// Builds the backbone under `path` and applies parameter freezing.
    pub fn build<'p, P>(self, path: P) -> Result<PResNet>
    where
        P: Borrow<nn::Path<'p>>,
    {
        self.validate()?;
        let path = path.borrow();

        let block_kind = self.block_kind();
        let norm = self.norm_init();
        let out_channels = self.out_channels();
        let out_strides = self.out_strides();
        let num_frozen_stages = self.num_frozen_stages();
        let freeze_stem = self.is_stem_frozen();
        let Self {
            depth,
            variant,
            num_stages,
            return_idx,
            activation,
            in_channels,
            ..
        } = self;

        // stem
        let stem_defs: Vec<(usize, usize, usize, usize, &str)> = if variant.has_deep_stem() {
            vec![
                (in_channels, STEM_CHANNELS / 2, 3, 2, "conv1_1"),
                (STEM_CHANNELS / 2, STEM_CHANNELS / 2, 3, 1, "conv1_2"),
                (STEM_CHANNELS / 2, STEM_CHANNELS, 3, 1, "conv1_3"),
            ]
        } else {
            vec![(in_channels, STEM_CHANNELS, 7, 2, "conv1_1")]
        };

        let stem_path = path / "conv1";
        let stem: Vec<_> = stem_defs
            .into_iter()
            .map(|(in_c, out_c, k, s, name)| {
                ConvNorm2DInit {
                    s,
                    activation,
                    norm: Some(norm.clone()),
                    ..ConvNorm2DInit::new(in_c, out_c, k)
                }
                .build(&stem_path / name)
            })
            .collect();

        // residual stages
        let layers_path = path / "res_layers";
        let block_nums = depth.block_nums();
        let mut in_c = STEM_CHANNELS;

        let stages: Vec<_> = (0..num_stages)
            .map(|index| {
                let stage = StageInit {
                    kind: block_kind,
                    in_c,
                    out_c: STAGE_CHANNELS[index],
                    count: block_nums[index],
                    stage_num: index + 2,
                    variant,
                    activation,
                    norm: norm.clone(),
                }
                .build(&layers_path / index);
                in_c = stage.out_c();
                stage
            })
            .collect();

        let model = PResNet {
            depth,
            block_kind,
            stem,
            stages,
            return_idx,
            out_channels,
            out_strides,
            num_frozen_stages,
        };

        if freeze_stem {
            debug!(
                "freeze stem and {} leading stages of PResNet{}",
                num_frozen_stages, depth
            );
            model.set_stem_trainable(false);
            model.stages[..num_frozen_stages]
                .iter()
                .for_each(|stage| stage.set_trainable(false));
        }

        Ok(model)
    }
}

/// Summary of one residual stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInfo {
    pub index: usize,
    pub kind: BlockKind,
    pub num_blocks: usize,
    pub out_c: usize,
    pub stride: usize,
    pub returned: bool,
    /// No parameter of the stage currently receives gradients.
    pub frozen: bool,
}

#[derive(Debug)]
pub struct PResNet {
    depth: Depth,
    block_kind: BlockKind,
    stem: Vec<ConvNorm2D>,
    stages: Vec<Stage>,
    return_idx: Vec<usize>,
    out_channels: Vec<usize>,
    out_strides: Vec<usize>,
    num_frozen_stages: usize,
}

impl PResNet {
    /// Builds the backbone at the root of `vs` and loads the configured
    /// pretrained checkpoint, if any.
    pub fn new(vs: &mut nn::VarStore, init: PResNetInit) -> Result<Self> {
        let pretrained = init.pretrained.clone();
        let depth = init.depth;
        let model = init.build(&vs.root())?;

        if let Some(pretrained) = pretrained {
            weights::load_pretrained(vs, &pretrained, false)?;
            info!(
                "load PResNet{} weights from '{}'",
                depth,
                pretrained.display()
            );
        }

        Ok(model)
    }

    /// Runs the stem and stages and returns the selected stage outputs in
    /// `return_idx` order.
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Vec<Tensor> {
        let Self {
            ref stem,
            ref stages,
            ref return_idx,
            ..
        } = *self;

        let xs = stem
            .iter()
            .fold(xs.shallow_clone(), |xs, conv| conv.forward_t(&xs, train));
        let mut xs = xs.max_pool2d(&[3, 3], &[2, 2], &[1, 1], &[1, 1], false);

        let mut outputs = Vec::with_capacity(return_idx.len());
        for (index, stage) in stages.iter().enumerate() {
            xs = stage.forward_t(&xs, train);
            if return_idx.contains(&index) {
                outputs.push(xs.shallow_clone());
            }
        }
        outputs
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn block_kind(&self) -> BlockKind {
        self.block_kind
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stem(&self) -> &[ConvNorm2D] {
        &self.stem
    }

    pub fn return_idx(&self) -> &[usize] {
        &self.return_idx
    }

    pub fn out_channels(&self) -> &[usize] {
        &self.out_channels
    }

    pub fn out_strides(&self) -> &[usize] {
        &self.out_strides
    }

    /// True if no stem convolution currently receives gradients.
    pub fn is_stem_frozen(&self) -> bool {
        !self.stem.iter().any(|conv| conv.is_trainable())
    }

    /// Number of leading stages frozen when the backbone was built.
    pub fn num_frozen_stages(&self) -> usize {
        self.num_frozen_stages
    }

    pub fn set_stem_trainable(&self, trainable: bool) {
        self.stem
            .iter()
            .for_each(|conv| conv.set_trainable(trainable));
    }

    pub fn set_stage_trainable(&self, index: usize, trainable: bool) -> Result<()> {
        let stage = self.stages.get(index).ok_or_else(|| {
            format_err!(
                "stage index {} is out of range, the backbone has {} stages",
                index,
                self.stages.len()
            )
        })?;
        stage.set_trainable(trainable);
        Ok(())
    }

    pub fn stage_infos(&self) -> Vec<StageInfo> {
        self.stages
            .iter()
            .enumerate()
            .map(|(index, stage)| StageInfo {
                index,
                kind: self.block_kind,
                num_blocks: stage.blocks().len(),
                out_c: stage.out_c(),
                stride: STAGE_STRIDES[index],
                returned: self.return_idx.contains(&index),
                frozen: stage.is_frozen(),
            })
            .collect()
    }
}
