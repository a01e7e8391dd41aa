use crate::{
    block::{Block, BlockInit, BlockKind},
    common::*,
    config::Variant,
};

/// A sequence of residual blocks sharing one output resolution.
#[derive(Debug, Clone)]
pub struct StageInit {
    pub kind: BlockKind,
    pub in_c: usize,
    pub out_c: usize,
    pub count: usize,
    /// One-based stage number counted from the stem, so the first residual
    /// stage is number 2 and keeps the stem resolution.
    pub stage_num: usize,
    pub variant: Variant,
    pub activation: Activation,
    pub norm: NormInit,
}

impl StageInit {
    pub fn build<'p, P>(self, path: P) -> Stage
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self {
            kind,
            in_c,
            out_c,
            count,
            stage_num,
            variant,
            activation,
            norm,
        } = self;

        let blocks_path = path / "blocks";
        let mut block_in_c = in_c;

        let blocks: Vec<_> = (0..count)
            .map(|index| {
                let is_first = index == 0;
                let block = BlockInit {
                    kind,
                    in_c: block_in_c,
                    out_c,
                    stride: if is_first && stage_num != 2 { 2 } else { 1 },
                    shortcut: !is_first,
                    variant,
                    activation,
                    norm: norm.clone(),
                }
                .build(&blocks_path / index);

                if is_first {
                    block_in_c = out_c * kind.expansion();
                }
                block
            })
            .collect();

        Stage {
            blocks,
            out_c: out_c * kind.expansion(),
        }
    }
}

#[derive(Debug)]
pub struct Stage {
    blocks: Vec<Block>,
    out_c: usize,
}

impl nn::ModuleT for Stage {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let mut blocks = self.blocks.iter();
        let first = match blocks.next() {
            Some(block) => block.forward_t(xs, train),
            None => return xs.shallow_clone(),
        };
        blocks.fold(first, |xs, block| block.forward_t(&xs, train))
    }
}

impl Stage {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn out_c(&self) -> usize {
        self.out_c
    }

    pub fn is_frozen(&self) -> bool {
        self.blocks.iter().all(|block| block.is_frozen())
    }

    pub fn set_trainable(&self, trainable: bool) {
        self.blocks
            .iter()
            .for_each(|block| block.set_trainable(trainable));
    }
}
