use crate::common::*;

#[derive(Debug, Clone)]
pub struct FrozenBatchNorm2DInit {
    pub eps: R64,
}

/// Batch normalization whose statistics and affine parameters are fixed buffers.
///
/// The layer behaves identically in training and inference mode. Its buffers
/// are only changed by loading a checkpoint.
#[derive(Debug)]
pub struct FrozenBatchNorm2D {
    weight: Tensor,
    bias: Tensor,
    running_mean: Tensor,
    running_var: Tensor,
    num_features: i64,
    eps: f64,
}

impl Default for FrozenBatchNorm2DInit {
    fn default() -> Self {
        Self { eps: r64(1e-5) }
    }
}

impl FrozenBatchNorm2DInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>, num_features: i64) -> FrozenBatchNorm2D {
        let path = path.borrow();
        let Self { eps } = self;

        FrozenBatchNorm2D {
            weight: path.ones_no_train("weight", &[num_features]),
            bias: path.zeros_no_train("bias", &[num_features]),
            running_mean: path.zeros_no_train("running_mean", &[num_features]),
            running_var: path.ones_no_train("running_var", &[num_features]),
            num_features,
            eps: eps.raw(),
        }
    }
}

impl nn::Module for FrozenBatchNorm2D {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let Self {
            ref weight,
            ref bias,
            ref running_mean,
            ref running_var,
            eps,
            ..
        } = *self;

        // reshape once so the affine form broadcasts over [N, C, H, W]
        let w = weight.reshape(&[1, -1, 1, 1]);
        let b = bias.reshape(&[1, -1, 1, 1]);
        let rv = running_var.reshape(&[1, -1, 1, 1]);
        let rm = running_mean.reshape(&[1, -1, 1, 1]);

        let scale = w * (rv + eps).rsqrt();
        let shift = b - rm * &scale;
        xs * scale + shift
    }
}

impl FrozenBatchNorm2D {
    pub fn num_features(&self) -> i64 {
        self.num_features
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn running_mean(&self) -> &Tensor {
        &self.running_mean
    }

    pub fn running_var(&self) -> &Tensor {
        &self.running_var
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }
}
