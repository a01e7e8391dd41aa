use crate::{
    common::*,
    norm::{Norm2D, NormInit},
};

/// Convolution followed by an optional normalization and an activation.
#[derive(Debug, Clone)]
pub struct ConvNorm2DInit {
    pub in_c: usize,
    pub out_c: usize,
    pub k: usize,
    pub s: usize,
    pub p: usize,
    pub bias: bool,
    pub activation: Activation,
    pub norm: Option<NormInit>,
}

impl ConvNorm2DInit {
    pub fn new(in_c: usize, out_c: usize, k: usize) -> Self {
        Self {
            in_c,
            out_c,
            k,
            s: 1,
            p: k.saturating_sub(1) / 2,
            bias: false,
            activation: Activation::Relu,
            norm: Some(Default::default()),
        }
    }

    pub fn build<'p, P>(self, path: P) -> ConvNorm2D
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            out_c,
            k,
            s,
            p,
            bias,
            activation,
            norm,
        } = self;

        let conv = nn::conv2d(
            path / "conv",
            in_c as i64,
            out_c as i64,
            k as i64,
            nn::ConvConfig {
                stride: s as i64,
                padding: p as i64,
                bias,
                ..Default::default()
            },
        );
        let norm = norm.map(|init| init.build(path / "norm", out_c as i64));

        ConvNorm2D {
            conv,
            norm,
            activation,
            out_c,
            stride: s,
        }
    }
}

#[derive(Debug)]
pub struct ConvNorm2D {
    conv: nn::Conv2D,
    norm: Option<Norm2D>,
    activation: Activation,
    out_c: usize,
    stride: usize,
}

impl nn::ModuleT for ConvNorm2D {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let Self {
            ref conv,
            ref norm,
            activation,
            ..
        } = *self;

        let xs = xs.apply(conv);
        let xs = match norm {
            Some(norm) => norm.forward_t(&xs, train),
            None => xs,
        };
        xs.activation(activation)
    }
}

impl ConvNorm2D {
    pub fn set_trainable(&self, trainable: bool) {
        let nn::Conv2D { ws, bs, .. } = &self.conv;
        let _ = ws.set_requires_grad(trainable);
        if let Some(bs) = bs {
            let _ = bs.set_requires_grad(trainable);
        }
        if let Some(norm) = &self.norm {
            norm.set_trainable(trainable);
        }
    }

    /// True if the convolution weight receives gradients.
    pub fn is_trainable(&self) -> bool {
        self.conv.ws.requires_grad()
    }

    pub fn norm(&self) -> Option<&Norm2D> {
        self.norm.as_ref()
    }

    pub fn weight(&self) -> &Tensor {
        &self.conv.ws
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn out_c(&self) -> usize {
        self.out_c
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norm::NormKind;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn conv_norm_2d_shape_test() {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let layer = ConvNorm2DInit {
            s: 2,
            ..ConvNorm2DInit::new(3, 16, 3)
        }
        .build(&root / "conv1_1");

        let input = Tensor::randn(&[2, 3, 32, 32], FLOAT_CPU);
        let output = layer.forward_t(&input, true);
        assert_eq!(output.size(), vec![2, 16, 16, 16]);

        // the default activation is ReLU
        assert!(f64::from(output.min()) >= 0.0);

        let mut names: Vec<_> = vs.variables().into_keys().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "conv1_1.conv.weight",
                "conv1_1.norm.bias",
                "conv1_1.norm.running_mean",
                "conv1_1.norm.running_var",
                "conv1_1.norm.weight",
            ]
        );
    }

    #[test]
    fn conv_norm_2d_linear_frozen_test() {
        let vs = nn::VarStore::new(Device::Cpu);

        let layer = ConvNorm2DInit {
            activation: Activation::Linear,
            norm: Some(NormInit::new(NormKind::FrozenBatchNorm)),
            ..ConvNorm2DInit::new(4, 8, 1)
        }
        .build(&vs.root() / "short");

        let input = Tensor::randn(&[1, 4, 7, 7], FLOAT_CPU);
        let output = layer.forward_t(&input, false);
        assert_eq!(output.size(), vec![1, 8, 7, 7]);
        assert!(f64::from(output.min()) < 0.0);

        assert_eq!(vs.trainable_variables().len(), 1);
        assert!(layer.is_trainable());
        layer.set_trainable(false);
        assert!(!layer.weight().requires_grad());
        assert!(!layer.is_trainable());
    }
}
