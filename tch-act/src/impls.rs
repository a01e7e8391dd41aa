use crate::Activation;
use tch::{nn, Tensor};

impl nn::Module for Activation {
    fn forward(&self, xs: &Tensor) -> Tensor {
        use Activation::*;

        match *self {
            Linear => xs.shallow_clone(),
            Relu => xs.relu(),
            Relu6 => relu6(xs),
            LeakyRelu => leaky_relu_ext(xs, None),
            Gelu => xs.gelu(),
            Silu => silu(xs),
            HardSwish => hard_swish(xs),
            Mish => xs.mish(),
            Sigmoid => xs.sigmoid(),
            Tanh => xs.tanh(),
        }
    }
}

pub fn relu6(xs: &Tensor) -> Tensor {
    xs.clamp(0.0, 6.0)
}

pub fn silu(xs: &Tensor) -> Tensor {
    xs * xs.sigmoid()
}

pub fn hard_swish(xs: &Tensor) -> Tensor {
    xs * relu6(&(xs + 3.0)) / 6.0
}

pub fn leaky_relu_ext(xs: &Tensor, negative_slope: Option<f64>) -> Tensor {
    xs.maximum(&(xs * negative_slope.unwrap_or(0.01)))
}
