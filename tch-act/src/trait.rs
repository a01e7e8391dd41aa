use crate::{impls, Activation};
use tch::{nn::Module, Tensor};

pub trait TensorActivationExt {
    fn activation(&self, act: Activation) -> Tensor;

    fn leaky_relu_ext<S>(&self, negative_slope: S) -> Tensor
    where
        S: Into<Option<f64>>;

    /// Swish/SiLU activation function.
    fn silu_ext(&self) -> Tensor;
}

impl TensorActivationExt for Tensor {
    fn activation(&self, act: Activation) -> Tensor {
        act.forward(self)
    }

    fn leaky_relu_ext<S>(&self, negative_slope: S) -> Tensor
    where
        S: Into<Option<f64>>,
    {
        impls::leaky_relu_ext(self, negative_slope.into())
    }

    fn silu_ext(&self) -> Tensor {
        impls::silu(self)
    }
}
