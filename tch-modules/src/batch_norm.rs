use crate::common::*;

#[cfg(debug_assertions)]
static SMALL_VAR_WARN: Once = Once::new();

#[derive(Debug, Clone)]
pub struct BatchNorm2DInit {
    pub cudnn_enabled: bool,
    pub eps: R64,
    pub momentum: R64,
    pub ws_init: nn::Init,
    pub bs_init: nn::Init,
}

/// Batch normalization with trainable affine parameters and running statistics.
#[derive(Debug)]
pub struct BatchNorm2D {
    running_mean: Tensor,
    running_var: Tensor,
    ws: Tensor,
    bs: Tensor,
    cudnn_enabled: bool,
    eps: f64,
    momentum: f64,
}

impl Default for BatchNorm2DInit {
    fn default() -> Self {
        Self {
            cudnn_enabled: true,
            eps: r64(1e-5),
            momentum: r64(0.1),
            ws_init: nn::Init::Const(1.0),
            bs_init: nn::Init::Const(0.0),
        }
    }
}

impl BatchNorm2DInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>, out_dim: i64) -> BatchNorm2D {
        let path = path.borrow();
        let Self {
            cudnn_enabled,
            eps,
            momentum,
            ws_init,
            bs_init,
        } = self;

        BatchNorm2D {
            running_mean: path.zeros_no_train("running_mean", &[out_dim]),
            running_var: path.ones_no_train("running_var", &[out_dim]),
            ws: path.var("weight", &[out_dim], ws_init),
            bs: path.var("bias", &[out_dim], bs_init),
            cudnn_enabled,
            eps: eps.raw(),
            momentum: momentum.raw(),
        }
    }
}

impl nn::ModuleT for BatchNorm2D {
    fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        let Self {
            ref running_mean,
            ref running_var,
            ref ws,
            ref bs,
            momentum,
            eps,
            cudnn_enabled,
        } = *self;

        #[cfg(debug_assertions)]
        {
            if !train && bool::from(running_var.abs().le(1e-15).any()) {
                SMALL_VAR_WARN.call_once(|| {
                    warn!(
                        "running variance {} is too small",
                        f64::from(running_var.abs().min())
                    );
                });
            }
        }

        Tensor::batch_norm(
            input,
            Some(ws),
            Some(bs),
            Some(running_mean),
            Some(running_var),
            train,
            momentum,
            eps,
            cudnn_enabled,
        )
    }
}

impl BatchNorm2D {
    pub fn set_trainable(&self, trainable: bool) {
        let Self { ws, bs, .. } = self;
        let _ = ws.set_requires_grad(trainable);
        let _ = bs.set_requires_grad(trainable);
    }

    pub fn running_mean(&self) -> &Tensor {
        &self.running_mean
    }

    pub fn running_var(&self) -> &Tensor {
        &self.running_var
    }

    pub fn weight(&self) -> &Tensor {
        &self.ws
    }

    pub fn bias(&self) -> &Tensor {
        &self.bs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn batch_norm_running_stats_test() {
        const CHANNELS: i64 = 4;

        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        let norm = BatchNorm2DInit::default().build(&root / "bn", CHANNELS);

        let input = Tensor::ones(&[2, CHANNELS, 3, 3], FLOAT_CPU) * 5.0;

        // inference mode leaves the statistics untouched
        let output = norm.forward_t(&input, false);
        assert_eq!(output.size(), vec![2, CHANNELS, 3, 3]);
        assert!(f64::from(norm.running_mean().abs().max()) < 1e-9);

        // a training step moves the running mean towards the batch mean
        let output = norm.forward_t(&input, true);
        assert!(f64::from(output.abs().max()) < 1e-3);
        let mean = f64::from(norm.running_mean().mean(Kind::Float));
        assert!((mean - 0.5).abs() < 1e-5);
    }

    #[test]
    fn batch_norm_trainable_test() {
        let vs = nn::VarStore::new(Device::Cpu);
        let norm = BatchNorm2DInit::default().build(&vs.root(), 8);

        assert!(norm.weight().requires_grad());
        norm.set_trainable(false);
        assert!(!norm.weight().requires_grad());
        assert!(!norm.bias().requires_grad());
        assert!(!norm.running_var().requires_grad());

        let names: Vec<_> = vs.variables().into_keys().collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"running_mean".to_string()));
    }
}
