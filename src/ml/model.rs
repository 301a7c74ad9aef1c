use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
};

/// Smallest norm used when L2-normalising a row.
const NORM_EPS: f64 = 1e-12;

#[derive(Config, Debug)]
pub struct ClipToClapConfig {
    #[config(default = 512)]
    pub input_dim:  usize,
    #[config(default = 256)]
    pub hidden_dim: usize,
    #[config(default = 512)]
    pub output_dim: usize,
}

impl ClipToClapConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ClipToClapModel<B> {
        ClipToClapModel {
            fc1:        LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            fc2:        LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            fc3:        LinearConfig::new(self.hidden_dim, self.output_dim).init(device),
            activation: Relu::new(),
        }
    }
}

/// Three-layer perceptron from CLIP space to the CLAP unit sphere.
#[derive(Module, Debug)]
pub struct ClipToClapModel<B: Backend> {
    pub fc1:        Linear<B>,
    pub fc2:        Linear<B>,
    pub fc3:        Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> ClipToClapModel<B> {
    /// clip: [batch, input_dim] → [batch, output_dim], every row unit-norm.
    ///
    /// `_target` is accepted for call-site compatibility with the
    /// training loop and is never read.
    pub fn forward(&self, clip: Tensor<B, 2>, _target: Option<Tensor<B, 2>>) -> Tensor<B, 2> {
        let x = l2_normalize(clip);
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.activation.forward(self.fc2.forward(x));
        l2_normalize(self.fc3.forward(x))
    }
}

/// Divide every row by its Euclidean norm, clamped away from zero.
pub fn l2_normalize<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let norm = x.clone().powf_scalar(2.0).sum_dim(1).sqrt().clamp_min(NORM_EPS);
    x / norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn row_norms(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.powf_scalar(2.0).sum_dim(1).sqrt().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_output_rows_are_unit_norm() {
        let device = Default::default();
        let model  = ClipToClapConfig::new()
            .with_input_dim(8)
            .with_hidden_dim(16)
            .with_output_dim(4)
            .init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 2>::random(
            [5, 8],
            burn::tensor::Distribution::Normal(0.0, 3.0),
            &device,
        );
        let out = model.forward(input, None);
        assert_eq!(out.dims(), [5, 4]);
        for n in row_norms(out) {
            assert!((n - 1.0).abs() < 1e-5, "norm {n}");
        }
    }

    #[test]
    fn test_target_does_not_change_output() {
        let device = Default::default();
        let model  = ClipToClapConfig::new()
            .with_input_dim(3)
            .with_hidden_dim(6)
            .with_output_dim(2)
            .init::<TestBackend>(&device);

        let input  = Tensor::<TestBackend, 2>::from_floats([[0.3, -1.0, 2.0]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[5.0, 5.0]], &device);

        let a = model.forward(input.clone(), None).into_data().to_vec::<f32>().unwrap();
        let b = model.forward(input, Some(target)).into_data().to_vec::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_l2_normalize_guards_zero_rows() {
        let device = Default::default();
        let x   = Tensor::<TestBackend, 2>::from_floats([[3.0, 4.0], [0.0, 0.0]], &device);
        let out = l2_normalize(x).into_data().to_vec::<f32>().unwrap();
        assert!((out[0] - 0.6).abs() < 1e-6);
        assert!((out[1] - 0.8).abs() < 1e-6);
        assert_eq!(&out[2..], &[0.0, 0.0]);
    }

    #[test]
    fn test_default_dims() {
        let cfg = ClipToClapConfig::new();
        assert_eq!((cfg.input_dim, cfg.hidden_dim, cfg.output_dim), (512, 256, 512));
    }
}
