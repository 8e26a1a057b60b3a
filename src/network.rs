use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::matmul::{Backend, Naive};
use crate::{Activation, Error, Init, Layer, Matrix, Result};

/// A fully-connected feedforward network.
///
/// Layers are ordered from input to output; the last one is the single output layer.
/// Each layer's weight rows match the previous layer's width (or the input width for
/// the first layer).
#[derive(Debug, Clone)]
pub struct Network<B: Backend = Naive> {
    layers: Vec<Layer>,
    neurons_per_layer: usize,
    backend: B,
}

impl Network<Naive> {
    /// Build `hidden_layers + 2` sigmoid layers with Kaiming-initialized weights:
    ///
    /// - input-facing: `input_width -> neurons_per_layer`
    /// - `hidden_layers` x hidden: `neurons_per_layer -> neurons_per_layer`
    /// - output: `neurons_per_layer -> 1`
    ///
    /// Weights are sampled from OS entropy; see [`Network::new_with_seed`] for a
    /// reproducible network.
    pub fn new(neurons_per_layer: usize, hidden_layers: usize, input_width: usize) -> Result<Self> {
        let mut rng = StdRng::from_entropy();
        Self::new_with_rng(neurons_per_layer, hidden_layers, input_width, &mut rng)
    }

    pub fn new_with_seed(
        neurons_per_layer: usize,
        hidden_layers: usize,
        input_width: usize,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(neurons_per_layer, hidden_layers, input_width, &mut rng)
    }

    pub fn new_with_rng<R: Rng + ?Sized>(
        neurons_per_layer: usize,
        hidden_layers: usize,
        input_width: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Self::with_backend(neurons_per_layer, hidden_layers, input_width, Naive, rng)
    }

    /// Build a network from explicit layers (e.g. hand-picked weights).
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        Self::from_layers_with_backend(layers, Naive)
    }
}

impl<B: Backend> Network<B> {
    /// Same architecture as [`Network::new`], computed with `backend`.
    pub fn with_backend<R: Rng + ?Sized>(
        neurons_per_layer: usize,
        hidden_layers: usize,
        input_width: usize,
        backend: B,
        rng: &mut R,
    ) -> Result<Self> {
        if neurons_per_layer == 0 {
            return Err(Error::InvalidConfig(
                "neurons_per_layer must be > 0".to_owned(),
            ));
        }
        if input_width == 0 {
            return Err(Error::InvalidConfig("input_width must be > 0".to_owned()));
        }

        let init = Init::default();
        let activation = Activation::default();

        let mut layers = Vec::with_capacity(hidden_layers + 2);
        layers.push(Layer::new(
            init.weights(input_width, neurons_per_layer, rng)?,
            activation,
            false,
        )?);
        for _ in 0..hidden_layers {
            layers.push(Layer::new(
                init.weights(neurons_per_layer, neurons_per_layer, rng)?,
                activation,
                false,
            )?);
        }
        layers.push(Layer::new(
            init.weights(neurons_per_layer, 1, rng)?,
            activation,
            true,
        )?);

        Self::from_layers_with_backend(layers, backend)
    }

    /// Build a network from explicit layers, validating the wiring:
    /// - at least one layer
    /// - the last layer, and only the last, is the output layer
    /// - `layers[i].out_dim() == layers[i + 1].in_dim()`
    pub fn from_layers_with_backend(layers: Vec<Layer>, backend: B) -> Result<Self> {
        let Some(last) = layers.last() else {
            return Err(Error::InvalidConfig(
                "network must have at least one layer".to_owned(),
            ));
        };
        if !last.is_output_layer() {
            return Err(Error::InvalidConfig(
                "last layer must be the output layer".to_owned(),
            ));
        }
        if let Some(idx) = layers[..layers.len() - 1]
            .iter()
            .position(Layer::is_output_layer)
        {
            return Err(Error::InvalidConfig(format!(
                "layer {idx} is marked as output but is not the last layer"
            )));
        }
        for (idx, pair) in layers.windows(2).enumerate() {
            if pair[0].out_dim() != pair[1].in_dim() {
                return Err(Error::InvalidConfig(format!(
                    "layer {idx} has {} outputs but layer {} expects {} inputs",
                    pair[0].out_dim(),
                    idx + 1,
                    pair[1].in_dim()
                )));
            }
        }

        let neurons_per_layer = layers[0].out_dim();
        log::debug!(
            "built network with layer shapes {:?}",
            layers
                .iter()
                .map(|l| (l.in_dim(), l.out_dim()))
                .collect::<Vec<_>>()
        );

        Ok(Self {
            layers,
            neurons_per_layer,
            backend,
        })
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn neurons_per_layer(&self) -> usize {
        self.neurons_per_layer
    }

    #[inline]
    pub fn input_width(&self) -> usize {
        self.layers[0].in_dim()
    }

    #[inline]
    pub fn output_width(&self) -> usize {
        self.output_layer().out_dim()
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Run a `1 x input_width` row through every layer and return the output row.
    ///
    /// Only the per-layer caches change; weights and biases are untouched.
    pub fn predict(&mut self, input: &Matrix) -> Result<Matrix> {
        if input.dims() != (1, self.input_width()) {
            return Err(Error::InvalidData(format!(
                "input must be 1x{}, got {}x{}",
                self.input_width(),
                input.rows(),
                input.cols()
            )));
        }
        self.forward(input)?;
        Ok(self.output_layer().activations().clone())
    }

    /// Forward pass over all layers, threading each layer's activations into the next.
    pub(crate) fn forward(&mut self, input: &Matrix) -> Result<()> {
        for idx in 0..self.layers.len() {
            let (left, right) = self.layers.split_at_mut(idx);
            let layer_input = match left.last() {
                Some(prev) => prev.activations(),
                None => input,
            };
            right[0].forward(layer_input, &self.backend)?;
        }
        Ok(())
    }

    /// Backward pass from the output layer inwards.
    ///
    /// Runs to completion before any weights change, so every hidden layer sees its
    /// right neighbor's fresh delta together with that neighbor's pre-update weights.
    pub(crate) fn backward(&mut self, target: &Matrix) -> Result<()> {
        for idx in (0..self.layers.len()).rev() {
            let (left, right) = self.layers.split_at_mut(idx + 1);
            left[idx].backward(target, right.first(), &self.backend)?;
        }
        Ok(())
    }

    /// Gradient descent step over all layers, input to output.
    ///
    /// Each layer's left activations are the ones cached by the forward pass for this
    /// sample (the raw input for the first layer).
    pub(crate) fn update_weights(&mut self, input: &Matrix, learning_rate: f64) -> Result<()> {
        for idx in 0..self.layers.len() {
            let (left, right) = self.layers.split_at_mut(idx);
            let left_activations = match left.last() {
                Some(prev) => prev.activations(),
                None => input,
            };
            right[0].update_weights(learning_rate, left_activations, &self.backend)?;
        }
        Ok(())
    }

    /// All weight matrices side by side, shorter ones padded with zero rows.
    pub fn weights_matrix(&self) -> Result<Matrix> {
        let rows = self
            .layers
            .iter()
            .map(|l| l.weights().rows())
            .max()
            .unwrap_or(1);

        let mut layers = self.layers.iter();
        let first = layers
            .next()
            .ok_or_else(|| Error::InvalidConfig("network has no layers".to_owned()))?;
        layers.try_fold(first.weights().pad_rows(rows), |acc, layer| {
            acc.hcat(&layer.weights().pad_rows(rows))
        })
    }

    /// Print [`Network::weights_matrix`] to stdout.
    pub fn print(&self) {
        print!("{self}");
    }
}

impl<B: Backend> fmt::Display for Network<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.weights_matrix() {
            Ok(m) => write!(f, "{m}"),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[f64]) -> Matrix {
        Matrix::row_vector(values.to_vec()).unwrap()
    }

    fn loss_for(net: &mut Network, input: &Matrix, target: f64) -> f64 {
        let y = net.predict(input).unwrap().get(0, 0);
        0.5 * (y - target) * (y - target)
    }

    fn assert_close(analytic: f64, numeric: f64, abs_tol: f64, rel_tol: f64) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    #[test]
    fn constructor_builds_hidden_plus_two_layers() {
        let net = Network::new_with_seed(3, 2, 4, 0).unwrap();
        assert_eq!(net.num_layers(), 4);
        assert_eq!(net.neurons_per_layer(), 3);
        assert_eq!(net.input_width(), 4);
        assert_eq!(net.output_width(), 1);

        let shapes: Vec<_> = net.layers().iter().map(|l| l.weights().dims()).collect();
        assert_eq!(shapes, vec![(4, 3), (3, 3), (3, 3), (3, 1)]);

        let outputs: Vec<_> = net.layers().iter().map(Layer::is_output_layer).collect();
        assert_eq!(outputs, vec![false, false, false, true]);
        assert!(net.layers().iter().all(|l| l.bias().as_slice().iter().all(|&b| b == 0.0)));
    }

    #[test]
    fn zero_hidden_layers_is_valid() {
        let net = Network::new_with_seed(2, 0, 2, 0).unwrap();
        assert_eq!(net.num_layers(), 2);
    }

    #[test]
    fn invalid_architecture_is_rejected() {
        assert!(matches!(
            Network::new_with_seed(0, 1, 2, 0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Network::new_with_seed(2, 1, 0, 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn from_layers_validates_wiring() {
        let hidden = || Layer::new(Matrix::zeros(2, 3), Activation::Sigmoid, false).unwrap();
        let output = |inputs| Layer::new(Matrix::zeros(inputs, 1), Activation::Sigmoid, true).unwrap();

        assert!(Network::from_layers(vec![hidden(), output(3)]).is_ok());
        assert!(Network::from_layers(vec![]).is_err());
        assert!(Network::from_layers(vec![hidden(), output(2)]).is_err());
        assert!(Network::from_layers(vec![output(3), hidden()]).is_err());
        assert!(Network::from_layers(vec![output(2), output(1)]).is_err());
    }

    #[test]
    fn predict_shapes_propagate_to_single_output() {
        for (neurons, hidden, inputs) in [(1, 0, 1), (2, 1, 2), (5, 3, 7)] {
            let mut net = Network::new_with_seed(neurons, hidden, inputs, 42).unwrap();
            let out = net.predict(&Matrix::zeros(1, inputs)).unwrap();
            assert_eq!(out.dims(), (1, 1));
            for layer in net.layers() {
                assert_eq!(layer.activations().dims(), (1, layer.weights().cols()));
            }
        }
    }

    #[test]
    fn predict_rejects_wrong_input_shape() {
        let mut net = Network::new_with_seed(2, 1, 2, 0).unwrap();
        assert!(net.predict(&row(&[1.0, 2.0, 3.0])).is_err());
        assert!(net.predict(&Matrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn predict_single_identity_neuron_is_w_times_x() {
        let w = 1.5;
        let layer = Layer::new(Matrix::new(1, 1, vec![w]).unwrap(), Activation::Identity, true)
            .unwrap();
        let mut net = Network::from_layers(vec![layer]).unwrap();
        let out = net.predict(&row(&[2.0])).unwrap();
        assert_eq!(out.as_slice(), &[w * 2.0]);
    }

    #[test]
    fn repeated_predict_is_deterministic_and_leaves_weights_alone() {
        let mut net = Network::new_with_seed(4, 2, 3, 9).unwrap();
        let before: Vec<Matrix> = net.layers().iter().map(|l| l.weights().clone()).collect();
        let input = row(&[0.1, -0.4, 0.9]);

        let a = net.predict(&input).unwrap();
        let b = net.predict(&input).unwrap();
        assert_eq!(a, b);

        let after: Vec<Matrix> = net.layers().iter().map(|l| l.weights().clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn seeded_init_is_deterministic() {
        let mut a = Network::new_with_seed(3, 1, 2, 123).unwrap();
        let mut b = Network::new_with_seed(3, 1, 2, 123).unwrap();
        let input = row(&[0.3, -0.7]);
        assert_eq!(a.predict(&input).unwrap(), b.predict(&input).unwrap());
    }

    #[test]
    fn deltas_match_numeric_gradients() {
        // For L = 0.5 * (y - t)^2, dL/dW = left^T · delta and dL/db = delta.
        let mut net = Network::new_with_seed(3, 1, 2, 0).unwrap();
        let input = row(&[0.3, -0.7]);
        let target = 0.2;

        net.forward(&input).unwrap();
        net.backward(&row(&[target])).unwrap();

        let mut expected = Vec::new();
        for idx in 0..net.num_layers() {
            let left = if idx == 0 {
                input.clone()
            } else {
                net.layers[idx - 1].activations().clone()
            };
            let grad = left.transpose().matmul(net.layers[idx].delta()).unwrap();
            expected.push(grad);
        }

        let eps = 1e-6;
        for (idx, grad) in expected.iter().enumerate() {
            let (rows, cols) = grad.dims();
            for r in 0..rows {
                for c in 0..cols {
                    let orig = net.layers[idx].weights().get(r, c);
                    let set = |net: &mut Network, v: f64| {
                        let w = net.layers[idx].weights_mut();
                        *w = w.map(|i, j, old| if (i, j) == (r, c) { v } else { old });
                    };

                    set(&mut net, orig + eps);
                    let plus = loss_for(&mut net, &input, target);
                    set(&mut net, orig - eps);
                    let minus = loss_for(&mut net, &input, target);
                    set(&mut net, orig);

                    let numeric = (plus - minus) / (2.0 * eps);
                    assert_close(grad.get(r, c), numeric, 1e-7, 1e-5);
                }
            }
        }
    }

    #[test]
    fn weights_matrix_concatenates_all_layers() {
        let net = Network::new_with_seed(2, 1, 3, 0).unwrap();
        let m = net.weights_matrix().unwrap();
        // 3x2 | 2x2 (padded to 3 rows) | 2x1 (padded to 3 rows)
        assert_eq!(m.dims(), (3, 5));
        assert_eq!(m.get(2, 2), 0.0);
        assert_eq!(m.get(2, 4), 0.0);
        assert_eq!(m.get(0, 0), net.layers()[0].weights().get(0, 0));
        assert_eq!(m.get(1, 4), net.layers()[2].weights().get(1, 0));

        assert_eq!(net.to_string().lines().count(), 3);
    }
}
