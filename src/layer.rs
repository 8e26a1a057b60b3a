use crate::matmul::Backend;
use crate::{Activation, Error, Matrix, Result};

/// One fully-connected stage: `activation(x W + b)`.
///
/// Besides its parameters, a layer caches what the most recent passes computed for
/// the current sample. The caches are replaced wholesale by each pass and are never
/// shared with other layers; a neighbor reads them through `&Layer`.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Shape `(inputs, outputs)`.
    weights: Matrix,
    /// Shape `(1, outputs)`.
    bias: Matrix,
    /// Output of the last forward pass, `(1, outputs)`.
    activations: Matrix,
    /// Activation derivative at the last forward pass' pre-activation, `(1, outputs)`.
    gradient: Matrix,
    /// Error signal of the last backward pass, `(1, outputs)`.
    delta: Matrix,
    activation: Activation,
    is_output_layer: bool,
}

impl Layer {
    /// A layer with the given weights, zero bias and zeroed caches.
    pub fn new(weights: Matrix, activation: Activation, is_output_layer: bool) -> Result<Self> {
        let bias = Matrix::zeros(1, weights.cols());
        Self::from_parts(weights, bias, activation, is_output_layer)
    }

    /// A layer with explicit weights and bias.
    ///
    /// `bias` must be `1 x weights.cols()`.
    pub fn from_parts(
        weights: Matrix,
        bias: Matrix,
        activation: Activation,
        is_output_layer: bool,
    ) -> Result<Self> {
        activation.validate()?;
        if bias.dims() != (1, weights.cols()) {
            return Err(Error::InvalidShape(format!(
                "bias must be 1x{}, got {}x{}",
                weights.cols(),
                bias.rows(),
                bias.cols()
            )));
        }

        let out_dim = weights.cols();
        Ok(Self {
            weights,
            bias,
            activations: Matrix::zeros(1, out_dim),
            gradient: Matrix::zeros(1, out_dim),
            delta: Matrix::zeros(1, out_dim),
            activation,
            is_output_layer,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.weights.rows()
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.weights.cols()
    }

    #[inline]
    pub fn is_output_layer(&self) -> bool {
        self.is_output_layer
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[inline]
    pub fn bias(&self) -> &Matrix {
        &self.bias
    }

    #[inline]
    pub fn activations(&self) -> &Matrix {
        &self.activations
    }

    #[inline]
    pub fn gradient(&self) -> &Matrix {
        &self.gradient
    }

    #[inline]
    pub fn delta(&self) -> &Matrix {
        &self.delta
    }

    #[cfg(test)]
    pub(crate) fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    /// Forward pass for a single `1 x in_dim` row.
    ///
    /// Computes `z = input W + b` and overwrites the caches:
    /// - `activations = activation(z)`
    /// - `gradient = activation'(z)`
    ///
    /// Returns the new activations, which the caller feeds to the next layer.
    pub fn forward<B: Backend>(&mut self, input: &Matrix, backend: &B) -> Result<&Matrix> {
        let z = input.matmul_with(&self.weights, backend)?.add(&self.bias)?;

        let act = self.activation;
        self.activations = z.map(|_, _, v| act.apply(v));
        self.gradient = z.map(|_, _, v| act.derivative(v));
        Ok(&self.activations)
    }

    /// Backward pass: overwrite `delta` for the current sample.
    ///
    /// - Output layer: `delta = (activations - target) ⊙ gradient`; `right` is ignored.
    /// - Other layers: `delta = (right.delta · right.weightsᵀ) ⊙ gradient`, where `right`
    ///   is the next layer towards the output, whose own backward pass has already run
    ///   for this sample and whose weights have not yet been updated.
    pub fn backward<B: Backend>(
        &mut self,
        target: &Matrix,
        right: Option<&Layer>,
        backend: &B,
    ) -> Result<()> {
        let error = if self.is_output_layer {
            self.activations.sub(target)?
        } else {
            let right = right.ok_or_else(|| {
                Error::InvalidConfig("hidden layer backward pass needs its right neighbor".into())
            })?;
            right
                .delta
                .matmul_with(&right.weights.transpose(), backend)?
        };

        self.delta = error.mul_elem(&self.gradient)?;
        Ok(())
    }

    /// Gradient descent step using the cached `delta`.
    ///
    /// `left_activations` is the input this layer saw on the forward pass: the raw
    /// sample for the first layer, otherwise the previous layer's activations.
    /// - `weights -= lr * left_activationsᵀ · delta`
    /// - `bias -= lr * delta`
    pub fn update_weights<B: Backend>(
        &mut self,
        learning_rate: f64,
        left_activations: &Matrix,
        backend: &B,
    ) -> Result<()> {
        let weight_grad = left_activations
            .transpose()
            .matmul_with(&self.delta, backend)?;
        self.weights = self.weights.sub(&weight_grad.scale(learning_rate))?;
        self.bias = self.bias.sub(&self.delta.scale(learning_rate))?;
        Ok(())
    }
}
