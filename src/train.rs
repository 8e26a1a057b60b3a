use crate::matmul::Backend;
use crate::{Error, Matrix, Network, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// Emit a `debug!` line with the epoch loss every `log_every` epochs (0 disables it).
    pub log_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 1_000,
            log_every: 1_000,
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(
                "learning_rate must be finite and > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs: usize,
    /// Mean of `0.5 * Σ (output - target)²` over the last epoch, measured on each
    /// sample's forward pass before its update.
    pub final_loss: f64,
}

impl<B: Backend> Network<B> {
    /// Train with per-sample gradient descent.
    ///
    /// `inputs` is `N x input_width` and `targets` is `N x output_width`, row-aligned.
    /// Every epoch visits the rows in order; for each row the network runs a full
    /// forward pass, a full backward pass (output to input), then a weight update
    /// (input to output).
    pub fn train(
        &mut self,
        inputs: &Matrix,
        targets: &Matrix,
        learning_rate: f64,
        epochs: usize,
    ) -> Result<TrainReport> {
        let cfg = TrainConfig::default()
            .learning_rate(learning_rate)
            .epochs(epochs);
        self.fit(inputs, targets, &cfg)
    }

    /// [`Network::train`] driven by a [`TrainConfig`].
    pub fn fit(
        &mut self,
        inputs: &Matrix,
        targets: &Matrix,
        cfg: &TrainConfig,
    ) -> Result<TrainReport> {
        cfg.validate()?;
        self.check_batch(inputs, targets)?;

        let samples = inputs.rows();
        log::info!(
            "training {} layers on {samples} samples for {} epochs (learning rate {})",
            self.num_layers(),
            cfg.epochs,
            cfg.learning_rate
        );

        // Row extraction does not depend on the epoch.
        let rows = (0..samples)
            .map(|i| Ok((inputs.row(i)?, targets.row(i)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut epoch_loss = 0.0_f64;
        for epoch in 0..cfg.epochs {
            epoch_loss = 0.0;
            for (input, target) in &rows {
                self.forward(input)?;
                epoch_loss += sample_loss(self.output(), target);

                self.backward(target)?;
                self.update_weights(input, cfg.learning_rate)?;
            }
            epoch_loss /= samples as f64;

            if cfg.log_every > 0 && (epoch + 1) % cfg.log_every == 0 {
                log::debug!("epoch {}/{}: loss = {epoch_loss:.6}", epoch + 1, cfg.epochs);
            }
        }

        log::info!("training finished: loss = {epoch_loss:.6}");
        Ok(TrainReport {
            epochs: cfg.epochs,
            final_loss: epoch_loss,
        })
    }

    /// Predict every row of `inputs`, returning an `N x output_width` matrix.
    pub fn predict_batch(&mut self, inputs: &Matrix) -> Result<Matrix> {
        let mut out: Option<Matrix> = None;
        for i in 0..inputs.rows() {
            let y = self.predict(&inputs.row(i)?)?;
            out = Some(match out {
                Some(acc) => acc.vcat(&y)?,
                None => y,
            });
        }
        out.ok_or_else(|| Error::InvalidData("inputs must not be empty".to_owned()))
    }

    /// Mean per-sample loss `0.5 * Σ (output - target)²` over a batch, without training.
    pub fn evaluate(&mut self, inputs: &Matrix, targets: &Matrix) -> Result<f64> {
        self.check_batch(inputs, targets)?;

        let mut total = 0.0_f64;
        for i in 0..inputs.rows() {
            let target = targets.row(i)?;
            self.forward(&inputs.row(i)?)?;
            total += sample_loss(self.output(), &target);
        }
        Ok(total / inputs.rows() as f64)
    }

    fn output(&self) -> &Matrix {
        self.layers()[self.num_layers() - 1].activations()
    }

    fn check_batch(&self, inputs: &Matrix, targets: &Matrix) -> Result<()> {
        if inputs.rows() != targets.rows() {
            return Err(Error::InvalidData(format!(
                "inputs/targets row count mismatch: {} vs {}",
                inputs.rows(),
                targets.rows()
            )));
        }
        if inputs.cols() != self.input_width() {
            return Err(Error::InvalidData(format!(
                "inputs have {} columns, network input width is {}",
                inputs.cols(),
                self.input_width()
            )));
        }
        if targets.cols() != self.output_width() {
            return Err(Error::InvalidData(format!(
                "targets have {} columns, network output width is {}",
                targets.cols(),
                self.output_width()
            )));
        }
        Ok(())
    }
}

#[inline]
fn sample_loss(pred: &Matrix, target: &Matrix) -> f64 {
    0.5 * pred
        .as_slice()
        .iter()
        .zip(target.as_slice())
        .map(|(p, t)| (p - t) * (p - t))
        .sum::<f64>()
}
