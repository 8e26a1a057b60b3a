//! A small fully-connected feedforward network.
//!
//! `rust-ffnn` trains a dense network one sample at a time with plain gradient descent
//! and backpropagation. Every layer keeps the values its last passes produced
//! (activations, activation derivatives, deltas), and training drives those caches
//! through a fixed cycle per sample:
//!
//! 1. forward pass, input to output
//! 2. backward pass, output to input
//! 3. weight update, input to output
//!
//! The backward pass always completes before any weight changes, so each layer's
//! delta is computed against its right neighbor's pre-update weights.
//!
//! # Errors vs panics
//!
//! Every matrix operation checks its shape precondition and returns
//! [`Error::ShapeMismatch`] on violation; layers and networks propagate those errors
//! with `?` instead of indexing out of bounds. Construction (`Network::new`,
//! `Network::from_layers`) and training validate their arguments up front and return
//! [`Error::InvalidConfig`] / [`Error::InvalidData`].
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - [`Matrix`] is dense and row-major.
//! - A sample is a `1 x width` row; a batch is `N x width`.
//! - Layer weights have shape `(inputs, outputs)`, biases `(1, outputs)`.
//!
//! # Quick start
//!
//! ```rust
//! use rust_ffnn::{Matrix, Network};
//!
//! # fn main() -> rust_ffnn::Result<()> {
//! let inputs = Matrix::new(4, 2, vec![0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0])?;
//! let targets = Matrix::new(4, 1, vec![0.0, 0.0, 1.0, 1.0])?;
//!
//! // 2 inputs -> 2 neurons -> 1 hidden layer of 2 neurons -> 1 output.
//! let mut net = Network::new_with_seed(2, 1, 2, 0)?;
//! let report = net.train(&inputs, &targets, 0.5, 100)?;
//! assert!(report.final_loss.is_finite());
//!
//! let y = net.predict(&Matrix::row_vector(vec![1.0, 0.0])?)?;
//! assert_eq!(y.dims(), (1, 1));
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! Matrix products go through a [`Backend`]. The default [`Naive`] backend is a plain
//! triple loop; enable the `matrixmultiply` feature for `MatrixMultiply` and build the
//! network with [`Network::with_backend`].

pub mod activation;
pub mod error;
pub mod init;
pub mod layer;
pub mod matmul;
pub mod matrix;
pub mod network;
pub mod train;

pub use activation::Activation;
pub use error::{Error, Result};
pub use init::Init;
pub use layer::Layer;
#[cfg(feature = "matrixmultiply")]
pub use matmul::MatrixMultiply;
pub use matmul::{Backend, Naive};
pub use matrix::Matrix;
pub use network::Network;
pub use train::{TrainConfig, TrainReport};
