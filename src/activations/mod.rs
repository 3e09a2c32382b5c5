//! # Activation Functions
//!
//! Element-wise nonlinearities applied by dense layers. The value networks use
//! a nonlinear activation on every hidden layer and `Linear` on the output
//! layer, since Q-value estimates are unbounded.
//!
//! - **Relu**: `max(0, x)`, the default for hidden layers
//! - **LeakyRelu**: ReLU with a small negative slope
//! - **Tanh**: hyperbolic tangent, outputs in (-1, 1)
//! - **Linear**: identity

pub mod functions;

pub use functions::Activation;
