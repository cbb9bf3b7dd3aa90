//! # marten-nn
//!
//! Layer building blocks for Marten.
//!
//! Provides:
//! - [`Layer`] — the forward/backward contract (`activate` / `backprop`)
//!   with an explicit no-parameter story: `num_params() == 0` and no-op
//!   `set_params`/`update` are valid, not degenerate
//! - [`Gradients`] — named parameter-gradient record returned by `backprop`
//! - [`Subsample3d`] — 3D max/average pooling over rank-5
//!   `[N, C, D, H, W]` inputs, consuming `marten_core::conv3d` for
//!   output-size and same-mode padding resolution

pub mod module;
pub mod subsample3d;

pub use module::{Gradients, Layer};
pub use subsample3d::{PoolingType, Subsample3d};
