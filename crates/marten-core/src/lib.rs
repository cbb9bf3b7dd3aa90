//! # marten-core
//!
//! Symbolic computation graphs with reverse-mode automatic differentiation.
//!
//! This crate provides:
//! - [`Graph`] — the owning container for one computation: node table,
//!   structural deduplication, forward evaluation, symbolic differentiation
//! - [`Node`] / [`Op`] — non-owning node handles and strongly typed
//!   operation payloads
//! - [`Tensor`] / [`Shape`] — the dense numeric value type the engine
//!   evaluates with
//! - [`conv3d`] — 3D sliding-window output-size and padding resolution,
//!   shared by any windowed operation (pooling, convolution)
//!
//! A user builds nodes through the [`Graph`] builder API; every constructor
//! registers the node and its operand edges into the graph, deduplicating
//! structurally identical computations. Forward values come from
//! [`Graph::value`]; gradients come from [`Graph::differentiate`], which
//! composes each operation's local derivative rule with an upstream gradient
//! node via the chain rule, producing new symbolic nodes in the same graph.
//!
//! ```
//! use marten_core::{Graph, Tensor};
//!
//! # fn main() -> marten_core::Result<()> {
//! let mut g = Graph::new();
//! let x = g.var("x", Tensor::full([2], 6.0))?;
//! let z = g.div_scalar(x, 3.0)?; // z = x / 3
//!
//! let upstream = g.constant(Tensor::full([2], 1.0))?;
//! let grads = g.differentiate(z, &[upstream])?;
//! assert_eq!(g.value(grads[0])?.to_vec(), vec![1.0 / 3.0; 2]);
//! # Ok(())
//! # }
//! ```

pub mod conv3d;
pub mod error;
pub mod graph;
pub mod node;
pub mod shape;
pub mod tensor;

pub use conv3d::PaddingMode;
pub use error::{Error, Result};
pub use graph::Graph;
pub use node::{Node, Op};
pub use shape::Shape;
pub use tensor::{BinaryOp, Tensor};
