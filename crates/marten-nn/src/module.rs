// Layer trait — The forward/backward contract every layer implements
//
// A layer exposes two entry points: activate() computes output activations
// from an input batch, and backprop() redistributes an upstream gradient
// (epsilon) back to an input-shaped gradient, paired with a record of
// gradients for the layer's own parameters.
//
// Layers without learnable parameters are first-class citizens of this
// contract: num_params() is 0, params() is None, and set_params()/update()
// are no-ops — callers must treat that as valid, not as a degenerate error.
// Operations a layer genuinely cannot support (e.g., asking a parameterless
// layer for its parameter gradient) fail loudly with Unsupported.

use std::collections::HashMap;

use marten_core::error::{Error, Result};
use marten_core::tensor::Tensor;

/// Named parameter-gradient record returned by a layer's backward pass.
///
/// Parameterless layers return an empty record by contract.
#[derive(Debug, Clone, Default)]
pub struct Gradients {
    grads: HashMap<String, Tensor>,
}

impl Gradients {
    /// Create an empty gradient record.
    pub fn new() -> Self {
        Gradients {
            grads: HashMap::new(),
        }
    }

    /// Store the gradient for a named parameter.
    pub fn insert(&mut self, name: impl Into<String>, grad: Tensor) {
        self.grads.insert(name.into(), grad);
    }

    /// Gradient for a named parameter, if present.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.grads.get(name)
    }

    /// Whether the record holds no gradients.
    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// Number of named gradients.
    pub fn len(&self) -> usize {
        self.grads.len()
    }
}

/// The forward/backward contract for a layer.
pub trait Layer {
    /// Compute output activations from an input batch.
    ///
    /// `training` toggles train-time behavior (dropout etc.); layers without
    /// any may ignore it.
    fn activate(&self, input: &Tensor, training: bool) -> Result<Tensor>;

    /// Propagate an upstream gradient (`epsilon`, shaped like this layer's
    /// output for `input`) back to an input-shaped gradient, paired with
    /// the gradients for this layer's parameters.
    fn backprop(&self, input: &Tensor, epsilon: &Tensor) -> Result<(Gradients, Tensor)>;

    /// Total number of scalar parameters in this layer.
    fn num_params(&self) -> usize {
        0
    }

    /// The layer's flattened parameters, or None for a parameterless layer.
    fn params(&self) -> Option<Tensor> {
        None
    }

    /// Replace the layer's parameters. No-op for parameterless layers.
    fn set_params(&mut self, _params: &Tensor) -> Result<()> {
        Ok(())
    }

    /// Apply a parameter update. No-op for parameterless layers.
    fn update(&mut self, _gradient: &Tensor) -> Result<()> {
        Ok(())
    }

    /// The most recent parameter gradient, for layers that keep one.
    /// Fails loudly by default rather than returning a degenerate value.
    fn gradient(&self) -> Result<Gradients> {
        Err(Error::Unsupported(
            "gradient: layer has no parameters".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradients_record() {
        let mut g = Gradients::new();
        assert!(g.is_empty());
        g.insert("w", Tensor::full([2], 0.5));
        assert_eq!(g.len(), 1);
        assert_eq!(g.get("w").unwrap().to_vec(), vec![0.5, 0.5]);
        assert!(g.get("b").is_none());
    }
}
