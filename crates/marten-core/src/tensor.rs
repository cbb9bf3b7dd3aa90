// Tensor — Dense f64 tensor values
//
// This is the numeric value type the graph engine computes with: a flat
// row-major buffer plus a Shape. The engine itself only needs same-shape
// elementwise arithmetic and scalar broadcasts; anything fancier (kernels,
// devices, parallelism) belongs to an external backend and is out of scope.
//
// The BinaryOp enum defined here is shared between the numeric kernels and
// the graph's symbolic operations, so the forward formula and the
// differentiation rule of one operation always agree on what the operation
// is.

use crate::error::{Error, Result};
use crate::shape::Shape;

/// Elementwise binary operation, shared by tensor kernels and graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Stable operation name, used for graph identity and formula rendering.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        }
    }

    /// Name of the tensor-vs-scalar variant of this operation.
    pub fn scalar_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add_scalar",
            BinaryOp::Sub => "sub_scalar",
            BinaryOp::Mul => "mul_scalar",
            BinaryOp::Div => "div_scalar",
        }
    }

    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }
}

/// Dense N-dimensional array of f64 values in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    /// Create a tensor from a flat vec and a shape.
    /// The vec length must match the shape's element count.
    pub fn from_vec(data: Vec<f64>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: data.len(),
                shape,
            });
        }
        Ok(Tensor { shape, data })
    }

    /// Tensor of zeros with the given shape.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data = vec![0.0; shape.elem_count()];
        Tensor { shape, data }
    }

    /// Tensor filled with a single value.
    pub fn full(shape: impl Into<Shape>, value: f64) -> Self {
        let shape = shape.into();
        let data = vec![value; shape.elem_count()];
        Tensor { shape, data }
    }

    /// The shape of this tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// The flat row-major storage.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Copy the flat storage out as a vec.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    // Arithmetic operations

    /// Element-wise addition: self + rhs.
    pub fn add(&self, rhs: &Self) -> Result<Self> {
        self.binary(rhs, BinaryOp::Add)
    }

    /// Element-wise subtraction: self - rhs.
    pub fn sub(&self, rhs: &Self) -> Result<Self> {
        self.binary(rhs, BinaryOp::Sub)
    }

    /// Element-wise multiplication: self * rhs.
    pub fn mul(&self, rhs: &Self) -> Result<Self> {
        self.binary(rhs, BinaryOp::Mul)
    }

    /// Element-wise division: self / rhs.
    pub fn div(&self, rhs: &Self) -> Result<Self> {
        self.binary(rhs, BinaryOp::Div)
    }

    /// Generic elementwise binary operation. Shapes must match exactly.
    pub fn binary(&self, rhs: &Self, op: BinaryOp) -> Result<Self> {
        if self.shape != rhs.shape {
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                got: rhs.shape.clone(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(a, b)| op.apply(*a, *b))
            .collect();
        Ok(Tensor {
            shape: self.shape.clone(),
            data,
        })
    }

    /// Binary operation against a scalar broadcast over every element.
    pub fn binary_scalar(&self, op: BinaryOp, scalar: f64) -> Self {
        let data = self.data.iter().map(|a| op.apply(*a, scalar)).collect();
        Tensor {
            shape: self.shape.clone(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_count_mismatch() {
        let err = Tensor::from_vec(vec![1.0, 2.0, 3.0], [2, 2]).unwrap_err();
        assert!(matches!(
            err,
            Error::ElementCountMismatch {
                expected: 4,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_elementwise_ops() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        let b = Tensor::from_vec(vec![4.0, 3.0, 2.0, 1.0], [2, 2]).unwrap();
        assert_eq!(a.add(&b).unwrap().to_vec(), vec![5.0, 5.0, 5.0, 5.0]);
        assert_eq!(a.sub(&b).unwrap().to_vec(), vec![-3.0, -1.0, 1.0, 3.0]);
        assert_eq!(a.mul(&b).unwrap().to_vec(), vec![4.0, 6.0, 6.0, 4.0]);
        assert_eq!(a.div(&b).unwrap().to_vec(), vec![0.25, 2.0 / 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let a = Tensor::zeros([2, 2]);
        let b = Tensor::zeros([4]);
        assert!(matches!(
            a.add(&b).unwrap_err(),
            Error::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_scalar_broadcast() {
        let a = Tensor::from_vec(vec![2.0, 4.0, 6.0], [3]).unwrap();
        assert_eq!(
            a.binary_scalar(BinaryOp::Div, 2.0).to_vec(),
            vec![1.0, 2.0, 3.0]
        );
        assert_eq!(
            a.binary_scalar(BinaryOp::Add, 1.0).to_vec(),
            vec![3.0, 5.0, 7.0]
        );
    }
}
