// Node — Differentiable-function nodes of the computation graph
//
// Every vertex of a Graph is one operation plus its operands. The payload is
// a closed tagged enum (Op), so forward formulas, differentiation rules and
// re-instantiation all dispatch by plain match instead of any dynamic
// machinery. Operand references are plain indices into the owning graph's
// node table; the public handle (Node) pairs that index with the graph's
// identity so a handle from one graph can never be confused for a node of
// another.
//
// Example: z = (x + y) / c
//   x, y: Op::Variable — leaves holding their tensor value
//   s:    Op::Binary { op: Add, lhs: x, rhs: y }
//   z:    Op::Scalar { op: Div, operand: s, scalar: c }
//
// Operand order is part of operation semantics (dividend vs divisor), so
// Binary keeps lhs/rhs explicitly ordered and the graph's edge information
// is exactly the operand lists returned by Op::operands().

use std::sync::atomic::{AtomicU64, Ordering};

use crate::tensor::{BinaryOp, Tensor};

/// Unique identifier for one Graph instance (global atomic counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(pub(crate) u64);

impl GraphId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        GraphId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of a node within its graph's node table.
///
/// Ids are assigned in insertion order, so an operand id is always smaller
/// than the id of the node that references it. That makes the node table a
/// DAG by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Public, non-owning handle to a node: the owning graph's identity plus the
/// node's index. All accessors re-enter the graph through this handle, so a
/// handle never outlives or mutates the graph it points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    pub(crate) graph: GraphId,
    pub(crate) id: NodeId,
}

impl Node {
    /// The node's index within its owning graph.
    pub fn index(&self) -> usize {
        self.id.0
    }
}

/// Operation payload of one node. Extra arguments are strongly typed per
/// variant; scalars live outside the graph (they are not nodes).
#[derive(Debug, Clone)]
pub enum Op {
    /// Leaf holding a fixed tensor value.
    Constant { value: Tensor },

    /// Named leaf holding a bound tensor value.
    Variable { name: String, value: Tensor },

    /// Two-tensor elementwise operation with ordered operands.
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },

    /// Tensor-vs-scalar elementwise operation.
    Scalar {
        op: BinaryOp,
        operand: NodeId,
        scalar: f64,
    },
}

impl Op {
    /// Stable operation name, part of the node's structural identity.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Constant { .. } => "constant",
            Op::Variable { .. } => "variable",
            Op::Binary { op, .. } => op.name(),
            Op::Scalar { op, .. } => op.scalar_name(),
        }
    }

    /// Ordered operand list (0, 1, or 2 node references).
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            Op::Constant { .. } | Op::Variable { .. } => vec![],
            Op::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Op::Scalar { operand, .. } => vec![*operand],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_names() {
        let c = Op::Constant {
            value: Tensor::zeros([1]),
        };
        assert_eq!(c.name(), "constant");
        let b = Op::Binary {
            op: BinaryOp::Div,
            lhs: NodeId(0),
            rhs: NodeId(1),
        };
        assert_eq!(b.name(), "div");
        let s = Op::Scalar {
            op: BinaryOp::Mul,
            operand: NodeId(0),
            scalar: 2.0,
        };
        assert_eq!(s.name(), "mul_scalar");
    }

    #[test]
    fn test_operand_order_preserved() {
        let b = Op::Binary {
            op: BinaryOp::Div,
            lhs: NodeId(3),
            rhs: NodeId(1),
        };
        // Dividend before divisor: order is semantics, not presentation.
        assert_eq!(b.operands(), vec![NodeId(3), NodeId(1)]);
    }

    #[test]
    fn test_graph_ids_unique() {
        assert_ne!(GraphId::new(), GraphId::new());
    }
}
