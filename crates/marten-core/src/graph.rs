// Graph — the owning container for one computation
//
// The Graph owns every node of one computation: a node table indexed by
// NodeId plus a structural-identity map used to deduplicate. Registering a
// node whose (operation name, ordered operand ids, extra args) already exist
// returns the existing instance, so repeated references to "the same
// computation" resolve to one canonical node.
//
// Registration is the only mutation point. Forward evaluation (value) and
// accessor methods take &self; builder methods and differentiation take
// &mut self because they insert nodes. The borrow checker therefore enforces
// the single-writer discipline the container requires: resolution may be
// concurrent with itself, never with registration.
//
// DIFFERENTIATION is symbolic: differentiate() never computes numbers, it
// composes this node's local derivative rule with the upstream gradient by
// constructing new nodes in the same graph (chain rule = elementwise
// multiplication). Evaluating the returned nodes is a separate, ordinary
// forward pass.
//
// GRADIENT RULES (g = upstream gradient):
//
//   add(x, y):        dx = g              dy = g
//   sub(x, y):        dx = g              dy = -g
//   mul(x, y):        dx = g * y          dy = g * x
//   div(x, y):        dx = g / y          dy = -(g * x) / (y * y)
//   add/sub_scalar:   dx = g
//   mul_scalar(x, c): dx = g * c
//   div_scalar(x, c): dx = g / c
//   leaves:           no operands, nothing to propagate

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::node::{GraphId, Node, NodeId, Op};
use crate::tensor::{BinaryOp, Tensor};

/// Structural identity of a node: operation name, ordered operand ids, and
/// extra arguments. Two nodes with equal keys are the same computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Constant { dims: Vec<usize>, bits: Vec<u64> },
    Variable { name: String },
    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    Scalar { op: BinaryOp, operand: NodeId, bits: u64 },
}

impl NodeKey {
    fn of(op: &Op) -> Self {
        match op {
            Op::Constant { value } => NodeKey::Constant {
                dims: value.dims().to_vec(),
                bits: value.data().iter().map(|v| v.to_bits()).collect(),
            },
            Op::Variable { name, .. } => NodeKey::Variable { name: name.clone() },
            Op::Binary { op, lhs, rhs } => NodeKey::Binary {
                op: *op,
                lhs: *lhs,
                rhs: *rhs,
            },
            Op::Scalar {
                op,
                operand,
                scalar,
            } => NodeKey::Scalar {
                op: *op,
                operand: *operand,
                bits: scalar.to_bits(),
            },
        }
    }
}

/// Owns all nodes and edges of one computation. There is no implicit global
/// instance; every node belongs to exactly one explicitly constructed Graph.
#[derive(Debug)]
pub struct Graph {
    id: GraphId,
    nodes: Vec<Op>,
    canonical: HashMap<NodeKey, NodeId>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create an empty graph with a fresh identity.
    pub fn new() -> Self {
        Graph {
            id: GraphId::new(),
            nodes: Vec::new(),
            canonical: HashMap::new(),
        }
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn handle(&self, id: NodeId) -> Node {
        Node { graph: self.id, id }
    }

    /// Check a handle belongs to this graph and points into the node table.
    fn member(&self, node: Node) -> Result<NodeId> {
        if node.graph != self.id {
            return Err(Error::ForeignNode {
                graph: self.id.0,
                node_graph: node.graph.0,
            });
        }
        if node.id.0 >= self.nodes.len() {
            return Err(Error::UnknownNode {
                graph: self.id.0,
                id: node.id.0,
            });
        }
        Ok(node.id)
    }

    // Registration and resolution

    /// Register a node, returning the canonical instance.
    ///
    /// If a structurally identical node already exists, the existing handle
    /// is returned and nothing is inserted. Every declared operand must
    /// already be registered in this graph; since ids are assigned in
    /// insertion order, edges always point at earlier nodes and no cycle can
    /// be formed.
    pub fn register(&mut self, op: Op) -> Result<Node> {
        for operand in op.operands() {
            if operand.0 >= self.nodes.len() {
                return Err(Error::UnknownNode {
                    graph: self.id.0,
                    id: operand.0,
                });
            }
        }
        if let Op::Scalar {
            op: BinaryOp::Div,
            scalar,
            ..
        } = &op
        {
            if *scalar == 0.0 {
                return Err(Error::ZeroDivisor { op: "div_scalar" });
            }
        }
        // A variable's identity is its name, but its bound value is part of
        // the configuration: re-registering a name with the same value
        // resolves to the existing leaf, a conflicting value fails fast
        // instead of silently keeping the stale binding.
        if let Op::Variable { name, value } = &op {
            let key = NodeKey::Variable { name: name.clone() };
            if let Some(&existing) = self.canonical.get(&key) {
                return match &self.nodes[existing.0] {
                    Op::Variable { value: bound, .. } if bound == value => {
                        Ok(self.handle(existing))
                    }
                    _ => Err(Error::VariableRebound { name: name.clone() }),
                };
            }
        }
        let key = NodeKey::of(&op);
        if let Some(&existing) = self.canonical.get(&key) {
            return Ok(self.handle(existing));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(op);
        self.canonical.insert(key, id);
        Ok(self.handle(id))
    }

    /// Re-fetch the canonical instance for a node handle.
    ///
    /// Accessors go through this so that deduplication is visible to handles
    /// held from before a structurally identical node was registered.
    pub fn resolve(&self, node: Node) -> Result<Node> {
        let id = self.member(node)?;
        let key = NodeKey::of(&self.nodes[id.0]);
        let canon = self.canonical.get(&key).copied().unwrap_or(id);
        Ok(self.handle(canon))
    }

    /// The operation payload of a node.
    pub fn op(&self, node: Node) -> Result<&Op> {
        let id = self.member(node)?;
        Ok(&self.nodes[id.0])
    }

    /// Left operand of a binary node (or the operand of a scalar node),
    /// re-resolved to its canonical instance.
    pub fn left(&self, node: Node) -> Result<Node> {
        let id = self.member(node)?;
        match &self.nodes[id.0] {
            Op::Binary { lhs, .. } => self.resolve(self.handle(*lhs)),
            Op::Scalar { operand, .. } => self.resolve(self.handle(*operand)),
            other => Err(Error::Unsupported(format!(
                "left operand of leaf node '{}'",
                other.name()
            ))),
        }
    }

    /// Right operand of a binary node, re-resolved to its canonical instance.
    pub fn right(&self, node: Node) -> Result<Node> {
        let id = self.member(node)?;
        match &self.nodes[id.0] {
            Op::Binary { rhs, .. } => self.resolve(self.handle(*rhs)),
            other => Err(Error::Unsupported(format!(
                "right operand of node '{}'",
                other.name()
            ))),
        }
    }

    // Builder API

    /// Register a constant leaf.
    pub fn constant(&mut self, value: Tensor) -> Result<Node> {
        self.register(Op::Constant { value })
    }

    /// Register a named variable leaf bound to a tensor value.
    pub fn var(&mut self, name: impl Into<String>, value: Tensor) -> Result<Node> {
        self.register(Op::Variable {
            name: name.into(),
            value,
        })
    }

    fn binary(&mut self, op: BinaryOp, x: Node, y: Node) -> Result<Node> {
        let lhs = self.member(x)?;
        let rhs = self.member(y)?;
        self.register(Op::Binary { op, lhs, rhs })
    }

    /// Elementwise x + y.
    pub fn add(&mut self, x: Node, y: Node) -> Result<Node> {
        self.binary(BinaryOp::Add, x, y)
    }

    /// Elementwise x - y.
    pub fn sub(&mut self, x: Node, y: Node) -> Result<Node> {
        self.binary(BinaryOp::Sub, x, y)
    }

    /// Elementwise x * y.
    pub fn mul(&mut self, x: Node, y: Node) -> Result<Node> {
        self.binary(BinaryOp::Mul, x, y)
    }

    /// Elementwise x / y (x is the dividend, y the divisor).
    pub fn div(&mut self, x: Node, y: Node) -> Result<Node> {
        self.binary(BinaryOp::Div, x, y)
    }

    fn scalar(&mut self, op: BinaryOp, x: Node, scalar: f64) -> Result<Node> {
        let operand = self.member(x)?;
        self.register(Op::Scalar {
            op,
            operand,
            scalar,
        })
    }

    /// Elementwise x + c.
    pub fn add_scalar(&mut self, x: Node, c: f64) -> Result<Node> {
        self.scalar(BinaryOp::Add, x, c)
    }

    /// Elementwise x - c.
    pub fn sub_scalar(&mut self, x: Node, c: f64) -> Result<Node> {
        self.scalar(BinaryOp::Sub, x, c)
    }

    /// Elementwise x * c.
    pub fn mul_scalar(&mut self, x: Node, c: f64) -> Result<Node> {
        self.scalar(BinaryOp::Mul, x, c)
    }

    /// Elementwise x / c. A literal zero divisor is rejected here, at
    /// construction time, not deferred to evaluation.
    pub fn div_scalar(&mut self, x: Node, c: f64) -> Result<Node> {
        self.scalar(BinaryOp::Div, x, c)
    }

    // Forward evaluation

    /// Force numeric evaluation of a node by recursively resolving operand
    /// values and applying the operation's forward formula. Pure in the
    /// operand values; never mutates the graph. Shared subexpressions are
    /// evaluated once per call via a call-local memo table.
    pub fn value(&self, node: Node) -> Result<Tensor> {
        let id = self.member(node)?;
        let mut memo = HashMap::new();
        self.eval(id, &mut memo)
    }

    fn eval(&self, id: NodeId, memo: &mut HashMap<NodeId, Tensor>) -> Result<Tensor> {
        if let Some(t) = memo.get(&id) {
            return Ok(t.clone());
        }
        let value = match &self.nodes[id.0] {
            Op::Constant { value } => value.clone(),
            Op::Variable { value, .. } => value.clone(),
            Op::Binary { op, lhs, rhs } => {
                let op = *op;
                let (lhs, rhs) = (*lhs, *rhs);
                let l = self.eval(lhs, memo)?;
                let r = self.eval(rhs, memo)?;
                l.binary(&r, op)?
            }
            Op::Scalar {
                op,
                operand,
                scalar,
            } => {
                let (op, operand, scalar) = (*op, *operand, *scalar);
                self.eval(operand, memo)?.binary_scalar(op, scalar)
            }
        };
        memo.insert(id, value.clone());
        Ok(value)
    }

    // Symbolic differentiation

    /// Apply this node's local derivative rule, composed with the upstream
    /// gradient via the chain rule, returning one symbolic gradient node per
    /// operand. One upstream gradient node is expected per output (one).
    ///
    /// No numbers are computed here — the result is new nodes registered in
    /// this graph, evaluated like any other node. Leaves have no operands
    /// and return an empty list.
    pub fn differentiate(&mut self, node: Node, upstream: &[Node]) -> Result<Vec<Node>> {
        let id = self.member(node)?;
        let g = *upstream.first().ok_or(Error::MissingOperand {
            op: "differentiate",
        })?;
        let g = self.resolve(g)?;
        let op = self.nodes[id.0].clone();
        match op {
            Op::Constant { .. } | Op::Variable { .. } => Ok(vec![]),
            Op::Binary { op, lhs, rhs } => {
                let x = self.handle(lhs);
                let y = self.handle(rhs);
                match op {
                    BinaryOp::Add => Ok(vec![g, g]),
                    BinaryOp::Sub => {
                        let dy = self.mul_scalar(g, -1.0)?;
                        Ok(vec![g, dy])
                    }
                    BinaryOp::Mul => {
                        let dx = self.mul(g, y)?;
                        let dy = self.mul(g, x)?;
                        Ok(vec![dx, dy])
                    }
                    BinaryOp::Div => {
                        // dx = g / y; dy = -(g * x) / (y * y)
                        let dx = self.div(g, y)?;
                        let gx = self.mul(g, x)?;
                        let yy = self.mul(y, y)?;
                        let quot = self.div(gx, yy)?;
                        let dy = self.mul_scalar(quot, -1.0)?;
                        Ok(vec![dx, dy])
                    }
                }
            }
            Op::Scalar { op, scalar, .. } => match op {
                BinaryOp::Add | BinaryOp::Sub => Ok(vec![g]),
                BinaryOp::Mul => Ok(vec![self.mul_scalar(g, scalar)?]),
                BinaryOp::Div => Ok(vec![self.div_scalar(g, scalar)?]),
            },
        }
    }

    /// Re-construct a structurally equivalent node from the same operands and
    /// owning graph. With deduplication this resolves to the canonical
    /// instance of the computation.
    pub fn duplicate(&mut self, node: Node) -> Result<Node> {
        let id = self.member(node)?;
        let op = self.nodes[id.0].clone();
        self.register(op)
    }

    // Formula rendering

    /// Render the node's formula as nested operation names, e.g.
    /// `div(add(x, y), constant)`.
    pub fn formula(&self, node: Node) -> Result<String> {
        let id = self.member(node)?;
        Ok(self.render(id))
    }

    fn render(&self, id: NodeId) -> String {
        match &self.nodes[id.0] {
            Op::Constant { .. } => "constant".to_string(),
            Op::Variable { name, .. } => name.clone(),
            Op::Binary { op, lhs, rhs } => {
                format!("{}({}, {})", op.name(), self.render(*lhs), self.render(*rhs))
            }
            Op::Scalar {
                op,
                operand,
                scalar,
            } => format!("{}({}, {})", op.scalar_name(), self.render(*operand), scalar),
        }
    }
}
