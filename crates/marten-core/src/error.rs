use crate::shape::Shape;

/// All errors that can occur within Marten.
///
/// This enum captures every failure mode of the graph engine and the layers
/// built on it: construction-time configuration errors (foreign-graph
/// operands, zero divisors, impossible pooling geometry) and call-time
/// rejected inputs (wrong rank or shape). Using a single error type across
/// the workspace simplifies error propagation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required operand was not supplied (e.g., an empty upstream-gradient
    /// list passed to differentiation).
    #[error("missing operand for '{op}': a required operand was not supplied")]
    MissingOperand { op: &'static str },

    /// A node handle from one graph was passed into an operation on another.
    #[error("foreign node: handle belongs to graph {node_graph}, operation targets graph {graph}")]
    ForeignNode { graph: u64, node_graph: u64 },

    /// A node id that is not present in the graph's node table.
    #[error("unknown node id {id} in graph {graph}")]
    UnknownNode { graph: u64, id: usize },

    /// Scalar division by a literal zero, rejected at construction time.
    #[error("scalar division by zero in '{op}'")]
    ZeroDivisor { op: &'static str },

    /// A variable name re-registered with a different bound value.
    #[error("variable '{name}' is already registered with a different value")]
    VariableRebound { name: String },

    /// Kernel or stride of zero on some spatial axis.
    #[error("invalid window on axis {axis}: kernel {kernel} and stride {stride} must be positive")]
    NonPositiveWindow {
        axis: usize,
        kernel: usize,
        stride: usize,
    },

    /// Effective kernel extent exceeds the padded input on some axis.
    #[error("invalid window on axis {axis}: effective kernel {kernel} exceeds padded input {padded}")]
    KernelTooLarge {
        axis: usize,
        kernel: usize,
        padded: usize,
    },

    /// The resolved output size on some axis is zero.
    #[error("empty output on axis {axis}: input {input}, kernel {kernel}, stride {stride} resolve to size 0")]
    EmptyOutput {
        axis: usize,
        input: usize,
        kernel: usize,
        stride: usize,
    },

    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got rank {got} with shape {shape}")]
    RankMismatch {
        expected: usize,
        got: usize,
        shape: Shape,
    },

    /// Shape mismatch between two tensors in an elementwise operation.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Element count mismatch when creating a tensor from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Operation declared structurally but intentionally unimplemented.
    /// Fails loudly instead of returning a degenerate value.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
