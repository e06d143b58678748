use haskle_dom::{DomError, NodeId};
use thiserror::Error;

/// Failures while rendering or patching. None of these are retried: the
/// diff is deterministic, so a host treats them as fatal for the root.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The real tree is shorter than the old virtual tree says.
    #[error("node {parent:?} has no child at {index}")]
    MissingChild { parent: NodeId, index: usize },
    /// A patch reached the patcher without a resolved node.
    #[error("patch at index {0} has no target node")]
    Unbound(usize),
    #[error("invariant violated: {0}")]
    Invariant(&'static str),
}
