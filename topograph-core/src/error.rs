//! Error Taxonomy
//!
//! Nothing in this engine is globally fatal. Errors fall into two families:
//!
//! - **Protocol violations** (duplicate add, edge to a nonexistent endpoint):
//!   an upstream producer sent something inconsistent. The offending record
//!   is skipped and logged at error level; the rest of the batch continues.
//!
//! - **Stale references** (operating on a node or scope that was removed or
//!   collapsed in the meantime): expected under concurrent user and data
//!   activity. Dropped with a warning, never treated as an error.
//!
//! The worst outcome of any single bad input is a visually inconsistent but
//! structurally sound graph, recoverable by the next full data refresh.

use thiserror::Error;

use crate::layout::LayoutScope;

/// Errors produced by model operations and delta application.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A node with this id already exists (protocol violation).
    #[error("node `{0}` already exists")]
    DuplicateNode(String),

    /// An edge with this id already exists (protocol violation).
    #[error("edge `{0}` already exists")]
    DuplicateEdge(String),

    /// An edge referenced an endpoint that is not in the model.
    #[error("edge `{edge}` references missing endpoint `{endpoint}`")]
    MissingEndpoint {
        /// Id of the offending edge.
        edge: String,
        /// The endpoint id that did not resolve.
        endpoint: String,
    },

    /// The referenced node is not in the model (stale reference).
    #[error("node `{0}` does not exist")]
    UnknownNode(String),

    /// A node delta arrived for a node that is not expanded (stale race).
    #[error("node `{0}` is not expanded")]
    NotExpanded(String),

    /// A queued layout scope no longer resolves to live nodes.
    #[error("layout scope {0:?} no longer resolves")]
    ScopeVanished(LayoutScope),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_their_ids() {
        let err = GraphError::DuplicateNode("h1".into());
        assert_eq!(err.to_string(), "node `h1` already exists");

        let err = GraphError::MissingEndpoint {
            edge: "e1".into(),
            endpoint: "b".into(),
        };
        assert!(err.to_string().contains("e1"));
        assert!(err.to_string().contains("b"));
    }
}
