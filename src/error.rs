use thiserror::Error;

/// The ways a matching request can fail on well-formed input.
///
/// Anything else (an even blossom cycle, a missing matched partner, broken
/// label alternation) is an implementation bug and panics instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchingError {
    /// A perfect matching cannot exist when the vertex count is odd.
    #[error("graph has an odd number of vertices ({0})")]
    OddVertexCount(usize),

    /// The dual updates ran out of applicable actions before the matching
    /// became perfect, e.g. because the graph splits into odd components.
    #[error("graph admits no perfect matching")]
    Infeasible,
}
