//! Error types for the cover crate.
//!
//! Provides structured error variants for malformed base graphs, impossible
//! permutation requests, eigensolver failures, and the fatal certification
//! failure raised when an approximate base spectrum turns out to be too
//! narrow. All errors implement `std::error::Error` via `thiserror`.

/// Primary error type for cover construction and eigenvalue extraction.
#[derive(Debug, thiserror::Error)]
pub enum CoverError {
    /// The caller supplied invalid input (malformed graph, parameters, etc.).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A fixed-point-free permutation was requested for a size that has none.
    #[error("no derangement of size {n} satisfies the requested constraints")]
    DerangementImpossible {
        /// Requested permutation size.
        n: usize,
    },

    /// The rejection-and-patch loop of an avoiding-set derangement ran out of
    /// rounds without clearing every bad coordinate.
    #[error("permutation search for size {n} did not settle after {rounds} rounds")]
    PermutationSearchExhausted {
        /// Requested permutation size.
        n: usize,
        /// Rounds attempted.
        rounds: usize,
    },

    /// The certified new eigenvalue is smaller in magnitude than the cutoff
    /// derived from the partial base spectrum. The base spectrum was computed
    /// with too few eigenvalues for this input; this aborts the whole batch.
    #[error(
        "largest new eigenvalue {eigenvalue} is smaller than the smallest relevant base \
         eigenvalue magnitude {cutoff}; {base_eigs} base eigenvalues is too few"
    )]
    CertificationFailed {
        /// The selected new eigenvalue.
        eigenvalue: f64,
        /// Magnitude cutoff of the partial base spectrum.
        cutoff: f64,
        /// Number of base eigenvalues that were computed.
        base_eigs: usize,
    },

    /// A loop-graph trial kept drawing covers whose queried eigenvalues
    /// were all trivial.
    #[error("trial {trial} drew {attempts} covers without a non-trivial eigenvalue")]
    RedrawsExhausted {
        /// Trial index.
        trial: usize,
        /// Covers drawn.
        attempts: usize,
    },

    /// The sparse eigensolver could not certify the requested Ritz values.
    #[error("eigensolver did not converge for k={requested} (krylov dimension {krylov_dim})")]
    NonConvergence {
        /// Number of eigenvalues requested.
        requested: usize,
        /// Krylov subspace dimension reached before giving up.
        krylov_dim: usize,
    },

    /// A backend-specific error (thread pool construction, etc.).
    #[error("backend error: {0}")]
    BackendError(String),
}

/// Validation errors for base graphs and parameters.
///
/// These are raised eagerly before any computation begins and are never
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The adjacency matrix is not square.
    #[error("adjacency matrix must be square but is {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// The graph has no vertices.
    #[error("base graph must have at least one vertex")]
    Empty,

    /// `A[row, col] != A[col, row]`.
    #[error("adjacency matrix is not symmetric: A[{row},{col}] = {upper} but A[{col},{row}] = {lower}")]
    Asymmetric {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// Value at `(row, col)`.
        upper: f64,
        /// Value at `(col, row)`.
        lower: f64,
    },

    /// A negative edge multiplicity.
    #[error("negative entry A[{row},{col}] = {value}")]
    NegativeEntry {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// An edge multiplicity that is not a whole number.
    #[error("entry A[{row},{col}] = {value} is not an integer multiplicity")]
    NonIntegerEntry {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// A diagonal entry that does not halve to a whole loop count.
    #[error("diagonal entry A[{vertex},{vertex}] = {value} is not an even integer (loops count twice)")]
    OddLoopEntry {
        /// Vertex carrying the loop.
        vertex: usize,
        /// The offending value.
        value: f64,
    },

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// The block-matrix cover needs a simple base graph.
    #[error("base graph must be simple: {0}")]
    NotSimple(String),

    /// Inconsistent dimensions.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// The sign-policy tag is not one of the known values.
    #[error(
        "sign policy '{0}' is invalid; must be one of 'max_positive', 'max_negative', 'max_magnitude'"
    )]
    UnknownSignPolicy(String),

    /// Matrix size exceeds the implementation limit.
    #[error("matrix dimension {dim} exceeds maximum supported {max_dim}")]
    MatrixTooLarge {
        /// Requested dimension.
        dim: usize,
        /// Maximum supported dimension.
        max_dim: usize,
    },
}
