use thiserror::Error;

// Unified error type for axb. Failures raised inside an algorithm's hooks
// propagate through the cache lifecycle unmodified.

#[derive(Error, Debug)]
pub enum Error {
    #[error("factorization error: {0}")]
    Factorization(String),
    #[error("solve error: {0}")]
    Solve(String),
    #[error("singular operator: zero pivot at row {0}")]
    ZeroPivot(usize),
    #[error("indefinite operator detected (p^T A p <= 0)")]
    IndefiniteOperator,
    #[error("indefinite preconditioner detected (beta < 0)")]
    IndefinitePreconditioner,
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
