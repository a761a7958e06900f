use thiserror::Error;

/// Misuse of a `GameSession` by its driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no fragment decision is pending")]
    NoPendingDecision,
    #[error("the round has already ended")]
    RoundOver,
}
