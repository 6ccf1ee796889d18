use crate::mdps::mdp::Cell;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("{kind} location {location:?} lies outside the {rows}x{cols} grid")]
    OutOfBounds {
        kind: &'static str,
        location: Cell,
        rows: usize,
        cols: usize,
    },

    #[error("Grid of {rows}x{cols} cells is too large to allocate")]
    GridTooLarge { rows: usize, cols: usize },

    #[error("{kind} reward must be finite, got {reward}")]
    InvalidReward { kind: &'static str, reward: f64 },

    #[error("Discount factor must lie strictly between 0 and 1, got {0}")]
    InvalidGamma(f64),

    #[error("Convergence tolerance must be positive and finite, got {0}")]
    InvalidTheta(f64),

    /// Policy evaluation hit its sweep cap with the last sweep still moving by `delta`.
    #[error("Policy evaluation did not converge within {sweeps} sweeps (last delta {delta})")]
    NotConverged { sweeps: usize, delta: f64 },

    #[error("No action from {state:?} leads to a state inside the grid")]
    NoValidAction { state: Cell },

    #[error("Malformed solution: {0}")]
    MalformedSolution(String),

    #[error("Unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
