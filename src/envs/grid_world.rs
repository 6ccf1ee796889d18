use super::objects::*;
use crate::error::{GridError, Result};
use crate::mdps::mdp::*;
use ndarray::Array2;
use std::mem::size_of;

pub const DEFAULT_STEP_REWARD: f64 = -1.;
pub const DEFAULT_GAMMA: f64 = 0.9;
pub const DEFAULT_THETA: f64 = 1e-2;

/// Rectangular grid with a single goal cell and a set of obstacle cells.
/// The reward for entering a cell is fixed at construction.
#[derive(Debug, Clone)]
pub struct GridWorld {
    rows: usize,
    cols: usize,
    objects: Objects,
    gamma: f64,
    theta: f64,
    rewards: Array2<f64>,
}

impl GridWorld {
    pub fn new(
        grid_size: (usize, usize),
        objects: Objects,
        step_reward: f64,
        gamma: f64,
        theta: f64,
    ) -> Result<Self> {
        let (rows, cols) = grid_size;
        if rows == 0 || cols == 0 {
            return Err(GridError::EmptyGrid { rows, cols });
        }
        // Cells are addressed with isize offsets and stored densely as f64.
        let bytes = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(size_of::<f64>()));
        if !bytes.is_some_and(|b| b <= isize::MAX as usize) {
            return Err(GridError::GridTooLarge { rows, cols });
        }
        if !(gamma > 0. && gamma < 1.) {
            return Err(GridError::InvalidGamma(gamma));
        }
        if !(theta > 0. && theta.is_finite()) {
            return Err(GridError::InvalidTheta(theta));
        }
        for (kind, reward) in [
            ("Step", step_reward),
            ("Goal", objects.goal.reward),
            ("Obstacle", objects.obstacle.reward),
        ] {
            if !reward.is_finite() {
                return Err(GridError::InvalidReward { kind, reward });
            }
        }

        let check_bounds = |kind: &'static str, location: Cell| {
            if location.0 < rows && location.1 < cols {
                Ok(())
            } else {
                Err(GridError::OutOfBounds {
                    kind,
                    location,
                    rows,
                    cols,
                })
            }
        };
        check_bounds("Goal", objects.goal.location)?;
        for &s in &objects.obstacle.location {
            check_bounds("Obstacle", s)?;
        }

        let mut rewards = Array2::from_elem(grid_size, step_reward);
        rewards[objects.goal.location] = objects.goal.reward;
        for &s in &objects.obstacle.location {
            rewards[s] = objects.obstacle.reward;
        }

        Ok(Self {
            rows,
            cols,
            objects,
            gamma,
            theta,
            rewards,
        })
    }

    pub fn with_defaults(grid_size: (usize, usize), objects: Objects) -> Result<Self> {
        Self::new(
            grid_size,
            objects,
            DEFAULT_STEP_REWARD,
            DEFAULT_GAMMA,
            DEFAULT_THETA,
        )
    }

    pub fn objects(&self) -> &Objects {
        &self.objects
    }

    pub fn rewards(&self) -> &Array2<f64> {
        &self.rewards
    }
}

impl Mdp for GridWorld {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn reward(&self, s: Cell) -> f64 {
        self.rewards[s]
    }

    fn is_goal(&self, s: Cell) -> bool {
        self.objects.is_goal(s)
    }

    fn is_obstacle(&self, s: Cell) -> bool {
        self.objects.is_obstacle(s)
    }

    fn gamma(&self) -> f64 {
        self.gamma
    }

    fn theta(&self) -> f64 {
        self.theta
    }
}
