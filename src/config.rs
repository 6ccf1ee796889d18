use crate::envs::*;
use crate::error::{GridError, Result};
use crate::mdps::{mdp::*, mdp_solver::*, solvers::policy_iteration::*};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::rc::Rc;
use tracing::info;

/// Everything needed to assemble and solve one grid world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub grid_size: (usize, usize),
    pub objects: Objects,
    #[serde(default = "default_step_reward")]
    pub step_reward: f64,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_theta")]
    pub theta: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: Option<usize>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub terminal_cells: TerminalCells,
}

fn default_step_reward() -> f64 {
    DEFAULT_STEP_REWARD
}

fn default_gamma() -> f64 {
    DEFAULT_GAMMA
}

fn default_theta() -> f64 {
    DEFAULT_THETA
}

fn default_max_sweeps() -> Option<usize> {
    Some(DEFAULT_MAX_SWEEPS)
}

impl GridConfig {
    pub fn new(grid_size: (usize, usize), objects: Objects) -> Self {
        Self {
            grid_size,
            objects,
            step_reward: DEFAULT_STEP_REWARD,
            gamma: DEFAULT_GAMMA,
            theta: DEFAULT_THETA,
            seed: 0,
            max_sweeps: default_max_sweeps(),
            max_iterations: None,
            terminal_cells: TerminalCells::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// 8x8 maze walled in by obstacles, goal on the east wall.
    pub fn maze() -> Self {
        #[rustfmt::skip]
        let walls = [
            (0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (0, 7),
            (1, 0), (1, 7),
            (2, 2), (2, 3), (2, 5), (2, 7),
            (3, 0), (3, 3), (3, 4), (3, 7),
            (4, 0), (4, 1), (4, 4), (4, 6), (4, 7),
            (5, 0), (5, 2), (5, 4), (5, 7),
            (6, 0), (6, 5),
            (7, 0), (7, 1), (7, 2), (7, 3), (7, 4), (7, 5), (7, 6), (7, 7),
        ];

        Self::new(
            (8, 8),
            Objects {
                goal: Goal {
                    reward: 10.,
                    location: (6, 7),
                },
                obstacle: Obstacle {
                    reward: -10.,
                    location: walls.into_iter().collect::<BTreeSet<_>>(),
                },
            },
        )
    }

    pub fn grid_world(&self) -> Result<GridWorld> {
        GridWorld::new(
            self.grid_size,
            self.objects.clone(),
            self.step_reward,
            self.gamma,
            self.theta,
        )
    }

    pub fn solver(&self) -> Result<PolicyIteration> {
        let mdp = Rc::new(self.grid_world()?);

        Ok(PolicyIteration::new(mdp, self.seed)
            .with_terminal_cells(self.terminal_cells)
            .with_max_sweeps(self.max_sweeps))
    }

    pub fn solve(&self) -> Result<Solution> {
        let mut pi = self.solver()?;
        info!(
            rows = self.grid_size.0,
            cols = self.grid_size.1,
            gamma = self.gamma,
            theta = self.theta,
            seed = self.seed,
            "solving grid world"
        );
        let (stable, iterations) = pi.exec(self.max_iterations)?;

        Ok(Solution::new(&pi, &self.objects, stable, iterations))
    }
}

/// Final value function and policy, handed to whatever displays them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub stable: bool,
    pub iterations: usize,
    pub values: Vec<Vec<f64>>,
    /// Indices into `action_names`.
    pub policy: Vec<Vec<usize>>,
    pub action_names: Vec<String>,
    pub objects: Objects,
}

impl Solution {
    pub fn new(pi: &PolicyIteration, objects: &Objects, stable: bool, iterations: usize) -> Self {
        Self {
            stable,
            iterations,
            values: pi
                .value_function()
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
            policy: pi
                .policy()
                .rows()
                .into_iter()
                .map(|row| row.iter().map(|a| a.index()).collect())
                .collect(),
            action_names: Action::NAMES.iter().map(|n| n.to_string()).collect(),
            objects: objects.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The policy as actions, read back through `action_names`.
    pub fn policy_grid(&self) -> Result<Array2<Action>> {
        if self.action_names != Action::NAMES {
            return Err(GridError::MalformedSolution(format!(
                "action names {:?} do not match {:?}",
                self.action_names,
                Action::NAMES
            )));
        }
        let actions = self
            .policy
            .iter()
            .flatten()
            .map(|&i| {
                Action::from_index(i).ok_or_else(|| {
                    GridError::MalformedSolution(format!("no action at index {i}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        to_grid(&self.policy, actions)
    }

    pub fn value_grid(&self) -> Result<Array2<f64>> {
        to_grid(&self.values, self.values.iter().flatten().copied().collect())
    }
}

fn to_grid<T, U>(rows: &[Vec<T>], cells: Vec<U>) -> Result<Array2<U>> {
    let cols = rows.first().map_or(0, Vec::len);
    if let Some(r) = rows.iter().position(|row| row.len() != cols) {
        return Err(GridError::MalformedSolution(format!(
            "row {r} has {} cells, expected {cols}",
            rows[r].len()
        )));
    }

    Array2::from_shape_vec((rows.len(), cols), cells)
        .map_err(|e| GridError::MalformedSolution(e.to_string()))
}
