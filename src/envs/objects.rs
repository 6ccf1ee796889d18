use crate::mdps::mdp::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub reward: f64,
    pub location: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub reward: f64,
    #[serde(default)]
    pub location: BTreeSet<Cell>,
}

/// Special cells of a grid world. Kept after construction so consumers can
/// tell terminal cells apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objects {
    pub goal: Goal,
    pub obstacle: Obstacle,
}

impl Objects {
    pub fn is_goal(&self, s: Cell) -> bool {
        self.goal.location == s
    }

    pub fn is_obstacle(&self, s: Cell) -> bool {
        self.obstacle.location.contains(&s)
    }
}
