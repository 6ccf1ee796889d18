use gridworld_pi::*;
use std::collections::BTreeSet;

pub fn open_grid(grid_size: (usize, usize), goal: Cell) -> GridConfig {
    GridConfig::new(
        grid_size,
        Objects {
            goal: Goal {
                reward: 10.,
                location: goal,
            },
            obstacle: Obstacle {
                reward: -10.,
                location: BTreeSet::new(),
            },
        },
    )
}

pub fn solve(config: &GridConfig) -> PolicyIteration {
    let mut pi = config.solver().unwrap();
    let (stable, _) = pi.exec(config.max_iterations).unwrap();
    assert!(stable);
    pi
}

pub fn cells(mdp: &dyn Mdp) -> impl Iterator<Item = Cell> {
    let (rows, cols) = mdp.shape();
    (0..rows).flat_map(move |r| (0..cols).map(move |c| (r, c)))
}

pub fn manhattan(a: Cell, b: Cell) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}
