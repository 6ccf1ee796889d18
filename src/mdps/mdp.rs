use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// (row, col), 0-indexed, row increasing downward.
pub type Cell = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Right,
    Left,
}

impl Action {
    /// Scan order used when breaking ties during improvement.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Right, Action::Left];

    pub const NAMES: [&'static str; 4] = ["U", "D", "R", "L"];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Right => (0, 1),
            Action::Left => (0, -1),
        }
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }
}

impl Distribution<Action> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        Action::ALL[rng.gen_range(0..Action::ALL.len())]
    }
}

/// Deterministic grid Markov Decision Process - Sutton & Barto 2018, ch. 4.
pub trait Mdp {
    fn shape(&self) -> (usize, usize);

    fn reward(&self, s: Cell) -> f64;

    fn is_goal(&self, s: Cell) -> bool;

    fn is_obstacle(&self, s: Cell) -> bool;

    fn gamma(&self) -> f64;

    fn theta(&self) -> f64;

    fn n_s(&self) -> usize {
        let (rows, cols) = self.shape();
        rows * cols
    }

    fn n_a(&self) -> usize {
        Action::ALL.len()
    }

    /// Total over all integer pairs.
    fn is_valid(&self, (row, col): (isize, isize)) -> bool {
        let (rows, cols) = self.shape();
        let inside = |x: isize, n: usize| usize::try_from(x).is_ok_and(|x| x < n);
        inside(row, rows) && inside(col, cols)
    }

    /// Moves that leave the grid are disallowed, not wrapped.
    fn next_state(&self, (row, col): Cell, a: Action) -> Option<Cell> {
        let (dr, dc) = a.delta();
        let shift = |x: usize, d: isize| isize::try_from(x).ok()?.checked_add(d);
        let next = (shift(row, dr)?, shift(col, dc)?);
        self.is_valid(next).then(|| (next.0 as usize, next.1 as usize))
    }
}
