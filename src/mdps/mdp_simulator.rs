use super::mdp::*;
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    ReachedGoal,
    HitObstacle,
    LeftGrid,
    StepLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Visited states, starting state first.
    pub states: Vec<Cell>,
    pub outcome: Outcome,
    pub discounted_return: f64,
}

impl Trajectory {
    pub fn steps(&self) -> usize {
        self.states.len() - 1
    }
}

/// Applies `pi` from `start` until a terminal cell is entered, the policy
/// points off the grid, or `max_steps` moves have been made.
pub fn follow_policy(
    mdp: &dyn Mdp,
    pi: &Array2<Action>,
    start: Cell,
    max_steps: usize,
) -> Trajectory {
    let mut states = vec![start];
    let mut g = 0.;
    let mut discount = 1.;
    let mut s = start;

    let outcome = loop {
        if mdp.is_goal(s) {
            break Outcome::ReachedGoal;
        }
        if mdp.is_obstacle(s) {
            break Outcome::HitObstacle;
        }
        if states.len() > max_steps {
            break Outcome::StepLimit;
        }

        let Some(a) = pi.get(s) else {
            break Outcome::LeftGrid;
        };
        let Some(s_next) = mdp.next_state(s, *a) else {
            break Outcome::LeftGrid;
        };

        g += discount * mdp.reward(s_next);
        discount *= mdp.gamma();
        states.push(s_next);
        s = s_next;
    };

    Trajectory {
        states,
        outcome,
        discounted_return: g,
    }
}
