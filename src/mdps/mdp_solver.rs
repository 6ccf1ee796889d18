use super::mdp::*;
use crate::error::Result;

pub trait MdpSolver<T> {
    fn v_star(&self, s: Cell) -> Option<f64>;

    fn q_star(&self, s: Cell, a: Action) -> Option<f64>;

    fn pi_star(&self, s: Cell) -> Option<Action>;

    /// Runs to a fixed point or until `num_iterations` outer iterations have elapsed.
    /// Returns the solver's status along with the number of iterations taken.
    fn exec(&mut self, num_iterations: Option<usize>) -> Result<(T, usize)>;
}
