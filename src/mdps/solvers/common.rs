use crate::mdps::mdp::*;
use ndarray::Array2;

/// One-step lookahead: r(s') + gamma * v(s'). None when `a` leaves the grid.
pub fn q_value(mdp: &dyn Mdp, v: &Array2<f64>, s: Cell, a: Action) -> Option<f64> {
    mdp.next_state(s, a)
        .map(|s_next| mdp.reward(s_next) + mdp.gamma() * v[s_next])
}

/// Action with the strictly largest lookahead value. Ties go to the action
/// scanned first in `Action::ALL`.
pub fn greedy_action(mdp: &dyn Mdp, v: &Array2<f64>, s: Cell) -> Option<(Action, f64)> {
    Action::ALL
        .iter()
        .filter_map(|&a| q_value(mdp, v, s, a).map(|q| (a, q)))
        .fold(None, |best, (a, q)| match best {
            Some((_, q_best)) if q <= q_best => best,
            _ => Some((a, q)),
        })
}
