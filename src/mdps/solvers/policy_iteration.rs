use super::common::*;
use crate::error::{GridError, Result};
use crate::mdps::{mdp::*, mdp_solver::*};
use itertools::iproduct;
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_SWEEPS: usize = 10_000;

/// Cells the improvement step leaves untouched. Evaluation pins the value of
/// the goal and of every obstacle to 0 regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalCells {
    /// Obstacles still get a greedy action even though their value stays 0.
    #[default]
    GoalOnly,
    GoalAndObstacles,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub sweeps: usize,
    pub delta: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Improvement {
    pub stable: bool,
    pub changed: usize,
}

/// Iterative policy evaluation with in-place (Gauss-Seidel) sweeps in
/// row-major order. Stops once a sweep moves no value by `theta` or more.
pub fn evaluate(
    mdp: &dyn Mdp,
    pi: &Array2<Action>,
    v: &mut Array2<f64>,
    max_sweeps: Option<usize>,
) -> Evaluation {
    let (rows, cols) = mdp.shape();
    let mut sweeps = 0;
    // No sweep run yet, so nothing is known to have settled.
    let mut delta = f64::INFINITY;
    while max_sweeps.map_or(true, |max| sweeps < max) {
        delta = 0.;
        for s in iproduct!(0..rows, 0..cols) {
            if mdp.is_goal(s) || mdp.is_obstacle(s) {
                v[s] = 0.;
                continue;
            }

            // A policy pointing off-grid leaves the value as is for this sweep.
            if let Some(new_value) = q_value(mdp, v, s, pi[s]) {
                delta = delta.max((v[s] - new_value).abs());
                v[s] = new_value;
            }
        }
        sweeps += 1;

        if delta < mdp.theta() {
            return Evaluation {
                sweeps,
                delta,
                converged: true,
            };
        }
    }

    Evaluation {
        sweeps,
        delta,
        converged: false,
    }
}

/// Greedy one-step lookahead over every non-terminal cell.
pub fn improve(
    mdp: &dyn Mdp,
    v: &Array2<f64>,
    pi: &mut Array2<Action>,
    terminal_cells: TerminalCells,
) -> Result<Improvement> {
    let (rows, cols) = mdp.shape();
    let mut changed = 0;
    for s in iproduct!(0..rows, 0..cols) {
        let skip = match terminal_cells {
            TerminalCells::GoalOnly => mdp.is_goal(s),
            TerminalCells::GoalAndObstacles => mdp.is_goal(s) || mdp.is_obstacle(s),
        };
        if skip {
            continue;
        }

        let (best, _) = greedy_action(mdp, v, s).ok_or(GridError::NoValidAction { state: s })?;
        if pi[s] != best {
            changed += 1;
        }
        pi[s] = best;
    }

    Ok(Improvement {
        stable: changed == 0,
        changed,
    })
}

/// Policy Iteration - Sutton & Barto 2018, section 4.3.
#[derive(Clone)]
pub struct PolicyIteration {
    mdp: Rc<dyn Mdp>,
    v: Array2<f64>,
    pi: Array2<Action>,
    terminal_cells: TerminalCells,
    max_sweeps: Option<usize>,
}

impl PolicyIteration {
    /// Values start at 0; the initial policy is drawn uniformly from `seed`.
    pub fn new(mdp: Rc<dyn Mdp>, seed: u64) -> Self {
        let rng = &mut StdRng::seed_from_u64(seed);
        let shape = mdp.shape();

        Self {
            v: Array2::zeros(shape),
            pi: Array2::from_shape_simple_fn(shape, || rng.gen()),
            mdp,
            terminal_cells: TerminalCells::default(),
            max_sweeps: Some(DEFAULT_MAX_SWEEPS),
        }
    }

    pub fn with_terminal_cells(mut self, terminal_cells: TerminalCells) -> Self {
        self.terminal_cells = terminal_cells;
        self
    }

    /// `None` lets evaluation sweep until it converges, however long that takes.
    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn mdp(&self) -> &Rc<dyn Mdp> {
        &self.mdp
    }

    pub fn value_function(&self) -> &Array2<f64> {
        &self.v
    }

    pub fn policy(&self) -> &Array2<Action> {
        &self.pi
    }

    pub fn evaluate(&mut self) -> Evaluation {
        evaluate(self.mdp.as_ref(), &self.pi, &mut self.v, self.max_sweeps)
    }

    pub fn improve(&mut self) -> Result<Improvement> {
        improve(self.mdp.as_ref(), &self.v, &mut self.pi, self.terminal_cells)
    }
}

impl MdpSolver<bool> for PolicyIteration {
    fn v_star(&self, s: Cell) -> Option<f64> {
        self.v.get(s).copied()
    }

    fn q_star(&self, s: Cell, a: Action) -> Option<f64> {
        self.v.get(s)?;
        q_value(self.mdp.as_ref(), &self.v, s, a)
    }

    fn pi_star(&self, s: Cell) -> Option<Action> {
        self.pi.get(s).copied()
    }

    fn exec(&mut self, num_iterations: Option<usize>) -> Result<(bool, usize)> {
        let mut i = 0;
        loop {
            if num_iterations.is_some_and(|n| i >= n) {
                warn!(
                    iterations = i,
                    "policy iteration stopped before the policy was stable"
                );
                return Ok((false, i));
            }

            let eval = self.evaluate();
            debug!(
                iteration = i,
                sweeps = eval.sweeps,
                delta = eval.delta,
                "policy evaluated"
            );
            if !eval.converged {
                return Err(GridError::NotConverged {
                    sweeps: eval.sweeps,
                    delta: eval.delta,
                });
            }

            let imp = self.improve()?;
            i += 1;
            debug!(iteration = i, changed = imp.changed, "policy improved");

            if imp.stable {
                info!(iterations = i, "policy stable");
                return Ok((true, i));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::*;
    use float_eq::*;
    use ndarray::array;
    use rstest::*;
    use std::collections::BTreeSet;

    fn open_grid(
        grid_size: (usize, usize),
        goal: Cell,
        obstacles: &[Cell],
        theta: f64,
    ) -> Rc<GridWorld> {
        let objects = Objects {
            goal: Goal {
                reward: 10.,
                location: goal,
            },
            obstacle: Obstacle {
                reward: -10.,
                location: obstacles.iter().copied().collect::<BTreeSet<_>>(),
            },
        };
        Rc::new(GridWorld::new(grid_size, objects, -1., 0.9, theta).unwrap())
    }

    fn solve(mdp: Rc<GridWorld>, seed: u64) -> PolicyIteration {
        let mut pi = PolicyIteration::new(mdp, seed);
        let (stable, iterations) = pi.exec(None).unwrap();
        assert!(stable);
        assert!(iterations >= 1);
        pi
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2718)]
    fn three_by_three_converges_to_exact_values(#[case] seed: u64) {
        let pi = solve(open_grid((3, 3), (2, 2), &[], 1e-2), seed);

        assert_float_eq!(
            pi.value_function().iter().copied().collect::<Vec<_>>(),
            vec![4.58, 6.2, 8.0, 6.2, 8.0, 10.0, 8.0, 10.0, 0.0],
            abs_all <= 1e-9
        );
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(2718)]
    fn three_by_three_policy_follows_first_max_tie_break(#[case] seed: u64) {
        let pi = solve(open_grid((3, 3), (2, 2), &[], 1e-2), seed);

        // Next to the goal Down earns 10 while Up and Left earn 6.2.
        assert_eq!(pi.pi_star((1, 2)), Some(Action::Down));
        // Down and Right tie everywhere off the last row and column, Down wins.
        assert_eq!(pi.pi_star((0, 0)), Some(Action::Down));
        assert_eq!(pi.pi_star((1, 1)), Some(Action::Down));
        assert_eq!(pi.pi_star((2, 0)), Some(Action::Right));
        assert_eq!(pi.pi_star((2, 1)), Some(Action::Right));
        assert_eq!(pi.pi_star((3, 0)), None);
    }

    #[test]
    fn goal_and_obstacle_values_are_pinned_to_zero() {
        let mdp = open_grid((4, 4), (3, 3), &[(1, 1), (2, 2)], 10.);
        let pi = &mut PolicyIteration::new(mdp, 11);
        pi.v.fill(42.);

        pi.evaluate();

        assert_eq!(pi.v_star((3, 3)), Some(0.));
        assert_eq!(pi.v_star((1, 1)), Some(0.));
        assert_eq!(pi.v_star((2, 2)), Some(0.));
    }

    #[test]
    fn evaluation_is_gauss_seidel() {
        // Every cell of a 1x4 corridor points Left, the goal is at the near end.
        let mdp = open_grid((1, 4), (0, 0), &[], 1e-2);
        let pi = array![[Action::Left, Action::Left, Action::Left, Action::Left]];
        let v = &mut Array2::zeros((1, 4));

        let eval = evaluate(mdp.as_ref(), &pi, v, Some(1));

        // Values updated earlier in the sweep feed the later ones.
        assert_eq!(eval.sweeps, 1);
        assert!(!eval.converged);
        assert_float_eq!(
            v.iter().copied().collect::<Vec<_>>(),
            vec![0., 10., 8., 6.2],
            abs_all <= 1e-12
        );

        let eval = evaluate(mdp.as_ref(), &pi, v, None);
        assert_eq!(eval.sweeps, 1);
        assert!(eval.converged);
        assert_eq!(eval.delta, 0.);
    }

    #[test]
    fn moves_off_grid_are_skipped_during_evaluation() {
        let mdp = open_grid((1, 3), (0, 2), &[], 1e-2);
        let pi = array![[Action::Up, Action::Right, Action::Right]];
        let v = &mut array![[3., 0., 0.]];

        let eval = evaluate(mdp.as_ref(), &pi, v, None);

        assert!(eval.converged);
        assert_eq!(v[(0, 0)], 3.);
        assert_float_eq!(v[(0, 1)], 10., abs <= 1e-12);
    }

    #[test]
    fn sweep_cap_surfaces_as_not_converged() {
        // Two cells pointing at each other only converge geometrically.
        let mdp = open_grid((1, 3), (0, 2), &[], 1e-2);
        let pi = &mut PolicyIteration::new(mdp, 0).with_max_sweeps(Some(3));
        pi.pi = array![[Action::Right, Action::Left, Action::Left]];

        assert!(!pi.evaluate().converged);

        pi.pi = array![[Action::Right, Action::Left, Action::Left]];
        pi.v.fill(0.);
        let err = pi.exec(None).unwrap_err();
        assert!(matches!(err, GridError::NotConverged { sweeps: 3, .. }));
    }

    #[test]
    fn zero_sweep_cap_leaves_values_untouched() {
        let mdp = open_grid((1, 3), (0, 2), &[], 1e-2);
        let pi = array![[Action::Right, Action::Right, Action::Right]];
        let v = &mut array![[5., 5., 5.]];

        let eval = evaluate(mdp.as_ref(), &pi, v, Some(0));

        assert_eq!(eval.sweeps, 0);
        assert!(!eval.converged);
        assert_eq!(*v, array![[5., 5., 5.]]);

        let solver = &mut PolicyIteration::new(mdp, 0).with_max_sweeps(Some(0));
        let err = solver.exec(None).unwrap_err();
        assert!(matches!(err, GridError::NotConverged { sweeps: 0, .. }));
        assert!(solver.value_function().iter().all(|&x| x == 0.));
    }

    #[test]
    fn sweep_cap_is_not_exceeded_when_converging_on_the_last_sweep() {
        let mdp = open_grid((1, 3), (0, 2), &[], 1e-2);
        let pi = array![[Action::Right, Action::Right, Action::Right]];

        // Values settle after the second sweep and are confirmed by the third.
        let v = &mut Array2::zeros((1, 3));
        let eval = evaluate(mdp.as_ref(), &pi, v, Some(1));
        assert_eq!((eval.sweeps, eval.converged), (1, false));

        let v = &mut Array2::zeros((1, 3));
        let eval = evaluate(mdp.as_ref(), &pi, v, None);
        assert!(eval.converged);
        let needed = eval.sweeps;

        let v = &mut Array2::zeros((1, 3));
        let eval = evaluate(mdp.as_ref(), &pi, v, Some(needed));
        assert_eq!((eval.sweeps, eval.converged), (needed, true));
    }

    #[test]
    fn improve_is_idempotent_at_the_fixed_point() {
        let pi = &mut solve(open_grid((4, 5), (0, 4), &[(1, 1), (2, 3)], 1e-2), 5);
        let before = pi.policy().clone();

        assert_eq!(
            pi.improve().unwrap(),
            Improvement {
                stable: true,
                changed: 0
            }
        );
        assert!(pi.improve().unwrap().stable);
        assert_eq!(pi.policy(), &before);
    }

    #[test]
    fn obstacles_get_a_greedy_action_unless_excluded() {
        let mdp = open_grid((3, 3), (2, 2), &[(1, 1)], 1e-2);

        let pi = solve(Rc::clone(&mdp), 3);
        // Down and Right both look ahead to 8 from the obstacle.
        assert_eq!(pi.pi_star((1, 1)), Some(Action::Down));
        assert_eq!(pi.v_star((1, 1)), Some(0.));

        let fresh = PolicyIteration::new(Rc::clone(&mdp) as Rc<dyn Mdp>, 3);
        let initial = fresh.pi_star((1, 1));
        let pi = &mut fresh.with_terminal_cells(TerminalCells::GoalAndObstacles);
        assert!(pi.exec(None).unwrap().0);
        assert_eq!(pi.pi_star((1, 1)), initial);
        assert_eq!(pi.pi_star((0, 1)), Some(Action::Right));
    }

    #[test]
    fn goal_keeps_its_initial_action() {
        let mdp = open_grid((3, 3), (2, 2), &[], 1e-2);
        let fresh = PolicyIteration::new(mdp, 99);
        let initial = fresh.pi_star((2, 2));

        let pi = &mut fresh.clone();
        pi.exec(None).unwrap();

        assert_eq!(pi.pi_star((2, 2)), initial);
    }

    #[test]
    fn policy_is_reproducible_from_seed() {
        let mdp = open_grid((5, 5), (4, 4), &[], 1e-2);

        let a = PolicyIteration::new(Rc::clone(&mdp) as Rc<dyn Mdp>, 2718);
        let b = PolicyIteration::new(mdp, 2718);

        assert_eq!(a.policy(), b.policy());
    }

    #[test]
    fn iteration_cap_reports_unstable() {
        let pi = &mut PolicyIteration::new(open_grid((5, 5), (4, 4), &[], 1e-2), 1);

        assert_eq!(pi.exec(Some(0)).unwrap(), (false, 0));
    }

    #[test]
    fn q_star_matches_lookahead() {
        let pi = solve(open_grid((3, 3), (2, 2), &[], 1e-2), 0);

        assert_float_eq!(pi.q_star((1, 2), Action::Down).unwrap(), 10., abs <= 1e-9);
        assert_float_eq!(pi.q_star((1, 2), Action::Up).unwrap(), 6.2, abs <= 1e-9);
        assert_eq!(pi.q_star((1, 2), Action::Right), None);
        assert_eq!(pi.q_star((5, 5), Action::Up), None);
    }

    struct Island;

    impl Mdp for Island {
        fn shape(&self) -> (usize, usize) {
            (1, 1)
        }

        fn reward(&self, _: Cell) -> f64 {
            -1.
        }

        fn is_goal(&self, _: Cell) -> bool {
            false
        }

        fn is_obstacle(&self, _: Cell) -> bool {
            false
        }

        fn gamma(&self) -> f64 {
            0.9
        }

        fn theta(&self) -> f64 {
            1e-2
        }
    }

    #[test]
    fn cell_without_valid_moves_is_an_error() {
        let pi = &mut PolicyIteration::new(Rc::new(Island), 0);

        let err = pi.exec(None).unwrap_err();

        assert!(matches!(err, GridError::NoValidAction { state: (0, 0) }));
    }
}
