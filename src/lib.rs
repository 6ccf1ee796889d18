pub mod config;
pub mod envs;
pub mod error;
pub mod mdps;
pub mod render;

pub use config::*;
pub use envs::*;
pub use error::*;
pub use mdps::{
    mdp::*, mdp_simulator::*, mdp_solver::*, solvers::common::*, solvers::policy_iteration::*,
};
pub use render::*;
