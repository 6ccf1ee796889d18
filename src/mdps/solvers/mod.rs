pub mod common;
pub mod policy_iteration;
