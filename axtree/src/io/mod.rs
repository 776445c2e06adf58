//! Side-effecting layer: observation files, configuration, trajectory
//! persistence and the browser environment seam.

pub mod config;
pub mod env;
pub mod observation;
pub mod trajectory_log;
