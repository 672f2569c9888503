pub mod constants;
pub mod driver;
pub mod engine;
pub mod ghost;
pub mod kinematics;
pub mod maze;
pub mod rng;
pub mod types;
