pub mod simulation;
mod simulation_tests;

pub use simulation::Simulation;
