/* Modules */
pub mod config;
pub mod coordinator;
pub mod elevator;
pub mod scenarios;
pub mod scheduler;
pub mod shared;
pub mod simulation;

/* Re-exports */
pub use coordinator::{Coordinator, SimulationHandle};
pub use shared::{SimError, SimResult, SystemState};
pub use simulation::Simulation;
