pub mod metrics;
pub mod process;
pub mod scheduler;
pub mod simulation;
pub mod store;
pub mod workload;
pub mod workqueue;

// Re-export for easier testing
pub use scheduler::Policy;
pub use simulation::{Simulation, SimulationConfig, SimulationReport};
