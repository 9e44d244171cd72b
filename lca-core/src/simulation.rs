//! Monte-Carlo simulator (C10, §4.7).

pub mod builder;
pub mod engine;
pub mod node;
pub mod state;

pub use builder::SimulationBuilder;
pub use engine::Simulator;
pub use node::{SimulationNode, SubsystemLink};
pub use state::{PinSample, SimulationState};
