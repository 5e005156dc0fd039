pub mod circuit;
pub mod circuit_builder;
pub mod circuit_sim;
pub mod clipboard;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod project;
pub mod simulator;

pub use circuit::{Circuit, NodeId, PinId, WireId};
pub use engine::Engine;
pub use simulator::Simulator;
