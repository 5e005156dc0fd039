//! The saved project shape: the circuit plus UI-owned node positions and a
//! version tag.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::circuit::{Circuit, CircuitSnapshot, Node, NodeId, Pin, PinId, Wire, WireId};
use crate::circuit_sim::Point;
use crate::error::ProjectError;

pub const PROJECT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub project_name: String,
    pub version: String,
    pub nodes: BTreeMap<NodeId, Node>,
    pub pins: BTreeMap<PinId, Pin>,
    pub wires: BTreeMap<WireId, Wire>,
    #[serde(default)]
    pub node_positions: BTreeMap<NodeId, Point>,
    pub next_id: u32,
    pub next_pin_id: u32,
    pub next_wire_id: u32,
}

impl ProjectFile {
    pub fn new(
        project_name: &str,
        circuit: &Circuit,
        node_positions: BTreeMap<NodeId, Point>,
    ) -> Self {
        Self {
            project_name: project_name.to_string(),
            version: PROJECT_VERSION.to_string(),
            nodes: circuit.nodes.clone(),
            pins: circuit.pins.clone(),
            wires: circuit.wires.clone(),
            node_positions,
            next_id: circuit.next_id,
            next_pin_id: circuit.next_pin_id,
            next_wire_id: circuit.next_wire_id,
        }
    }

    /// Parses a project, rejecting any version other than [`PROJECT_VERSION`].
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let project: ProjectFile = serde_json::from_str(json)?;
        if project.version != PROJECT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: project.version,
                expected: PROJECT_VERSION,
            });
        }
        Ok(project)
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// The circuit part of the project. Id counters are bumped past the
    /// largest id in use so fresh ids can never collide with loaded ones.
    pub fn into_circuit(self) -> Result<Circuit, ProjectError> {
        let circuit = Circuit::try_from(CircuitSnapshot {
            nodes: self.nodes,
            pins: self.pins,
            wires: self.wires,
            next_id: self.next_id,
            next_pin_id: self.next_pin_id,
            next_wire_id: self.next_wire_id,
        })?;
        let dangling = circuit.dangling_wires();
        if !dangling.is_empty() {
            warn!(count = dangling.len(), "project has wires to missing pins");
        }
        Ok(circuit)
    }
}
