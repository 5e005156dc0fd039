//! Owns a circuit and its engine and serializes access to both: graph edits
//! and ticks go through `&mut self`, so they can never interleave.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::circuit::{Circuit, NodeId};
use crate::circuit_sim::{ParamValue, Tick, Ticks};
use crate::config::EngineConfig;
use crate::engine::{Engine, TickReport};
use crate::project::ProjectFile;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimState {
    #[default]
    Paused,
    Running,
    /// Running, but the last tick did not settle.
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub ticks: Ticks,
    pub oscillating_ticks: Vec<Tick>,
}

#[derive(Debug, Clone, Default)]
pub struct Simulator {
    circuit: Circuit,
    engine: Engine,
    state: SimState,
    last_report: Option<TickReport>,
}

impl Simulator {
    pub fn new(circuit: Circuit, config: EngineConfig) -> Self {
        Self {
            circuit,
            engine: Engine::new(config),
            state: SimState::Paused,
            last_report: None,
        }
    }

    /// Builds a simulator from project JSON, falling back to an empty
    /// circuit when the project cannot be loaded.
    pub fn load_or_default(json: &str, config: EngineConfig) -> Self {
        match ProjectFile::from_json(json).and_then(ProjectFile::into_circuit) {
            Ok(circuit) => Self::new(circuit, config),
            Err(err) => {
                warn!(%err, "failed to load project, starting from an empty circuit");
                Self::new(Circuit::default(), config)
            }
        }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Mutable access for graph edits. The engine is not involved.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn tick(&self) -> Tick {
        self.engine.tick()
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn set_state(&mut self, state: SimState) {
        self.state = state;
    }

    pub fn last_report(&self) -> Option<TickReport> {
        self.last_report
    }

    /// A deep copy of the graph, for an external undo history.
    pub fn snapshot(&self) -> Circuit {
        self.circuit.clone()
    }

    /// Replaces the graph wholesale. The tick counter is kept.
    pub fn restore(&mut self, snapshot: Circuit) {
        self.circuit = snapshot;
    }

    pub fn step(&mut self) -> TickReport {
        let report = self.engine.step(&mut self.circuit);
        self.state = match (self.state, report.oscillating) {
            (SimState::Running, true) => SimState::Error,
            (SimState::Error, false) => SimState::Running,
            (state, _) => state,
        };
        self.last_report = Some(report);
        report
    }

    pub fn run(&mut self, ticks: Ticks) -> RunResult {
        let mut result = RunResult::default();
        for _ in 0..ticks {
            let report = self.step();
            if report.oscillating {
                result.oscillating_ticks.push(report.tick);
            }
            result.ticks += 1;
        }
        result
    }

    /// Sets a node param and runs one tick so the edit shows up immediately.
    /// Returns `None` without ticking if the node does not exist.
    pub fn set_node_param(
        &mut self,
        node_id: NodeId,
        key: &str,
        value: impl Into<ParamValue>,
    ) -> Option<TickReport> {
        if !self.circuit.set_node_param(node_id, key, value) {
            debug!(node = node_id.0, key, "ignoring param edit on unknown node");
            return None;
        }
        Some(self.step())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuit_sim::{NodeKind, Signal, CONST_VALUE};

    #[test]
    fn param_edit_ticks_once() {
        let mut sim = Simulator::default();
        let constant = sim.circuit_mut().add_node(NodeKind::Const);
        let out = sim.circuit().output_pin(constant, 0).unwrap();

        let report = sim.set_node_param(constant, CONST_VALUE, 1.0).unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(sim.circuit().pin_value(out), Signal::High);
        assert_eq!(sim.set_node_param(NodeId(77), CONST_VALUE, 1.0), None);
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn oscillation_flags_state_but_keeps_running() {
        let mut sim = Simulator::default();
        let not = sim.circuit_mut().add_node(NodeKind::Not);
        let (input, output) = {
            let circuit = sim.circuit();
            (
                circuit.input_pin(not, 0).unwrap(),
                circuit.output_pin(not, 0).unwrap(),
            )
        };
        let wire = sim.circuit_mut().connect(output, input, None);
        sim.set_state(SimState::Running);

        let result = sim.run(3);
        assert_eq!(result.ticks, 3);
        assert_eq!(result.oscillating_ticks, vec![1, 2, 3]);
        assert_eq!(sim.state(), SimState::Error);

        sim.circuit_mut().disconnect_wire(wire);
        let result = sim.run(2);
        assert!(result.oscillating_ticks.is_empty());
        assert_eq!(sim.state(), SimState::Running);
        assert_eq!(sim.tick(), 5);
    }

    #[test]
    fn paused_single_steps_stay_paused() {
        let mut sim = Simulator::default();
        let not = sim.circuit_mut().add_node(NodeKind::Not);
        let circuit = sim.circuit_mut();
        circuit.connect(
            circuit.output_pin(not, 0).unwrap(),
            circuit.input_pin(not, 0).unwrap(),
            None,
        );
        assert!(sim.step().oscillating);
        assert_eq!(sim.state(), SimState::Paused);
        assert!(sim.last_report().unwrap().oscillating);
    }

    #[test]
    fn snapshot_and_restore() {
        let mut sim = Simulator::default();
        let before = sim.snapshot();
        sim.circuit_mut().add_node(NodeKind::Clock);
        sim.step();
        sim.restore(before);
        assert!(sim.circuit().is_empty());
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn bad_project_falls_back_to_empty_circuit() {
        let sim = Simulator::load_or_default("{ not json", EngineConfig::default());
        assert!(sim.circuit().is_empty());
        let sim = Simulator::load_or_default(
            r#"{"projectName":"x","version":"0.3","nodes":{},"pins":{},"wires":{},"nextId":1,"nextPinId":1,"nextWireId":1}"#,
            EngineConfig::default(),
        );
        assert!(sim.circuit().is_empty());
        let sim = Simulator::load_or_default(
            r#"{"projectName":"x","version":"1.0","nodes":{},"pins":{},
                "wires":{"4294967295":{"id":4294967295,"from":1,"to":2}},
                "nextId":1,"nextPinId":1,"nextWireId":1}"#,
            EngineConfig::default(),
        );
        assert!(sim.circuit().is_empty());
        assert_eq!(sim.circuit().wires().count(), 0);
    }

    #[test]
    fn config_reaches_the_engine() {
        let config = EngineConfig {
            max_passes: 7,
            ..EngineConfig::default()
        };
        let mut sim = Simulator::new(Circuit::new(), config.clone());
        assert_eq!(sim.engine().config(), &config);
        let not = sim.circuit_mut().add_node(NodeKind::Not);
        let circuit = sim.circuit_mut();
        circuit.connect(
            circuit.output_pin(not, 0).unwrap(),
            circuit.input_pin(not, 0).unwrap(),
            None,
        );
        assert_eq!(sim.step().passes, 7);
    }
}
