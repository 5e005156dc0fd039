//! Discrete-time simulation over a [`Circuit`].
//!
//! One tick settles the source nodes (constants and clocks), copies values
//! along every wire, then re-evaluates all other nodes until no output
//! changes or the pass cap is hit. Wires are visited in ascending id order,
//! so when several wires drive the same input the highest wire id wins.

use tracing::warn;

use crate::circuit::{Circuit, Node, PinValues};
use crate::circuit_sim::*;
use crate::config::EngineConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    /// Combinational passes run after the sources settled.
    pub passes: usize,
    /// The pass cap was reached while outputs were still changing.
    pub oscillating: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    pub values: PinValues,
    pub report: TickReport,
}

#[derive(Clone, Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    tick: Tick,
}

fn propagate(circuit: &Circuit, values: &mut PinValues) {
    for wire in circuit.wires() {
        let value = values.get(&wire.from).copied().unwrap_or(Signal::Undefined);
        if let Some(slot) = values.get_mut(&wire.to) {
            *slot = value;
        }
    }
}

fn nth(inputs: &[Signal], index: usize) -> Signal {
    inputs.get(index).copied().unwrap_or(Signal::Undefined)
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, tick: 0 }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn set_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }

    /// Computes the pin values of the tick after `tick`.
    ///
    /// Pure: the result depends only on the arguments. Pins missing from
    /// `values` start from the value stored on the circuit; entries for pins
    /// the circuit no longer has are dropped.
    pub fn advance_tick(&self, circuit: &Circuit, values: &PinValues, tick: Tick) -> TickOutcome {
        let tick = tick + 1;
        let mut working: PinValues = circuit
            .pins()
            .map(|pin| (pin.id, values.get(&pin.id).copied().unwrap_or(pin.value)))
            .collect();

        for node in circuit.nodes().filter(|node| node.kind.is_source()) {
            self.evaluate_node(node, &mut working, tick);
        }
        propagate(circuit, &mut working);

        let max_passes = self.config.max_passes.max(1);
        let mut passes = 0;
        let mut settled = false;
        while passes < max_passes {
            passes += 1;
            let mut changed = false;
            for node in circuit.nodes().filter(|node| !node.kind.is_source()) {
                changed |= self.evaluate_node(node, &mut working, tick);
            }
            propagate(circuit, &mut working);
            if !changed {
                settled = true;
                break;
            }
        }

        if !settled {
            warn!(tick, passes, "oscillation detected, keeping last computed values");
        }

        TickOutcome {
            values: working,
            report: TickReport {
                tick,
                passes,
                oscillating: !settled,
            },
        }
    }

    /// Runs one tick against the circuit's own pin values and commits the
    /// result onto the circuit.
    pub fn step(&mut self, circuit: &mut Circuit) -> TickReport {
        let values = circuit.pin_values();
        let outcome = self.advance_tick(circuit, &values, self.tick);
        circuit.commit_pin_values(&outcome.values);
        self.tick = outcome.report.tick;
        outcome.report
    }

    // Returns true if any output pin changed
    fn evaluate_node(&self, node: &Node, values: &mut PinValues, tick: Tick) -> bool {
        let inputs: Vec<Signal> = node
            .input_pins
            .iter()
            .map(|pin_id| values.get(pin_id).copied().unwrap_or(Signal::Undefined))
            .collect();
        let outputs = self.node_outputs(node, &inputs, tick);
        let mut changed = false;
        for (index, pin_id) in node.output_pins.iter().enumerate() {
            let Some(current) = values.get_mut(pin_id) else {
                continue;
            };
            let value = nth(&outputs, index);
            if *current != value {
                *current = value;
                changed = true;
            }
        }
        changed
    }

    /// Output values of a node, in declared output pin order.
    pub fn node_outputs(&self, node: &Node, inputs: &[Signal], tick: Tick) -> Vec<Signal> {
        let all_high = || inputs.iter().all(|s| s.is_high());
        let any_high = || inputs.iter().any(|s| s.is_high());
        let differ = || nth(inputs, 0).bit() ^ nth(inputs, 1).bit() == 1;
        match node.kind {
            NodeKind::Not => vec![Signal::from_bool(!nth(inputs, 0).is_high())],
            NodeKind::And => vec![Signal::from_bool(all_high())],
            NodeKind::Or => vec![Signal::from_bool(any_high())],
            NodeKind::Xor => vec![Signal::from_bool(differ())],
            NodeKind::Nand => vec![Signal::from_bool(!all_high())],
            NodeKind::Nor => vec![Signal::from_bool(!any_high())],
            NodeKind::Xnor => vec![Signal::from_bool(!differ())],
            NodeKind::Const => vec![Signal::from_bool(
                node.param(CONST_VALUE)
                    .is_some_and(|param| param.value.is_truthy()),
            )],
            NodeKind::Clock => vec![Signal::from_bool(self.clock_high(node, tick))],
            NodeKind::Split => vec![nth(inputs, 0), nth(inputs, 0)],
            NodeKind::SignalDisplay => vec![nth(inputs, 0)],
            NodeKind::Note => Vec::new(),
        }
    }

    /// A clock is high when `tick` is congruent to its offset modulo its
    /// period. Periods that are not a finite number >= 1 count as 1.
    fn clock_high(&self, node: &Node, tick: Tick) -> bool {
        let period = match node.param(CLOCK_PERIOD) {
            None => self.config.default_clock_period.max(1),
            Some(param) => match param.value.as_number() {
                Some(n) if n.is_finite() && n >= 1.0 => n as u64,
                _ => 1,
            },
        };
        let offset = node
            .param(CLOCK_OFFSET)
            .and_then(|param| param.value.as_number())
            .filter(|n| n.is_finite())
            .map_or(0, |n| n as i64);
        (tick as i128 - offset as i128).rem_euclid(period as i128) == 0
    }
}
