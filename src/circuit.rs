//! The circuit graph store.
//!
//! Nodes, pins and wires live in flat maps keyed by integer ids and refer to
//! each other only by id. Ids come from monotonically increasing counters and
//! are never reused, so a deleted element can leave a stale id behind but
//! never a dangling reference. Every operation treats unknown ids as a no-op.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit_sim::*;
use crate::error::{ConnectError, IdSpaceExhausted};

macro_rules! id_type {
    ( $name:ident ) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            const FIRST: u32 = 1;
        }
    };
}

id_type!(NodeId);
id_type!(PinId);
id_type!(WireId);

/// Pin values keyed by pin id; the state the engine reads and produces.
pub type PinValues = BTreeMap<PinId, Signal>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub input_pins: Vec<PinId>,
    pub output_pins: Vec<PinId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Param>,
}

impl Node {
    pub fn param(&self, key: &str) -> Option<&Param> {
        self.data.get(key)
    }

    pub fn pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.input_pins.iter().chain(self.output_pins.iter()).copied()
    }
}

fn undefined() -> Signal {
    Signal::Undefined
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: PinId,
    pub node_id: NodeId,
    pub name: String,
    #[serde(default = "undefined")]
    pub value: Signal,
    #[serde(rename = "type")]
    pub direction: PinDirection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: WireId,
    pub from: PinId,
    pub to: PinId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors: Option<Vec<Point>>,
}

impl Wire {
    pub fn touches(&self, pin: PinId) -> bool {
        self.from == pin || self.to == pin
    }
}

/// The whole graph. Cloning it is a full snapshot, which is all an external
/// undo history needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CircuitSnapshot")]
pub struct Circuit {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) pins: BTreeMap<PinId, Pin>,
    pub(crate) wires: BTreeMap<WireId, Wire>,
    pub(crate) next_id: u32,
    pub(crate) next_pin_id: u32,
    pub(crate) next_wire_id: u32,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            pins: BTreeMap::new(),
            wires: BTreeMap::new(),
            next_id: NodeId::FIRST,
            next_pin_id: PinId::FIRST,
            next_wire_id: WireId::FIRST,
        }
    }
}

/// A circuit as it arrives from outside, before its id counters are trusted.
/// Missing maps are empty and missing counters start at the first id.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct CircuitSnapshot {
    pub nodes: BTreeMap<NodeId, Node>,
    pub pins: BTreeMap<PinId, Pin>,
    pub wires: BTreeMap<WireId, Wire>,
    pub next_id: u32,
    pub next_pin_id: u32,
    pub next_wire_id: u32,
}

// Smallest counter value that is at least `counter`, at least `first`, and
// past every id in `ids`. `None` if some id is already `u32::MAX`.
fn next_free(counter: u32, first: u32, ids: impl Iterator<Item = u32>) -> Option<u32> {
    ids.map(|id| id.checked_add(1))
        .try_fold(counter.max(first), |acc, next| Some(acc.max(next?)))
}

impl TryFrom<CircuitSnapshot> for Circuit {
    type Error = IdSpaceExhausted;

    /// Raises the id counters past the largest ids in use, so a stale or
    /// missing counter can never hand out an id twice.
    fn try_from(raw: CircuitSnapshot) -> Result<Self, Self::Error> {
        let next_id = next_free(raw.next_id, NodeId::FIRST, raw.nodes.keys().map(|id| id.0))
            .ok_or(IdSpaceExhausted("node"))?;
        let next_pin_id = next_free(raw.next_pin_id, PinId::FIRST, raw.pins.keys().map(|id| id.0))
            .ok_or(IdSpaceExhausted("pin"))?;
        let next_wire_id =
            next_free(raw.next_wire_id, WireId::FIRST, raw.wires.keys().map(|id| id.0))
                .ok_or(IdSpaceExhausted("wire"))?;
        if (next_id, next_pin_id, next_wire_id) != (raw.next_id, raw.next_pin_id, raw.next_wire_id)
        {
            debug!(next_id, next_pin_id, next_wire_id, "repaired stale id counters");
        }
        Ok(Self {
            nodes: raw.nodes,
            pins: raw.pins,
            wires: raw.wires,
            next_id,
            next_pin_id,
            next_wire_id,
        })
    }
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_pin(&mut self, node_id: NodeId, name: &str, direction: PinDirection) -> PinId {
        let pin_id = PinId(self.next_pin_id);
        self.next_pin_id += 1;
        self.pins.insert(
            pin_id,
            Pin {
                id: pin_id,
                node_id,
                name: name.to_string(),
                value: Signal::Low,
                direction,
            },
        );
        pin_id
    }

    /// Adds a node with the pin layout and default params of `kind`.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let node_id = NodeId(self.next_id);
        self.next_id += 1;
        let layout = kind.layout();
        let input_pins = layout
            .inputs
            .iter()
            .map(|name| self.create_pin(node_id, name, PinDirection::Input))
            .collect();
        let output_pins = layout
            .outputs
            .iter()
            .map(|name| self.create_pin(node_id, name, PinDirection::Output))
            .collect();
        let data = kind
            .default_params()
            .into_iter()
            .map(|(key, param)| (key.to_string(), param))
            .collect();
        self.nodes.insert(
            node_id,
            Node {
                id: node_id,
                kind,
                input_pins,
                output_pins,
                title: None,
                data,
            },
        );
        debug!(node = node_id.0, %kind, "added node");
        node_id
    }

    /// Adds a node from its kind name.
    ///
    /// # Panics
    /// If `kind` is not a known node kind. That is a bug in the caller.
    pub fn add_node_by_name(&mut self, kind: &str) -> NodeId {
        match kind.parse::<NodeKind>() {
            Ok(kind) => self.add_node(kind),
            Err(err) => panic!("{err}"),
        }
    }

    /// Removes a node, its pins and every wire touching those pins.
    pub fn remove_node(&mut self, node_id: NodeId) {
        let Some(node) = self.nodes.remove(&node_id) else {
            debug!(node = node_id.0, "ignoring removal of unknown node");
            return;
        };
        let mut doomed: BTreeSet<PinId> = node.pins().collect();
        doomed.extend(
            self.pins
                .values()
                .filter(|pin| pin.node_id == node_id)
                .map(|pin| pin.id),
        );
        self.pins.retain(|id, _| !doomed.contains(id));
        self.wires
            .retain(|_, wire| !doomed.contains(&wire.from) && !doomed.contains(&wire.to));
    }

    pub fn remove_nodes(&mut self, node_ids: &[NodeId]) {
        for node_id in node_ids {
            self.remove_node(*node_id);
        }
    }

    /// Adds a wire without any validation. See [`Circuit::complete_wire`]
    /// for the checked variant.
    pub fn connect(&mut self, from: PinId, to: PinId, anchors: Option<Vec<Point>>) -> WireId {
        let wire_id = WireId(self.next_wire_id);
        self.next_wire_id += 1;
        self.wires.insert(
            wire_id,
            Wire {
                id: wire_id,
                from,
                to,
                anchors,
            },
        );
        wire_id
    }

    /// Connects two pins given in either order, enforcing that they sit on
    /// different nodes, that one is an output and the other an input, and
    /// that the same wire does not already exist.
    pub fn complete_wire(
        &mut self,
        start: PinId,
        end: PinId,
        anchors: Option<Vec<Point>>,
    ) -> Result<WireId, ConnectError> {
        let result = self.check_wire(start, end);
        match result {
            Ok((from, to)) => Ok(self.connect(from, to, anchors.filter(|a| !a.is_empty()))),
            Err(err) => {
                debug!(start = start.0, end = end.0, %err, "wire completion rejected");
                Err(err)
            }
        }
    }

    fn check_wire(&self, start: PinId, end: PinId) -> Result<(PinId, PinId), ConnectError> {
        let start_pin = self.pins.get(&start).ok_or(ConnectError::MissingPin(start))?;
        let end_pin = self.pins.get(&end).ok_or(ConnectError::MissingPin(end))?;
        if start_pin.node_id == end_pin.node_id {
            return Err(ConnectError::SameNode(start_pin.node_id));
        }
        let (from, to) = match (start_pin.direction, end_pin.direction) {
            (PinDirection::Output, PinDirection::Input) => (start, end),
            (PinDirection::Input, PinDirection::Output) => (end, start),
            _ => return Err(ConnectError::DirectionMismatch(start, end)),
        };
        match self
            .wires
            .values()
            .find(|wire| wire.from == from && wire.to == to)
        {
            Some(wire) => Err(ConnectError::AlreadyConnected(wire.id)),
            None => Ok((from, to)),
        }
    }

    pub fn disconnect_wire(&mut self, wire_id: WireId) {
        self.wires.remove(&wire_id);
    }

    /// Removes every wire that starts or ends at `pin_id`.
    pub fn disconnect_pin(&mut self, pin_id: PinId) {
        self.wires.retain(|_, wire| !wire.touches(pin_id));
    }

    /// Upserts a param on a node. An existing param keeps its name and kind;
    /// a new one is created as [`ParamKind::Numerical`] under `key`.
    ///
    /// Returns `false` if the node does not exist.
    pub fn set_node_param(&mut self, node_id: NodeId, key: &str, value: impl Into<ParamValue>) -> bool {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        let value = value.into();
        match node.data.get_mut(key) {
            Some(param) => param.value = value,
            None => {
                node.data
                    .insert(key.to_string(), Param::new(key, ParamKind::Numerical, value));
            }
        }
        true
    }

    pub fn set_node_title(&mut self, node_id: NodeId, title: Option<String>) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.title = title;
        }
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.pins.get(&pin_id)
    }

    pub fn wire(&self, wire_id: WireId) -> Option<&Wire> {
        self.wires.get(&wire_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.values()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.wires.is_empty()
    }

    /// Value of a pin, `Undefined` if it does not exist.
    pub fn pin_value(&self, pin_id: PinId) -> Signal {
        self.pins
            .get(&pin_id)
            .map_or(Signal::Undefined, |pin| pin.value)
    }

    pub fn input_pin(&self, node_id: NodeId, index: usize) -> Option<PinId> {
        self.nodes.get(&node_id)?.input_pins.get(index).copied()
    }

    pub fn output_pin(&self, node_id: NodeId, index: usize) -> Option<PinId> {
        self.nodes.get(&node_id)?.output_pins.get(index).copied()
    }

    /// Finds a pin on a node by direction and name.
    pub fn find_pin(&self, node_id: NodeId, direction: PinDirection, name: &str) -> Option<PinId> {
        let node = self.nodes.get(&node_id)?;
        let candidates = match direction {
            PinDirection::Input => &node.input_pins,
            PinDirection::Output => &node.output_pins,
        };
        candidates
            .iter()
            .copied()
            .find(|pin_id| self.pins.get(pin_id).is_some_and(|pin| pin.name == name))
    }

    pub fn wires_at(&self, pin_id: PinId) -> impl Iterator<Item = &Wire> {
        self.wires.values().filter(move |wire| wire.touches(pin_id))
    }

    /// Wires with an endpoint that names no existing pin. Always empty for a
    /// graph built only through this API; loaded snapshots may differ.
    pub fn dangling_wires(&self) -> Vec<WireId> {
        self.wires
            .values()
            .filter(|wire| !self.pins.contains_key(&wire.from) || !self.pins.contains_key(&wire.to))
            .map(|wire| wire.id)
            .collect()
    }

    pub fn pin_values(&self) -> PinValues {
        self.pins.values().map(|pin| (pin.id, pin.value)).collect()
    }

    /// Writes computed values back onto existing pins. Unknown ids are skipped.
    pub fn commit_pin_values(&mut self, values: &PinValues) {
        for (pin_id, value) in values {
            if let Some(pin) = self.pins.get_mut(pin_id) {
                pin.value = *value;
            }
        }
    }
}
