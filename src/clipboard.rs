//! Copying a selection of nodes and pasting it back as fresh nodes.
//!
//! Only wires with both ends inside the selection travel with it. On paste
//! those wires are re-attached by pin name, since the new nodes get new pin
//! ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::circuit::{Circuit, Node, NodeId, Pin, PinId, Wire, WireId};
use crate::circuit_sim::{PinDirection, Point};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Clipboard {
    nodes: Vec<Node>,
    pins: BTreeMap<PinId, Pin>,
    wires: Vec<Wire>,
}

/// What a paste created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pasted {
    /// Copied node id -> new node id.
    pub nodes: BTreeMap<NodeId, NodeId>,
    pub wires: Vec<WireId>,
}

impl Clipboard {
    pub fn copy(circuit: &Circuit, selection: &[NodeId]) -> Self {
        let mut nodes: Vec<Node> = Vec::new();
        for node_id in selection {
            match circuit.node(*node_id) {
                Some(node) if !nodes.iter().any(|n| n.id == node.id) => nodes.push(node.clone()),
                _ => (),
            }
        }
        let selected = |pin: &Pin| nodes.iter().any(|n| n.id == pin.node_id);
        let mut pins = BTreeMap::new();
        let mut wires = Vec::new();
        for wire in circuit.wires() {
            let (Some(from), Some(to)) = (circuit.pin(wire.from), circuit.pin(wire.to)) else {
                continue;
            };
            if selected(from) && selected(to) {
                pins.insert(from.id, from.clone());
                pins.insert(to.id, to.clone());
                wires.push(wire.clone());
            }
        }
        Self { nodes, pins, wires }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Recreates the copied nodes and their internal wires, moving wire
    /// anchors by `offset`. Params and titles are carried over.
    pub fn paste(&self, circuit: &mut Circuit, offset: Point) -> Pasted {
        let mut pasted = Pasted::default();
        for node in &self.nodes {
            let new_id = circuit.add_node(node.kind);
            for (key, param) in &node.data {
                circuit.set_node_param(new_id, key, param.value.clone());
            }
            circuit.set_node_title(new_id, node.title.clone());
            pasted.nodes.insert(node.id, new_id);
        }

        for wire in &self.wires {
            let (Some(from), Some(to)) = (self.pins.get(&wire.from), self.pins.get(&wire.to)) else {
                continue;
            };
            let new_from = pasted
                .nodes
                .get(&from.node_id)
                .and_then(|node| circuit.find_pin(*node, PinDirection::Output, &from.name));
            let new_to = pasted
                .nodes
                .get(&to.node_id)
                .and_then(|node| circuit.find_pin(*node, PinDirection::Input, &to.name));
            match (new_from, new_to) {
                (Some(new_from), Some(new_to)) => {
                    let anchors = wire
                        .anchors
                        .as_ref()
                        .filter(|anchors| !anchors.is_empty())
                        .map(|anchors| anchors.iter().map(|a| a.offset(offset)).collect());
                    pasted.wires.push(circuit.connect(new_from, new_to, anchors));
                }
                _ => warn!(
                    wire = wire.id.0,
                    from = %from.name,
                    to = %to.name,
                    "could not match pins for pasted wire"
                ),
            }
        }
        pasted
    }
}
