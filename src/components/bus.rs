use std::ops::{BitAnd, Shl};

use num_traits::Unsigned;

use crate::{
    circuit::{Circuit, NodeId, PinId},
    circuit_sim::{NodeKind, CONST_VALUE},
};

/// A group of output pins read together as one little-endian number.
/// Undefined bits read as 0.
pub struct Bus<const BITS: usize>([PinId; BITS]);

impl<const BITS: usize> Bus<BITS> {
    pub fn from_pins(pins: [PinId; BITS]) -> Self {
        Bus(pins)
    }

    pub fn pins(&self) -> &[PinId; BITS] {
        &self.0
    }

    pub fn read<T>(&self, circuit: &Circuit) -> T
    where
        T: Unsigned + Shl<usize, Output = T>,
    {
        let mut sum = T::zero();
        for (bit, pin_id) in self.0.iter().cloned().enumerate() {
            if circuit.pin_value(pin_id).is_high() {
                sum = sum + (T::one() << bit);
            }
        }
        sum
    }
}

/// A bus driven by one const node per bit.
pub struct InputBus<const BITS: usize> {
    nodes: [NodeId; BITS],
    pub bus: Bus<BITS>,
}

impl<const BITS: usize> InputBus<BITS> {
    pub fn new(circuit: &mut Circuit) -> Self {
        let mut nodes = [NodeId(0); BITS];
        let mut pins = [PinId(0); BITS];
        for (node, pin) in nodes.iter_mut().zip(pins.iter_mut()) {
            *node = circuit.add_node(NodeKind::Const);
            *pin = match circuit.output_pin(*node, 0) {
                Some(pin_id) => pin_id,
                None => unreachable!("const nodes have an output"),
            };
        }
        Self::from_nodes(nodes, pins)
    }

    pub fn from_nodes(nodes: [NodeId; BITS], pins: [PinId; BITS]) -> Self {
        Self {
            nodes,
            bus: Bus::from_pins(pins),
        }
    }

    pub fn nodes(&self) -> &[NodeId; BITS] {
        &self.nodes
    }

    /// Writes `val` into the const params. Visible on the pins after a tick.
    pub fn set<T>(&self, circuit: &mut Circuit, val: T)
    where
        T: Unsigned + Copy + BitAnd<T, Output = T> + Shl<usize, Output = T>,
    {
        for (bit, node_id) in self.nodes.iter().cloned().enumerate() {
            let bit_val = !(val & (T::one() << bit)).is_zero();
            circuit.set_node_param(node_id, CONST_VALUE, if bit_val { 1.0 } else { 0.0 });
        }
    }

    pub fn read<T>(&self, circuit: &Circuit) -> T
    where
        T: Unsigned + Shl<usize, Output = T>,
    {
        self.bus.read(circuit)
    }
}

pub trait Signed<T> {
    fn read_signed(&self, circuit: &Circuit) -> T;
    fn set_signed(&self, circuit: &mut Circuit, val: T);
}

macro_rules! read_signed {
    ( $bits:expr, $i:ty, $u:ty ) => {
        impl Signed<$i> for InputBus<$bits> {
            fn read_signed(&self, circuit: &Circuit) -> $i {
                self.read::<$u>(circuit) as $i
            }

            fn set_signed(&self, circuit: &mut Circuit, val: $i) {
                self.set(circuit, val as $u)
            }
        }
    };
}

read_signed!(8, i8, u8);
read_signed!(16, i16, u16);
read_signed!(32, i32, u32);
read_signed!(64, i64, u64);
