use std::{cell::RefCell, rc::Rc};

use crate::{
    circuit::{NodeId, PinId},
    circuit_builder::{self, ops::*, CircuitBuilder, NoHooks},
};

use super::bus::{Bus, InputBus};

type Connector = circuit_builder::Connector<NoHooks>;

struct Adder {
    sum: Connector,
    cout: Connector,
}

fn adder(a: Connector, b: Connector, cin: Connector) -> Adder {
    let sum = xor!(a, b, cin);
    let cout = or!(and!(a, b), and!(a, cin), and!(b, cin));
    Adder { sum, cout }
}

pub struct RippleCarryAdder<const BITS: usize> {
    pub input_a: InputBus<BITS>,
    pub input_b: InputBus<BITS>,
    pub cin: PinId,
    pub cout: PinId,
    pub sum: Bus<BITS>,
}

impl<const BITS: usize> RippleCarryAdder<BITS> {
    pub fn new(builder: Rc<RefCell<CircuitBuilder>>, cin: Connector) -> RippleCarryAdder<BITS> {
        assert!(BITS > 0);

        let mut a_nodes = [NodeId(0); BITS];
        let mut a_pins = [PinId(0); BITS];
        let mut b_nodes = [NodeId(0); BITS];
        let mut b_pins = [PinId(0); BITS];
        let mut sum_pins = [PinId(0); BITS];

        let cin_pin = cin.output;
        let mut carry = cin;
        for i in 0..BITS {
            let (a, a_node) = Connector::input(builder.clone());
            let (b, b_node) = Connector::input(builder.clone());
            (a_nodes[i], a_pins[i]) = (a_node, a.output);
            (b_nodes[i], b_pins[i]) = (b_node, b.output);
            let Adder { sum, cout } = adder(a, b, carry);
            sum_pins[i] = sum.output;
            carry = cout;
        }

        RippleCarryAdder {
            input_a: InputBus::from_nodes(a_nodes, a_pins),
            input_b: InputBus::from_nodes(b_nodes, b_pins),
            cin: cin_pin,
            cout: carry.output,
            sum: Bus::from_pins(sum_pins),
        }
    }
}
