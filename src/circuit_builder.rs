use std::{cell::RefCell, rc::Rc};

use crate::circuit::{Circuit, NodeId, PinId};
use crate::circuit_sim::*;

pub trait BuilderHooks: Default {
    fn create_node_hook(&mut self, _node_id: NodeId) {}
    fn create_input_hook(&mut self, _node_id: NodeId) {}
    fn connect_hook(&mut self, _from: PinId, _to: PinId) {}

    type MarkNodeArgs;
    fn mark_node(&mut self, _pin_id: PinId, _args: Self::MarkNodeArgs) {}
}

#[derive(Default)]
pub struct NoHooks;
impl BuilderHooks for NoHooks {
    type MarkNodeArgs = ();
}

pub type CircuitBuilder = CircuitBuilderWithHooks<NoHooks>;

#[derive(Default)]
pub struct CircuitBuilderWithHooks<T: BuilderHooks> {
    pub circuit: Circuit,
    hooks: T,
}

// The non-inverted form of a gate, used for the inner levels of a wide gate.
fn positive(kind: NodeKind) -> NodeKind {
    match kind {
        NodeKind::Nand => NodeKind::And,
        NodeKind::Nor => NodeKind::Or,
        NodeKind::Xnor => NodeKind::Xor,
        kind => kind,
    }
}

impl<T: BuilderHooks> CircuitBuilderWithHooks<T> {
    fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let node_id = self.circuit.add_node(kind);
        self.hooks.create_node_hook(node_id);
        node_id
    }

    fn create_input(&mut self) -> NodeId {
        let node_id = self.circuit.add_node(NodeKind::Const);
        self.hooks.create_node_hook(node_id);
        self.hooks.create_input_hook(node_id);
        node_id
    }

    fn connect(&mut self, from: PinId, to: PinId) {
        self.circuit.connect(from, to, None);
        self.hooks.connect_hook(from, to);
    }

    fn mark_node(&mut self, pin_id: PinId, args: T::MarkNodeArgs) {
        self.hooks.mark_node(pin_id, args);
    }

    fn output_of(&self, node_id: NodeId) -> PinId {
        match self.circuit.output_pin(node_id, 0) {
            Some(pin_id) => pin_id,
            None => panic!("node {node_id:?} has no output"),
        }
    }

    fn gate(&mut self, kind: NodeKind, inputs: &[PinId]) -> PinId {
        let node_id = self.create_node(kind);
        let input_pins = self
            .circuit
            .node(node_id)
            .map(|node| node.input_pins.clone())
            .unwrap_or_default();
        assert_eq!(input_pins.len(), inputs.len(), "{kind} gate arity");
        for (from, to) in inputs.iter().zip(input_pins) {
            self.connect(*from, to);
        }
        self.output_of(node_id)
    }

    // Gates wider than two inputs become a left-leaning tree of two-input gates.
    fn gate_tree(&mut self, kind: NodeKind, inputs: &[PinId]) -> PinId {
        match inputs {
            [] => panic!("{kind} gate needs inputs"),
            [single] if kind.layout().inputs.len() == 1 => self.gate(kind, &[*single]),
            // One input: the positive gates pass it through, the inverted ones negate it.
            [single] if positive(kind) != kind => self.gate(NodeKind::Not, &[*single]),
            [single] => *single,
            [first, second] => self.gate(kind, &[*first, *second]),
            [rest @ .., last] => {
                let acc = self.gate_tree(positive(kind), rest);
                self.gate(kind, &[acc, *last])
            }
        }
    }

    /// Sets the value of an input created by [`Connector::input`].
    pub fn set_input(&mut self, node_id: NodeId, val: bool) {
        self.circuit
            .set_node_param(node_id, CONST_VALUE, if val { 1.0 } else { 0.0 });
    }

    pub fn build(&mut self) -> (&mut Circuit, &mut T) {
        (&mut self.circuit, &mut self.hooks)
    }
}

/// A handle on an output pin inside a circuit under construction.
pub struct Connector<T: BuilderHooks> {
    builder: Rc<RefCell<CircuitBuilderWithHooks<T>>>,
    pub output: PinId,
}

impl<T: BuilderHooks> Connector<T> {
    fn from_output(builder: Rc<RefCell<CircuitBuilderWithHooks<T>>>, output: PinId) -> Self {
        Connector { builder, output }
    }

    /// A constant low source.
    pub fn new(builder: Rc<RefCell<CircuitBuilderWithHooks<T>>>) -> Self {
        let output = {
            let mut builder_mut = builder.borrow_mut();
            let node_id = builder_mut.create_node(NodeKind::Const);
            builder_mut.output_of(node_id)
        };
        Self::from_output(builder, output)
    }

    /// A settable input, backed by a const node.
    pub fn input(builder: Rc<RefCell<CircuitBuilderWithHooks<T>>>) -> (Self, NodeId) {
        let (node_id, output) = {
            let mut builder_mut = builder.borrow_mut();
            let node_id = builder_mut.create_input();
            (node_id, builder_mut.output_of(node_id))
        };
        (Self::from_output(builder, output), node_id)
    }

    pub fn input_ignore(builder: Rc<RefCell<CircuitBuilderWithHooks<T>>>) -> Self {
        let (connector, _node_id) = Self::input(builder);
        connector
    }

    /// A clock source with the given period.
    pub fn clock(builder: Rc<RefCell<CircuitBuilderWithHooks<T>>>, period: u64) -> Self {
        let output = {
            let mut builder_mut = builder.borrow_mut();
            let node_id = builder_mut.create_node(NodeKind::Clock);
            builder_mut
                .circuit
                .set_node_param(node_id, CLOCK_PERIOD, period);
            builder_mut.output_of(node_id)
        };
        Self::from_output(builder, output)
    }

    fn gate_gen(kind: NodeKind, inputs: &[&Self]) -> Self {
        let builder = inputs[0].builder.clone();
        for input in inputs {
            assert!(Rc::ptr_eq(&builder, &input.builder));
        }
        let pins: Vec<PinId> = inputs.iter().map(|input| input.output).collect();
        let output = builder.borrow_mut().gate_tree(kind, &pins);
        Self::from_output(builder, output)
    }

    pub fn mark(&self, args: T::MarkNodeArgs) -> &Self {
        self.builder.borrow_mut().mark_node(self.output, args);
        self
    }

    pub fn invert(&self) -> Self {
        let output = self.builder.borrow_mut().gate(NodeKind::Not, &[self.output]);
        Self::from_output(self.builder.clone(), output)
    }

    /// Feeds this signal through an LED node and returns the LED's output.
    pub fn display(&self) -> Self {
        let output = self
            .builder
            .borrow_mut()
            .gate(NodeKind::SignalDisplay, &[self.output]);
        Self::from_output(self.builder.clone(), output)
    }

    /// Wires this output into an arbitrary input pin.
    pub fn drive(&self, input: PinId) {
        self.builder.borrow_mut().connect(self.output, input);
    }

    pub fn get_output(&self) -> Signal {
        self.builder.borrow().circuit.pin_value(self.output)
    }
}

pub mod ops {
    use crate::circuit_sim::NodeKind;

    use super::{BuilderHooks, Connector};

    pub use crate::{and, nand, nor, or, xnor, xor};

    macro_rules! gate_fn_gen {
        ( $gate_lowercase:ident, $gate_uppercase:ident ) => {
            pub fn $gate_lowercase<T: BuilderHooks>(inputs: Vec<&Connector<T>>) -> Connector<T> {
                Connector::gate_gen(NodeKind::$gate_uppercase, &inputs)
            }
        };
    }

    gate_fn_gen!(or, Or);
    gate_fn_gen!(nor, Nor);
    gate_fn_gen!(and, And);
    gate_fn_gen!(nand, Nand);
    gate_fn_gen!(xor, Xor);
    gate_fn_gen!(xnor, Xnor);

    #[macro_export]
    macro_rules! or {
        ( $( $inputs:expr ),+ ) => {
            or(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! nor {
        ( $( $inputs:expr ),+ ) => {
            nor(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! and {
        ( $( $inputs:expr ),+ ) => {
            and(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! nand {
        ( $( $inputs:expr ),+ ) => {
            nand(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! xor {
        ( $( $inputs:expr ),+ ) => {
            xor(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! xnor {
        ( $( $inputs:expr ),+ ) => {
            xnor(vec!($(&$inputs),+))
        };
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use super::{ops::*, CircuitBuilder, Connector};
    use crate::circuit_sim::NodeKind;
    use crate::engine::Engine;

    #[test]
    fn wide_gates_fold_into_two_input_trees() {
        let builder = Rc::new(RefCell::new(CircuitBuilder::default()));
        let (a, input_a) = Connector::input(builder.clone());
        let (b, input_b) = Connector::input(builder.clone());
        let (c, input_c) = Connector::input(builder.clone());
        let out = nand!(a, b, c);

        let kinds: Vec<NodeKind> = builder
            .borrow()
            .circuit
            .nodes()
            .map(|node| node.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Const,
                NodeKind::Const,
                NodeKind::Const,
                NodeKind::And,
                NodeKind::Nand
            ]
        );

        let mut engine = Engine::default();
        for input in 0..8u8 {
            let mut borrow = builder.borrow_mut();
            borrow.set_input(input_a, input & 1 != 0);
            borrow.set_input(input_b, input & 2 != 0);
            borrow.set_input(input_c, input & 4 != 0);
            let (circuit, _) = borrow.build();
            engine.step(circuit);
            drop(borrow);
            assert_eq!(out.get_output().is_high(), input != 7, "input {input:03b}");
        }
    }

    #[test]
    fn single_input_gates_pass_through_or_invert() {
        let builder = Rc::new(RefCell::new(CircuitBuilder::default()));
        let (a, input_a) = Connector::input(builder.clone());
        let same = and!(a);
        let inverted = nor!(a);
        let parity = xor!(a);
        assert_eq!(same.output, a.output);
        assert_eq!(parity.output, a.output);
        assert_eq!(builder.borrow().circuit.num_nodes(), 2);

        let mut engine = Engine::default();
        for val in [false, true] {
            let mut borrow = builder.borrow_mut();
            borrow.set_input(input_a, val);
            let (circuit, _) = borrow.build();
            engine.step(circuit);
            drop(borrow);
            assert_eq!(same.get_output().is_high(), val);
            assert_eq!(inverted.get_output().is_high(), !val);
        }
    }
}
