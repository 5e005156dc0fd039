use std::{cell::RefCell, rc::Rc};

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{RngCore, SeedableRng};

use circuitsim::{
    circuit_builder::{self, CircuitBuilder, NoHooks},
    circuit_sim::*,
    components::adder::RippleCarryAdder,
    Circuit, Engine,
};

type Connector = circuit_builder::Connector<NoHooks>;

pub fn adder_bench<const BITS: usize>(c: &mut Criterion) {
    if BITS > 16 {
        panic!("Too large an adder!")
    };
    let name = format!("{BITS}-bit adder");
    let builder = Rc::new(RefCell::new(CircuitBuilder::default()));
    let rca = RippleCarryAdder::<BITS>::new(builder.clone(), Connector::new(builder.clone()));
    let mut borrow = builder.borrow_mut();
    let (circuit, _) = borrow.build();
    let mut engine = Engine::default();
    c.bench_function(&name, |b| {
        let mut rng = rand::rngs::StdRng::from_entropy();
        let mask = (1u64 << BITS) - 1;
        b.iter_batched(
            move || rng.next_u64(),
            |input| {
                rca.input_a.set(circuit, input & mask);
                rca.input_b.set(circuit, (input >> 32) & mask);
                engine.step(circuit)
            },
            criterion::BatchSize::SmallInput,
        )
    });
    println!("ticks: {}", engine.tick());
}

fn adder_benches(c: &mut Criterion) {
    adder_bench::<8>(c);
    adder_bench::<16>(c);
}

fn inverter_chain_bench(c: &mut Criterion) {
    let mut circuit = Circuit::new();
    let source = circuit.add_node(NodeKind::Clock);
    circuit.set_node_param(source, CLOCK_PERIOD, 2u64);
    let mut prev = circuit.output_pin(source, 0);
    for _ in 0..64 {
        let not = circuit.add_node(NodeKind::Not);
        if let (Some(from), Some(to)) = (prev, circuit.input_pin(not, 0)) {
            circuit.connect(from, to, None);
        }
        prev = circuit.output_pin(not, 0);
    }
    println!("{}", circuit.num_nodes());

    let mut engine = Engine::default();
    c.bench_function("64 inverter chain tick", |b| {
        b.iter(|| engine.step(&mut circuit))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = adder_benches, inverter_chain_bench
}
criterion_main!(benches);
