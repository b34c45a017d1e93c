use std::{fmt::Write, hint::black_box};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use statespice_core::{AnalysisConfig, Circuit, NumericCircuit, SwitchConfig, SymbolicCircuit};
use statespice_netlist::{Netlist, parse};

const SECTIONS: [usize; 4] = [4, 16, 32, 64];
const SYMBOLIC_SECTIONS: [usize; 3] = [2, 3, 4];

/// `V1` driving `sections` series-R / shunt-C stages.
fn rc_ladder(sections: usize, symbolic: bool) -> Netlist {
    let mut src = String::from("V1,n0,0,1\n");
    for k in 1..=sections {
        if symbolic {
            writeln!(src, "R{k},n{},n{k},R{k}", k - 1).unwrap();
            writeln!(src, "C{k},n{k},0,C{k}").unwrap();
        } else {
            writeln!(src, "R{k},n{},n{k},1k", k - 1).unwrap();
            writeln!(src, "C{k},n{k},0,1u").unwrap();
        }
    }
    parse(&src).unwrap_or_else(|e| panic!("ladder with {sections} sections: {e}"))
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("mna/assemble");
    let config = AnalysisConfig::default();
    let switches = SwitchConfig::new();

    for sections in SECTIONS {
        let netlist = rc_ladder(sections, false);
        group.throughput(Throughput::Elements(netlist.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &netlist, |b, netlist| {
            b.iter(|| {
                let circuit: NumericCircuit =
                    Circuit::assemble(netlist, &switches, &config).expect("assemble");
                black_box(circuit);
            });
        });
    }

    group.finish();
}

fn bench_reduce_numeric(c: &mut Criterion) {
    let mut group = c.benchmark_group("mna/reduce");
    let config = AnalysisConfig::default();

    for sections in SECTIONS {
        let netlist = rc_ladder(sections, false);
        let circuit: NumericCircuit =
            Circuit::assemble(&netlist, &SwitchConfig::new(), &config).expect("assemble");
        group.throughput(Throughput::Elements(circuit.system().dim() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &circuit, |b, circuit| {
            b.iter(|| {
                let model = circuit.state_space(&config).expect("reduce");
                black_box(model);
            });
        });
    }

    group.finish();
}

fn bench_reduce_symbolic(c: &mut Criterion) {
    let mut group = c.benchmark_group("mna/reduce_symbolic");
    group.sample_size(10);
    let config = AnalysisConfig::default();

    for sections in SYMBOLIC_SECTIONS {
        let netlist = rc_ladder(sections, true);
        let circuit: SymbolicCircuit =
            Circuit::assemble(&netlist, &SwitchConfig::new(), &config).expect("assemble");
        group.bench_with_input(BenchmarkId::from_parameter(sections), &circuit, |b, circuit| {
            b.iter(|| {
                let model = circuit.state_space(&config).expect("reduce");
                black_box(model);
            });
        });
    }

    group.finish();
}

criterion_group!(
    reduce,
    bench_assemble,
    bench_reduce_numeric,
    bench_reduce_symbolic
);
criterion_main!(reduce);
