use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;

use griddock::atom::{AdType, XsType};
use griddock::ligand::Ligand;
use griddock::optimization::{bfgs, OptimizerParams};
use griddock::receptor::Receptor;
use griddock::scoring::ScoringFunction;
use griddock::Atom;

fn atom_line(serial: usize, x: f64, y: f64, z: f64, code: &str) -> String {
    format!(
        "ATOM  {serial:>5}  C   LIG A   1    {x:>8.3}{y:>8.3}{z:>8.3}  0.00  0.00    +0.000 {code:<2}"
    )
}

fn bench_ligand() -> Ligand {
    let text = format!(
        "ROOT\n{}\n{}\nENDROOT\nBRANCH   2   3\n{}\n{}\n{}\nENDBRANCH   2   3\nTORSDOF 1\n",
        atom_line(1, 0.0, 0.0, 0.0, "C"),
        atom_line(2, 1.5, 0.0, 0.0, "C"),
        atom_line(3, 2.25, 1.3, 0.0, "C"),
        atom_line(4, 3.75, 1.3, 0.0, "C"),
        atom_line(5, 4.5, 2.6, 0.0, "C"),
    );
    Ligand::from_reader(text.as_bytes(), "bench.pdbqt").unwrap()
}

fn bench_bfgs(c: &mut Criterion) {
    let ligand = bench_ligand();
    let sf = ScoringFunction::new();
    let mut rec = Receptor::new(Vector3::zeros(), Vector3::new(12.0, 12.0, 12.0), 0.5).unwrap();
    let probes = [
        Atom::new(1, Vector3::new(0.5, 0.0, 0.0), AdType::Carbon),
        Atom::new(2, Vector3::new(-1.0, 1.5, 0.5), AdType::AcceptorOxygen),
    ];
    rec.populate(&sf, &probes, &[XsType::CarbonHydrophobic]);

    let params = OptimizerParams {
        num_generations: 20,
        ..OptimizerParams::default()
    };

    c.bench_function("bfgs", |b| {
        b.iter(|| {
            let pose = bfgs(&ligand, &sf, &rec, black_box(42), &params);
            black_box(pose.energy)
        })
    });
}

criterion_group!(optimization_benches, bench_bfgs);
criterion_main!(optimization_benches);
