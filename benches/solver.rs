use asciibrot::bench::{Benchmark, BenchmarkReport};
use asciibrot::solver::{EscapeTime, Solver};
use asciibrot::Precision;

const CAP: u32 = 200;

/// One inside point and one slow escaper near the boundary.
fn bench_precision(digits: usize, repeats: usize) -> Benchmark {
    let precision = Precision::from_digits(digits).expect("valid precision");
    let solver = EscapeTime::new(precision);
    let points = [
        (precision.parse("-0.5").unwrap(), precision.parse("0").unwrap()),
        (
            precision.parse("-0.7436438870371587").unwrap(),
            precision.parse("0.1318259042053119").unwrap(),
        ),
    ];
    let cells = points.len();
    Benchmark::iter(&format!("escape-time-{}-digits", digits), repeats, move || {
        for (real, imag) in &points {
            solver.calculate_point(real, imag, CAP);
        }
    })
    .cells(cells)
}

fn main() {
    BenchmarkReport::with_benches(vec![
        bench_precision(16, 50),
        bench_precision(50, 50),
        bench_precision(100, 20),
        bench_precision(500, 10),
        bench_precision(1000, 5),
    ])
    .report("solver");
}
