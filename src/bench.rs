//! A small timing harness for the `benches/` targets.

use std::fs;
use std::io::{self, stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct Benchmark {
    f: Rc<dyn Fn()>,
    name: String,
    iterations: usize,
    cells: Option<usize>,
}

pub enum Unit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
}

impl Unit {
    pub fn format(&self, d: &Duration, width: usize) -> String {
        let (symbol, value) = match self {
            Self::Nanosecond => ("ns", d.as_nanos()),
            Self::Microsecond => ("us", d.as_micros()),
            Self::Millisecond => ("ms", d.as_millis()),
            Self::Second => ("s", d.as_secs() as u128),
        };
        format!("{:>width$}{:<2}", value, symbol)
    }

    pub fn scaled(d: &Duration, threshold: u128) -> Self {
        if d.as_nanos() < threshold {
            Self::Nanosecond
        } else if d.as_micros() < threshold {
            Self::Microsecond
        } else if d.as_millis() < threshold {
            Self::Millisecond
        } else {
            Self::Second
        }
    }
}

impl Benchmark {
    pub fn iter<F: Fn() + 'static>(name: &str, n: usize, f: F) -> Self {
        Self {
            f: Rc::new(f),
            name: name.to_string(),
            iterations: n.max(1),
            cells: None,
        }
    }

    pub fn once<F: Fn() + 'static>(name: &str, f: F) -> Self {
        Self::iter(name, 1, f)
    }

    /// Report throughput as cells per second, `cells` per call.
    pub fn cells(mut self, cells: usize) -> Self {
        self.cells = Some(cells);
        self
    }

    fn run(&self) -> Duration {
        let start = Instant::now();
        for _ in 0..self.iterations {
            (self.f)();
        }
        start.elapsed()
    }
}

struct Measurement {
    name: String,
    iterations: usize,
    cells: Option<usize>,
    total: Duration,
}

impl Measurement {
    fn per_call(&self) -> Duration {
        self.total.div_f64(self.iterations as f64)
    }

    fn cells_per_second(&self) -> Option<f64> {
        let secs = self.per_call().as_secs_f64();
        self.cells
            .filter(|_| secs > 0.0)
            .map(|cells| cells as f64 / secs)
    }
}

pub struct BenchmarkReport {
    benches: Vec<Benchmark>,
    results: Vec<Measurement>,
}

impl BenchmarkReport {
    pub fn new() -> Self {
        Self {
            benches: vec![],
            results: vec![],
        }
    }

    pub fn add_bench(&mut self, bench: Benchmark) {
        self.benches.push(bench);
    }

    pub fn with_benches(benches: Vec<Benchmark>) -> Self {
        let mut this = Self::new();
        for bench in benches {
            this.add_bench(bench);
        }
        this
    }

    pub fn run(&mut self) {
        for bench in &self.benches {
            let total = bench.run();
            self.results.push(Measurement {
                name: bench.name.clone(),
                iterations: bench.iterations,
                cells: bench.cells,
                total,
            });
            print!(".");
            let _ = stdout().flush();
        }
        println!();
    }

    pub fn show(&self) {
        println!(
            "  {: <34} {: >8}   {: >8}   {: >12}",
            "benchmark", "total", "per_call", "cells/s"
        );
        for m in &self.results {
            let per_call = m.per_call();
            let throughput = m
                .cells_per_second()
                .map(|c| format!("{:.0}", c))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {: <34} {}   {}   {: >12}",
                m.name,
                Unit::scaled(&m.total, 100000).format(&m.total, 6),
                Unit::scaled(&per_call, 100000).format(&per_call, 6),
                throughput,
            )
        }
    }

    pub fn write_csv(&self, filename: &str) -> io::Result<()> {
        let mut lines = vec!["benchmark,total_us,iterations,per_call_us,cells_per_s".to_string()];
        for m in &self.results {
            lines.push(format!(
                "{},{},{},{},{}",
                m.name,
                m.total.as_micros(),
                m.iterations,
                m.per_call().as_micros(),
                m.cells_per_second()
                    .map(|c| format!("{:.0}", c))
                    .unwrap_or_default(),
            ));
        }
        lines.push(String::new());
        fs::write(filename, lines.join("\n"))
    }

    pub fn report(&mut self, name: &str) {
        print!("Benchmark: {} ", name);
        self.run();
        self.show();
        let filename = format!("benchmark_{}.csv", name);
        if let Err(e) = self.write_csv(&filename) {
            eprintln!("could not write {}: {}", filename, e);
        }
    }
}
