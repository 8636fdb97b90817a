use crate::real::{Precision, Real};

pub trait Solver: Send + Sync {
    /// Iterations taken before `z` leaves the radius-2 disc, or `cap` if it
    /// never does.
    fn calculate_point(&self, real: &Real, imag: &Real, cap: u32) -> u32;
}

/// Escape-time iteration of `z -> z^2 + c` at a fixed precision.
#[derive(Clone, Debug)]
pub struct EscapeTime {
    precision: Precision,
    bailout: Real,
}

impl EscapeTime {
    pub fn new(precision: Precision) -> Self {
        Self {
            precision,
            bailout: precision.int(4),
        }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }
}

impl Solver for EscapeTime {
    fn calculate_point(&self, real: &Real, imag: &Real, cap: u32) -> u32 {
        let mut zx = self.precision.zero();
        let mut zy = self.precision.zero();
        let mut xsqr = self.precision.zero();
        let mut ysqr = self.precision.zero();
        let mut iterations = 0;

        while iterations < cap && &xsqr + &ysqr < self.bailout {
            // 2xy + ci, folded as xy + xy
            zy = &zy * &zx;
            zy = &zy + &zy + imag;
            zx = &xsqr - &ysqr + real;
            xsqr = &zx * &zx;
            ysqr = &zy * &zy;
            iterations += 1;
        }
        iterations
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn solver() -> (EscapeTime, Precision) {
        let p = Precision::from_bits(128).unwrap();
        (EscapeTime::new(p), p)
    }

    fn iterations(x: f64, y: f64, cap: u32) -> u32 {
        let (solver, p) = solver();
        solver.calculate_point(&p.real(x).unwrap(), &p.real(y).unwrap(), cap)
    }

    #[test]
    fn test_origin_never_escapes() {
        assert_eq!(iterations(0.0, 0.0, 50), 50);
        assert_eq!(iterations(0.0, 0.0, 1), 1);
    }

    #[test]
    fn test_far_point_escapes_after_one_step() {
        assert_eq!(iterations(10.0, 10.0, 50), 1);
        assert_eq!(iterations(-3.0, -2.0, 50), 1);
    }

    #[test]
    fn test_inside_points() {
        assert_eq!(iterations(-0.5, 0.0, 200), 200);
        assert_eq!(iterations(-1.0, 0.0, 200), 200);
        assert_eq!(iterations(0.25, 0.0, 100), 100);
    }

    #[test]
    fn test_outside_points() {
        // c = 2: z runs 2, 6, ... so |z|^2 >= 4 after the first step
        assert_eq!(iterations(2.0, 0.0, 50), 1);
        // c = 1: z runs 1, 2, 5
        assert_eq!(iterations(1.0, 0.0, 50), 2);
        // c = i: cycles 0, i, -1+i, -i, ... and stays bounded
        assert_eq!(iterations(0.0, 1.0, 50), 50);
    }

    #[test]
    fn test_never_exceeds_cap() {
        for cap in [1, 2, 7, 50] {
            for (x, y) in [(0.3, 0.5), (-0.75, 0.1), (0.0, 0.0), (5.0, 0.0)] {
                let i = iterations(x, y, cap);
                assert!(i >= 1 && i <= cap, "{} for ({}, {}) at cap {}", i, x, y, cap);
            }
        }
    }

    #[test]
    fn test_zero_cap() {
        assert_eq!(iterations(10.0, 10.0, 0), 0);
    }
}
