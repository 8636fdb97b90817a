use crate::error::{Error, Result};
use crate::painter::{AsciiShader, DEFAULT_PALETTE};
use crate::real::Precision;

/// Threads left for whoever draws the frames and reads the keyboard.
pub const RESERVED_THREADS: usize = 2;

pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(RESERVED_THREADS).max(1)
}

/// Start-up configuration. Fixed for the lifetime of an [`Explorer`].
///
/// [`Explorer`]: crate::Explorer
#[derive(Clone, Debug)]
pub struct Config {
    pub precision: Precision,
    pub zoom_factor: f64,
    pub pan_factor: f64,
    pub real: (f64, f64),
    pub imag: (f64, f64),
    pub iteration_cap: u32,
    pub workers: usize,
    pub batch_multiplier: usize,
    pub palette: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            zoom_factor: 0.9,
            pan_factor: 0.06,
            real: (-3.0, 3.0),
            imag: (-2.0, 2.0),
            iteration_cap: 50,
            workers: default_workers(),
            batch_multiplier: 2,
            palette: DEFAULT_PALETTE.to_string(),
        }
    }
}

impl Config {
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_zoom_factor(mut self, factor: f64) -> Self {
        self.zoom_factor = factor;
        self
    }

    pub fn with_pan_factor(mut self, factor: f64) -> Self {
        self.pan_factor = factor;
        self
    }

    pub fn with_bounds(mut self, real: (f64, f64), imag: (f64, f64)) -> Self {
        self.real = real;
        self.imag = imag;
        self
    }

    pub fn with_iteration_cap(mut self, cap: u32) -> Self {
        self.iteration_cap = cap;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_batch_multiplier(mut self, multiplier: usize) -> Self {
        self.batch_multiplier = multiplier;
        self
    }

    pub fn with_palette(mut self, palette: &str) -> Self {
        self.palette = palette.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        unit_interval("zoom factor", self.zoom_factor)?;
        unit_interval("pan factor", self.pan_factor)?;
        ordered("real", self.real)?;
        ordered("imaginary", self.imag)?;
        if self.iteration_cap == 0 {
            return Err(Error::invalid_argument("iteration cap must be positive"));
        }
        if self.workers == 0 {
            return Err(Error::invalid_argument("need at least one worker"));
        }
        if self.batch_multiplier == 0 {
            return Err(Error::invalid_argument("batch multiplier must be at least 1"));
        }
        AsciiShader::new(&self.palette)?;
        Ok(())
    }
}

fn unit_interval(name: &str, v: f64) -> Result<()> {
    if v > 0.0 && v < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "{} must lie strictly between 0 and 1, got {}",
            name, v
        )))
    }
}

fn ordered(name: &str, (min, max): (f64, f64)) -> Result<()> {
    if min.is_finite() && max.is_finite() && max > min {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "{} bounds must be finite with max > min, got [{}, {}]",
            name, min, max
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert!(config.workers >= 1);
        assert_eq!(config.precision.bits(), 1661);
    }

    #[test]
    fn test_rejects_bad_factors() {
        for f in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(Config::default().with_zoom_factor(f).validate().is_err());
            assert!(Config::default().with_pan_factor(f).validate().is_err());
        }
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = Config::default().with_bounds((1.0, -1.0), (-1.0, 1.0));
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
        let config = Config::default().with_bounds((-1.0, 1.0), (0.5, 0.5));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_counts() {
        assert!(Config::default().with_iteration_cap(0).validate().is_err());
        assert!(Config::default().with_workers(0).validate().is_err());
        assert!(Config::default().with_batch_multiplier(0).validate().is_err());
    }

    #[test]
    fn test_rejects_empty_palette() {
        assert!(Config::default().with_palette("").validate().is_err());
    }
}
