use std::str::FromStr;

use log::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::real::{self, Precision, Real};

#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    pub min: Real,
    pub max: Real,
}

impl Axis {
    pub fn new(min: Real, max: Real) -> Self {
        Self { min, max }
    }

    pub fn around(center: &Real, extent: &Real) -> Self {
        let half = extent / 2u32;
        Self::new(center - &half, center + &half)
    }

    pub fn length(&self) -> Real {
        &self.max - &self.min
    }

    pub fn center(&self) -> Real {
        (&self.max + &self.min) / 2u32
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(Error::invalid_argument(format!("unknown direction '{}'", s))),
        }
    }
}

/// The part of a [`Viewport`] a render needs, detached from later mutations.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub real: Axis,
    pub imag: Axis,
    pub width: Real,
    pub height: Real,
}

/// The visible rectangle of the plane and the point it zooms around.
///
/// The box is always rebuilt from the focus and the stored extents, so the
/// focus stays the midpoint through every mutation and re-centering on the
/// current focus reproduces the bounds bit for bit.
#[derive(Clone, Debug)]
pub struct Viewport {
    precision: Precision,
    real: Axis,
    imag: Axis,
    width: Real,
    height: Real,
    focus_real: Real,
    focus_imag: Real,
    zoom_factor: Real,
    zoom_out_factor: Real,
    pan_factor: Real,
    iteration_cap: u32,
}

impl Viewport {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let p = config.precision;
        let real = Axis::new(p.real(config.real.0)?, p.real(config.real.1)?);
        let imag = Axis::new(p.real(config.imag.0)?, p.real(config.imag.1)?);
        let zoom_factor = p.real(config.zoom_factor)?;
        // grows by as much as zoom_factor shrinks
        let zoom_out_factor = p.int(2) - &zoom_factor;

        let mut this = Self {
            precision: p,
            width: real.length(),
            height: imag.length(),
            focus_real: real.center(),
            focus_imag: imag.center(),
            real,
            imag,
            zoom_factor,
            zoom_out_factor,
            pan_factor: p.real(config.pan_factor)?,
            iteration_cap: config.iteration_cap,
        };
        this.recenter();
        Ok(this)
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn real(&self) -> &Axis {
        &self.real
    }

    pub fn imag(&self) -> &Axis {
        &self.imag
    }

    pub fn width(&self) -> &Real {
        &self.width
    }

    pub fn height(&self) -> &Real {
        &self.height
    }

    pub fn focus(&self) -> (&Real, &Real) {
        (&self.focus_real, &self.focus_imag)
    }

    pub fn iteration_cap(&self) -> u32 {
        self.iteration_cap
    }

    pub fn translation_x(&self) -> Real {
        &self.width * &self.pan_factor
    }

    pub fn translation_y(&self) -> Real {
        &self.height * &self.pan_factor
    }

    pub fn pan(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.focus_imag = &self.focus_imag - &self.translation_y(),
            Direction::Down => self.focus_imag = &self.focus_imag + &self.translation_y(),
            Direction::Left => self.focus_real = &self.focus_real - &self.translation_x(),
            Direction::Right => self.focus_real = &self.focus_real + &self.translation_x(),
        }
        self.recenter();
        debug!("pan {:?}", direction);
    }

    pub fn zoom_in(&mut self) {
        let factor = self.zoom_factor.clone();
        self.rescale(&factor);
        debug!("zoom in, width {:e}", real::to_f64(&self.width));
    }

    pub fn zoom_out(&mut self) {
        let factor = self.zoom_out_factor.clone();
        self.rescale(&factor);
        debug!("zoom out, width {:e}", real::to_f64(&self.width));
    }

    /// Re-center on decimal text. An empty component keeps the current
    /// focus on that axis.
    pub fn center_on(&mut self, real: &str, imag: &str) -> Result<()> {
        let real = self.parse_or_keep(real, &self.focus_real)?;
        let imag = self.parse_or_keep(imag, &self.focus_imag)?;
        self.center_on_point(real, imag)
    }

    pub fn center_on_point(&mut self, real: Real, imag: Real) -> Result<()> {
        if !real::is_finite(&real) || !real::is_finite(&imag) {
            return Err(Error::invalid_argument("focus must be a finite point"));
        }
        self.focus_real = self.precision.fix(real);
        self.focus_imag = self.precision.fix(imag);
        self.recenter();
        Ok(())
    }

    pub fn set_iteration_cap(&mut self, n: i64) -> Result<()> {
        if n <= 0 {
            return Err(Error::invalid_argument(format!(
                "iteration cap must be positive, got {}",
                n
            )));
        }
        self.iteration_cap = u32::try_from(n).map_err(|_| {
            Error::invalid_argument(format!("iteration cap {} is too large", n))
        })?;
        Ok(())
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            real: self.real.clone(),
            imag: self.imag.clone(),
            width: self.width.clone(),
            height: self.height.clone(),
        }
    }

    fn parse_or_keep(&self, text: &str, current: &Real) -> Result<Real> {
        if text.trim().is_empty() {
            Ok(current.clone())
        } else {
            self.precision.parse(text)
        }
    }

    fn rescale(&mut self, factor: &Real) {
        self.width = &self.width * factor;
        self.height = &self.height * factor;
        self.recenter();
    }

    fn recenter(&mut self) {
        self.real = Axis::around(&self.focus_real, &self.width);
        self.imag = Axis::around(&self.focus_imag, &self.height);
    }
}

/// Maps flat raster indices onto the plane for one render.
///
/// Row 0 is the top of the raster and sits on `imag.min`.
#[derive(Clone, Debug)]
pub struct PlaneMapping {
    columns: usize,
    rows: usize,
    real_min: Real,
    imag_min: Real,
    real_step: Real,
    imag_step: Real,
}

impl PlaneMapping {
    pub fn new(geometry: &Geometry, columns: usize, rows: usize) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(Error::EmptyRaster { columns, rows });
        }
        Ok(Self {
            columns,
            rows,
            real_min: geometry.real.min.clone(),
            imag_min: geometry.imag.min.clone(),
            real_step: &geometry.width / columns,
            imag_step: &geometry.height / rows,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    pub fn point(&self, index: usize) -> (Real, Real) {
        let column = index % self.columns;
        let row = index / self.columns;
        (
            &self.real_min + &self.real_step * column,
            &self.imag_min + &self.imag_step * row,
        )
    }
}
