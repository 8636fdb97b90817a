use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info};

use crate::config::Config;
use crate::coord::{Axis, Direction, PlaneMapping, Viewport};
use crate::error::{Error, Result};
use crate::painter::AsciiShader;
use crate::real::{self, Precision, Real};
use crate::solver::{EscapeTime, Solver};
use crate::threads::{partition, FrameBuffers, Job, WorkUnit, WorkerPool, UNRENDERED};

/// Significant digits shown in status lines.
const STATUS_DIGITS: usize = 24;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Pan(Direction),
    ZoomIn,
    ZoomOut,
    /// Empty text keeps the current coordinate.
    Center { real: String, imag: String },
    IterationCap(i64),
    Resize { columns: usize, rows: usize },
}

fn arity(keyword: &str, args: &[&str], n: usize) -> Result<()> {
    if args.len() == n {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "'{}' takes {} argument(s), got {}",
            keyword,
            n,
            args.len()
        )))
    }
}

fn parse_count<T: FromStr>(what: &str, text: &str) -> Result<T> {
    text.parse()
        .map_err(|_| Error::invalid_argument(format!("{} '{}' is not a whole number", what, text)))
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut words = s.split_whitespace();
        let keyword = words
            .next()
            .ok_or_else(|| Error::invalid_argument("empty command"))?
            .to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        match keyword.as_str() {
            "up" | "down" | "left" | "right" => {
                arity(&keyword, &args, 0)?;
                Ok(Self::Pan(keyword.parse()?))
            }
            "in" | "zoom-in" => {
                arity(&keyword, &args, 0)?;
                Ok(Self::ZoomIn)
            }
            "out" | "zoom-out" => {
                arity(&keyword, &args, 0)?;
                Ok(Self::ZoomOut)
            }
            "center" => {
                arity(&keyword, &args, 2)?;
                let keep = |t: &str| if t == "_" { String::new() } else { t.to_string() };
                Ok(Self::Center {
                    real: keep(args[0]),
                    imag: keep(args[1]),
                })
            }
            "iter" => {
                arity(&keyword, &args, 1)?;
                Ok(Self::IterationCap(parse_count("iteration cap", args[0])?))
            }
            "resize" => {
                arity(&keyword, &args, 2)?;
                Ok(Self::Resize {
                    columns: parse_count("column count", args[0])?,
                    rows: parse_count("row count", args[1])?,
                })
            }
            _ => Err(Error::invalid_argument(format!("unknown command '{}'", keyword))),
        }
    }
}

/// A published raster of shade characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub columns: usize,
    pub rows: usize,
    pub generation: u64,
    pub cells: Vec<u8>,
}

impl Frame {
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.columns)
    }

    pub fn get(&self, column: usize, row: usize) -> Option<u8> {
        if column < self.columns && row < self.rows {
            Some(self.cells[row * self.columns + column])
        } else {
            None
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{}", String::from_utf8_lossy(row))?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Status {
    pub real: Axis,
    pub imag: Axis,
    pub width: Real,
    pub height: Real,
    pub focus: (Real, Real),
    pub iteration_cap: u32,
    pub precision: Precision,
    pub columns: usize,
    pub rows: usize,
    pub generation: Option<u64>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = STATUS_DIGITS.min(self.precision.digits());
        let d = |v: &Real| real::to_decimal(v, digits);
        writeln!(
            f,
            "real [{}, {}]  imag [{}, {}]",
            d(&self.real.min),
            d(&self.real.max),
            d(&self.imag.min),
            d(&self.imag.max)
        )?;
        writeln!(
            f,
            "focus ({}, {})  extent {} x {}",
            d(&self.focus.0),
            d(&self.focus.1),
            d(&self.width),
            d(&self.height)
        )?;
        write!(
            f,
            "cap {}  precision {} bits  raster {}x{}",
            self.iteration_cap,
            self.precision.bits(),
            self.columns,
            self.rows
        )?;
        if let Some(generation) = self.generation {
            write!(f, "  generation {}", generation)?;
        }
        Ok(())
    }
}

/// Owns the viewport, the worker pool and the frame buffers, and turns
/// commands into published frames.
///
/// Every mutating call renders once and blocks until the frame is
/// published. [`render`](Self::render) with [`poll`](Self::poll) or
/// [`wait`](Self::wait) is the non-blocking alternative.
pub struct Explorer {
    batch_multiplier: usize,
    viewport: Viewport,
    pool: WorkerPool,
    buffers: Arc<FrameBuffers>,
    units: Vec<WorkUnit>,
    columns: usize,
    rows: usize,
    in_flight: Option<u64>,
    published: Option<u64>,
}

impl Explorer {
    pub fn new(config: Config, columns: usize, rows: usize) -> Result<Self> {
        let solver = EscapeTime::new(config.precision);
        Self::with_solver(config, columns, rows, solver)
    }

    pub fn with_solver<S>(config: Config, columns: usize, rows: usize, solver: S) -> Result<Self>
    where
        S: Solver + 'static,
    {
        if columns == 0 || rows == 0 {
            return Err(Error::EmptyRaster { columns, rows });
        }
        let viewport = Viewport::new(&config)?;
        let shader = AsciiShader::new(&config.palette)?;
        let units = partition(columns * rows, config.workers, config.batch_multiplier)?;
        let pool = WorkerPool::new(config.workers, solver, shader)?;
        info!(
            "{}x{} raster, {} workers, {} units, {} bits",
            columns,
            rows,
            pool.size(),
            units.len(),
            config.precision.bits()
        );
        Ok(Self {
            batch_multiplier: config.batch_multiplier,
            viewport,
            pool,
            buffers: Arc::new(FrameBuffers::new(columns, rows, UNRENDERED)),
            units,
            columns,
            rows,
            in_flight: None,
            published: None,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    pub fn is_rendering(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Dispatch a render of the current viewport without waiting for it.
    pub fn render(&mut self) -> Result<u64> {
        self.ensure_idle()?;
        let job = Job {
            mapping: PlaneMapping::new(&self.viewport.geometry(), self.columns, self.rows)?,
            iteration_cap: self.viewport.iteration_cap(),
            buffers: Arc::clone(&self.buffers),
        };
        let generation = self.pool.dispatch(&self.units, job)?;
        self.in_flight = Some(generation);
        Ok(generation)
    }

    /// Block until the in-flight render is published.
    pub fn wait(&mut self) -> Result<Frame> {
        let generation = self
            .in_flight
            .ok_or_else(|| Error::invalid_state("no render in flight"))?;
        let waited = self.pool.wait(generation);
        self.in_flight = None;
        waited?;
        Ok(self.publish(generation))
    }

    /// The frame of the in-flight render if it has been published.
    pub fn poll(&mut self) -> Result<Option<Frame>> {
        let generation = match self.in_flight {
            Some(generation) => generation,
            None => return Ok(None),
        };
        match self.pool.poll(generation) {
            Ok(true) => {
                self.in_flight = None;
                Ok(Some(self.publish(generation)))
            }
            Ok(false) => Ok(None),
            Err(e) => {
                self.in_flight = None;
                Err(e)
            }
        }
    }

    pub fn render_and_wait(&mut self) -> Result<Frame> {
        self.render()?;
        self.wait()
    }

    /// The last published frame, if any.
    pub fn frame(&self) -> Option<Frame> {
        self.published.map(|generation| self.snapshot(generation))
    }

    pub fn pan(&mut self, direction: Direction) -> Result<Frame> {
        self.ensure_idle()?;
        self.viewport.pan(direction);
        self.render_and_wait()
    }

    pub fn zoom_in(&mut self) -> Result<Frame> {
        self.ensure_idle()?;
        self.viewport.zoom_in();
        self.render_and_wait()
    }

    pub fn zoom_out(&mut self) -> Result<Frame> {
        self.ensure_idle()?;
        self.viewport.zoom_out();
        self.render_and_wait()
    }

    pub fn center_on(&mut self, real: &str, imag: &str) -> Result<Frame> {
        self.ensure_idle()?;
        self.viewport.center_on(real, imag)?;
        self.render_and_wait()
    }

    pub fn set_iteration_cap(&mut self, n: i64) -> Result<Frame> {
        self.ensure_idle()?;
        self.viewport.set_iteration_cap(n)?;
        self.render_and_wait()
    }

    /// Stop the pool, reallocate both buffers and repartition. Allowed while
    /// a render is in flight; that render is discarded.
    pub fn resize(&mut self, columns: usize, rows: usize) -> Result<Frame> {
        if columns == 0 || rows == 0 {
            return Err(Error::EmptyRaster { columns, rows });
        }
        let units = partition(columns * rows, self.pool.size(), self.batch_multiplier)?;

        self.pool.stop();
        if let Some(generation) = self.in_flight.take() {
            debug!("discarding generation {} for resize", generation);
        }
        self.buffers = Arc::new(FrameBuffers::new(columns, rows, UNRENDERED));
        self.units = units;
        self.columns = columns;
        self.rows = rows;
        self.published = None;
        self.pool.start()?;
        info!("resized to {}x{}, {} units", columns, rows, self.units.len());
        self.render_and_wait()
    }

    pub fn apply(&mut self, command: Command) -> Result<Frame> {
        debug!("applying {:?}", command);
        match command {
            Command::Pan(direction) => self.pan(direction),
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::Center { real, imag } => self.center_on(&real, &imag),
            Command::IterationCap(n) => self.set_iteration_cap(n),
            Command::Resize { columns, rows } => self.resize(columns, rows),
        }
    }

    pub fn status(&self) -> Status {
        let (focus_real, focus_imag) = self.viewport.focus();
        Status {
            real: self.viewport.real().clone(),
            imag: self.viewport.imag().clone(),
            width: self.viewport.width().clone(),
            height: self.viewport.height().clone(),
            focus: (focus_real.clone(), focus_imag.clone()),
            iteration_cap: self.viewport.iteration_cap(),
            precision: self.viewport.precision(),
            columns: self.columns,
            rows: self.rows,
            generation: self.published,
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.in_flight {
            Some(generation) => Err(Error::invalid_state(format!(
                "generation {} is still rendering",
                generation
            ))),
            None => Ok(()),
        }
    }

    fn publish(&mut self, generation: u64) -> Frame {
        self.published = Some(generation);
        self.snapshot(generation)
    }

    fn snapshot(&self, generation: u64) -> Frame {
        Frame {
            columns: self.columns,
            rows: self.rows,
            generation,
            cells: self.buffers.snapshot(),
        }
    }
}
