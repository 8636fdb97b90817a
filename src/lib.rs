#![allow(clippy::new_without_default)]
//! Escape-time fractal renderer that draws into a grid of ASCII characters.
//!
//! Points are evaluated on arbitrary precision reals, spread over a pool of
//! worker threads, and published one whole frame at a time.

pub mod bench;
pub mod config;
pub mod coord;
pub mod error;
pub mod explorer;
pub mod painter;
pub mod real;
pub mod solver;
pub mod threads;

pub use config::Config;
pub use coord::{Direction, Viewport};
pub use error::{Error, Result};
pub use explorer::{Command, Explorer, Frame, Status};
pub use real::{Precision, Real};
