//! Parallel rendering: partitioning the raster, a pool of workers draining
//! a shared queue, and the barrier that publishes each finished frame.

pub mod barrier;
pub mod buffers;
pub mod partition;
pub mod pool;

pub use barrier::{FrameBarrier, Phase};
pub use buffers::{FrameBuffers, UNRENDERED};
pub use partition::{partition, WorkUnit};
pub use pool::{Job, WorkerPool};
