use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, trace, warn};

use crate::coord::PlaneMapping;
use crate::error::{Error, Result};
use crate::painter::Shader;
use crate::solver::Solver;
use crate::threads::barrier::{FrameBarrier, Phase};
use crate::threads::buffers::FrameBuffers;
use crate::threads::partition::WorkUnit;

/// Everything a worker needs to fill its units for one generation.
pub struct Job {
    pub mapping: PlaneMapping,
    pub iteration_cap: u32,
    pub buffers: Arc<FrameBuffers>,
}

struct Batch {
    generation: u64,
    job: Job,
}

type Task = (WorkUnit, Arc<Batch>);

struct Shared {
    queue: Mutex<VecDeque<Task>>,
    available: Condvar,
    terminate: AtomicBool,
    barrier: FrameBarrier,
    solver: Box<dyn Solver>,
    shader: Box<dyn Shader>,
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until there is a task, or returns None once terminated.
    fn next_task(&self) -> Option<Task> {
        let mut queue = self.lock_queue();
        loop {
            if self.terminate.load(Ordering::Acquire) {
                return None;
            }
            if let Some(task) = queue.pop_front() {
                return Some(task);
            }
            queue = self
                .available
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// False if the unit was abandoned because the pool is stopping.
    fn run_unit(&self, unit: WorkUnit, job: &Job) -> bool {
        for index in unit.range() {
            if self.terminate.load(Ordering::Relaxed) {
                return false;
            }
            let (real, imag) = job.mapping.point(index);
            let iterations = self
                .solver
                .calculate_point(&real, &imag, job.iteration_cap);
            job.buffers
                .write(index, self.shader.shade(iterations, job.iteration_cap));
        }
        true
    }
}

fn work(shared: Arc<Shared>) {
    while let Some((unit, batch)) = shared.next_task() {
        if !shared.run_unit(unit, &batch.job) {
            break;
        }
        if shared.barrier.complete_unit() {
            let buffers = &batch.job.buffers;
            if shared.barrier.publish(batch.generation, || buffers.swap()) {
                debug!("published generation {}", batch.generation);
            }
        }
    }
    trace!("worker {:?} exiting", thread::current().name());
}

/// A fixed set of threads draining one FIFO of work units.
pub struct WorkerPool {
    size: usize,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new<S, P>(size: usize, solver: S, shader: P) -> Result<Self>
    where
        S: Solver + 'static,
        P: Shader + 'static,
    {
        if size == 0 {
            return Err(Error::invalid_argument("need at least one worker"));
        }
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            terminate: AtomicBool::new(false),
            barrier: FrameBarrier::new(),
            solver: Box::new(solver),
            shader: Box::new(shader),
        });
        let mut this = Self {
            size,
            shared,
            workers: vec![],
        };
        this.start()?;
        Ok(this)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.shared.barrier.phase()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.shared.terminate.store(false, Ordering::Release);
        for n in 0..self.size {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("asciibrot-worker-{}", n))
                .spawn(move || work(shared));
            match spawned {
                Ok(handle) => self.workers.push(handle),
                Err(e) => {
                    warn!("could not spawn worker {}: {}", n, e);
                    self.stop();
                    return Err(e.into());
                }
            }
        }
        debug!("started {} workers", self.size);
        Ok(())
    }

    /// Terminate and join every worker, dropping queued and in-flight work.
    pub fn stop(&mut self) {
        {
            let _queue = self.shared.lock_queue();
            self.shared.terminate.store(true, Ordering::Release);
        }
        self.shared.available.notify_all();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker panicked");
            }
        }
        self.shared.lock_queue().clear();
        self.shared.barrier.cancel();
        debug!("stopped workers");
    }

    pub fn restart(&mut self) -> Result<()> {
        self.stop();
        self.start()
    }

    /// Queue `units` as a new generation and wake the workers.
    pub fn dispatch(&self, units: &[WorkUnit], job: Job) -> Result<u64> {
        if !self.is_running() {
            return Err(Error::invalid_state("worker pool is stopped"));
        }
        let generation = self.shared.barrier.begin(units.len())?;
        let batch = Arc::new(Batch { generation, job });
        self.shared
            .lock_queue()
            .extend(units.iter().map(|unit| (*unit, Arc::clone(&batch))));
        self.shared.available.notify_all();
        debug!("dispatched generation {} as {} units", generation, units.len());
        Ok(generation)
    }

    pub fn wait(&self, generation: u64) -> Result<()> {
        self.shared.barrier.wait(generation)
    }

    pub fn poll(&self, generation: u64) -> Result<bool> {
        self.shared.barrier.poll(generation)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::config::Config;
    use crate::coord::Viewport;
    use crate::painter::AsciiShader;
    use crate::real::{Precision, Real};
    use crate::threads::buffers::UNRENDERED;
    use crate::threads::partition::partition;

    /// Sleeps, counts its calls and reports one iteration short of the cap.
    struct Slow {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl Solver for Slow {
        fn calculate_point(&self, _real: &Real, _imag: &Real, cap: u32) -> u32 {
            thread::sleep(self.delay);
            self.calls.fetch_add(1, Ordering::SeqCst);
            cap - 1
        }
    }

    fn job(columns: usize, rows: usize) -> Job {
        let config = Config::default()
            .with_precision(Precision::from_bits(64).unwrap())
            .with_workers(1);
        let viewport = Viewport::new(&config).unwrap();
        Job {
            mapping: PlaneMapping::new(&viewport.geometry(), columns, rows).unwrap(),
            iteration_cap: 2,
            buffers: Arc::new(FrameBuffers::new(columns, rows, UNRENDERED)),
        }
    }

    fn slow_pool(workers: usize, delay: Duration) -> (WorkerPool, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let solver = Slow {
            calls: Arc::clone(&calls),
            delay,
        };
        let shader = AsciiShader::new("ab").unwrap();
        (WorkerPool::new(workers, solver, shader).unwrap(), calls)
    }

    #[test]
    fn test_dispatch_and_wait() {
        let (pool, calls) = slow_pool(3, Duration::from_micros(200));
        let job = job(10, 5);
        let buffers = Arc::clone(&job.buffers);
        let units = partition(50, 3, 2).unwrap();

        let generation = pool.dispatch(&units, job).unwrap();
        pool.wait(generation).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 50);
        // cap - 1 = 1 iteration, second palette entry
        assert_eq!(buffers.snapshot(), vec![b'b'; 50]);
        assert_eq!(pool.phase(), Phase::Idle);
    }

    #[test]
    fn test_dispatch_rejected_while_in_flight() {
        let (pool, _) = slow_pool(1, Duration::from_millis(5));
        let units = partition(20, 1, 1).unwrap();
        let generation = pool.dispatch(&units, job(4, 5)).unwrap();
        assert!(matches!(
            pool.dispatch(&units, job(4, 5)),
            Err(Error::InvalidState(_))
        ));
        pool.wait(generation).unwrap();
        let generation = pool.dispatch(&units, job(4, 5)).unwrap();
        pool.wait(generation).unwrap();
    }

    #[test]
    fn test_poll() {
        let (pool, _) = slow_pool(2, Duration::from_millis(1));
        let units = partition(40, 2, 2).unwrap();
        let generation = pool.dispatch(&units, job(8, 5)).unwrap();
        while !pool.poll(generation).unwrap() {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(pool.phase(), Phase::Idle);
    }

    #[test]
    fn test_stop_abandons_generation() {
        let (mut pool, calls) = slow_pool(2, Duration::from_millis(5));
        let job = job(20, 20);
        let buffers = Arc::clone(&job.buffers);
        let units = partition(400, 2, 2).unwrap();
        let generation = pool.dispatch(&units, job).unwrap();

        pool.stop();
        assert!(!pool.is_running());
        assert!(calls.load(Ordering::SeqCst) < 400);
        assert!(pool.wait(generation).is_err());
        assert!(buffers.snapshot().iter().all(|&b| b == UNRENDERED));
        assert!(pool.dispatch(&units, self::job(20, 20)).is_err());

        pool.start().unwrap();
        let generation = pool.dispatch(&[WorkUnit::new(0, 4)], self::job(2, 2)).unwrap();
        pool.wait(generation).unwrap();
    }

    #[test]
    fn test_stop_interrupts_unit_between_cells() {
        let workers = 2;
        let (mut pool, calls) = slow_pool(workers, Duration::from_millis(5));
        // one long unit per worker, so only the per-cell check can stop them early
        let units = [WorkUnit::new(0, 200), WorkUnit::new(200, 400)];
        pool.dispatch(&units, job(20, 20)).unwrap();
        thread::sleep(Duration::from_millis(30));

        let before = calls.load(Ordering::SeqCst);
        pool.stop();
        let after = calls.load(Ordering::SeqCst);

        // each worker finishes the cell it is on, plus one it may have
        // started just before the flag was set
        assert!(
            after <= before + 2 * workers,
            "{} cells evaluated after stop, {} before",
            after - before,
            before
        );
        assert!(after < 100, "{}", after);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let shader = AsciiShader::default();
        let solver = crate::solver::EscapeTime::new(Precision::from_bits(64).unwrap());
        assert!(matches!(
            WorkerPool::new(0, solver, shader),
            Err(Error::InvalidArgument(_))
        ));
    }
}
