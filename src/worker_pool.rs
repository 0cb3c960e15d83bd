use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

type JobFn<R> = Box<dyn FnOnce() -> R + Send + 'static>;

struct Task<K, R> {
    sequence: usize,
    key: K,
    job: JobFn<R>,
}

struct Queue<K, R> {
    tasks: VecDeque<Task<K, R>>,
    idle: usize,
    closed: bool,
}

struct Shared<K, R> {
    queue: Mutex<Queue<K, R>>,
    ready: Condvar,
}

type Completion<K, R> = (usize, K, Option<R>);

/// Bounded set of worker threads running keyed jobs.
///
/// Threads are spawned on demand, up to the configured limit, and live until
/// the pool is dropped. [`wait_all`](Self::wait_all) is a barrier: it blocks
/// until every job submitted so far has finished.
pub struct WorkerPool<K, R> {
    shared: Arc<Shared<K, R>>,
    threads: Vec<JoinHandle<()>>,
    max_threads: NonZeroUsize,
    sender: mpsc::Sender<Completion<K, R>>,
    receiver: mpsc::Receiver<Completion<K, R>>,
    submitted: usize,
    collected: usize,
}

impl<K: Send + 'static, R: Send + 'static> WorkerPool<K, R> {
    pub fn new(max_threads: NonZeroUsize) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    tasks: VecDeque::new(),
                    idle: 0,
                    closed: false,
                }),
                ready: Condvar::new(),
            }),
            threads: Vec::new(),
            max_threads,
            sender,
            receiver,
            submitted: 0,
            collected: 0,
        }
    }

    /// A pool sized to the machine's available parallelism.
    pub fn with_available_parallelism() -> Self {
        Self::new(thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    pub fn max_threads(&self) -> NonZeroUsize {
        self.max_threads
    }

    /// Number of threads started so far.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub fn submit(&mut self, key: K, job: impl FnOnce() -> R + Send + 'static) {
        let task = Task {
            sequence: self.submitted,
            key,
            job: Box::new(job),
        };
        self.submitted += 1;

        let starving = {
            let mut queue = self.shared.queue.lock();
            queue.tasks.push_back(task);
            queue.tasks.len() > queue.idle
        };
        self.shared.ready.notify_one();

        if starving && self.threads.len() < self.max_threads.get() {
            if let Err(e) = self.spawn_worker() {
                log::error!("Failed to spawn worker thread: {e}");
                if self.threads.is_empty() {
                    self.run_queued_here();
                }
            }
        }
    }

    /// Blocks until every submitted job finishes and returns their results in
    /// submission order.
    ///
    /// Jobs that panicked have no entry.
    pub fn wait_all(&mut self) -> Vec<(K, R)> {
        let mut done = Vec::with_capacity(self.submitted - self.collected);
        while self.collected < self.submitted {
            let Ok(completion) = self.receiver.recv() else {
                break;
            };
            self.collected += 1;
            done.push(completion);
        }
        done.sort_by_key(|(sequence, _, _)| *sequence);
        done.into_iter()
            .filter_map(|(_, key, result)| Some((key, result?)))
            .collect()
    }

    fn spawn_worker(&mut self) -> std::io::Result<()> {
        let shared = Arc::clone(&self.shared);
        let sender = self.sender.clone();
        let handle = thread::Builder::new()
            .name(format!("yosegi-worker-{}", self.threads.len()))
            .spawn(move || worker_loop(&shared, &sender))?;
        self.threads.push(handle);
        Ok(())
    }

    fn run_queued_here(&mut self) {
        loop {
            let Some(task) = self.shared.queue.lock().tasks.pop_front() else {
                return;
            };
            let _ = self.sender.send(execute(task));
        }
    }
}

fn worker_loop<K, R>(shared: &Shared<K, R>, sender: &mpsc::Sender<Completion<K, R>>) {
    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(task) = queue.tasks.pop_front() {
                    break task;
                }
                if queue.closed {
                    return;
                }
                queue.idle += 1;
                shared.ready.wait(&mut queue);
                queue.idle -= 1;
            }
        };
        if sender.send(execute(task)).is_err() {
            return;
        }
    }
}

fn execute<K, R>(task: Task<K, R>) -> Completion<K, R> {
    let Task { sequence, key, job } = task;
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(result) => (sequence, key, Some(result)),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Worker job #{sequence} panicked: {message}");
            (sequence, key, None)
        }
    }
}

impl<K, R> Drop for WorkerPool<K, R> {
    fn drop(&mut self) {
        self.shared.queue.lock().closed = true;
        self.shared.ready.notify_all();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}
