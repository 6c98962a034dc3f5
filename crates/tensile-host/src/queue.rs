use crossbeam_channel::{unbounded, Receiver, Sender};

/// One deferred unit of work against the consumer's state.
///
/// Tasks must not block; a blocking task stalls the entire host tick.
pub type Task<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// FIFO multi-producer/single-consumer task queue, drained once per host
/// tick before any other per-tick work.
///
/// This is the only path by which background threads may reach host or
/// engine state: producers post closures, the tick thread executes them.
/// Tasks posted while a drain is executing run on the next drain, so a
/// reload request that arrives mid-tick is deferred rather than interleaved.
pub struct MainThreadQueue<T> {
    tx: Sender<Task<T>>,
    rx: Receiver<Task<T>>,
}

impl<T> MainThreadQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Cloneable producer handle.
    #[inline]
    pub fn sender(&self) -> TaskSender<T> {
        TaskSender {
            tx: self.tx.clone(),
        }
    }

    /// Takes everything currently pending, in enqueue order.
    ///
    /// The batch is snapshotted before execution so the caller can run the
    /// tasks against `&mut T` without holding the queue.
    pub fn take_pending(&self) -> Vec<Task<T>> {
        let mut tasks = Vec::new();
        while let Ok(task) = self.rx.try_recv() {
            tasks.push(task);
        }
        tasks
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Default for MainThreadQueue<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

pub struct TaskSender<T> {
    tx: Sender<Task<T>>,
}

// Manual impl: `T` itself does not need to be Clone.
impl<T> Clone for TaskSender<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> TaskSender<T> {
    /// Best-effort post. Returns `true` if the queue accepted the task.
    #[inline]
    pub fn post(&self, task: impl FnOnce(&mut T) + Send + 'static) -> bool {
        self.tx.try_send(Box::new(task)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_enqueue_order() {
        let queue: MainThreadQueue<Vec<u32>> = MainThreadQueue::new();
        let sender = queue.sender();
        for i in 0..5u32 {
            assert!(sender.post(move |out: &mut Vec<u32>| out.push(i)));
        }

        let mut out = Vec::new();
        for task in queue.take_pending() {
            task(&mut out);
        }
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn multiple_senders_share_one_queue() {
        let queue: MainThreadQueue<Vec<&'static str>> = MainThreadQueue::new();
        let a = queue.sender();
        let b = queue.sender();
        a.post(|out: &mut Vec<&'static str>| out.push("a1"));
        b.post(|out: &mut Vec<&'static str>| out.push("b1"));
        a.post(|out: &mut Vec<&'static str>| out.push("a2"));

        let mut out = Vec::new();
        for task in queue.take_pending() {
            task(&mut out);
        }
        assert_eq!(out, vec!["a1", "b1", "a2"]);
    }

    #[test]
    fn tasks_posted_during_drain_wait_for_the_next_drain() {
        let queue: MainThreadQueue<Vec<u32>> = MainThreadQueue::new();
        let sender = queue.sender();
        let resender = queue.sender();
        sender.post(move |out: &mut Vec<u32>| {
            out.push(1);
            resender.post(|out: &mut Vec<u32>| out.push(2));
        });

        let mut out = Vec::new();
        for task in queue.take_pending() {
            task(&mut out);
        }
        assert_eq!(out, vec![1]);

        for task in queue.take_pending() {
            task(&mut out);
        }
        assert_eq!(out, vec![1, 2]);
    }
}
