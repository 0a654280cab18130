//! Nodes and generic scenarios shared by the tests of the intrusive queues.
use crate::backoff::Backoff;
use crate::consumer::LinkedConsumer;
use crate::hook::{Hook, SeqHook};
use crate::impl_linked;
use crate::producer::LinkedProducer;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// A caller-owned node with two hooks.
#[derive(Default)]
pub(crate) struct Job {
    pub(crate) hook: Hook,
    pub(crate) seq_hook: SeqHook,
    pub(crate) producer: usize,
    pub(crate) index: usize,
}

impl_linked!(Job, hook: Hook);
impl_linked!(Job, seq_hook: SeqHook);

impl Job {
    pub(crate) fn new(producer: usize, index: usize) -> Box<Self> {
        Box::new(Self {
            producer,
            index,
            ..Self::default()
        })
    }

    pub(crate) fn ptr(&self) -> NonNull<Self> {
        NonNull::from(self)
    }
}

/// Returns `(producer, index)` of a popped node.
pub(crate) fn id(node: NonNull<Job>) -> (usize, usize) {
    let job = unsafe { node.as_ref() };

    (job.producer, job.index)
}

/// Pushes f1 and f2, pops f1, clears f1 and pushes f3, pops f2, pushes f2 again,
/// pops f3, clears f3, pops f2, and then finds the queue empty.
pub(crate) fn test_reuse_scenario<P, C>(producer: &P, consumer: &C)
where
    P: LinkedProducer<Job>,
    C: LinkedConsumer<Job>,
{
    let f1 = Job::new(0, 1);
    let f2 = Job::new(0, 2);
    let f3 = Job::new(0, 3);

    unsafe {
        producer.push(f1.ptr());
        producer.push(f2.ptr());
    }

    assert_eq!(consumer.try_pop(), Some(f1.ptr()));

    f1.hook.clear();

    unsafe { producer.push(f3.ptr()) };

    assert_eq!(consumer.try_pop(), Some(f2.ptr()));

    unsafe { producer.push(f2.ptr()) };

    assert_eq!(consumer.try_pop(), Some(f3.ptr()));

    f3.hook.clear();

    assert_eq!(consumer.try_pop(), Some(f2.ptr()));
    assert_eq!(consumer.try_pop(), None);
}

/// Runs `producers` producer threads against every consumer in `consumers`, then checks
/// that every node was popped exactly once and that each consumer saw the nodes of every
/// producer in the order they were pushed.
pub(crate) fn test_linked_multi_threaded<P, C>(producers: usize, producer: P, consumers: Vec<C>)
where
    P: LinkedProducer<Job> + Clone + Send,
    C: LinkedConsumer<Job> + Send,
{
    const N: usize = 20_000;

    let jobs: Vec<Vec<Box<Job>>> = (0..producers)
        .map(|p| (0..N).map(|i| Job::new(p, i)).collect())
        .collect();
    let popped = AtomicUsize::new(0);

    let seen: Vec<Vec<(usize, usize)>> = thread::scope(|scope| {
        for producer_jobs in &jobs {
            let producer = producer.clone();

            scope.spawn(move || {
                for job in producer_jobs {
                    unsafe { producer.push(job.ptr()) };
                }
            });
        }

        let handles: Vec<_> = consumers
            .into_iter()
            .map(|consumer| {
                let popped = &popped;

                scope.spawn(move || {
                    let backoff = Backoff::new();
                    let mut seen = Vec::new();

                    while popped.load(Ordering::Relaxed) < producers * N {
                        if let Some(node) = consumer.try_pop() {
                            seen.push(id(node));
                            popped.fetch_add(1, Ordering::Relaxed);
                            backoff.reset();
                        } else {
                            backoff.snooze();
                        }
                    }

                    seen
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let mut counts = vec![vec![0_u8; N]; producers];

    for consumer_seen in &seen {
        let mut last = vec![None; producers];

        for &(producer, index) in consumer_seen {
            counts[producer][index] += 1;

            assert!(
                last[producer] < Some(index),
                "producer {producer}: {index} after {:?}",
                last[producer]
            );

            last[producer] = Some(index);
        }
    }

    for (producer, producer_counts) in counts.iter().enumerate() {
        for (index, count) in producer_counts.iter().enumerate() {
            assert_eq!(*count, 1, "node ({producer}, {index}) popped {count} times");
        }
    }
}
