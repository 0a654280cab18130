//! Loom models of the lock-free hand-offs: MPSC push/pop and both SPSC queues.
//!
//! The spinlock word stays a `std` atomic because `RawMutex::INIT` needs a const
//! constructor, so the lock-guarded queues (`SpmcQueue`, `MpmcQueue`, `ConcurrentQueue`)
//! are not modeled here.
use crate::loom_bindings::sync::Arc;
use crate::loom_bindings::thread::{spawn, yield_now};
use crate::mpsc::MpscQueue;
use crate::spsc::{SeqQueue, SpscQueue};
use crate::test_utils::{id, Job};

#[test]
fn loom_mpsc_two_producers() {
    loom::model(|| {
        let jobs: Arc<Vec<Box<Job>>> = Arc::new((0..2).map(|p| Job::new(p, 0)).collect());
        let (producer, consumer) = MpscQueue::new().split();

        let handles: Vec<_> = (0..2)
            .map(|p| {
                let jobs = jobs.clone();
                let producer = producer.clone();

                spawn(move || unsafe { producer.push(jobs[p].ptr()) })
            })
            .collect();

        let mut seen = Vec::new();

        while seen.len() < 2 {
            match consumer.try_pop() {
                Some(node) => seen.push(id(node)),
                None => yield_now(),
            }
        }

        for handle in handles {
            handle.join().unwrap();
        }

        seen.sort_unstable();

        assert_eq!(seen, [(0, 0), (1, 0)]);
        assert_eq!(consumer.try_pop(), None);
        assert!(consumer.is_empty());
    });
}

#[test]
fn loom_mpsc_per_producer_order() {
    loom::model(|| {
        let jobs: Arc<Vec<Box<Job>>> = Arc::new((0..2).map(|i| Job::new(0, i)).collect());
        let (producer, consumer) = MpscQueue::new().split();

        let handle = {
            let jobs = jobs.clone();

            spawn(move || {
                for job in jobs.iter() {
                    unsafe { producer.push(job.ptr()) };
                }
            })
        };

        let mut expected = 0;

        while expected < 2 {
            match consumer.try_pop() {
                Some(node) => {
                    assert_eq!(id(node), (0, expected));

                    expected += 1;
                }
                None => yield_now(),
            }
        }

        handle.join().unwrap();
    });
}

#[test]
fn loom_spsc_recycles_nodes() {
    loom::model(|| {
        let (producer, consumer) = SpscQueue::new().split();

        let handle = spawn(move || {
            for i in 0..3 {
                producer.push(i).unwrap();
            }

            producer.cached_nodes()
        });

        let mut expected = 0;

        while expected < 3 {
            match consumer.try_pop() {
                Some(value) => {
                    assert_eq!(value, expected);

                    expected += 1;
                }
                None => yield_now(),
            }
        }

        let nodes = handle.join().unwrap();

        assert!((2..=4).contains(&nodes));
        assert!(consumer.is_empty());
    });
}

#[test]
fn loom_seq_hand_off() {
    loom::model(|| {
        let jobs: Arc<Vec<Box<Job>>> = Arc::new((0..3).map(|i| Job::new(0, i)).collect());
        let (producer, consumer) = SeqQueue::new().split();

        let handle = {
            let jobs = jobs.clone();

            spawn(move || {
                for job in jobs.iter() {
                    unsafe { producer.push(job.ptr()) };
                }
            })
        };

        let mut expected = 0;

        while expected < 3 {
            match consumer.try_pop() {
                Some(node) => {
                    assert_eq!(id(node), (0, expected));

                    expected += 1;
                }
                None => yield_now(),
            }
        }

        handle.join().unwrap();

        assert!(consumer.is_empty());
    });
}
