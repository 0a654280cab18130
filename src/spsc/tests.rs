use crate::backoff::Backoff;
use crate::spsc::{SeqQueue, SpscQueue};
use crate::test_lock::TEST_LOCK;
use crate::test_utils::{id, Job};
use std::mem;
use std::rc::Rc;
use std::thread;

#[test]
fn test_seq_new_is_empty() {
    let queue = SeqQueue::<Job>::new();

    unsafe {
        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
    }
}

#[test]
fn test_seq_batch_reversal() {
    let jobs: Vec<_> = (1..=5).map(|i| Job::new(0, i)).collect();
    let (producer, consumer) = SeqQueue::new().split();

    for job in &jobs {
        unsafe { producer.push(job.ptr()) };
    }

    for (job, expected) in jobs.iter().zip(1..=5) {
        assert_eq!(job.seq_hook.seq(), expected);
    }

    for i in 1..=5 {
        let node = consumer.try_pop().unwrap();

        assert_eq!(id(node), (0, i));
        assert_eq!(unsafe { node.as_ref() }.seq_hook.seq(), u32::try_from(i).unwrap());
    }

    assert!(consumer.is_empty());
    assert_eq!(consumer.try_pop(), None);
}

#[test]
fn test_seq_pushes_between_pops() {
    let jobs: Vec<_> = (0..6).map(|i| Job::new(0, i)).collect();
    let queue = SeqQueue::new();

    unsafe {
        queue.push(jobs[0].ptr());
        queue.push(jobs[1].ptr());

        assert_eq!(queue.try_pop().map(id), Some((0, 0)));

        queue.push(jobs[2].ptr());
        queue.push(jobs[3].ptr());

        assert_eq!(queue.try_pop().map(id), Some((0, 1)));
        assert_eq!(queue.try_pop().map(id), Some((0, 2)));

        queue.push(jobs[4].ptr());

        assert_eq!(queue.try_pop().map(id), Some((0, 3)));

        // A popped node can be pushed again.
        queue.push(jobs[0].ptr());
        queue.push(jobs[5].ptr());

        assert_eq!(queue.try_pop().map(id), Some((0, 4)));
        assert_eq!(queue.try_pop().map(id), Some((0, 0)));
        assert_eq!(queue.try_pop().map(id), Some((0, 5)));
        assert_eq!(queue.try_pop(), None);
    }
}

#[test]
fn test_seq_repush_of_just_popped_node() {
    let jobs: Vec<_> = (0..2).map(|i| Job::new(0, i)).collect();
    let (producer, consumer) = SeqQueue::new().split();

    for _ in 0..3 {
        unsafe { producer.push(jobs[0].ptr()) };

        let node = consumer.try_pop().unwrap();

        assert_eq!(id(node), (0, 0));
        assert!(consumer.is_empty());

        unsafe { node.as_ref() }.seq_hook.clear();
    }

    // The stack top is still the popped node when it is pushed again.
    unsafe {
        producer.push(jobs[0].ptr());
        producer.push(jobs[1].ptr());
    }

    assert_eq!(consumer.try_pop().map(id), Some((0, 0)));
    assert_eq!(consumer.try_pop().map(id), Some((0, 1)));
    assert_eq!(consumer.try_pop(), None);
    assert!(consumer.is_empty());
}

#[test]
fn test_seq_take_moves_everything() {
    let jobs: Vec<_> = (0..3).map(|i| Job::new(0, i)).collect();
    let mut queue = SeqQueue::new();

    unsafe {
        queue.push(jobs[0].ptr());
        queue.push(jobs[1].ptr());

        assert_eq!(queue.try_pop().map(id), Some((0, 0)));

        queue.push(jobs[2].ptr());
    }

    let taken = mem::take(&mut queue);

    unsafe {
        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
        assert_eq!(taken.try_pop().map(id), Some((0, 1)));
        assert_eq!(taken.try_pop().map(id), Some((0, 2)));
        assert_eq!(taken.try_pop(), None);
    }
}

#[test]
fn test_seq_consumer_into_inner() {
    let jobs: Vec<_> = (0..2).map(|i| Job::new(0, i)).collect();
    let (producer, consumer) = SeqQueue::new().split();

    unsafe {
        producer.push(jobs[0].ptr());
        producer.push(jobs[1].ptr());
    }

    assert_eq!(consumer.try_pop().map(id), Some((0, 0)));

    let consumer = consumer.try_into_inner().unwrap_err();

    drop(producer);

    let queue = consumer.try_into_inner().ok().unwrap();

    unsafe {
        assert_eq!(queue.try_pop().map(id), Some((0, 1)));
        assert!(queue.is_empty());
    }
}

#[test]
fn test_seq_multi_threaded() {
    const N: usize = 100_000;

    let test_guard = TEST_LOCK.lock();

    let jobs: Vec<_> = (0..N).map(|i| Job::new(0, i)).collect();
    let (producer, consumer) = SeqQueue::new().split();

    thread::scope(|scope| {
        let jobs = &jobs;

        scope.spawn(move || {
            for job in jobs {
                unsafe { producer.push(job.ptr()) };
            }
        });

        let backoff = Backoff::new();
        let mut expected = 0;

        while expected < N {
            if let Some(node) = consumer.try_pop() {
                assert_eq!(id(node), (0, expected));

                expected += 1;
                backoff.reset();
            } else {
                backoff.snooze();
            }
        }

        assert_eq!(consumer.try_pop(), None);
    });

    drop(test_guard);
}

#[test]
fn test_spsc_fifo_and_recycling() {
    let mut queue = SpscQueue::new();

    assert_eq!(queue.cached_nodes(), 1);

    for round in 0..10 {
        for i in 0..4 {
            unsafe { queue.push(round * 4 + i) }.unwrap();
        }

        for i in 0..4 {
            assert_eq!(unsafe { queue.try_pop() }, Some(round * 4 + i));
        }

        assert!(unsafe { queue.is_empty() });
        assert_eq!(unsafe { queue.try_pop() }, None);
    }

    // Four values and the sentinel; later rounds reuse the first round's nodes.
    assert_eq!(queue.cached_nodes(), 5);
}

#[test]
fn test_spsc_with_capacity_does_not_grow() {
    let (producer, consumer) = SpscQueue::with_capacity(8).unwrap().split();

    assert_eq!(producer.cached_nodes(), 9);

    for _ in 0..3 {
        for i in 0..8 {
            producer.push(i).unwrap();
        }

        for i in 0..8 {
            assert_eq!(consumer.try_pop(), Some(i));
        }
    }

    assert_eq!(producer.cached_nodes(), 9);
}

#[test]
fn test_spsc_drops_remaining_values() {
    let value = Rc::new(());

    {
        let queue = SpscQueue::new();

        for _ in 0..5 {
            unsafe { queue.push(value.clone()) }.unwrap();
        }

        drop(unsafe { queue.try_pop() });
        drop(unsafe { queue.try_pop() });

        assert_eq!(Rc::strong_count(&value), 4);
    }

    assert_eq!(Rc::strong_count(&value), 1);
}

#[test]
fn test_spsc_take_moves_everything() {
    let mut queue = SpscQueue::new();

    unsafe {
        queue.push(String::from("a")).unwrap();
        queue.push(String::from("b")).unwrap();
    }

    let taken = mem::take(&mut queue);

    unsafe {
        assert_eq!(queue.try_pop(), None);
        assert_eq!(taken.try_pop().as_deref(), Some("a"));
        assert_eq!(taken.try_pop().as_deref(), Some("b"));
        assert_eq!(taken.try_pop(), None);
    }
}

#[test]
fn test_spsc_consumer_into_inner() {
    let (producer, consumer) = SpscQueue::new().split();

    producer.push(1).unwrap();

    let consumer = consumer.try_into_inner().unwrap_err();

    drop(producer);

    let mut queue = consumer.try_into_inner().ok().unwrap();

    assert_eq!(queue.cached_nodes(), 2);
    assert_eq!(unsafe { queue.try_pop() }, Some(1));
}

#[test]
fn test_spsc_multi_threaded() {
    const N: usize = 1_000_000;

    let test_guard = TEST_LOCK.lock();

    let (producer, consumer) = SpscQueue::new().split();

    let t = thread::spawn(move || {
        for i in 0..N {
            producer.push(i).unwrap();
        }
    });

    let backoff = Backoff::new();
    let mut expected = 0;

    while expected < N {
        if let Some(value) = consumer.try_pop() {
            assert_eq!(value, expected);

            expected += 1;
            backoff.reset();
        } else {
            backoff.snooze();
        }
    }

    t.join().unwrap();

    assert!(consumer.is_empty());

    drop(test_guard);
}
