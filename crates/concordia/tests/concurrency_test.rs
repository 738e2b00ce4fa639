//! Integration tests for concurrent access to the synchronized collections.

use concordia::{
    CollectionChange, Notification, PropertyName, SequenceEvent, SetChange, SynchronizedHashSet,
    SynchronizedSequence, UniqueSynchronizedSequence,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, Barrier, Weak};
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

#[test]
fn test_concurrent_adds_are_all_committed() {
    let seq = Arc::new(SynchronizedSequence::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let seq = Arc::clone(&seq);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    seq.add(t * PER_THREAD + i).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let items = seq.to_vec().unwrap();
    assert_eq!(items.len(), THREADS * PER_THREAD);

    let distinct: HashSet<_> = items.iter().copied().collect();
    assert_eq!(distinct.len(), THREADS * PER_THREAD);
}

#[test]
fn test_handlers_observe_committed_counts() {
    let seq: Arc<SynchronizedSequence<usize>> = Arc::new(SynchronizedSequence::new());
    let observed = Arc::new(Mutex::new(Vec::new()));

    let _sub = {
        let weak: Weak<SynchronizedSequence<usize>> = Arc::downgrade(&seq);
        let observed = Arc::clone(&observed);
        seq.subscribe(move |change| {
            if let (CollectionChange::Add { index, .. }, Some(seq)) = (change, weak.upgrade()) {
                observed.lock().push((*index, seq.len().unwrap()));
            }
        })
        .unwrap()
    };

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    seq.add(t * PER_THREAD + i).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let observed = observed.lock();
    assert_eq!(observed.len(), THREADS * PER_THREAD);
    for (position, &(index, len)) in observed.iter().enumerate() {
        assert_eq!(index, position, "notifications arrive in commit order");
        assert_eq!(len, index + 1, "handler saw a count from another commit");
    }
}

#[test]
fn test_event_stream_is_totally_ordered() {
    let seq: SynchronizedSequence<u32> = SynchronizedSequence::new();
    let (_sub, rx) = seq.subscribe_channel_bounded(THREADS * PER_THREAD * 3).unwrap();
    let seq = Arc::new(seq);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    seq.add(u32::try_from(i).unwrap()).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let events: Vec<SequenceEvent<u32>> = rx.try_iter().collect();
    assert_eq!(events.len(), THREADS * PER_THREAD * 3);

    for (n, triple) in events.chunks(3).enumerate() {
        assert_eq!(triple[0], Notification::Property(PropertyName::Count));
        assert_eq!(triple[1], Notification::Property(PropertyName::Items));
        match &triple[2] {
            Notification::Change(CollectionChange::Add { index, items }) => {
                assert_eq!(*index, n);
                assert_eq!(items.len(), 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[test]
fn test_unique_concurrent_adds_of_overlapping_values() {
    let seq = Arc::new(UniqueSynchronizedSequence::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let seq = Arc::clone(&seq);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD).filter(|&v| seq.add(v).unwrap()).count()
            })
        })
        .collect();

    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(accepted, PER_THREAD);
    assert_eq!(seq.len().unwrap(), PER_THREAD);
    let distinct: HashSet<_> = seq.snapshot().unwrap().collect();
    assert_eq!(distinct.len(), PER_THREAD);
}

#[test]
fn test_snapshot_isolation_across_threads() {
    let seq = Arc::new(SynchronizedSequence::from_source(0..100));
    let mut snapshot = seq.snapshot().unwrap();

    let first: Vec<_> = snapshot.by_ref().take(10).collect();
    assert_eq!(first, (0..10).collect::<Vec<_>>());

    {
        let seq = Arc::clone(&seq);
        thread::spawn(move || {
            seq.clear().unwrap();
            seq.add_range(500..510).unwrap();
        })
        .join()
        .unwrap();
    }

    let rest: Vec<_> = snapshot.collect();
    assert_eq!(rest, (10..100).collect::<Vec<_>>());
    assert_eq!(seq.to_vec().unwrap(), (500..510).collect::<Vec<_>>());
}

#[test]
fn test_readers_run_alongside_writers() {
    let seq = Arc::new(SynchronizedSequence::new());
    let writer = {
        let seq = Arc::clone(&seq);
        thread::spawn(move || {
            for i in 0..2_000_u32 {
                seq.add(i).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                for _ in 0..200 {
                    let items: Vec<u32> = seq.snapshot().unwrap().collect();
                    assert!(items.iter().enumerate().all(|(i, &v)| v as usize == i));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(seq.len().unwrap(), 2_000);
}

#[test]
fn test_set_concurrent_union() {
    let set = Arc::new(SynchronizedHashSet::new());
    let added = Arc::new(Mutex::new(0_usize));
    let _sub = {
        let added = Arc::clone(&added);
        set.subscribe(move |change| {
            if let SetChange::Added(items) = change {
                *added.lock() += items.len();
            }
        })
        .unwrap()
    };

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || set.union_with(t * 10..t * 10 + 20).unwrap())
        })
        .collect();

    let reported: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let expected = THREADS * 10 + 10;
    assert_eq!(set.len().unwrap(), expected);
    assert_eq!(reported, expected);
    assert_eq!(*added.lock(), expected);
}
