use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use uuid::Uuid;

use qbank_engine::locks::SubjectLocks;

#[test]
fn entry_lives_only_while_held() {
    let locks = SubjectLocks::default();
    let subject = Uuid::new_v4();

    let seen = locks.with_subject(subject, || locks.len());
    assert_eq!(seen, 1);
    assert!(locks.is_empty());
}

#[test]
fn many_subjects_leave_nothing_behind() {
    let locks = SubjectLocks::default();
    for _ in 0..100 {
        locks.with_subject(Uuid::new_v4(), || ());
    }
    assert!(locks.is_empty());
}

#[test]
fn same_subject_is_serialized() {
    let locks = SubjectLocks::default();
    let subject = Uuid::new_v4();
    let inside = AtomicUsize::new(0);
    let overlaps = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    locks.with_subject(subject, || {
                        if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            });
        }
    });

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert!(locks.is_empty());
}
