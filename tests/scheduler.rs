use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use deferred::{Deferred, Job, RunError, Schedule, Scheduler, SchedulerConfig, WaitError};

#[test]
fn scheduler_runs_turn_by_turn() {
    let scheduler = Scheduler::new();
    let handle = scheduler.handle();
    let log = Rc::new(RefCell::new(String::new()));

    let log_cl1 = Rc::clone(&log);
    let log_cl2 = Rc::clone(&log);
    let d = Deferred::<u8, ()>::resolve(&handle, 1)
        .and_then(move |v| {
            log_cl1.borrow_mut().push('1');
            Ok(v + 1)
        })
        .and_then(move |v| {
            log_cl2.borrow_mut().push('2');
            Ok(v + 1)
        });

    assert_eq!(scheduler.len(), 1, "Only the first link is ready");
    assert_eq!(scheduler.run_pending(), 1);
    assert_eq!(*log.borrow(), "1", "Second link waits for the next turn");

    assert_eq!(scheduler.run_pending(), 1);
    assert_eq!(*log.borrow(), "12");
    assert_eq!(d.peek(), Some(Ok(3)));
    assert!(scheduler.is_empty());
}

#[test]
fn each_continuation_gets_its_own_job() {
    let scheduler = Scheduler::new();
    let (d, settler) = Deferred::<u8, ()>::pending(&scheduler.handle());
    let log = Rc::new(RefCell::new(Vec::new()));

    for i in 0..3 {
        let log_cl = Rc::clone(&log);
        let _ = d.and_then(move |v| {
            log_cl.borrow_mut().push(i);
            Ok(v)
        });
    }
    settler.fulfill(7);

    assert_eq!(scheduler.len(), 3);
    assert!(scheduler.run_next());
    assert_eq!(*log.borrow(), [0], "Continuations run in registration order");
}

#[test]
fn panicking_continuation_leaves_later_ones_queued() {
    let scheduler = Scheduler::new();
    let (d, settler) = Deferred::<u8, ()>::pending(&scheduler.handle());
    let ran = Rc::new(Cell::new(false));

    let _ = d.and_then(|_| -> Result<u8, ()> { panic!("handler failed") });
    let ran_cl = Rc::clone(&ran);
    let last = d.and_then(move |v| {
        ran_cl.set(true);
        Ok(v + 1)
    });
    settler.fulfill(1);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| scheduler.run_next()));
    assert!(outcome.is_err());
    assert!(!ran.get());

    scheduler.run_all().unwrap();
    assert!(ran.get(), "Later continuation should still run");
    assert_eq!(last.peek(), Some(Ok(2)));
}

#[test]
fn job_limit_interrupts_block_on() {
    let mut config = SchedulerConfig::default();
    config.max_jobs_per_run(1);
    let scheduler = Scheduler::with_config(config);
    let handle = scheduler.handle();

    let d = Deferred::<u8, ()>::resolve(&handle, 1)
        .and_then(|v| Ok(v + 1))
        .and_then(|v| Ok(v + 1));

    assert_eq!(
        scheduler.block_on(&d),
        Err(WaitError::Run(RunError::JobLimitReached {
            limit: 1,
            remaining: 1
        }))
    );
}

// A hand-rolled queue standing in for a host event loop.
#[derive(Clone, Default)]
struct CountingQueue {
    jobs: Rc<RefCell<VecDeque<Job>>>,
    scheduled: Rc<Cell<usize>>,
}

impl CountingQueue {
    fn drain(&self) {
        loop {
            let job = self.jobs.borrow_mut().pop_front();
            match job {
                Some(job) => job(),
                None => break,
            }
        }
    }
}

impl Schedule for CountingQueue {
    fn schedule(&self, job: Job) {
        self.scheduled.set(self.scheduled.get() + 1);
        self.jobs.borrow_mut().push_back(job);
    }
}

#[test]
fn custom_scheduler_can_be_injected() {
    let queue = CountingQueue::default();

    let d = Deferred::<&str, ()>::resolve(&queue, "custom").and_then(|v| Ok(v.len()));
    assert_eq!(queue.scheduled.get(), 1);
    assert!(d.is_pending());

    queue.drain();
    assert_eq!(d.peek(), Some(Ok(6)));
}
