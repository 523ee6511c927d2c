use crate::virtual_runner;
use dally::asynch;
use dally::rand::{thread_rng, Rng};
use dally::scheduler::{RandomScheduler, RoundRobinScheduler, Scheduler, TaskId};
use dally::{time, Config, Runner};
use std::cell::RefCell;
use std::rc::Rc;
use test_env_log::test;

async fn add(a: u32, b: u32) -> u32 {
    a + b
}

#[test]
fn block_on_returns_output() {
    let v = dally::block_on(async { add(40, 2).await });
    assert_eq!(v, 42u32);
}

#[test]
fn async_with_join() {
    let runner = Runner::new(RoundRobinScheduler::new(), Config::new());
    let sum = runner.block_on(async {
        let a = asynch::spawn(add(10, 32));
        let b = asynch::spawn(async { add(1, 2).await });
        a.await + b.await
    });
    assert_eq!(sum, 45);
}

#[test]
fn join_handles_report_task_ids() {
    dally::block_on(async {
        let first = asynch::spawn(async {});
        let second = asynch::spawn_named("second", async {});
        // The main task is always task 0
        assert_eq!(usize::from(first.task_id()), 1);
        assert_eq!(usize::from(second.task_id()), 2);
        first.await;
        second.await;
    });
}

#[test]
fn detached_tasks_still_run_to_completion() {
    let counter = Rc::new(RefCell::new(0));
    let counter_1 = Rc::clone(&counter);

    dally::block_on(async move {
        for _ in 0..3 {
            let counter = Rc::clone(&counter_1);
            drop(asynch::spawn(async move {
                asynch::yield_now().await;
                *counter.borrow_mut() += 1;
            }));
        }
    });

    assert_eq!(*counter.borrow(), 3);
}

// Round-robin scheduling interleaves tasks at every yield point
#[test]
fn yield_now_interleaves_round_robin() {
    let log = Rc::new(RefCell::new(vec![]));
    let log_1 = Rc::clone(&log);

    virtual_runner(0).block_on(async move {
        let handles = (0..3)
            .map(|i| {
                let log = Rc::clone(&log_1);
                asynch::spawn(async move {
                    for step in 0..2 {
                        log.borrow_mut().push((i, step));
                        asynch::yield_now().await;
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await;
        }
    });

    assert_eq!(*log.borrow(), vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
}

#[test]
fn random_scheduler_completes_all_tasks() {
    let runner = Runner::new(RandomScheduler::new_from_seed(7), Config::new());
    for _ in 0..10 {
        let total = runner.block_on(async {
            let handles = (0..10u32)
                .map(|i| {
                    asynch::spawn(async move {
                        asynch::yield_now().await;
                        i
                    })
                })
                .collect::<Vec<_>>();
            let mut total = 0;
            for handle in handles {
                total += handle.await;
            }
            total
        });
        assert_eq!(total, 45);
    }
}

#[test]
#[should_panic(expected = "deadlock! blocked tasks: [\"main\"]")]
fn pending_forever_is_a_deadlock() {
    dally::block_on(futures::future::pending::<()>());
}

#[test]
#[should_panic(expected = "must be called from within a dally execution")]
fn spawn_outside_execution_panics() {
    let _ = asynch::spawn(async {});
}

/// Picks a runnable task using the execution's own generator and clock
#[derive(Debug, Default)]
struct ExecutionAwareScheduler;

impl Scheduler for ExecutionAwareScheduler {
    fn next_task(&mut self, runnable_tasks: &[TaskId], _current_task: Option<TaskId>) -> TaskId {
        let _ = time::now();
        runnable_tasks[thread_rng().gen_range(0, runnable_tasks.len())]
    }
}

#[test]
fn scheduler_can_use_execution_rng_and_clock() {
    let mut config = Config::new();
    config.seed = Some(5);
    let runner = Runner::new(ExecutionAwareScheduler, config);

    let sum = runner.block_on(async {
        let handles = (0..4u32)
            .map(|i| {
                asynch::spawn(async move {
                    asynch::yield_now().await;
                    i
                })
            })
            .collect::<Vec<_>>();
        let mut sum = 0;
        for handle in handles {
            sum += handle.await;
        }
        sum
    });
    assert_eq!(sum, 6);
}
