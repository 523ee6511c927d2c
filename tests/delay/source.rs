use crate::virtual_runner;
use dally::delay::{Collector, DelaySource};
use dally::{time, Error};
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use test_env_log::test;

/// Hands out a fixed list of delays in order; delays are whole seconds of virtual time
#[derive(Debug)]
struct ScriptedDelays {
    script: RefCell<Vec<Result<f64, Error>>>,
    completed: Rc<Cell<usize>>,
}

impl ScriptedDelays {
    fn new(script: Vec<Result<f64, Error>>) -> Self {
        Self {
            script: RefCell::new(script.into_iter().rev().collect()),
            completed: Rc::new(Cell::new(0)),
        }
    }
}

impl DelaySource for ScriptedDelays {
    type Delay = LocalBoxFuture<'static, Result<f64, Error>>;

    fn delay(&self, max_delay: f64) -> Self::Delay {
        let next = self.script.borrow_mut().pop().expect("script exhausted");
        let completed = Rc::clone(&self.completed);
        Box::pin(async move {
            let secs = match &next {
                Ok(delay) => *delay,
                Err(_) => 1.0,
            };
            assert!(secs <= max_delay);
            time::sleep(Duration::from_secs_f64(secs)).await;
            completed.set(completed.get() + 1);
            next
        })
    }
}

#[test]
fn output_is_sorted_regardless_of_completion_order() {
    let delays = virtual_runner(0).block_on(async {
        let collector = Collector::new(ScriptedDelays::new(vec![Ok(3.0), Ok(1.0), Ok(2.0), Ok(1.0)]));
        collector.collect(4, 5.0).await
    });
    assert_eq!(delays, Ok(vec![1.0, 1.0, 2.0, 3.0]));
}

#[test]
fn spawned_output_is_sorted() {
    let delays = virtual_runner(0).block_on(async {
        let collector = Collector::new(ScriptedDelays::new(vec![Ok(4.0), Ok(0.0), Ok(2.5)]));
        collector.collect_spawned(3, 5.0).await
    });
    assert_eq!(delays, Ok(vec![0.0, 2.5, 4.0]));
}

#[test]
fn task_failure_fails_the_whole_collection() {
    let failure = Error::Task("sampler broke".to_string());
    let result = virtual_runner(0).block_on({
        let failure = failure.clone();
        async move {
            let collector = Collector::new(ScriptedDelays::new(vec![Ok(2.0), Err(failure), Ok(3.0)]));
            collector.collect(3, 5.0).await
        }
    });
    assert_eq!(result, Err(failure));
}

#[test]
fn spawned_collection_awaits_every_task_before_failing() {
    let (result, completed) = virtual_runner(0).block_on(async {
        let source = ScriptedDelays::new(vec![
            Ok(2.0),
            Err(Error::Task("first".to_string())),
            Ok(3.0),
            Err(Error::Task("second".to_string())),
        ]);
        let completed = Rc::clone(&source.completed);
        let result = Collector::new(source).collect_spawned(4, 5.0).await;
        (result, completed.get())
    });
    assert_eq!(result, Err(Error::Task("first".to_string())));
    assert_eq!(completed, 4);
}

#[test]
fn validation_happens_before_any_task_is_created() {
    virtual_runner(0).block_on(async {
        // An empty script panics if the collector asks it for a delay
        let collector = Collector::new(ScriptedDelays::new(vec![]));
        assert!(collector.collect(-2, 1.0).await.is_err());
        assert!(collector.collect(2, -1.0).await.is_err());
        assert!(collector.collect_spawned(2, f64::INFINITY).await.is_err());
    });
}
