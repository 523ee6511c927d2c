use crate::{check_seed_roundtrip, virtual_runner};
use dally::asynch;
use dally::rand::{thread_rng, Rng};
use dally::scheduler::RoundRobinScheduler;
use dally::time::ClockMode;
use dally::{Config, Runner};
use std::panic;
use test_env_log::test;

async fn panic_with_random_value() {
    let x = thread_rng().gen::<u64>();
    panic!("drew {}", x);
}

#[test]
fn panic_message_names_task_and_seed() {
    let result = panic::catch_unwind(|| {
        virtual_runner(77).block_on(async {
            asynch::spawn_named("doomed", panic_with_random_value()).await;
        })
    });
    let output = result.expect_err("execution should panic").downcast::<String>().unwrap();
    assert!(output.contains("panicked in task \"doomed\""), "{}", output);
    assert!(output.contains("execution seed: 77"), "{}", output);
    assert!(output.contains("original panic: drew "), "{}", output);
}

#[test]
fn static_str_panics_are_annotated() {
    let result = panic::catch_unwind(|| {
        dally::block_on(async {
            panic!("plain message");
        })
    });
    let output = result.expect_err("execution should panic").downcast::<String>().unwrap();
    assert!(output.contains("panicked in task \"main\""), "{}", output);
    assert!(output.contains("original panic: plain message"), "{}", output);
}

fn unseeded_virtual_runner() -> Runner<RoundRobinScheduler> {
    let mut config = Config::new();
    config.clock = ClockMode::Virtual;
    Runner::new(RoundRobinScheduler::new(), config)
}

#[test]
fn failing_seed_reproduces_failure() {
    check_seed_roundtrip(
        || unseeded_virtual_runner().block_on(panic_with_random_value()),
        |seed| virtual_runner(seed).block_on(panic_with_random_value()),
    )
}

#[test]
fn runner_is_usable_after_a_failed_execution() {
    let runner = virtual_runner(3);
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| runner.block_on(panic_with_random_value())));
    assert!(result.is_err());
    assert_eq!(runner.block_on(async { 5 }), 5);
}
