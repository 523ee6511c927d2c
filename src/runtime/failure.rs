/// Produce a message describing how to reproduce a failing execution.
///
/// Everything an execution draws from `rand::thread_rng` is derived from its seed, so re-running
/// with the same seed (and the same scheduler and clock) reproduces the failure.
pub(crate) fn describe_failure(message: String, seed: u64) -> String {
    format!(
        "{}\nexecution seed: {}\nset `Config::seed` to that value to reproduce the failure",
        message, seed
    )
}
