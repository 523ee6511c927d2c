pub(crate) mod execution;
pub(crate) mod failure;
pub(crate) mod runner;
pub(crate) mod task;
pub(crate) mod timer;
