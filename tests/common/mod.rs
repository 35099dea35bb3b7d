#![allow(dead_code, unused_imports)]

pub use wfbench_runner_test_utils::{builders, fake_worker, fast_options, init_tracing, with_timeout};
