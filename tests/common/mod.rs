#![allow(dead_code)]

pub use thingrun_test_utils::builders;
pub use thingrun_test_utils::recording_sink;
pub use thingrun_test_utils::tasks;
pub use thingrun_test_utils::{init_tracing, with_timeout};

use thingrun::engine::MAX_PROGRESS;

/// Assert a progress sequence never decreases and stays in range.
pub fn assert_monotonic(values: &[u8]) {
    for pair in values.windows(2) {
        assert!(pair[0] <= pair[1], "progress went backwards: {values:?}");
    }
    assert!(
        values.iter().all(|v| *v <= MAX_PROGRESS),
        "progress out of range: {values:?}"
    );
}
