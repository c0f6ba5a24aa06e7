//! `Agent::launch` applies the `logging` configuration section.
//!
//! Kept in its own test binary: the subscriber is process global.

use lifecycle_hooks::{Agent, RunnerInstrumentation};

#[test]
fn test_launch_installs_logger_once() {
    let vars = [
        ("LIFECYCLE_HOOKS_LOGGING__LEVEL", Some("debug")),
        ("LIFECYCLE_HOOKS_LOGGING__FORMAT", Some("json")),
    ];

    let first = temp_env::with_vars(vars, || Agent::launch(&RunnerInstrumentation::new())).unwrap();
    let logger = first.logger().expect("first launch installs the subscriber");
    assert!(!logger.has_file_output());

    let second =
        temp_env::with_vars(vars, || Agent::launch(&RunnerInstrumentation::new())).unwrap();
    assert!(second.logger().is_none(), "existing subscriber is kept");
    assert!(second.hooks().is_installed());
}

#[test]
fn test_invalid_logging_section_fails_launch() {
    let err = temp_env::with_var("LIFECYCLE_HOOKS_LOGGING__LEVEL", Some("chatty"), || {
        Agent::launch(&RunnerInstrumentation::new())
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("chatty"));
}
