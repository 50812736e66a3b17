// tests/executor_lifecycle.rs

use std::time::Duration;

use cyclexec::app::{IterativeApplicationHandler, PhaseAttempts};
use cyclexec::exec::{Executor, ExecutorBuilder, ExecutorSettings, ExecutorState};
use cyclexec::trigger::{PeriodicTrigger, Trigger};
use cyclexec::types::{MethodState, When};
use cyclexec_test_utils::fakes::{
    FakeEnvironment, FakePosixHelper, InstantTrigger, Journal, RecordingCheckpoint, ScriptedApp,
    ScriptedHandler,
};
use cyclexec_test_utils::{init_tracing, with_timeout};

fn executor_with(
    journal: &Journal,
    env: FakeEnvironment,
    os: FakePosixHelper,
    trigger: impl Trigger + 'static,
) -> Executor {
    ExecutorBuilder::new(ExecutorSettings::default())
        .environment(env)
        .posix_helper(os)
        .trigger(trigger)
        .checkpoint(RecordingCheckpoint::ok("before-1", When::Before, journal))
        .unwrap()
        .checkpoint(RecordingCheckpoint::ok("before-2", When::Before, journal))
        .unwrap()
        .checkpoint(RecordingCheckpoint::ok("after-1", When::After, journal))
        .unwrap()
        .build()
}

fn instant_executor(journal: &Journal, terminate_after: u32) -> Executor {
    executor_with(
        journal,
        FakeEnvironment::new(journal.clone()).terminate_after(terminate_after),
        FakePosixHelper::new(journal.clone()),
        InstantTrigger::new(journal.clone()),
    )
}

#[test]
fn three_cycles_on_a_100ms_period_then_clean_termination() {
    init_tracing();

    let journal = Journal::new();
    let j = journal.clone();
    let (ok, cycles, state) = with_timeout(move || {
        let mut executor = executor_with(
            &j,
            FakeEnvironment::new(j.clone()).terminate_after(3),
            FakePosixHelper::new(j.clone()),
            PeriodicTrigger::periodic(Duration::from_millis(100), Duration::ZERO),
        );
        executor.set_application_handler(Box::new(ScriptedHandler::new(j.clone())));
        let ok = executor.run();
        (ok, executor.cycles(), executor.state())
    });

    assert!(ok);
    assert_eq!(cycles, 3);
    assert_eq!(state, ExecutorState::Terminated);

    assert_eq!(journal.count("checkpoint:before-1"), 3);
    assert_eq!(journal.count("checkpoint:before-2"), 3);
    assert_eq!(journal.count("checkpoint:after-1"), 3);
    assert_eq!(journal.count("handler:execute"), 3);

    let per_cycle = ["checkpoint:before-1", "checkpoint:before-2", "handler:execute", "checkpoint:after-1"];
    let observed: Vec<String> = journal
        .entries()
        .into_iter()
        .filter(|e| e.starts_with("checkpoint:") || e == "handler:execute")
        .collect();
    let expected: Vec<String> = per_cycle
        .iter()
        .cycle()
        .take(per_cycle.len() * 3)
        .map(|s| s.to_string())
        .collect();
    assert_eq!(observed, expected);
}

#[test]
fn lifecycle_calls_happen_in_order() {
    let journal = Journal::new();
    let mut executor = instant_executor(&journal, 1);
    executor.set_application_handler(Box::new(ScriptedHandler::new(journal.clone())));

    assert!(executor.run());

    let expected = vec![
        "os:oom_handler",
        "env:init",
        "os:env_check:^LD_PRELOAD=",
        "os:fpu",
        "handler:initialize",
        "env:state:Running",
        "handler:prepare_for_execute",
        "os:drop_privileges",
        "trigger",
        "env:refresh",
        "checkpoint:before-1",
        "checkpoint:before-2",
        "handler:execute",
        "checkpoint:after-1",
        "handler:prepare_for_shutdown",
        "handler:shutdown",
        "env:state:Terminate",
    ];
    assert_eq!(journal.entries(), expected);
}

#[test]
fn failed_initialize_only_runs_shutdown() {
    let journal = Journal::new();
    let mut executor = instant_executor(&journal, 1);
    let mut handler = ScriptedHandler::new(journal.clone());
    handler.initialize = false;
    executor.set_application_handler(Box::new(handler));

    assert!(!executor.run());
    assert_eq!(executor.state(), ExecutorState::Failed);

    let handler_calls = journal.with_prefix("handler:");
    assert_eq!(handler_calls, vec!["handler:initialize", "handler:shutdown"]);
    assert_eq!(journal.count("env:state:Running"), 0);
    assert_eq!(journal.count("trigger"), 0);
}

#[test]
fn failed_prepare_for_execute_runs_the_shutdown_pair() {
    let journal = Journal::new();
    let mut executor = instant_executor(&journal, 1);
    let mut handler = ScriptedHandler::new(journal.clone());
    handler.prepare_for_execute = false;
    executor.set_application_handler(Box::new(handler));

    assert!(!executor.run());

    assert_eq!(
        journal.with_prefix("handler:"),
        vec![
            "handler:initialize",
            "handler:prepare_for_execute",
            "handler:prepare_for_shutdown",
            "handler:shutdown",
        ]
    );
    assert_eq!(journal.count("os:drop_privileges"), 0);
    assert_eq!(journal.count("env:state:Terminate"), 0);
}

#[test]
fn privilege_drop_failure_skips_the_loop() {
    let journal = Journal::new();
    let mut os = FakePosixHelper::new(journal.clone());
    os.drop_ok = false;
    let mut executor = executor_with(
        &journal,
        FakeEnvironment::new(journal.clone()).terminate_after(5),
        os,
        InstantTrigger::new(journal.clone()),
    );
    executor.set_application_handler(Box::new(ScriptedHandler::new(journal.clone())));

    assert!(!executor.run());
    assert_eq!(journal.count("trigger"), 0);
    assert_eq!(journal.count("handler:execute"), 0);
    assert_eq!(journal.count("handler:prepare_for_shutdown"), 1);
    assert_eq!(journal.count("handler:shutdown"), 1);
}

#[test]
fn before_checkpoint_error_stops_the_loop_before_execute() {
    let journal = Journal::new();
    let mut executor = ExecutorBuilder::new(ExecutorSettings::default())
        .environment(FakeEnvironment::new(journal.clone()).terminate_after(5))
        .posix_helper(FakePosixHelper::new(journal.clone()))
        .trigger(InstantTrigger::new(journal.clone()))
        .checkpoint(RecordingCheckpoint::failing("watchdog", When::Before, 7, &journal))
        .unwrap()
        .checkpoint(RecordingCheckpoint::ok("after", When::After, &journal))
        .unwrap()
        .build();
    executor.set_application_handler(Box::new(ScriptedHandler::new(journal.clone())));

    assert!(!executor.run());
    assert_eq!(executor.cycles(), 0);
    assert_eq!(journal.count("handler:execute"), 0);
    assert_eq!(journal.count("checkpoint:after"), 0);
    assert_eq!(journal.count("handler:shutdown"), 1);
}

#[test]
fn failing_execute_ends_the_run_after_completed_cycles() {
    let journal = Journal::new();
    let mut executor = instant_executor(&journal, 10);
    executor.set_application_handler(Box::new(
        ScriptedHandler::new(journal.clone()).execute_returns([true, false]),
    ));

    assert!(!executor.run());
    assert_eq!(executor.cycles(), 1);
    assert_eq!(journal.count("handler:execute"), 2);
    // The failing cycle never reaches its after-checkpoints.
    assert_eq!(journal.count("checkpoint:after-1"), 1);
    assert_eq!(journal.count("handler:prepare_for_shutdown"), 1);
    assert_eq!(journal.count("handler:shutdown"), 1);
}

#[test]
fn failed_shutdown_turns_a_clean_loop_into_failure() {
    let journal = Journal::new();
    let mut executor = instant_executor(&journal, 2);
    let mut handler = ScriptedHandler::new(journal.clone());
    handler.shutdown = false;
    executor.set_application_handler(Box::new(handler));

    assert!(!executor.run());
    assert_eq!(executor.cycles(), 2);
    assert_eq!(journal.count("env:state:Terminate"), 0);
}

#[test]
fn closed_trigger_gate_does_not_skip_the_cycle() {
    let journal = Journal::new();
    let mut executor = executor_with(
        &journal,
        FakeEnvironment::new(journal.clone()).terminate_after(3),
        FakePosixHelper::new(journal.clone()),
        InstantTrigger::new(journal.clone()).with_gates([false, false]),
    );
    executor.set_application_handler(Box::new(ScriptedHandler::new(journal.clone())));

    assert!(executor.run());
    assert_eq!(journal.count("handler:execute"), 3);
}

#[test]
fn refresh_failure_is_not_fatal() {
    let journal = Journal::new();
    let mut executor = executor_with(
        &journal,
        FakeEnvironment::new(journal.clone())
            .terminate_after(2)
            .failing_refresh(),
        FakePosixHelper::new(journal.clone()),
        InstantTrigger::new(journal.clone()),
    );
    executor.set_application_handler(Box::new(ScriptedHandler::new(journal.clone())));

    assert!(executor.run());
    assert_eq!(executor.cycles(), 2);
}

#[test]
fn run_without_handler_fails_before_touching_the_environment() {
    let journal = Journal::new();
    let mut executor = instant_executor(&journal, 1);

    assert!(!executor.run());
    assert_eq!(journal.count("env:init"), 0);
    assert_eq!(executor.state(), ExecutorState::Uninitialized);
}

#[test]
fn init_checks_gate_the_initialized_state() {
    let journal = Journal::new();
    let mut os = FakePosixHelper::new(journal.clone());
    os.fpu_ok = false;
    let mut executor = executor_with(
        &journal,
        FakeEnvironment::new(journal.clone()),
        os,
        InstantTrigger::new(journal.clone()),
    );
    executor.set_application_handler(Box::new(ScriptedHandler::new(journal.clone())));

    assert!(!executor.init());
    assert_eq!(executor.state(), ExecutorState::Uninitialized);
    assert!(!executor.run());
    assert_eq!(journal.count("handler:initialize"), 0);
}

#[test]
fn env_var_check_failure_stops_before_the_fpu_check() {
    let journal = Journal::new();
    let mut os = FakePosixHelper::new(journal.clone());
    os.env_ok = false;
    let mut executor = executor_with(
        &journal,
        FakeEnvironment::new(journal.clone()),
        os,
        InstantTrigger::new(journal.clone()),
    );

    assert!(!executor.init());
    assert_eq!(journal.count("os:fpu"), 0);
}

#[test]
fn environment_init_failure_fails_init() {
    let journal = Journal::new();
    let mut executor = executor_with(
        &journal,
        FakeEnvironment::new(journal.clone()).failing_init(),
        FakePosixHelper::new(journal.clone()),
        InstantTrigger::new(journal.clone()),
    );

    assert!(!executor.init());
    assert!(journal.with_prefix("os:env_check").is_empty());
}

#[test]
fn init_is_idempotent() {
    let journal = Journal::new();
    let mut executor = instant_executor(&journal, 1);

    assert!(executor.init());
    assert!(executor.init());
    assert_eq!(journal.count("env:init"), 1);
    assert_eq!(executor.state(), ExecutorState::Initialized);
}

#[test]
fn iterative_handler_drives_the_application_through_the_executor() {
    let journal = Journal::new();
    let app = ScriptedApp::new(journal.clone())
        .on_initialize_returns([MethodState::OnGoing, MethodState::Successful])
        .step_returns([MethodState::OnGoing, MethodState::Successful]);
    let handler = IterativeApplicationHandler::new(
        app,
        InstantTrigger::new(Journal::new()),
        PhaseAttempts::uniform(3),
    );

    let mut executor = instant_executor(&journal, 2);
    executor.set_application_handler(Box::new(handler));

    assert!(executor.run());
    assert_eq!(
        journal.with_prefix("app:"),
        vec![
            "app:on_initialize",
            "app:on_initialize",
            "app:on_start",
            "app:step",
            "app:step",
            "app:on_stop",
            "app:on_terminate",
        ]
    );
}
