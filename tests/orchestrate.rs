use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use pollvisor::{
    Config, ConfigError, Event, EventKind, OrchestrationError, Orchestrator, Reporter,
    RetryPoller, RetryPolicy, Subscribe, TaskError, TaskFn, TaskSpec, TaskState,
};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn kinds_for(&self, task: &str) -> Vec<EventKind> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.task.as_deref() == Some(task))
            .map(|e| e.kind)
            .collect()
    }

    fn all_kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.events.lock().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        base_delay_ms: 100,
        growth_factor: 2.0,
        max_attempts: 5,
    }
}

#[tokio::test]
async fn one_failure_reports_its_message_and_keeps_the_other_result() {
    let mut orch: Orchestrator<String> = Orchestrator::new(Config::default());
    orch.load_task(
        TaskFn::new(|_r: Reporter, _c: CancellationToken| async move {
            Ok::<_, TaskError>("ok".to_string())
        }),
        "Task A",
        "A",
    );
    orch.load_task(
        TaskFn::new(|_r: Reporter, _c: CancellationToken| async move {
            Err::<String, _>(TaskError::fail("boom"))
        }),
        "Task B",
        "B",
    );

    let err = orch.start().await.unwrap_err();
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.as_label(), "orchestration_tasks_failed");

    let failures = err.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "B");
    assert_eq!(failures[0].title, "Task B");

    let partial = err.partial().unwrap();
    assert_eq!(partial.len(), 1);
    assert_eq!(partial.get("A").map(String::as_str), Some("ok"));
}

#[tokio::test]
async fn every_task_succeeding_yields_one_entry_per_task() {
    let mut orch: Orchestrator<usize> = Orchestrator::new(Config::default());
    for i in 0..8 {
        orch.load_task(
            TaskFn::new(move |_r: Reporter, _c: CancellationToken| async move {
                Ok::<_, TaskError>(i * 10)
            }),
            format!("Task {i}"),
            format!("task-{i}"),
        );
    }
    assert_eq!(orch.len(), 8);

    let ctx = orch.start().await.unwrap();
    assert_eq!(ctx.len(), 8);
    assert_eq!(ctx.get("task-7"), Some(&70));
    assert_eq!(ctx.ids().first(), Some(&"task-0"));
}

#[tokio::test]
async fn starting_without_tasks_is_a_configuration_error() {
    let orch: Orchestrator<()> = Orchestrator::new(Config::default());
    match orch.start().await {
        Err(OrchestrationError::Config(ConfigError::NoTasks)) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn polling_tasks_report_progress_to_subscribers() {
    let recorder = Arc::new(Recorder::default());
    let mut orch: Orchestrator<&'static str> = Orchestrator::builder(Config::default())
        .with_subscriber(recorder.clone())
        .build();

    orch.load_task(
        TaskFn::new(|r: Reporter, ctx: CancellationToken| async move {
            r.update_status("submitting");
            let poller = RetryPoller::new(fast_policy())?
                .with_cancel(ctx)
                .with_reporter(r.clone());
            let state = poller
                .poll(
                    |n| async move {
                        Ok::<_, TaskError>(if n < 2 { "In Progress" } else { "Complete" })
                    },
                    |s| *s == "In Progress",
                )
                .await?;
            r.set_title("Deploy eu-west (done)");
            Ok::<_, TaskError>(state)
        }),
        "Deploy eu-west",
        "eu",
    );
    let registry = orch.registry();

    let ctx = orch.start().await.unwrap();
    assert_eq!(ctx.get("eu"), Some(&"Complete"));

    assert_eq!(
        recorder.kinds_for("eu"),
        vec![
            EventKind::TaskStarting,
            EventKind::StatusUpdated,
            EventKind::BackoffScheduled,
            EventKind::BackoffScheduled,
            EventKind::TitleChanged,
            EventKind::TaskSucceeded,
        ]
    );

    let all = recorder.all_kinds();
    assert_eq!(all.first(), Some(&EventKind::OrchestrationStarted));
    assert_eq!(all.last(), Some(&EventKind::OrchestrationFinished));

    let record = registry.get("eu").unwrap();
    assert_eq!(record.state, TaskState::Succeeded);
    assert_eq!(record.title, "Deploy eu-west (done)");
}

#[tokio::test(start_paused = true)]
async fn exhausted_poll_fails_only_its_own_task() {
    let mut orch: Orchestrator<&'static str> = Orchestrator::new(Config::default());
    orch.load_task(
        TaskFn::new(|_r: Reporter, ctx: CancellationToken| async move {
            let policy = RetryPolicy {
                max_attempts: 2,
                ..fast_policy()
            };
            let state = RetryPoller::new(policy)?
                .with_cancel(ctx)
                .poll(
                    |_| async { Ok::<_, TaskError>("In Progress") },
                    |s| *s == "In Progress",
                )
                .await?;
            Ok::<_, TaskError>(state)
        }),
        "Stuck",
        "stuck",
    );
    orch.load_task(
        TaskFn::new(|_r: Reporter, _c: CancellationToken| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, TaskError>("fine")
        }),
        "Slow but fine",
        "slow",
    );

    let err = orch.start().await.unwrap_err();
    let failures = err.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "stuck");
    let msg = failures[0].error.to_string();
    assert!(msg.contains("3 attempts"), "{msg}");
    assert!(msg.contains("In Progress"), "{msg}");
    assert_eq!(err.partial().unwrap().get("slow"), Some(&"fine"));
}

#[tokio::test(start_paused = true)]
async fn caller_cancel_interrupts_backoff() {
    let mut orch: Orchestrator<()> = Orchestrator::new(Config::default());
    orch.load_task(
        TaskFn::new(|_r: Reporter, ctx: CancellationToken| async move {
            let policy = RetryPolicy {
                base_delay_ms: 60_000,
                growth_factor: 1.0,
                max_attempts: 100,
            };
            RetryPoller::new(policy)?
                .with_cancel(ctx)
                .poll(|_| async { Ok::<_, TaskError>(true) }, |busy| *busy)
                .await?;
            Ok::<_, TaskError>(())
        }),
        "Forever",
        "forever",
    );

    let token = orch.cancel_token();
    let started = tokio::time::Instant::now();
    let run = tokio::spawn(orch.start());

    tokio::time::sleep(Duration::from_secs(90)).await;
    token.cancel();

    let err = run.await.unwrap().unwrap_err();
    assert_eq!(err.failures()[0].error, TaskError::Canceled);
    assert!(started.elapsed() < Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn outer_token_cancels_the_run_without_being_cancelled_by_it() {
    let parent = CancellationToken::new();
    let cfg = Config {
        deadline: Duration::from_secs(1),
        ..Config::default()
    };
    let mut orch: Orchestrator<()> = Orchestrator::builder(cfg)
        .with_cancel_token(parent.clone())
        .build();
    orch.load_task(
        TaskFn::new(|_r: Reporter, ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        }),
        "Waits",
        "waits",
    );

    let err = orch.start().await.unwrap_err();
    assert_eq!(err.failures()[0].error, TaskError::Canceled);
    assert!(!parent.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn per_task_timeout_overrides_config_default() {
    let cfg = Config {
        timeout: Duration::from_secs(60),
        ..Config::default()
    };
    let mut orch: Orchestrator<u8> = Orchestrator::new(cfg);
    let slow = TaskFn::new(|_r: Reporter, _c: CancellationToken| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, TaskError>(1)
    });
    orch.load_spec(TaskSpec::new(slow, "Slow", "slow").with_timeout(Some(Duration::from_secs(5))));
    orch.load_task(
        TaskFn::new(|_r: Reporter, _c: CancellationToken| async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, TaskError>(2)
        }),
        "Within default",
        "within",
    );

    let err = orch.start().await.unwrap_err();
    assert_eq!(
        err.failures()[0].error,
        TaskError::Timeout {
            timeout: Duration::from_secs(5)
        }
    );
    assert_eq!(err.partial().unwrap().get("within"), Some(&2));
}

#[tokio::test]
async fn panicking_task_does_not_lose_sibling_results() {
    let mut orch: Orchestrator<u8> = Orchestrator::new(Config::default());
    orch.load_task(
        TaskFn::new(|_r: Reporter, _c: CancellationToken| async move {
            if true {
                panic!("handle bug");
            }
            Ok::<_, TaskError>(0)
        }),
        "Buggy",
        "buggy",
    );
    orch.load_task(
        TaskFn::new(|_r: Reporter, _c: CancellationToken| async move { Ok::<_, TaskError>(9) }),
        "Fine",
        "fine",
    );
    let registry = orch.registry();

    let err = orch.start().await.unwrap_err();
    assert!(matches!(
        err.failures()[0].error,
        TaskError::Panicked { .. }
    ));
    assert_eq!(err.partial().unwrap().get("fine"), Some(&9));
    assert!(registry.is_settled());
    assert_eq!(registry.count(TaskState::Failed), 1);
}

#[tokio::test(start_paused = true)]
async fn config_retry_policy_reaches_task_pollers() {
    let cfg = Config {
        retry: RetryPolicy {
            base_delay_ms: 40,
            growth_factor: 2.0,
            max_attempts: 3,
        },
        ..Config::default()
    };
    let mut orch: Orchestrator<u32> = Orchestrator::new(cfg);
    let mut events = orch.events();
    orch.load_task(
        TaskFn::new(|r: Reporter, ctx: CancellationToken| async move {
            let calls = RetryPoller::for_task(&r, ctx)?
                .poll(|n| async move { Ok::<_, TaskError>(n) }, |n| *n < 2)
                .await?;
            Ok::<_, TaskError>(calls)
        }),
        "Uses run defaults",
        "defaults",
    );

    let ctx = orch.start().await.unwrap();
    assert_eq!(ctx.get("defaults"), Some(&2));

    let mut delays = Vec::new();
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::BackoffScheduled {
            delays.push(ev.delay.unwrap());
        }
    }
    assert_eq!(
        delays,
        vec![Duration::from_millis(40), Duration::from_millis(80)]
    );
}
