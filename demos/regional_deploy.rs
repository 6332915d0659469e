//! # Example: regional_deploy
//!
//! Three regional "deployments" run side by side. Each one submits a job to a
//! fake control plane, then polls its status with a [`RetryPoller`] until the
//! job leaves the `Provisioning` state. One region never gets capacity and
//! runs out of attempts.
//!
//! ## Flow
//! ```text
//! Orchestrator::start()
//!   ├─► publish(OrchestrationStarted)
//!   ├─► deploy-eu ─► submit ─► poll: Provisioning, Provisioning, Ready      ─► Ok
//!   ├─► deploy-us ─► submit ─► poll: Provisioning ×4, Ready                 ─► Ok
//!   ├─► deploy-ap ─► submit ─► poll: Provisioning … (attempts exhausted)    ─► Err
//!   └─► publish(OrchestrationFinished)
//!
//! result: Err(TasksFailed { failures: [deploy-ap], partial: {eu, us} })
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example regional_deploy --features logging
//! ```

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pollvisor::{
    Config, LogWriter, Orchestrator, Reporter, RetryPoller, RetryPolicy, Subscribe, TaskError,
    TaskFn, TaskRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Provisioning,
    Ready,
}

/// Fake control plane: a job becomes ready after `ready_after` status checks.
async fn job_status(ready_after: Option<u32>, check: u32) -> Result<JobState, String> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    match ready_after {
        Some(n) if check >= n => Ok(JobState::Ready),
        _ => Ok(JobState::Provisioning),
    }
}

fn deploy(region: &'static str, ready_after: Option<u32>) -> TaskRef<String> {
    TaskFn::boxed(move |r: Reporter, ctx: CancellationToken| async move {
        r.update_status(format!("submitting job to {region}"));
        let job_id = format!("job-{region}-0001");

        let poller = RetryPoller::for_task(&r, ctx)?;

        r.update_status(format!("waiting for {job_id}"));
        poller
            .poll(
                |check| job_status(ready_after, check),
                |state| *state == JobState::Provisioning,
            )
            .await?;

        r.set_title(format!("Deploy {region} (live)"));
        Ok::<_, TaskError>(format!("https://{region}.example.internal/{job_id}"))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config {
        deadline: Duration::from_secs(30),
        cancel_on_signal: true,
        retry: RetryPolicy {
            base_delay_ms: 50,
            growth_factor: 1.5,
            max_attempts: 5,
        },
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mut orch: Orchestrator<String> = Orchestrator::builder(cfg).with_subscribers(subs).build();

    orch.load_task(deploy("eu-west", Some(2)), "Deploy eu-west", "deploy-eu")
        .load_task(deploy("us-east", Some(4)), "Deploy us-east", "deploy-us")
        .load_task(deploy("ap-south", None), "Deploy ap-south", "deploy-ap");

    match orch.start().await {
        Ok(ctx) => {
            for (id, url) in &ctx {
                println!("{id}: {url}");
            }
        }
        Err(err) => {
            println!("run failed: {err}");
            if let Some(partial) = err.partial() {
                for id in partial.ids() {
                    println!("  still deployed: {id}");
                }
            }
        }
    }
    Ok(())
}
