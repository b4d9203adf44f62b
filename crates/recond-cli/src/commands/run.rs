//! The `run` command: submit targets and drive pipelines to completion.

use crate::args::RunArgs;
use recond_core::config::ReconConfig;
use recond_core::controller::{BudgetController, SysinfoProvider};
use recond_core::domain::{JobStatus, TargetOverrides};
use recond_core::gate::ToolGate;
use recond_core::pipeline::PipelineContext;
use recond_core::scheduler::Scheduler;
use recond_core::storage::JsonFileStore;
use recond_core::tools::ProcessInvoker;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn execute(args: RunArgs, config: ReconConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let store = Arc::new(JsonFileStore::open(&config.storage.data_dir).await?);
    let scheduler = Scheduler::new(PipelineContext {
        store,
        gate: ToolGate::new(config.tools.clone()),
        invoker: Arc::new(ProcessInvoker),
        config: config.clone(),
    });

    let resumed = scheduler.load().await?;

    // Command-line overrides apply to every target submitted in this run;
    // otherwise per-target overrides from the config file are used.
    let overrides = (args.wordlist.is_some() || args.skip_nikto).then(|| TargetOverrides {
        wordlist: args.wordlist.clone(),
        skip_nikto: args.skip_nikto,
    });

    let mut submitted = 0usize;
    for target in &args.targets {
        match scheduler.submit(target, overrides.clone()).await {
            Ok(job) => {
                info!(target, job = %job, "submitted");
                submitted += 1;
            }
            Err(e) => warn!(target, error = %e, "submission rejected"),
        }
    }

    if submitted == 0 && resumed == 0 {
        println!("Nothing to do: no targets submitted and no persisted jobs to resume.");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let scheduler_task = tokio::spawn(scheduler.clone().run());
    let controller = BudgetController::new(
        config.controller.clone(),
        scheduler.clone(),
        Box::new(SysinfoProvider::new()),
    );
    let controller_task = tokio::spawn(controller.run(shutdown.clone()));

    tokio::select! {
        _ = scheduler.wait_idle() => info!("all pipelines settled"),
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; pipelines stop at their next step boundary");
        }
    }

    scheduler.request_shutdown();
    shutdown.cancel();
    let _ = scheduler_task.await;
    let _ = controller_task.await;

    print_summary(&scheduler);
    Ok(())
}

fn print_summary(scheduler: &Scheduler) {
    let snap = scheduler.snapshot();
    println!();
    println!("Results:");
    for job in &snap.jobs {
        println!("  {:<32} {}", job.target, job.status);
        for step in &job.steps {
            let note = step
                .failure
                .as_deref()
                .or(step.warning.as_deref())
                .unwrap_or("");
            if note.is_empty() {
                println!("    {:<12} {}", step.stage.as_str(), step.status);
            } else {
                println!("    {:<12} {:<8} {}", step.stage.as_str(), step.status.as_str(), note);
            }
        }
    }
    let paused = snap
        .jobs
        .iter()
        .filter(|j| j.status == JobStatus::Paused)
        .count();
    if paused > 0 {
        println!();
        println!("{paused} job(s) paused; run `recond run` again to resume them.");
    }
}
