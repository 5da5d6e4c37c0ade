//! Command handlers.

use anyhow::Context;
use shotlist::{
    GeminiClient, GenerationQueue, LlmStudio, Pipeline, PipelineEvent, PipelinePhase,
    RetryPolicy, ShotlistConfig, Snapshot, render_text,
};
use std::path::Path;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, instrument};

type GeminiPipeline = Pipeline<LlmStudio<GeminiClient>>;

fn build_pipeline(config: &ShotlistConfig) -> anyhow::Result<GeminiPipeline> {
    let client = GeminiClient::from_config(config.model())?;
    let studio = LlmStudio::new(client, RetryPolicy::from_config(config.retry()));
    Ok(Pipeline::new(
        studio,
        GenerationQueue::from_config(config.queue()),
    ))
}

/// Print progress to stderr until the pipeline is dropped.
fn report_progress(mut events: Receiver<PipelineEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PipelineEvent::PhaseChanged { to, .. }) => match to {
                    PipelinePhase::GeneratingScript => eprintln!("Writing script..."),
                    PipelinePhase::GeneratingPrompts => eprintln!("Generating prompts..."),
                    _ => {}
                },
                Ok(PipelineEvent::Progress(Some(progress))) => {
                    eprintln!("  [{}/{}]", progress.current(), progress.total());
                }
                Ok(PipelineEvent::ItemFailed { group_id, message }) => {
                    eprintln!("  group {} failed: {}", group_id, message);
                }
                Ok(PipelineEvent::Error(message)) => eprintln!("Error: {}", message),
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn write_output(path: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}

fn read_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Snapshot::from_json(&json)?)
}

/// Run the whole pipeline from a brief.
#[instrument(skip(config, brief))]
pub async fn generate(
    config: &ShotlistConfig,
    brief: &str,
    shots: usize,
    out: Option<&Path>,
    text: Option<&Path>,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let printer = report_progress(pipeline.subscribe());

    pipeline.submit_brief(brief, shots).await?;
    let report = pipeline.confirm_script().await?;
    info!(attempted = report.attempted(), failed = report.failed().len(), "Prompts generated");

    let snapshot = pipeline.export_snapshot().await?;
    drop(pipeline);
    let _ = printer.await;

    write_output(out, &snapshot.to_json()?)?;
    if let Some(path) = text {
        let (bundle, prompts) = snapshot.into_parts();
        write_output(Some(path), &render_text(&bundle, &prompts))?;
    }
    Ok(())
}

/// Fill in missing prompts, optionally regenerating one group.
#[instrument(skip(config))]
pub async fn prompts(
    config: &ShotlistConfig,
    input: &Path,
    group: Option<u32>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let snapshot = read_snapshot(input)?;
    let pipeline = build_pipeline(config)?;
    let printer = report_progress(pipeline.subscribe());

    pipeline.import_snapshot(snapshot).await?;
    let pending = pipeline.snapshot().await.pending_groups();
    pipeline.confirm_script().await?;
    if let Some(group_id) = group {
        // A group that was pending has just been generated.
        if !pending.contains(&group_id) {
            pipeline.regenerate_group(group_id).await?;
        }
    }

    let snapshot = pipeline.export_snapshot().await?;
    drop(pipeline);
    let _ = printer.await;

    write_output(out, &snapshot.to_json()?)
}

/// Print the text rendering of a snapshot.
pub fn render(input: &Path) -> anyhow::Result<()> {
    let snapshot = read_snapshot(input)?;
    snapshot.validate()?;
    let (bundle, prompts) = snapshot.into_parts();
    write_output(None, &render_text(&bundle, &prompts))
}
