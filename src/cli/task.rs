//! Task command: inspect or wait on a submitted task

use serde::Serialize;

use crate::cli::progress::TaskProgress;
use crate::cli::{CommandContext, OutputFormat, PollArgs, TaskKind, analyze, ocr};
use crate::client::models::{TaskSnapshot, TaskStatus, TaskUpdate};
use crate::error::Result;
use crate::models::TaskDisplay;
use crate::output::{self, table};

/// Run the task command
pub async fn run(
    ctx: &CommandContext,
    kind: TaskKind,
    task_id: &str,
    wait: bool,
    poll: &PollArgs,
) -> Result<()> {
    if wait {
        return wait_for(ctx, kind, task_id, poll).await;
    }

    match kind {
        TaskKind::Ocr => {
            let snapshot = ctx.client.ocr_result(task_id).await?;
            render_snapshot(ctx.format, &snapshot, |r| ocr::render(ctx.format, task_id, r))
        }
        TaskKind::Analysis => {
            let snapshot = ctx.client.analysis_result(task_id).await?;
            render_snapshot(ctx.format, &snapshot, |r| analyze::render(ctx.format, task_id, r))
        }
    }
}

async fn wait_for(
    ctx: &CommandContext,
    kind: TaskKind,
    task_id: &str,
    poll: &PollArgs,
) -> Result<()> {
    let options = ctx.poll_options(poll);
    let progress = TaskProgress::new("Waiting", options.max_attempts, ctx.format);
    let mut on_update = |u: &TaskUpdate| progress.update(u);

    let outcome = match kind {
        TaskKind::Ocr => ctx
            .client
            .wait_for_ocr(task_id, options, &ctx.cancel, &mut on_update)
            .await
            .map(|r| ocr::render(ctx.format, task_id, &r)),
        TaskKind::Analysis => ctx
            .client
            .wait_for_analysis(task_id, options, &ctx.cancel, &mut on_update)
            .await
            .map(|r| analyze::render(ctx.format, task_id, &r)),
    };
    progress.finish();
    outcome?
}

/// Show one snapshot; a completed one is shown with its result
fn render_snapshot<R, F>(
    format: OutputFormat,
    snapshot: &TaskSnapshot<R>,
    render_result: F,
) -> Result<()>
where
    R: Serialize,
    F: FnOnce(&R) -> Result<()>,
{
    if format == OutputFormat::Json {
        return output::print_json(snapshot);
    }

    if let (TaskStatus::Completed, Some(result)) = (snapshot.status, snapshot.result.as_ref()) {
        return render_result(result);
    }

    let display = TaskDisplay::from(snapshot);
    match format {
        OutputFormat::Pretty => {
            let mut rows = vec![
                ("Task", display.task_id),
                ("Status", display.status),
                ("Progress", display.progress),
            ];
            if !display.error.is_empty() {
                rows.push(("Error", display.error));
            }
            println!("{}", table::format_details(&rows));
            Ok(())
        }
        _ => output::print(&vec![display], format),
    }
}
