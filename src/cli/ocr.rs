//! OCR command: upload an image and wait for the recognized text

use std::path::Path;

use colored::Colorize;

use crate::cli::progress::TaskProgress;
use crate::cli::{CommandContext, OutputFormat, PollArgs};
use crate::client::models::{ImageUpload, OcrResult};
use crate::error::Result;
use crate::models::OcrDisplay;
use crate::output::{self, table};

/// Run the ocr command
pub async fn run(
    ctx: &CommandContext,
    image: &Path,
    no_wait: bool,
    poll: &PollArgs,
) -> Result<()> {
    if no_wait {
        let task_id = submit(ctx, image).await?;
        return print_submitted(ctx.format, &task_id);
    }

    let (task_id, ocr) = recognize(ctx, image, poll).await?;
    render(ctx.format, &task_id, &ocr)
}

/// Upload an image, returning the OCR task ID
pub async fn submit(ctx: &CommandContext, image: &Path) -> Result<String> {
    let upload = ImageUpload::from_path(image)?;
    log::debug!(
        "Uploading {} ({} bytes, {})",
        upload.file_name,
        upload.bytes.len(),
        upload.mime_type
    );

    let submitted = ctx.client.upload_image(upload).await?;
    if let Some(ref message) = submitted.message {
        log::info!("{}", message);
    }
    Ok(submitted.task_id)
}

/// Upload an image and poll its OCR task to completion
pub async fn recognize(
    ctx: &CommandContext,
    image: &Path,
    poll: &PollArgs,
) -> Result<(String, OcrResult)> {
    let task_id = submit(ctx, image).await?;
    let options = ctx.poll_options(poll);

    let progress = TaskProgress::new("Recognizing", options.max_attempts, ctx.format);
    let result = ctx
        .client
        .wait_for_ocr(&task_id, options, &ctx.cancel, &mut |u| progress.update(u))
        .await;
    progress.finish();

    Ok((task_id, result?))
}

/// Print a submitted task ID
pub fn print_submitted(format: OutputFormat, task_id: &str) -> Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({ "taskId": task_id })),
        _ => {
            println!("{}", task_id);
            Ok(())
        }
    }
}

/// Print an OCR result
pub fn render(format: OutputFormat, task_id: &str, ocr: &OcrResult) -> Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "taskId": task_id,
            "result": ocr,
        })),
        OutputFormat::Table => output::print(&vec![OcrDisplay::from(ocr)], format),
        OutputFormat::Pretty => {
            let display = OcrDisplay::from(ocr);
            println!("{}", "Recognized question".bold());
            println!(
                "{}",
                table::format_details(&[
                    ("Text", display.text),
                    ("LaTeX", display.latex),
                    ("Confidence", display.confidence),
                    ("Task", task_id.to_string()),
                ])
            );
            Ok(())
        }
    }
}
