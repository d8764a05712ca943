//! PDF text command implementation.

use crate::cli::PdfTextArgs;
use crate::commands::read_pdf;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;
use gleaner_domain::split_pages;
use serde_json::json;

/// Execute the pdf-text command.
pub async fn execute_pdf_text(args: PdfTextArgs, formatter: &Formatter) -> Result<()> {
    let source = read_pdf(&args.file, args.pages.as_deref())?;

    match formatter.format() {
        OutputFormat::Json => {
            let output = json!({
                "source_id": source.source_id,
                "pages": split_pages(&source.text),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table | OutputFormat::Quiet => print!("{}", source.text),
    }

    Ok(())
}
