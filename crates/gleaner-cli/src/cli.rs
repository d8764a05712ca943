//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Gleaner - Extract schema-shaped records from text with a local LLM.
#[derive(Debug, Parser)]
#[command(name = "gleaner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (one compact JSON record per line)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract records from text using a schema
    Extract(ExtractArgs),

    /// Print the prompt an extraction would send, without generating
    Prompt(PromptArgs),

    /// Validate a saved completion against a schema
    Validate(ValidateArgs),

    /// Print the text layer of a PDF
    PdfText(PdfTextArgs),

    /// List known schemas
    Schemas,
}

/// Where the input text comes from.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Read text from a file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Read text from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Read text from a PDF
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Page range of the PDF to use (e.g. 120 or 120-122)
    #[arg(long)]
    pub pages: Option<String>,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Schema name or path to a schema file
    #[arg(short, long, default_value = "facets")]
    pub schema: String,

    #[command(flatten)]
    pub source: InputArgs,

    /// Model to use
    #[arg(short, long, env = "GLEANER_MODEL")]
    pub model: Option<String>,

    /// Generator endpoint (e.g., http://localhost:11434)
    #[arg(short, long, env = "GLEANER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Token budget per completion
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Retries after a timeout or unavailable generator
    #[arg(long)]
    pub retries: Option<u32>,

    /// Deadline per generator call, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not re-prompt after an invalid completion
    #[arg(long)]
    pub no_reprompt: bool,

    /// Pass the schema to the generator for constrained decoding
    #[arg(long)]
    pub constrained: bool,
}

/// Arguments for the prompt command.
#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// Schema name or path to a schema file
    #[arg(short, long, default_value = "facets")]
    pub schema: String,

    #[command(flatten)]
    pub source: InputArgs,
}

/// Arguments for the validate command.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Schema name or path to a schema file
    #[arg(short, long, default_value = "facets")]
    pub schema: String,

    /// File holding the raw completion
    #[arg(long)]
    pub completion: Option<PathBuf>,

    /// Read the completion from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for the pdf-text command.
#[derive(Debug, Parser)]
pub struct PdfTextArgs {
    /// PDF file
    pub file: PathBuf,

    /// Page range to print (e.g. 120 or 120-122)
    #[arg(long)]
    pub pages: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
