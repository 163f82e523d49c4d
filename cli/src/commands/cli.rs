use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "codelib", version, about = "Client for the code indexing service")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Overrides `backend.base_url` from config.toml and CODELIB_BACKEND_URL.
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Disables the spinner even on a terminal.
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct IngestArgs {
    /// Source file to upload; wins over --code.
    #[arg(long, group = "input")]
    pub file: Option<String>,

    #[arg(long, group = "input")]
    pub code: Option<String>,

    /// Read the code from stdin.
    #[arg(long, group = "input")]
    pub stdin: bool,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub overlap: Option<u32>,

    /// Print the task id and return without polling.
    #[arg(long, default_value_t = false)]
    pub no_wait: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StatusArgs {
    pub task_id: String,

    /// Keep polling until the task finishes.
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SearchArgs {
    pub query: String,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long)]
    pub language: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ShowArgs {
    pub chunk_id: i64,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SplitArgs {
    pub chunk_id: i64,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub overlap: Option<u32>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MergeArgs {
    /// Chunks to merge, in order.
    #[arg(num_args = 1.., required = true)]
    pub chunk_ids: Vec<i64>,

    #[arg(long)]
    pub name: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CompleteArgs {
    pub chunk_id: i64,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateListArgs {
    #[arg(long, default_value_t = 0)]
    pub skip: u32,

    #[arg(long, default_value_t = 100)]
    pub limit: u32,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateShowArgs {
    pub template_id: i64,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateCreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Chunks that make up the template, in order.
    #[arg(num_args = 0..)]
    pub chunk_ids: Vec<i64>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateApplyArgs {
    pub template_id: i64,

    /// Parameter value (NAME=VALUE). Can be specified multiple times.
    #[arg(long = "param", action = clap::ArgAction::Append)]
    pub params: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    List(TemplateListArgs),
    Show(TemplateShowArgs),
    Create(TemplateCreateArgs),
    Apply(TemplateApplyArgs),
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit code for chunking and indexing.
    Ingest(IngestArgs),
    /// Show or follow the status of an ingestion task.
    Status(StatusArgs),
    Search(SearchArgs),
    Show(ShowArgs),
    Split(SplitArgs),
    Merge(MergeArgs),
    Complete(CompleteArgs),
    #[command(subcommand)]
    Templates(TemplateCommands),
}
