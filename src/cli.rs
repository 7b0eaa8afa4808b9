use clap::Parser;

/// Command-line surface. Every option can also come from the YAML config
/// file; values explicitly supplied here win. See
/// [`crate::config::Settings::resolve`] for the merge rules.
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    author,
    version,
    about = "Bulk extraction client for leaked-credential Elasticsearch indices"
)]
pub struct Cli {
    /// Path to a YAML config file providing defaults for the options below
    #[clap(long)]
    pub config: Option<String>,

    /// Elasticsearch endpoint URL (e.g. https://search.example.com:9200)
    #[clap(long)]
    pub url: Option<String>,

    /// Elasticsearch index pattern, e.g. leak_linkedin (default: leak_*)
    #[clap(long)]
    pub index: Option<String>,

    /// Elasticsearch username
    #[clap(long)]
    pub username: Option<String>,

    /// Elasticsearch password
    #[clap(long)]
    pub password: Option<String>,

    /// Output filename (default: output_<unix-seconds>.csv)
    #[clap(long)]
    pub outfile: Option<String>,

    /// Email address to search
    #[clap(long)]
    pub email: Option<String>,

    /// Domain to search (matches every address at the domain)
    #[clap(long)]
    pub domain: Option<String>,

    /// Password value to search
    #[clap(long)]
    pub pass: Option<String>,

    /// Maximum number of results to extract, 0 for no limit
    #[clap(long)]
    pub limit: Option<u64>,

    /// Enable per-page timing output
    #[clap(long)]
    pub verbose: bool,

    /// Enable debug logging
    #[clap(long)]
    pub debug: bool,
}
