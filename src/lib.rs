pub mod cli;
pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod output;
pub mod processing;
pub mod query;
pub mod retrieval;

pub use error::ExtractError;
pub use retrieval::{RunOutcome, RunStats};

pub async fn run() -> Result<RunOutcome, ExtractError> {
    use clap::Parser;

    let args = cli::Cli::parse();
    let settings = config::Settings::resolve(args)?;

    // Configure logger from the merged debug/verbose flags
    let level = if settings.debug {
        log::LevelFilter::Debug
    } else if settings.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
    console::set_colors_enabled(true);

    log::debug!("config dump: {:?}", settings);
    if settings.limit == 0 {
        log::warn!("no limit defined, this might take a LONG time");
    }

    log::info!(
        "Extracting from index pattern {} at {}",
        settings.index,
        settings.url.as_str()
    );

    let client = elasticsearch::connect_with_retry(&settings).await?;
    elasticsearch::check_cluster_health(&client, &settings.index).await?;

    let outfile = output::resolve_outfile(settings.outfile.as_deref());
    let mut sink = output::create_file_sink(&outfile).await?;

    let outcome = retrieval::run_extraction(&client, &settings, &mut sink).await?;

    let stats = outcome.stats();
    log::info!(
        "Done: {} records written to {} ({} hits processed, {} excluded, {} malformed)",
        stats.emitted,
        outfile,
        stats.raw_hits,
        stats.excluded,
        stats.failed
    );

    Ok(outcome)
}
