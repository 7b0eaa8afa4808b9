use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress bar sized to the one-time count of matching documents, drawn to
/// stderr so it never mixes with output redirection.
pub fn setup_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {msg}) {eta}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
