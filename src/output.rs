use chrono::Utc;
use log::{debug, warn};
use tokio::{
    fs as tokio_fs,
    io::{AsyncWrite, AsyncWriteExt, BufWriter as TokioBufWriter},
};

use crate::error::ExtractError;

/// Header row written exactly once per run, before the first page.
pub const CSV_HEADER: &str = "email,password,breach_name\n";

/// Buffered CSV sink. Exclusively owns the destination handle for the run's
/// duration; flushed once per page to bound memory and limit loss on crash.
pub struct CsvSink<W> {
    writer: TokioBufWriter<W>,
    bytes_written: u64,
}

impl<W: AsyncWrite + Unpin> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        CsvSink {
            writer: TokioBufWriter::new(writer),
            bytes_written: 0,
        }
    }

    /// Write the fixed three-column header.
    pub async fn write_header(&mut self) -> Result<(), ExtractError> {
        self.writer.write_all(CSV_HEADER.as_bytes()).await?;
        self.bytes_written += CSV_HEADER.len() as u64;
        Ok(())
    }

    /// Append one page worth of rendered records.
    pub async fn write_batch(&mut self, buffer: &[u8]) -> Result<(), ExtractError> {
        self.writer.write_all(buffer).await?;
        self.bytes_written += buffer.len() as u64;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), ExtractError> {
        self.writer.flush().await?;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// Pick the output path, generating a timestamped name when none was given.
pub fn resolve_outfile(outfile: Option<&str>) -> String {
    match outfile {
        Some(path) => path.to_string(),
        None => {
            let generated = format!("output_{}.csv", Utc::now().timestamp());
            warn!(
                "no outfile specified, automatically generating one: {}",
                generated
            );
            generated
        }
    }
}

/// Open the output file for writing, truncating any previous contents.
pub async fn create_file_sink(path: &str) -> Result<CsvSink<tokio_fs::File>, ExtractError> {
    debug!("Using file for output: {}", path);
    let file = tokio_fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| ExtractError::Output {
            path: path.to_string(),
            source: e,
        })?;

    debug!("Output file opened successfully");
    Ok(CsvSink::new(file))
}
