use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ListResult, ProgressEvent, ProgressSink};

pub const TSV_HEADER: &str = "Metagenome\tFile Name\tFile ID\tChecksum\tByte Size";

pub struct TsvOutput;

impl TsvOutput {
    pub fn write_list<W: Write>(result: &ListResult, out: &mut W) -> io::Result<()> {
        writeln!(out, "{TSV_HEADER}")?;
        for entry in &result.files {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                entry.metagenome, entry.file_name, entry.file_id, entry.checksum, entry.byte_size
            )?;
        }
        out.flush()
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::write_list(result, &mut io::stdout().lock())
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Prints `Downloading <file> for <metagenome> ... Done` lines on stdout;
/// phase changes go to the log.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        let mut stdout = io::stdout().lock();
        let written = match event {
            ProgressEvent::Phase(message) => {
                tracing::info!("{message}");
                Ok(())
            }
            ProgressEvent::DownloadStarted {
                metagenome,
                file_name,
            } => write!(stdout, "Downloading {file_name} for {metagenome} ... ")
                .and_then(|()| stdout.flush()),
            ProgressEvent::DownloadFinished { bytes, elapsed } => {
                tracing::debug!(bytes, elapsed_ms = elapsed.as_millis() as u64, "transfer done");
                writeln!(stdout, "Done")
            }
        };
        if let Err(err) = written {
            tracing::debug!(%err, "progress output lost");
        }
    }
}
