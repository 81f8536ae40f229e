use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-image latency log, one `name<TAB>ms` line per image.
pub struct TimingLog {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl TimingLog {
    pub fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create timing log {}", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    pub fn record(&mut self, name: &str, elapsed: Duration) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", format_entry(name, elapsed))?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Flush and close the log, returning its path.
    pub fn finish(mut self) -> anyhow::Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush timing log {}", self.path.display()))?;
        Ok(self.path)
    }
}

pub fn format_entry(name: &str, elapsed: Duration) -> String {
    format!("{}\t{:.4} ms", name, elapsed.as_secs_f64() * 1000.0)
}
