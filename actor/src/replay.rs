//! JSON-lines replay file for finished self-play games
//!
//! Each completed game is appended as one JSON object per line to
//! `<data_dir>/histories.jsonl`, so successive runs accumulate into one
//! file the trainer can stream.

use anyhow::{Context, Result};
use mcts::GameHistory;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One line of the replay file
#[derive(Serialize)]
struct HistoryRecord<'a, S> {
    env_id: &'a str,
    #[serde(flatten)]
    history: &'a GameHistory<S>,
}

/// Appends game histories to a JSON-lines file.
pub struct HistoryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl HistoryWriter {
    /// Open `path` for appending, creating it and its parent directory if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open replay file {}", path.display()))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one game.
    pub fn write<S: Serialize>(&mut self, env_id: &str, history: &GameHistory<S>) -> Result<()> {
        let record = HistoryRecord { env_id, history };
        serde_json::to_writer(&mut self.writer, &record)
            .with_context(|| format!("Failed to serialize game {}", history.game_index))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Append every game in `histories` and flush.
    pub fn write_all<S: Serialize>(
        &mut self,
        env_id: &str,
        histories: &[GameHistory<S>],
    ) -> Result<usize> {
        for history in histories {
            self.write(env_id, history)?;
        }
        self.flush()?;
        Ok(histories.len())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        debug!(path = %self.path.display(), games = self.written, "Flushed replay file");
        Ok(())
    }

    /// Games written through this writer
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
