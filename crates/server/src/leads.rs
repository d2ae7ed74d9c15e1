//! Hot-lead record file
//!
//! Append-only line log of hand-off alerts, one per sales-ready session.
//! The operator also gets a WhatsApp alert; this file is the durable copy
//! that survives the process.

use std::io;
use std::path::PathBuf;

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use zap_agent_agent::HandoffAlert;

/// Append-only lead log
pub struct LeadLog {
    path: PathBuf,
}

impl LeadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one hand-off record. Newlines in the triggering text are
    /// flattened so the file stays one record per line.
    pub async fn append(&self, alert: &HandoffAlert) -> io::Result<()> {
        let line = format!(
            "{} | {} | {} | {}\n",
            Utc::now().to_rfc3339(),
            alert.sender,
            alert.stage,
            alert.text.replace('\n', " "),
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
