use std::path::PathBuf;

use serde::Deserialize;

use crate::office::Office;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub office: Option<Office>,
}

impl AppState {
    /// Flush and drop the open office, if any.
    pub fn close(&mut self) {
        if let Some(mut office) = self.office.take() {
            if let Err(e) = office.flush() {
                tracing::error!(error = %e, "failed to flush workspace on close");
            }
        }
        if let Some(path) = self.workspace.take() {
            tracing::info!(workspace = %path.display(), "workspace closed");
        }
    }
}
