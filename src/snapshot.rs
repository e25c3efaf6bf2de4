use crate::error::ImportError;
use crate::model::{Group, Report, Student, Test};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: &str = "1.0";
pub const DEFAULT_BACKUP_PREFIX: &str = "dz-orientations";

/// The single document a backup, a restore and the auto-save slot all use.
///
/// A collection left as `None` is omitted when written and left alone when
/// restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<Student>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<Test>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports: Option<Vec<Report>>,
    pub export_date: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub students: usize,
    pub groups: usize,
    pub tests: usize,
    pub reports: usize,
}

impl Snapshot {
    pub fn new(
        students: Vec<Student>,
        groups: Vec<Group>,
        tests: Vec<Test>,
        reports: Vec<Report>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            students: Some(students),
            groups: Some(groups),
            tests: Some(tests),
            reports: Some(reports),
            export_date: format_export_date(exported_at),
            version: SNAPSHOT_VERSION.to_string(),
        }
    }

    /// Decode a snapshot document.
    ///
    /// `version` and `exportDate` must be present and non-empty. Each present
    /// collection must decode; the first one that does not aborts the whole
    /// parse.
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let doc: serde_json::Value = serde_json::from_str(text).map_err(ImportError::Parse)?;

        let version = required_text(&doc, "version")?;
        let export_date = required_text(&doc, "exportDate")?;

        Ok(Self {
            students: optional_field(&doc, "students")?,
            groups: optional_field(&doc, "groups")?,
            tests: optional_field(&doc, "tests")?,
            reports: optional_field(&doc, "reports")?,
            export_date,
            version,
        })
    }

    pub fn read_from_file(path: &Path) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the snapshot as `<prefix>-backup-<YYYY-MM-DD>.json` inside `out_dir`.
    pub fn export_to_dir(
        &self,
        out_dir: &Path,
        prefix: &str,
        date: NaiveDate,
    ) -> anyhow::Result<ExportSummary> {
        let path = out_dir.join(backup_file_name(prefix, date));
        self.export_to_file(&path)
    }

    pub fn export_to_file(&self, out_path: &Path) -> anyhow::Result<ExportSummary> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }

        let text = self.to_json_pretty().context("failed to serialize snapshot")?;
        std::fs::write(out_path, text).with_context(|| {
            format!("failed to write backup file {}", out_path.to_string_lossy())
        })?;

        Ok(ExportSummary {
            path: out_path.to_path_buf(),
            students: self.students.as_ref().map_or(0, Vec::len),
            groups: self.groups.as_ref().map_or(0, Vec::len),
            tests: self.tests.as_ref().map_or(0, Vec::len),
            reports: self.reports.as_ref().map_or(0, Vec::len),
        })
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2024-02-01T08:30:00.000Z`.
pub fn format_export_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn backup_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-backup-{}.json", prefix, date.format("%Y-%m-%d"))
}

fn required_text(doc: &serde_json::Value, field: &'static str) -> Result<String, ImportError> {
    match doc.get(field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        // A non-string but truthy value still counts as present.
        Some(v) if !v.is_null() && v != &serde_json::Value::Bool(false) && !v.is_string() => {
            Ok(v.to_string())
        }
        _ => Err(ImportError::MissingField(field)),
    }
}

fn optional_field<T: DeserializeOwned>(
    doc: &serde_json::Value,
    field: &'static str,
) -> Result<Option<T>, ImportError> {
    match doc.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => T::deserialize(v)
            .map(Some)
            .map_err(|source| ImportError::Malformed { field, source }),
    }
}
