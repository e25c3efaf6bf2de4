//! Records kept by the orientation office.
//!
//! Field names and enum spellings are the ones used in the persisted JSON
//! documents, so a backup written by the web console can be read back as-is.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Grade levels offered by the student form.
pub const LEVELS: [&str; 4] = ["س1 متوسط", "س2 متوسط", "س3 متوسط", "س4 متوسط"];

/// Class group names offered by the student form.
pub const GROUP_NAMES: [&str; 4] = ["الفوج1", "الفوج2", "الفوج3", "الفوج4"];

/// Anything kept in a store: addressed by a string identifier.
pub trait Record: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    #[serde(rename = "ذكر", alias = "male")]
    Male,
    #[serde(rename = "أنثى", alias = "female")]
    Female,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "ذكر",
            Gender::Female => "أنثى",
        }
    }

    pub fn from_label(s: &str) -> Option<Gender> {
        match s.trim() {
            "ذكر" | "male" => Some(Gender::Male),
            "أنثى" | "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    /// `YYYY/MM/DD`
    pub birth_date: String,
    pub gender: Gender,
    pub level: String,
    pub group: String,
    pub is_repeating: bool,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Student {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub day: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub level: String,
    /// Entered by hand; never recomputed from the student list.
    pub student_count: u32,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}

impl Record for Group {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    #[serde(rename = "فردي", alias = "individual")]
    Individual,
    #[serde(rename = "جماعي", alias = "group")]
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TestKind,
    /// Minutes.
    pub duration: u32,
    pub target_level: String,
    #[serde(default)]
    pub description: String,
    pub question_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl Record for Test {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    #[serde(rename = "فصلي", alias = "term")]
    Term,
    #[serde(rename = "توجيهي", alias = "orientation")]
    Orientation,
    #[serde(rename = "متابعة", alias = "follow-up")]
    FollowUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trimester {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    #[serde(rename = "مكتمل", alias = "complete")]
    Complete,
    #[serde(rename = "مسودة", alias = "draft")]
    Draft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trimester: Option<Trimester>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_count: Option<u32>,
    /// Percentage; the 0-100 range is not enforced.
    pub coverage: f64,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub status: ReportStatus,
}

impl Record for Report {
    fn id(&self) -> &str {
        &self.id
    }
}
