//! Student roster sheet exchange.
//!
//! Rows are keyed by fixed Arabic column headers. The sheet is written and
//! read as CSV; a workbook tool opens it directly.

use crate::error::RosterError;
use crate::model::{Gender, Student};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const COL_ID: &str = "رقم التعريف";
pub const COL_LAST_NAME: &str = "اللقب";
pub const COL_FIRST_NAME: &str = "الاسم";
pub const COL_BIRTH_DATE: &str = "تاريخ الميلاد";
pub const COL_GENDER: &str = "الجنس";
pub const COL_LEVEL: &str = "المستوى";
pub const COL_GROUP: &str = "الفوج";
pub const COL_REPEATING: &str = "معيد";

pub const ROSTER_HEADERS: [&str; 8] = [
    COL_ID,
    COL_LAST_NAME,
    COL_FIRST_NAME,
    COL_BIRTH_DATE,
    COL_GENDER,
    COL_LEVEL,
    COL_GROUP,
    COL_REPEATING,
];

pub const YES: &str = "نعم";
pub const NO: &str = "لا";

pub const DEFAULT_LEVEL: &str = "س1 متوسط";
pub const DEFAULT_GROUP: &str = "الفوج1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterWarning {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RosterImport {
    pub students: Vec<Student>,
    pub warnings: Vec<RosterWarning>,
}

pub fn roster_file_name(date: NaiveDate) -> String {
    format!("قائمة_التلاميذ_{}.csv", date.format("%Y-%m-%d"))
}

fn csv_quote(s: &str) -> String {
    let padded = s.trim() != s;
    if padded || s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// One CSV record and the line it starts on.
struct CsvRecord {
    line: usize,
    fields: Vec<String>,
}

/// Split CSV text into records. Line breaks inside quotes stay in the cell.
/// Unquoted cells are trimmed; quoted cells are kept verbatim.
fn parse_csv_records(text: &str) -> Vec<CsvRecord> {
    fn finish(buf: &mut String, quoted: &mut bool) -> String {
        let cell = if *quoted {
            std::mem::take(buf)
        } else {
            let cell = buf.trim().to_string();
            buf.clear();
            cell
        };
        *quoted = false;
        cell
    }

    fn push(records: &mut Vec<CsvRecord>, line: usize, fields: Vec<String>) {
        // Blank lines carry a single empty unquoted cell.
        if fields.len() == 1 && fields[0].is_empty() {
            return;
        }
        records.push(CsvRecord { line, fields });
    }

    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1;
    let mut start = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' if in_quotes => in_quotes = false,
            '"' if !quoted && buf.trim().is_empty() => {
                buf.clear();
                in_quotes = true;
                quoted = true;
            }
            '\n' if in_quotes => {
                buf.push('\n');
                line += 1;
            }
            ',' if !in_quotes => fields.push(finish(&mut buf, &mut quoted)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            ' ' | '\t' if quoted && !in_quotes => {}
            '\n' => {
                fields.push(finish(&mut buf, &mut quoted));
                push(&mut records, start, std::mem::take(&mut fields));
                line += 1;
                start = line;
            }
            _ => buf.push(ch),
        }
    }
    if quoted || !buf.is_empty() || !fields.is_empty() {
        fields.push(finish(&mut buf, &mut quoted));
        push(&mut records, start, fields);
    }
    records
}

pub fn export_roster_csv(students: &[Student]) -> String {
    let mut out = String::new();
    out.push_str(&ROSTER_HEADERS.join(","));
    out.push('\n');
    for s in students {
        let cells = [
            csv_quote(&s.id),
            csv_quote(&s.last_name),
            csv_quote(&s.first_name),
            csv_quote(&s.birth_date),
            csv_quote(s.gender.label()),
            csv_quote(&s.level),
            csv_quote(&s.group),
            if s.is_repeating { YES } else { NO }.to_string(),
        ];
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Parse a roster sheet. Missing cells take the form defaults; an unknown
/// gender label falls back to male with a warning.
pub fn parse_roster_csv(text: &str) -> Result<RosterImport, RosterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = parse_csv_records(text).into_iter();

    let Some(header) = records.next() else {
        return Err(RosterError::NoRows);
    };
    let columns: HashMap<String, usize> = header
        .fields
        .into_iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();
    if !ROSTER_HEADERS.iter().any(|h| columns.contains_key(*h)) {
        return Err(RosterError::MissingHeader(COL_ID));
    }

    let mut students = Vec::new();
    let mut warnings = Vec::new();
    for CsvRecord { line: line_no, fields } in records {
        let cell = |name: &str| -> Option<String> {
            columns
                .get(name)
                .and_then(|&i| fields.get(i))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let gender = match cell(COL_GENDER) {
            None => Gender::Male,
            Some(label) => Gender::from_label(&label).unwrap_or_else(|| {
                warnings.push(RosterWarning {
                    line: line_no,
                    message: format!("unknown gender `{}`, using {}", label, Gender::Male.label()),
                });
                Gender::Male
            }),
        };

        students.push(Student {
            id: cell(COL_ID).unwrap_or_default(),
            last_name: cell(COL_LAST_NAME).unwrap_or_default(),
            first_name: cell(COL_FIRST_NAME).unwrap_or_default(),
            birth_date: cell(COL_BIRTH_DATE).unwrap_or_default(),
            gender,
            level: cell(COL_LEVEL).unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            group: cell(COL_GROUP).unwrap_or_else(|| DEFAULT_GROUP.to_string()),
            is_repeating: cell(COL_REPEATING).as_deref() == Some(YES),
        });
    }

    if students.is_empty() {
        return Err(RosterError::NoRows);
    }
    Ok(RosterImport { students, warnings })
}
