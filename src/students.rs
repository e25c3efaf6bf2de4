//! The student register.

use crate::model::{Gender, Student};
use crate::store::Collection;

pub const STUDENTS_KEY: &str = "students";

pub type StudentStore = Collection<Student>;

/// Seed records for a workspace that has never stored students.
pub fn default_students() -> Vec<Student> {
    vec![
        Student {
            id: "12345678901234".to_string(),
            last_name: "بن محمد".to_string(),
            first_name: "أحمد".to_string(),
            birth_date: "2010/05/15".to_string(),
            gender: Gender::Male,
            level: "س1 متوسط".to_string(),
            group: "الفوج1".to_string(),
            is_repeating: false,
        },
        Student {
            id: "98765432109876".to_string(),
            last_name: "الزهراء".to_string(),
            first_name: "فاطمة".to_string(),
            birth_date: "2009/08/20".to_string(),
            gender: Gender::Female,
            level: "س2 متوسط".to_string(),
            group: "الفوج2".to_string(),
            is_repeating: true,
        },
    ]
}

/// List filter used by the student table: name search plus level and group pickers.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub search: Option<String>,
    pub level: Option<String>,
    pub group: Option<String>,
}

impl StudentFilter {
    pub fn matches(&self, s: &Student) -> bool {
        let matches_search = match self.search.as_deref() {
            Some(term) if !term.is_empty() => s
                .full_name()
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        };
        let matches_level = self.level.as_deref().map_or(true, |l| s.level == l);
        let matches_group = self.group.as_deref().map_or(true, |g| s.group == g);
        matches_search && matches_level && matches_group
    }
}

impl Collection<Student> {
    pub fn filtered(&self, filter: &StudentFilter) -> Vec<&Student> {
        self.list().iter().filter(|s| filter.matches(s)).collect()
    }
}
