//! Groups, psychological tests and reports, plus the counters the dashboard shows.

use crate::error::StorageError;
use crate::model::{
    Group, Report, ReportKind, ReportStatus, ScheduleEntry, Test, TestKind, Trimester,
};
use crate::storage::Storage;
use crate::store::{ChangeBus, Collection, PersistPolicy};
use serde::Serialize;
use std::rc::Rc;

pub const GROUPS_KEY: &str = "groups";
pub const TESTS_KEY: &str = "tests";
pub const REPORTS_KEY: &str = "reports";

#[derive(Debug)]
pub struct DashboardStore {
    pub groups: Collection<Group>,
    pub tests: Collection<Test>,
    pub reports: Collection<Report>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub student_count: usize,
    pub group_count: usize,
    pub completed_tests: usize,
    pub completed_reports: usize,
}

impl DashboardStore {
    pub fn load(
        storage: Rc<dyn Storage>,
        policy: PersistPolicy,
        bus: &ChangeBus,
        seed: bool,
    ) -> Result<Self, StorageError> {
        let groups = Collection::load(GROUPS_KEY, storage.clone(), policy, bus.clone(), || {
            if seed {
                default_groups()
            } else {
                Vec::new()
            }
        })?;
        let tests = Collection::load(TESTS_KEY, storage.clone(), policy, bus.clone(), || {
            if seed {
                default_tests()
            } else {
                Vec::new()
            }
        })?;
        let reports = Collection::load(REPORTS_KEY, storage, policy, bus.clone(), || {
            if seed {
                default_reports()
            } else {
                Vec::new()
            }
        })?;
        Ok(Self {
            groups,
            tests,
            reports,
        })
    }

    pub fn set_policy(&mut self, policy: PersistPolicy) {
        self.groups.set_policy(policy);
        self.tests.set_policy(policy);
        self.reports.set_policy(policy);
    }

    pub fn completed_test_count(&self) -> usize {
        self.tests.list().iter().filter(|t| t.completed).count()
    }

    pub fn completed_report_count(&self) -> usize {
        self.reports
            .list()
            .iter()
            .filter(|r| r.status == ReportStatus::Complete)
            .count()
    }

    pub fn stats(&self, student_count: usize) -> DashboardStats {
        DashboardStats {
            student_count,
            group_count: self.groups.len(),
            completed_tests: self.completed_test_count(),
            completed_reports: self.completed_report_count(),
        }
    }

}

#[derive(Debug, Clone, Default)]
pub struct TestFilter {
    pub kind: Option<TestKind>,
    pub search: Option<String>,
}

impl TestFilter {
    pub fn matches(&self, t: &Test) -> bool {
        if self.kind.is_some_and(|k| k != t.kind) {
            return false;
        }
        match self.search.as_deref() {
            Some(term) if !term.is_empty() => {
                t.title.contains(term) || t.description.contains(term)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub kind: Option<ReportKind>,
    pub search: Option<String>,
}

impl ReportFilter {
    pub fn matches(&self, r: &Report) -> bool {
        if self.kind.is_some_and(|k| k != r.kind) {
            return false;
        }
        match self.search.as_deref() {
            Some(term) if !term.is_empty() => {
                r.title.contains(term) || r.notes.as_deref().is_some_and(|n| n.contains(term))
            }
            _ => true,
        }
    }
}

fn entry(day: &str, time: &str) -> ScheduleEntry {
    ScheduleEntry {
        day: day.to_string(),
        time: time.to_string(),
    }
}

pub fn default_groups() -> Vec<Group> {
    vec![
        Group {
            id: "1".to_string(),
            name: "الفوج1".to_string(),
            level: "س1 متوسط".to_string(),
            student_count: 25,
            schedule: vec![
                entry("الأحد", "08:00 - 10:00"),
                entry("الثلاثاء", "13:00 - 15:00"),
            ],
        },
        Group {
            id: "2".to_string(),
            name: "الفوج2".to_string(),
            level: "س2 متوسط".to_string(),
            student_count: 28,
            schedule: vec![
                entry("الاثنين", "10:00 - 12:00"),
                entry("الخميس", "14:00 - 16:00"),
            ],
        },
    ]
}

pub fn default_tests() -> Vec<Test> {
    vec![
        Test {
            id: "1".to_string(),
            title: "اختبار الذكاء المتعدد".to_string(),
            kind: TestKind::Individual,
            duration: 45,
            target_level: "س1 متوسط".to_string(),
            description: "يقيس هذا الاختبار مختلف أنواع الذكاء لدى التلميذ".to_string(),
            question_count: 30,
            last_used: Some("2024-02-15".to_string()),
            completed: true,
        },
        Test {
            id: "2".to_string(),
            title: "اختبار الميول المهنية".to_string(),
            kind: TestKind::Group,
            duration: 60,
            target_level: "س4 متوسط".to_string(),
            description: "يساعد في تحديد الميول المهنية للتلاميذ".to_string(),
            question_count: 40,
            last_used: Some("2024-02-20".to_string()),
            completed: true,
        },
    ]
}

pub fn default_reports() -> Vec<Report> {
    vec![Report {
        id: "1".to_string(),
        title: "تقرير الفصل الأول - س4 متوسط".to_string(),
        kind: ReportKind::Term,
        trimester: Some(Trimester::First),
        target_group: Some("س4 متوسط".to_string()),
        student_count: Some(120),
        coverage: 85.0,
        objectives: vec![
            "تقييم مستوى التحصيل الدراسي".to_string(),
            "تحديد الصعوبات والعقبات".to_string(),
            "وضع خطة للتحسين".to_string(),
        ],
        notes: Some("تحسن ملحوظ في مستوى التلاميذ مقارنة بالسنة الماضية".to_string()),
        created_at: "2024-02-01".to_string(),
        status: ReportStatus::Complete,
    }]
}
