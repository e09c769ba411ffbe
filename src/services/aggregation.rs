//! Folds a student's flat grade list into the subject -> term -> exam result
//! sheet.
//!
//! Percentages at every level are mark-weighted: a subject's overall is the
//! sum of its terms' marks over the sum of their maximums, never the mean of
//! the term percentages. Exams keep the order they arrive in.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;
use uuid::Uuid;

use crate::entity::{grade, subject};
use crate::models::grade::{percentage, round2};
use crate::models::{
    ExamResult, LetterGrade, ResultSummary, SubjectResult, Term, TermResult,
};
use crate::models::academic::Totals;

#[derive(Default)]
struct Accumulator {
    marks: f64,
    max_marks: f64,
}

impl Accumulator {
    fn add(&mut self, marks: f64, max_marks: f64) {
        self.marks += marks;
        self.max_marks += max_marks;
    }

    fn absorb(&mut self, other: &Accumulator) {
        self.add(other.marks, other.max_marks);
    }

    /// Zero maximum is reported as 0%.
    fn totals(&self) -> Totals {
        let pct = percentage(self.marks, self.max_marks);
        Totals {
            total_marks: round2(self.marks),
            total_max_marks: round2(self.max_marks),
            percentage: pct,
            grade: LetterGrade::from_percentage(pct).as_str().to_string(),
        }
    }
}

#[derive(Default)]
struct TermGroup {
    exams: Vec<ExamResult>,
    acc: Accumulator,
}

struct SubjectGroup {
    subject_id: Uuid,
    terms: BTreeMap<Term, TermGroup>,
}

/// The folded result sheet, minus the student block.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub subjects: Vec<SubjectResult>,
    pub summary: ResultSummary,
}

/// Group `grades` by subject then term.
///
/// Subjects appear in order of their first grade. Grades with an
/// unrecognised term are skipped.
pub fn aggregate(
    grades: &[grade::Model],
    subjects: &HashMap<Uuid, subject::Model>,
    exam_titles: &HashMap<Uuid, String>,
) -> Aggregate {
    let mut groups: Vec<SubjectGroup> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for g in grades {
        let Some(term) = Term::parse(&g.term) else {
            warn!(grade_id = %g.id, term = %g.term, "Skipping grade with unknown term");
            continue;
        };

        let slot = *index.entry(g.subject_id).or_insert_with(|| {
            groups.push(SubjectGroup {
                subject_id: g.subject_id,
                terms: BTreeMap::new(),
            });
            groups.len() - 1
        });

        let group = groups[slot].terms.entry(term).or_default();
        group.acc.add(g.marks, g.max_marks);
        group.exams.push(ExamResult {
            grade_id: g.id,
            exam_id: g.exam_id,
            exam_title: g.exam_id.and_then(|id| exam_titles.get(&id).cloned()),
            exam_type: g.exam_type.clone(),
            marks: g.marks,
            max_marks: g.max_marks,
            percentage: g.percentage,
            grade: g.grade.clone(),
            remarks: g.remarks.clone(),
            recorded_at: g.created_at,
        });
    }

    let mut grand = Accumulator::default();
    let mut results = Vec::with_capacity(groups.len());

    for group in groups {
        let mut overall = Accumulator::default();
        let mut terms = Vec::with_capacity(group.terms.len());

        for (term, term_group) in group.terms {
            overall.absorb(&term_group.acc);
            terms.push(TermResult {
                term,
                totals: term_group.acc.totals(),
                exams: term_group.exams,
            });
        }
        grand.absorb(&overall);

        let (subject_name, subject_code) = subjects
            .get(&group.subject_id)
            .map(|s| (s.name.clone(), s.code.clone()))
            .unwrap_or_else(|| ("Unknown subject".to_string(), String::new()));

        results.push(SubjectResult {
            subject_id: group.subject_id,
            subject_name,
            subject_code,
            terms,
            overall: overall.totals(),
        });
    }

    let grand_totals = grand.totals();
    let overall_grade = LetterGrade::from_percentage(grand_totals.percentage);

    Aggregate {
        summary: ResultSummary {
            total_subjects: results.len(),
            total_marks: grand_totals.total_marks,
            total_max_marks: grand_totals.total_max_marks,
            overall_percentage: grand_totals.percentage,
            overall_grade: overall_grade.as_str().to_string(),
            remarks: overall_grade.remarks().to_string(),
        },
        subjects: results,
    }
}
