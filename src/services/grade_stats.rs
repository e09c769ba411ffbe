//! Summary statistics for the teacher subject/class grade view.
//!
//! One linear pass over whichever rows the caller hands in: the current page
//! by default, or the full filtered set when `summary_scope=filtered`.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::grade;
use crate::models::grade::{PASS_THRESHOLD, round2};
use crate::models::{ExamType, LetterGrade, StudentBrief, SummaryScope, Term};

/// Count of grades per letter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "F")]
    pub f: usize,
}

impl GradeDistribution {
    fn record(&mut self, letter: LetterGrade) {
        match letter {
            LetterGrade::A => self.a += 1,
            LetterGrade::B => self.b += 1,
            LetterGrade::C => self.c += 1,
            LetterGrade::D => self.d += 1,
            LetterGrade::F => self.f += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Breakdown {
    pub key: String,
    pub count: usize,
    pub average_percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub student_id: Uuid,
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub grades: usize,
    pub average_percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GradeSummary {
    /// Rows the statistics cover
    pub scope: SummaryScope,
    pub count: usize,
    pub average_percentage: f64,
    pub highest_percentage: f64,
    pub lowest_percentage: f64,
    pub pass_count: usize,
    pub fail_count: usize,
    /// Percent of rows at or above the pass threshold
    pub pass_rate: f64,
    pub fail_rate: f64,
    pub pass_threshold: f64,
    pub grade_distribution: GradeDistribution,
    pub by_term: Vec<Breakdown>,
    pub by_exam_type: Vec<Breakdown>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            round2(self.sum / self.count as f64)
        }
    }
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

pub fn summarize(
    rows: &[grade::Model],
    students: &HashMap<Uuid, StudentBrief>,
    scope: SummaryScope,
) -> GradeSummary {
    let mut overall = Mean::default();
    let mut highest: Option<f64> = None;
    let mut lowest: Option<f64> = None;
    let mut pass_count = 0;
    let mut distribution = GradeDistribution::default();
    let mut by_term: HashMap<Term, Mean> = HashMap::new();
    let mut by_exam_type: HashMap<ExamType, Mean> = HashMap::new();
    let mut by_student: HashMap<Uuid, Mean> = HashMap::new();

    for row in rows {
        let pct = row.percentage;
        overall.add(pct);
        highest = Some(highest.map_or(pct, |h| h.max(pct)));
        lowest = Some(lowest.map_or(pct, |l| l.min(pct)));
        if pct >= PASS_THRESHOLD {
            pass_count += 1;
        }

        let letter =
            LetterGrade::parse(&row.grade).unwrap_or_else(|| LetterGrade::from_percentage(pct));
        distribution.record(letter);

        if let Some(term) = Term::parse(&row.term) {
            by_term.entry(term).or_default().add(pct);
        }
        if let Some(exam_type) = ExamType::parse(&row.exam_type) {
            by_exam_type.entry(exam_type).or_default().add(pct);
        }
        by_student.entry(row.student_id).or_default().add(pct);
    }

    let count = rows.len();
    let fail_count = count - pass_count;

    let by_term = Term::ALL
        .iter()
        .filter_map(|term| {
            by_term.get(term).map(|m| Breakdown {
                key: term.as_str().to_string(),
                count: m.count,
                average_percentage: m.value(),
            })
        })
        .collect();

    let by_exam_type = ExamType::ALL
        .iter()
        .filter_map(|exam_type| {
            by_exam_type.get(exam_type).map(|m| Breakdown {
                key: exam_type.as_str().to_string(),
                count: m.count,
                average_percentage: m.value(),
            })
        })
        .collect();

    let mut ranked: Vec<(Uuid, usize, f64)> = by_student
        .iter()
        .map(|(id, m)| (*id, m.count, m.value()))
        .collect();
    ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

    let leaderboard = ranked
        .into_iter()
        .enumerate()
        .map(|(i, (student_id, grades, average_percentage))| {
            let info = students.get(&student_id);
            LeaderboardEntry {
                rank: i + 1,
                student_id,
                name: info.map(|s| s.name.clone()),
                roll_number: info.map(|s| s.roll_number.clone()),
                grades,
                average_percentage,
            }
        })
        .collect();

    GradeSummary {
        scope,
        count,
        average_percentage: overall.value(),
        highest_percentage: highest.unwrap_or(0.0),
        lowest_percentage: lowest.unwrap_or(0.0),
        pass_count,
        fail_count,
        pass_rate: rate(pass_count, count),
        fail_rate: rate(fail_count, count),
        pass_threshold: PASS_THRESHOLD,
        grade_distribution: distribution,
        by_term,
        by_exam_type,
        leaderboard,
    }
}
