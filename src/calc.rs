use crate::config::{EngineConfig, StudentJoin};
use crate::model::{Mark, MarkIndex, Sequence, Student, Subject, Term};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub class_average: f64,
    pub pass_percentage: f64,
    /// Students that went into both figures.
    pub counted_students: usize,
}

/// Mean of `averages` and share of them at or above `passing_mark`.
/// An empty input yields zeros. Callers decide which students are eligible.
pub fn class_statistics<I>(averages: I, passing_mark: f64) -> ClassStatistics
where
    I: IntoIterator<Item = f64>,
{
    let mut n: usize = 0;
    let mut sum = 0.0_f64;
    let mut passed: usize = 0;
    for avg in averages {
        n += 1;
        sum += avg;
        if avg >= passing_mark {
            passed += 1;
        }
    }
    if n == 0 {
        return ClassStatistics {
            class_average: 0.0,
            pass_percentage: 0.0,
            counted_students: 0,
        };
    }
    ClassStatistics {
        class_average: sum / (n as f64),
        pass_percentage: 100.0 * (passed as f64) / (n as f64),
        counted_students: n,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResult {
    pub student: Student,
    pub total_marks: f64,
    pub average: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermResult {
    pub student: Student,
    pub total_marks: f64,
    pub average: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualResult {
    pub student: Student,
    pub first_term_average: f64,
    pub second_term_average: f64,
    pub third_term_average: f64,
    pub final_average: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResults {
    pub sequence: Sequence,
    pub total_possible: f64,
    pub rows: Vec<SequenceResult>,
    #[serde(flatten)]
    pub statistics: ClassStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermResults {
    pub term: Term,
    pub sequences: [Sequence; 2],
    pub rows: Vec<TermResult>,
    #[serde(flatten)]
    pub statistics: ClassStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualResults {
    pub rows: Vec<AnnualResult>,
    #[serde(flatten)]
    pub statistics: ClassStatistics,
}

trait Ranked {
    fn sort_key(&self) -> f64;
    fn set_rank(&mut self, rank: usize);
}

impl Ranked for SequenceResult {
    fn sort_key(&self) -> f64 {
        self.average
    }
    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

impl Ranked for TermResult {
    fn sort_key(&self) -> f64 {
        self.average
    }
    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

impl Ranked for AnnualResult {
    fn sort_key(&self) -> f64 {
        self.final_average
    }
    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

/// Descending by average. `sort_by` is stable, so ties keep the input
/// student order; ranks are positions 1..=N with no sharing.
fn rank_rows<T: Ranked>(rows: &mut [T]) {
    rows.sort_by(|a, b| {
        b.sort_key()
            .partial_cmp(&a.sort_key())
            .unwrap_or(Ordering::Equal)
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.set_rank(i + 1);
    }
}

fn scaled_average(total_marks: f64, total_possible: f64, scale: f64) -> f64 {
    if total_possible > 0.0 {
        total_marks / total_possible * scale
    } else {
        0.0
    }
}

/// Sum of every subject's total, whether or not anything was entered.
pub fn total_possible(subjects: &[Subject]) -> f64 {
    subjects.iter().map(|s| s.total).sum()
}

/// One student's summed marks for one sequence, missing marks counting 0.
fn sequence_marks(index: &MarkIndex<'_>, student_id: &str, subjects: &[Subject], seq: Sequence) -> f64 {
    subjects
        .iter()
        .map(|subj| index.value_or_zero(student_id, &subj.id, seq))
        .sum()
}

pub fn compute_sequence_results(
    sequence: Sequence,
    students: &[Student],
    subjects: &[Subject],
    marks: &[Mark],
    config: &EngineConfig,
) -> SequenceResults {
    let index = MarkIndex::new(marks);
    let possible = total_possible(subjects);

    let mut rows: Vec<SequenceResult> = students
        .iter()
        .map(|s| {
            let total_marks = sequence_marks(&index, &s.id, subjects, sequence);
            SequenceResult {
                student: s.clone(),
                total_marks,
                average: scaled_average(total_marks, possible, config.grade_scale),
                rank: 0,
            }
        })
        .collect();
    rank_rows(&mut rows);

    // Every student counts here, zero averages included.
    let statistics = class_statistics(rows.iter().map(|r| r.average), config.passing_mark);

    SequenceResults {
        sequence,
        total_possible: possible,
        rows,
        statistics,
    }
}

pub fn compute_term_result(
    term: Term,
    students: &[Student],
    subjects: &[Subject],
    marks: &[Mark],
    config: &EngineConfig,
) -> TermResults {
    let index = MarkIndex::new(marks);
    let per_sequence_possible = total_possible(subjects);
    let sequences = term.sequences();

    let mut rows: Vec<TermResult> = students
        .iter()
        .map(|s| {
            let mut total_marks = 0.0_f64;
            let mut possible = 0.0_f64;
            let mut entered: usize = 0;
            for seq in sequences {
                let seq_marks = sequence_marks(&index, &s.id, subjects, seq);
                // A sequence counts as entered only when its marks sum above
                // zero; an all-zero sequence is indistinguishable from none.
                if seq_marks > 0.0 {
                    total_marks += seq_marks;
                    possible += per_sequence_possible;
                    entered += 1;
                }
            }
            let average = if entered > 0 {
                scaled_average(total_marks, possible, config.grade_scale)
            } else {
                0.0
            };
            TermResult {
                student: s.clone(),
                total_marks,
                average,
                rank: 0,
            }
        })
        .collect();
    rank_rows(&mut rows);

    // Zero-average students are left out of term statistics.
    let statistics = class_statistics(
        rows.iter().map(|r| r.average).filter(|avg| *avg > 0.0),
        config.passing_mark,
    );

    TermResults {
        term,
        sequences,
        rows,
        statistics,
    }
}

/// All three terms in schedule order.
pub fn compute_term_results(
    students: &[Student],
    subjects: &[Subject],
    marks: &[Mark],
    config: &EngineConfig,
) -> Vec<TermResults> {
    Term::ALL
        .into_iter()
        .map(|term| compute_term_result(term, students, subjects, marks, config))
        .collect()
}

/// First row whose student matches under the configured join.
pub fn find_term_row<'a>(
    rows: &'a [TermResult],
    student: &Student,
    join: StudentJoin,
) -> Option<&'a TermResult> {
    rows.iter().find(|r| match join {
        StudentJoin::DisplayName => r.student.name == student.name,
        StudentJoin::Id => r.student.id == student.id,
    })
}

pub fn find_annual_row<'a>(
    rows: &'a [AnnualResult],
    student: &Student,
    join: StudentJoin,
) -> Option<&'a AnnualResult> {
    rows.iter().find(|r| match join {
        StudentJoin::DisplayName => r.student.name == student.name,
        StudentJoin::Id => r.student.id == student.id,
    })
}

fn term_average(terms: &[TermResults], term: Term, student: &Student, join: StudentJoin) -> f64 {
    terms
        .iter()
        .find(|t| t.term == term)
        .and_then(|t| find_term_row(&t.rows, student, join))
        .map(|r| r.average)
        .unwrap_or(0.0)
}

pub fn compute_annual_results(
    students: &[Student],
    terms: &[TermResults],
    config: &EngineConfig,
) -> AnnualResults {
    let join = config.student_join;
    let mut rows: Vec<AnnualResult> = students
        .iter()
        .map(|s| {
            let first = term_average(terms, Term::FirstTerm, s, join);
            let second = term_average(terms, Term::SecondTerm, s, join);
            let third = term_average(terms, Term::ThirdTerm, s, join);
            let valid: Vec<f64> = [first, second, third]
                .into_iter()
                .filter(|avg| *avg > 0.0)
                .collect();
            let final_average = if valid.is_empty() {
                0.0
            } else {
                valid.iter().sum::<f64>() / (valid.len() as f64)
            };
            AnnualResult {
                student: s.clone(),
                first_term_average: first,
                second_term_average: second,
                third_term_average: third,
                final_average,
                rank: 0,
            }
        })
        .collect();
    rank_rows(&mut rows);

    let statistics = class_statistics(
        rows.iter().map(|r| r.final_average).filter(|avg| *avg > 0.0),
        config.passing_mark,
    );

    AnnualResults { rows, statistics }
}
