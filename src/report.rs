use crate::calc::{
    find_annual_row, find_term_row, AnnualResult, AnnualResults, SequenceResults, TermResult,
    TermResults,
};
use crate::config::StudentJoin;
use crate::model::{Mark, ResultView, Sequence, Student, Subject, Term};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermReportRow {
    pub term: Term,
    pub result: TermResult,
}

/// Everything the document renderer needs for one student. Read-only
/// projection; nothing here is formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student: Student,
    pub selected_sequence: Sequence,
    pub selected_view: ResultView,
    /// sequence -> subject name -> mark. Only recorded marks appear.
    pub marks: BTreeMap<Sequence, BTreeMap<String, f64>>,
    pub comments: BTreeMap<String, String>,
    pub term_results: Vec<TermReportRow>,
    pub annual_result: Option<AnnualResult>,
}

/// What the caller picked for a report and how result rows are matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSelection {
    pub sequence: Sequence,
    pub view: ResultView,
    pub join: StudentJoin,
}

pub fn compile_student_report(
    student: &Student,
    subjects: &[Subject],
    marks: &[Mark],
    comments: Option<&BTreeMap<String, String>>,
    selection: ReportSelection,
    term_results: &[TermResults],
    annual_results: Option<&AnnualResults>,
) -> StudentReport {
    let join = selection.join;
    let subject_names: HashMap<&str, &str> = subjects
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    let mut by_sequence: BTreeMap<Sequence, BTreeMap<String, f64>> = BTreeMap::new();
    for m in marks.iter().filter(|m| m.student_id == student.id) {
        // Marks pointing at a subject that no longer exists are dropped.
        let Some(name) = subject_names.get(m.subject_id.as_str()) else {
            continue;
        };
        by_sequence
            .entry(m.sequence)
            .or_default()
            .insert((*name).to_string(), m.value);
    }

    let term_rows = term_results
        .iter()
        .filter_map(|t| {
            find_term_row(&t.rows, student, join).map(|r| TermReportRow {
                term: t.term,
                result: r.clone(),
            })
        })
        .collect();

    let annual_result = annual_results
        .and_then(|a| find_annual_row(&a.rows, student, join))
        .cloned();

    StudentReport {
        student: student.clone(),
        selected_sequence: selection.sequence,
        selected_view: selection.view,
        marks: by_sequence,
        comments: comments.cloned().unwrap_or_default(),
        term_results: term_rows,
        annual_result,
    }
}

/// A computed result set for any view.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum ResultSetRef<'a> {
    Sequence(&'a SequenceResults),
    Term(&'a TermResults),
    Annual(&'a AnnualResults),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRow {
    pub rank: usize,
    pub student_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_averages: Option<[f64; 3]>,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsDocument {
    pub title: String,
    pub view: ResultView,
    pub is_annual: bool,
    pub columns: Vec<serde_json::Value>,
    pub rows: Vec<DocumentRow>,
    pub class_average: f64,
    pub pass_percentage: f64,
    pub generated_at: String,
}

fn translate(labels: &HashMap<String, String>, key: &str) -> String {
    labels.get(key).cloned().unwrap_or_else(|| key.to_string())
}

/// Payload for the external document generator: ordered rows for one view
/// plus its statistics and translated column labels.
pub fn compile_results_document(
    title: &str,
    results: ResultSetRef<'_>,
    labels: &HashMap<String, String>,
) -> ResultsDocument {
    let (view, rows, stats) = match results {
        ResultSetRef::Sequence(r) => (
            ResultView::Sequence(r.sequence),
            r.rows
                .iter()
                .map(|row| DocumentRow {
                    rank: row.rank,
                    student_name: row.student.name.clone(),
                    total_marks: Some(row.total_marks),
                    term_averages: None,
                    average: row.average,
                })
                .collect::<Vec<_>>(),
            r.statistics,
        ),
        ResultSetRef::Term(r) => (
            ResultView::Term(r.term),
            r.rows
                .iter()
                .map(|row| DocumentRow {
                    rank: row.rank,
                    student_name: row.student.name.clone(),
                    total_marks: Some(row.total_marks),
                    term_averages: None,
                    average: row.average,
                })
                .collect(),
            r.statistics,
        ),
        ResultSetRef::Annual(r) => (
            ResultView::Annual,
            r.rows
                .iter()
                .map(|row| DocumentRow {
                    rank: row.rank,
                    student_name: row.student.name.clone(),
                    total_marks: None,
                    term_averages: Some([
                        row.first_term_average,
                        row.second_term_average,
                        row.third_term_average,
                    ]),
                    average: row.final_average,
                })
                .collect(),
            r.statistics,
        ),
    };

    let column_keys: &[&str] = if view.is_annual() {
        &["rank", "student", "firstTerm", "secondTerm", "thirdTerm", "finalAverage"]
    } else {
        &["rank", "student", "totalMarks", "average"]
    };
    let columns = column_keys
        .iter()
        .map(|k| json!({ "key": k, "label": translate(labels, k) }))
        .collect();

    ResultsDocument {
        title: title.to_string(),
        view,
        is_annual: view.is_annual(),
        columns,
        rows,
        class_average: stats.class_average,
        pass_percentage: stats.pass_percentage,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}
