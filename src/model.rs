use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sequence {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
}

impl Sequence {
    pub const ALL: [Sequence; 6] = [
        Sequence::First,
        Sequence::Second,
        Sequence::Third,
        Sequence::Fourth,
        Sequence::Fifth,
        Sequence::Sixth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sequence::First => "first",
            Sequence::Second => "second",
            Sequence::Third => "third",
            Sequence::Fourth => "fourth",
            Sequence::Fifth => "fifth",
            Sequence::Sixth => "sixth",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|seq| seq.as_str() == s)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Term {
    FirstTerm,
    SecondTerm,
    ThirdTerm,
}

/// Which two sequences make up each term. Aggregators read this table and
/// never branch on a particular term.
pub const TERM_SCHEDULE: [(Term, [Sequence; 2]); 3] = [
    (Term::FirstTerm, [Sequence::First, Sequence::Second]),
    (Term::SecondTerm, [Sequence::Third, Sequence::Fourth]),
    (Term::ThirdTerm, [Sequence::Fifth, Sequence::Sixth]),
];

impl Term {
    pub const ALL: [Term; 3] = [Term::FirstTerm, Term::SecondTerm, Term::ThirdTerm];

    pub fn as_str(self) -> &'static str {
        match self {
            Term::FirstTerm => "firstTerm",
            Term::SecondTerm => "secondTerm",
            Term::ThirdTerm => "thirdTerm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn sequences(self) -> [Sequence; 2] {
        // Table rows are in declaration order.
        TERM_SCHEDULE[self as usize].1
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selectable result set: one sequence, one term, or the annual aggregate.
/// The string form doubles as a comment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResultView {
    Sequence(Sequence),
    Term(Term),
    Annual,
}

impl ResultView {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultView::Sequence(s) => s.as_str(),
            ResultView::Term(t) => t.as_str(),
            ResultView::Annual => "annual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s == "annual" {
            return Some(ResultView::Annual);
        }
        if let Some(seq) = Sequence::parse(s) {
            return Some(ResultView::Sequence(seq));
        }
        Term::parse(s).map(ResultView::Term)
    }

    pub fn is_annual(self) -> bool {
        matches!(self, ResultView::Annual)
    }
}

impl TryFrom<String> for ResultView {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ResultView::parse(&value).ok_or_else(|| format!("unknown result view: {}", value))
    }
}

impl From<ResultView> for String {
    fn from(value: ResultView) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    /// Maximum attainable mark; strictly positive.
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    #[serde(default)]
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    pub sequence: Sequence,
    pub value: f64,
}

/// studentId -> label (sequence or result-view name) -> free text.
pub type CommentMap = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("student not found: {0}")]
    UnknownStudent(String),
    #[error("subject not found: {0}")]
    UnknownSubject(String),
    #[error("subject {subject_id} total must be a positive number, got {total}")]
    NonPositiveTotal { subject_id: String, total: f64 },
    #[error("mark value must be a finite number")]
    NonFiniteMark,
    #[error("mark value {value} must be within 0..={total}")]
    MarkOutOfRange { value: f64, total: f64 },
    #[error("comment label must not be empty")]
    EmptyLabel,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::UnknownStudent(_) | ValidationError::UnknownSubject(_) => "not_found",
            ValidationError::MarkOutOfRange { .. } => "out_of_range",
            ValidationError::NonPositiveTotal { .. }
            | ValidationError::NonFiniteMark
            | ValidationError::EmptyLabel => "bad_params",
        }
    }
}

/// Checks a proposed mark against its subject before it is allowed into a
/// snapshot. Aggregators assume every stored value already passed this.
pub fn validate_mark_value(value: f64, subject: &Subject) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteMark);
    }
    if value < 0.0 || value > subject.total {
        return Err(ValidationError::MarkOutOfRange {
            value,
            total: subject.total,
        });
    }
    Ok(())
}

/// A consistent, caller-owned view of one class. Aggregators only borrow it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub marks: Vec<Mark>,
    pub comments: CommentMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl Snapshot {
    /// Builds a snapshot from raw collections. Every mark must reference a
    /// known student and subject and fit within that subject's total. Marks
    /// that repeat a `(student, subject, sequence)` triple collapse onto the
    /// first record's id with the later value. Returns the snapshot and the
    /// number of collapsed duplicates.
    pub fn from_parts(
        students: Vec<Student>,
        subjects: Vec<Subject>,
        marks: Vec<Mark>,
        comments: CommentMap,
    ) -> Result<(Self, usize), ValidationError> {
        for s in &subjects {
            if !s.total.is_finite() || s.total <= 0.0 {
                return Err(ValidationError::NonPositiveTotal {
                    subject_id: s.id.clone(),
                    total: s.total,
                });
            }
        }

        {
            let student_ids: HashSet<&str> = students.iter().map(|s| s.id.as_str()).collect();
            let subjects_by_id: HashMap<&str, &Subject> =
                subjects.iter().map(|s| (s.id.as_str(), s)).collect();
            for m in &marks {
                if !student_ids.contains(m.student_id.as_str()) {
                    return Err(ValidationError::UnknownStudent(m.student_id.clone()));
                }
                let subject = subjects_by_id
                    .get(m.subject_id.as_str())
                    .ok_or_else(|| ValidationError::UnknownSubject(m.subject_id.clone()))?;
                validate_mark_value(m.value, subject)?;
            }
        }

        let mut out: Vec<Mark> = Vec::with_capacity(marks.len());
        let mut pos_by_key: HashMap<(String, String, Sequence), usize> = HashMap::new();
        let mut collapsed = 0usize;
        for mut m in marks {
            let key = (m.student_id.clone(), m.subject_id.clone(), m.sequence);
            if let Some(&pos) = pos_by_key.get(&key) {
                out[pos].value = m.value;
                collapsed += 1;
                continue;
            }
            if m.id.trim().is_empty() {
                m.id = Uuid::new_v4().to_string();
            }
            pos_by_key.insert(key, out.len());
            out.push(m);
        }

        Ok((
            Snapshot {
                students,
                subjects,
                marks: out,
                comments,
            },
            collapsed,
        ))
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == student_id)
    }

    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == subject_id)
    }

    pub fn upsert_mark(
        &mut self,
        student_id: &str,
        subject_id: &str,
        sequence: Sequence,
        value: f64,
    ) -> Result<(Mark, UpsertOutcome), ValidationError> {
        if self.student(student_id).is_none() {
            return Err(ValidationError::UnknownStudent(student_id.to_string()));
        }
        let subject = self
            .subject(subject_id)
            .ok_or_else(|| ValidationError::UnknownSubject(subject_id.to_string()))?;
        validate_mark_value(value, subject)?;

        if let Some(existing) = self.marks.iter_mut().find(|m| {
            m.student_id == student_id && m.subject_id == subject_id && m.sequence == sequence
        }) {
            existing.value = value;
            return Ok((existing.clone(), UpsertOutcome::Updated));
        }

        let mark = Mark {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            subject_id: subject_id.to_string(),
            sequence,
            value,
        };
        self.marks.push(mark.clone());
        Ok((mark, UpsertOutcome::Created))
    }

    /// Blank text removes the label; anything else is stored verbatim.
    pub fn set_comment(
        &mut self,
        student_id: &str,
        label: &str,
        text: &str,
    ) -> Result<&BTreeMap<String, String>, ValidationError> {
        if self.student(student_id).is_none() {
            return Err(ValidationError::UnknownStudent(student_id.to_string()));
        }
        let label = label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        let entry = self.comments.entry(student_id.to_string()).or_default();
        if text.trim().is_empty() {
            entry.remove(label);
        } else {
            entry.insert(label.to_string(), text.to_string());
        }
        Ok(entry)
    }
}

/// Borrowed `(student, subject, sequence) -> value` lookup for one pass.
pub struct MarkIndex<'a> {
    values: HashMap<(&'a str, &'a str, Sequence), f64>,
}

impl<'a> MarkIndex<'a> {
    pub fn new(marks: &'a [Mark]) -> Self {
        let mut values = HashMap::with_capacity(marks.len());
        for m in marks {
            values.insert((m.student_id.as_str(), m.subject_id.as_str(), m.sequence), m.value);
        }
        Self { values }
    }

    pub fn get(&self, student_id: &str, subject_id: &str, sequence: Sequence) -> Option<f64> {
        self.values.get(&(student_id, subject_id, sequence)).copied()
    }

    pub fn value_or_zero(&self, student_id: &str, subject_id: &str, sequence: Sequence) -> f64 {
        self.get(student_id, subject_id, sequence).unwrap_or(0.0)
    }
}
