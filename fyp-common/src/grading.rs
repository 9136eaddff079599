//! Grade aggregation
//!
//! Percentage, letter grade and GPA derivation for a document's rubric
//! scores, plus the student's Detailed Marks Certificate (DMC).
//! Everything here is pure; callers pass in the collections they hold.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Document, Grade};

/// Number of rubric criteria an evaluator must score per document
pub const RUBRIC_CRITERIA_COUNT: usize = 6;

/// Letter grade on the university scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "F")]
    F,
}

/// Inclusive lower bounds, best grade first
const THRESHOLDS: [(f64, LetterGrade); 8] = [
    (85.0, LetterGrade::A),
    (80.0, LetterGrade::AMinus),
    (75.0, LetterGrade::BPlus),
    (70.0, LetterGrade::B),
    (65.0, LetterGrade::BMinus),
    (60.0, LetterGrade::CPlus),
    (55.0, LetterGrade::C),
    (50.0, LetterGrade::CMinus),
];

impl LetterGrade {
    pub const ALL: [LetterGrade; 9] = [
        LetterGrade::A,
        LetterGrade::AMinus,
        LetterGrade::BPlus,
        LetterGrade::B,
        LetterGrade::BMinus,
        LetterGrade::CPlus,
        LetterGrade::C,
        LetterGrade::CMinus,
        LetterGrade::F,
    ];

    /// Step function over the percentage
    pub fn from_percentage(percentage: f64) -> LetterGrade {
        THRESHOLDS
            .iter()
            .find(|(floor, _)| percentage >= *floor)
            .map(|(_, grade)| *grade)
            .unwrap_or(LetterGrade::F)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter → grade points policy table
///
/// The mapping is university policy, so it is loaded from configuration.
/// Letters missing from a configured table score 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpaTable {
    points: BTreeMap<LetterGrade, f64>,
}

impl Default for GpaTable {
    fn default() -> Self {
        let points = [
            (LetterGrade::A, 4.0),
            (LetterGrade::AMinus, 3.7),
            (LetterGrade::BPlus, 3.3),
            (LetterGrade::B, 3.0),
            (LetterGrade::BMinus, 2.7),
            (LetterGrade::CPlus, 2.3),
            (LetterGrade::C, 2.0),
            (LetterGrade::CMinus, 1.7),
            (LetterGrade::F, 0.0),
        ];
        Self {
            points: points.into_iter().collect(),
        }
    }
}

impl GpaTable {
    pub fn new(points: BTreeMap<LetterGrade, f64>) -> Self {
        Self { points }
    }

    pub fn points(&self, grade: LetterGrade) -> f64 {
        self.points.get(&grade).copied().unwrap_or(0.0)
    }

    /// Better letters never map to fewer points
    pub fn is_monotonic(&self) -> bool {
        LetterGrade::ALL
            .windows(2)
            .all(|pair| self.points(pair[0]) >= self.points(pair[1]))
    }
}

/// `100 × Σscore / Σmax`, or 0 when there is nothing to score against
pub fn percentage<'a>(grades: impl IntoIterator<Item = &'a Grade>) -> f64 {
    let (score, max) = grades
        .into_iter()
        .fold((0.0, 0.0), |(s, m), g| (s + g.score, m + g.max_score));
    if max <= 0.0 {
        0.0
    } else {
        100.0 * score / max
    }
}

/// Percentage over the released criteria only (what a student may see)
pub fn released_percentage(grades: &[Grade]) -> f64 {
    percentage(grades.iter().filter(|g| g.is_released))
}

/// Aggregated result for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentGradeSummary {
    pub document_id: i64,
    pub title: String,
    pub total_score: f64,
    pub total_max: f64,
    pub percentage: f64,
    pub letter: LetterGrade,
    pub gpa: f64,
    pub criteria: usize,
}

impl DocumentGradeSummary {
    /// Summarise the released grades of `document`
    ///
    /// Returns `None` when nothing has been released for it yet.
    pub fn released(document: &Document, grades: &[Grade], table: &GpaTable) -> Option<Self> {
        let released: Vec<&Grade> = grades
            .iter()
            .filter(|g| g.document_id == document.id && g.is_released)
            .collect();
        if released.is_empty() {
            return None;
        }

        let total_score: f64 = released.iter().map(|g| g.score).sum();
        let total_max: f64 = released.iter().map(|g| g.max_score).sum();
        let pct = percentage(released.iter().copied());
        let letter = LetterGrade::from_percentage(pct);
        Some(Self {
            document_id: document.id,
            title: document.title.clone(),
            total_score,
            total_max,
            percentage: pct,
            letter,
            gpa: table.points(letter),
            criteria: released.len(),
        })
    }
}

/// Detailed Marks Certificate for a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksCertificate {
    pub documents: Vec<DocumentGradeSummary>,
    /// Released scores pooled across every document
    pub overall_total_score: f64,
    pub overall_max_score: f64,
    /// `100 × overall_total_score / overall_max_score`, 0 when nothing is released
    pub overall_percentage: f64,
    pub overall_grade: LetterGrade,
    /// Mean of per-document GPAs, 0 when nothing is released
    pub overall_gpa: f64,
}

impl MarksCertificate {
    pub fn build(documents: &[Document], grades: &[Grade], table: &GpaTable) -> Self {
        let summaries: Vec<DocumentGradeSummary> = documents
            .iter()
            .filter_map(|doc| DocumentGradeSummary::released(doc, grades, table))
            .collect();
        let overall_total_score: f64 = summaries.iter().map(|s| s.total_score).sum();
        let overall_max_score: f64 = summaries.iter().map(|s| s.total_max).sum();
        let overall_percentage = if overall_max_score > 0.0 {
            100.0 * overall_total_score / overall_max_score
        } else {
            0.0
        };
        let overall_gpa = if summaries.is_empty() {
            0.0
        } else {
            summaries.iter().map(|s| s.gpa).sum::<f64>() / summaries.len() as f64
        };
        Self {
            documents: summaries,
            overall_total_score,
            overall_max_score,
            overall_percentage,
            overall_grade: LetterGrade::from_percentage(overall_percentage),
            overall_gpa,
        }
    }
}

/// Has `evaluator_id` scored every rubric criterion of `document_id`?
pub fn has_graded_all_criteria(grades: &[Grade], document_id: i64, evaluator_id: i64) -> bool {
    grades
        .iter()
        .filter(|g| g.document_id == document_id && g.evaluator_id == Some(evaluator_id))
        .count()
        >= RUBRIC_CRITERIA_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentKind;

    fn grade(document_id: i64, score: f64, max: f64, released: bool) -> Grade {
        Grade {
            id: 0,
            document_id,
            evaluator_id: Some(5),
            evaluator_name: None,
            rubric_criteria: "Methodology".to_string(),
            score,
            max_score: max,
            feedback: None,
            is_released: released,
            graded_at: None,
            released_at: None,
        }
    }

    fn doc(id: i64) -> Document {
        let created = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Document::new_draft(id, 1, DocumentKind::Proposal, format!("Doc {}", id), created)
    }

    #[test]
    fn test_percentage_example() {
        let grades = vec![grade(1, 18.0, 20.0, true), grade(1, 12.0, 15.0, true)];
        let pct = percentage(&grades);
        assert!((pct - 85.714_285).abs() < 1e-4);
        assert_eq!(LetterGrade::from_percentage(pct), LetterGrade::A);

        let reversed: Vec<Grade> = grades.into_iter().rev().collect();
        assert_eq!(LetterGrade::from_percentage(percentage(&reversed)), LetterGrade::A);
    }

    #[test]
    fn test_percentage_with_zero_max_is_zero() {
        assert_eq!(percentage(&Vec::<Grade>::new()), 0.0);
        assert_eq!(percentage(&[grade(1, 0.0, 0.0, true)]), 0.0);
    }

    #[test]
    fn test_letter_boundaries() {
        assert_eq!(LetterGrade::from_percentage(85.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(84.999), LetterGrade::AMinus);
        assert_eq!(LetterGrade::from_percentage(80.0), LetterGrade::AMinus);
        assert_eq!(LetterGrade::from_percentage(75.0), LetterGrade::BPlus);
        assert_eq!(LetterGrade::from_percentage(70.0), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(65.0), LetterGrade::BMinus);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::CPlus);
        assert_eq!(LetterGrade::from_percentage(55.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_percentage(50.0), LetterGrade::CMinus);
        assert_eq!(LetterGrade::from_percentage(49.99), LetterGrade::F);
        assert_eq!(LetterGrade::from_percentage(0.0), LetterGrade::F);
    }

    #[test]
    fn test_released_percentage_ignores_unreleased() {
        let grades = vec![grade(1, 10.0, 10.0, true), grade(1, 0.0, 10.0, false)];
        assert_eq!(released_percentage(&grades), 100.0);
    }

    #[test]
    fn test_default_gpa_table_is_monotonic() {
        let table = GpaTable::default();
        assert!(table.is_monotonic());
        assert_eq!(table.points(LetterGrade::A), 4.0);
        assert_eq!(table.points(LetterGrade::CMinus), 1.7);
    }

    #[test]
    fn test_gpa_table_from_toml_shape() {
        let table: GpaTable = serde_json::from_str(r#"{"A": 4.0, "B": 3.0, "F": 0.0}"#).unwrap();
        assert_eq!(table.points(LetterGrade::B), 3.0);
        assert_eq!(table.points(LetterGrade::BPlus), 0.0);
    }

    #[test]
    fn test_marks_certificate() {
        let docs = vec![doc(1), doc(2), doc(3)];
        let grades = vec![
            grade(1, 18.0, 20.0, true),
            grade(1, 12.0, 15.0, true),
            grade(2, 14.0, 20.0, true),
            grade(3, 20.0, 20.0, false),
        ];
        let dmc = MarksCertificate::build(&docs, &grades, &GpaTable::default());

        assert_eq!(dmc.documents.len(), 2);
        assert_eq!(dmc.documents[0].letter, LetterGrade::A);
        assert_eq!(dmc.documents[1].letter, LetterGrade::B);
        assert!((dmc.overall_gpa - 3.5).abs() < 1e-9);

        // Pooled over released criteria only: 44 / 55
        assert_eq!(dmc.overall_total_score, 44.0);
        assert_eq!(dmc.overall_max_score, 55.0);
        assert!((dmc.overall_percentage - 80.0).abs() < 1e-9);
        assert_eq!(dmc.overall_grade, LetterGrade::AMinus);
    }

    #[test]
    fn test_empty_certificate() {
        let dmc = MarksCertificate::build(&[doc(1)], &[], &GpaTable::default());
        assert!(dmc.documents.is_empty());
        assert_eq!(dmc.overall_gpa, 0.0);
        assert_eq!(dmc.overall_percentage, 0.0);
        assert_eq!(dmc.overall_grade, LetterGrade::F);
    }

    #[test]
    fn test_criteria_completeness() {
        let mut grades: Vec<Grade> = (0..5).map(|_| grade(1, 5.0, 10.0, false)).collect();
        assert!(!has_graded_all_criteria(&grades, 1, 5));
        grades.push(grade(1, 5.0, 10.0, false));
        assert!(has_graded_all_criteria(&grades, 1, 5));
        assert!(!has_graded_all_criteria(&grades, 1, 6));
    }
}
