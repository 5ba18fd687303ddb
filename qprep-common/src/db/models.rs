//! Question corpus models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The four question formats served by the assembly engine.
///
/// Serialized as the conventional short codes ("PS", "DS", "CR", "RC")
/// in both the database and the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionType {
    /// Standalone multiple-choice quantitative problem
    #[serde(rename = "PS")]
    ProblemSolving,
    /// Two-statement sufficiency problem
    #[serde(rename = "DS")]
    DataSufficiency,
    /// Argument-based verbal question
    #[serde(rename = "CR")]
    CriticalReasoning,
    /// Passage-grouped verbal question
    #[serde(rename = "RC")]
    ReadingComprehension,
}

impl QuestionType {
    /// All types in canonical planning order (passage-grouped first).
    pub const ALL: [QuestionType; 4] = [
        QuestionType::ReadingComprehension,
        QuestionType::CriticalReasoning,
        QuestionType::DataSufficiency,
        QuestionType::ProblemSolving,
    ];

    /// Short code stored in the database `question_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ProblemSolving => "PS",
            QuestionType::DataSufficiency => "DS",
            QuestionType::CriticalReasoning => "CR",
            QuestionType::ReadingComprehension => "RC",
        }
    }

    /// Whether questions of this type attach to a shared reading passage.
    pub fn is_passage_grouped(&self) -> bool {
        matches!(self, QuestionType::ReadingComprehension)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = crate::Error;

    /// Accepts the short code or the spelled-out name, case-insensitively.
    /// Ingested exports use both spellings.
    fn from_str(s: &str) -> crate::Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "ps" | "problem solving" => Ok(QuestionType::ProblemSolving),
            "ds" | "data sufficiency" => Ok(QuestionType::DataSufficiency),
            "cr" | "critical reasoning" => Ok(QuestionType::CriticalReasoning),
            "rc" | "reading comprehension" => Ok(QuestionType::ReadingComprehension),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown question type: {}",
                s
            ))),
        }
    }
}

/// Exam section a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Quantitative,
    Verbal,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Quantitative => "quantitative",
            Category::Verbal => "verbal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quantitative" | "quant" => Ok(Category::Quantitative),
            "verbal" => Ok(Category::Verbal),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown category: {}",
                s
            ))),
        }
    }
}

/// Scored difficulty band, as labeled in the source exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Sub 500")]
    Sub500,
    #[serde(rename = "500-600")]
    Range500To600,
    #[serde(rename = "600-700")]
    Range600To700,
    #[serde(rename = "700+")]
    Level700Plus,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Sub500 => "Sub 500",
            Difficulty::Range500To600 => "500-600",
            Difficulty::Range600To700 => "600-700",
            Difficulty::Level700Plus => "700+",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sub 500" | "sub500" => Ok(Difficulty::Sub500),
            "500-600" => Ok(Difficulty::Range500To600),
            "600-700" => Ok(Difficulty::Range600To700),
            "700+" | "700 plus" => Ok(Difficulty::Level700Plus),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown difficulty band: {}",
                s
            ))),
        }
    }
}

/// One question row from the corpus.
///
/// `options` maps answer labels ("A".."E") to option text; the map is
/// ordered so iteration always yields label order. Passage fields are
/// populated only for reading comprehension rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub category: Category,
    pub difficulty: Option<Difficulty>,
    pub text: String,
    pub options: BTreeMap<String, String>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub passage_id: Option<Uuid>,
    pub passage_text: Option<String>,
    pub sequence_in_passage: Option<i64>,
    pub topic: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Decode an `options` JSON object column into a label → text map.
///
/// Malformed JSON yields an empty map; the validity filter then rejects
/// the row instead of failing the whole query.
pub fn options_from_json(raw: &str) -> BTreeMap<String, String> {
    serde_json::from_str(raw).unwrap_or_default()
}
