//! Question sources: loading and validating the fixed question set.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{LoadError, Location, Result};
use crate::parser;
use crate::types::{Question, QuestionId, QuestionKind, RawQuestion};

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Markdown,
}

impl SourceFormat {
    /// Guess the format from a file extension; anything but `.json` is markdown.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Markdown,
        }
    }
}

/// Immutable, validated, ordered collection of questions.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSource {
    questions: Vec<Question>,
}

impl QuestionSource {
    /// Build a source from already-constructed questions, checking that ids
    /// are unique and multiple-choice questions are well formed.
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let raws = questions
            .into_iter()
            .enumerate()
            .map(|(idx, q)| RawQuestion {
                id: Some(q.id.as_str().to_string()),
                question: Some(q.question),
                answer: Some(q.answer),
                kind: Some(q.kind),
                choices: q.choices,
                location: Location::Record(idx + 1),
            })
            .collect();
        Self::from_raw(raws)
    }

    /// Read and validate a question file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, SourceFormat::from_path(path))
    }

    pub fn parse(content: &str, format: SourceFormat) -> Result<Self> {
        match format {
            SourceFormat::Json => Self::from_json(content),
            SourceFormat::Markdown => Self::from_markdown(content),
        }
    }

    pub fn from_markdown(content: &str) -> Result<Self> {
        Self::from_raw(parser::parse(content)?)
    }

    /// Parse a JSON array of question records.
    pub fn from_json(content: &str) -> Result<Self> {
        let records: Vec<JsonQuestion> = serde_json::from_str(content)?;
        let raws = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| record.into_raw(idx + 1))
            .collect();
        Self::from_raw(raws)
    }

    fn from_raw(raws: Vec<RawQuestion>) -> Result<Self> {
        if raws.is_empty() {
            return Err(LoadError::EmptySource);
        }

        // Generated ids skip every id a record states explicitly.
        let explicit: HashSet<String> = raws
            .iter()
            .filter_map(|raw| raw.id.as_deref())
            .map(|id| id.trim().to_string())
            .collect();

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(raws.len());
        let mut next_position = 1;

        for (idx, raw) in raws.into_iter().enumerate() {
            let location = raw.location;
            let position = if raw.id.is_some() {
                idx + 1
            } else {
                next_position = next_position.max(idx + 1);
                while explicit.contains(&next_position.to_string())
                    || seen.contains(&QuestionId::positional(next_position))
                {
                    next_position += 1;
                }
                next_position
            };
            let question = raw.build(position)?;
            if !seen.insert(question.id.clone()) {
                return Err(LoadError::DuplicateId {
                    id: question.id,
                    location,
                });
            }
            questions.push(question);
        }

        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// JSON record shape; `id` may be a string or a number.
#[derive(Debug, Deserialize)]
struct JsonQuestion {
    #[serde(default)]
    id: Option<JsonId>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<QuestionKind>,
    #[serde(default)]
    choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonId {
    Text(String),
    Number(i64),
}

impl JsonQuestion {
    fn into_raw(self, index: usize) -> RawQuestion {
        RawQuestion {
            id: self.id.map(|id| match id {
                JsonId::Text(text) => text,
                JsonId::Number(n) => n.to_string(),
            }),
            question: self.question,
            answer: self.answer,
            kind: self.kind,
            choices: self.choices,
            location: Location::Record(index),
        }
    }
}
