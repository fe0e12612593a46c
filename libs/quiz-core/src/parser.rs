//! Markdown parser for question files.
//!
//! # Format
//! ```markdown
//! ID: capital-fr
//! Q: Capital of France?
//! A: Paris
//!
//! ID: pick-b
//! Q: Which letter comes second?
//! C: A
//! C: B
//! C: C
//! A: B
//! ```
//!
//! `C:` lines make a question multiple-choice. `T:` may state the type
//! explicitly (`free-text` or `multiple-choice`). Question and answer text
//! may continue over several lines.

use crate::error::{LoadError, Location, Result};
use crate::types::{QuestionKind, RawQuestion};

/// Parse markdown content into raw, unvalidated questions.
pub fn parse(content: &str) -> Result<Vec<RawQuestion>> {
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut parser = Parser::new();

    for (idx, line) in content.lines().enumerate() {
        parser.process_line(line, idx + 1)?;
    }

    Ok(parser.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Question,
    Answer,
}

struct Parser {
    questions: Vec<RawQuestion>,
    current: Option<RawQuestion>,
    current_field: Option<Field>,
    buffer: Vec<String>,
}

impl Parser {
    fn new() -> Self {
        Self {
            questions: Vec::new(),
            current: None,
            current_field: None,
            buffer: Vec::new(),
        }
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<()> {
        match Self::parse_line(line) {
            LineType::Id(id) => self.handle_id(id, line_num),
            LineType::Question(text) => self.handle_question(text, line_num),
            LineType::Answer(text) => self.handle_answer(text, line_num),
            LineType::Choice(text) => self.handle_choice(text, line_num),
            LineType::Kind(value) => self.handle_kind(value, line_num)?,
            LineType::Text(text) => self.buffer.push(text.to_string()),
            LineType::Empty => self.buffer.push(String::new()),
        }
        Ok(())
    }

    fn parse_line(line: &str) -> LineType<'_> {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("ID:") {
            LineType::Id(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Q:") {
            LineType::Question(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("A:") {
            LineType::Answer(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("C:") {
            LineType::Choice(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("T:") {
            LineType::Kind(rest.trim())
        } else if trimmed.is_empty() {
            LineType::Empty
        } else {
            LineType::Text(line)
        }
    }

    fn handle_id(&mut self, id: &str, line_num: usize) {
        self.flush_buffer();

        let starts_new = self
            .current
            .as_ref()
            .map_or(true, |q| q.id.is_some() || q.question.is_some());
        if starts_new {
            self.start_question(line_num);
        }
        if let Some(ref mut question) = self.current {
            question.id = Some(id.to_string());
        }
        self.current_field = None;
    }

    fn handle_question(&mut self, text: &str, line_num: usize) {
        self.flush_buffer();

        let starts_new = self
            .current
            .as_ref()
            .map_or(true, |q| q.question.is_some());
        if starts_new {
            self.start_question(line_num);
        }

        self.current_field = Some(Field::Question);
        self.buffer.push(text.to_string());
    }

    fn handle_answer(&mut self, text: &str, line_num: usize) {
        self.flush_buffer();
        self.ensure_question(line_num);
        self.current_field = Some(Field::Answer);
        self.buffer.push(text.to_string());
    }

    fn handle_choice(&mut self, text: &str, line_num: usize) {
        self.flush_buffer();
        self.ensure_question(line_num);
        self.current_field = None;
        if let Some(ref mut question) = self.current {
            question.choices.push(text.to_string());
        }
    }

    fn handle_kind(&mut self, value: &str, line_num: usize) -> Result<()> {
        self.flush_buffer();
        self.ensure_question(line_num);
        self.current_field = None;

        let kind = match value {
            "free-text" => QuestionKind::FreeText,
            "multiple-choice" => QuestionKind::MultipleChoice,
            _ => {
                return Err(LoadError::InvalidKind {
                    location: Location::Line(line_num),
                    value: value.to_string(),
                })
            }
        };
        if let Some(ref mut question) = self.current {
            question.kind = Some(kind);
        }
        Ok(())
    }

    fn ensure_question(&mut self, line_num: usize) {
        if self.current.is_none() {
            self.start_question(line_num);
        }
    }

    fn start_question(&mut self, line_num: usize) {
        if let Some(done) = self.current.take() {
            self.questions.push(done);
        }
        self.current = Some(RawQuestion {
            location: Location::Line(line_num),
            ..RawQuestion::default()
        });
        self.current_field = None;
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let content = self.buffer.join("\n").trim().to_string();
        self.buffer.clear();

        if let Some(ref mut question) = self.current {
            match self.current_field {
                Some(Field::Question) => question.question = Some(content),
                Some(Field::Answer) => question.answer = Some(content),
                None => {}
            }
        }
    }

    fn finalize(mut self) -> Vec<RawQuestion> {
        self.flush_buffer();
        if let Some(question) = self.current.take() {
            self.questions.push(question);
        }
        self.questions
    }
}

enum LineType<'a> {
    Id(&'a str),
    Question(&'a str),
    Answer(&'a str),
    Choice(&'a str),
    Kind(&'a str),
    Text(&'a str),
    Empty,
}
