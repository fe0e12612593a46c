use std::fs;

use pretty_assertions::assert_eq;
use quiz_core::{GradingMode, Phase, QuestionSource, QuizSession, SessionSettings};
use quiz_terminal::identity::Identity;
use quiz_terminal::results::ResultSink;
use quiz_terminal::shell::Shell;

const QUESTIONS: &str = r#"[
  { "id": "sum", "question": "2+2?", "answer": "4" },
  { "id": "pick", "question": "Pick B", "answer": "B", "choices": ["A", "B"] }
]"#;

fn load_source() -> QuestionSource {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.json");
    fs::write(&path, QUESTIONS).unwrap();
    QuestionSource::load(&path).unwrap()
}

fn shell(grading: GradingMode) -> Shell<Vec<u8>> {
    let settings = SessionSettings {
        grading,
        ..SessionSettings::default()
    };
    Shell::new(
        QuizSession::new(&load_source(), settings),
        Identity::local("ada"),
        ResultSink::Local,
        Vec::new(),
    )
}

#[tokio::test]
async fn batch_session_from_file_scores_answers() {
    let mut shell = shell(GradingMode::Batch);
    shell.start().unwrap();

    // Answer each question correctly, using the choice number for the MC one.
    for _ in 0..2 {
        let current = shell.session().current().unwrap().clone();
        let reply = if current.is_multiple_choice() {
            "2".to_string()
        } else {
            current.answer.clone()
        };
        shell.handle_line(&reply).unwrap();
    }

    assert_eq!(shell.session().phase(), Phase::Completed);
    let outcome = shell.session().outcome().unwrap();
    assert_eq!(outcome.score, 2);
    assert_eq!(outcome.total, 2);
    shell.shutdown().await.unwrap();

    let output = String::from_utf8_lossy(shell.output()).into_owned();
    assert!(output.contains("Score: 2/2"));
}

#[tokio::test]
async fn missed_questions_come_back_until_answered() {
    let mut shell = shell(GradingMode::Incremental);
    shell.start().unwrap();

    shell.handle_line("nope").unwrap();
    shell.handle_line(":continue").unwrap();
    shell.handle_line("nope").unwrap();
    shell.handle_line(":continue").unwrap();

    let progress = shell.session().progress();
    assert_eq!(shell.session().phase(), Phase::Presenting);
    assert_eq!(progress.presented, 3);
    assert_eq!(progress.retry_len, 1);
    assert_eq!(progress.answered_correctly, 0);
}
