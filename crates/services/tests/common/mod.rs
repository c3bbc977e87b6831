#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::model::{AnswerSheet, Question, Quiz, QuizId};
use quiz_core::scoring::GradeReport;
use quiz_core::time::fixed_clock;
use services::{QuizApiError, QuizCatalog, QuizGrader, QuizSession, SessionConfig};

/// Catalog fake that can be switched offline between calls.
#[derive(Default)]
pub struct FakeCatalog {
    quizzes: Mutex<Option<Vec<Quiz>>>,
}

impl FakeCatalog {
    pub fn with(quizzes: Vec<Quiz>) -> Arc<Self> {
        Arc::new(Self {
            quizzes: Mutex::new(Some(quizzes)),
        })
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn go_offline(&self) {
        *self.quizzes.lock().unwrap() = None;
    }
}

#[async_trait]
impl QuizCatalog for FakeCatalog {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, QuizApiError> {
        self.quizzes
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| QuizApiError::InvalidResponse("catalog offline".into()))
    }
}

/// Grader fake that records every submission.
pub struct FakeGrader {
    report: Option<GradeReport>,
    calls: Mutex<Vec<(QuizId, AnswerSheet)>>,
}

impl FakeGrader {
    pub fn returning(report: GradeReport) -> Arc<Self> {
        Arc::new(Self {
            report: Some(report),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            report: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(QuizId, AnswerSheet)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizGrader for FakeGrader {
    async fn grade(
        &self,
        quiz_id: &QuizId,
        answers: &AnswerSheet,
    ) -> Result<GradeReport, QuizApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((quiz_id.clone(), answers.clone()));
        self.report
            .ok_or_else(|| QuizApiError::InvalidResponse("grading offline".into()))
    }
}

pub fn options() -> Vec<String> {
    vec!["Stack".into(), "Heap".into(), "Both".into()]
}

/// `q1`: two questions, five minutes, no locally known answers.
pub fn two_question_quiz() -> Arc<Quiz> {
    Arc::new(
        Quiz::new(
            QuizId::new("q1"),
            "Rust Memory",
            vec![
                Question::new("Where do locals live?", options()),
                Question::new("Where does a Box point?", options()),
            ],
            5,
        )
        .unwrap(),
    )
}

pub fn quiz_with(id: &str, questions: usize, minutes: u32) -> Quiz {
    let questions = (0..questions)
        .map(|i| Question::new(format!("Question {i}"), options()))
        .collect();
    Quiz::new(QuizId::new(id), format!("Course {id}"), questions, minutes).unwrap()
}

pub fn session(catalog: Arc<FakeCatalog>, grader: Arc<FakeGrader>) -> QuizSession {
    QuizSession::new(fixed_clock(), catalog, grader)
}

pub fn session_with(
    catalog: Arc<FakeCatalog>,
    grader: Arc<FakeGrader>,
    config: SessionConfig,
) -> QuizSession {
    session(catalog, grader).with_config(config)
}
