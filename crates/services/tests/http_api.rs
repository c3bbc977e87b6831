mod common;

use std::sync::Arc;
use std::time::Duration;

use quiz_core::Clock;
use quiz_core::model::{AnswerSheet, QuizId, ScoringSource};
use quiz_core::scoring::GradeReport;
use services::{
    ApiConfig, HttpQuizApi, QuizApiError, QuizCatalog, QuizGrader, QuizSession, SessionError,
    UserContext,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves one canned HTTP response and yields the raw request head.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        String::from_utf8_lossy(&head).into_owned()
    });
    (base, handle)
}

fn api(base: &str, user: UserContext) -> HttpQuizApi {
    let config = ApiConfig::new(base, Duration::from_secs(5)).unwrap();
    HttpQuizApi::new(&config, user).unwrap()
}

async fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);
    base
}

#[tokio::test]
async fn catalog_request_carries_bearer_token() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"quizzes":[{"video_id":"q1","course_title":"Rust Memory","duration":5,
            "quiz":[{"question":"Where do locals live?","options":["Stack","Heap"]}]}]}"#,
    )
    .await;

    let quizzes = api(&base, UserContext::with_token("secret-token"))
        .list_quizzes()
        .await
        .unwrap();
    let head = server.await.unwrap();

    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0].id(), &QuizId::new("q1"));
    assert_eq!(quizzes[0].duration_secs(), 300);
    assert!(head.starts_with("GET /api/quizzes "));
    assert!(
        head.to_ascii_lowercase()
            .contains("authorization: bearer secret-token")
    );
}

#[tokio::test]
async fn anonymous_requests_send_no_authorization() {
    let (base, server) = serve_once("200 OK", r#"{"quizzes":[]}"#).await;

    let quizzes = api(&base, UserContext::anonymous())
        .list_quizzes()
        .await
        .unwrap();
    let head = server.await.unwrap();

    assert!(quizzes.is_empty());
    assert!(!head.to_ascii_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn grade_request_encodes_answers_in_query() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"result":{"quiz_evaluation":{"marks":1,"percentage":50}}}"#,
    )
    .await;

    let report = api(&base, UserContext::anonymous())
        .grade(&QuizId::new("q1"), &AnswerSheet::new(vec![Some(2), None]))
        .await
        .unwrap();
    let head = server.await.unwrap();

    assert_eq!(report, GradeReport::new(1, Some(50.0)));
    let request_line = head.lines().next().unwrap();
    assert!(request_line.starts_with("GET /api/check-quiz?"));
    assert!(request_line.contains("video_id=q1"));
    assert!(request_line.contains("answers=%5B2%2Cnull%5D"));
}

#[tokio::test]
async fn error_status_is_reported() {
    let (base, server) = serve_once("503 Service Unavailable", r#"{"detail":"down"}"#).await;

    let err = api(&base, UserContext::anonymous())
        .list_quizzes()
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        QuizApiError::HttpStatus(status) => assert_eq!(status.as_u16(), 503),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_grade_body_is_rejected() {
    let (base, server) = serve_once("200 OK", r#"{"result":{}}"#).await;

    let err = api(&base, UserContext::anonymous())
        .grade(&QuizId::new("q1"), &AnswerSheet::new(vec![None]))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, QuizApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn health_accepts_ok_status() {
    let (base, server) = serve_once("200 OK", r#"{"status":"ok"}"#).await;

    api(&base, UserContext::anonymous()).health().await.unwrap();
    let head = server.await.unwrap();

    assert!(head.starts_with("GET /health "));
}

#[tokio::test]
async fn unreachable_backend_degrades_the_session() {
    let api = Arc::new(api(&dead_base_url().await, UserContext::anonymous()));
    let mut session = QuizSession::new(Clock::system(), api.clone(), api);

    let err = session.load_catalog().await.unwrap_err();
    assert!(matches!(err, SessionError::CatalogUnavailable(_)));
    assert!(session.catalog().is_empty());

    session
        .start_attempt(common::two_question_quiz())
        .await
        .unwrap();
    session.select_answer(0, 0).unwrap();
    let result = session.submit().await.unwrap();

    assert_eq!(result.scoring_source, ScoringSource::LocalFallback);
    assert_eq!(result.total, 2);
    assert!(matches!(
        session.fallback_reason(),
        Some(SessionError::GradingUnavailable(QuizApiError::Http(_)))
    ));
}
