use axum::{Json, Router, http::StatusCode, routing::post};
use faq_chat_widget::Error;
use faq_chat_widget::client::{HttpQueryClient, QueryClient, QueryRequest};
use faq_chat_widget::widget::{ERROR_REPLY, NOT_FOUND_REPLY, Outcome, Sender, WidgetHandle};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Stand-in for the FastAPI `/query/` backend.
///
/// The `Json` extractor rejects requests without a JSON content type.
async fn query(Json(req): Json<QueryRequest>) -> (StatusCode, String) {
    match req.question.as_str() {
        "What is X?" => (
            StatusCode::OK,
            json!({ "answer": "X is Y", "sources": [] }).to_string(),
        ),
        "nothing" => (StatusCode::OK, "{}".to_string()),
        "blank" => (StatusCode::OK, json!({ "answer": "" }).to_string()),
        "garbage" => (StatusCode::OK, "<html>oops</html>".to_string()),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, "{}".to_string())
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "boom" }).to_string(),
        ),
    }
}

async fn spawn_backend() -> SocketAddr {
    let app = Router::new().route("/query/", post(query));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> HttpQueryClient {
    HttpQueryClient::new(format!("http://{addr}/query/")).unwrap()
}

#[tokio::test]
async fn test_answer_is_returned() {
    let client = client_for(spawn_backend().await);
    let response = client.ask("What is X?").await.unwrap();
    assert_eq!(response.answer.as_deref(), Some("X is Y"));
}

#[tokio::test]
async fn test_missing_and_empty_answer_are_not_found() {
    let client = client_for(spawn_backend().await);

    let outcome = Outcome::from_response(client.ask("nothing").await.unwrap());
    assert_eq!(outcome, Outcome::NotFound);

    let outcome = Outcome::from_response(client.ask("blank").await.unwrap());
    assert_eq!(outcome, Outcome::NotFound);
}

#[tokio::test]
async fn test_non_json_body_is_an_error() {
    let client = client_for(spawn_backend().await);
    let err = client.ask("garbage").await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn test_error_status_is_an_error() {
    let client = client_for(spawn_backend().await);
    match client.ask("anything else").await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("boom"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_an_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(addr).ask("What is X?").await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_timeout_is_an_error() {
    let addr = spawn_backend().await;
    let endpoint = format!("http://{addr}/query/").parse().unwrap();
    let client = HttpQueryClient::with_timeout(endpoint, Duration::from_millis(100)).unwrap();

    let err = client.ask("slow").await.unwrap_err();
    assert!(matches!(err, Error::Http(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn test_widget_round_trip_against_backend() {
    let client = Arc::new(client_for(spawn_backend().await));
    let widget = WidgetHandle::new(client);
    widget.toggle();

    for (question, expected) in [
        ("What is X?", "X is Y"),
        ("nothing", NOT_FOUND_REPLY),
        ("garbage", ERROR_REPLY),
        ("explode", ERROR_REPLY),
    ] {
        widget.set_draft(question);
        let task = widget.send().expect("non-blank draft submits");
        assert!(widget.snapshot().is_loading());
        task.await.unwrap();

        let state = widget.snapshot();
        assert!(!state.is_loading());
        let reply = state.messages().last().unwrap();
        assert_eq!(reply.sender(), Sender::Bot);
        assert_eq!(reply.text(), expected);
    }

    assert_eq!(widget.snapshot().messages().len(), 8);
}

#[tokio::test]
async fn test_overlapping_submissions_each_get_a_reply() {
    let client = Arc::new(client_for(spawn_backend().await));
    let widget = WidgetHandle::new(client);

    widget.set_draft("What is X?");
    let first = widget.send().unwrap();
    widget.set_draft("nothing");
    let second = widget.send().unwrap();
    assert_eq!(widget.snapshot().pending_count(), 2);

    let outcomes: Vec<Outcome> = futures::future::join_all([first, second])
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(outcomes, vec![Outcome::Answered("X is Y".to_string()), Outcome::NotFound]);

    let state = widget.snapshot();
    assert!(!state.is_loading());
    assert_eq!(state.messages().len(), 4);

    let bot_replies: Vec<&str> = state
        .messages()
        .iter()
        .filter(|m| m.sender() == Sender::Bot)
        .map(|m| m.text())
        .collect();
    assert_eq!(bot_replies.len(), 2);
    assert!(bot_replies.contains(&"X is Y"));
    assert!(bot_replies.contains(&NOT_FOUND_REPLY));
}
