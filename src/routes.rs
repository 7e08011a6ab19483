use axum::{
    async_trait,
    body::Bytes,
    extract::{Form, FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn};

use crate::error::BotError;
use crate::handlers::{self, spawn_job};
use crate::slack::commands::{parse_command, ParsedCommand, SlashCommandPayload};
use crate::slack::events::{route_event, EventAction, EventEnvelope};
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Slack webhooks
        .route("/command", post(command_handler))
        .route("/event", post(event_handler))

        // Health check
        .route("/api/health", get(health_check))
}

/// Body extractor accepting either JSON or a url-encoded form.
///
/// Rejections are logged and answered with 400.
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        let parsed = if is_json {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| value)
                .map_err(|rejection| rejection.body_text())
        } else {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| value)
                .map_err(|rejection| rejection.body_text())
        };

        parsed.map(JsonOrForm).map_err(|message| {
            let err = BotError::MalformedPayload(message);
            warn!("Rejected request body: {}", err);
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        })
    }
}

/// Acknowledge a slash command at once; the reply follows through the
/// command's response URL.
async fn command_handler(
    State(state): State<AppState>,
    JsonOrForm(payload): JsonOrForm<SlashCommandPayload>,
) -> StatusCode {
    let command = parse_command(
        &payload,
        &state.config.public_command,
        &state.config.private_command,
    );
    if let ParsedCommand::Unknown { .. } = command {
        return StatusCode::OK;
    }

    let span = info_span!(
        "command",
        job_id = %state.generate_job_id(),
        user = %payload.user_id
    );
    let job_state = state.clone();
    spawn_job(&state.jobs, span, async move {
        handlers::handle_command(&job_state, command).await
    });

    StatusCode::OK
}

async fn event_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            let err = BotError::from(e);
            warn!("Rejected event: {}", err);
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    match route_event(envelope, state.config.bot_user_id.as_deref()) {
        EventAction::Challenge(challenge) => {
            info!("Answering URL verification");
            challenge.into_response()
        }
        EventAction::TranslateMention { text, channel } => {
            let span = info_span!(
                "mention",
                job_id = %state.generate_job_id(),
                channel = %channel
            );
            let job_state = state.clone();
            spawn_job(&state.jobs, span, async move {
                handlers::handle_mention(&job_state, text, channel).await
            });
            StatusCode::OK.into_response()
        }
        EventAction::Ignore(reason) => {
            debug!("Ignoring event: {}", reason);
            StatusCode::OK.into_response()
        }
    }
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.languages.is_loaded() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "languages": state.languages.len()
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "starting"})),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{test_config, test_state, FakeChat};
    use crate::translate::auto::tests::FakeTranslator;
    use axum::body::Body;
    use axum::http;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn send(state: AppState, request: Request) -> (StatusCode, String) {
        let response = create_routes()
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn json_post(uri: &str, body: Value) -> Request {
        http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Poll until the spawned job has produced `count` outbound messages.
    async fn wait_for_replies(chat: &FakeChat, count: usize) {
        for _ in 0..100 {
            let sent = chat.callbacks.lock().unwrap().len() + chat.posts.lock().unwrap().len();
            if sent >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background job did not reply in time");
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let translator = Arc::new(FakeTranslator::new(&[("en", 0.9)], "unused"));
        let state = test_state(translator.clone(), Arc::new(FakeChat::default())).await;

        let (status, body) = send(
            state,
            json_post(
                "/event",
                json!({"type": "url_verification", "token": "t", "challenge": "abc123"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "abc123");
        assert_eq!(translator.identify_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_event_is_rejected() {
        let state = test_state(
            Arc::new(FakeTranslator::new(&[], "unused")),
            Arc::new(FakeChat::default()),
        )
        .await;

        let request = http::Request::builder()
            .method("POST")
            .uri("/event")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"type\": "))
            .unwrap();
        let (status, body) = send(state, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Malformed payload"));
    }

    #[tokio::test]
    async fn test_mention_event_posts_translation() {
        let translator = Arc::new(FakeTranslator::new(&[("en", 0.95)], "これを翻訳して"));
        let chat = Arc::new(FakeChat::default());
        let state = test_state(translator.clone(), chat.clone()).await;

        let (status, body) = send(
            state,
            json_post(
                "/event",
                json!({
                    "type": "event_callback",
                    "authed_users": ["BOTID"],
                    "event": {
                        "type": "app_mention",
                        "text": "<@BOTID> translate this",
                        "channel": "C123"
                    }
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        wait_for_replies(&chat, 1).await;
        assert_eq!(translator.calls()[0].0, "translate this");
        assert_eq!(
            *chat.posts.lock().unwrap(),
            vec![("これを翻訳して".to_string(), "C123".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unknown_command_is_acknowledged_without_reply() {
        let translator = Arc::new(FakeTranslator::new(&[("en", 0.9)], "unused"));
        let chat = Arc::new(FakeChat::default());
        let state = test_state(translator.clone(), chat.clone()).await;

        let (status, body) = send(
            state,
            form_post(
                "/command",
                "command=%2Ffoo&text=hello&user_id=U1&response_url=https%3A%2F%2Fhooks.slack.com%2Fx",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(translator.identify_count(), 0);
        assert!(chat.callbacks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_form_command_is_acknowledged_then_replied() {
        let translator = Arc::new(FakeTranslator::new(&[("en", 0.95)], "こんにちは"));
        let chat = Arc::new(FakeChat::default());
        let state = test_state(translator, chat.clone()).await;

        let (status, body) = send(
            state,
            form_post(
                "/command",
                "command=%2Ftranslate&text=Hello+there&user_id=U1&response_url=https%3A%2F%2Fhooks.slack.com%2Fx",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        wait_for_replies(&chat, 1).await;
        let callbacks = chat.callbacks.lock().unwrap();
        assert_eq!(callbacks[0].0, "https://hooks.slack.com/x");
        assert_eq!(
            callbacks[0].1.text,
            ":-watson-: <@U1>: 'Hello there' in Japanese would be"
        );
    }

    #[tokio::test]
    async fn test_json_command_is_accepted() {
        let chat = Arc::new(FakeChat::default());
        let state = test_state(
            Arc::new(FakeTranslator::new(&[("ja", 0.99)], "Hello")),
            chat.clone(),
        )
        .await;

        let (status, _) = send(
            state,
            json_post(
                "/command",
                json!({
                    "command": "/translatep",
                    "text": "こんにちは",
                    "user_id": "U2",
                    "response_url": "https://hooks.slack.com/y"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        wait_for_replies(&chat, 1).await;
        assert!(chat.callbacks.lock().unwrap()[0].1.response_type.is_none());
    }

    #[tokio::test]
    async fn test_command_without_response_url_is_rejected() {
        let state = test_state(
            Arc::new(FakeTranslator::new(&[], "unused")),
            Arc::new(FakeChat::default()),
        )
        .await;

        let (status, _) = send(state, form_post("/command", "command=%2Ftranslate&text=hi")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_reports_readiness() {
        let state = test_state(
            Arc::new(FakeTranslator::new(&[], "unused")),
            Arc::new(FakeChat::default()),
        )
        .await;
        let (status, body) = send(
            state,
            http::Request::builder().uri("/api/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "ok", "languages": 2})
        );

        let not_loaded = AppState::with_services(
            test_config(),
            Arc::new(FakeTranslator::new(&[], "unused")),
            Arc::new(FakeChat::default()),
        );
        let (status, _) = send(
            not_loaded,
            http::Request::builder().uri("/api/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
