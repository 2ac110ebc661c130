//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use chime_app::ports::{AutomationControl, EventPublisher};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level using the `tracing`
/// ecosystem.
pub fn build<C, P>(state: AppState<C, P>) -> Router
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chime_app::ports::EngineStatus;
    use chime_domain::error::{ChimeError, NotFoundError};
    use chime_domain::event::DeviceEvent;
    use chime_domain::history::{LogEntry, StatsReport, UsageStats};
    use chime_domain::id::RuleId;
    use chime_domain::rule::{Rule, RuleSet};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeControl {
        rules: Mutex<Option<RuleSet>>,
        reloads: Mutex<usize>,
        toggles: Mutex<Vec<(Option<String>, bool)>>,
    }

    impl FakeControl {
        fn document(&self) -> RuleSet {
            self.rules.lock().unwrap().clone().unwrap_or_default()
        }
    }

    impl AutomationControl for FakeControl {
        async fn status(&self) -> EngineStatus {
            EngineStatus {
                running: true,
                active_rules: self.document().enabled_rules().count(),
                wake_points: Vec::new(),
                battery_level: Some(80),
                charging: Some(false),
                plugged: None,
                busy: false,
            }
        }

        async fn reload(&self) {
            *self.reloads.lock().unwrap() += 1;
        }

        async fn rules(&self) -> RuleSet {
            self.document()
        }

        async fn replace_rules(&self, rules: RuleSet) -> Result<(), ChimeError> {
            rules.validate()?;
            *self.rules.lock().unwrap() = Some(rules);
            Ok(())
        }

        async fn upsert_rule(&self, rule: Rule) -> Result<(), ChimeError> {
            let mut document = self.document();
            document.rules.retain(|existing| existing.id != rule.id);
            document.rules.push(rule);
            *self.rules.lock().unwrap() = Some(document);
            Ok(())
        }

        async fn delete_rule(&self, id: RuleId) -> Result<(), ChimeError> {
            let mut document = self.document();
            let before = document.rules.len();
            document.rules.retain(|rule| rule.id != id);
            if document.rules.len() == before {
                return Err(NotFoundError {
                    entity: "Rule",
                    id: id.to_string(),
                }
                .into());
            }
            *self.rules.lock().unwrap() = Some(document);
            Ok(())
        }

        async fn set_rule_enabled(&self, id: RuleId, enabled: bool) -> Result<(), ChimeError> {
            self.toggles
                .lock()
                .unwrap()
                .push((Some(id.to_string()), enabled));
            Ok(())
        }

        async fn set_automation_enabled(&self, enabled: bool) -> Result<(), ChimeError> {
            self.toggles.lock().unwrap().push((None, enabled));
            Ok(())
        }

        async fn logs(&self) -> Result<Vec<LogEntry>, ChimeError> {
            Ok(Vec::new())
        }

        async fn clear_logs(&self) -> Result<(), ChimeError> {
            Ok(())
        }

        async fn stats(&self) -> Result<StatsReport, ChimeError> {
            Ok(UsageStats::default().report(chime_domain::time::now().date_naive()))
        }

        async fn clear_stats(&self) -> Result<(), ChimeError> {
            Err(ChimeError::Storage("disk full".into()))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<DeviceEvent>>,
    }

    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: DeviceEvent) -> Result<(), ChimeError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn test_state() -> AppState<FakeControl, RecordingPublisher> {
        AppState::new(FakeControl::default(), RecordingPublisher::default())
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state());

        let response = app.oneshot(request("GET", "/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_default_rules() {
        let app = build(test_state());

        let response = app.oneshot(request("GET", "/api/rules", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["enabled"], true);
        assert_eq!(body["rules"].as_array().unwrap().len(), 3);
        assert_eq!(body["rules"][1]["id"], "low_battery");
    }

    #[tokio::test]
    async fn should_upsert_rule_using_id_from_path() {
        let state = test_state();
        let app = build(state.clone());

        let response = app
            .oneshot(request(
                "PUT",
                "/api/rules/evening",
                Some(serde_json::json!({
                    "id": "ignored",
                    "name": "Evening",
                    "triggers": [{"type": "time", "time": "19:30"}],
                    "actions": [{"type": "speak", "text": "晚上好"}]
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], "evening");
        assert!(
            state
                .control
                .document()
                .rules
                .iter()
                .any(|rule| rule.id.as_str() == "evening")
        );
    }

    #[tokio::test]
    async fn should_reject_rule_without_actions() {
        let app = build(test_state());

        let response = app
            .oneshot(request(
                "PUT",
                "/api/rules/empty",
                Some(serde_json::json!({
                    "name": "Empty",
                    "triggers": [{"type": "battery", "level_below": 10}],
                    "actions": []
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("action"));
    }

    #[tokio::test]
    async fn should_reject_rule_with_unreadable_shape() {
        let app = build(test_state());

        let response = app
            .oneshot(request(
                "PUT",
                "/api/rules/broken",
                Some(serde_json::json!({"name": "Broken", "triggers": "daily"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_duplicate_ids_on_replace() {
        let app = build(test_state());
        let rule = serde_json::json!({
            "id": "twin",
            "name": "Twin",
            "triggers": [{"type": "power", "state": "plugged"}],
            "actions": [{"type": "notify", "title": "充电中"}]
        });

        let response = app
            .oneshot(request(
                "PUT",
                "/api/rules",
                Some(serde_json::json!({"rules": [rule.clone(), rule]})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_404_when_deleting_unknown_rule() {
        let app = build(test_state());

        let response = app
            .oneshot(request("DELETE", "/api/rules/nope", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_delete_known_rule() {
        let app = build(test_state());

        let response = app
            .oneshot(request("DELETE", "/api/rules/bedtime", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn should_forward_enable_toggles() {
        let state = test_state();

        let rule = build(state.clone())
            .oneshot(request(
                "PUT",
                "/api/rules/bedtime/enabled",
                Some(serde_json::json!({"enabled": false})),
            ))
            .await
            .unwrap();
        let master = build(state.clone())
            .oneshot(request(
                "PUT",
                "/api/automation/enabled",
                Some(serde_json::json!({"enabled": true})),
            ))
            .await
            .unwrap();

        assert_eq!(rule.status(), StatusCode::NO_CONTENT);
        assert_eq!(master.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            *state.control.toggles.lock().unwrap(),
            vec![(Some("bedtime".to_string()), false), (None, true)]
        );
    }

    #[tokio::test]
    async fn should_reload_and_report_status() {
        let state = test_state();

        let response = build(state.clone())
            .oneshot(request("POST", "/api/engine/reload", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*state.control.reloads.lock().unwrap(), 1);
        let body = json_body(response).await;
        assert_eq!(body["running"], true);
        assert_eq!(body["active_rules"], 3);
    }

    #[tokio::test]
    async fn should_return_seven_days_of_stats() {
        let app = build(test_state());

        let response = app.oneshot(request("GET", "/api/stats", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["today_total"], 0);
        assert_eq!(body["last_7_days"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn should_return_500_without_details_on_storage_failure() {
        let app = build(test_state());

        let response = app
            .oneshot(request("DELETE", "/api/stats", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "internal server error");
    }

    #[tokio::test]
    async fn should_publish_injected_event() {
        let state = test_state();

        let response = build(state.clone())
            .oneshot(request(
                "POST",
                "/api/events",
                Some(serde_json::json!({"type": "battery", "level": 15, "charging": false})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            *state.events.events.lock().unwrap(),
            vec![DeviceEvent::battery(15, false)]
        );
    }

    #[tokio::test]
    async fn should_reject_battery_level_above_100() {
        let state = test_state();

        let response = build(state.clone())
            .oneshot(request(
                "POST",
                "/api/events",
                Some(serde_json::json!({"type": "battery", "level": 150, "charging": false})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_unknown_event_type() {
        let app = build(test_state());

        let response = app
            .oneshot(request(
                "POST",
                "/api/events",
                Some(serde_json::json!({"type": "earthquake"})),
            ))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
