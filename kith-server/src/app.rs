//! Router assembly.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::routes;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::vaults::router(state.clone()))
        .merge(routes::contacts::router(state.clone()))
        .merge(routes::dates::router(state.clone()))
        .merge(routes::reminders::router(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::app;
    use crate::auth::AuthUser;
    use crate::permission::VaultPermission;
    use crate::state::AppState;
    use crate::store::{Contact, Vault};

    struct Fixture {
        state: AppState,
        vault_id: Uuid,
    }

    /// One vault with a manager, an editor, a viewer, a user with no
    /// grant, and a token stuck in two-factor verification. Tokens are
    /// named after the roles.
    fn fixture() -> Fixture {
        let state = AppState::new(None);
        let vault = Vault {
            id: Uuid::new_v4(),
            name: "family".into(),
            created_at: Utc::now(),
        };
        state.store.insert_vault(vault.clone());

        for (token, permission) in [
            ("manager-token", VaultPermission::Manager),
            ("editor-token", VaultPermission::Editor),
            ("viewer-token", VaultPermission::Viewer),
        ] {
            let user_id = Uuid::new_v4();
            state.store.insert_token(
                token,
                AuthUser {
                    user_id,
                    two_factor_pending: false,
                },
            );
            state.store.upsert_grant(vault.id, user_id, permission);
        }

        state.store.insert_token(
            "stranger-token",
            AuthUser {
                user_id: Uuid::new_v4(),
                two_factor_pending: false,
            },
        );
        state.store.insert_token(
            "pending-token",
            AuthUser {
                user_id: Uuid::new_v4(),
                two_factor_pending: true,
            },
        );

        Fixture {
            state,
            vault_id: vault.id,
        }
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let response = app(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, body)
    }

    fn error_code(body: &Value) -> &str {
        body["error"]["code"].as_str().unwrap_or("")
    }

    fn add_contact(fx: &Fixture, first_name: &str) -> Contact {
        let contact = Contact {
            id: Uuid::new_v4(),
            vault_id: fx.vault_id,
            first_name: first_name.into(),
            last_name: None,
            created_at: Utc::now(),
        };
        fx.state.store.insert_contact(contact.clone());
        contact
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let fx = fixture();
        let (status, _) = send(&fx.state, request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let fx = fixture();
        let uri = format!("/vaults/{}/contacts", fx.vault_id);
        let (status, body) = send(&fx.state, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&body), "unauthenticated");

        let (status, _) =
            send(&fx.state, request("GET", &uri, Some("no-such-token"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn viewer_can_read_but_not_write() {
        let fx = fixture();
        add_contact(&fx, "Ada");
        let uri = format!("/vaults/{}/contacts", fx.vault_id);

        let (status, body) =
            send(&fx.state, request("GET", &uri, Some("viewer-token"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &fx.state,
            request(
                "POST",
                &uri,
                Some("viewer-token"),
                Some(json!({ "first_name": "Eve" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "insufficient_permissions");
    }

    #[tokio::test]
    async fn editor_can_update_a_contact() {
        let fx = fixture();
        let contact = add_contact(&fx, "Ada");
        let uri = format!("/vaults/{}/contacts/{}", fx.vault_id, contact.id);

        let (status, body) = send(
            &fx.state,
            request(
                "PUT",
                &uri,
                Some("editor-token"),
                Some(json!({ "last_name": "Lovelace" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_name"], "Ada");
        assert_eq!(body["last_name"], "Lovelace");

        let (status, _) = send(
            &fx.state,
            request(
                "PUT",
                &uri,
                Some("viewer-token"),
                Some(json!({ "first_name": "Eve" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn user_without_grant_is_rejected() {
        let fx = fixture();
        let uri = format!("/vaults/{}/contacts", fx.vault_id);
        let (status, body) =
            send(&fx.state, request("GET", &uri, Some("stranger-token"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "no_vault_access");
    }

    #[tokio::test]
    async fn two_factor_pending_token_is_blocked_before_grant_lookup() {
        let fx = fixture();
        // No grant exists for this user either; the two-factor rejection
        // must win.
        let uri = format!("/vaults/{}/contacts", fx.vault_id);
        let (status, body) =
            send(&fx.state, request("GET", &uri, Some("pending-token"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "two_factor_required");

        let (status, body) =
            send(&fx.state, request("GET", "/vaults", Some("pending-token"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "two_factor_required");
    }

    #[tokio::test]
    async fn contact_from_another_vault_is_not_found() {
        let fx = fixture();
        let contact = add_contact(&fx, "Ada");

        // A second vault the editor also has access to.
        let other = Vault {
            id: Uuid::new_v4(),
            name: "work".into(),
            created_at: Utc::now(),
        };
        fx.state.store.insert_vault(other.clone());
        let editor = fx.state.store.token_user("editor-token").unwrap();
        fx.state
            .store
            .upsert_grant(other.id, editor.user_id, VaultPermission::Editor);

        let uri = format!("/vaults/{}/contacts/{}/notes", other.id, contact.id);
        let (status, body) = send(
            &fx.state,
            request(
                "POST",
                &uri,
                Some("editor-token"),
                Some(json!({ "body": "wrong vault" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), "not_found");
    }

    #[tokio::test]
    async fn grant_changes_apply_on_the_next_request() {
        let fx = fixture();
        let uri = format!("/vaults/{}/contacts", fx.vault_id);
        let viewer = fx.state.store.token_user("viewer-token").unwrap();

        let body = json!({ "first_name": "Eve" });
        let (status, _) = send(
            &fx.state,
            request("POST", &uri, Some("viewer-token"), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        fx.state
            .store
            .upsert_grant(fx.vault_id, viewer.user_id, VaultPermission::Editor);
        let (status, _) = send(
            &fx.state,
            request("POST", &uri, Some("viewer-token"), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        fx.state.store.revoke_grant(fx.vault_id, viewer.user_id);
        let (status, body) =
            send(&fx.state, request("GET", &uri, Some("viewer-token"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "no_vault_access");
    }

    #[tokio::test]
    async fn vault_level_routes_gate_on_the_id_parameter() {
        let fx = fixture();
        let uri = format!("/vaults/{}", fx.vault_id);
        let (status, body) =
            send(&fx.state, request("GET", &uri, Some("viewer-token"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "family");

        let (status, _) =
            send(&fx.state, request("GET", &uri, Some("stranger-token"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn membership_management_needs_manager() {
        let fx = fixture();
        let target = Uuid::new_v4();
        let uri = format!("/vaults/{}/users/{}", fx.vault_id, target);
        let grant = json!({ "permission": 300 });

        let (status, body) = send(
            &fx.state,
            request("PUT", &uri, Some("editor-token"), Some(grant.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "insufficient_permissions");

        let (status, body) = send(
            &fx.state,
            request("PUT", &uri, Some("manager-token"), Some(grant)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["permission"], 300);
        assert_eq!(
            fx.state.store.grant(fx.vault_id, target),
            Some(VaultPermission::Viewer)
        );
    }

    #[tokio::test]
    async fn creating_a_vault_makes_the_caller_its_manager() {
        let fx = fixture();
        let (status, body) = send(
            &fx.state,
            request(
                "POST",
                "/vaults",
                Some("stranger-token"),
                Some(json!({ "name": "garden club" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let new_id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
        let stranger = fx.state.store.token_user("stranger-token").unwrap();
        assert_eq!(
            fx.state.store.grant(new_id, stranger.user_id),
            Some(VaultPermission::Manager)
        );
    }

    #[tokio::test]
    async fn lunar_reminder_round_trips_the_signed_month() {
        let fx = fixture();
        let contact = add_contact(&fx, "Mei");
        let uri = format!("/vaults/{}/reminders", fx.vault_id);

        let (status, created) = send(
            &fx.state,
            request(
                "POST",
                &uri,
                Some("editor-token"),
                Some(json!({
                    "title": "leap month birthday",
                    "contact_id": contact.id,
                    "type": "recurring",
                    "original_day": 15,
                    "original_month": -6,
                    "calendar_type": "lunar",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["type"], "recurring");
        assert_eq!(created["original_month"], -6);
        assert_eq!(created["original_year"], Value::Null);
        assert_eq!(created["calendar_type"], "lunar");
        assert!(created["year"].as_i64().is_some());

        let (status, listed) =
            send(&fx.state, request("GET", &uri, Some("viewer-token"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["original_month"], -6);
    }

    #[tokio::test]
    async fn one_time_reminder_without_year_is_rejected() {
        let fx = fixture();
        let uri = format!("/vaults/{}/reminders", fx.vault_id);
        let (status, body) = send(
            &fx.state,
            request(
                "POST",
                &uri,
                Some("editor-token"),
                Some(json!({
                    "title": "call back",
                    "type": "one_time",
                    "original_day": 1,
                    "original_month": 3,
                    "calendar_type": "gregorian",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "validation_error");
    }

    #[tokio::test]
    async fn important_date_reports_next_occurrence() {
        let fx = fixture();
        let contact = add_contact(&fx, "Ada");
        let uri = format!(
            "/vaults/{}/contacts/{}/dates",
            fx.vault_id, contact.id
        );

        let (status, created) = send(
            &fx.state,
            request(
                "POST",
                &uri,
                Some("editor-token"),
                Some(json!({
                    "label": "birthday",
                    "original_day": 10,
                    "original_month": 12,
                    "original_year": 1815,
                    "calendar_type": "gregorian",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let next = &created["next_occurrence"];
        assert_eq!(next["month"], 12);
        assert_eq!(next["day"], 10);
        assert!(next["year"].as_i64().unwrap() >= 2026);
    }
}
