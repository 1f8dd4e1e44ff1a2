use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use validated_resource::binding::{BindingArgs, ValidatedResource};
use validated_resource::framework::mock::{channel_transport, expect_request, MockTransport};
use validated_resource::framework::{
    ApiResourceFactory, ApiResponse, FieldErrors, Method, ResourceError, SharedTransport,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Serialize)]
struct UserCreate {
    name: String,
}

type Users = ValidatedResource<ApiResourceFactory<User, Value, UserCreate>>;

fn errors(field: &str, message: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), vec![message.to_string()]);
    errors
}

/// Store fails validation, then a successful get clears the errors.
#[tokio::test]
async fn test_store_rejected_then_get_succeeds() {
    let (transport, mut requests) = channel_transport(8);
    let users = Users::api(BindingArgs::new("users", "id", transport));
    let required = errors("name", "The name field is required.");

    // 1. store({name: ""}) is rejected with field errors
    let payload = UserCreate { name: String::new() };
    let (result, _) = tokio::join!(users.store(&payload, None), async {
        let pending = expect_request(&mut requests).await.expect("Expected store request");
        assert_eq!(pending.request.method, Method::Post);
        assert_eq!(pending.request.path, "/users");
        assert_eq!(pending.request.body, Some(json!({"name": ""})));
        pending.respond(Ok(ApiResponse::validation(required.clone())));
    });

    let err = result.unwrap_err();
    assert_eq!(
        err,
        ResourceError::Validation {
            message: "The name field is required.".into(),
            errors: required.clone(),
        }
    );
    assert_eq!(users.errors(), Some(required));

    // 2. get(42) clears the errors before it resolves, and they stay clear
    let call = users.get(42, None);
    assert_eq!(users.errors(), None);

    let (result, _) = tokio::join!(call, async {
        let pending = expect_request(&mut requests).await.expect("Expected get request");
        assert_eq!(pending.request.path, "/users/42");
        pending.respond(Ok(ApiResponse::ok(json!({"data": {"id": 42, "name": "Alice"}}))));
    });
    assert_eq!(result.unwrap(), User { id: 42, name: "Alice".into() });
    assert_eq!(users.errors(), None);
}

#[tokio::test]
async fn test_every_operation_clears_errors() {
    let mock = MockTransport::new();
    mock.expect(Method::Get, "/users/1").return_ok(json!({"id": 1, "name": "A"}));
    mock.expect(Method::Get, "/users").return_ok(json!({"data": []}));
    mock.expect(Method::Put, "/users/1").return_ok(json!({"id": 1, "name": "B"}));
    mock.expect(Method::Post, "/users").return_ok(json!({"id": 2, "name": "C"}));
    mock.expect(Method::Delete, "/users/2").return_status(204, Value::Null);

    let users = Users::api(BindingArgs::new("users", "id", mock.clone()));
    let state = users.error_state();
    let stale = || state.set(errors("name", "stale"));

    stale();
    users.get(1, None).await.unwrap();
    assert_eq!(users.errors(), None);

    stale();
    users.list(None, None).await.unwrap();
    assert_eq!(users.errors(), None);

    stale();
    users.update(1, &UserCreate { name: "B".into() }, None).await.unwrap();
    assert_eq!(users.errors(), None);

    stale();
    users.store(&UserCreate { name: "C".into() }, None).await.unwrap();
    assert_eq!(users.errors(), None);

    stale();
    users.destroy(2, None).await.unwrap();
    assert_eq!(users.errors(), None);

    mock.verify();
}

#[tokio::test]
async fn test_non_validation_errors_leave_state_alone() {
    let mock = MockTransport::new();
    mock.expect(Method::Get, "/users/1").return_err(ResourceError::Transport("network down".into()));
    mock.expect(Method::Get, "/users/2").return_status(500, json!({"message": "Server Error"}));

    // Cleared on call: stays cleared.
    let users = Users::api(BindingArgs::new("users", "id", mock.clone()));
    users.error_state().set(errors("name", "old"));
    let err = users.get(1, None).await.unwrap_err();
    assert_eq!(err, ResourceError::Transport("network down".into()));
    assert_eq!(users.errors(), None);

    // Not cleared: previous value survives.
    let keep = Users::api(BindingArgs::new("users", "id", mock.clone()).clear_errors_on_call(false));
    keep.error_state().set(errors("name", "old"));
    let err = keep.get(2, None).await.unwrap_err();
    assert_eq!(err, ResourceError::Server { status: 500, message: "Server Error".into() });
    assert_eq!(keep.errors(), Some(errors("name", "old")));

    mock.verify();
}

#[tokio::test]
async fn test_no_clear_mode_replaces_errors_on_new_validation_failure() {
    let mock = MockTransport::new();
    mock.expect(Method::Post, "/users").return_validation(errors("name", "required"));
    mock.expect(Method::Put, "/users/1").return_validation(errors("email", "taken"));

    let users = Users::api(BindingArgs::new("users", "id", mock.clone()).clear_errors_on_call(false));
    assert!(users.store(&UserCreate { name: String::new() }, None).await.is_err());
    assert_eq!(users.errors(), Some(errors("name", "required")));

    assert!(users.update(1, &UserCreate { name: "x".into() }, None).await.is_err());
    assert_eq!(users.errors(), Some(errors("email", "taken")));
}

#[tokio::test]
async fn test_overlapping_calls_last_settled_wins() {
    let (transport, mut requests) = channel_transport(8);
    let users = Arc::new(Users::api(BindingArgs::new("users", "id", transport)));

    let store = tokio::spawn({
        let users = users.clone();
        async move { users.store(&UserCreate { name: String::new() }, None).await }
    });
    let update = tokio::spawn({
        let users = users.clone();
        async move { users.update(1, &UserCreate { name: String::new() }, None).await }
    });

    let a = expect_request(&mut requests).await.expect("Expected first request");
    let b = expect_request(&mut requests).await.expect("Expected second request");
    let (store_req, update_req) = if a.request.method == Method::Post { (a, b) } else { (b, a) };

    // Settle in reverse issue order: the update first, the store last.
    update_req.respond(Ok(ApiResponse::validation(errors("name", "from update"))));
    assert!(update.await.unwrap().is_err());
    assert_eq!(users.errors(), Some(errors("name", "from update")));

    store_req.respond(Ok(ApiResponse::validation(errors("name", "from store"))));
    assert!(store.await.unwrap().is_err());
    assert_eq!(users.errors(), Some(errors("name", "from store")));
}

#[tokio::test]
async fn test_subscribers_see_capture_and_reset() {
    let mock = MockTransport::new();
    mock.expect(Method::Post, "/users").return_validation(errors("name", "required"));
    let users = Users::api(BindingArgs::new("users", "id", mock.clone()));
    let mut rx = users.subscribe();

    let _ = users.store(&UserCreate { name: String::new() }, None).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), Some(errors("name", "required")));

    users.reset_errors();
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), None);

    users.reset_errors();
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn test_memoized_client_identity() {
    let transport: SharedTransport = MockTransport::new();
    let args = BindingArgs::new("users", "id", transport.clone());

    let mut users = Users::api(args.clone());
    let first = users.client().unwrap();

    users.reconfigure(args.clone());
    assert!(Arc::ptr_eq(&first, &users.client().unwrap()));

    users.reconfigure(BindingArgs::new("members", "id", transport.clone()));
    assert!(!Arc::ptr_eq(&first, &users.client().unwrap()));

    // Same values, different transport instance: rebuilt.
    users.reconfigure(args.clone());
    let again = users.client().unwrap();
    users.reconfigure(BindingArgs::new("users", "id", MockTransport::new()));
    assert!(!Arc::ptr_eq(&again, &users.client().unwrap()));
}

#[tokio::test]
async fn test_loose_validation_body_still_fills_errors() {
    let mock = MockTransport::new();
    mock.expect(Method::Post, "/users").return_status(
        422,
        json!({"message": "Name is bad.", "errors": {"name": "required"}}),
    );
    let users = Users::api(BindingArgs::new("users", "id", mock.clone()));

    let err = users.store(&UserCreate { name: String::new() }, None).await.unwrap_err();
    assert_eq!(
        err,
        ResourceError::Validation {
            message: "Name is bad.".into(),
            errors: errors("name", "required"),
        }
    );
    assert_eq!(users.errors(), Some(errors("name", "required")));
    mock.verify();
}

#[tokio::test]
async fn test_ids_cannot_escape_their_path_segment() {
    let mock = MockTransport::new();
    mock.expect(Method::Delete, "/users/1%2F..%2F2").return_status(204, Value::Null);
    mock.expect(Method::Get, "/users/a%2Fb%3Fx").return_ok(json!({"id": 7, "name": "A"}));
    let users = Users::api(BindingArgs::new("users", "id", mock.clone()));

    users.destroy("1/../2", None).await.unwrap();
    users.get("a/b?x", None).await.unwrap();

    let paths: Vec<String> = mock.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/users/1%2F..%2F2", "/users/a%2Fb%3Fx"]);
    mock.verify();
}

#[tokio::test]
async fn test_dot_id_is_rejected_before_sending() {
    let mock = MockTransport::new();
    let users = Users::api(BindingArgs::new("users", "id", mock.clone()));
    users.error_state().set(errors("name", "old"));

    let err = users.destroy("..", None).await.unwrap_err();
    assert!(matches!(err, ResourceError::Config(_)));
    assert!(mock.requests().is_empty());
    // Routing fails inside the call, after the clear.
    assert_eq!(users.errors(), None);
}

#[test]
fn test_reconfigure_replaces_args() {
    let transport: SharedTransport = MockTransport::new();
    let mut users = Users::api(BindingArgs::new("users", "id", transport.clone()));
    assert_eq!(users.args().resource_key, "users");
    assert!(users.args().clear_errors_on_call);

    users.reconfigure(BindingArgs::new("members", "member", transport).clear_errors_on_call(false));
    assert_eq!(users.args().resource_key, "members");
    assert_eq!(users.args().resource_route_param, "member");
    assert!(!users.args().clear_errors_on_call);
}
