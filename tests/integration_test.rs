use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use validated_resource::binding::{BindingArgs, ValidatedResource};
use validated_resource::framework::{
    ApiResourceFactory, Query, RequestConfig, ResourceError, RouteParams,
};
use validated_resource::lifecycle::LocalApi;
use validated_resource::server::{CollectionSpec, FieldRule, Rules, ServerConfig};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[derive(Debug, Default, Serialize)]
struct UserForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    data: Vec<User>,
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct Meta {
    total: usize,
    last_page: usize,
}

type Users = ValidatedResource<ApiResourceFactory<User, Page, UserForm>>;

fn user_collection() -> CollectionSpec {
    CollectionSpec::new("users").rules(
        Rules::new()
            .field("name", [FieldRule::Required, FieldRule::String, FieldRule::Max(20)])
            .field("email", [FieldRule::Required, FieldRule::Email]),
    )
}

fn form(name: &str, email: &str) -> UserForm {
    UserForm {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    }
}

/// Full end-to-end flow with the in-process server.
#[tokio::test]
async fn test_full_crud_flow_against_local_api() {
    let api = LocalApi::start(ServerConfig::default(), [user_collection()]);
    let users = Users::api(BindingArgs::new("users", "id", api.transport()));

    // Rejected create: both fields reported
    let err = users.store(&form("", "not-an-email"), None).await.unwrap_err();
    assert!(err.is_validation());
    let errors = users.errors().expect("errors captured");
    assert_eq!(errors["name"], vec!["The name field is required.".to_string()]);
    assert_eq!(
        errors["email"],
        vec!["The email field must be a valid email address.".to_string()]
    );

    // Accepted create clears them
    let alice = users.store(&form("Alice", "alice@example.com"), None).await.unwrap();
    assert_eq!(alice.name, "Alice");
    assert_eq!(users.errors(), None);

    // Partial update with an invalid field
    let bad = UserForm { email: Some("nope".into()), ..UserForm::default() };
    assert!(users.update(alice.id, &bad, None).await.is_err());
    assert_eq!(
        users.errors().unwrap().keys().collect::<Vec<_>>(),
        vec!["email"]
    );

    // Valid partial update
    let rename = UserForm { name: Some("Alicia".into()), ..UserForm::default() };
    let renamed = users.update(alice.id, &rename, None).await.unwrap();
    assert_eq!(renamed, User { id: alice.id, name: "Alicia".into(), email: "alice@example.com".into() });
    assert_eq!(users.errors(), None);

    // Listing
    users.store(&form("Bob", "bob@example.com"), None).await.unwrap();
    let page = users.list(None, None).await.unwrap();
    assert_eq!(page.meta.total, 2);

    // Destroy, then not-found passes through
    users.destroy(alice.id, None).await.unwrap();
    let err = users.get(alice.id, None).await.unwrap_err();
    assert!(matches!(err, ResourceError::NotFound(_)));
    assert_eq!(users.errors(), None);

    drop(users);
    api.shutdown().await.expect("Failed to shutdown local API");
}

#[tokio::test]
async fn test_list_params_and_request_config() {
    let api = LocalApi::start(
        ServerConfig { default_per_page: 2, ..ServerConfig::default() },
        [user_collection().seed([
            json!({"name": "Ann", "email": "ann@example.com"}),
            json!({"name": "Ben", "email": "ben@example.com"}),
            json!({"name": "Cat", "email": "cat@example.com"}),
        ])],
    );
    let users = Users::api(
        BindingArgs::new("users", "id", api.transport())
            .with_request_config(RequestConfig::new().with_query("page", 2)),
    );

    let page = users.list(None, None).await.unwrap();
    assert_eq!(page.meta.last_page, 2);
    assert_eq!(page.data.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(), vec!["Cat"]);

    let mut params = Query::new();
    params.insert("page".into(), json!(1));
    params.insert("name".into(), json!("Ben"));
    let filtered = users.list(Some(&params), None).await.unwrap();
    assert_eq!(filtered.meta.total, 1);
    assert_eq!(filtered.data[0].email, "ben@example.com");

    drop(users);
    api.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_nested_resource_routes() {
    let api = LocalApi::start(ServerConfig::default(), [CollectionSpec::new("teams/7/members")]);
    let mut params = RouteParams::new();
    params.insert("team".into(), json!(7));
    let members = ValidatedResource::<ApiResourceFactory<Value>>::api(
        BindingArgs::new("teams/{team}/members", "member", api.transport()).with_route_params(params),
    );

    let created = members.store(&json!({"name": "Eve"}), None).await.unwrap();
    assert_eq!(created["id"], json!(1));
    let fetched = members.get(1, None).await.unwrap();
    assert_eq!(fetched["name"], json!("Eve"));

    drop(members);
    api.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_calls_on_one_binding() {
    let api = LocalApi::start(ServerConfig::default(), [user_collection()]);
    let users = Arc::new(Users::api(BindingArgs::new("users", "id", api.transport())));

    let mut tasks = JoinSet::new();
    for i in 0..10 {
        let users = users.clone();
        tasks.spawn(async move {
            users
                .store(&form(&format!("user{i}"), &format!("u{i}@example.com")), None)
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.expect("task panicked").is_ok());
    }

    assert_eq!(users.list(None, None).await.unwrap().meta.total, 10);
    assert_eq!(users.errors(), None);

    drop(users);
    api.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_timeout_from_request_config() {
    let (server, transport) = validated_resource::server::ApiServer::new(ServerConfig::default());
    let users = Users::api(BindingArgs::new("users", "id", Arc::new(transport)));

    // The server is never run, so the request stalls until the timeout.
    let cfg = RequestConfig::new().with_timeout(Duration::from_millis(20));
    let err = users.get(1, Some(&cfg)).await.unwrap_err();
    assert!(matches!(err, ResourceError::Transport(_)));
    assert_eq!(users.errors(), None);
    drop(server);
}
