//! Demo: a form-style flow against the in-process API.
//!
//! 1. Submitting a user with an empty name fails; the field errors show up in
//!    the binding's state.
//! 2. Fixing the name and resubmitting clears them.
//! 3. Loading the created user keeps them clear.

use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};
use validated_resource::binding::{BindingArgs, ValidatedResource};
use validated_resource::framework::{ApiResourceFactory, RequestConfig, ResourceError};
use validated_resource::lifecycle::{setup_tracing, LocalApi};
use validated_resource::server::{CollectionSpec, FieldRule, Rules, ServerConfig};

#[derive(Debug, Deserialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct UserForm {
    name: String,
    email: String,
}

type Users = ValidatedResource<ApiResourceFactory<User, serde_json::Value, UserForm>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let api = LocalApi::start(
        ServerConfig::default(),
        [CollectionSpec::new("users").rules(
            Rules::new()
                .field("name", [FieldRule::Required, FieldRule::String, FieldRule::Max(255)])
                .field("email", [FieldRule::Required, FieldRule::Email]),
        )],
    );

    let users = Users::api(
        BindingArgs::new("users", "id", api.transport())
            .with_request_config(RequestConfig::new().with_header("Accept", "application/json")),
    );

    let mut form = UserForm {
        name: String::new(),
        email: "alice@example.com".to_string(),
    };

    let span = tracing::info_span!("user_form");
    let user = async {
        match users.store(&form, None).await {
            Err(ResourceError::Validation { message, .. }) => {
                info!(%message, errors = ?users.errors(), "Form rejected");
            }
            Err(e) => return Err(e),
            Ok(user) => return Ok(user),
        }

        form.name = "Alice".to_string();
        let user = users.store(&form, None).await?;
        info!(errors = ?users.errors(), "Form accepted");
        Ok(user)
    }
    .instrument(span)
    .await;

    match user {
        Ok(user) => {
            let loaded = users.get(user.id, None).await?;
            info!(id = loaded.id, name = %loaded.name, email = %loaded.email, errors = ?users.errors(), "User loaded");
        }
        Err(e) => error!(error = %e, "Form flow failed"),
    }

    drop(users);
    api.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
