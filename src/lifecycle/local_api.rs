use crate::framework::SharedTransport;
use crate::server::{ApiServer, CollectionSpec, ServerConfig};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

/// Runs an in-process [`ApiServer`] and hands out its transport.
///
/// `LocalApi` is responsible for:
/// - **Lifecycle Management**: Starting the server task and waiting for it on shutdown
/// - **Wiring**: Registering collections before the first request arrives
///
/// # Example
///
/// ```ignore
/// let api = LocalApi::start(ServerConfig::default(), [CollectionSpec::new("users")]);
/// let users = ValidatedResource::<ApiResourceFactory<User>>::api(
///     BindingArgs::new("users", "id", api.transport()),
/// );
/// // ...
/// drop(users);
/// api.shutdown().await?;
/// ```
pub struct LocalApi {
    transport: SharedTransport,
    handle: JoinHandle<()>,
}

impl LocalApi {
    /// Registers `collections` and spawns the server on the current Tokio runtime.
    pub fn start(config: ServerConfig, collections: impl IntoIterator<Item = CollectionSpec>) -> Self {
        let (mut server, transport) = ApiServer::new(config);
        for spec in collections {
            server.register(spec);
        }
        let handle = tokio::spawn(server.run());

        Self {
            transport: Arc::new(transport),
            handle,
        }
    }

    /// The transport for clients and bindings. Every call returns the same `Arc`,
    /// so bindings built from it share one memoized client.
    pub fn transport(&self) -> SharedTransport {
        Arc::clone(&self.transport)
    }

    /// Gracefully shuts down the server.
    ///
    /// The server stops once every transport clone is gone, so drop bindings
    /// and clients first.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down local API...");
        drop(self.transport);

        if let Err(e) = self.handle.await {
            error!(error = %e, "API server task failed");
            return Err(e);
        }

        info!("Local API shutdown complete.");
        Ok(())
    }
}
