use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{Client, ClientRegistry, handle_client};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::ingest::IngestionService;
use crate::protocol::responses::{self, format_response};
use crate::storage::StorageRoot;

pub struct Server {
    client_registry: Arc<Mutex<ClientRegistry>>,
    service: Arc<IngestionService>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener and prepares the storage root.
    ///
    /// A storage root that cannot be created yet is only logged; each
    /// request retries the creation.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let root = StorageRoot::new(config.storage_root_path())?;

        match root.ensure_exists().await {
            Ok(()) => info!("Storage root directory: {}", root.root_path().display()),
            Err(e) => warn!("Storage root not ready at startup: {}", e),
        }

        let socket = config.listen_socket();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new(config.max_clients))),
            service: Arc::new(IngestionService::new(root)),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn start(&self) {
        info!(
            "Starting upload server on {} (max {} clients)",
            self.config.listen_socket(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let service = Arc::clone(&self.service);
                    let config = Arc::clone(&self.config);

                    // One task per client so the accept loop never blocks
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, client_registry, service, config).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Greets a new client, registers it, and hands off to the session handler.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: Arc<Mutex<ClientRegistry>>,
    service: Arc<IngestionService>,
    config: Arc<ServerConfig>,
) -> Result<(), ServerError> {
    {
        let mut clients = client_registry.lock().await;

        if !clients.try_insert(Client::new(client_addr)) {
            warn!(
                "Rejected client {}: {}/{} clients connected",
                client_addr,
                clients.len(),
                clients.max_clients()
            );
            drop(clients);

            let reply = format_response(
                responses::SERVICE_UNAVAILABLE,
                "Too many connections. Try again later.",
            );
            stream.write_all(reply.as_bytes()).await?;
            return Ok(());
        }

        info!(
            "Accepted client: {} ({}/{} clients)",
            client_addr,
            clients.len(),
            clients.max_clients()
        );
    }

    let greeting = format_response(responses::READY, "Upload server ready");
    if let Err(e) = stream.write_all(greeting.as_bytes()).await {
        client_registry.lock().await.remove(&client_addr);
        return Err(e.into());
    }

    handle_client(stream, client_registry, client_addr, service, config).await;

    Ok(())
}
