use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::client::ClientRegistry;
use crate::config::ServerConfig;
use crate::error::handlers::{error_to_reply_code, handle_error};
use crate::ingest::IngestionService;
use crate::protocol::responses::{self, format_response};
use crate::protocol::{
    CommandData, CommandStatus, LineRead, discard_line, handle_command, parse_command,
    read_line_limited,
};

/// Handles one client session.
///
/// - Uses BufReader to read command lines of at most `max_command_length`
///   bytes; longer lines are answered with 500 and skipped.
/// - Dispatches commands using `handle_command`.
/// - Removes the client from `clients` when the session ends.
pub async fn handle_client(
    stream: TcpStream,
    clients: Arc<Mutex<ClientRegistry>>,
    client_addr: SocketAddr,
    service: Arc<IngestionService>,
    config: Arc<ServerConfig>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        match read_line_limited(&mut reader, config.max_command_length).await {
            Ok(LineRead::Eof) => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(LineRead::TooLong { terminated }) => {
                let reply = format_response(responses::UNKNOWN_COMMAND, "Command too long");
                let _ = write_half.write_all(reply.as_bytes()).await;
                if !terminated {
                    if let Err(e) = discard_line(&mut reader).await {
                        error!("Failed to read from {}: {}", client_addr, e);
                        break;
                    }
                }
            }
            Ok(LineRead::Line(line)) => {
                let command = parse_command(&line);
                info!("Received from {}: {:?}", client_addr, &command);

                let result = match handle_command(&command, &mut reader, &service, &config).await
                {
                    Ok(result) => result,
                    Err(e) => {
                        handle_error(&e);
                        let reply =
                            format_response(error_to_reply_code(&e), "Transfer aborted");
                        let _ = write_half.write_all(reply.as_bytes()).await;
                        break;
                    }
                };

                if let Some(CommandData::BatchStored(stored)) = result.data {
                    if let Some(client) = clients.lock().await.get_mut(&client_addr) {
                        client.record_batch(stored);
                    }
                }

                if let Some(msg) = &result.message {
                    if write_half.write_all(msg.as_bytes()).await.is_err() {
                        error!("Failed to send reply to {}", client_addr);
                        break;
                    }
                }

                match result.status {
                    CommandStatus::CloseConnection => {
                        info!("Closing session with {}", client_addr);
                        break;
                    }
                    CommandStatus::Success => {}
                    CommandStatus::Failure(reason) => {
                        info!("Command from {} failed: {}", client_addr, reason);
                    }
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let _ = write_half.shutdown().await;

    if let Some(client) = clients.lock().await.remove(&client_addr) {
        info!(
            "Client {} disconnected after {}s ({} batch(es), {} file(s) stored)",
            client_addr,
            client.connected_secs(),
            client.batches(),
            client.files_stored()
        );
    }
}
