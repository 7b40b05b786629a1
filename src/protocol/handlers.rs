//! Command handlers for the upload server.
//!
//! Each handler turns a parsed command into a `CommandResult` whose message
//! holds the complete reply text. `UPLD` also reads its framed items from the
//! client before handing the decoded batch to the ingestion service.

use log::{error, info, warn};
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::ingest::{IngestionResult, IngestionService, UploadItem};
use crate::protocol::commands::parse_item_header;
use crate::protocol::reader::{LineRead, read_line_limited};
use crate::protocol::responses::{self, format_response};
use crate::protocol::{Command, CommandData, CommandResult, CommandStatus};

/// Dispatches a received command to its handler.
///
/// # Arguments
///
/// * `command` - The parsed command.
/// * `reader` - The client's input, positioned just after the command line.
/// * `service` - Ingestion service backing `LIST` and `UPLD`.
/// * `config` - Server limits.
///
/// # Returns
///
/// * `Ok(CommandResult)` - Reply to send and whether to keep the session.
/// * `Err(ServerError)` - The client stream failed while reading items.
pub async fn handle_command<R>(
    command: &Command,
    reader: &mut R,
    service: &IngestionService,
    config: &ServerConfig,
) -> Result<CommandResult, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    match command {
        Command::QUIT => Ok(handle_cmd_quit()),
        Command::NOOP => Ok(handle_cmd_noop()),
        Command::LIST => Ok(handle_cmd_list(service).await),
        Command::UPLD(count) => handle_cmd_upld(reader, count, service, config).await,
        Command::UNKNOWN => Ok(handle_cmd_unknown()),
    }
}

fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(responses::GOODBYE, "Goodbye")),
        data: None,
    }
}

fn handle_cmd_noop() -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(responses::OK, "OK")),
        data: None,
    }
}

fn handle_cmd_unknown() -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure("Unknown command".into()),
        message: Some(format_response(responses::UNKNOWN_COMMAND, "Unknown command")),
        data: None,
    }
}

/// Handles LIST: replies with the count, one stored name per line, then a
/// completion line.
async fn handle_cmd_list(service: &IngestionService) -> CommandResult {
    match service.stored_files().await {
        Ok(names) => {
            let mut reply =
                format_response(responses::OPENING, &format!("{} file(s)", names.len()));
            for name in &names {
                reply.push_str(name);
                reply.push_str("\r\n");
            }
            reply.push_str(&format_response(responses::ACTION_COMPLETE, "Listing complete"));

            CommandResult {
                status: CommandStatus::Success,
                message: Some(reply),
                data: None,
            }
        }
        Err(e) => {
            error!("Failed to list stored files: {}", e);
            CommandResult {
                status: CommandStatus::Failure("Listing failed".into()),
                message: Some(format_response(
                    responses::ACTION_ABORTED,
                    "Unable to list stored files.",
                )),
                data: None,
            }
        }
    }
}

/// Handles UPLD: decodes `count` framed items, ingests them as one batch and
/// reports every stored name followed by the batch summary.
async fn handle_cmd_upld<R>(
    reader: &mut R,
    raw_count: &str,
    service: &IngestionService,
    config: &ServerConfig,
) -> Result<CommandResult, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let count = match raw_count.parse::<usize>() {
        Ok(count) if count <= config.max_batch_files => count,
        _ => {
            warn!("Rejected UPLD with item count {:?}", raw_count);
            return Ok(framing_failure(&format!(
                "Item count must be between 0 and {}",
                config.max_batch_files
            )));
        }
    };

    let items = match read_items(reader, count, config).await {
        Ok(items) => items,
        Err(ServerError::ProtocolError(reason)) => {
            warn!("Malformed upload batch: {}", reason);
            return Ok(framing_failure(&reason));
        }
        Err(e) => return Err(e),
    };

    info!("Decoded upload batch of {} item(s)", items.len());

    let result = service.ingest(items).await;
    Ok(upload_reply(count, result))
}

/// Reads `count` item headers, each followed by exactly `size` bytes.
///
/// Content is spooled to anonymous temporary files, so memory use does not
/// depend on the declared sizes.
async fn read_items<R>(
    reader: &mut R,
    count: usize,
    config: &ServerConfig,
) -> Result<Vec<UploadItem>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let max_size = config.max_upload_size_bytes();
    let mut items = Vec::with_capacity(count);

    for _ in 0..count {
        let line = match read_line_limited(reader, config.max_command_length).await? {
            LineRead::Line(line) => line,
            LineRead::TooLong { .. } => {
                return Err(ServerError::ProtocolError("Item header too long".into()));
            }
            LineRead::Eof => {
                return Err(ServerError::ProtocolError(
                    "Connection closed before all items were sent".into(),
                ));
            }
        };

        let header = parse_item_header(&line).ok_or_else(|| {
            ServerError::ProtocolError("Item header must be '<size> <name>'".into())
        })?;

        if header.size > max_size {
            return Err(ServerError::ProtocolError(format!(
                "Item exceeds {} MB",
                config.max_upload_size_mb
            )));
        }

        let item = if header.size == 0 {
            UploadItem::from_bytes(header.name, Vec::new())
        } else {
            let spool = spool_content(reader, header.size).await?;
            UploadItem::new(header.name, header.size, spool)
        };
        items.push(item);
    }

    Ok(items)
}

/// Copies exactly `size` bytes from the client into a temporary file and
/// rewinds it for reading.
async fn spool_content<R>(reader: &mut R, size: u64) -> Result<File, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let spool = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(io::Error::other)??;
    let mut spool = File::from_std(spool);

    let copied = io::copy(&mut (&mut *reader).take(size), &mut spool).await?;
    if copied != size {
        return Err(ServerError::IoError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("item ended after {} of {} bytes", copied, size),
        )));
    }

    spool.flush().await?;
    spool.seek(SeekFrom::Start(0)).await?;
    Ok(spool)
}

fn upload_reply(count: usize, result: IngestionResult) -> CommandResult {
    if count == 0 {
        return CommandResult {
            status: CommandStatus::Failure("No files".into()),
            message: Some(format_response(responses::SYNTAX_ERROR, &result.message)),
            data: None,
        };
    }

    let stored = result.stored_names.len();
    let mut reply = String::new();
    for name in &result.stored_names {
        reply.push_str(&format_response(responses::FILE_STORED, name));
    }

    if result.success {
        reply.push_str(&format_response(responses::ACTION_COMPLETE, &result.message));
        CommandResult {
            status: CommandStatus::Success,
            message: Some(reply),
            data: Some(CommandData::BatchStored(stored)),
        }
    } else {
        reply.push_str(&format_response(responses::ACTION_ABORTED, &result.message));
        CommandResult {
            status: CommandStatus::Failure("Upload failed".into()),
            message: Some(reply),
            data: Some(CommandData::BatchStored(stored)),
        }
    }
}

/// Framing is lost once a batch is malformed, so the session is closed.
fn framing_failure(reason: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(responses::SYNTAX_ERROR, reason)),
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::handlers::error_to_reply_code;
    use crate::storage::StorageRoot;
    use tokio::io::BufReader;

    fn config_for(root: &std::path::Path) -> ServerConfig {
        ServerConfig {
            bind_address: "127.0.0.1".into(),
            port: 2121,
            storage_root: root.to_string_lossy().to_string(),
            max_clients: 4,
            max_command_length: 512,
            max_batch_files: 3,
            max_upload_size_mb: 1,
        }
    }

    fn service_for(config: &ServerConfig) -> IngestionService {
        IngestionService::new(StorageRoot::new(config.storage_root_path()).unwrap())
    }

    #[tokio::test]
    async fn upld_stores_framed_items() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let mut reader = BufReader::new(&b"5 a.txt\r\nhello0 empty.txt\r\n"[..]);

        let result = handle_command(&Command::UPLD("2".into()), &mut reader, &service, &config)
            .await
            .unwrap();

        assert_eq!(result.status, CommandStatus::Success);
        assert_eq!(result.data, Some(CommandData::BatchStored(1)));
        assert_eq!(
            result.message.unwrap(),
            "250 a.txt\r\n226 Successfully uploaded 1 file(s).\r\n"
        );
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn upld_with_zero_items_reports_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("never"));
        let service = service_for(&config);
        let mut reader = BufReader::new(&b""[..]);

        let result = handle_command(&Command::UPLD("0".into()), &mut reader, &service, &config)
            .await
            .unwrap();

        assert!(matches!(result.status, CommandStatus::Failure(_)));
        assert!(result.message.unwrap().starts_with("501 Please select"));
        assert!(!dir.path().join("never").exists());
    }

    #[tokio::test]
    async fn oversized_batch_closes_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let mut reader = BufReader::new(&b""[..]);

        let result = handle_command(&Command::UPLD("4".into()), &mut reader, &service, &config)
            .await
            .unwrap();

        assert_eq!(result.status, CommandStatus::CloseConnection);
        assert!(result.message.unwrap().starts_with("501 "));
    }

    #[tokio::test]
    async fn oversized_item_is_rejected_before_reading_content() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let mut reader = BufReader::new(&b"99999999 big.bin\r\n"[..]);

        let result = handle_command(&Command::UPLD("1".into()), &mut reader, &service, &config)
            .await
            .unwrap();

        assert_eq!(result.status, CommandStatus::CloseConnection);
        assert!(!dir.path().join("big.bin").exists());
    }

    #[tokio::test]
    async fn failed_batch_lists_partial_progress() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let mut reader = BufReader::new(&b"1 a.txt\r\nA1 ../\r\nB1 c.txt\r\nC"[..]);

        let result = handle_command(&Command::UPLD("3".into()), &mut reader, &service, &config)
            .await
            .unwrap();

        assert!(matches!(result.status, CommandStatus::Failure(_)));
        assert_eq!(
            result.message.unwrap(),
            "250 a.txt\r\n451 An error occurred while uploading files.\r\n"
        );
        assert!(!dir.path().join("c.txt").exists());
    }

    #[tokio::test]
    async fn long_item_header_is_rejected_without_buffering_it() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let flood = vec![b'7'; 64 * 1024];
        let mut reader = BufReader::new(&flood[..]);

        let result = handle_command(&Command::UPLD("1".into()), &mut reader, &service, &config)
            .await
            .unwrap();

        assert_eq!(result.status, CommandStatus::CloseConnection);
        assert_eq!(result.message.unwrap(), "501 Item header too long\r\n");

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest.len(), flood.len() - config.max_command_length - 2);
    }

    #[tokio::test]
    async fn truncated_item_is_a_stream_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let mut reader = BufReader::new(&b"5 a.txt\r\nab"[..]);

        let err = handle_command(&Command::UPLD("1".into()), &mut reader, &service, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::IoError(_)));
        assert_eq!(error_to_reply_code(&err), 421);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn large_declared_size_with_little_content_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let mut reader = BufReader::new(&b"1048576 x\r\nZ"[..]);

        let err = handle_command(&Command::UPLD("1".into()), &mut reader, &service, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::IoError(_)));
        assert!(!dir.path().join("x").exists());
    }

    #[tokio::test]
    async fn spooled_items_keep_the_stream_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let first = vec![1u8; 20_000];
        let mut input = b"20000 first.bin\r\n".to_vec();
        input.extend_from_slice(&first);
        input.extend_from_slice(b"3 second.txt\r\nabcNOOP\r\n");
        let mut reader = BufReader::new(&input[..]);

        let result = handle_command(&Command::UPLD("2".into()), &mut reader, &service, &config)
            .await
            .unwrap();

        assert_eq!(result.status, CommandStatus::Success);
        assert_eq!(std::fs::read(dir.path().join("first.bin")).unwrap(), first);
        assert_eq!(std::fs::read(dir.path().join("second.txt")).unwrap(), b"abc");

        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "NOOP\r\n");
    }

    #[tokio::test]
    async fn list_reports_count_then_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("only.txt"), b"x").unwrap();
        let config = config_for(dir.path());
        let service = service_for(&config);
        let mut reader = BufReader::new(&b""[..]);

        let result = handle_command(&Command::LIST, &mut reader, &service, &config)
            .await
            .unwrap();

        assert_eq!(
            result.message.unwrap(),
            "150 1 file(s)\r\nonly.txt\r\n226 Listing complete\r\n"
        );
    }
}
