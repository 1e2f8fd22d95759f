// Stdio transport: newline-delimited JSON-RPC over a byte stream

use kube_mcp::protocol::{JsonRpcError, JsonRpcResponse};
use kube_mcp::McpServer;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Serve on the process's stdin/stdout.
pub async fn serve_stdio(server: Arc<McpServer>, shutdown: CancellationToken) -> io::Result<()> {
    serve(
        server,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        shutdown,
    )
    .await
}

/// Read one message per line, write one response per line.
///
/// A line that is not UTF-8 is answered with a parse error like any other
/// malformed message. Returns `Ok` when the input reaches EOF or `shutdown`
/// fires; only I/O failures end it with an error.
pub async fn serve<R, W>(
    server: Arc<McpServer>,
    mut reader: R,
    mut writer: W,
    shutdown: CancellationToken,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("Stdio transport cancelled");
                return Ok(());
            }
            read = reader.read_until(b'\n', &mut buf) => read?,
        };

        if read == 0 {
            tracing::info!("Input closed, stopping stdio transport");
            return Ok(());
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => server.handle_message(line.trim()).await,
            Err(e) => {
                tracing::debug!(error = %e, "Message is not valid UTF-8");
                parse_error_response()
            }
        };

        if let Some(response) = response {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
}

fn parse_error_response() -> Option<String> {
    let response = JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error());
    serde_json::to_string(&response).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::test_server;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_request_response_until_eof() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let (mut output_reader, output_writer) = duplex(64 * 1024);

        serve(
            test_server(),
            input.as_bytes(),
            output_writer,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut output = String::new();
        output_reader.read_to_string(&mut output).await.unwrap();
        let responses: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["tools"][0]["name"], "list_pods");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_gets_parse_error() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');
        let (mut output_reader, output_writer) = duplex(64 * 1024);

        serve(
            test_server(),
            input.as_slice(),
            output_writer,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut output = String::new();
        output_reader.read_to_string(&mut output).await.unwrap();
        let responses: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], serde_json::Value::Null);
        assert_eq!(responses[0]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let input = r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#;
        let (mut output_reader, output_writer) = duplex(1024);

        serve(test_server(), input.as_bytes(), output_writer, CancellationToken::new())
            .await
            .unwrap();

        let mut output = String::new();
        output_reader.read_to_string(&mut output).await.unwrap();
        assert!(output.contains(r#""id":9"#));
    }

    #[tokio::test]
    async fn test_cancellation_stops_reading() {
        let (_input_writer, input_reader) = duplex(1024);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        serve(
            test_server(),
            BufReader::new(input_reader),
            tokio::io::sink(),
            shutdown,
        )
        .await
        .unwrap();
    }
}
