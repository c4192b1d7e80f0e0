use std::future::Future;
use std::io::ErrorKind;

use crate::prelude::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::{shutdown_signal, Context, JsonRpcResponse};

pub async fn run_stdio(ctx: Context) -> Result<()> {
    log::info!("Starting MCP server with stdio transport");

    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    serve(reader, writer, &ctx, shutdown_signal()).await
}

/// Answer newline-delimited requests from `reader` until EOF or `shutdown`
///
/// A line that is not valid UTF-8 gets a parse error and the loop goes on.
/// Only EOF, shutdown or a broken stream end it.
pub(crate) async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &Context,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tokio::pin!(shutdown);
    let mut line = String::new();

    loop {
        line.clear();

        let read = tokio::select! {
            read = reader.read_line(&mut line) => read,
            _ = &mut shutdown => {
                log::info!("Shutdown signal received, closing stdio transport");
                break;
            }
        };

        let response = match read {
            Ok(0) => {
                log::info!("stdin closed, stopping");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if ctx.verbose {
                    log::debug!("Received: {trimmed}");
                }

                match super::handle_request(trimmed, ctx).await {
                    Some(response) => response,
                    None => continue,
                }
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                log::warn!("Discarding line that is not valid UTF-8: {e}");
                JsonRpcResponse::parse_error(format!("Parse error: {e}"))
            }
            Err(e) => return Err(eyre!("Failed to read from stdin: {e}")),
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize response: {e}");
                continue;
            }
        };

        if ctx.verbose {
            log::debug!("Sending: {response_json}");
        }

        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tests::test_context;
    use crate::mcp::PARSE_ERROR;
    use serde_json::Value;

    async fn run(input: &[u8]) -> Vec<Value> {
        let ctx = test_context();
        let mut output = Vec::new();

        serve(input, &mut output, &ctx, std::future::pending())
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_serving() {
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#);
        input.push(b'\n');

        let responses = run(&input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1]["id"], 7);
        assert_eq!(responses[1]["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_blank_lines_and_notifications_are_silent() {
        let input = concat!(
            "\n",
            "   \n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
            "\n",
        );

        let responses = run(input.as_bytes()).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["result"]["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_loop() {
        let ctx = test_context();
        let (_client, server) = tokio::io::duplex(64);
        let (read_half, _write_half) = tokio::io::split(server);
        let mut output = Vec::new();

        serve(BufReader::new(read_half), &mut output, &ctx, async {})
            .await
            .unwrap();

        assert!(output.is_empty());
    }
}
