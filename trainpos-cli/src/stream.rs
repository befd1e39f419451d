//! Line-oriented message stream on stdin/stdout.
//!
//! Each line carries one message as `<subject> <json>`:
//!
//! ```text
//! site.register {"id":"depot","zero":{"lat":49.44,"lng":11.08},"area":[]}
//! train.tracelet {"x":280,"y":124,"site-id":"depot","train-id":"ice-1"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use trainpos::transport::{InboundMessage, OutboundMessage};

/// Parse one input line.
///
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<InboundMessage>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    match line.split_once(char::is_whitespace) {
        Some((subject, payload)) if !payload.trim().is_empty() => Ok(Some(InboundMessage::new(
            subject,
            payload.trim().to_string(),
        ))),
        _ => Err(format!("expected '<subject> <json>', got '{}'", line)),
    }
}

/// Format an outbound message as one output line.
pub fn format_line(msg: &OutboundMessage) -> String {
    format!("{} {}\n", msg.subject, msg.payload_str())
}

/// Forward parsed lines from `input` to the service.
///
/// At end of input the stream stays open for `linger` so pending positions
/// get their idle flush, then `tx` is dropped. Returns the number of
/// messages forwarded.
pub async fn read_inbound<R>(
    input: R,
    tx: mpsc::Sender<InboundMessage>,
    linger: Duration,
    shutdown: CancellationToken,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut forwarded = 0;
    let mut line_number = 0u64;

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(forwarded),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        line_number += 1;

        match parse_line(&line) {
            Ok(Some(msg)) => {
                if tx.send(msg).await.is_err() {
                    return Ok(forwarded);
                }
                forwarded += 1;
            }
            Ok(None) => {}
            Err(e) => warn!(line = line_number, error = %e, "Skipping malformed input line"),
        }
    }

    debug!(forwarded, "End of input");
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(linger) => {}
    }
    Ok(forwarded)
}

/// Write outbound messages to `output` until the publisher side closes.
///
/// Returns the number of lines written.
pub async fn write_outbound<W>(
    output: &mut W,
    mut rx: mpsc::UnboundedReceiver<OutboundMessage>,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(msg) = rx.recv().await {
        output.write_all(format_line(&msg).as_bytes()).await?;
        output.flush().await?;
        written += 1;
    }
    Ok(written)
}
