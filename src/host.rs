// Host loop: Chrome native-messaging framing over stdin/stdout. Each frame
// is a 4-byte little-endian length followed by that many bytes of JSON.
// Requests arrive as Envelopes; replies and engine events go back out as
// frames on the same stream. Logging goes to stderr so stdout stays clean.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::coordinator::Coordinator;
use crate::protocol::{EngineEvent, Envelope, Response};

/// Chrome rejects native-messaging frames above 1 MB in the host-to-browser
/// direction; inbound frames past this are a protocol violation anyway.
pub const MAX_FRAME_LEN: u32 = 1024 * 1024;

/// Read one frame. Ok(None) means the peer closed the stream cleanly.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("Failed to read frame length"),
    }
    let len = u32::from_le_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        bail!("Frame of {len} bytes exceeds the {MAX_FRAME_LEN} byte limit");
    }
    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .context("Failed to read frame payload")?;
    Ok(Some(payload))
}

/// Write one length-prefixed frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).context("Frame too large to encode")?;
    if len > MAX_FRAME_LEN {
        bail!("Frame of {len} bytes exceeds the {MAX_FRAME_LEN} byte limit");
    }
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

async fn write_json<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(value).context("Failed to encode frame")?;
    write_frame(writer, &payload).await
}

/// Serve the coordinator over a frame stream until the peer disconnects.
/// Replies keep request order; engine events interleave between them.
pub async fn serve<R, W>(
    coordinator: Arc<Coordinator>,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    mut reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Host loop started");
    loop {
        tokio::select! {
            frame = read_frame(&mut reader) => {
                let Some(payload) = frame? else {
                    info!("Peer closed the stream, shutting down");
                    return Ok(());
                };
                let reply = match serde_json::from_slice::<Envelope>(&payload) {
                    Ok(envelope) => {
                        debug!(tab = %envelope.tab_id, "Request received");
                        coordinator.handle(envelope).await
                    }
                    Err(e) => {
                        warn!(error = %e, "Unparseable request frame");
                        Response::error(format!("Invalid request: {e}"))
                    }
                };
                write_json(&mut writer, &reply).await?;
            }
            event = events.recv() => {
                // the coordinator holds the sender, so this stays open for
                // the life of the loop
                let Some(event) = event else {
                    return Ok(());
                };
                write_json(&mut writer, &event).await?;
                if let Some(badge) = Coordinator::companion(&event) {
                    write_json(&mut writer, &badge).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_round_trip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, br#"{"action":"analyze"}"#).await.unwrap();
        assert_eq!(&buf[..4], &20u32.to_le_bytes());

        let mut cursor = std::io::Cursor::new(buf);
        let payload = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(payload, br#"{"action":"analyze"}"#);
        // clean EOF after the single frame
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_le_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        assert!(read_frame(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn truncated_payload_is_an_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(b"short");
        let mut cursor = std::io::Cursor::new(buf);
        assert!(read_frame(&mut cursor).await.is_err());
    }
}
