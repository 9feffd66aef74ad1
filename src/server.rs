//! TCP 受付: 分類器からの接続を受けてブリッジへ流す

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt as _;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::bridge::Bridge;
use crate::error::{BridgeError, Result};
use crate::event::ClassificationEvent;
use crate::protocol::{self, ClientMessage, ServerMessage};

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// `shutdown` がキャンセルされるまで接続を受け付ける
pub async fn serve(listener: TcpListener, bridge: Arc<Bridge>, shutdown: CancellationToken) -> Result<()> {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        let (stream, addr) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                // EMFILE などは続けて失敗するので少し待つ
                tracing::warn!("accept failed: {e}");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };
        tracing::info!("client connected: {addr}");

        let bridge = Arc::clone(&bridge);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match handle_connection(stream, addr, bridge, shutdown).await {
                Ok(()) | Err(BridgeError::ConnectionClosed) => {
                    tracing::info!("client disconnected: {addr}");
                }
                Err(e) => tracing::warn!("client {addr} error: {e}"),
            }
        });
    }
    tracing::info!("listener stopped");
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    bridge: Arc<Bridge>,
    shutdown: CancellationToken,
) -> Result<()> {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("[{addr}] set_nodelay failed: {e}");
    }
    let framed = protocol::message_stream(stream);
    let (mut sink, mut reader) = framed.split();

    loop {
        let bytes = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            frame = reader.next() => match frame {
                Some(Ok(b)) => b,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(BridgeError::ConnectionClosed),
            },
        };

        let reply = match protocol::decode::<ClientMessage>(&bytes) {
            Ok(msg) => {
                tracing::debug!("[{addr}] {msg:?}");
                handle_message(&bridge, msg)
            }
            Err(e) => {
                tracing::warn!("[{addr}] skipping undecodable frame ({} bytes): {e}", bytes.len());
                ServerMessage::rejected(e)
            }
        };
        protocol::send_to_sink(&mut sink, &reply).await?;
    }
}

/// クライアントメッセージ 1 つをブリッジに適用して返信を作る
pub fn handle_message(bridge: &Bridge, msg: ClientMessage) -> ServerMessage {
    match msg {
        ClientMessage::Event(wire) => {
            let decision = bridge.receive(ClassificationEvent::from(wire));
            ServerMessage::success(1, decision)
        }
        ClientMessage::Batch { data } => {
            if data.is_empty() {
                return ServerMessage::success(0, None);
            }
            let events: Vec<ClassificationEvent> = data.into_iter().map(Into::into).collect();
            let decision = bridge.process_batch(&events);
            ServerMessage::success(events.len(), decision)
        }
    }
}
