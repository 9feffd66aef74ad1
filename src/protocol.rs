//! 分類器クライアントとブリッジ間の TCP プロトコル
//!
//! 長さ区切りフレーム 1 つに JSON ドキュメント 1 つ。

use bytes::Bytes;
use futures::{Sink, SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::decision::ControlDecision;
use crate::error::{BridgeError, Result};
use crate::event::WireEvent;

pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

// --- メッセージ型 ---

/// 分類器 -> ブリッジ
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event")]
pub enum ClientMessage {
    /// 分類結果 1 件。現在のウィンドウに積まれる
    #[serde(rename = "midiData")]
    Event(WireEvent),
    /// 完成済みウィンドウ。即座に判定される
    #[serde(rename = "midi_data")]
    Batch {
        #[serde(default)]
        data: Vec<WireEvent>,
    },
}

/// ブリッジ -> 分類器。受信メッセージ 1 つにつき 1 つ
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerMessage {
    pub status: String,
    /// メッセージに含まれていたイベント数
    pub received: usize,
    /// このメッセージの結果として送った判定 (あれば)
    #[serde(default)]
    pub decision: Option<DecisionReport>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionReport {
    pub tempo: i32,
    pub value: u8,
    pub channel: u8,
}

impl From<ControlDecision> for DecisionReport {
    fn from(d: ControlDecision) -> Self {
        Self {
            tempo: d.tempo,
            value: d.value,
            channel: d.channel,
        }
    }
}

impl ServerMessage {
    pub fn success(received: usize, decision: Option<ControlDecision>) -> Self {
        Self {
            status: "success".to_string(),
            received,
            decision: decision.map(Into::into),
        }
    }

    pub fn rejected(reason: impl std::fmt::Display) -> Self {
        Self {
            status: format!("rejected: {reason}"),
            received: 0,
            decision: None,
        }
    }
}

// --- TCP コーデック ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec();
    Framed::new(stream, codec)
}

pub fn encode<T: Serialize>(msg: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(msg)?))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

pub async fn send_message<T: Serialize>(stream: &mut MessageStream, msg: &T) -> Result<()> {
    send_to_sink(stream, msg).await
}

/// 任意のフレーム sink へ送信 (split した書き込み側など)
pub async fn send_to_sink<S, T>(sink: &mut S, msg: &T) -> Result<()>
where
    S: Sink<Bytes, Error = std::io::Error> + Unpin,
    T: Serialize,
{
    sink.send(encode(msg)?).await?;
    Ok(())
}

pub async fn recv_message<T: DeserializeOwned>(stream: &mut MessageStream) -> Result<T> {
    match stream.next().await {
        Some(Ok(bytes)) => decode(&bytes),
        Some(Err(e)) => Err(e.into()),
        None => Err(BridgeError::ConnectionClosed),
    }
}
