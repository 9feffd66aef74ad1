//! テスト用クライアント: 標準入力で打った分類イベントを起動中のブリッジへ送り、
//! 返信を表示する
//!
//!   f <p>    velocity の 2 値出力 p (p <= 0.5 で Fast)
//!   a <p>    acceleration の 2 値出力 p
//!   l <label> <conf>   名前付きラベル (例: `l Slow 0.8`)
//!   b        デモ用バッチ (fast 2 件、slow 1 件)
//!   q        終了

use anyhow::Result;
use clap::Parser;
use futures::StreamExt as _;
use std::time::Duration;
use tokio::sync::mpsc;

use tempo_bridge::event::{FeatureKind, WireEvent};
use tempo_bridge::pose::classifier_event;
use tempo_bridge::protocol::{self, ClientMessage, ServerMessage};

#[derive(Parser)]
#[command(name = "event_sender", about = "Send test classifications to tempo-bridge")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1:5000")]
    server_addr: String,
}

enum Command {
    Send(ClientMessage),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let msg = match parts.as_slice() {
        ["f", p] => ClientMessage::Event(classifier_event(FeatureKind::Velocity, "label", p.parse().ok()?)),
        ["a", p] => ClientMessage::Event(classifier_event(FeatureKind::Acceleration, "label", p.parse().ok()?)),
        ["l", label, conf] => {
            let conf: f64 = conf.parse().ok()?;
            ClientMessage::Event(WireEvent::new(
                FeatureKind::Velocity,
                format!("{label} ({conf:.2})"),
                conf,
            ))
        }
        ["b"] => ClientMessage::Batch {
            data: vec![
                WireEvent::new(FeatureKind::Velocity, "Fast (1.00)", 1.0),
                WireEvent::new(FeatureKind::Velocity, "Fast (0.50)", 0.5),
                WireEvent::new(FeatureKind::Velocity, "Slow (0.90)", 0.9),
            ],
        },
        ["q"] => return Some(Command::Quit),
        _ => return None,
    };
    Some(Command::Send(msg))
}

/// 終了が指示されたら Ok(true)
async fn run_session(
    mut stream: protocol::MessageStream,
    commands: &mut mpsc::Receiver<Command>,
) -> Result<bool> {
    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Send(msg)) => protocol::send_message(&mut stream, &msg).await?,
                Some(Command::Quit) | None => return Ok(true),
            },
            frame = stream.next() => match frame {
                Some(Ok(bytes)) => {
                    let reply: ServerMessage = protocol::decode(&bytes)?;
                    match reply.decision {
                        Some(d) => println!(
                            "[bridge] {} ({} events) -> CC{} = {} (tempo {})",
                            reply.status, reply.received, d.channel, d.value, d.tempo
                        ),
                        None => println!("[bridge] {} ({} events)", reply.status, reply.received),
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => anyhow::bail!("connection closed"),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (tx, mut rx) = mpsc::channel::<Command>(16);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    let _ = tx.blocking_send(Command::Quit);
                    break;
                }
                Ok(_) => match parse_command(&line) {
                    Some(cmd) => {
                        if tx.blocking_send(cmd).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => eprintln!("unknown command: {}", line.trim()),
                },
            }
        }
    });

    loop {
        eprintln!("[tcp] connecting to {}...", cli.server_addr);
        match tokio::net::TcpStream::connect(&cli.server_addr).await {
            Ok(tcp) => {
                tcp.set_nodelay(true)?;
                eprintln!("[tcp] connected");
                match run_session(protocol::message_stream(tcp), &mut rx).await {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => eprintln!("[tcp] session error: {e:#}"),
                }
            }
            Err(e) => eprintln!("[tcp] connection failed: {e}"),
        }
        eprintln!("[tcp] reconnecting in 2s...");
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    Ok(())
}
