//! コントロールチェンジの手動テスト用コンソール
//!
//! ブリッジを通さず、設定された出力へ直接値を送る。

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::time::Duration;

use tempo_bridge::config::{Config, DecisionConfig, DEFAULT_CONFIG_PATH};
use tempo_bridge::emitter::{self, ControlEmitter};
use tempo_bridge::mapping::CONTROL_MAX;

enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    let config = Config::load_or_default(DEFAULT_CONFIG_PATH)?;

    println!("=== Tempo Bridge - CC Console ===");
    println!();
    println!("Commands:");
    println!("  c <cc> <value>  - send one control change (e.g. c 2 90)");
    println!("  f | s | t <v>   - send <v> on the fast / slow / tie CC");
    println!("  r <cc>          - ramp 0..127 on <cc>");
    println!("  q               - quit");
    println!();

    let out = emitter::open(&config.output).context("failed to open control device")?;
    println!("Output: {}", out.describe());

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        // 入力ミスや送信失敗は表示して続行する
        match execute(out.as_ref(), &config.decision, &parts) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => {
                println!("Bye");
                break;
            }
            Err(e) => println!("Error: {e:#}"),
        }
    }

    Ok(())
}

fn execute(out: &dyn ControlEmitter, d: &DecisionConfig, parts: &[&str]) -> Result<Flow> {
    match parts {
        ["c", cc, value] => send(out, parse_byte(cc, "cc")?, parse_byte(value, "value")?)?,
        ["f", value] => send(out, d.fast_cc, parse_byte(value, "value")?)?,
        ["s", value] => send(out, d.slow_cc, parse_byte(value, "value")?)?,
        ["t", value] => send(out, d.tie_cc, parse_byte(value, "value")?)?,
        ["r", cc] => {
            let cc = parse_byte(cc, "cc")?;
            for value in (0..=CONTROL_MAX).step_by(8).chain(std::iter::once(CONTROL_MAX)) {
                send(out, cc, value)?;
                std::thread::sleep(Duration::from_millis(100));
            }
            println!("Ramp done");
        }
        ["q"] => return Ok(Flow::Quit),
        _ => println!("Unknown command: {}", parts.join(" ")),
    }
    Ok(Flow::Continue)
}

/// 0..=127 の数値。範囲外や数値でない入力はエラー
fn parse_byte(arg: &str, what: &str) -> Result<u8> {
    let value: u8 = arg
        .parse()
        .with_context(|| format!("{what} must be a number 0-{CONTROL_MAX}, got {arg:?}"))?;
    anyhow::ensure!(value <= CONTROL_MAX, "{what} must be 0-{CONTROL_MAX}, got {value}");
    Ok(value)
}

fn send(out: &dyn ControlEmitter, cc: u8, value: u8) -> Result<()> {
    out.emit(cc, value).context("send failed")?;
    println!("Sent CC{} = {}", cc, value);
    Ok(())
}
