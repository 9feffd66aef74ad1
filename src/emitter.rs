use rosc::{encoder, OscMessage, OscMidiMessage, OscPacket, OscType};
use std::net::UdpSocket;

use crate::config::{OutputConfig, OutputKind};
use crate::error::{BridgeError, Result};

/// コントロールチェンジのステータスニブル
pub const CONTROL_CHANGE: u8 = 0xB0;

/// コントロールチェンジを載せる OSC アドレス
pub const OSC_MIDI_ADDR: &str = "/midi";

/// コントロールチェンジの送信先。送りっぱなし (応答確認・リトライなし)
pub trait ControlEmitter: Send + Sync {
    fn emit(&self, channel: u8, value: u8) -> Result<()>;

    /// ログ用の送信先表記
    fn describe(&self) -> String;
}

/// 3 バイトの生コントロールチェンジ
pub fn control_change_bytes(midi_channel: u8, cc: u8, value: u8) -> [u8; 3] {
    [CONTROL_CHANGE | (midi_channel & 0x0F), cc & 0x7F, value & 0x7F]
}

/// コントロールチェンジ 1 つ分の OSC メッセージ:
/// MIDI 引数 1 つ (port, status, data1 = cc, data2 = value)
pub fn build_osc_message(midi_channel: u8, cc: u8, value: u8) -> OscMessage {
    let [status, data1, data2] = control_change_bytes(midi_channel, cc, value);
    OscMessage {
        addr: OSC_MIDI_ADDR.to_string(),
        args: vec![OscType::Midi(OscMidiMessage {
            port: 0,
            status,
            data1,
            data2,
        })],
    }
}

pub fn encode_osc_message(msg: &OscMessage) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(msg.clone());
    Ok(encoder::encode(&packet)?)
}

/// UDP 経由の OSC でコントロールチェンジを送る
pub struct OscEmitter {
    socket: UdpSocket,
    target_addr: String,
    midi_channel: u8,
}

impl OscEmitter {
    pub fn new(target_addr: &str, midi_channel: u8) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| BridgeError::DeviceUnavailable {
            name: target_addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            socket,
            target_addr: target_addr.to_string(),
            midi_channel,
        })
    }
}

impl ControlEmitter for OscEmitter {
    fn emit(&self, channel: u8, value: u8) -> Result<()> {
        let msg = build_osc_message(self.midi_channel, channel, value);
        let data = encode_osc_message(&msg)?;
        self.socket.send_to(&data, &self.target_addr)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("osc://{} (midi ch {})", self.target_addr, self.midi_channel + 1)
    }
}

#[cfg(feature = "midi-port")]
pub use midi_port::MidiPortEmitter;

#[cfg(feature = "midi-port")]
mod midi_port {
    use midir::{MidiOutput, MidiOutputConnection};
    use std::sync::Mutex;

    use super::{control_change_bytes, ControlEmitter};
    use crate::error::{BridgeError, Result};

    const CLIENT_NAME: &str = "tempo-bridge";

    /// 名前指定の MIDI 出力ポートへ直接書き込む
    pub struct MidiPortEmitter {
        port_name: String,
        midi_channel: u8,
        conn: Mutex<MidiOutputConnection>,
    }

    impl MidiPortEmitter {
        pub fn open(port_name: &str, midi_channel: u8) -> Result<Self> {
            let unavailable = |reason: String| BridgeError::DeviceUnavailable {
                name: port_name.to_string(),
                reason,
            };

            let output = MidiOutput::new(CLIENT_NAME).map_err(|e| unavailable(e.to_string()))?;
            let ports = output.ports();
            let port = ports
                .iter()
                .find(|p| output.port_name(p).map(|n| n == port_name).unwrap_or(false))
                .ok_or_else(|| {
                    let available: Vec<String> =
                        ports.iter().filter_map(|p| output.port_name(p).ok()).collect();
                    unavailable(format!("port not found (available: {})", available.join(", ")))
                })?
                .clone();
            let conn = output
                .connect(&port, CLIENT_NAME)
                .map_err(|e| unavailable(e.to_string()))?;

            Ok(Self {
                port_name: port_name.to_string(),
                midi_channel,
                conn: Mutex::new(conn),
            })
        }
    }

    impl ControlEmitter for MidiPortEmitter {
        fn emit(&self, channel: u8, value: u8) -> Result<()> {
            let bytes = control_change_bytes(self.midi_channel, channel, value);
            let mut conn = self
                .conn
                .lock()
                .map_err(|_| BridgeError::DeviceWrite("connection lock poisoned".into()))?;
            conn.send(&bytes)
                .map_err(|e| BridgeError::DeviceWrite(e.to_string()))
        }

        fn describe(&self) -> String {
            format!("midi://{} (ch {})", self.port_name, self.midi_channel + 1)
        }
    }
}

/// 出力設定で選ばれた送信先を開く
pub fn open(config: &OutputConfig) -> Result<Box<dyn ControlEmitter>> {
    match config.kind {
        OutputKind::Osc => Ok(Box::new(OscEmitter::new(&config.osc_target, config.midi_channel)?)),
        #[cfg(feature = "midi-port")]
        OutputKind::Midi => Ok(Box::new(MidiPortEmitter::open(&config.midi_port, config.midi_channel)?)),
        #[cfg(not(feature = "midi-port"))]
        OutputKind::Midi => Err(BridgeError::DeviceUnavailable {
            name: config.midi_port.clone(),
            reason: "built without the `midi-port` feature".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_change_bytes() {
        assert_eq!(control_change_bytes(0, 3, 127), [0xB0, 3, 127]);
        assert_eq!(control_change_bytes(9, 2, 64), [0xB9, 2, 64]);
        // 範囲外の入力は 7 ビットにマスクされる
        assert_eq!(control_change_bytes(0, 130, 200), [0xB0, 2, 72]);
    }

    #[test]
    fn test_build_osc_message() {
        let msg = build_osc_message(1, 4, 100);
        assert_eq!(msg.addr, "/midi");
        assert_eq!(msg.args.len(), 1);
        assert_eq!(
            msg.args[0],
            OscType::Midi(OscMidiMessage { port: 0, status: 0xB1, data1: 4, data2: 100 })
        );
    }

    #[test]
    fn test_encode_osc_message() {
        let msg = build_osc_message(0, 2, 90);
        let encoded = encode_osc_message(&msg).unwrap();
        assert!(!encoded.is_empty());
        // OSC パケットは 4 バイト境界
        assert_eq!(encoded.len() % 4, 0);
    }

    #[test]
    fn test_osc_emitter_sends_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(2)))
            .unwrap();
        let target = receiver.local_addr().unwrap().to_string();

        let emitter = OscEmitter::new(&target, 0).unwrap();
        emitter.emit(2, 90).unwrap();

        let mut buf = [0u8; 256];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..n]).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, OSC_MIDI_ADDR);
                assert_eq!(
                    msg.args,
                    vec![OscType::Midi(OscMidiMessage { port: 0, status: 0xB0, data1: 2, data2: 90 })]
                );
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[cfg(not(feature = "midi-port"))]
    #[test]
    fn test_midi_without_feature_is_fatal() {
        let config = OutputConfig {
            kind: OutputKind::Midi,
            ..OutputConfig::default()
        };
        let err = open(&config).err().unwrap();
        assert!(matches!(err, BridgeError::DeviceUnavailable { .. }));
    }
}
