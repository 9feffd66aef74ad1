use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogConfig;
use crate::error::Result;

/// `logs/<name>_<YYYYmmdd_HHMMSS>.log`
pub fn log_file_path(dir: &Path, name: &str) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{name}_{ts}.log"))
}

/// グローバル subscriber を設定する。stderr には常に、`config.dir` が空でなければ
/// タイムスタンプ付きファイルにも出力する。`RUST_LOG` でレベルを上書きできる。
///
/// 開いたログファイルのパスを返す
pub fn init(config: &LogConfig, name: &str) -> Result<Option<PathBuf>> {
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, path) = if config.dir.is_empty() {
        (None, None)
    } else {
        let dir = Path::new(&config.dir);
        std::fs::create_dir_all(dir)?;
        let path = log_file_path(dir, name);
        let file = File::create(&path)?;
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .boxed();
        (Some(layer), Some(path))
    };

    // 初期化済み (同一プロセスで 2 回目の呼び出しなど) は無視
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if let Some(ref p) = path {
        eprintln!("Log: {}", p.display());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_shape() {
        let path = log_file_path(Path::new("logs"), "bridge");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("bridge_"));
        assert!(name.ends_with(".log"));
        // bridge_YYYYmmdd_HHMMSS.log
        assert_eq!(name.len(), "bridge_".len() + 15 + ".log".len());
        assert_eq!(path.parent(), Some(Path::new("logs")));
    }
}
