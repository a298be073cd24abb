pub mod config;
pub mod pipeline;

pub use config::{AppConfig, ConfigError};
pub use pipeline::{Pipeline, PipelineError, RedactionReport};

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// 配置缺失时的退出码
const EXIT_CONFIG: u8 = 2;

/// 初始化日志，`log` 宏的输出由 tracing-subscriber 接管
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run() -> ExitCode {
    init_logging();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("[Startup] 配置错误: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    if let Ok(summary) = serde_json::to_string(&config) {
        log::info!("[Startup] 配置: {}", summary);
    }

    match Pipeline::from_config(&config).and_then(|mut pipeline| pipeline.run(&config)) {
        Ok(report) => {
            log::info!(
                "[Pipeline] 完成: {} 个片段，{} 条敏感文本，遮盖 {} 处 -> {}",
                report.span_count,
                report.sensitive_count,
                report.masked_count,
                report.output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("[Pipeline] 脱敏失败，未生成输出文件: {}", e);
            ExitCode::FAILURE
        }
    }
}
