use std::{io, process::ExitCode, sync::OnceLock};

use application::{cli, Args, Config, Context};
use service::command::{self, Command as _};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

async fn start() -> Result<(), ()> {
    let Args {
        config,
        api_url,
        command,
    } = Args::parse().unwrap_or_else(|e| e.exit());

    let mut config = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;
    if let Some(url) = api_url {
        config.api.base_url = url;
    }

    LOG_LEVEL
        .set(config.log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let (ctx, background) = Context::new(config);

    let run = async {
        drop(
            ctx.service()
                .execute(command::RestoreSession)
                .await
                .map_err(|e| {
                    log::error!("failed to restore the session: {e}");
                })?,
        );
        cli::run(&ctx, command).await.map_err(|e| log::error!("{e}"))
    };

    background
        .run_until(run)
        .await
        .map_err(|e| log::error!("background task failed: {e}"))?
}
