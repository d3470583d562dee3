use anyhow::{Context, Result};
use clap::Parser;
use cybersonic::cli::DaemonArgs;
use cybersonic::config::Config;
use cybersonic::server::{self, AppState};
use cybersonic::sound::{self, Dispatcher, SoundRegistry};
use cybersonic::{logging, shutdown, tray};
use std::net::TcpListener;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = DaemonArgs::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };
    for warning in args.apply(&mut config) {
        eprintln!("{}", warning);
    }
    if let Err(err) = config.validate() {
        eprintln!("Error: {:#}", err);
        return ExitCode::FAILURE;
    }

    logging::init_daemon(config.log_level);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "Cybersonicd stopped with an error");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<()> {
    let sfx_dir = config.sfx_dir();
    let registry = SoundRegistry::load_dir(&sfx_dir, &config.extension)
        .context("Failed to read sfx directory")?;
    let registry = Arc::new(registry);
    let dispatcher = Dispatcher::new(Arc::clone(&registry), sound::open_default(config.volume));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let listener = TcpListener::bind(config.address.as_str())
        .with_context(|| format!("Server failed to start on {}", config.address))?;

    let (trigger, signal) = shutdown::channel();
    let server_trigger = trigger.clone();
    let server_signal = signal.clone();
    let server = runtime.spawn(async move {
        let result = server::serve(listener, AppState::new(dispatcher), server_signal).await;
        if let Err(err) = &result {
            tracing::error!(error = %err, "Server failed");
        }
        // takes the tray down with us
        server_trigger.trigger();
        result
    });

    tray::run(&config.icon_path(), trigger, signal, runtime.handle());

    tracing::info!("Stopping cybersonicd...");
    let served = runtime
        .block_on(server)
        .context("Server task panicked")?;

    match Arc::try_unwrap(registry) {
        Ok(registry) => {
            registry.release_all();
        }
        Err(_) => tracing::warn!("Sound registry still shared at shutdown, dropping it"),
    }
    served
}
