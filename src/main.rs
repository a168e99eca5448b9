use std::process::ExitCode;
use std::sync::Arc;

use relaycache::cache::CacheStore;
use relaycache::server;

/// `proxy <port>`. One positional argument, no flags, no config file.
/// Bind failure is the only fatal path; everything else keeps serving.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "proxy".to_string());

    let Some(port_arg) = args.next() else {
        eprintln!("usage: {program} <port>");
        return ExitCode::FAILURE;
    };

    let Ok(port) = port_arg.parse::<u16>() else {
        eprintln!("usage: {program} <port>\n{port_arg}: not a valid port number");
        return ExitCode::FAILURE;
    };

    let cache = Arc::new(CacheStore::init());

    if let Err(err) = server::run(port, cache).await {
        eprintln!("could not bind to port {port}: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
