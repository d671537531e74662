use anyhow::Context;
use ufs_client::{Backend, ClientConfig, OutputSink, TransferClient};
use ufs_server::{ServerConfig, UfsServer};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = client_config(&cli);
    let output: OutputSink = cli.output.parse()?;
    match cli.command {
        Command::Stat(args) => {
            let client = TransferClient::new(&config)?;
            client.stat_to(&args.uuid, &output).await?;
            Ok(())
        }
        Command::Read(args) => {
            let client = TransferClient::new(&config)?;
            client.read_to(&args.uuid, &output).await?;
            Ok(())
        }
        Command::Serve(args) => cmd_serve(args).await,
    }
}

fn client_config(cli: &Cli) -> ClientConfig {
    ClientConfig {
        backend: match cli.backend {
            BackendArg::Rest => Backend::Rest,
            BackendArg::Stream => Backend::Stream,
        },
        server: cli.server.clone(),
        base_url: cli.base_url.clone(),
        ..ClientConfig::default()
    }
}

fn server_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let config = match &args.config {
        Some(path) => ServerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(addr) = args.http_addr {
        config.http_addr = addr;
    }
    if let Some(addr) = args.stream_addr {
        config.stream_addr = addr;
    }
    if let Some(path) = &args.metadata_file {
        config.metadata_file = path.clone();
    }
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = server_config(&args)?;
    let bound = UfsServer::new(config).bind().await.context("binding listeners")?;
    bound
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
