//! wgmesh binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wgmesh_cli::cli::{Cli, Commands};
use wgmesh_cli::commands::{
    CheckCommand, KeyBackend, KeysCommand, MeshCommand, PairCommand, PeerCommand,
    PublicIpCommand, ShowCommand, TunnelCommand, TunnelRequest,
};
use wgmesh_cli::output::OutputFormat;
use wgmesh_tools::NativeKeyGenerator;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose && std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), wgmesh_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let tools = cli.tools_config();
    let keys = if cli.native_keys {
        KeyBackend::Native(NativeKeyGenerator)
    } else {
        KeyBackend::Wg(tools.key_generator())
    };
    let tunnel = tools.tunnel();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Show { file, raw } => {
            ShowCommand::new().execute(&mut stdout, &format, &file, raw).await?;
        }
        Commands::Keys(args) => {
            KeysCommand::new(&keys).execute(&mut stdout, &format, &args).await?;
        }
        Commands::AddPeer(args) => {
            PeerCommand::new(&tunnel).add(&mut stdout, &format, &args).await?;
        }
        Commands::RemovePeer {
            file,
            public_key,
            apply,
        } => {
            let cmd = PeerCommand::new(&tunnel);
            cmd.remove(&mut stdout, &format, &file, &public_key, apply).await?;
        }
        Commands::Pair(args) => {
            PairCommand::new(&keys).execute(&mut stdout, &format, &args).await?;
        }
        Commands::Mesh {
            definition,
            dry_run,
        } => {
            let cmd = MeshCommand::new(&keys);
            cmd.execute(&mut stdout, &format, &definition, dry_run).await?;
        }
        Commands::Up { file } => {
            let cmd = TunnelCommand::new(&tunnel);
            cmd.execute(&mut stdout, &format, TunnelRequest::Up, &file).await?;
        }
        Commands::Down { file } => {
            let cmd = TunnelCommand::new(&tunnel);
            cmd.execute(&mut stdout, &format, TunnelRequest::Down, &file).await?;
        }
        Commands::Restart { file } => {
            let cmd = TunnelCommand::new(&tunnel);
            cmd.execute(&mut stdout, &format, TunnelRequest::Restart, &file).await?;
        }
        Commands::PublicIp => {
            let cmd = PublicIpCommand::new(tools.public_ip_resolver()?);
            cmd.execute(&mut stdout, &format).await?;
        }
        Commands::Check => {
            let cmd = CheckCommand::new(tools.wg_path.clone());
            cmd.execute(&mut stdout, &format).await?;
        }
    }

    Ok(())
}
