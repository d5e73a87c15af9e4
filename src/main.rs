use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neutron_bridge::{Bridge, BridgeConfig, BridgeResponse};
use neutron_config::{InstallRoot, ParameterRecord};
use neutron_runner::{DEFAULT_INTERPRETER, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SCRIPT_NAME};
use neutron_store::DEFAULT_ARTIFACT_NAME;

/// Neutron - saves simulation parameters and runs the transport simulation
#[derive(Parser)]
#[command(name = "neutron")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Installation root holding the configuration and the simulation script
  /// (default: directory of this executable)
  #[arg(long, global = true)]
  root: Option<PathBuf>,

  /// File name of the configuration artifact under the root
  #[arg(long, global = true, default_value = DEFAULT_ARTIFACT_NAME)]
  artifact: String,

  /// File name of the simulation script under the root
  #[arg(long, global = true, default_value = DEFAULT_SCRIPT_NAME)]
  script: String,

  /// Program to launch the script with
  #[arg(long, global = true, default_value = DEFAULT_INTERPRETER)]
  interpreter: PathBuf,

  /// Execute the script itself instead of handing it to the interpreter
  #[arg(long, global = true)]
  direct: bool,

  /// Capture limit for each of stdout and stderr, in bytes
  #[arg(long, global = true, default_value_t = DEFAULT_MAX_OUTPUT_BYTES)]
  max_output: usize,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Save a parameter record as the current configuration
  Save {
    /// JSON file holding the record (default: read from stdin)
    file: Option<PathBuf>,
  },

  /// Print the current configuration
  Show,

  /// Run the simulation against the current configuration
  Run,
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "neutron=info,neutron_store=info,neutron_runner=info,neutron_bridge=info".into()
      }),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
    .init();

  let cli = Cli::parse();

  let Some(command) = cli.command else {
    println!("neutron - use --help to see available commands");
    return Ok(ExitCode::SUCCESS);
  };

  let root = match &cli.root {
    Some(path) => InstallRoot::new(path),
    None => InstallRoot::from_current_exe(),
  }
  .context("failed to determine installation root")?;

  let config = BridgeConfig {
    root,
    artifact_name: cli.artifact,
    script_name: cli.script,
    interpreter: (!cli.direct).then_some(cli.interpreter),
    max_output_bytes: cli.max_output,
  };
  let bridge = Bridge::new(config).context("invalid artifact name")?;

  let rt = tokio::runtime::Runtime::new()?;
  let response = rt.block_on(async { dispatch(&bridge, command).await })?;

  println!("{}", serde_json::to_string_pretty(&response)?);

  if response.is_ok() {
    Ok(ExitCode::SUCCESS)
  } else {
    Ok(ExitCode::FAILURE)
  }
}

async fn dispatch(bridge: &Bridge, command: Commands) -> Result<BridgeResponse> {
  let result = match command {
    Commands::Save { file } => {
      let record = read_record(file.as_deref()).await?;
      bridge
        .save_config(record)
        .await
        .map(|()| BridgeResponse::saved())
    }
    Commands::Show => bridge.load_config().await.map(BridgeResponse::config),
    Commands::Run => {
      let cancel = CancellationToken::new();
      tokio::spawn({
        let cancel = cancel.clone();
        async move {
          if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping simulation");
            cancel.cancel();
          }
        }
      });

      bridge
        .run_simulation(cancel)
        .await
        .map(BridgeResponse::output)
    }
  };

  Ok(result.unwrap_or_else(|e| BridgeResponse::from(&e)))
}

async fn read_record(file: Option<&Path>) -> Result<ParameterRecord> {
  let content = match file {
    Some(path) => tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read parameter file: {}", path.display()))?,
    None => read_stdin().await?,
  };

  serde_json::from_str(&content).context("failed to parse parameter record")
}

async fn read_stdin() -> Result<String> {
  if io::stdin().is_terminal() {
    bail!("no parameter record given: pass a file or pipe JSON on stdin");
  }

  read_payload(tokio::io::stdin())
    .await
    .context("failed to read parameter record from stdin")
}

async fn read_payload(mut reader: impl AsyncRead + Unpin) -> io::Result<String> {
  let mut input = String::new();
  reader.read_to_string(&mut input).await?;
  Ok(input)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_interpreter_defaults_to_bash() {
    let cli = Cli::parse_from(["neutron", "run"]);
    assert_eq!(cli.interpreter, PathBuf::from("bash"));
    assert!(!cli.direct);
  }

  #[test]
  fn test_direct_flag() {
    let cli = Cli::parse_from(["neutron", "run", "--direct"]);
    assert!(cli.direct);
  }

  #[tokio::test(flavor = "current_thread")]
  async fn test_read_payload_does_not_block_the_runtime() {
    let (mut writer, reader) = tokio::io::duplex(16);
    let writer = tokio::spawn(async move {
      use tokio::io::AsyncWriteExt;
      writer.write_all(br#"{"run":{"run_name":"piped"}}"#).await.unwrap();
    });

    let payload = read_payload(reader).await.unwrap();
    writer.await.unwrap();

    assert_eq!(payload, r#"{"run":{"run_name":"piped"}}"#);
  }
}
