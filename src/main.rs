use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ine_setup::environment::{export_path, install_dependencies, Apt};
use ine_setup::fs::{Filesystem, LocalFs};
use ine_setup::interrupt::InterruptRelay;
use ine_setup::{Bootstrapper, LaunchOptions, Layout, NodeRole, RunConfiguration};

#[derive(Debug, Parser)]
#[command(author, version, about = "Bootstrap and launch master or lite nodes", long_about = None)]
struct Cli {
    /// Append the node binary directory to PATH in the shell profile
    #[arg(long)]
    export: bool,

    /// Create and start a master (producer) node
    #[arg(long)]
    master: bool,

    /// Create and start a lite (relay) node
    #[arg(long)]
    lite: bool,

    /// Install the native packages the node binary needs
    #[arg(long)]
    install_deps: bool,

    /// Directory holding `tools/` and receiving the node workspaces
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Run configuration (defaults to <root>/tools/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Node binary directory exported to PATH (defaults to <root>/../inery/2.0/bin)
    #[arg(long)]
    bin_dir: Option<PathBuf>,

    /// Shell profile receiving the PATH export (defaults to $HOME/.bashrc)
    #[arg(long)]
    profile: Option<PathBuf>,
}

impl Cli {
    fn roles(&self) -> Vec<NodeRole> {
        NodeRole::all()
            .iter()
            .copied()
            .filter(|role| match role {
                NodeRole::Master => self.master,
                NodeRole::Lite => self.lite,
            })
            .collect()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let fs = LocalFs;
    let root = fs
        .canonicalize(&cli.root)
        .context("failed to resolve root directory")?;
    let layout = Layout::new(root)
        .with_config_path(cli.config.as_deref())
        .with_bin_dir(cli.bin_dir.as_deref())
        .with_profile_path(cli.profile.as_deref());
    let config = RunConfiguration::from_path(&layout.config_path)
        .context("failed to load run configuration")?;

    if cli.export {
        let profile = layout.profile_path()?;
        export_path(&fs, profile, &layout.bin_dir).context("failed to export PATH")?;
    }

    if cli.install_deps {
        install_dependencies(&Apt);
    }

    let bootstrapper = Bootstrapper::new(&config, &layout, &fs, LaunchOptions::default());
    let mut stdout = tokio::io::stdout();
    let relay = InterruptRelay::new();
    let listener = relay.listen();
    // Let the listener install its handler before any role work starts.
    tokio::task::yield_now().await;
    let mut outcome = Ok(());
    for role in cli.roles() {
        let token = relay.arm();
        outcome = bootstrapper
            .run(role, &token, &mut stdout)
            .await
            .with_context(|| format!("failed to bootstrap {role} node"));
        if outcome.is_err() {
            break;
        }
    }
    relay.shutdown();
    let _ = listener.await;

    outcome
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
