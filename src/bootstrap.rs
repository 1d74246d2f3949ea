use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{Layout, RunConfiguration};
use crate::errors::SetupResult;
use crate::fs::Filesystem;
use crate::launcher::{self, LaunchOptions};
use crate::node_config;
use crate::role::NodeRole;
use crate::script;
use crate::workspace::{NodeWorkspace, WorkspaceBuilder};

const BANNER_WIDTH: usize = 50;

/// Progress banner: a rule, the centered message, a rule.
pub fn banner(message: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\n{message:^BANNER_WIDTH$}\n{rule}")
}

/// Drives one role from an empty workspace to a running node.
pub struct Bootstrapper<'a, F: Filesystem> {
    config: &'a RunConfiguration,
    layout: &'a Layout,
    fs: &'a F,
    options: LaunchOptions,
}

impl<'a, F: Filesystem> Bootstrapper<'a, F> {
    pub fn new(
        config: &'a RunConfiguration,
        layout: &'a Layout,
        fs: &'a F,
        options: LaunchOptions,
    ) -> Self {
        Self {
            config,
            layout,
            fs,
            options,
        }
    }

    /// Builds the workspace, generates the launch scripts, starts the node
    /// and patches its runtime config.
    pub async fn bootstrap(&self, role: NodeRole) -> SetupResult<NodeWorkspace> {
        println!("{}", banner(role.creating_banner()));
        let workspace = WorkspaceBuilder::new(self.fs, self.layout).build(role)?;
        script::append_to(self.fs, &workspace, self.config)?;

        println!("{}", banner(role.starting_banner()));
        launcher::launch(&workspace, &self.options).await?;
        node_config::patch(self.fs, &workspace)?;
        info!(
            target = "ine_setup::bootstrap",
            role = %role,
            dir = %workspace.dir().display(),
            "node bootstrapped"
        );
        Ok(workspace)
    }

    /// Bootstraps `role` and follows its log until `token` is cancelled.
    pub async fn run<W>(&self, role: NodeRole, token: &CancellationToken, out: &mut W) -> SetupResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let workspace = self.bootstrap(role).await?;
        launcher::follow(&workspace.log_path(), token, out, &self.options).await
    }
}
