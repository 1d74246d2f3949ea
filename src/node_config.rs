use tracing::info;

use crate::errors::SetupResult;
use crate::fs::Filesystem;
use crate::workspace::NodeWorkspace;

pub const MAX_TRANSACTION_TIME_MS: u32 = 15_000;
pub const CHAIN_STATE_DB_SIZE_MB: u32 = 64_000;

/// Tuning directives appended to the node's `config.ini`.
pub fn tuning_directives() -> String {
    format!(
        "\nmax-transaction-time = {MAX_TRANSACTION_TIME_MS}\nchain-state-db-size-mb = {CHAIN_STATE_DB_SIZE_MB}"
    )
}

/// Appends the tuning directives to the workspace's runtime config.
///
/// Every call appends again; a second run on the same workspace leaves the
/// directives duplicated and the node's own parser decides which one wins.
pub fn patch<F: Filesystem>(fs: &F, workspace: &NodeWorkspace) -> SetupResult<()> {
    let path = workspace.node_config_path();
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.append(&path, &tuning_directives())?;
    info!(
        target = "ine_setup::node_config",
        role = %workspace.role(),
        path = %path.display(),
        "node config patched"
    );
    Ok(())
}
