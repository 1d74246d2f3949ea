use std::fmt::Write as _;

use tracing::info;

use crate::config::RunConfiguration;
use crate::errors::SetupResult;
use crate::fs::Filesystem;
use crate::role::NodeRole;
use crate::workspace::{
    NodeWorkspace, GENESIS_START_SCRIPT, HARD_REPLAY_SCRIPT, START_SCRIPT,
};

const LINE_CONTINUATION: &str = " \\\n";
const REDIRECT_TRAILER: &str = ">> $DATADIR\"/nodine.log\" 2>&1 & \\\n";
const PID_TRAILER: &str = "echo $! > $DATADIR\"/ined.pid\"";

/// Entry points that receive the generated flag block.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LaunchScript {
    GenesisStart,
    Start,
    HardReplay,
}

impl LaunchScript {
    pub fn all() -> &'static [LaunchScript] {
        &[
            LaunchScript::GenesisStart,
            LaunchScript::Start,
            LaunchScript::HardReplay,
        ]
    }

    pub fn file_name(self) -> &'static str {
        match self {
            LaunchScript::GenesisStart => GENESIS_START_SCRIPT,
            LaunchScript::Start => START_SCRIPT,
            LaunchScript::HardReplay => HARD_REPLAY_SCRIPT,
        }
    }
}

/// Renders the node flags appended to every launch script of `role`.
///
/// Lines come out in a fixed order: producer name (master only), HTTP
/// address, P2P listen endpoint, genesis peer, signature provider (master
/// only), configured peers in input order, then the log redirect and pid
/// capture. Nothing is validated or escaped.
pub fn flag_block(role: NodeRole, config: &RunConfiguration) -> String {
    let mut block = String::new();
    let (http_address, listen_address) = match role {
        NodeRole::Master => (
            &config.master_account.http_address,
            &config.master_account.peer_address,
        ),
        NodeRole::Lite => (
            &config.lite_node.http_address,
            &config.lite_node.peer_address,
        ),
    };

    if role.is_producer() {
        push_flag(&mut block, "producer-name", &config.master_account.name);
    }
    push_flag(&mut block, "http-server-address", http_address);
    push_flag(&mut block, "p2p-listen-endpoint", listen_address);
    push_flag(
        &mut block,
        "p2p-peer-address",
        &config.genesis_account.peer_address,
    );
    if role.is_producer() {
        let provider = format!(
            "{}=KEY:{}",
            config.master_account.public_key, config.master_account.private_key
        );
        push_flag(&mut block, "signature-provider", &provider);
    }
    for peer in config.peer_addresses() {
        push_flag(&mut block, "p2p-peer-address", peer);
    }

    block.push_str(REDIRECT_TRAILER);
    block.push_str(PID_TRAILER);
    block
}

fn push_flag(block: &mut String, flag: &str, value: &str) {
    let _ = write!(block, "--{flag} {value}{LINE_CONTINUATION}");
}

/// Appends the role's flag block to each launch script and marks it executable.
pub fn append_to<F: Filesystem>(
    fs: &F,
    workspace: &NodeWorkspace,
    config: &RunConfiguration,
) -> SetupResult<()> {
    let block = flag_block(workspace.role(), config);
    for script in LaunchScript::all() {
        let path = workspace.file(script.file_name());
        fs.append(&path, &block)?;
        fs.set_executable(&path)?;
    }
    info!(
        target = "ine_setup::script",
        role = %workspace.role(),
        peers = config.peers.len(),
        "launch scripts generated"
    );
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::{GenesisAccount, LiteNode, MasterAccount, PeerConfig, RunConfiguration};

    pub fn sample_config(peers: &[&str]) -> RunConfiguration {
        RunConfiguration {
            master_account: MasterAccount {
                name: "alice".to_string(),
                http_address: "0.0.0.0:8888".to_string(),
                peer_address: "0.0.0.0:9010".to_string(),
                public_key: "INE6pub".to_string(),
                private_key: "5Kpriv".to_string(),
            },
            genesis_account: GenesisAccount {
                peer_address: "9.9.9.9:9876".to_string(),
            },
            lite_node: LiteNode {
                http_address: "0.0.0.0:8889".to_string(),
                peer_address: "0.0.0.0:9011".to_string(),
            },
            peers: peers
                .iter()
                .map(|address| PeerConfig {
                    peer_address: address.to_string(),
                })
                .collect(),
        }
    }
}
