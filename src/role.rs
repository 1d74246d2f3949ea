use std::fmt;

use tokio::time::Duration;

/// Role a bootstrapped node plays in the network.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum NodeRole {
    /// Block producer signing with the master account key.
    Master,
    /// Non-producing relay node.
    Lite,
}

impl NodeRole {
    pub fn all() -> &'static [NodeRole] {
        &[NodeRole::Master, NodeRole::Lite]
    }

    pub fn slug(self) -> &'static str {
        match self {
            NodeRole::Master => "master",
            NodeRole::Lite => "lite",
        }
    }

    /// Name of the workspace directory, e.g. `master.node`.
    pub fn workspace_dir_name(self) -> String {
        format!("{}.node", self.slug())
    }

    pub fn is_producer(self) -> bool {
        matches!(self, NodeRole::Master)
    }

    /// Time the node gets to come up after the genesis start script returns.
    pub fn launch_grace(self) -> Duration {
        match self {
            NodeRole::Master => Duration::from_secs(3),
            NodeRole::Lite => Duration::from_secs(2),
        }
    }

    pub fn creating_banner(self) -> &'static str {
        match self {
            NodeRole::Master => "Creating master node",
            NodeRole::Lite => "Creating lite node",
        }
    }

    pub fn starting_banner(self) -> &'static str {
        match self {
            NodeRole::Master => "* STARTING MASTER *",
            NodeRole::Lite => "* STARTING LITE *",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
