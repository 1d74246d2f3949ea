use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Layout;
use crate::errors::SetupResult;
use crate::fs::Filesystem;
use crate::role::NodeRole;

pub const STOP_SCRIPT: &str = "stop.sh";
pub const CLEAN_SCRIPT: &str = "clean.sh";
pub const START_SCRIPT: &str = "start.sh";
pub const GENESIS_START_SCRIPT: &str = "genesis_start.sh";
pub const HARD_REPLAY_SCRIPT: &str = "hard_replay.sh";
pub const GENESIS_FILE: &str = "genesis.json";

/// Scripts copied verbatim from the template directory.
pub const TEMPLATE_SCRIPTS: [&str; 5] = [
    STOP_SCRIPT,
    CLEAN_SCRIPT,
    START_SCRIPT,
    GENESIS_START_SCRIPT,
    HARD_REPLAY_SCRIPT,
];

/// Control scripts that are executable straight after the copy.
pub const CONTROL_SCRIPTS: [&str; 2] = [STOP_SCRIPT, CLEAN_SCRIPT];

const STATE_DIR: &str = "blockchain";
const LOG_FILE: &str = "nodine.log";

/// A role's working directory, `<root>/<role>.node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeWorkspace {
    role: NodeRole,
    dir: PathBuf,
}

impl NodeWorkspace {
    pub fn new(root: &Path, role: NodeRole) -> Self {
        Self {
            role,
            dir: root.join(role.workspace_dir_name()),
        }
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.join(STATE_DIR)
    }

    /// Runtime config read by the node binary.
    pub fn node_config_path(&self) -> PathBuf {
        self.state_dir().join("config").join("config.ini")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir().join(LOG_FILE)
    }
}

/// Creates role workspaces from the template directory.
pub struct WorkspaceBuilder<'a, F: Filesystem> {
    fs: &'a F,
    layout: &'a Layout,
}

impl<'a, F: Filesystem> WorkspaceBuilder<'a, F> {
    pub fn new(fs: &'a F, layout: &'a Layout) -> Self {
        Self { fs, layout }
    }

    /// Destroys any existing workspace for `role` and recreates it empty.
    ///
    /// This deletes all prior node state in that directory, including the
    /// chain data. Rebuilding from scratch is the only recovery path after a
    /// partial failure.
    pub fn prepare(&self, role: NodeRole) -> SetupResult<NodeWorkspace> {
        let workspace = NodeWorkspace::new(&self.layout.root, role);
        info!(
            target = "ine_setup::workspace",
            role = %role,
            dir = %workspace.dir().display(),
            "recreating workspace"
        );
        self.fs.remove_tree(workspace.dir())?;
        self.fs.create_dir_all(workspace.dir())?;
        Ok(workspace)
    }

    pub fn populate_templates(&self, workspace: &NodeWorkspace) -> SetupResult<()> {
        for script in TEMPLATE_SCRIPTS {
            self.fs
                .copy_file(&self.layout.template_dir.join(script), &workspace.file(script))?;
        }
        self.fs
            .copy_file(&self.layout.genesis_path, &workspace.file(GENESIS_FILE))?;
        info!(
            target = "ine_setup::workspace",
            role = %workspace.role(),
            templates = TEMPLATE_SCRIPTS.len(),
            "templates copied"
        );
        Ok(())
    }

    pub fn mark_executable(&self, workspace: &NodeWorkspace) -> SetupResult<()> {
        for script in CONTROL_SCRIPTS {
            self.fs.set_executable(&workspace.file(script))?;
        }
        Ok(())
    }

    pub fn build(&self, role: NodeRole) -> SetupResult<NodeWorkspace> {
        let workspace = self.prepare(role)?;
        self.populate_templates(&workspace)?;
        self.mark_executable(&workspace)?;
        Ok(workspace)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;
    use std::path::Path;

    use super::TEMPLATE_SCRIPTS;
    use crate::config::Layout;

    /// Writes a template directory and genesis file under `root`.
    pub fn write_templates(root: &Path) -> Layout {
        let layout = Layout::new(root).with_profile_path(Some(root.join("profile").as_path()));
        fs::create_dir_all(&layout.template_dir).unwrap();
        for script in TEMPLATE_SCRIPTS {
            fs::write(
                layout.template_dir.join(script),
                format!("#!/bin/bash\n# {script}\nnodine \\\n"),
            )
            .unwrap();
        }
        fs::write(&layout.genesis_path, "{\"initial_key\":\"INE6pub\"}\n").unwrap();
        layout
    }
}
