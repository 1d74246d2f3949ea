//! Bootstrap tooling for master (producer) and lite (relay) nodes.
//!
//! A run loads [`config::RunConfiguration`] once, rebuilds the role's
//! workspace from the template scripts, appends the node flags to the launch
//! scripts, starts the node through its genesis start script, tunes the
//! node's runtime config and finally follows the node log until cancelled.
//! Every path is explicit through [`config::Layout`]; nothing changes the
//! process working directory.

pub mod bootstrap;
pub mod config;
pub mod environment;
pub mod errors;
pub mod fs;
pub mod interrupt;
pub mod launcher;
pub mod node_config;
pub mod role;
pub mod script;
pub mod workspace;

pub use bootstrap::{banner, Bootstrapper};
pub use config::{Layout, RunConfiguration};
pub use errors::{SetupError, SetupResult};
pub use interrupt::InterruptRelay;
pub use launcher::LaunchOptions;
pub use role::NodeRole;
pub use workspace::{NodeWorkspace, WorkspaceBuilder};
