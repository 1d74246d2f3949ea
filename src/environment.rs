use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{info, warn};

use crate::errors::SetupResult;
use crate::fs::Filesystem;

/// Native packages the node binary links against.
pub const NATIVE_DEPENDENCIES: &[&str] = &["libncurses5"];

pub fn path_export_line(bin_dir: &Path) -> String {
    format!("\nexport PATH=\"$PATH:{}\"", bin_dir.display())
}

/// Appends a PATH extension for `bin_dir` to the shell profile.
///
/// `bin_dir` is resolved to an absolute path first. Nothing checks whether
/// the profile already carries the line, so repeated calls add it again.
pub fn export_path<F: Filesystem>(fs: &F, profile: &Path, bin_dir: &Path) -> SetupResult<PathBuf> {
    let resolved = fs.canonicalize(bin_dir)?;
    fs.append(profile, &path_export_line(&resolved))?;
    info!(
        target = "ine_setup::environment",
        profile = %profile.display(),
        bin_dir = %resolved.display(),
        "PATH export appended"
    );
    Ok(resolved)
}

pub trait PackageManager {
    fn install(&self, package: &str) -> io::Result<ExitStatus>;
}

/// Installs through `apt install`, inheriting the terminal for prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apt;

impl PackageManager for Apt {
    fn install(&self, package: &str) -> io::Result<ExitStatus> {
        Command::new("apt").arg("install").arg(package).status()
    }
}

/// Installs [`NATIVE_DEPENDENCIES`]; failures are logged and otherwise ignored.
pub fn install_dependencies<P: PackageManager>(manager: &P) {
    for package in NATIVE_DEPENDENCIES {
        info!(target = "ine_setup::environment", package, "installing dependency");
        match manager.install(package) {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(
                target = "ine_setup::environment",
                package,
                status = ?status,
                "package installation failed"
            ),
            Err(err) => warn!(
                target = "ine_setup::environment",
                package,
                "failed to run package manager: {err}"
            ),
        }
    }
}
