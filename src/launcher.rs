use std::io::{ErrorKind, SeekFrom};
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{SetupError, SetupResult};
use crate::role::NodeRole;
use crate::workspace::{NodeWorkspace, GENESIS_START_SCRIPT};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_TAIL_LINES: usize = 10;
const TAIL_WINDOW_BYTES: u64 = 64 * 1024;
const READ_CHUNK_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Replaces the role's grace period when set.
    pub grace_override: Option<Duration>,
    pub poll_interval: Duration,
    /// Lines of existing log output shown before following.
    pub tail_lines: usize,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            grace_override: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}

impl LaunchOptions {
    pub fn grace_for(&self, role: NodeRole) -> Duration {
        self.grace_override.unwrap_or_else(|| role.launch_grace())
    }
}

/// Runs the workspace's genesis start script and waits out the grace period.
///
/// The script backgrounds the node itself, so this returns once the script
/// exits and the grace period has elapsed. The node's health is not checked:
/// a non-zero exit is only logged.
pub async fn launch(workspace: &NodeWorkspace, options: &LaunchOptions) -> SetupResult<()> {
    let script = workspace.file(GENESIS_START_SCRIPT);
    info!(
        target = "ine_setup::launcher",
        role = %workspace.role(),
        script = %script.display(),
        "running genesis start script"
    );

    let status = Command::new(&script)
        .current_dir(workspace.dir())
        .status()
        .await
        .map_err(|source| SetupError::Launch {
            script: script.clone(),
            source,
        })?;
    if !status.success() {
        warn!(
            target = "ine_setup::launcher",
            role = %workspace.role(),
            status = ?status,
            "genesis start script exited unsuccessfully"
        );
    }

    let grace = options.grace_for(workspace.role());
    debug!(
        target = "ine_setup::launcher",
        grace_ms = grace.as_millis() as u64,
        "waiting for node to initialise"
    );
    sleep(grace).await;
    Ok(())
}

/// Streams `path` to `out` like `tail -f` until `token` is cancelled.
///
/// Waits for the file to appear, prints its last `tail_lines` lines, then
/// polls for appended bytes. A file that shrinks is read again from the
/// start.
pub async fn follow<W>(
    path: &Path,
    token: &CancellationToken,
    out: &mut W,
    options: &LaunchOptions,
) -> SetupResult<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(mut file) = wait_for_file(path, token, options.poll_interval).await? else {
        return Ok(());
    };
    info!(
        target = "ine_setup::launcher",
        path = %path.display(),
        "following node log"
    );

    let len = file
        .metadata()
        .await
        .map_err(|err| SetupError::filesystem("stat", path, err))?
        .len();
    let mut position = tail_start(&mut file, len, options.tail_lines)
        .await
        .map_err(|err| SetupError::filesystem("read", path, err))?;
    file.seek(SeekFrom::Start(position))
        .await
        .map_err(|err| SetupError::filesystem("seek", path, err))?;

    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        if token.is_cancelled() {
            return Ok(());
        }

        let read = file
            .read(&mut buf)
            .await
            .map_err(|err| SetupError::filesystem("read", path, err))?;
        if read > 0 {
            out.write_all(&buf[..read])
                .await
                .map_err(|err| SetupError::filesystem("forward output of", path, err))?;
            out.flush()
                .await
                .map_err(|err| SetupError::filesystem("forward output of", path, err))?;
            position += read as u64;
            continue;
        }

        let current_len = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(_) => position,
        };
        if current_len < position {
            debug!(target = "ine_setup::launcher", "log truncated; rewinding");
            position = file
                .seek(SeekFrom::Start(0))
                .await
                .map_err(|err| SetupError::filesystem("seek", path, err))?;
            continue;
        }

        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = sleep(options.poll_interval) => {}
        }
    }
}

async fn wait_for_file(
    path: &Path,
    token: &CancellationToken,
    poll_interval: Duration,
) -> SetupResult<Option<File>> {
    let mut announced = false;
    loop {
        match File::open(path).await {
            Ok(file) => return Ok(Some(file)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if !announced {
                    info!(
                        target = "ine_setup::launcher",
                        path = %path.display(),
                        "waiting for node log to appear"
                    );
                    announced = true;
                }
            }
            Err(err) => return Err(SetupError::filesystem("open", path, err)),
        }

        tokio::select! {
            _ = token.cancelled() => return Ok(None),
            _ = sleep(poll_interval) => {}
        }
    }
}

async fn tail_start(file: &mut File, len: u64, lines: usize) -> std::io::Result<u64> {
    if lines == 0 || len == 0 {
        return Ok(len);
    }
    let window_start = len.saturating_sub(TAIL_WINDOW_BYTES);
    file.seek(SeekFrom::Start(window_start)).await?;
    let mut window = Vec::with_capacity((len - window_start) as usize);
    file.take(len - window_start).read_to_end(&mut window).await?;
    Ok(window_start + last_lines_offset(&window, lines) as u64)
}

/// Offset in `window` where its last `lines` lines begin.
fn last_lines_offset(window: &[u8], lines: usize) -> usize {
    if lines == 0 {
        return window.len();
    }
    let mut end = window.len();
    if window.last() == Some(&b'\n') {
        end -= 1;
    }
    let mut seen = 0;
    for (idx, byte) in window[..end].iter().enumerate().rev() {
        if *byte == b'\n' {
            seen += 1;
            if seen == lines {
                return idx + 1;
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn quick_options() -> LaunchOptions {
        LaunchOptions {
            grace_override: Some(Duration::ZERO),
            poll_interval: Duration::from_millis(10),
            tail_lines: 3,
        }
    }

    #[cfg(unix)]
    fn write_script(path: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn last_lines_offset_skips_trailing_newline() {
        let window = b"one\ntwo\nthree\nfour\n";
        assert_eq!(&window[last_lines_offset(window, 2)..], b"three\nfour\n");
        assert_eq!(last_lines_offset(window, 10), 0);
        assert_eq!(last_lines_offset(window, 0), window.len());
        assert_eq!(last_lines_offset(b"a\nb", 1), 2);
    }

    #[test]
    fn grace_override_replaces_role_default() {
        let options = LaunchOptions::default();
        assert_eq!(options.grace_for(NodeRole::Master), Duration::from_secs(3));
        assert_eq!(quick_options().grace_for(NodeRole::Master), Duration::ZERO);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_runs_script_inside_workspace() {
        let temp = TempDir::new().unwrap();
        let workspace = NodeWorkspace::new(temp.path(), NodeRole::Lite);
        fs::create_dir_all(workspace.dir()).unwrap();
        write_script(&workspace.file(GENESIS_START_SCRIPT), "pwd > launched_from");

        launch(&workspace, &quick_options()).await.unwrap();

        let launched_from = fs::read_to_string(workspace.file("launched_from")).unwrap();
        assert_eq!(
            fs::canonicalize(launched_from.trim()).unwrap(),
            fs::canonicalize(workspace.dir()).unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_script_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let workspace = NodeWorkspace::new(temp.path(), NodeRole::Master);
        fs::create_dir_all(workspace.dir()).unwrap();
        write_script(&workspace.file(GENESIS_START_SCRIPT), "exit 7");

        launch(&workspace, &quick_options()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_script_is_a_launch_error() {
        let temp = TempDir::new().unwrap();
        let workspace = NodeWorkspace::new(temp.path(), NodeRole::Master);
        fs::create_dir_all(workspace.dir()).unwrap();

        let err = launch(&workspace, &quick_options()).await.unwrap_err();
        assert_matches!(err, SetupError::Launch { .. });
    }

    #[tokio::test]
    async fn follow_returns_when_cancelled_before_log_exists() {
        let temp = TempDir::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let mut out = Vec::new();
        follow(&temp.path().join("nodine.log"), &token, &mut out, &quick_options())
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn follow_prints_tail_then_appended_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nodine.log");
        let backlog: String = (1..=5).map(|i| format!("line {i}\n")).collect();
        fs::write(&path, backlog).unwrap();

        let token = CancellationToken::new();
        let writer_token = token.clone();
        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let mut file = fs::OpenOptions::new()
                .append(true)
                .open(&writer_path)
                .unwrap();
            file.write_all(b"line 6\nline 7\n").unwrap();
            sleep(Duration::from_millis(200)).await;
            writer_token.cancel();
        });

        let mut out = Vec::new();
        follow(&path, &token, &mut out, &quick_options())
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "line 3\nline 4\nline 5\nline 6\nline 7\n"
        );
    }

    #[tokio::test]
    async fn follow_waits_for_log_to_appear() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nodine.log");

        let token = CancellationToken::new();
        let writer_token = token.clone();
        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            fs::write(&writer_path, "node started\n").unwrap();
            sleep(Duration::from_millis(200)).await;
            writer_token.cancel();
        });

        let mut out = Vec::new();
        follow(&path, &token, &mut out, &quick_options())
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "node started\n");
    }

    #[tokio::test]
    async fn follow_rereads_log_after_truncation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nodine.log");
        fs::write(&path, "old line one\nold line two\n").unwrap();

        let token = CancellationToken::new();
        let writer_token = token.clone();
        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            sleep(Duration::from_millis(60)).await;
            fs::write(&writer_path, "fresh\n").unwrap();
            sleep(Duration::from_millis(200)).await;
            writer_token.cancel();
        });

        let mut out = Vec::new();
        follow(&path, &token, &mut out, &quick_options())
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "old line one\nold line two\nfresh\n"
        );
    }
}
