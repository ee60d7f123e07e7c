use anyhow::{Context, Result};
use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;
#[cfg(target_os = "linux")]
use tracing::debug;

/// Hidden argument that turns the process into a short-lived clipboard owner.
pub const DAEMON_FLAG: &str = "__sharepick_clipboard_daemon";

// On X11/Wayland the clipboard content dies with the process that set it,
// so a detached copy of ourselves keeps serving it after we exit.
#[cfg(target_os = "linux")]
fn serve_clipboard_until_replaced() -> Result<()> {
    let text = std::io::read_to_string(std::io::stdin())?;
    let mut clipboard = Clipboard::new()?;
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Runs the clipboard daemon when the hidden flag is present.
/// Returns Ok(true) if this process was the daemon and should exit.
pub fn check_and_run_daemon_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == DAEMON_FLAG) {
        return Ok(false);
    }
    #[cfg(target_os = "linux")]
    {
        serve_clipboard_until_replaced()?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        tracing::warn!("{DAEMON_FLAG} is only meaningful on Linux; ignoring");
    }
    Ok(true)
}

pub fn copy_directives(lines: &[String]) -> Result<()> {
    let mut text = lines.join("\n");
    text.push('\n');

    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new().context("clipboard unavailable")?;
        clipboard.set_text(text).context("failed to set clipboard text")?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()
            .context("failed to start clipboard daemon")?;

        let Some(mut stdin) = child.stdin.take() else {
            anyhow::bail!("failed to get stdin for clipboard daemon");
        };
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
        debug!(pid = child.id(), "handed directives to clipboard daemon");
    }
    Ok(())
}
