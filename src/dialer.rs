use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::config::CommandExec;
use crate::contact;

/// Hands a phone number to whatever places calls on this machine.
pub trait Dialer {
    fn dial(&self, phone: &str) -> Result<()>;
}

/// Launch an opener command with a `tel:` URI.
///
/// Arguments may contain `{uri}` or `{phone}`; when neither appears the URI
/// is appended as the final argument. The child is not waited on.
#[derive(Debug, Clone)]
pub struct CommandDialer {
    command: CommandExec,
    quiet: bool,
}

impl CommandDialer {
    pub fn new(command: CommandExec) -> Self {
        Self {
            command,
            quiet: false,
        }
    }

    /// Detach the child from the terminal so it cannot draw over the UI.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn build_args(&self, phone: &str) -> Vec<String> {
        let uri = contact::tel_uri(phone);
        let mut substituted = false;
        let mut args: Vec<String> = self
            .command
            .args
            .iter()
            .map(|arg| {
                if arg.contains("{uri}") || arg.contains("{phone}") {
                    substituted = true;
                }
                arg.replace("{uri}", &uri).replace("{phone}", phone)
            })
            .collect();
        if !substituted {
            args.push(uri);
        }
        args
    }
}

impl Dialer for CommandDialer {
    fn dial(&self, phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            bail!("contact has no phone number");
        }

        let args = self.build_args(phone);
        debug!(program = %self.command.program, ?args, "opening dialer");

        let mut command = Command::new(&self.command.program);
        command.args(&args).stdin(Stdio::null());
        if self.quiet {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        command
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.command.program))
            .map_err(|err| {
                warn!(error = %err, "dial action failed");
                err
            })?;
        Ok(())
    }
}

/// Opener used when `commands.dial` is not configured.
pub fn default_command() -> CommandExec {
    #[cfg(target_os = "macos")]
    {
        CommandExec {
            program: "open".to_string(),
            args: Vec::new(),
        }
    }
    #[cfg(windows)]
    {
        CommandExec {
            program: "cmd".to_string(),
            args: vec!["/C".to_string(), "start".to_string(), String::new()],
        }
    }
    #[cfg(not(any(target_os = "macos", windows)))]
    {
        CommandExec {
            program: "xdg-open".to_string(),
            args: Vec::new(),
        }
    }
}
