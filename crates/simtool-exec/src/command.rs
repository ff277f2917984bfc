//! Program invocations without a shell

use std::fmt;

use serde::{Deserialize, Serialize};

/// A program and its arguments
///
/// Commands are spawned directly rather than through `sh -c`, so the same
/// value works on Linux, macOS and Windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    /// Program name or path
    pub program: String,
    /// Arguments passed verbatim
    pub args: Vec<String>,
    /// Extra environment variables for the child process
    #[serde(default)]
    pub env: Vec<(String, String)>,
}

impl CommandLine {
    /// Create a command for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run this command through `sudo` when `use_sudo` is set
    ///
    /// sudo resets the environment of the program it runs, so variables are
    /// passed as `KEY=VALUE` arguments to sudo instead of being set on it.
    #[must_use]
    pub fn with_sudo(self, use_sudo: bool) -> Self {
        if !use_sudo {
            return self;
        }
        let mut args = Vec::with_capacity(self.env.len() + self.args.len() + 1);
        args.extend(self.env.into_iter().map(|(key, value)| format!("{key}={value}")));
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".to_string(),
            args,
            env: Vec::new(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_whitespace() {
        let cmd = CommandLine::new("rpm").args(["-q", "--queryformat", "%{VERSION} %{RELEASE}"]);
        assert_eq!(cmd.to_string(), "rpm -q --queryformat \"%{VERSION} %{RELEASE}\"");
    }

    #[test]
    fn test_display_includes_env() {
        let cmd = CommandLine::new("apt-cache")
            .args(["policy", "ngspice"])
            .env("LC_ALL", "C");
        assert_eq!(cmd.to_string(), "LC_ALL=C apt-cache policy ngspice");
    }

    #[test]
    fn test_with_sudo_prefixes_program() {
        let cmd = CommandLine::new("apt-get")
            .args(["install", "-y", "ngspice"])
            .with_sudo(true);

        assert_eq!(cmd.program, "sudo");
        assert_eq!(cmd.args, vec!["apt-get", "install", "-y", "ngspice"]);
    }

    #[test]
    fn test_with_sudo_passes_env_to_target() {
        let cmd = CommandLine::new("apt-get")
            .args(["install", "-y", "ngspice"])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .with_sudo(true);

        assert_eq!(cmd.program, "sudo");
        assert_eq!(
            cmd.args,
            vec!["DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y", "ngspice"]
        );
        assert!(cmd.env.is_empty());
        assert_eq!(
            cmd.to_string(),
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y ngspice"
        );
    }

    #[test]
    fn test_without_sudo_is_unchanged() {
        let cmd = CommandLine::new("brew").arg("list").with_sudo(false);
        assert_eq!(cmd, CommandLine::new("brew").arg("list"));
    }
}
