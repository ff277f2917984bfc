//! Scripted executor for driver tests

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use simtool_exec::{CommandExecutor, CommandLine, CommandResult, ExecError};

/// Answers commands from a fixed script and records what was run
///
/// Commands are matched on program and arguments joined by single spaces,
/// ignoring environment variables. Unscripted commands exit with status 1.
pub(crate) struct ScriptedExecutor {
    programs: HashSet<String>,
    responses: HashMap<String, CommandResult>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub(crate) fn new(programs: &[&str]) -> Self {
        Self {
            programs: programs.iter().map(|p| (*p).to_string()).collect(),
            responses: HashMap::new(),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond(mut self, command: &str, status: i32, stdout: &str, stderr: &str) -> Self {
        self.responses
            .insert(command.to_string(), CommandResult::new(status, stdout, stderr));
        self
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn key(cmd: &CommandLine) -> String {
        std::iter::once(cmd.program.as_str())
            .chain(cmd.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, cmd: &CommandLine) -> Result<CommandResult, ExecError> {
        self.commands.lock().unwrap().push(cmd.to_string());
        Ok(self
            .responses
            .get(&Self::key(cmd))
            .cloned()
            .unwrap_or_else(|| CommandResult::new(1, "", format!("unscripted: {cmd}"))))
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.programs
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}
