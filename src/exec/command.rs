//! Command descriptions
//!
//! A `CommandSpec` is everything needed to run one external program and to
//! show an operator exactly what was run. Secrets travel through the
//! child's environment or stdin and never appear in the rendered form.

use crate::config::Secret;

/// Exit status reported when a process was killed by a signal
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Exit status reported when the child exited before reading all of its stdin
pub const STDIN_FAILED_EXIT_CODE: i32 = -2;

/// One external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    description: String,
    program: String,
    args: Vec<String>,
    sudo: bool,
    check: bool,
    env: Vec<(String, Secret)>,
    stdin: Option<Secret>,
}

impl CommandSpec {
    /// A checked, non-sudo command
    pub fn new(description: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            program: program.into(),
            args: Vec::new(),
            sudo: false,
            check: true,
            env: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run through sudo
    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Do not fail on non-zero exit
    pub fn unchecked(mut self) -> Self {
        self.check = false;
        self
    }

    /// Pass a secret through the child's environment
    pub fn secret_env(mut self, name: impl Into<String>, value: Secret) -> Self {
        self.env.push((name.into(), value));
        self
    }

    /// Feed `input` to the child's stdin. Used for SQL carrying a password.
    pub fn secret_stdin(mut self, input: Secret) -> Self {
        self.stdin = Some(input);
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_checked(&self) -> bool {
        self.check
    }

    pub fn env(&self) -> &[(String, Secret)] {
        &self.env
    }

    pub fn stdin(&self) -> Option<&Secret> {
        self.stdin.as_ref()
    }

    /// Program and arguments as actually executed, sudo included
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if self.sudo {
            argv.push("sudo".to_string());
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Shell-style rendering for logs and dry runs
    pub fn render(&self) -> String {
        self.argv()
            .iter()
            .map(|a| quote(a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Single-quote an argument if a shell would split or expand it
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));

    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `SIGNAL_EXIT_CODE` if the process was killed
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_sudo() {
        let spec = CommandSpec::new("Stopping MySQL instance", "systemctl")
            .args(["stop", "mysqld@mysql1"])
            .sudo(true);
        assert_eq!(spec.render(), "sudo systemctl stop mysqld@mysql1");
        assert_eq!(spec.argv(), vec!["sudo", "systemctl", "stop", "mysqld@mysql1"]);
    }

    #[test]
    fn test_render_without_sudo() {
        let spec = CommandSpec::new("chmod", "chmod").args(["750", "/u01/data"]);
        assert_eq!(spec.render(), "chmod 750 /u01/data");
    }

    #[test]
    fn test_render_quotes_statements() {
        let spec = CommandSpec::new("sql", "mysql").args(["-e", "STOP REPLICA;"]);
        assert_eq!(spec.render(), "mysql -e 'STOP REPLICA;'");

        let spec = CommandSpec::new("sql", "mysql").args(["-e", "SOURCE_HOST='h'"]);
        assert_eq!(spec.render(), r"mysql -e 'SOURCE_HOST='\''h'\'''");
    }

    #[test]
    fn test_secret_env_not_rendered() {
        let spec = CommandSpec::new("sql", "mysql")
            .arg("-uroot")
            .secret_env("MYSQL_PWD", Secret::new("hunter2"));
        assert!(!spec.render().contains("hunter2"));
        assert!(!format!("{:?}", spec).contains("hunter2"));
        assert_eq!(spec.env().len(), 1);
    }

    #[test]
    fn test_secret_stdin_not_rendered() {
        let spec = CommandSpec::new("sql", "mysql")
            .args(["-h", "127.0.0.1"])
            .secret_stdin(Secret::new("SOURCE_PASSWORD='hunter2'"));
        assert_eq!(spec.render(), "mysql -h 127.0.0.1");
        assert!(!format!("{:?}", spec).contains("hunter2"));
        assert!(spec.stdin().is_some());
    }

    #[test]
    fn test_checked_by_default() {
        let spec = CommandSpec::new("status", "systemctl");
        assert!(spec.is_checked());
        assert!(!spec.unchecked().is_checked());
    }

    #[test]
    fn test_output_success() {
        assert!(CommandOutput::success().is_success());
        assert!(!CommandOutput::failure(3, "inactive").is_success());
        assert!(!CommandOutput::failure(SIGNAL_EXIT_CODE, "").is_success());
    }
}
