use std::path::Path;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("could not start print command `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("print command `{command}` exited with {status}")]
    Exit { command: String, status: String },
}

#[async_trait]
pub trait Printer: Send + Sync {
    async fn print(&self, file: &Path) -> Result<(), PrintError>;
}

/// Runs `<command> <file>`, e.g. `lp /tmp/partyprints/<id>.jpg` under CUPS.
pub struct CommandPrinter {
    command: String,
}

impl CommandPrinter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Printer for CommandPrinter {
    async fn print(&self, file: &Path) -> Result<(), PrintError> {
        let status = tokio::process::Command::new(&self.command)
            .arg(file)
            .status()
            .await
            .map_err(|source| PrintError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(PrintError::Exit {
                command: self.command.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_command_is_a_spawn_error() {
        let printer = CommandPrinter::new("partyprint-no-such-command");
        let err = printer.print(Path::new("/tmp/x.jpg")).await.unwrap_err();
        assert!(matches!(err, PrintError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_is_checked() {
        assert!(CommandPrinter::new("true").print(Path::new("x")).await.is_ok());

        let err = CommandPrinter::new("false")
            .print(Path::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, PrintError::Exit { .. }));
    }
}
