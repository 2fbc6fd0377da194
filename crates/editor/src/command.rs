use folio_markup::ExecCommand;
use serde::Serialize;

use crate::field::FieldId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Format(ExecCommand),
    Undo,
    Redo,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Format(command) => command.name(),
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }

    /// Toolbar formatting keeps the selection so several styles can be
    /// stacked; link edits and history steps drop it.
    pub fn keeps_selection(&self) -> bool {
        match self {
            Command::Format(ExecCommand::CreateLink(_) | ExecCommand::Unlink) => false,
            Command::Format(_) => true,
            Command::Undo | Command::Redo => false,
        }
    }
}

impl From<ExecCommand> for Command {
    fn from(command: ExecCommand) -> Self {
        Command::Format(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied { field: FieldId, html: String },
    /// The link control opened its URL input instead of running a command.
    AwaitingLink { prefill: String },
    /// Nothing to act on: no usable selection or field.
    Skipped,
    Failed { reason: String },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied { .. })
    }
}
