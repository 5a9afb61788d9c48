use std::collections::VecDeque;

use tokio::sync::mpsc::UnboundedSender;

use crate::types::alert::ActionAlert;
use crate::types::errors::TabError;

use super::space_manager::SpaceManager;
use super::tab_commands::TabCommand;

/// Default number of commands that can be undone.
pub const DEFAULT_MAX_STACK_SIZE: usize = 20;

const UNDO_ICON: &str = "arrow.uturn.backward";
const REDO_ICON: &str = "arrow.uturn.forward";
const FALLBACK_DESCRIPTION: &str = "Close Tab";

/// Trait defining the undo/redo interface for tab commands.
pub trait TabUndoManagerTrait {
    /// Runs and records a command. An `Err` (`NotFound`, `SpaceNotFound`)
    /// means the command changed nothing and was not recorded, so a `close`
    /// or `clear` routed through here can fail without touching the space.
    fn execute(&mut self, command: TabCommand, spaces: &mut SpaceManager) -> Result<(), TabError>;
    fn undo(&mut self, spaces: &mut SpaceManager) -> Option<ActionAlert>;
    fn redo(&mut self, spaces: &mut SpaceManager) -> Option<ActionAlert>;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn undo_description(&self) -> String;
    fn redo_description(&self) -> String;
}

/// Linear undo history of tab commands.
///
/// The undo stack is bounded; once it grows past the limit the oldest entry is
/// dropped. The redo stack is never trimmed, only cleared when a new command
/// runs.
pub struct TabUndoManager {
    undo_stack: VecDeque<TabCommand>,
    redo_stack: Vec<TabCommand>,
    max_stack_size: usize,
    alerts: Option<UnboundedSender<ActionAlert>>,
}

impl TabUndoManager {
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            alerts: None,
        }
    }

    /// Overrides the undo depth. A size of zero is treated as one.
    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = max_stack_size.max(1);
        self
    }

    /// Also pushes every undo/redo alert into `sender`.
    pub fn with_alert_sender(mut self, sender: UnboundedSender<ActionAlert>) -> Self {
        self.alerts = Some(sender);
        self
    }

    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// Changes the undo depth, dropping the oldest entries if it shrank.
    pub fn set_max_stack_size(&mut self, max_stack_size: usize) {
        self.max_stack_size = max_stack_size.max(1);
        self.trim();
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drops all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn emit(&self, alert: &ActionAlert) {
        if let Some(sender) = &self.alerts {
            if sender.send(alert.clone()).is_err() {
                log::debug!("Alert receiver dropped, '{}' not delivered", alert.message);
            }
        }
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_stack_size {
            if let Some(evicted) = self.undo_stack.pop_front() {
                log::debug!("Undo history full, forgetting '{}'", evicted.description());
            }
        }
    }
}

impl Default for TabUndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabUndoManagerTrait for TabUndoManager {
    /// Runs `command` and records it.
    ///
    /// Fails with `TabError::NotFound` when none of the command's tabs are in
    /// the space anymore, or `TabError::SpaceNotFound` when the space itself is
    /// gone. In both cases nothing was changed: the command is not recorded
    /// and the redo stack is left alone.
    fn execute(&mut self, command: TabCommand, spaces: &mut SpaceManager) -> Result<(), TabError> {
        if let Err(e) = command.execute(spaces) {
            log::warn!("'{}' failed: {}", command.description(), e);
            return Err(e);
        }
        log::info!("{}", command.description());
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        self.trim();
        Ok(())
    }

    fn undo(&mut self, spaces: &mut SpaceManager) -> Option<ActionAlert> {
        let message = self.undo_description();
        let command = self.undo_stack.pop_back()?;
        let outcome = command.undo(spaces);
        self.redo_stack.push(command);

        match outcome {
            Ok(()) => {
                log::info!("{}", message);
                let alert = ActionAlert::new(message, UNDO_ICON);
                self.emit(&alert);
                Some(alert)
            }
            Err(e) => {
                log::warn!("{} failed: {}", message, e);
                None
            }
        }
    }

    fn redo(&mut self, spaces: &mut SpaceManager) -> Option<ActionAlert> {
        let message = self.redo_description();
        let command = self.redo_stack.pop()?;
        let outcome = command.execute(spaces);
        self.undo_stack.push_back(command);
        self.trim();

        match outcome {
            Ok(()) => {
                log::info!("{}", message);
                let alert = ActionAlert::new(message, REDO_ICON);
                self.emit(&alert);
                Some(alert)
            }
            Err(e) => {
                log::warn!("{} failed: {}", message, e);
                None
            }
        }
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo_description(&self) -> String {
        let description = self
            .undo_stack
            .back()
            .map(TabCommand::description)
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());
        format!("Undo {}", description)
    }

    fn redo_description(&self) -> String {
        let description = self
            .redo_stack
            .last()
            .map(TabCommand::description)
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());
        format!("Redo {}", description)
    }
}
