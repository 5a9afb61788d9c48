// Tabspace state managers
// Managers own the spaces, their tabs and the undo history of tab commands.

pub mod space_manager;
pub mod tab_commands;
pub mod undo_manager;
