//! Undo/redo for highlight edits
//!
//! Each [`HighlightCommand`] records what it needs to invert itself when it is
//! applied, so undo and redo are plain state transitions on the
//! [`HighlightModel`]. [`CommandHistory`] keeps the two stacks.

use crate::config::ViewerConfig;
use crate::error::{HistoryError, HistoryResult};
use crate::highlight::{Color, Highlight, HighlightId, HighlightModel};
use log::{debug, info};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum HighlightCommand {
    Add {
        highlight: Highlight,
    },
    Remove {
        id: HighlightId,
        removed: Option<(usize, Highlight)>,
    },
    EditNote {
        id: HighlightId,
        new_note: String,
        old_note: Option<String>,
    },
    ChangeColor {
        id: HighlightId,
        new_color: Color,
        old_color: Option<Color>,
    },
    ChangeOpacity {
        id: HighlightId,
        new_opacity: f32,
        old_opacity: Option<f32>,
    },
    ToggleVisibility {
        id: HighlightId,
    },
    ClearAll {
        removed: Vec<Highlight>,
    },
    RemovePage {
        page_number: u32,
        removed: Vec<(usize, Highlight)>,
    },
    BatchAdd {
        highlights: Vec<Highlight>,
    },
}

impl HighlightCommand {
    pub fn add(highlight: Highlight) -> Self {
        Self::Add { highlight }
    }

    pub fn remove(id: HighlightId) -> Self {
        Self::Remove { id, removed: None }
    }

    pub fn edit_note(id: HighlightId, note: impl Into<String>) -> Self {
        Self::EditNote {
            id,
            new_note: note.into(),
            old_note: None,
        }
    }

    pub fn change_color(id: HighlightId, color: Color) -> Self {
        Self::ChangeColor {
            id,
            new_color: color,
            old_color: None,
        }
    }

    pub fn change_opacity(id: HighlightId, opacity: f32) -> Self {
        Self::ChangeOpacity {
            id,
            new_opacity: opacity,
            old_opacity: None,
        }
    }

    pub fn toggle_visibility(id: HighlightId) -> Self {
        Self::ToggleVisibility { id }
    }

    pub fn clear_all() -> Self {
        Self::ClearAll {
            removed: Vec::new(),
        }
    }

    pub fn remove_page(page_number: u32) -> Self {
        Self::RemovePage {
            page_number,
            removed: Vec::new(),
        }
    }

    pub fn batch_add(highlights: Vec<Highlight>) -> Self {
        Self::BatchAdd { highlights }
    }

    /// Human-readable name for undo/redo menus
    pub fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "Add Highlight",
            Self::Remove { .. } => "Remove Highlight",
            Self::EditNote { .. } => "Edit Highlight Note",
            Self::ChangeColor { .. } => "Change Highlight Color",
            Self::ChangeOpacity { .. } => "Change Highlight Opacity",
            Self::ToggleVisibility { .. } => "Toggle Highlight Visibility",
            Self::ClearAll { .. } => "Clear All Highlights",
            Self::RemovePage { .. } => "Remove Page Highlights",
            Self::BatchAdd { .. } => "Add Highlights",
        }
    }

    /// Perform the command, remembering the state it replaces
    pub fn apply(&mut self, model: &mut HighlightModel) -> HistoryResult<()> {
        match self {
            Self::Add { highlight } => model.add(highlight.clone()),
            Self::Remove { id, removed } => {
                *removed = Some(model.remove_indexed(*id).ok_or(HistoryError::HighlightNotFound(*id))?);
                Ok(())
            }
            Self::EditNote {
                id,
                new_note,
                old_note,
            } => {
                *old_note = Some(
                    model
                        .set_note(*id, new_note.clone())
                        .ok_or(HistoryError::HighlightNotFound(*id))?,
                );
                Ok(())
            }
            Self::ChangeColor {
                id,
                new_color,
                old_color,
            } => {
                *old_color = Some(
                    model
                        .set_color(*id, *new_color)
                        .ok_or(HistoryError::HighlightNotFound(*id))?,
                );
                Ok(())
            }
            Self::ChangeOpacity {
                id,
                new_opacity,
                old_opacity,
            } => {
                *old_opacity = Some(
                    model
                        .set_opacity(*id, *new_opacity)
                        .ok_or(HistoryError::HighlightNotFound(*id))?,
                );
                Ok(())
            }
            Self::ToggleVisibility { id } => model
                .toggle_visibility(*id)
                .map(|_| ())
                .ok_or(HistoryError::HighlightNotFound(*id)),
            Self::ClearAll { removed } => {
                *removed = model.clear();
                Ok(())
            }
            Self::RemovePage {
                page_number,
                removed,
            } => {
                *removed = model.remove_page(*page_number);
                Ok(())
            }
            Self::BatchAdd { highlights } => {
                if let Some(id) = first_conflict(model, highlights.iter()) {
                    return Err(HistoryError::DuplicateHighlight(id));
                }
                for highlight in highlights.iter() {
                    model.add(highlight.clone())?;
                }
                Ok(())
            }
        }
    }

    /// Restore the state captured by the last [`apply`](Self::apply)
    pub fn revert(&mut self, model: &mut HighlightModel) -> HistoryResult<()> {
        match self {
            Self::Add { highlight } => model
                .remove(highlight.id)
                .map(|_| ())
                .ok_or(HistoryError::HighlightNotFound(highlight.id)),
            Self::Remove { id, removed } => {
                let (position, highlight) =
                    removed.take().ok_or(HistoryError::HighlightNotFound(*id))?;
                model.insert_at(position, highlight)
            }
            Self::EditNote { id, old_note, .. } => {
                let note = old_note.clone().unwrap_or_default();
                model
                    .set_note(*id, note)
                    .map(|_| ())
                    .ok_or(HistoryError::HighlightNotFound(*id))
            }
            Self::ChangeColor { id, old_color, .. } => {
                let color = old_color.ok_or(HistoryError::HighlightNotFound(*id))?;
                model
                    .set_color(*id, color)
                    .map(|_| ())
                    .ok_or(HistoryError::HighlightNotFound(*id))
            }
            Self::ChangeOpacity { id, old_opacity, .. } => {
                let opacity = old_opacity.ok_or(HistoryError::HighlightNotFound(*id))?;
                model
                    .set_opacity(*id, opacity)
                    .map(|_| ())
                    .ok_or(HistoryError::HighlightNotFound(*id))
            }
            Self::ToggleVisibility { id } => model
                .toggle_visibility(*id)
                .map(|_| ())
                .ok_or(HistoryError::HighlightNotFound(*id)),
            Self::ClearAll { removed } => {
                if let Some(id) = first_conflict(model, removed.iter()) {
                    return Err(HistoryError::DuplicateHighlight(id));
                }
                for (position, highlight) in removed.drain(..).enumerate() {
                    model.insert_at(position, highlight)?;
                }
                Ok(())
            }
            Self::RemovePage { removed, .. } => {
                if let Some(id) = first_conflict(model, removed.iter().map(|(_, h)| h)) {
                    return Err(HistoryError::DuplicateHighlight(id));
                }
                for (position, highlight) in removed.drain(..) {
                    model.insert_at(position, highlight)?;
                }
                Ok(())
            }
            Self::BatchAdd { highlights } => {
                for highlight in highlights.iter() {
                    model.remove(highlight.id);
                }
                Ok(())
            }
        }
    }

    /// Fold a following command into this one. Consecutive note edits of the
    /// same highlight collapse into a single undo step.
    pub fn merge(&mut self, next: &HighlightCommand) -> bool {
        match (self, next) {
            (
                Self::EditNote { id, new_note, .. },
                Self::EditNote {
                    id: next_id,
                    new_note: next_note,
                    ..
                },
            ) if *id == *next_id => {
                new_note.clone_from(next_note);
                true
            }
            _ => false,
        }
    }
}

/// First id that is already in `model` or repeats within `highlights`
fn first_conflict<'a>(
    model: &HighlightModel,
    highlights: impl IntoIterator<Item = &'a Highlight>,
) -> Option<HighlightId> {
    let mut seen = HashSet::new();
    highlights
        .into_iter()
        .find(|h| model.contains(h.id) || !seen.insert(h.id))
        .map(|h| h.id)
}

/// Bounded undo/redo stacks of highlight commands
#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo_stack: Vec<HighlightCommand>,
    redo_stack: Vec<HighlightCommand>,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl CommandHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// History bounded by the configured `history_limit`
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.history_limit)
    }

    /// Apply a command and record it. A command that fails is not recorded
    /// and leaves the redo stack untouched.
    pub fn execute(
        &mut self,
        model: &mut HighlightModel,
        mut command: HighlightCommand,
    ) -> HistoryResult<()> {
        command.apply(model)?;
        info!("{}", command.label());
        self.redo_stack.clear();

        if let Some(last) = self.undo_stack.last_mut() {
            if last.merge(&command) {
                debug!("merged into previous '{}'", last.label());
                return Ok(());
            }
        }

        self.undo_stack.push(command);
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
        Ok(())
    }

    /// Revert the most recent command. Returns `Ok(false)` when there is
    /// nothing to undo.
    pub fn undo(&mut self, model: &mut HighlightModel) -> HistoryResult<bool> {
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = command.revert(model) {
            self.undo_stack.push(command);
            return Err(err);
        }

        info!("Undo {}", command.label());
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Re-apply the most recently undone command
    pub fn redo(&mut self, model: &mut HighlightModel) -> HistoryResult<bool> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = command.apply(model) {
            self.redo_stack.push(command);
            return Err(err);
        }

        info!("Redo {}", command.label());
        self.undo_stack.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&'static str> {
        self.undo_stack.last().map(HighlightCommand::label)
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.redo_stack.last().map(HighlightCommand::label)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
