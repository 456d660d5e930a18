// 🎛️ Petty cash controller - one owner for all session state
//
// UI events become `Command`s; `dispatch` applies the state transition and
// answers with what the rendering layer has to redraw.

use crate::export::{self, ExportError, Preview};
use crate::filter::FilterState;
use crate::names::NameBook;
use crate::record::{RecordId, RecordStore, StatusFlag, ValidationError};
use crate::slots::{CapacityError, MinimumSlotError, SlotNumber, TemplateStore};
use crate::storage::KeyValueStore;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetInputName(String),
    SetInputDate(String),
    SetInputAmount(String),
    SetInputStatus(StatusFlag),
    ToggleStatus(RecordId),
    Commit,
    Delete(RecordId),
    /// `confirmed` is the user's answer to "clear everything?"
    ClearAll { confirmed: bool },
    SetFilter(FilterState),
    ImportNames(String),
    SetTemplate { slot: SlotNumber, text: String },
    AddSlot,
    DeleteSlot(SlotNumber),
    SwitchSlot(SlotNumber),
    SelectExportSlot(SlotNumber),
}

/// What the rendering layer should refresh after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// Row list and preview
    Records,
    /// Preview only (input edits, template or filter changes)
    Preview,
    /// Slot buttons, editor text and preview
    Slots,
    /// Name suggestions
    Names,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    MinimumSlot(#[from] MinimumSlotError),
}

// ============================================================================
// CONTROLLER
// ============================================================================

pub struct PettyCash {
    pub records: RecordStore,
    pub templates: TemplateStore,
    pub filter: FilterState,
    pub names: NameBook,
}

impl PettyCash {
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        PettyCash {
            records: RecordStore::new(),
            templates: TemplateStore::load(storage),
            filter: FilterState::default(),
            names: NameBook::new(),
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Render, AppError> {
        tracing::trace!(?command, "dispatch");
        let render = match command {
            Command::SetInputName(name) => {
                self.records.set_input_name(name);
                Render::Names
            }
            Command::SetInputDate(date) => {
                self.records.set_input_date(date);
                Render::Preview
            }
            Command::SetInputAmount(amount) => {
                self.records.set_input_amount(amount);
                Render::Preview
            }
            Command::SetInputStatus(status) => {
                self.records.set_input_status(status);
                Render::Records
            }
            Command::ToggleStatus(id) => {
                self.records.toggle_status(id);
                Render::Records
            }
            Command::Commit => {
                self.records.commit_input()?;
                Render::Records
            }
            Command::Delete(id) => {
                self.records.delete_record(id);
                Render::Records
            }
            Command::ClearAll { confirmed } => {
                if !confirmed {
                    return Ok(Render::Nothing);
                }
                self.records.clear_all();
                Render::Records
            }
            Command::SetFilter(filter) => {
                self.filter = filter;
                Render::Records
            }
            Command::ImportNames(text) => {
                self.names.import(&text);
                Render::Names
            }
            Command::SetTemplate { slot, text } => {
                self.templates.set_template(slot, &text);
                Render::Slots
            }
            Command::AddSlot => {
                self.templates.add_slot()?;
                Render::Slots
            }
            Command::DeleteSlot(slot) => {
                self.templates.delete_slot(slot)?;
                Render::Slots
            }
            Command::SwitchSlot(slot) => {
                self.templates.switch_slot(slot);
                Render::Slots
            }
            Command::SelectExportSlot(slot) => {
                self.templates.select_export_slot(slot);
                Render::Preview
            }
        };
        Ok(render)
    }

    /// Preview of committed rows under the current filter and export slot
    pub fn preview(&self) -> Preview {
        export::format_preview(
            self.records.committed(),
            self.filter,
            self.templates.export_template(),
        )
    }

    /// Download text: all complete committed rows, filter ignored
    pub fn export_bundle(&self) -> String {
        export::format_export_bundle(self.records.committed(), self.templates.export_template())
    }

    pub fn export_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        export::write_export(dir, &self.export_bundle())
    }

    /// Suggestions for the input row's name box
    pub fn name_suggestions(&self) -> Vec<&str> {
        let input = self.records.input();
        let used = self.records.used_names(Some(input.id));
        self.names.suggest(&input.name, &used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, TEMPLATE_SLOTS_KEY};
    use crate::template::DEFAULT_TEMPLATE;

    fn app() -> PettyCash {
        PettyCash::new(Rc::new(MemoryStore::new()))
    }

    fn enter(app: &mut PettyCash, name: &str, date: &str, status: StatusFlag, amount: &str) {
        app.dispatch(Command::SetInputName(name.into())).unwrap();
        app.dispatch(Command::SetInputDate(date.into())).unwrap();
        app.dispatch(Command::SetInputStatus(status)).unwrap();
        app.dispatch(Command::SetInputAmount(amount.into())).unwrap();
    }

    #[test]
    fn test_commit_flow_with_default_template() {
        let mut app = app();
        enter(&mut app, "陳大文", "2024-01-01", StatusFlag::Deficit, "50");

        assert_eq!(app.dispatch(Command::Commit), Ok(Render::Records));

        let preview = app.preview();
        assert_eq!(preview.blocks.len(), 1);
        assert_eq!(preview.blocks[0].dollar_part, "--$50");
        assert!(preview.plain_text.contains("為--$50。"));
        assert_eq!(app.records.input().date, "2024-01-01");
    }

    #[test]
    fn test_validation_errors_surface() {
        let mut app = app();
        assert_eq!(
            app.dispatch(Command::Commit),
            Err(AppError::Validation(ValidationError::EmptyName))
        );
        app.dispatch(Command::SetInputName("A".into())).unwrap();
        assert_eq!(
            app.dispatch(Command::Commit),
            Err(AppError::Validation(ValidationError::EmptyDate))
        );
        assert!(app.records.is_empty());
    }

    #[test]
    fn test_clear_all_needs_confirmation() {
        let mut app = app();
        enter(&mut app, "A", "2024-01-01", StatusFlag::Balance, "1");
        app.dispatch(Command::Commit).unwrap();

        assert_eq!(app.dispatch(Command::ClearAll { confirmed: false }), Ok(Render::Nothing));
        assert_eq!(app.records.len(), 1);

        app.dispatch(Command::ClearAll { confirmed: true }).unwrap();
        assert!(app.records.is_empty());
        assert!(app.records.input().date.is_empty());
    }

    #[test]
    fn test_filter_changes_preview_not_bundle() {
        let mut app = app();
        enter(&mut app, "A", "2024-01-01", StatusFlag::Deficit, "1");
        app.dispatch(Command::Commit).unwrap();
        enter(&mut app, "B", "2024-01-01", StatusFlag::Balance, "2");
        app.dispatch(Command::Commit).unwrap();

        app.dispatch(Command::SetFilter(FilterState::Unflagged)).unwrap();
        assert_eq!(app.preview().blocks.len(), 1);
        assert_eq!(app.export_bundle().matches("Helping Hand").count(), 2);
    }

    #[test]
    fn test_slot_commands_use_export_slot() {
        let storage = Rc::new(MemoryStore::new());
        let mut app = PettyCash::new(storage.clone());
        enter(&mut app, "A", "2024-01-01", StatusFlag::Deficit, "9");
        app.dispatch(Command::Commit).unwrap();

        assert_eq!(app.dispatch(Command::AddSlot), Ok(Render::Slots));
        app.dispatch(Command::SetTemplate { slot: 2, text: "{name}={dollarPart}".into() })
            .unwrap();
        assert_eq!(app.preview().plain_text, "A=--$9");

        app.dispatch(Command::SelectExportSlot(1)).unwrap();
        assert!(app.preview().plain_text.contains("Helping Hand"));

        app.dispatch(Command::AddSlot).unwrap();
        app.dispatch(Command::AddSlot).unwrap();
        assert_eq!(
            app.dispatch(Command::AddSlot),
            Err(AppError::Capacity(CapacityError))
        );

        app.dispatch(Command::DeleteSlot(1)).unwrap();
        assert_eq!(app.templates.export_slot(), 1);
        assert_eq!(app.templates.get_template(1), "{name}={dollarPart}");
        assert!(storage.get(TEMPLATE_SLOTS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_delete_final_slot_refused() {
        let mut app = app();
        assert_eq!(
            app.dispatch(Command::DeleteSlot(1)),
            Err(AppError::MinimumSlot(MinimumSlotError))
        );
        assert_eq!(app.templates.get_template(1), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_name_suggestions_hide_used_names() {
        let mut app = app();
        app.dispatch(Command::ImportNames("陳大文\n陳小芬\n李小明".into())).unwrap();
        enter(&mut app, "陳大文", "2024-01-01", StatusFlag::Balance, "");
        app.dispatch(Command::Commit).unwrap();

        app.dispatch(Command::SetInputName("陳".into())).unwrap();
        assert_eq!(app.name_suggestions(), vec!["陳小芬"]);
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let app = app();
        assert!(matches!(app.export_to(dir.path()), Err(ExportError::NothingToExport)));

        let mut app = app;
        enter(&mut app, "A", "2024-01-01", StatusFlag::Balance, "3");
        app.dispatch(Command::Commit).unwrap();
        let path = app.export_to(dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, app.export_bundle());
    }
}
