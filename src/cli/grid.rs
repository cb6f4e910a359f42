use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::editor::{EditSession, EditSurface};
use crate::error::Result;
use crate::models::Dataset;
use crate::schema::{cell_text, DisplayFormat, Field};
use crate::tui::{ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

enum GridMode {
    Normal,
    EditCell(String),
}

pub enum GridAction {
    Continue,
    /// Hand the working copy back as a replacement for the canonical dataset.
    Submit(Dataset),
    /// Throw local edits away.
    Revert,
}

/// Editable table over one surface's working copy.
pub struct DataGrid {
    edit: EditSession,
    selected: usize,
    column: usize,
    mode: GridMode,
    dirty: bool,
    status_message: Option<String>,
    table_state: TableState,
}

impl DataGrid {
    pub fn new(surface: EditSurface, canonical: &Dataset) -> Result<Self> {
        Ok(Self {
            edit: EditSession::new(surface, canonical)?,
            selected: 0,
            column: 0,
            mode: GridMode::Normal,
            dirty: false,
            status_message: None,
            table_state: TableState::default(),
        })
    }

    pub fn surface(&self) -> EditSurface {
        self.edit.surface()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, GridMode::EditCell(_))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-copy the canonical dataset, dropping local edits.
    pub fn reset(&mut self, canonical: &Dataset) {
        self.edit.reset(canonical);
        self.mode = GridMode::Normal;
        self.dirty = false;
        self.clamp_selection();
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
    }

    fn row_count(&self) -> usize {
        self.edit.snapshot().len()
    }

    fn current_field(&self) -> Field {
        self.edit.schema().columns()[self.column].field
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.row_count().saturating_sub(1));
    }

    pub fn handle_key(&mut self, code: KeyCode) -> GridAction {
        self.status_message = None;
        if self.is_editing() {
            self.handle_edit_key(code);
            return GridAction::Continue;
        }

        let columns = self.edit.schema().columns().len();
        match code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.row_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.column + 1 < columns {
                    self.column += 1;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.column = self.column.saturating_sub(1);
            }
            KeyCode::PageDown => {
                self.selected = (self.selected + 20).min(self.row_count().saturating_sub(1));
            }
            KeyCode::PageUp => {
                self.selected = self.selected.saturating_sub(20);
            }
            KeyCode::Enter => {
                if let Some(row) = self.edit.snapshot().get(self.selected) {
                    self.mode = GridMode::EditCell(cell_text(row, self.current_field()));
                }
            }
            KeyCode::Char('a') => {
                let at = if self.edit.snapshot().is_empty() { 0 } else { self.selected + 1 };
                let row = self.edit.new_row_template();
                match self.edit.insert_row(at, row) {
                    Ok(()) => {
                        self.selected = at;
                        self.dirty = true;
                    }
                    Err(e) => self.status_message = Some(e.to_string()),
                }
            }
            KeyCode::Char('x') => {
                if self.edit.delete_row(self.selected).is_ok() {
                    self.dirty = true;
                    self.clamp_selection();
                }
            }
            KeyCode::Char('s') => {
                self.dirty = false;
                return GridAction::Submit(self.edit.snapshot().clone());
            }
            KeyCode::Char('u') => {
                return GridAction::Revert;
            }
            _ => {}
        }
        GridAction::Continue
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                if let GridMode::EditCell(input) = &mut self.mode {
                    input.push(c);
                }
            }
            KeyCode::Backspace => {
                if let GridMode::EditCell(input) = &mut self.mode {
                    input.pop();
                }
            }
            KeyCode::Enter => {
                let raw = match std::mem::replace(&mut self.mode, GridMode::Normal) {
                    GridMode::EditCell(input) => input,
                    GridMode::Normal => return,
                };
                let field = self.current_field();
                match self.edit.set_cell(self.selected, field, &raw) {
                    Ok(()) => self.dirty = true,
                    Err(e) => {
                        self.status_message = Some(e.to_string());
                        self.mode = GridMode::EditCell(raw);
                    }
                }
            }
            KeyCode::Esc => self.mode = GridMode::Normal,
            _ => {}
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let [table_area, help_area, keys_area] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let columns = self.edit.schema().columns();
        let widths: Vec<Constraint> = columns
            .iter()
            .map(|c| match c.field {
                Field::Date => Constraint::Length(16),
                Field::Product => Constraint::Fill(1),
                Field::UnitPrice => Constraint::Length(12),
                _ => Constraint::Length(c.label.len().max(9) as u16),
            })
            .collect();

        let header = Row::new(columns.iter().map(|c| Cell::from(c.label.clone())))
            .style(HEADER_STYLE)
            .bottom_margin(1);

        let cell_style = Style::new().add_modifier(Modifier::REVERSED);
        let rows: Vec<Row> = self
            .edit
            .snapshot()
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cells = columns.iter().enumerate().map(|(c, spec)| {
                    let text = match (&self.mode, i == self.selected && c == self.column) {
                        (GridMode::EditCell(input), true) => format!("{input}\u{2588}"),
                        _ => spec.display(row),
                    };
                    let cell = Cell::from(text);
                    if i == self.selected && c == self.column {
                        cell.style(cell_style)
                    } else if spec.format == DisplayFormat::Stars {
                        cell.style(Style::new().fg(ratatui::style::Color::Yellow))
                    } else {
                        cell
                    }
                });
                Row::new(cells)
            })
            .collect();

        self.table_state.select(Some(self.selected));
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        let help = if let Some(msg) = &self.status_message {
            Line::styled(msg.clone(), ERROR_STYLE)
        } else {
            let spec = &columns[self.column];
            let mut text = format!(
                "{} | row {} of {}",
                spec.label,
                self.selected + 1,
                self.row_count()
            );
            if let Some(h) = &spec.help {
                text.push_str(&format!(" | {h}"));
            }
            if self.dirty {
                text.push_str(" | unsaved changes");
            }
            Line::styled(text, FOOTER_STYLE)
        };
        frame.render_widget(Paragraph::new(help), help_area);

        let keys = if self.is_editing() {
            "Enter=apply  Esc=cancel"
        } else {
            "\u{2190}\u{2191}\u{2192}\u{2193}:move  Enter:edit cell  a:add row  x:delete row  s:save  u:undo all"
        };
        frame.render_widget(Paragraph::new(keys).style(FOOTER_STYLE), keys_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use crate::seed::generate_dataset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> Dataset {
        generate_dataset(&mut StdRng::seed_from_u64(11))
    }

    fn type_str(grid: &mut DataGrid, s: &str) {
        for c in s.chars() {
            grid.handle_key(KeyCode::Char(c));
        }
    }

    fn clear_buffer(grid: &mut DataGrid) {
        for _ in 0..32 {
            grid.handle_key(KeyCode::Backspace);
        }
    }

    #[test]
    fn test_edit_cell_and_submit() {
        let data = dataset();
        let mut grid = DataGrid::new(EditSurface::Validated, &data).unwrap();
        // Status column
        for _ in 0..5 {
            grid.handle_key(KeyCode::Right);
        }
        grid.handle_key(KeyCode::Enter);
        assert!(grid.is_editing());
        clear_buffer(&mut grid);
        type_str(&mut grid, "Cancelled");
        grid.handle_key(KeyCode::Enter);
        assert!(!grid.is_editing());
        assert!(grid.is_dirty());

        match grid.handle_key(KeyCode::Char('s')) {
            GridAction::Submit(snapshot) => {
                assert_eq!(snapshot.rows()[0].status, Status::Cancelled);
                assert_eq!(snapshot.len(), data.len());
            }
            _ => panic!("expected submit"),
        }
        assert!(!grid.is_dirty());
    }

    #[test]
    fn test_rejected_edit_keeps_buffer_and_row() {
        let data = dataset();
        let mut grid = DataGrid::new(EditSurface::Validated, &data).unwrap();
        // Rating column
        for _ in 0..6 {
            grid.handle_key(KeyCode::Right);
        }
        grid.handle_key(KeyCode::Enter);
        clear_buffer(&mut grid);
        type_str(&mut grid, "9");
        grid.handle_key(KeyCode::Enter);
        assert!(grid.is_editing());
        assert!(grid.status_message.is_some());
        assert_eq!(grid.edit.snapshot().rows()[0], data.rows()[0]);

        grid.handle_key(KeyCode::Esc);
        assert!(!grid.is_editing());
        assert!(!grid.is_dirty());
    }

    #[test]
    fn test_plain_grid_accepts_any_rating() {
        let data = dataset();
        let mut grid = DataGrid::new(EditSurface::Plain, &data).unwrap();
        for _ in 0..6 {
            grid.handle_key(KeyCode::Right);
        }
        grid.handle_key(KeyCode::Enter);
        clear_buffer(&mut grid);
        type_str(&mut grid, "9");
        grid.handle_key(KeyCode::Enter);
        assert!(!grid.is_editing());
        assert_eq!(grid.edit.snapshot().rows()[0].rating, 9);
    }

    #[test]
    fn test_add_and_delete_rows() {
        let data = dataset();
        let mut grid = DataGrid::new(EditSurface::Plain, &data).unwrap();
        grid.handle_key(KeyCode::Char('a'));
        assert_eq!(grid.row_count(), data.len() + 1);
        assert_eq!(grid.selected, 1);

        grid.handle_key(KeyCode::Char('x'));
        grid.handle_key(KeyCode::Char('x'));
        assert_eq!(grid.row_count(), data.len() - 1);
    }

    #[test]
    fn test_reset_and_revert() {
        let data = dataset();
        let mut grid = DataGrid::new(EditSurface::Plain, &data).unwrap();
        grid.handle_key(KeyCode::Char('x'));
        assert!(matches!(grid.handle_key(KeyCode::Char('u')), GridAction::Revert));
        grid.reset(&data);
        assert_eq!(grid.edit.snapshot(), &data);
        assert!(!grid.is_dirty());
    }

    #[test]
    fn test_navigation_is_bounded() {
        let data = Dataset::new(Vec::new());
        let mut grid = DataGrid::new(EditSurface::Plain, &data).unwrap();
        grid.handle_key(KeyCode::Down);
        grid.handle_key(KeyCode::Enter);
        assert_eq!(grid.selected, 0);
        assert!(!grid.is_editing());
        for _ in 0..20 {
            grid.handle_key(KeyCode::Right);
        }
        assert_eq!(grid.column, Field::ALL.len() - 1);
    }
}
