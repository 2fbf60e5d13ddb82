//! Session state and input handling

use adls_meta_core::{Field, FormInputs, Outcome, Pipeline};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use crate::format;
use crate::tui::event::Event;

/// Which half of the screen receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Form,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// Messages sent back to the app by background runs
#[derive(Debug)]
pub enum Message {
    RunFinished { run_id: u64, outcome: Outcome },
}

/// Everything the form remembers between renders
pub struct App {
    pub running: bool,

    pub focus: Focus,

    pub popup: Popup,

    /// Current form values
    pub inputs: FormInputs,

    /// Field being edited
    pub field: Field,

    /// Cursor position in the field, in chars
    pub cursor: usize,

    /// Whether the client secret is shown in clear text
    pub show_secret: bool,

    /// Profile the form was prefilled from
    pub profile: Option<String>,

    pub pipeline: Pipeline,

    /// A run is in flight
    pub loading: bool,

    /// Incremented on each run; results from older runs are dropped
    pub current_run_id: u64,

    /// Result of the last completed run
    pub outcome: Option<Outcome>,

    /// Selected row in the results table
    pub result_index: usize,

    pub error_message: Option<String>,

    pub status_message: Option<String>,

    pub event_tx: Option<mpsc::UnboundedSender<Event>>,

    /// Layout areas for mouse handling (updated during render)
    pub form_area: Rect,
    pub results_area: Rect,
    pub results_scroll_offset: usize,
}

impl App {
    pub fn new(inputs: FormInputs, profile: Option<String>, pipeline: Pipeline) -> Self {
        // Start on the first field that still needs a value
        let field = inputs.missing().first().copied().unwrap_or(Field::VaultUrl);
        let cursor = inputs.get(field).chars().count();

        Self {
            running: true,
            focus: Focus::Form,
            popup: Popup::None,
            inputs,
            field,
            cursor,
            show_secret: false,
            profile,
            pipeline,
            loading: false,
            current_run_id: 0,
            outcome: None,
            result_index: 0,
            error_message: None,
            status_message: None,
            event_tx: None,
            form_area: Rect::default(),
            results_area: Rect::default(),
            results_scroll_offset: 0,
        }
    }

    pub fn set_event_tx(&mut self, tx: mpsc::UnboundedSender<Event>) {
        self.event_tx = Some(tx);
    }

    /// Get byte index from character index (UTF-8 safe)
    fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
        s.char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    }

    fn field_len(&self) -> usize {
        self.inputs.get(self.field).chars().count()
    }

    /// Number of rows in the last result
    pub fn result_len(&self) -> usize {
        self.outcome
            .as_ref()
            .and_then(Outcome::table)
            .map_or(0, |t| t.len())
    }

    /// Validate the form and start a run in the background
    pub fn submit(&mut self) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };

        // Invalidate any run still in flight
        self.current_run_id = self.current_run_id.wrapping_add(1);
        let run_id = self.current_run_id;

        self.loading = true;
        self.status_message = None;

        let pipeline = self.pipeline.clone();
        let inputs = self.inputs.clone();

        tokio::spawn(async move {
            let outcome = pipeline.run(&inputs).await;
            let _ = tx.send(Event::Message(Message::RunFinished { run_id, outcome }));
        });
    }

    pub fn handle_message(&mut self, msg: Message) {
        match msg {
            Message::RunFinished { run_id, outcome } => {
                if run_id != self.current_run_id {
                    return;
                }
                self.loading = false;
                self.result_index = 0;
                self.error_message = outcome.error().map(format::error_message);
                if let Some(table) = outcome.table()
                    && !table.is_empty()
                {
                    self.status_message = Some(format!(
                        "Found {} files, {} bytes",
                        table.len(),
                        table.total_size()
                    ));
                }
                self.outcome = Some(outcome);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        // Any key dismisses the error popup
        if self.error_message.is_some() {
            self.error_message = None;
            return;
        }

        if self.popup == Popup::Help {
            self.popup = Popup::None;
            return;
        }

        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::F(1) => self.popup = Popup::Help,
            KeyCode::F(5) => self.submit(),
            _ => match self.focus {
                Focus::Form => self.handle_form_key(key),
                Focus::Results => self.handle_results_key(key),
            },
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::Down => {
                let last = self.field == Field::DirectoryPath;
                if last && key.code == KeyCode::Tab && self.result_len() > 0 {
                    self.focus = Focus::Results;
                } else {
                    self.select_field(self.field.next());
                }
            }
            KeyCode::BackTab | KeyCode::Up => self.select_field(self.field.prev()),
            KeyCode::Char('r') if ctrl => self.show_secret = !self.show_secret,
            KeyCode::Char('u') if ctrl => {
                self.inputs.get_mut(self.field).clear();
                self.cursor = 0;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let value = self.inputs.get_mut(self.field);
                    let idx = Self::char_to_byte_index(value, self.cursor - 1);
                    value.remove(idx);
                    self.cursor -= 1;
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.field_len() {
                    let value = self.inputs.get_mut(self.field);
                    let idx = Self::char_to_byte_index(value, self.cursor);
                    value.remove(idx);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.field_len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.field_len(),
            KeyCode::Char(c) if !ctrl => {
                let cursor = self.cursor;
                let value = self.inputs.get_mut(self.field);
                let idx = Self::char_to_byte_index(value, cursor);
                value.insert(idx, c);
                self.cursor += 1;
            }
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = Focus::Form;
            }
            KeyCode::Char('?') => self.popup = Popup::Help,
            KeyCode::Enter | KeyCode::Char('r') => self.submit(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(10),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::Char('g') | KeyCode::Home => self.result_index = 0,
            KeyCode::Char('G') | KeyCode::End => {
                self.result_index = self.result_len().saturating_sub(1);
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.popup != Popup::None || self.error_message.is_some() {
            if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                self.popup = Popup::None;
                self.error_message = None;
            }
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let (x, y) = (mouse.column, mouse.row);
                if Self::is_in_area(x, y, self.form_area) {
                    // One field per line inside the border
                    let line = y.saturating_sub(self.form_area.y + 1) as usize;
                    if let Some(field) = Field::iter().nth(line) {
                        self.focus = Focus::Form;
                        self.select_field(field);
                    }
                } else if Self::is_in_area(x, y, self.results_area) {
                    self.focus = Focus::Results;
                    // Border plus header row
                    let relative_y = y.saturating_sub(self.results_area.y + 2) as usize;
                    let index = self.results_scroll_offset + relative_y;
                    if index < self.result_len() {
                        self.result_index = index;
                    }
                }
            }
            MouseEventKind::ScrollDown => self.move_selection(1),
            MouseEventKind::ScrollUp => self.move_selection(-1),
            _ => {}
        }
    }

    fn is_in_area(x: u16, y: u16, area: Rect) -> bool {
        x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
    }

    fn select_field(&mut self, field: Field) {
        self.field = field;
        self.cursor = self.field_len();
    }

    fn move_selection(&mut self, delta: i32) {
        let len = self.result_len();
        if len == 0 {
            return;
        }
        let new_index = self.result_index as i64 + delta as i64;
        self.result_index = new_index.clamp(0, len as i64 - 1) as usize;
    }
}
