//! UI rendering

use adls_meta_core::{Field, NO_FILES_MESSAGE};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use strum::IntoEnumIterator;
use unicode_width::UnicodeWidthStr;

use crate::format;
use crate::tui::app::{App, Focus, Popup};

/// Width of the label column in the form
const LABEL_WIDTH: usize = 37;

/// Color palette that respects --no-color flag
struct Colors;

impl Colors {
    fn pick(color: Color) -> Color {
        if console::colors_enabled() {
            color
        } else {
            Color::Reset
        }
    }

    fn cyan() -> Color {
        Self::pick(Color::Cyan)
    }

    fn yellow() -> Color {
        Self::pick(Color::Yellow)
    }

    fn green() -> Color {
        Self::pick(Color::Green)
    }

    fn red() -> Color {
        Self::pick(Color::Red)
    }

    fn dark_gray() -> Color {
        Self::pick(Color::DarkGray)
    }

    fn white() -> Color {
        Self::pick(Color::White)
    }
}

/// Render the entire UI
pub fn render(app: &mut App, frame: &mut Frame) {
    let form_height = Field::iter().count() as u16 + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),           // Header
            Constraint::Length(form_height), // Form
            Constraint::Min(0),              // Results
            Constraint::Length(3),           // Status bar
            Constraint::Length(1),           // Keybindings
        ])
        .split(frame.area());

    // Save layout areas for mouse click detection
    app.form_area = chunks[1];
    app.results_area = chunks[2];

    render_header(app, frame, chunks[0]);
    render_form(app, frame, chunks[1]);
    render_results(app, frame, chunks[2]);
    render_status(app, frame, chunks[3]);
    render_keybindings(app, frame, chunks[4]);

    if app.popup == Popup::Help {
        render_help_popup(frame);
    }

    // Render error popup if present (on top of everything)
    if let Some(ref error) = app.error_message {
        render_error_popup(frame, error);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut title = " ALPINE - ADLS File Metadata Viewer ".to_string();
    if let Some(ref profile) = app.profile {
        title.push_str(&format!("│ Profile: {} ", profile));
    }

    let header = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Colors::cyan())
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

/// Text shown for a field, masked unless the secret is revealed
fn display_value(app: &App, field: Field) -> String {
    let value = app.inputs.get(field);
    if field.is_masked() && !app.show_secret {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    }
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let is_focused = app.focus == Focus::Form;

    let lines: Vec<Line> = Field::iter()
        .map(|field| {
            let selected = is_focused && field == app.field;
            let label_style = if selected {
                Style::default()
                    .fg(Colors::yellow())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Colors::cyan())
            };
            let marker = if selected { "> " } else { "  " };

            Line::from(vec![
                Span::styled(
                    format!("{}{:<width$}", marker, field.label(), width = LABEL_WIDTH),
                    label_style,
                ),
                Span::styled(
                    display_value(app, field),
                    Style::default().fg(Colors::white()),
                ),
            ])
        })
        .collect();

    let border_style = if is_focused {
        Style::default().fg(Colors::cyan())
    } else {
        Style::default().fg(Colors::dark_gray())
    };

    let form = Paragraph::new(lines).block(
        Block::default()
            .title(" Inputs ")
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(form, area);

    if is_focused && app.popup == Popup::None && app.error_message.is_none() {
        if let Some(position) = cursor_position(app, area) {
            frame.set_cursor_position(position);
        }
    }
}

/// Terminal cell of the edit cursor, or `None` when it falls outside `area`
fn cursor_position(app: &App, area: Rect) -> Option<(u16, u16)> {
    let value = display_value(app, app.field);
    let before_cursor: String = value.chars().take(app.cursor).collect();
    let offset = u16::try_from(1 + 2 + LABEL_WIDTH + before_cursor.width()).ok()?;

    let x = area.x.saturating_add(offset);
    let y = area
        .y
        .saturating_add(1)
        .saturating_add(u16::try_from(app.field.index()).ok()?);

    let right = area.x.saturating_add(area.width.saturating_sub(1));
    let bottom = area.y.saturating_add(area.height.saturating_sub(1));
    (x < right && y < bottom).then_some((x, y))
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    let is_focused = app.focus == Focus::Results;

    let border_style = if is_focused {
        Style::default().fg(Colors::cyan())
    } else {
        Style::default().fg(Colors::dark_gray())
    };
    let block = Block::default()
        .title(" Files ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let table = app.outcome.as_ref().and_then(|o| o.table());

    let placeholder = if app.loading {
        Some(Span::styled(
            "Loading files...",
            Style::default().fg(Colors::yellow()),
        ))
    } else {
        match table {
            None => Some(Span::styled(
                "Fill in the form and press Enter to list files",
                Style::default().fg(Colors::dark_gray()),
            )),
            Some(t) if t.is_empty() => Some(Span::styled(
                NO_FILES_MESSAGE,
                Style::default().fg(Colors::red()),
            )),
            Some(_) => None,
        }
    };

    if let Some(text) = placeholder {
        frame.render_widget(Paragraph::new(Line::from(text)).block(block), area);
        return;
    }

    let Some(table) = table else {
        return;
    };

    let header = Row::new(vec![
        Cell::from("File Name"),
        Cell::from("Size (Bytes)"),
        Cell::from("Last Modified"),
    ])
    .style(
        Style::default()
            .fg(Colors::cyan())
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = table
        .rows()
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.name.clone()),
                Cell::from(Line::from(record.size.to_string()).right_aligned()),
                Cell::from(format::timestamp(record.last_modified)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(30),
        Constraint::Length(14),
        Constraint::Length(24),
    ];

    let rendered = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Colors::dark_gray()),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(Some(app.result_index.min(table.len().saturating_sub(1))));

    frame.render_stateful_widget(rendered, area, &mut state);

    // Save scroll offset for mouse click handling
    app.results_scroll_offset = state.offset();
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let mut status_parts = Vec::new();

    if let Some(ref msg) = app.status_message {
        status_parts.push(Span::styled(
            format!("{} │ ", msg),
            Style::default()
                .fg(Colors::green())
                .add_modifier(Modifier::BOLD),
        ));
    }

    let missing = app.inputs.missing().len();
    let main_status = if app.loading {
        "Fetching storage key and listing files...".to_string()
    } else if missing > 0 {
        format!("{} of {} fields empty", missing, Field::iter().count())
    } else {
        "Ready".to_string()
    };

    status_parts.push(Span::raw(main_status));

    let status_bar = Paragraph::new(Line::from(status_parts))
        .style(Style::default().fg(Colors::white()))
        .block(Block::default().borders(Borders::ALL).title(" Status "));

    frame.render_widget(status_bar, area);
}

fn render_keybindings(app: &App, frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Colors::yellow()));

    let bindings = match app.focus {
        Focus::Form => {
            let show_hide = if app.show_secret { "Hide" } else { "Show" };
            Line::from(vec![
                key(" Esc"),
                Span::raw(" Quit  "),
                key("Tab"),
                Span::raw(" Next  "),
                key("Enter"),
                Span::raw(" List Files  "),
                key("^R"),
                Span::raw(format!(" {} secret  ", show_hide)),
                key("^U"),
                Span::raw(" Clear  "),
                key("F1"),
                Span::raw(" Help"),
            ])
        }
        Focus::Results => Line::from(vec![
            key(" q"),
            Span::raw(" Quit  "),
            key("j/k"),
            Span::raw(" Nav  "),
            key("Tab"),
            Span::raw(" Form  "),
            key("r"),
            Span::raw(" Refresh  "),
            key("?"),
            Span::raw(" Help"),
        ]),
    };

    let keybindings = Paragraph::new(bindings).style(Style::default().fg(Colors::dark_gray()));

    frame.render_widget(keybindings, area);
}

fn render_error_popup(frame: &mut Frame, error: &str) {
    let area = centered_rect(60, 30, frame.area());

    let error_block = Paragraph::new(error)
        .style(Style::default().fg(Colors::red()))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Error (press any key to dismiss) ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Colors::red())),
        );

    frame.render_widget(Clear, area);
    frame.render_widget(error_block, area);
}

fn help_section(title: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(
        title,
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Colors::cyan()),
    )])
}

fn help_entry(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<9}", keys), Style::default().fg(Colors::yellow())),
        Span::raw(action),
    ])
}

fn render_help_popup(frame: &mut Frame) {
    let area = centered_rect(50, 80, frame.area());

    let help_text = vec![
        help_section("Form"),
        Line::from(""),
        help_entry("Tab/↓", "Next field"),
        help_entry("S-Tab/↑", "Previous field"),
        help_entry("Enter", "List files"),
        help_entry("Ctrl-R", "Show/hide client secret"),
        help_entry("Ctrl-U", "Clear field"),
        Line::from(""),
        help_section("Results"),
        Line::from(""),
        help_entry("j/↓", "Move down"),
        help_entry("k/↑", "Move up"),
        help_entry("g", "Go to top"),
        help_entry("G", "Go to bottom"),
        help_entry("r", "List again"),
        help_entry("Tab", "Back to form"),
        Line::from(""),
        help_section("General"),
        Line::from(""),
        help_entry("F5", "List files"),
        help_entry("Esc", "Quit"),
        help_entry("Ctrl-C", "Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "       Press any key to close",
            Style::default().fg(Colors::dark_gray()),
        )]),
    ];

    let help_block = Paragraph::new(help_text).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Colors::cyan())),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(help_block, area);
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use adls_meta_core::secrets::KeyVaultSecretSource;
    use adls_meta_core::storage::AdlsConnector;
    use adls_meta_core::{FileRecord, FileTable, FormInputs, Outcome, Pipeline};
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn app(inputs: FormInputs) -> App {
        App::new(
            inputs,
            Some("dev".to_string()),
            Pipeline::new(Arc::new(KeyVaultSecretSource), Arc::new(AdlsConnector)),
        )
    }

    fn draw(app: &mut App) -> String {
        console::set_colors_enabled(false);
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_renders_form_and_masks_secret() {
        let inputs = FormInputs {
            client_secret: "hunter2".to_string(),
            storage_account: "acct1".to_string(),
            ..Default::default()
        };
        let mut app = app(inputs);
        let text = draw(&mut app);

        assert!(text.contains("ALPINE - ADLS File Metadata Viewer"));
        assert!(text.contains("Profile: dev"));
        assert!(text.contains("Secret Name for Storage Account Key"));
        assert!(text.contains("acct1"));
        assert!(text.contains("*******"));
        assert!(!text.contains("hunter2"));

        app.show_secret = true;
        assert!(draw(&mut app).contains("hunter2"));
    }

    #[test]
    fn test_renders_results_table() {
        let mut app = app(FormInputs::default());
        app.outcome = Some(Outcome::Listed(FileTable::from(vec![FileRecord {
            name: "dir/a.csv".to_string(),
            size: 100,
            last_modified: None,
        }])));
        let text = draw(&mut app);

        assert!(text.contains("File Name"));
        assert!(text.contains("Size (Bytes)"));
        assert!(text.contains("dir/a.csv"));
        assert!(text.contains("100"));
    }

    #[test]
    fn test_renders_no_files_message() {
        let mut app = app(FormInputs::default());
        app.outcome = Some(Outcome::Listed(FileTable::new()));
        assert!(draw(&mut app).contains(NO_FILES_MESSAGE));
    }

    #[test]
    fn test_renders_error_popup() {
        let mut app = app(FormInputs::default());
        app.error_message = Some("Please provide all required inputs".to_string());
        let text = draw(&mut app);
        assert!(text.contains("Error (press any key to dismiss)"));
        assert!(text.contains("Please provide all required inputs"));
    }

    #[test]
    fn test_cursor_position_counts_display_width() {
        let inputs = FormInputs {
            vault_url: "日本".to_string(),
            ..Default::default()
        };
        let mut app = app(inputs);
        app.field = Field::VaultUrl;
        app.cursor = 2;
        let area = Rect::new(0, 3, 120, 10);

        // Border, marker, label column, then two double-width chars
        assert_eq!(cursor_position(&app, area), Some((1 + 2 + 37 + 4, 4)));
    }

    #[test]
    fn test_cursor_position_outside_area_is_hidden() {
        let inputs = FormInputs {
            directory_path: "x".repeat(70_000),
            ..Default::default()
        };
        let mut app = app(inputs);
        app.field = Field::DirectoryPath;
        app.cursor = 70_000;

        let area = Rect::new(0, 3, 120, 10);
        assert_eq!(cursor_position(&app, area), None);

        // Rendering with a huge value must not panic
        draw(&mut app);
    }
}

