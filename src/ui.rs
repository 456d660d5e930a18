use anyhow::Result;
use care_desk::contacts::{AddOutcome, ContactCollector, ContactForm};
use care_desk::export::PreviewBlock;
use care_desk::filter::{self, FilterState};
use care_desk::{AppError, Command, Config, KeyValueStore, PettyCash, RecordId, Theme, MAX_SLOTS};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Records,
    Templates,
    Contacts,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Records => Page::Templates,
            Page::Templates => Page::Contacts,
            Page::Contacts => Page::Records,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Records => Page::Contacts,
            Page::Templates => Page::Records,
            Page::Contacts => Page::Templates,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Records => "零用金",
            Page::Templates => "範本",
            Page::Contacts => "聯絡人",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Name,
    Date,
    Amount,
}

impl InputField {
    fn next(&self) -> Self {
        match self {
            InputField::Name => InputField::Date,
            InputField::Date => InputField::Amount,
            InputField::Amount => InputField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Prefix,
    Name,
    Number,
}

impl ContactField {
    fn next(&self) -> Self {
        match self {
            ContactField::Prefix => ContactField::Name,
            ContactField::Name => ContactField::Number,
            ContactField::Number => ContactField::Prefix,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    EditInput(InputField),
    EditTemplate,
    EditContact(ContactField),
    ConfirmClear,
}

/// Foreground colours for the stored light/dark preference
struct Palette {
    text: Color,
    dim: Color,
    accent: Color,
    border: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                text: Color::Black,
                dim: Color::DarkGray,
                accent: Color::Blue,
                border: Color::Gray,
            },
            Theme::Dark => Palette {
                text: Color::White,
                dim: Color::DarkGray,
                accent: Color::Cyan,
                border: Color::White,
            },
        }
    }
}

pub struct App {
    pub cash: PettyCash,
    pub contacts: ContactCollector,
    pub contact_form: ContactForm,
    pub theme: Theme,
    pub current_page: Page,
    pub mode: Mode,
    pub state: TableState,
    pub contact_state: TableState,
    pub template_buffer: String,
    pub message: Option<String>,
    store: Rc<dyn KeyValueStore>,
    config: Config,
}

impl App {
    pub fn new(cash: PettyCash, store: Rc<dyn KeyValueStore>, config: Config) -> Self {
        let theme = Theme::load(store.as_ref());
        Self {
            cash,
            contacts: ContactCollector::new(),
            contact_form: ContactForm::default(),
            theme,
            current_page: Page::Records,
            mode: Mode::Browse,
            state: TableState::default(),
            contact_state: TableState::default(),
            template_buffer: String::new(),
            message: None,
            store,
            config,
        }
    }

    /// Committed rows under the current filter, as ids in display order
    fn visible_ids(&self) -> Vec<RecordId> {
        filter::visible(self.cash.records.committed(), self.cash.filter)
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    pub fn selected_record(&self) -> Option<RecordId> {
        self.state
            .selected()
            .and_then(|i| self.visible_ids().get(i).copied())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_ids().len();
        clamp(&mut self.state, len);
        clamp(&mut self.contact_state, self.contacts.len());
    }

    /// Run a command, turning refusals into a status-bar message
    fn apply(&mut self, command: Command) {
        match self.cash.dispatch(command) {
            Ok(_) => {}
            Err(AppError::Validation(e)) => self.message = Some(e.to_string()),
            // Slot limits are silent: the controls are simply not offered
            Err(e) => tracing::debug!(error = %e, "command refused"),
        }
        self.clamp_selection();
    }

    fn export(&mut self) {
        if let Err(e) = self.config.ensure_export_dir() {
            self.message = Some(e.to_string());
            return;
        }
        self.message = Some(match self.cash.export_to(&self.config.export_dir) {
            Ok(path) => format!("已匯出 {}", path.display()),
            Err(e) => e.to_string(),
        });
    }

    fn import_names(&mut self) {
        let path = self.config.export_dir.join("names.txt");
        self.message = Some(match self.cash.names.import_file(&path) {
            Ok(()) => format!("已匯入 {} 個名字", self.cash.names.len()),
            Err(e) => format!("{:#}", e),
        });
    }

    fn export_contacts(&mut self) {
        let today = chrono::Utc::now().date_naive();
        let dir = self.config.export_dir.clone();
        let written = self
            .config
            .ensure_export_dir()
            .and_then(|_| Ok(self.contacts.export_to(&dir, today)?));
        self.message = Some(match written {
            Ok(Some(export)) => format!(
                "✓ {} contacts → {}",
                export.count,
                dir.join(&export.file_name).display()
            ),
            Ok(None) => "No contacts yet.".to_string(),
            Err(e) => format!("{:#}", e),
        });
        self.clamp_selection();
    }

    fn toggle_theme(&mut self) {
        self.theme = Theme::toggle(self.store.as_ref());
    }

    fn open_template_editor(&mut self) {
        let slot = self.cash.templates.editing_slot();
        self.template_buffer = self.cash.templates.get_template(slot).to_string();
        self.mode = Mode::EditTemplate;
    }

    fn close_template_editor(&mut self) {
        let slot = self.cash.templates.editing_slot();
        let text = std::mem::take(&mut self.template_buffer);
        self.apply(Command::SetTemplate { slot, text });
        // The template just closed is the one export uses
        self.apply(Command::SelectExportSlot(slot));
        self.mode = Mode::Browse;
    }

    pub fn next(&mut self) {
        let len = match self.current_page {
            Page::Contacts => self.contacts.len(),
            _ => self.visible_ids().len(),
        };
        let state = self.page_state();
        step(state, len, 1);
    }

    pub fn previous(&mut self) {
        let len = match self.current_page {
            Page::Contacts => self.contacts.len(),
            _ => self.visible_ids().len(),
        };
        let state = self.page_state();
        step(state, len, -1);
    }

    fn page_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Contacts => &mut self.contact_state,
            _ => &mut self.state,
        }
    }

    // ------------------------------------------------------------------------
    // Key handling per mode. Returns true to quit.
    // ------------------------------------------------------------------------

    fn on_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Browse => return self.on_browse_key(key),
            Mode::EditInput(field) => self.on_input_key(field, key),
            Mode::EditTemplate => self.on_template_key(key),
            Mode::EditContact(field) => self.on_contact_key(field, key),
            Mode::ConfirmClear => {
                let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
                self.apply(Command::ClearAll { confirmed });
                self.mode = Mode::Browse;
            }
        }
        false
    }

    fn on_browse_key(&mut self, key: KeyEvent) -> bool {
        self.message = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Char('m') => self.toggle_theme(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            _ => match self.current_page {
                Page::Records => self.on_records_key(key),
                Page::Templates => self.on_templates_key(key),
                Page::Contacts => self.on_contacts_key(key),
            },
        }
        false
    }

    fn on_records_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('i') => self.mode = Mode::EditInput(InputField::Name),
            KeyCode::Char('t') => {
                if let Some(id) = self.selected_record() {
                    self.apply(Command::ToggleStatus(id));
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_record() {
                    self.apply(Command::Delete(id));
                }
            }
            KeyCode::Char('f') => {
                let next = self.cash.filter.next();
                self.apply(Command::SetFilter(next));
                self.state.select(if self.visible_ids().is_empty() { None } else { Some(0) });
            }
            KeyCode::Char('x') => self.mode = Mode::ConfirmClear,
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('n') => self.import_names(),
            KeyCode::Char(c @ '1'..='4') => {
                let slot = c as u8 - b'0';
                self.apply(Command::SelectExportSlot(slot));
            }
            _ => {}
        }
    }

    fn on_input_key(&mut self, field: InputField, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Tab => self.mode = Mode::EditInput(field.next()),
            KeyCode::Enter => {
                self.message = None;
                self.apply(Command::Commit);
                if self.message.is_none() {
                    self.mode = Mode::EditInput(InputField::Name);
                }
            }
            KeyCode::Char('t') if ctrl => {
                let id = self.cash.records.input().id;
                self.apply(Command::ToggleStatus(id));
            }
            KeyCode::Right if field == InputField::Name => {
                let suggestion = self.cash.name_suggestions().first().map(|s| s.to_string());
                if let Some(name) = suggestion {
                    self.apply(Command::SetInputName(name));
                }
            }
            KeyCode::Backspace => {
                let mut value = self.input_value(field);
                value.pop();
                self.set_input_value(field, value);
            }
            KeyCode::Char(c) if !ctrl => {
                let mut value = self.input_value(field);
                value.push(c);
                self.set_input_value(field, value);
            }
            _ => {}
        }
    }

    fn input_value(&self, field: InputField) -> String {
        let input = self.cash.records.input();
        match field {
            InputField::Name => input.name.clone(),
            InputField::Date => input.date.clone(),
            InputField::Amount => input.amount.clone(),
        }
    }

    fn set_input_value(&mut self, field: InputField, value: String) {
        let command = match field {
            InputField::Name => Command::SetInputName(value),
            InputField::Date => Command::SetInputDate(value),
            InputField::Amount => Command::SetInputAmount(value),
        };
        self.apply(command);
    }

    fn on_templates_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('e') => self.open_template_editor(),
            KeyCode::Char('+') => self.apply(Command::AddSlot),
            KeyCode::Char('-') => {
                let slot = self.cash.templates.editing_slot();
                self.apply(Command::DeleteSlot(slot));
            }
            KeyCode::Char(c @ '1'..='4') => {
                let slot = c as u8 - b'0';
                self.apply(Command::SwitchSlot(slot));
            }
            _ => {}
        }
    }

    fn on_template_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.close_template_editor(),
            KeyCode::Char('s') if ctrl => self.close_template_editor(),
            KeyCode::Enter => self.template_buffer.push('\n'),
            KeyCode::Backspace => {
                self.template_buffer.pop();
            }
            KeyCode::Char(c) if !ctrl => self.template_buffer.push(c),
            _ => {}
        }
    }

    fn on_contacts_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('a') => self.mode = Mode::EditContact(ContactField::Prefix),
            KeyCode::Enter | KeyCode::Char('e') => match self.contact_state.selected() {
                Some(i) if i < self.contacts.len() => {
                    let contact = self.contacts.contacts()[i].clone();
                    self.contact_form.begin_edit(i, &contact);
                    self.mode = Mode::EditContact(ContactField::Prefix);
                }
                _ => self.mode = Mode::EditContact(ContactField::Prefix),
            },
            KeyCode::Char('l') => self.contact_form.toggle_prefix_lock(),
            KeyCode::Char('d') => {
                if let Some(i) = self.contact_state.selected() {
                    self.contacts.remove(i);
                    self.clamp_selection();
                }
            }
            KeyCode::Char('x') => self.export_contacts(),
            KeyCode::Char('r') => {
                self.contacts.reset();
                self.clamp_selection();
            }
            _ => {}
        }
    }

    fn on_contact_key(&mut self, field: ContactField, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.contact_form.cancel_edit();
                self.mode = Mode::Browse;
            }
            KeyCode::Tab => self.mode = Mode::EditContact(field.next()),
            // Enter walks prefix → name → number, then adds or saves
            KeyCode::Enter if field != ContactField::Number => {
                self.mode = Mode::EditContact(field.next());
            }
            KeyCode::Enter => {
                match self.contact_form.submit(&mut self.contacts) {
                    Ok(AddOutcome::Updated) => {
                        self.message = None;
                        self.mode = Mode::Browse;
                    }
                    Ok(_) => {
                        self.message = None;
                        self.mode = Mode::EditContact(ContactField::Prefix);
                    }
                    Err(e) => self.message = Some(e.to_string()),
                }
                self.clamp_selection();
            }
            KeyCode::Backspace => {
                self.contact_field(field).pop();
            }
            KeyCode::Char(c) => self.contact_field(field).push(c),
            _ => {}
        }
    }

    fn contact_field(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::Prefix => &mut self.contact_form.prefix,
            ContactField::Name => &mut self.contact_form.name,
            ContactField::Number => &mut self.contact_form.number,
        }
    }
}

fn clamp(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

fn step(state: &mut TableState, len: usize, delta: i64) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) => (i as i64 + delta).rem_euclid(len as i64) as usize,
        None => 0,
    };
    state.select(Some(i));
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "ui loop failed");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.on_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Records => {
            let content = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);
            render_records(f, content[0], app);
            render_preview(f, content[1], app);
        }
        Page::Templates => render_templates(f, chunks[1], app),
        Page::Contacts => render_contacts(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let palette = Palette::for_theme(app.theme);
    let pages = [Page::Records, Page::Templates, Page::Contacts];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(palette.dim)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let deficits = app
        .cash
        .records
        .committed()
        .iter()
        .filter(|r| r.status.is_deficit())
        .count();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("記錄: {}", app.cash.records.len()),
        Style::default().fg(palette.text),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(format!("結欠 {}", deficits), Style::default().fg(Color::Red)));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("m: {}", app.theme.button_label()),
        Style::default().fg(palette.dim),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent)),
    );
    f.render_widget(header, area);
}

fn editing_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn status_cell(flagged: bool, label: &'static str) -> Cell<'static> {
    let color = if flagged { Color::Red } else { Color::Green };
    Cell::from(label).style(Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn render_records(f: &mut Frame, area: Rect, app: &mut App) {
    let palette = Palette::for_theme(app.theme);
    let header_cells = ["院友", "截至日期", "結欠/結餘", "金額"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let editing = match app.mode {
        Mode::EditInput(field) => Some(field),
        _ => None,
    };
    let input = app.cash.records.input();
    let input_row = Row::new(vec![
        Cell::from(format!("+ {}", input.name)).style(editing_style(editing == Some(InputField::Name))),
        Cell::from(input.date.clone()).style(editing_style(editing == Some(InputField::Date))),
        status_cell(input.status.is_deficit(), input.status.label()),
        Cell::from(input.amount.clone()).style(editing_style(editing == Some(InputField::Amount))),
    ])
    .style(Style::default().add_modifier(Modifier::ITALIC));

    let visible = filter::visible(app.cash.records.committed(), app.cash.filter);
    let rows = visible.iter().map(|r| {
        Row::new(vec![
            Cell::from(truncate(&r.name, 20)),
            Cell::from(r.date.clone()),
            status_cell(r.status.is_deficit(), r.status.label()),
            Cell::from(r.amount.clone()),
        ])
    });

    let widths = [
        Constraint::Length(22),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(10),
    ];

    // Input row sits in a fixed table so selection indexes committed rows only
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let input_table = Table::new(vec![input_row], widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(" 新增 (i / Enter) "),
        );
    f.render_widget(input_table, split[0]);

    let title = format!(" 記錄 [{}] ", app.cash.filter.label());
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");
    f.render_stateful_widget(table, split[1], &mut app.state);
}

fn preview_lines(block: &PreviewBlock) -> Vec<Line<'static>> {
    let amount_style = if block.flagged {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    };
    let heading_style = if block.flagged {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(Span::styled(block.heading.clone(), heading_style))];
    for text in block.body.split('\n') {
        let mut spans = Vec::new();
        let mut rest = text;
        while let Some(pos) = rest.find(&block.dollar_part) {
            spans.push(Span::raw(rest[..pos].to_string()));
            spans.push(Span::styled(block.dollar_part.clone(), amount_style));
            rest = &rest[pos + block.dollar_part.len()..];
        }
        spans.push(Span::raw(rest.to_string()));
        lines.push(Line::from(spans));
    }
    lines.push(Line::from("─".repeat(24)));
    lines
}

fn render_preview(f: &mut Frame, area: Rect, app: &App) {
    let palette = Palette::for_theme(app.theme);
    let preview = app.cash.preview();
    let lines: Vec<Line> = if preview.is_empty() {
        vec![Line::from(Span::styled("（沒有記錄）", Style::default().fg(palette.dim)))]
    } else {
        preview.blocks.iter().flat_map(preview_lines).collect()
    };

    let title = format!(" 預覽 · 範本 {} ", app.cash.templates.export_slot());
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(title),
        );
    f.render_widget(paragraph, area);
}

fn render_templates(f: &mut Frame, area: Rect, app: &App) {
    let palette = Palette::for_theme(app.theme);
    let templates = &app.cash.templates;
    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(area);

    let mut slot_lines = vec![Line::from("")];
    for slot in templates.slot_numbers() {
        let style = if slot == templates.editing_slot() {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text)
        };
        let export_marker = if slot == templates.export_slot() { " (匯出)" } else { "" };
        slot_lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("[{}]", slot), style),
            Span::styled(export_marker, Style::default().fg(Color::Green)),
        ]));
    }
    slot_lines.push(Line::from(""));
    if templates.can_add_slot() {
        slot_lines.push(Line::from(Span::styled("  + 新增", Style::default().fg(palette.dim))));
    }
    if templates.can_delete_slot() {
        slot_lines.push(Line::from(Span::styled("  - 刪除", Style::default().fg(palette.dim))));
    }
    slot_lines.push(Line::from(Span::styled(
        format!("  最多 {} 個", MAX_SLOTS),
        Style::default().fg(palette.dim),
    )));

    let slots = Paragraph::new(slot_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(" 範本 "),
    );
    f.render_widget(slots, content[0]);

    let editing = app.mode == Mode::EditTemplate;
    let text = if editing {
        format!("{}▏", app.template_buffer)
    } else {
        templates.get_template(templates.editing_slot()).to_string()
    };
    let title = if editing {
        format!(" 編輯範本 {} (Esc 儲存) ", templates.editing_slot())
    } else {
        format!(" 範本 {} ", templates.editing_slot())
    };
    let lines: Vec<Line> = text.split('\n').map(|l| Line::from(l.to_string())).collect();
    let body = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if editing { Color::Yellow } else { palette.border }))
            .title(title),
    );
    f.render_widget(body, content[1]);
}

fn render_contacts(f: &mut Frame, area: Rect, app: &mut App) {
    let palette = Palette::for_theme(app.theme);
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let editing = match app.mode {
        Mode::EditContact(field) => Some(field),
        _ => None,
    };
    let form = &app.contact_form;
    let number_style = if form.number_is_invalid() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        editing_style(editing == Some(ContactField::Number))
    };
    let form_line = Line::from(vec![
        Span::raw(" Prefix: "),
        Span::styled(format!("{:<8}", form.prefix), editing_style(editing == Some(ContactField::Prefix))),
        Span::styled(format!(" [{}]", form.lock_label()), Style::default().fg(palette.dim)),
        Span::raw("  Name: "),
        Span::styled(format!("{:<16}", form.name), editing_style(editing == Some(ContactField::Name))),
        Span::raw("  Number: "),
        Span::styled(format!("{:<14}", form.number), number_style),
    ]);
    let form_widget = Paragraph::new(vec![form_line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(match form.editing {
                Some(i) => format!(" 編輯聯絡人 #{} (Esc 取消) ", i + 1),
                None => " 新增聯絡人 (a) ".to_string(),
            }),
    );
    f.render_widget(form_widget, split[0]);

    let header_cells = ["Prefix", "Name", "Number"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);
    let rows = app.contacts.contacts().iter().map(|c| {
        Row::new(vec![
            Cell::from(c.prefix.clone()),
            Cell::from(c.name.clone()),
            Cell::from(c.number.clone()),
        ])
    });
    let title = if app.contacts.is_empty() {
        " No contacts yet. Enter Prefix, Name and Number. ".to_string()
    } else {
        format!(" 聯絡人 ({}) ", app.contacts.len())
    };
    let table = Table::new(
        rows,
        [Constraint::Length(12), Constraint::Length(24), Constraint::Length(18)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");
    f.render_stateful_widget(table, split[1], &mut app.contact_state);
}

fn key_hint(spans: &mut Vec<Span<'static>>, key: &'static str, label: &'static str) {
    spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(format!(" {} | ", label)));
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans: Vec<Span<'static>> = Vec::new();

    if let Some(message) = &app.message {
        spans.push(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("| "));
    }

    match (app.mode, app.current_page) {
        (Mode::ConfirmClear, _) => {
            spans.push(Span::styled(
                " 確定要清空所有記錄嗎？ (y/n) ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
        (Mode::EditInput(_), _) => {
            key_hint(&mut spans, "Tab", "欄位");
            key_hint(&mut spans, "Enter", "加入");
            key_hint(&mut spans, "Ctrl-T", "結欠/結餘");
            key_hint(&mut spans, "→", "建議名字");
            key_hint(&mut spans, "Esc", "完成");
        }
        (Mode::EditTemplate, _) => {
            key_hint(&mut spans, "Enter", "換行");
            key_hint(&mut spans, "Esc/Ctrl-S", "儲存");
        }
        (Mode::EditContact(_), _) => {
            key_hint(&mut spans, "Tab", "欄位");
            key_hint(&mut spans, "Enter", "下一欄 / 加入");
            key_hint(&mut spans, "Esc", "完成");
        }
        (Mode::Browse, Page::Records) => {
            let filter_name = match app.cash.filter {
                FilterState::All => "全部",
                other => other.label(),
            };
            spans.push(Span::styled(
                format!(" Filter: {} ", filter_name),
                Style::default().fg(Color::Green),
            ));
            spans.push(Span::raw("| "));
            key_hint(&mut spans, "i", "輸入");
            key_hint(&mut spans, "t", "切換");
            key_hint(&mut spans, "d", "刪除");
            key_hint(&mut spans, "f", "篩選");
            key_hint(&mut spans, "1-4", "範本");
            key_hint(&mut spans, "e", "匯出");
            key_hint(&mut spans, "n", "匯入名字");
            key_hint(&mut spans, "x", "清空");
        }
        (Mode::Browse, Page::Templates) => {
            key_hint(&mut spans, "1-4", "選擇");
            key_hint(&mut spans, "e", "編輯");
            if app.cash.templates.can_add_slot() {
                key_hint(&mut spans, "+", "新增");
            }
            if app.cash.templates.can_delete_slot() {
                key_hint(&mut spans, "-", "刪除");
            }
        }
        (Mode::Browse, Page::Contacts) => {
            key_hint(&mut spans, "a", "輸入");
            key_hint(&mut spans, "e", "編輯");
            key_hint(&mut spans, "l", "鎖定 Prefix");
            key_hint(&mut spans, "d", "刪除");
            key_hint(&mut spans, "x", "匯出 vcf");
            key_hint(&mut spans, "r", "重設");
        }
    }

    if app.mode == Mode::Browse {
        key_hint(&mut spans, "Tab", "Page");
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

/// Cut to `max_chars` characters (not bytes: names are often CJK)
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
