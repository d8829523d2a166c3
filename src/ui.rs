use crate::config::{Config, ConfigLocation};
use crate::model::{format_remaining, Task, TaskId, TimeUnit};
use crate::scheduler::Ticker;
use crate::timer::{CountdownPolicy, Draft, FocusTimer};
use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const IDLE_POLL: Duration = Duration::from_millis(200);

pub fn run(config: Config, location: ConfigLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(&config, location);
    info!(policy = ?config.countdown_policy, "focus tui started");
    let result = app.event_loop(&mut terminal);
    app.ticker.cancel();
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    timer: FocusTimer,
    ticker: Ticker,
    location: ConfigLocation,
    selected: usize,
    status: String,
    mode: Mode,
    backdrop: Backdrop,
    run: Option<RunInfo>,
}

/// What the timer panel needs about the current run beyond the countdown.
struct RunInfo {
    id: TaskId,
    total: u64,
    started_at: DateTime<Local>,
}

enum Mode {
    Normal,
    Creating(TaskForm),
    Editing(TaskForm),
    ConfirmDelete { id: TaskId },
}

struct TaskForm {
    text: FieldValue,
    duration: FieldValue,
    unit: TimeUnit,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum FormField {
    Text,
    Duration,
    Unit,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormAction {
    Create,
    Update,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_grapheme(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_grapheme(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

/// Color scheme carousel for the timer panel. Cycles in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Backdrop {
    index: usize,
}

const BACKDROPS: [(&str, Color, Color); 4] = [
    ("dusk", Color::Rgb(186, 140, 255), Color::Rgb(24, 18, 36)),
    ("forest", Color::Rgb(120, 200, 140), Color::Rgb(14, 26, 18)),
    ("ocean", Color::Rgb(110, 180, 240), Color::Rgb(12, 20, 32)),
    ("ember", Color::Rgb(250, 160, 90), Color::Rgb(32, 18, 12)),
];

impl Backdrop {
    fn next(&mut self) {
        self.index = (self.index + 1) % BACKDROPS.len();
    }

    fn prev(&mut self) {
        self.index = (self.index + BACKDROPS.len() - 1) % BACKDROPS.len();
    }

    fn name(&self) -> &'static str {
        BACKDROPS[self.index].0
    }

    fn accent(&self) -> Color {
        BACKDROPS[self.index].1
    }

    fn background(&self) -> Color {
        BACKDROPS[self.index].2
    }
}

impl App {
    fn new(config: &Config, location: ConfigLocation) -> Self {
        let status = format!(
            "Config: {} ({}) • press n to add a task",
            location.path.display(),
            location.scope.label()
        );
        App {
            timer: FocusTimer::new(config.timer_settings()),
            ticker: Ticker::new(config.tick_interval()),
            location,
            selected: 0,
            status,
            mode: Mode::Normal,
            backdrop: Backdrop { index: 0 },
            run: None,
        }
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.ticker.sync(&self.timer, Instant::now());
            terminal.draw(|f| self.draw(f))?;
            let wait = self
                .ticker
                .time_until_due(Instant::now())
                .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));
            if event::poll(wait)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key)? {
                        break;
                    }
                    self.ticker.sync(&self.timer, Instant::now());
                }
            }
            self.advance(Instant::now());
        }
        Ok(())
    }

    fn advance(&mut self, now: Instant) {
        if !self.ticker.fire(&mut self.timer, now) {
            return;
        }
        if self.timer.is_finished() {
            let text = self
                .timer
                .running_task()
                .map(|t| t.text.clone())
                .unwrap_or_default();
            self.status = format!("Time's up: {}", text);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Creating(_) | Mode::Editing(_) => self.handle_form_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('n') => {
                self.timer.cancel_edit();
                self.mode = Mode::Creating(TaskForm::from_draft(self.timer.draft()));
                self.status = "New task (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
            }
            KeyCode::Char('e') => match self.timer.begin_edit(self.selected) {
                Ok(()) => {
                    self.sync_run();
                    let draft = self.timer.draft();
                    self.status = if draft.unit == TimeUnit::Second {
                        "Editing (Enter save, Ctrl+S start this task, Esc cancel)".into()
                    } else {
                        format!(
                            "Editing: time is shown in seconds, saving multiplies it by the {} unit",
                            draft.unit
                        )
                    };
                    self.mode = Mode::Editing(TaskForm::from_draft(draft));
                }
                Err(_) => self.status = "No task selected to edit".into(),
            },
            KeyCode::Char('d') => {
                if let Some(task) = self.timer.tasks().get(self.selected) {
                    self.status = format!("Delete \"{}\"? (y to confirm, n/Esc to cancel)", task.text);
                    self.mode = Mode::ConfirmDelete {
                        id: task.id.clone(),
                    };
                } else {
                    self.status = "No task selected to delete".into();
                }
            }
            KeyCode::Char('s') => self.start(),
            KeyCode::Char('[') => {
                self.backdrop.prev();
                self.status = format!("Backdrop: {}", self.backdrop.name());
            }
            KeyCode::Char(']') => {
                self.backdrop.next();
                self.status = format!("Backdrop: {}", self.backdrop.name());
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.timer.tasks().len() {
                    self.selected += 1;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let close_form = match &mut mode {
            Mode::Creating(form) => self.process_form_key(FormAction::Create, form, key),
            Mode::Editing(form) => self.process_form_key(FormAction::Update, form, key),
            Mode::ConfirmDelete { .. } | Mode::Normal => false,
        };
        self.mode = if close_form { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let id = match &self.mode {
            Mode::ConfirmDelete { id } => id.clone(),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.delete(&id);
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn process_form_key(&mut self, action: FormAction, form: &mut TaskForm, key: KeyEvent) -> bool {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.timer.cancel_edit();
                self.status = "Canceled".into();
                return true;
            }
            KeyCode::Char('s') if control && action == FormAction::Update => {
                self.start();
                return true;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Left => match form.active_field_mut() {
                Some(field) => field.move_left(),
                None => form.unit = form.unit.prev(),
            },
            KeyCode::Right => match form.active_field_mut() {
                Some(field) => field.move_right(),
                None => form.unit = form.unit.next(),
            },
            KeyCode::Enter => return self.try_submit(action, form),
            KeyCode::Backspace => {
                if let Some(field) = form.active_field_mut() {
                    field.backspace();
                }
            }
            KeyCode::Char(c) => {
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    return false;
                }
                match form.field {
                    FormField::Unit => match c {
                        'h' => form.unit = TimeUnit::Hour,
                        'm' => form.unit = TimeUnit::Minute,
                        's' => form.unit = TimeUnit::Second,
                        ' ' => form.unit = form.unit.next(),
                        _ => {}
                    },
                    FormField::Duration if !c.is_ascii_digit() => {}
                    _ => {
                        if let Some(field) = form.active_field_mut() {
                            field.insert_char(c);
                        }
                    }
                }
            }
            _ => {}
        }
        false
    }

    fn try_submit(&mut self, action: FormAction, form: &TaskForm) -> bool {
        if let Err(err) = self.timer.set_draft_duration_input(&form.duration.value) {
            self.status = format!("Could not save: {}", err);
            return false;
        }
        self.timer.set_draft_text(form.text.value.clone());
        self.timer.set_draft_unit(form.unit);
        let result = match action {
            FormAction::Create => self.timer.add_task().map(|_| {
                self.selected = self.timer.tasks().len().saturating_sub(1);
                "Added"
            }),
            FormAction::Update => self.timer.update_task().map(|_| "Updated"),
        };
        match result {
            Ok(verb) => {
                self.sync_run();
                self.status = format!("{} \"{}\"", verb, form.text.value.trim());
                true
            }
            Err(err) => {
                self.status = format!("Could not save: {}", err);
                false
            }
        }
    }

    fn start(&mut self) {
        match self.timer.start_task() {
            Ok(id) => {
                self.run = Some(RunInfo {
                    id,
                    total: self.timer.remaining_secs(),
                    started_at: Local::now(),
                });
                if let Some(idx) = self.timer.running_index() {
                    self.selected = idx;
                }
                let text = self
                    .timer
                    .running_task()
                    .map(|t| t.text.clone())
                    .unwrap_or_default();
                self.status = format!("Started \"{}\"", text);
            }
            Err(err) => {
                debug!(%err, "start rejected");
                self.status = format!("Cannot start: {}", err);
            }
        }
    }

    fn delete(&mut self, id: &TaskId) {
        let position = self.timer.tasks().iter().position(|t| &t.id == id);
        match position.map(|idx| self.timer.delete_task(idx)) {
            Some(Ok(task)) => {
                self.sync_run();
                self.clamp_selection();
                self.status = format!("Deleted \"{}\"", task.text);
            }
            Some(Err(err)) => self.status = format!("Delete failed: {}", err),
            None => self.status = "Task is already gone".into(),
        }
    }

    /// Drops run details once the timer no longer runs that task.
    fn sync_run(&mut self) {
        let current = self.timer.running_id();
        if self.run.as_ref().map(|r| &r.id) != current {
            self.run = None;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.timer.tasks().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);
        self.draw_tasks(f, body[0]);
        self.draw_timer(f, body[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, "New Task", form),
            Mode::Editing(form) => self.draw_form(f, "Edit Task", form),
            Mode::ConfirmDelete { id } => self.draw_confirm(f, id),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let policy = match self.timer.settings().policy {
            CountdownPolicy::ResetToDefault => "shared countdown",
            CountdownPolicy::ResumeTaskDuration => "per-task countdown",
        };
        let state = if self.timer.is_running() {
            "running"
        } else if self.timer.is_finished() {
            "time's up"
        } else {
            "idle"
        };
        let title = Line::from(vec![
            Span::styled(
                "focus ",
                Style::default()
                    .fg(self.backdrop.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} task(s)", self.timer.tasks().len()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(state, Style::default().fg(self.backdrop.accent())),
            Span::raw("  •  "),
            Span::styled(policy, Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_tasks(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                "Todo List",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let tasks = self.timer.tasks();
        if tasks.is_empty() {
            let msg = Paragraph::new("No tasks yet. Press n to add one.")
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(msg, area);
            return;
        }

        let running = self.timer.running_index();
        let editing = self.timer.editing_index();
        let width = area.width.saturating_sub(4) as usize;
        let items = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                task_item(task, width, Some(idx) == running, Some(idx) == editing)
            })
            .collect::<Vec<_>>();
        let mut state = ListState::default();
        state.select(Some(self.selected.min(tasks.len() - 1)));
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(self.backdrop.accent())
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_timer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                format!("Timer • {}", self.backdrop.name()),
                Style::default()
                    .fg(self.backdrop.accent())
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.backdrop.accent()))
            .style(Style::default().bg(self.backdrop.background()));

        let task = match self.timer.running_task() {
            Some(task) => task,
            None => {
                let hint = Paragraph::new(vec![
                    Line::from(""),
                    Line::from("No task running"),
                    Line::from(Span::styled(
                        "s starts the most recent task",
                        Style::default().fg(Color::Gray),
                    )),
                ])
                .alignment(Alignment::Center)
                .block(block);
                f.render_widget(hint, area);
                return;
            }
        };

        let inner = block.inner(area);
        f.render_widget(block, area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(inner);

        let remaining = self.timer.remaining_secs();
        let mut lines = vec![
            Line::from(Span::styled(
                task.text.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::raw("Time remaining: "),
                Span::styled(
                    format_remaining(remaining),
                    Style::default()
                        .fg(self.backdrop.accent())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        if let Some(run) = &self.run {
            lines.push(Line::from(Span::styled(
                format!("started {}", run.started_at.format("%H:%M:%S")),
                Style::default().fg(Color::Gray),
            )));
        }
        if self.timer.is_finished() {
            lines.push(Line::from(Span::styled(
                "Time's up",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        let summary = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(summary, rows[0]);

        let total = self.run.as_ref().map(|r| r.total).unwrap_or(remaining);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(self.backdrop.accent()))
            .ratio(elapsed_ratio(remaining, total))
            .label(format_remaining(remaining));
        f.render_widget(gauge, rows[1]);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &TaskForm) {
        let area = centered_rect(60, 50, f.size());
        let mut fields = Vec::new();
        fields.push(field_line("Task", &form.text, form.field == FormField::Text));
        fields.push(field_line(
            "Time",
            &form.duration,
            form.field == FormField::Duration,
        ));
        fields.push(unit_line(form.unit, form.field == FormField::Unit));
        fields.push(Line::from(""));
        fields.push(Line::from(Span::styled(
            "Enter to save • Esc to cancel • Tab/Shift-Tab to move • ←/→ or h/m/s pick the unit",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, id: &TaskId) {
        let area = centered_rect(50, 30, f.size());
        let text = self
            .timer
            .tasks()
            .iter()
            .find(|t| &t.id == id)
            .map(|t| t.text.clone())
            .unwrap_or_else(|| id.as_str().to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", text),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

impl TaskForm {
    fn from_draft(draft: &Draft) -> Self {
        TaskForm {
            text: FieldValue::new(&draft.text),
            duration: FieldValue::new(&draft.duration.to_string()),
            unit: draft.unit,
            field: FormField::Text,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Text => FormField::Duration,
            FormField::Duration => FormField::Unit,
            FormField::Unit => FormField::Text,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Text => FormField::Unit,
            FormField::Duration => FormField::Text,
            FormField::Unit => FormField::Duration,
        };
    }

    fn active_field_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            FormField::Text => Some(&mut self.text),
            FormField::Duration => Some(&mut self.duration),
            FormField::Unit => None,
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

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

fn footer_help_line() -> Line<'static> {
    let key = Style::default().fg(Color::LightCyan);
    Line::from(vec![
        Span::styled("n", key),
        Span::raw(" new  "),
        Span::styled("e", key),
        Span::raw(" edit  "),
        Span::styled("d", key),
        Span::raw(" delete  "),
        Span::styled("s", key),
        Span::raw(" start  "),
        Span::styled("j/k", key),
        Span::raw(" select  "),
        Span::styled("[ ]", key),
        Span::raw(" backdrop  "),
        Span::styled("q", key),
        Span::raw(" quit"),
    ])
}

fn elapsed_ratio(remaining: u64, total: u64) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let done = total.saturating_sub(remaining) as f64 / total as f64;
    done.clamp(0.0, 1.0)
}

fn prev_grapheme(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_grapheme(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// A list row shows the task's total duration, never a live countdown.
fn task_item(task: &Task, width: usize, running: bool, editing: bool) -> ListItem<'static> {
    let marker = if running {
        "▶ "
    } else if editing {
        "✎ "
    } else {
        "  "
    };
    let total = format!(
        "{} ({})  added {}",
        format_remaining(task.duration),
        task.unit,
        task.created_at.format("%H:%M")
    );
    let text_width = width.saturating_sub(total.chars().count() + marker.chars().count() + 2);
    let spans = vec![
        Span::styled(marker, Style::default().fg(Color::LightGreen)),
        Span::styled(
            format!("{:w$}", truncate_text(&task.text, text_width), w = text_width),
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled(total, Style::default().fg(Color::LightYellow)),
    ];
    ListItem::new(Line::from(spans))
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])
}

fn unit_line(unit: TimeUnit, active: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        "Unit: ",
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::BOLD | Modifier::DIM),
    )];
    for option in TimeUnit::ALL {
        let style = if option == unit {
            Style::default()
                .fg(if active { Color::Black } else { Color::White })
                .bg(if active { Color::Cyan } else { Color::DarkGray })
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", option), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}
