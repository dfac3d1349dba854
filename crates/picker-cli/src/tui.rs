use crate::keys;
use crossterm::cursor::Show;
use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use picker_core::{Announcement, RosterStore, Session};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

/// Redraw cadence while idle, so the session clock keeps ticking.
const TICK_RATE: Duration = Duration::from_millis(250);

const TITLE: &str = "✨ Random Student Picker ✨";
const PICK_LABEL: &str = "PICKED STUDENT:";
const UNDO_HINT: &str = "Press U to undo the last change";

pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui {
    pub fn init() -> io::Result<Self> {
        enable_raw_mode()?;
        let setup = (|| {
            let mut stdout = io::stdout();
            stdout.execute(EnterAlternateScreen)?;
            Terminal::new(CrosstermBackend::new(stdout))
        })();
        let terminal = restore_on_err(setup, restore_terminal)?;
        Ok(Self { terminal })
    }

    /// Render, wait for one key, apply it, repeat until the session quits.
    pub fn run<S: RosterStore>(
        &mut self,
        session: &mut Session<S>,
        limit: usize,
    ) -> io::Result<()> {
        let started = Instant::now();
        while !session.is_finished() {
            let elapsed = started.elapsed();
            self.terminal
                .draw(|frame| render(frame, session, elapsed, limit))?;

            if !event::poll(TICK_RATE)? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if let Some(command) = keys::command_for(key) {
                    session.apply(command);
                }
            }
        }
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
    let _ = io::stdout().execute(Show);
}

/// Run `restore` when terminal setup fails part way, since no `Tui` exists
/// yet to do it on drop.
fn restore_on_err<T>(result: io::Result<T>, restore: impl FnOnce()) -> io::Result<T> {
    if result.is_err() {
        restore();
    }
    result
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render<S: RosterStore>(
    frame: &mut Frame,
    session: &Session<S>,
    elapsed: Duration,
    limit: usize,
) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double);
    let inner = outer.inner(frame.area());
    frame.render_widget(outer, frame.area());

    let history_height = u16::try_from(limit).unwrap_or(u16::MAX).saturating_add(1);
    let [_, title, _, help, _, stats, _, history, _, announcement, status, duration] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(history_height),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

    frame.render_widget(
        Paragraph::new(TITLE)
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        title,
    );
    frame.render_widget(Paragraph::new(help_line()), indent(help, 1));
    frame.render_widget(Paragraph::new(stats_lines(session)), indent(stats, 1));
    frame.render_widget(Paragraph::new(history_lines(session, limit)), indent(history, 1));
    render_announcement(frame, session.current_announcement(), announcement);

    if let Some(message) = session.status() {
        frame.render_widget(
            Paragraph::new(message.to_string()).style(Style::default().fg(Color::Red)),
            indent(status, 1),
        );
    } else if session.can_undo() {
        frame.render_widget(
            Paragraph::new(UNDO_HINT).style(Style::default().fg(Color::DarkGray)),
            indent(status, 1),
        );
    }
    frame.render_widget(
        Paragraph::new(format_duration(elapsed)).style(Style::default().fg(Color::Yellow)),
        indent(duration, 1),
    );
}

fn help_line() -> Line<'static> {
    let text = Style::default().fg(Color::Yellow);
    let key = Style::default().add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled("Press ", text),
        Span::styled("ENTER", key),
        Span::styled(" to pick a student, ", text),
        Span::styled("U", key),
        Span::styled(" to undo last pick, ", text),
        Span::styled("R", key),
        Span::styled(" to reset all, ", text),
        Span::styled("Q", key),
        Span::styled(" to quit", text),
    ])
}

fn stats_lines<S: RosterStore>(session: &Session<S>) -> Vec<Line<'static>> {
    let style = Style::default().fg(Color::Cyan);
    vec![
        Line::styled(format!("Total students: {}", session.total_count()), style),
        Line::styled(format!("Students picked: {}", session.picked_count()), style),
        Line::styled(format!("Remaining: {}", session.remaining_count()), style),
    ]
}

fn history_lines<S: RosterStore>(session: &Session<S>, limit: usize) -> Vec<Line<'static>> {
    let recent = session.recent_picks(limit);
    if recent.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![Line::styled(
        "Recently Picked:",
        Style::default().fg(Color::Cyan),
    )];
    lines.extend(
        recent
            .iter()
            .map(|p| Line::styled(format!("  {}", p.display_line()), Color::Yellow)),
    );
    lines
}

fn render_announcement(frame: &mut Frame, announcement: &Announcement, area: Rect) {
    let Some(text) = announcement.text() else {
        return;
    };
    let [label, boxed] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(3)]).areas(area);

    frame.render_widget(
        Paragraph::new(PICK_LABEL)
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        label,
    );

    let width = u16::try_from(text.chars().count() + 4).unwrap_or(u16::MAX);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double),
            ),
        centered(boxed, width),
    );
}

/// `width` columns of `area`, horizontally centred.
fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn indent(area: Rect, by: u16) -> Rect {
    let by = by.min(area.width);
    Rect {
        x: area.x + by,
        width: area.width - by,
        ..area
    }
}

fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("Session duration: {}m {}s", secs / 60, secs % 60)
}
