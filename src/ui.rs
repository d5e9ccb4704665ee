use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::io::{self, Stdout};
use tracing::{info, warn};

use crate::input::{self, Action, Cursor, TextAction};
use crate::prompt::Prompter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

const BG: Color = Color::Rgb(9, 15, 25);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const MAX_NOTICES: usize = 12;

/// Full-screen pickers and prompts. The alternate screen is only held while
/// a question is open, so notices and subprocess output land on the normal
/// screen in between.
pub struct TerminalPrompter {
    banner: String,
    notices: Vec<String>,
}

enum Screen<'a> {
    Picker {
        title: &'a str,
        items: &'a [String],
        selected: usize,
    },
    Input {
        prompt: &'a str,
        buffer: &'a str,
    },
    Pause,
}

impl TerminalPrompter {
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
            notices: Vec::new(),
        }
    }

    async fn pick(&mut self, title: &str, items: &[String]) -> Result<Option<usize>> {
        let mut terminal = init_terminal()?;
        let mut events = EventStream::new();
        let mut cursor = Cursor::new(items.len());
        let mut page = 1;

        let picked = loop {
            let screen = Screen::Picker {
                title,
                items,
                selected: cursor.selected(),
            };
            let drawn = terminal.draw(|frame| {
                page = render(frame, &self.banner, &self.notices, &screen);
            });
            if let Err(error) = drawn {
                break Err(error).context("failed to render picker");
            }

            match events.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match input::map_key(key) {
                        Some(Action::Select) if !items.is_empty() => {
                            break Ok(Some(cursor.selected()));
                        }
                        Some(Action::Cancel) => break Ok(None),
                        Some(action) => cursor.apply(action, page),
                        None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => break Err(error).context("terminal event error"),
                None => break Ok(None),
            }
        };

        finish(&mut terminal, picked)
    }

    async fn read_text(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut terminal = init_terminal()?;
        let mut events = EventStream::new();
        let mut buffer = String::new();

        let answer = loop {
            let screen = Screen::Input {
                prompt,
                buffer: &buffer,
            };
            if let Err(error) = terminal.draw(|frame| {
                render(frame, &self.banner, &self.notices, &screen);
            }) {
                break Err(error).context("failed to render prompt");
            }

            match events.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match input::map_text_key(key) {
                        Some(TextAction::Char(c)) => buffer.push(c),
                        Some(TextAction::Backspace) => {
                            buffer.pop();
                        }
                        Some(TextAction::Submit) => break Ok(Some(buffer.clone())),
                        Some(TextAction::Cancel) => break Ok(None),
                        None => {}
                    }
                }
                Some(Ok(Event::Paste(text))) => {
                    buffer.push_str(text.trim_end_matches(['\r', '\n']));
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => break Err(error).context("terminal event error"),
                None => break Ok(None),
            }
        };

        finish(&mut terminal, answer)
    }

    async fn pause(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        let mut events = EventStream::new();

        let result = loop {
            if let Err(error) = terminal.draw(|frame| {
                render(frame, &self.banner, &self.notices, &Screen::Pause);
            }) {
                break Err(error).context("failed to render notices");
            }

            match events.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if matches!(input::map_key(key), Some(Action::Select | Action::Cancel)) {
                        break Ok(());
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => break Err(error).context("terminal event error"),
                None => break Ok(()),
            }
        };

        finish(&mut terminal, result)
    }
}

impl Prompter for TerminalPrompter {
    async fn choose(&mut self, title: &str, items: &[String]) -> Option<usize> {
        let picked = self.pick(title, items).await.unwrap_or_else(|error| {
            warn!("picker failed: {error:#}");
            None
        });
        self.notices.clear();
        picked
    }

    async fn input(&mut self, prompt: &str) -> Option<String> {
        self.read_text(prompt).await.unwrap_or_else(|error| {
            warn!("prompt failed: {error:#}");
            None
        })
    }

    fn notify(&mut self, message: &str) {
        info!("{message}");
        println!("{message}");
        self.notices.push(message.to_string());
        if self.notices.len() > MAX_NOTICES {
            let overflow = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..overflow);
        }
    }

    async fn acknowledge(&mut self) {
        if let Err(error) = self.pause().await {
            warn!("pause failed: {error:#}");
        }
        self.notices.clear();
    }
}

/// Draws one screen and returns the number of list rows visible.
fn render(frame: &mut Frame, banner: &str, notices: &[String], screen: &Screen<'_>) -> usize {
    let notice_height = if notices.is_empty() {
        0
    } else {
        notices.len().min(MAX_NOTICES) as u16 + 2
    };
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(notice_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(vec![Span::styled(
            format!(" {banner} "),
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(BG)),
        root[0],
    );

    if !notices.is_empty() {
        let lines = notices
            .iter()
            .map(|notice| Line::from(notice.as_str()))
            .collect::<Vec<_>>();
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(WARN))
                .block(Block::default().borders(Borders::ALL).title(" Notices ")),
            root[1],
        );
    }

    let hint = match screen {
        Screen::Picker {
            title,
            items,
            selected,
        } => {
            render_picker(frame, root[2], title, items, *selected);
            " ↑/↓ j/k move · g/G top/bottom · Enter select · Esc/q cancel"
        }
        Screen::Input { prompt, buffer } => {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::raw((*buffer).to_string()),
                    Span::styled("▏", Style::default().fg(ACCENT)),
                ]))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {} ", prompt.trim())),
                ),
                root[2],
            );
            " Enter accept (empty = default) · Esc/Ctrl+C cancel"
        }
        Screen::Pause => " Press Enter to continue"
    };

    frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(MUTED).bg(BG)),
        root[3],
    );

    root[2].height.saturating_sub(2) as usize
}

fn render_picker(frame: &mut Frame, area: Rect, title: &str, items: &[String], selected: usize) {
    let rows = items
        .iter()
        .map(|item| ListItem::new(item.as_str()))
        .collect::<Vec<_>>();
    let list = List::new(rows)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} ")),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Best-effort restore after the program is interrupted mid-screen.
pub fn reset_terminal() {
    if let Err(error) = disable_raw_mode() {
        warn!("failed to disable raw mode: {error}");
    }
    if let Err(error) = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show) {
        warn!("failed to restore terminal: {error}");
    }
}

fn finish<T>(terminal: &mut TuiTerminal, result: Result<T>) -> Result<T> {
    let restore_result = restore_terminal(terminal);
    match (result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(value), Ok(())) => Ok(value),
    }
}
