use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use noughts::{Board, Cell, Mark, Outcome};
use noughts_server::{ServerEvent, VacateReason};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub elapsed_secs: u64,
    pub level: LogLevel,
    pub text: String,
}

pub struct TuiState {
    started: Instant,
    listening: Option<SocketAddr>,
    seats: [Option<SocketAddr>; 2],
    board: Board,
    turn: Mark,
    outcome: Outcome,
    log: VecDeque<LogLine>,
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            listening: None,
            seats: [None, None],
            board: Board::new(),
            turn: Mark::X,
            outcome: Outcome::InProgress,
            log: VecDeque::new(),
            scroll: 0,
        }
    }

    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Listening { addr } => {
                self.listening = Some(addr);
                self.log_info(format!("Listening on {}", addr));
            }
            ServerEvent::PeerAdmitted { seat, addr } => {
                self.seats[seat.index()] = Some(addr);
                self.log_info(format!("Player {} connected from {}", seat, addr));
            }
            ServerEvent::HandshakeRejected { addr, reason } => {
                self.log_warn(format!("Rejected {}: {}", addr, reason));
            }
            ServerEvent::SeatVacated { seat, reason } => {
                self.seats[seat.index()] = None;
                let text = format!("Player {} {}", seat, reason.as_str());
                if reason == VacateReason::WriteFailed {
                    self.log_warn(text);
                } else {
                    self.log_info(text);
                }
            }
            ServerEvent::GameStarted => {
                self.outcome = Outcome::InProgress;
                self.log_info("Game started");
            }
            ServerEvent::MoveAccepted { seat, position } => {
                self.log_info(format!("Player {} played {}", seat, position));
            }
            ServerEvent::BoardChanged { board, turn } => {
                self.board = board;
                self.turn = turn;
            }
            ServerEvent::GameOver { outcome } => {
                self.outcome = outcome;
                match outcome {
                    Outcome::Win(mark) => self.log_info(format!("Player {} wins", mark)),
                    Outcome::Draw => self.log_info("Draw"),
                    Outcome::InProgress => {}
                }
            }
            ServerEvent::Restarted => {
                self.outcome = Outcome::InProgress;
                self.log_info("Restarted by agreement");
            }
            ServerEvent::Error { message } => self.log_error(message),
        }
    }

    pub fn seat(&self, seat: Mark) -> Option<SocketAddr> {
        self.seats[seat.index()]
    }

    pub fn log_info(&mut self, text: impl Into<String>) {
        self.push_log(LogLevel::Info, text.into());
    }

    pub fn log_warn(&mut self, text: impl Into<String>) {
        self.push_log(LogLevel::Warn, text.into());
    }

    pub fn log_error(&mut self, text: impl Into<String>) {
        self.push_log(LogLevel::Error, text.into());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 5).min(self.log.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    fn push_log(&mut self, level: LogLevel, text: String) {
        if self.log.len() >= MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(LogLine {
            elapsed_secs: self.started.elapsed().as_secs(),
            level,
            text,
        });
    }
}

pub fn render(frame: &mut Frame, state: &TuiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    render_header(frame, rows[0], state);
    render_seats(frame, middle[0], state);
    render_board(frame, middle[1], state);
    render_log(frame, rows[2], state);
    render_help(frame, rows[3]);
}

fn render_header(frame: &mut Frame, area: Rect, state: &TuiState) {
    let uptime = format_duration(state.started.elapsed().as_secs());
    let block = Block::default()
        .title(format!(" Noughts Server - Uptime: {} ", uptime))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let listening = state
        .listening
        .map_or_else(|| String::from("-"), |addr| addr.to_string());
    let status = match state.outcome {
        Outcome::InProgress => format!("turn {}", state.turn),
        Outcome::Win(mark) => format!("{} won", mark),
        Outcome::Draw => String::from("draw"),
    };

    let paragraph = Paragraph::new(format!("Listening: {}  |  Game: {}", listening, status))
        .block(block)
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_seats(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Seats ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let lines: Vec<Line> = Mark::ALL
        .iter()
        .map(|&seat| {
            let (text, color) = match state.seat(seat) {
                Some(addr) => (addr.to_string(), Color::White),
                None => (String::from("waiting..."), Color::DarkGray),
            };
            Line::from(vec![
                Span::styled(format!("Player {}: ", seat), Style::default().fg(Color::Gray)),
                Span::styled(text, Style::default().fg(color)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_board(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Board ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines: Vec<Line> = state
        .board
        .rows()
        .iter()
        .map(|row| {
            let mut spans = Vec::with_capacity(5);
            for (col, cell) in row.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
                }
                let color = match cell {
                    Cell::X => Color::LightRed,
                    Cell::O => Color::LightBlue,
                    Cell::Empty => Color::DarkGray,
                };
                let symbol = if cell.is_empty() { '.' } else { cell.as_char() };
                spans.push(Span::styled(
                    symbol.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Events ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let visible = area.height.saturating_sub(2) as usize;
    let end = state.log.len().saturating_sub(state.scroll);
    let start = end.saturating_sub(visible);

    let lines: Vec<Line> = state
        .log
        .range(start..end)
        .map(|line| {
            let color = match line.level {
                LogLevel::Info => Color::White,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", format_duration(line.elapsed_secs)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(line.text.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q/ESC quit  |  PgUp/PgDn scroll  |  End follow")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
