use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::answer_key::ActivityKind;
use crate::config::ActivityConfig;
use crate::progress::ProgressSnapshot;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Preparing(String),
    Running,
    Finished(String),
    Failed(String),
}

/// Everything the progress screen shows. Updated from the progress
/// channel, rendered on each tick.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub activity: String,
    pub kind: ActivityKind,
    pub config: ActivityConfig,
    pub snapshot: ProgressSnapshot,
    pub status: Status,
}

impl Dashboard {
    pub fn new(activity: &str, kind: ActivityKind, config: ActivityConfig) -> Self {
        let limit = config.time_limit().as_secs();
        Self {
            activity: activity.to_string(),
            kind,
            config,
            snapshot: ProgressSnapshot::new(limit, 0, 0),
            status: Status::Preparing("starting".into()),
        }
    }

    pub fn update(&mut self, snapshot: ProgressSnapshot) {
        self.snapshot = snapshot;
        self.status = Status::Running;
    }

    /// Label/value rows, shared by the dashboard and plain output.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let config = &self.config;
        vec![
            ("Duration", format!("{} min", config.time_limit_minutes())),
            ("Time Left", self.snapshot.time_left()),
            ("Current Words", self.snapshot.words()),
            ("Word Target", config.word_target().to_string()),
            ("Current Percent", self.snapshot.percent()),
            ("Target Percent", format!("{}%", config.target_percent())),
            ("Seconds per Word", format!("{}", config.seconds_per_word())),
            (
                "Auto Submitting",
                if config.auto_submit() { "yes" } else { "no" }.to_string(),
            ),
        ]
    }

    pub fn status_line(&self) -> String {
        match &self.status {
            Status::Preparing(step) => format!("preparing: {step}"),
            Status::Running => "running, press Esc to stop".to_string(),
            Status::Finished(summary) => format!("finished: {summary}"),
            Status::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

impl Widget for &Dashboard {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let status_style = match self.status {
            Status::Failed(_) => Style::default().patch(bold_style).fg(Color::Red),
            Status::Finished(_) => Style::default().patch(bold_style).fg(Color::Green),
            _ => Style::default().patch(bold_style).fg(Color::Yellow),
        };

        let rows = self.rows();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(rows.len() as u16 + 2),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        let lines = rows
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label:>17}: "), dim_style),
                    Span::styled(value, bold_style),
                ])
            })
            .collect::<Vec<_>>();

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ({}) ", self.activity, self.kind)),
            )
            .render(chunks[0], buf);

        Paragraph::new(Span::styled(self.status_line(), status_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);
    }
}
