pub mod highscores;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Widget},
    Frame,
};
use speedgame::Clock;

use crate::{ui::screen::current_screen, App, Tab};

const DIALOG_WIDTH: u16 = 44;
const DIALOG_HEIGHT: u16 = 7;

pub fn draw<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Screen
                Constraint::Length(1), // Status / key hints
            ])
            .split(area);

        render_header(chunks[0], buf);

        let titles = Tab::ALL.iter().map(|t| t.to_string());
        Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL))
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("|")
            .render(chunks[1], buf);

        let screen = current_screen::<C>(self.tab);
        screen.render(self, chunks[2], buf);

        let footer = match &self.status {
            Some(status) => {
                let color = if status.is_error {
                    Color::Red
                } else {
                    Color::Green
                };
                Paragraph::new(Span::styled(
                    status.text.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
            }
            None => Paragraph::new(Span::styled(
                screen.key_hints(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        };
        footer.alignment(Alignment::Center).render(chunks[3], buf);

        if self.dialog_visible {
            render_dialog(&self.name, area, buf);
        }
    }
}

fn render_header(area: Rect, buf: &mut Buffer) {
    let bar = Style::default().bg(Color::Blue).fg(Color::White);
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    Paragraph::new(Span::styled(
        " Speed Game",
        bar.add_modifier(Modifier::BOLD),
    ))
    .style(bar)
    .render(halves[0], buf);

    Paragraph::new("[X] Reset Highscores ")
        .style(bar)
        .alignment(Alignment::Right)
        .render(halves[1], buf);
}

fn render_dialog(name: &str, area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);
    Clear.render(popup, buf);

    let input = if name.is_empty() {
        Span::styled(
            "Enter name",
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        )
    } else {
        Span::styled(name.to_string(), Style::default().add_modifier(Modifier::BOLD))
    };

    let lines = vec![
        Line::from(""),
        Line::from(vec![Span::raw("Name: "), input, Span::raw("_")]),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Add    [Esc] Cancel",
            Style::default().fg(Color::Yellow),
        )),
    ];

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Add a highscore"),
        )
        .alignment(Alignment::Center)
        .render(popup, buf);
}

/// `width` x `height` rectangle centered in `area`, shrunk to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}
