use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Paragraph, Widget, Wrap,
    },
};
use speedgame::Clock;

use crate::{ui::highscores::render_highscores, App, Tab};

/// A tab's body: rendering plus the key hints shown while it is active
pub trait Screen<C: Clock> {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer);
    fn key_hints(&self) -> &'static str;
}

/// Game tab - intro, the circle, the current time and the game actions
pub struct GameScreen;

impl<C: Clock> Screen<C> for GameScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Intro
                Constraint::Min(0),    // Circle
                Constraint::Length(2), // Time
                Constraint::Length(1), // Actions
            ])
            .split(area);

        Paragraph::new("Double tap the circle as fast as you can!")
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[0], buf);

        render_circle(app.timing.is_armed(), chunks[1], buf);

        Paragraph::new(Line::from(vec![
            Span::raw("Time: "),
            Span::styled(
                app.timing.current_score().to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" ms"),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        Paragraph::new("[a] Add Highscore     [r] Reset")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    fn key_hints(&self) -> &'static str {
        "(space) tap  (tab) highscores  (esc) quit"
    }
}

/// Highscores tab - ranked table, fastest first
pub struct HighscoresScreen;

impl<C: Clock> Screen<C> for HighscoresScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        render_highscores(app, area, buf);
    }

    fn key_hints(&self) -> &'static str {
        "(↑/↓) scroll  (tab) game  (esc) quit"
    }
}

/// Helper to construct the screen for the active tab
pub fn current_screen<C: Clock>(tab: Tab) -> Box<dyn Screen<C>> {
    match tab {
        Tab::Game => Box::new(GameScreen),
        Tab::Highscores => Box::new(HighscoresScreen),
    }
}

fn render_circle(armed: bool, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    // Terminal cells are about twice as tall as they are wide
    let width = area.height.saturating_mul(2).min(area.width);
    let circle_area = Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height);
    let color = if armed { Color::Yellow } else { Color::Red };

    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: 0.95,
                color,
            });
        })
        .render(circle_area, buf);
}
