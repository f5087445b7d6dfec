use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};
use speedgame::{Clock, HighscoreRecord};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::App;

const RANK_WIDTH: u16 = 6;
const SCORE_WIDTH: u16 = 12;

/// Shorten `text` to at most `max_width` terminal columns, marking the cut with `…`
pub fn fit_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Pure presenter for one ranked row
pub fn present_row(rank: usize, record: &HighscoreRecord, name_width: usize) -> Row<'static> {
    // Podium places stand out
    let rank_style = match rank {
        1 => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        2 | 3 => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    };

    Row::new(vec![
        Cell::from(format!("{rank}.")).style(rank_style),
        Cell::from(fit_to_width(&record.name, name_width)),
        Cell::from(record.score.to_string()),
    ])
}

pub fn render_highscores<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Highscores ({})", app.highscores.len()));

    if app.highscores.is_empty() {
        Paragraph::new("No highscores yet")
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .render(area, buf);
        return;
    }

    // Borders plus the two column gaps
    let name_width = area
        .width
        .saturating_sub(RANK_WIDTH + SCORE_WIDTH + 4) as usize;

    let rows: Vec<Row> = app
        .highscores
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .map(|(idx, record)| present_row(idx + 1, record, name_width))
        .collect();

    let header = Row::new(vec!["#", "Name", "Time (ms)"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(RANK_WIDTH),
            Constraint::Min(1),
            Constraint::Length(SCORE_WIDTH),
        ],
    )
    .header(header)
    .block(block);

    Widget::render(table, area, buf);
}
