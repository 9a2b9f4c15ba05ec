use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::app::App;
use crate::leaderboard::{LeaderboardEntry, LeaderboardPage};

/// Pure presenter for one standings row
pub fn present_row(entry: &LeaderboardEntry, is_me: bool) -> Row<'static> {
    let rank_color = match entry.rank {
        1 => Color::Yellow,
        2 => Color::White,
        3 => Color::Rgb(205, 127, 50),
        _ => Color::Gray,
    };

    let reward = if entry.potential_reward > 0 {
        format!("+{}", entry.potential_reward)
    } else {
        "-".to_string()
    };

    let best = entry
        .best_wpm
        .map(|w| w.to_string())
        .unwrap_or_else(|| "-".to_string());

    let row = Row::new(vec![
        Cell::from(format!("#{}", entry.rank)).style(Style::default().fg(rank_color)),
        Cell::from(entry.username.clone()),
        Cell::from(entry.attempts_count.to_string()),
        Cell::from(best),
        Cell::from(format!("{:.0}", entry.total_score)),
        Cell::from(reward).style(Style::default().fg(Color::Yellow)),
    ]);

    if is_me {
        row.style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        row
    }
}

fn standings_table(page: &LeaderboardPage) -> Table<'static> {
    let header = Row::new(vec!["Rank", "Player", "Games", "Best", "Score", "Reward"]).style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::UNDERLINED),
    );

    let rows: Vec<Row> = page
        .entries
        .iter()
        .map(|entry| present_row(entry, page.is_current_user(entry)))
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Today's challenge "),
    )
}

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .vertical_margin(1)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    let view = app.leaderboard();
    let status = match (&view.error, view.loading, &view.page) {
        (Some(err), _, _) => Span::styled(
            format!("could not load leaderboard: {err}"),
            Style::default().fg(Color::Red),
        ),
        (None, true, _) => Span::styled("loading...", Style::default().fg(Color::Gray)),
        (None, false, Some(page)) if page.entries.is_empty() => Span::styled(
            "no attempts yet today, be the first",
            Style::default().fg(Color::Gray),
        ),
        (None, false, Some(page)) => match page.current_user_rank {
            Some(rank) => Span::styled(
                format!("you are #{rank} · top 3 share the season rewards"),
                Style::default().fg(Color::Cyan),
            ),
            None => Span::styled(
                "finish a session to enter the standings",
                Style::default().fg(Color::Gray),
            ),
        },
        (None, false, None) => Span::raw(""),
    };

    if let Some(page) = &view.page {
        standings_table(page).render(chunks[0], buf);
    } else {
        Block::default()
            .borders(Borders::ALL)
            .title(" Today's challenge ")
            .render(chunks[0], buf);
    }

    Paragraph::new(status)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(b)ack / (r)efresh / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u32, name: &str, score: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            user_id: None,
            username: name.into(),
            avatar_url: None,
            total_score: score,
            attempts_count: 2,
            best_wpm: Some(64),
            potential_reward: crate::leaderboard::season_reward(rank),
        }
    }

    fn rendered(page: &LeaderboardPage) -> String {
        let area = Rect::new(0, 0, 70, 12);
        let mut buf = Buffer::empty(area);
        standings_table(page).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn table_lists_entries() {
        let page = LeaderboardPage {
            entries: vec![entry(1, "nova", 310.4), entry(4, "kai", 90.0)],
            current_user_rank: Some(4),
        };

        let text = rendered(&page);

        assert!(text.contains("nova"));
        assert!(text.contains("310"));
        assert!(text.contains("+50"));
        assert!(text.contains("kai"));
        assert!(text.contains("Reward"));
    }

    #[test]
    fn current_user_row_is_highlighted() {
        let me = entry(2, "kai", 10.0);
        let styled = present_row(&me, true);
        let plain = present_row(&me, false);

        assert_ne!(
            format!("{styled:?}"),
            format!("{plain:?}"),
        );
    }
}
