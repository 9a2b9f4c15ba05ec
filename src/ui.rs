pub mod leaderboard;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState};
use crate::engine::{CharStatus, Engine, WordVerdict};
use crate::language::Language;
use crate::session::SessionConfig;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Words shown at once; the page flips when the cursor leaves it
pub const WORDS_PER_PAGE: usize = 24;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            AppState::Leaderboard => leaderboard::render(self, area, buf),
        }
    }
}

/// `english [russian]   15s [30s] 60s` with the current choice bracketed
fn settings_line(current: SessionConfig) -> Line<'static> {
    let languages = Language::ALL
        .iter()
        .map(|l| {
            if *l == current.language {
                format!("[{l}]")
            } else {
                l.to_string()
            }
        })
        .join(" ");
    let durations = SessionConfig::DURATION_PRESETS
        .iter()
        .map(|d| {
            if *d == current.duration_secs {
                format!("[{d}s]")
            } else {
                format!("{d}s")
            }
        })
        .join(" ");

    Line::from(vec![
        Span::styled(languages, Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(durations, Style::default().fg(Color::Cyan)),
    ])
}

/// Spans for the visible page of the word stream
pub fn word_spans(engine: &Engine) -> Vec<Span<'static>> {
    let current = engine.state().current_word_index;
    let start = current - current % WORDS_PER_PAGE;
    let verdicts = engine.verdicts();

    let green = bold().fg(Color::Green);
    let red = bold().fg(Color::Red);

    engine
        .words()
        .window(start, WORDS_PER_PAGE)
        .iter()
        .enumerate()
        .flat_map(|(offset, word)| {
            let idx = start + offset;
            let separator = (offset > 0).then(|| Span::raw(" "));
            let spans = if idx == current {
                current_word_spans(engine, word)
            } else if idx < current {
                let style = match verdicts.get(idx) {
                    Some(WordVerdict::Correct) => green,
                    _ => red.add_modifier(Modifier::CROSSED_OUT),
                };
                vec![Span::styled(word.clone(), style)]
            } else {
                vec![Span::styled(word.clone(), dim_bold())]
            };
            separator.into_iter().chain(spans)
        })
        .collect_vec()
}

fn current_word_spans(engine: &Engine, word: &str) -> Vec<Span<'static>> {
    let input = &engine.state().current_input;
    let statuses = engine.current_char_statuses();
    let mut extras = input.chars().skip(word.chars().count());
    let mut cursor_drawn = false;

    word.chars()
        .map(Some)
        .chain(std::iter::repeat(None))
        .zip(statuses)
        .map(|(expected, status)| {
            let (text, style) = match (status, expected) {
                (CharStatus::Correct, Some(c)) => (c, bold().fg(Color::Green)),
                (CharStatus::Incorrect, Some(c)) => (c, bold().fg(Color::Red)),
                (CharStatus::Pending, Some(c)) if !cursor_drawn => {
                    cursor_drawn = true;
                    (c, dim_bold().add_modifier(Modifier::UNDERLINED))
                }
                (CharStatus::Pending, Some(c)) => (c, dim_bold()),
                _ => (
                    extras.next().unwrap_or('?'),
                    Style::default().fg(Color::Red).add_modifier(Modifier::CROSSED_OUT),
                ),
            };
            Span::styled(text.to_string(), style)
        })
        .collect()
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = app.engine();
    let spans = word_spans(engine);

    let max_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize;
    let text_width: usize = spans.iter().map(|s| s.content.width()).sum();
    let prompt_lines = (text_width.div_ceil(max_width) as u16 + 1).max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(prompt_lines + 4) / 2),
            Constraint::Length(2),
            Constraint::Length(prompt_lines),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    let timer = Paragraph::new(Span::styled(
        engine.state().time_remaining_secs.to_string(),
        if engine.is_running() {
            bold().fg(Color::Yellow)
        } else {
            dim_bold()
        },
    ))
    .alignment(Alignment::Center);
    timer.render(chunks[1], buf);

    Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let footer = if engine.is_running() {
        vec![Line::from(Span::styled(
            "(←) restart / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))]
    } else {
        vec![
            settings_line(engine.config()),
            Line::from(Span::styled(
                "start typing / (tab) language / (↑↓) duration / (esc)ape",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ]
    };
    Paragraph::new(footer)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}

fn profile_line(app: &App) -> String {
    let profile = app.profile();
    let mut parts = vec![
        profile.username.clone(),
        format!("{} coins", profile.coins),
    ];
    if let Some(best) = profile.best_wpm {
        parts.push(format!("best {best} wpm"));
    }
    if let Some(rank) = profile.rank {
        parts.push(format!("rank #{rank}"));
    }
    parts.push(app.backend().to_string());
    parts.join(" · ")
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = app.engine();
    let Some(result) = engine.result() else {
        Paragraph::new("no result yet").render(area, buf);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // headline
            Constraint::Length(1), // word counts
            Constraint::Length(1), // padding
            Constraint::Length(1), // profile
            Constraint::Length(1), // notice
            Constraint::Min(0),
            Constraint::Length(1), // settings
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} score",
            result.wpm, result.accuracy, result.score
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} correct · {} incorrect · {}s {}",
            result.correct_words,
            result.incorrect_words,
            result.duration_secs,
            engine.config().language
        ),
        dim_bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        profile_line(app),
        Style::default().fg(Color::Cyan),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    if let Some(notice) = app.profile().notice {
        let color = match notice {
            crate::profile::Notice::SubmissionFailed => Color::Red,
            crate::profile::Notice::Rewarded { .. } => Color::Yellow,
            _ => Color::Gray,
        };
        Paragraph::new(Span::styled(
            notice.to_string(),
            Style::default().fg(color).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
    }

    Paragraph::new(settings_line(engine.config()))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (l)eaderboard / (tab) language / (↑↓) duration / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[8], buf);
}
