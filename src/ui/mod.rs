use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Control};
use crate::archive::{ArchiveView, TermMatcher};

pub fn draw_app(frame: &mut Frame, app: &App) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let view = app.view();
    draw_controls(frame, app, vertical[0]);

    let matcher = TermMatcher::new(&view.term);
    let highlight_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let list_style = focus_style(app.focus() == Control::Pages);
    let listing = Paragraph::new(archive_lines(view, matcher.regex(), highlight_style))
        .block(
            Block::default()
                .title("Archive")
                .borders(Borders::ALL)
                .border_style(list_style),
        )
        .scroll((app.scroll(), 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(listing, vertical[1]);

    frame.render_widget(Paragraph::new(pagination_line(view)), vertical[2]);
    frame.render_widget(Paragraph::new(build_status_line(app)), vertical[3]);
}

fn draw_controls(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(10)])
        .split(area);
    let view = app.view();

    let year = Paragraph::new(Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::raw(view.selected_year_label().to_string()),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .title("Year")
            .borders(Borders::ALL)
            .border_style(focus_style(app.focus() == Control::Year)),
    );
    frame.render_widget(year, columns[0]);

    let search_focused = app.focus() == Control::Search;
    let mut title = String::from("Search");
    if app.search_pending() {
        title.push_str(" …");
    }
    let search = Paragraph::new(view.term.as_str()).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(focus_style(search_focused)),
    );
    frame.render_widget(search, columns[1]);

    if search_focused {
        let inner_width = columns[1].width.saturating_sub(2);
        let offset = (UnicodeWidthStr::width(view.term.as_str()) as u16).min(inner_width);
        frame.set_cursor(columns[1].x + 1 + offset, columns[1].y + 1);
    }
}

fn archive_lines(
    view: &ArchiveView,
    regex: Option<&Regex>,
    highlight_style: Style,
) -> Text<'static> {
    if view.sections.is_empty() {
        return Text::from(Line::from(Span::styled(
            "No matching posts.",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let date_style = Style::default().fg(Color::Gray);
    let mut lines = Vec::new();
    for section in &view.sections {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(section.label.clone(), header_style)));
        for post in &section.posts {
            let mut spans = vec![Span::raw("  ")];
            if let Some(datetime) = &post.datetime {
                spans.push(Span::styled(format!("{datetime}  "), date_style));
            }
            spans.extend(highlight_line(
                &post.title,
                regex,
                highlight_style,
                Style::default(),
            ));
            lines.push(Line::from(spans));
        }
    }
    Text::from(lines)
}

fn pagination_line(view: &ArchiveView) -> Line<'static> {
    let Some(info) = &view.page_info else {
        return Line::from(Span::styled(
            format!("{} shown", view.visible_posts()),
            Style::default().fg(Color::Gray),
        ));
    };
    let button = |label: &'static str, enabled: bool| {
        if enabled {
            Span::styled(
                format!("[{label}]"),
                Style::default().add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!("({label})"), Style::default().fg(Color::DarkGray))
        }
    };
    Line::from(vec![
        button("Previous", view.prev_enabled),
        Span::raw(format!(" {info} ")),
        button("Next", view.next_enabled),
    ])
}

fn build_status_line(app: &App) -> Text<'static> {
    let help = match app.focus() {
        Control::Year => "←/→ year • Tab next control • PgUp/PgDn page • q quit",
        Control::Search => "type to search • Enter apply now • Esc clear • Tab next control",
        Control::Pages => "←/→ page • ↑/↓ scroll • Tab next control • q quit",
    };
    Text::from(vec![
        Line::from(Span::styled(
            app.view().location.clone(),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            format!("[{}] {help}", app.focus()),
            Style::default().fg(Color::Gray),
        )),
    ])
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    let Some(re) = regex else {
        return vec![Span::styled(text.to_string(), base_style)];
    };
    let mut spans = Vec::new();
    let mut last = 0;
    for mat in re.find_iter(text) {
        if mat.start() > last {
            spans.push(Span::styled(text[last..mat.start()].to_string(), base_style));
        }
        spans.push(Span::styled(mat.as_str().to_string(), highlight_style));
        last = mat.end();
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), base_style));
    }
    if spans.is_empty() {
        spans.push(Span::styled(text.to_string(), base_style));
    }
    spans
}
