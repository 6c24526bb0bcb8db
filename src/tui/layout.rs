use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::config::ColorConfig;
use crate::domain::InteractionKind;
use crate::toggle::ToggleSnapshot;
use crate::tui::app::{ActivePane, TuiApp};

pub fn render(frame: &mut Frame, app: &mut TuiApp, colors: &ColorConfig) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(frame.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_notes_pane(frame, app, panes[0], colors);
    render_details_pane(frame, app, panes[1], colors);
    render_status_bar(frame, app, rows[1], colors);
}

fn border_style(app: &TuiApp, pane: ActivePane, colors: &ColorConfig) -> Style {
    if app.active_pane == pane {
        Style::default().fg(colors.active_border)
    } else {
        Style::default().fg(colors.inactive_border)
    }
}

fn render_notes_pane(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig) {
    let items: Vec<ListItem> = app
        .notes
        .iter()
        .enumerate()
        .map(|(i, note)| {
            // Membership markers are only known for the bound note.
            let (liked, bookmarked) = if i == app.note_index {
                (app.like.active, app.bookmark.active)
            } else {
                (false, false)
            };
            let line = Line::from(vec![
                Span::styled(
                    if liked { "♥ " } else { "  " },
                    Style::default().fg(colors.liked),
                ),
                Span::styled(
                    if bookmarked { "★ " } else { "  " },
                    Style::default().fg(colors.bookmarked),
                ),
                Span::raw(format!(
                    "{} ({}♥ {}↓)",
                    note.display_title(),
                    note.likes,
                    note.downloads
                )),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = format!(
        " Notes [{}] page {}/{} ({} total) ",
        app.query.sort,
        app.query.page,
        app.page_count(),
        app.total
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(app, ActivePane::Notes, colors));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(colors.selection_bg)
                .fg(colors.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn toggle_line(
    kind: InteractionKind,
    snapshot: &ToggleSnapshot,
    on: Color,
    colors: &ColorConfig,
) -> Line<'static> {
    let style = if snapshot.pending {
        Style::default().fg(colors.pending)
    } else if snapshot.active {
        Style::default().fg(on).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let heading = match kind {
        InteractionKind::Like => "Likes",
        InteractionKind::Bookmark => "Bookmarks",
    };
    let mut spans = vec![Span::styled(format!("{}: {}", heading, snapshot.count), style)];
    if snapshot.pending {
        spans.push(Span::styled(" …", style));
    } else {
        spans.push(Span::styled(
            format!("  [{}]", kind.label(snapshot.active)),
            Style::default().fg(colors.pending),
        ));
    }
    if let Some(error) = &snapshot.error {
        spans.push(Span::styled(
            format!("  {}", error),
            Style::default().fg(colors.error),
        ));
    }
    Line::from(spans)
}

fn render_details_pane(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let (title, content) = match app.selected_note() {
        Some(note) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    note.display_title().to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ];

            let subject = [note.subject.as_str(), note.level.as_str()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" · ");
            if !subject.is_empty() {
                lines.push(Line::from(Span::styled(
                    subject,
                    Style::default().fg(colors.metadata_subject),
                )));
            }
            lines.push(Line::from(Span::styled(
                format!("Uploaded: {}", note.created_at.format("%Y-%m-%d %H:%M")),
                Style::default().fg(colors.metadata_date),
            )));
            let tags = note.tag_list();
            if !tags.is_empty() {
                lines.push(Line::from(Span::styled(
                    tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" "),
                    Style::default().fg(colors.metadata_tags),
                )));
            }
            lines.push(Line::from(format!(
                "Size: {}   Downloads: {}",
                note.readable_size(),
                note.downloads
            )));
            lines.push(Line::from(""));
            lines.push(toggle_line(InteractionKind::Like, &app.like, colors.liked, colors));
            lines.push(toggle_line(InteractionKind::Bookmark, &app.bookmark, colors.bookmarked, colors));
            lines.push(Line::from(""));
            lines.push(Line::from(
                "─".repeat(area.width.saturating_sub(2) as usize),
            ));
            if note.description.is_empty() {
                lines.push(Line::from("No description."));
            } else {
                lines.extend(note.description.lines().map(|l| Line::from(l.to_string())));
            }

            (format!(" {} ", note.short_id()), Text::from(lines))
        }
        None => (" Details ".to_string(), Text::from("No notes found")),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(app, ActivePane::Details, colors));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.details_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let status = match (&app.status_message, &app.actor) {
        (Some(msg), _) => msg.clone(),
        (None, Some(actor)) => format!(
            "{}  j/k:Nav  n/p:Page  s:Sort  l:Like  b:Bookmark  d:Download  o:Open  r:Refresh  q:Quit",
            actor
        ),
        (None, None) => {
            "Not signed in  j/k:Nav  n/p:Page  s:Sort  d:Download  o:Open  r:Refresh  q:Quit"
                .to_string()
        }
    };

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(colors.status_fg).bg(colors.status_bg));

    frame.render_widget(paragraph, area);
}
