use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use sprintdesk_core::view::{Body, FormView, ListView, ScreenView};

use crate::app::App;

use super::styles;

/// Width of the text inside a form field
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let view = app.view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Breadcrumbs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, &view, chunks[0]);
    render_breadcrumbs(frame, &view, chunks[1]);
    render_body(frame, &view.body, chunks[2]);
    render_status_bar(frame, app, &view, chunks[3]);
}

fn render_title_bar(frame: &mut Frame, view: &ScreenView, area: Rect) {
    let title = if view.title.is_empty() {
        "  sprintdesk".to_string()
    } else {
        format!("  sprintdesk | {}", view.title)
    };
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + help_hint.len() + 4),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_breadcrumbs(frame: &mut Frame, view: &ScreenView, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    let last = view.breadcrumbs.len().saturating_sub(1);
    for (i, crumb) in view.breadcrumbs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" > ", styles::muted_style()));
        }
        spans.push(Span::styled(crumb.as_str(), styles::breadcrumb_style(i == last)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_body(frame: &mut Frame, body: &Body, area: Rect) {
    match body {
        Body::Blank => {}
        Body::Loading => render_message(frame, "Loading...", styles::muted_style(), area),
        Body::Error(message) => render_message(frame, message, styles::error_style(), area),
        Body::Text(lines) => {
            let lines: Vec<Line> = lines
                .iter()
                .map(|l| Line::from(Span::styled(format!(" {}", l), styles::list_item_style())))
                .collect();
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
        }
        Body::List(list) => render_list(frame, list, true, area),
        Body::Form(form) => render_form(frame, form, area),
        Body::Panels {
            header,
            panels,
            active,
        } => render_panels(frame, header, panels, *active, area),
    }
}

fn render_message(frame: &mut Frame, message: &str, style: Style, area: Rect) {
    let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {}", message), style)))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_list(frame: &mut Frame, list: &ListView, focused: bool, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", list.title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if list.items.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            list.empty_message.as_str(),
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = list
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if focused && list.selected == Some(i) {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(item.as_str())).style(style)
        })
        .collect();

    let mut state = ListState::default();
    state.select(list.selected);

    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_panels(frame: &mut Frame, header: &[String], panels: &[ListView], active: usize, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header.len() as u16), Constraint::Min(3)])
        .split(area);

    let lines: Vec<Line> = header
        .iter()
        .map(|h| Line::from(Span::styled(format!(" {}", h), styles::highlight_style())))
        .collect();
    frame.render_widget(Paragraph::new(lines), chunks[0]);

    if panels.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, panels.len() as u32); panels.len()];
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(chunks[1]);

    for (i, (panel, column)) in panels.iter().zip(columns.iter()).enumerate() {
        render_list(frame, panel, i == active, *column);
    }
}

fn render_form(frame: &mut Frame, form: &FormView, area: Rect) {
    // Fields, blank, button, notes, optional error, borders
    let mut height = form.fields.len() + 2 + form.notes.len() + 2;
    if form.error.is_some() {
        height += 2;
    }
    let dialog = centered_rect_fixed(60, height as u16 + 1, area);
    frame.render_widget(Clear, dialog);

    let label_width = form.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
    let mut lines = Vec::new();

    for (i, field) in form.fields.iter().enumerate() {
        let focused = form.focus == i;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let value = visible_tail(&field.value, FIELD_WIDTH);
        let cursor = if focused { "▌" } else { "" };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{:>width$}: [", field.label, width = label_width), styles::muted_style()),
            Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    lines.push(Line::from(""));
    let button_focused = form.focus == form.fields.len();
    let label = if form.busy {
        "Please wait...".to_string()
    } else {
        form.submit_label.clone()
    };
    let button = if button_focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let indent = 29usize.saturating_sub(button.chars().count() / 2);
    lines.push(Line::from(vec![
        Span::raw(format!("{}[", " ".repeat(indent))),
        Span::styled(button, button_style),
        Span::raw("]"),
    ]));

    for note in &form.notes {
        lines.push(Line::from(Span::styled(format!(" {}", note), styles::muted_style())));
    }

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_status_bar(frame: &mut Frame, app: &App, view: &ScreenView, area: Rect) {
    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", app.session_status()),
    };
    let right_text = match view.hint {
        Some(ref hint) => format!(" {} | [q]uit ", hint),
        None => " [q]uit ".to_string(),
    };

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

/// Last `width` characters, so the cursor end of a long value stays visible
fn visible_tail(value: &str, width: usize) -> String {
    let skip = value.chars().count().saturating_sub(width);
    value.chars().skip(skip).collect()
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
