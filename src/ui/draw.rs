use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::RgbColor;

use super::app::{App, LoadState};
use super::list::ContactRow;

const FOOTER_HELP: &str = "Type to filter  Up/Down: select  Enter: dial  F1: help  Esc: quit";
const HELP_MODAL_FOOTER: &str = "Esc/Enter: close";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_search(frame, layout[1], app);
    draw_contacts(frame, layout[2], app);
    draw_footer(frame, layout[3], app);
    draw_help_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(area);

    let header_style = header_text_style(app);
    let left = Line::from(vec![
        Span::styled("RDIAL ", header_style.add_modifier(Modifier::BOLD)),
        Span::styled(app.source_url().to_string(), header_style),
    ]);
    frame.render_widget(Paragraph::new(left), chunks[0]);

    let state = match &app.load_state {
        LoadState::Idle => "IDLE".to_string(),
        LoadState::Loading => "LOADING...".to_string(),
        LoadState::Loaded { count } => format!("{} CONTACTS", count),
        LoadState::Failed { .. } => "LOAD FAILED".to_string(),
    };
    let state_style = match app.load_state {
        LoadState::Failed { .. } => selection_style(app),
        _ => header_style,
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(state, state_style))).alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_search(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app))
        .title(Span::styled(" SEARCH ", header_text_style(app)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let value = app.search.value();
    frame.render_widget(Paragraph::new(Line::from(value.to_string())), inner);

    if !app.show_help {
        let x = inner.x.saturating_add(app.search.visual_cursor() as u16);
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

fn draw_contacts(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let title = format!(" CONTACTS {}/{} ", app.view.len(), app.total_contacts());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app))
        .title(Span::styled(title, header_text_style(app)));

    if app.view.is_empty() {
        let message = match &app.load_state {
            LoadState::Loading => "Loading contacts...",
            LoadState::Failed { .. } => "Could not load contacts",
            _ => "No contacts",
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_centered_words(frame, inner, message);
        return;
    }

    let name_width = app
        .view
        .rows()
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0);
    let phone_width = app
        .view
        .rows()
        .iter()
        .map(|row| row.phone.chars().count())
        .max()
        .unwrap_or(0);

    let items: Vec<ListItem> = app
        .view
        .rows()
        .iter()
        .map(|row| build_contact_item(row, app, name_width, phone_width))
        .collect();

    let mut state = ListState::default();
    state.select(app.view.selected());

    let list = List::new(items)
        .block(block)
        .highlight_style(selection_style(app))
        .highlight_symbol(" ")
        .repeat_highlight_symbol(false);

    frame.render_stateful_widget(list, area, &mut state);
}

fn build_contact_item(
    row: &ContactRow,
    app: &App,
    name_width: usize,
    phone_width: usize,
) -> ListItem<'static> {
    let line = Line::from(vec![
        Span::raw(format!("{:<width$}", row.name, width = name_width)),
        Span::styled(" / ", separator_style(app)),
        Span::raw(format!("{:<width$}", row.phone, width = phone_width)),
        Span::styled(" / ", separator_style(app)),
        Span::styled(row.kind.clone(), header_text_style(app)),
    ]);
    ListItem::new(line)
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message = app
        .status
        .clone()
        .unwrap_or_else(|| FOOTER_HELP.to_string());
    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    if !app.show_help {
        return;
    }

    let entries = app.help_entries();
    let action_width = entries
        .iter()
        .map(|(action, _)| action.len())
        .max()
        .unwrap_or(0);

    let mut lines: Vec<Line> = entries
        .into_iter()
        .map(|(action, keys)| {
            Line::from(vec![
                Span::styled(
                    format!("{:<width$}  ", action, width = action_width),
                    header_text_style(app),
                ),
                Span::raw(keys),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(HELP_MODAL_FOOTER, separator_style(app))));

    let content_width = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let width = content_width.saturating_add(4).min(area.width);
    let height = (lines.len() as u16).saturating_add(2).min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app))
        .title(Span::styled(" HELP ", header_text_style(app)));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.border))
}

fn header_text_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.separator))
}

fn separator_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.separator))
}

fn render_centered_words(frame: &mut Frame<'_>, area: Rect, text: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let target = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1) / 2,
        width: area.width,
        height: 1,
    };

    frame.render_widget(Paragraph::new(text.to_string()).alignment(Alignment::Center), target);
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
