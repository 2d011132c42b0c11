use jiff::{Timestamp, tz::TimeZone};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::{
    models::Movie,
    tui::{
        app::{App, BottomButton, MainFocus, Modal, WarningChoice},
        form::{FormFocus, FormMode, InputField, LIST_HINT},
    },
};

pub const COLUMNS: [&str; 7] =
    ["Date Added", "Year", "Title", "Your Rating", "IMDB Score", "Directors", "Genres"];

const HEADER_BG: Color = Color::Rgb(40, 40, 40);
const ODD_ROW_BG: Color = Color::Rgb(60, 60, 60);
const EVEN_ROW_BG: Color = Color::Rgb(80, 80, 80);
const SELECTED_BG: Color = Color::Rgb(140, 140, 140);
const MODAL_WIDTH: u16 = 44;

pub fn format_date(secs: i64, tz: &TimeZone) -> String {
    Timestamp::from_second(secs)
        .map(|ts| ts.to_zoned(tz.clone()).date().to_string())
        .unwrap_or_default()
}

/// Text of one data cell. Absent ratings render empty, never as zero.
pub fn cell_text(movie: &Movie, col: usize, tz: &TimeZone) -> String {
    match col {
        0 => format_date(movie.date, tz),
        1 => movie.year.to_string(),
        2 => movie.title.clone(),
        3 => movie.rating.map(|r| r.to_string()).unwrap_or_default(),
        4 => movie.imdb_rating.map(|r| r.to_string()).unwrap_or_default(),
        5 => movie.directors.join(", "),
        6 => movie.genres.join(", "),
        _ => String::new(),
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(frame.area());

    let header = Paragraph::new(app.header())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    draw_table(frame, chunks[1], app);
    draw_buttons(frame, chunks[2], app);

    for modal in &app.pages {
        match modal {
            Modal::Add => draw_movie_form(frame, app),
            Modal::Filter => draw_filter_form(frame, app),
            Modal::Warning => draw_warning(frame, app),
        }
    }
}

fn pane_border(focused: bool) -> Style {
    if focused { Style::default().fg(Color::Yellow) } else { Style::default() }
}

fn draw_table(frame: &mut Frame, area: Rect, app: &App) {
    let tz = &app.time_zone;
    let visible = app.visible();

    let header = Row::new(
        COLUMNS.iter().map(|c| Cell::from(Line::from(*c).alignment(Alignment::Center))),
    )
    .style(Style::default().fg(Color::Yellow).bg(HEADER_BG));

    // Data rows start at table row 1, so the first one takes the odd shade.
    let rows = visible.iter().enumerate().map(|(i, movie)| {
        let bg = if i % 2 == 0 { ODD_ROW_BG } else { EVEN_ROW_BG };
        let cells = (0..COLUMNS.len()).map(|col| {
            let line = Line::from(cell_text(movie, col, tz));
            Cell::from(if col == 1 { line.alignment(Alignment::Right) } else { line })
        });
        Row::new(cells).style(Style::default().fg(Color::White).bg(bg))
    });

    let focused = app.top().is_none() && app.main_focus == MainFocus::Table;
    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Table [ Ctrl-K ] ")
                .border_style(pane_border(focused)),
        )
        .row_highlight_style(Style::default().bg(SELECTED_BG));

    let mut state = TableState::default();
    if !visible.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn button(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let style = match (focused, enabled) {
        (_, false) => Style::default().fg(Color::DarkGray),
        (true, true) => Style::default().add_modifier(Modifier::REVERSED),
        (false, true) => Style::default(),
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn draw_buttons(frame: &mut Frame, area: Rect, app: &App) {
    let focused = |b| app.top().is_none() && app.main_focus == MainFocus::Buttons(b);
    let line = Line::from(vec![
        button("Add Movie", focused(BottomButton::Add), true),
        Span::raw("        "),
        button("Filter", focused(BottomButton::Filter), true),
    ]);

    let any_focused = matches!(app.main_focus, MainFocus::Buttons(_)) && app.top().is_none();
    let bar = Paragraph::new(line).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Buttons [ Ctrl-J ] ")
            .border_style(pane_border(any_focused)),
    );
    frame.render_widget(bar, area);
}

fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn field_line<'a>(field: &'a InputField, focused: bool) -> Line<'a> {
    let value_style = if focused {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    Line::from(vec![
        Span::styled(field.label, Style::default().fg(Color::Yellow)),
        Span::styled(field.text(), value_style),
    ])
}

/// Draws a bordered form and places the cursor at the end of the focused field.
fn draw_form(
    frame: &mut Frame,
    title: &str,
    fields: &[InputField],
    focus: FormFocus,
    footer: Vec<Line<'_>>,
) {
    // One spare row for a wrapped footer line.
    let height = fields.len() as u16 + footer.len() as u16 + 3;
    let area = centered(MODAL_WIDTH, height, frame.area());

    let mut lines: Vec<Line> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| field_line(field, focus == FormFocus::Item(i)))
        .collect();
    lines.extend(footer);

    let block = Block::default().borders(Borders::ALL).title(format!(" {title} "));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);

    if let FormFocus::Item(i) = focus {
        let field = &fields[i];
        let x = inner.x + (field.label.chars().count() + field.text().chars().count()) as u16;
        let y = inner.y + i as u16;
        if x < inner.right() && y < inner.bottom() {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

fn draw_movie_form(frame: &mut Frame, app: &App) {
    let form = &app.form;
    let footer = vec![
        Line::raw(""),
        Line::styled(LIST_HINT, Style::default().fg(Color::Gray)),
        Line::raw(""),
        Line::from(button(
            form.button_label(),
            form.focus == FormFocus::Button,
            form.submit_enabled(),
        )),
    ];
    let title = match form.mode {
        FormMode::Add => "Add Movie",
        FormMode::Edit(_) => "Edit Movie",
    };
    draw_form(frame, title, &form.fields, form.focus, footer);
}

fn draw_filter_form(frame: &mut Frame, app: &App) {
    let form = &app.filter_form;
    let footer = vec![
        Line::raw(""),
        Line::from(button("Apply", form.focus == FormFocus::Button, true)),
    ];
    draw_form(frame, "Filter", &form.fields, form.focus, footer);
}

fn draw_warning(frame: &mut Frame, app: &App) {
    let Some(warning) = &app.warning else {
        return;
    };
    let area = centered(MODAL_WIDTH, 7, frame.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .margin(1)
        .split(area);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(" Warning ")
            .border_style(Style::default().fg(Color::Red)),
        area,
    );
    frame.render_widget(
        Paragraph::new(warning.message()).alignment(Alignment::Center).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let buttons = Line::from(vec![
        button("Yes", warning.choice == WarningChoice::Yes, true),
        Span::raw("    "),
        button("No", warning.choice == WarningChoice::No, true),
    ]);
    frame.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[1]);
}
