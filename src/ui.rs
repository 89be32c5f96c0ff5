use crate::dashboard::{Control, Dashboard};
use crate::task::{Task, TaskPriority, TaskStatus};
use crate::task_form::{Field, FormMode};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

const CARD_HEIGHT: u16 = 8;
const HELP: &str = "n new  e edit  d delete  c complete  arrows move  q quit";

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, dashboard: &mut Dashboard) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, dashboard))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if dashboard.handle_key(key) == Control::Quit {
                return Ok(());
            }
        }
    }
}

pub fn render(f: &mut Frame, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            "Agile Task Dashboard",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(dashboard.summary()),
    ])
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    render_cards(f, dashboard, chunks[1]);
    f.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );

    if dashboard.form().is_open() {
        render_form(f, dashboard);
    }
    if let Some(task) = dashboard.pending_delete() {
        render_confirm(f, task);
    }
}

fn render_cards(f: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let tasks = dashboard.store().list();
    if tasks.is_empty() {
        f.render_widget(
            Paragraph::new("No tasks yet. Press n to create one."),
            area,
        );
        return;
    }

    let columns = dashboard.columns();
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let selected_row = dashboard.selected() / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (slot, row_area) in rows.iter().enumerate() {
        let start = (first_row + slot) * columns;
        if start >= tasks.len() {
            break;
        }
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);

        for (offset, task) in tasks[start..].iter().take(columns).enumerate() {
            let index = start + offset;
            f.render_widget(card(task, index == dashboard.selected()), cells[offset]);
        }
    }
}

fn priority_color(priority: TaskPriority) -> Color {
    match priority {
        TaskPriority::Urgent => Color::Red,
        TaskPriority::High => Color::LightRed,
        TaskPriority::Medium => Color::Yellow,
        TaskPriority::Low => Color::Green,
    }
}

fn card(task: &Task, selected: bool) -> Paragraph<'_> {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!(" {} ", task.priority),
            Style::default()
                .fg(Color::Black)
                .bg(priority_color(task.priority)),
        ),
        Span::raw(format!(" {}", task.status.label())),
    ])];
    if !task.description.is_empty() {
        lines.push(Line::styled(
            task.description.as_str(),
            Style::default().fg(Color::Gray),
        ));
    }
    lines.push(Line::from(format!(
        "@{}  due {}",
        task.assignee,
        task.due_date.card_label()
    )));
    let actions = if task.status == TaskStatus::Done {
        "[e]dit [d]elete"
    } else {
        "[e]dit [d]elete [c]omplete"
    };
    lines.push(Line::styled(actions, Style::default().fg(Color::DarkGray)));

    let border = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    };
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(task.title.as_str())
                .borders(Borders::ALL)
                .border_style(border),
        )
}

fn render_form(f: &mut Frame, dashboard: &Dashboard) {
    let (Some(draft), Some(mode)) = (dashboard.form().draft(), dashboard.form().mode()) else {
        return;
    };
    let (title, action) = match mode {
        FormMode::Create => ("Create New Task", "Create Task"),
        FormMode::Edit(_) => ("Edit Task", "Update Task"),
    };

    let mut lines = Vec::new();
    for field in Field::ALL {
        let marker = if field.is_required() { " *" } else { "" };
        let value = if field.is_text() {
            draft.value(field).to_string()
        } else {
            format!("< {} >", draft.value(field))
        };
        let style = if field == dashboard.focus() {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<13}", format!("{}{marker}", field.label())), style),
            Span::styled(value, style),
        ]));
    }
    lines.push(Line::from(""));
    match dashboard.form_error() {
        Some(err) => lines.push(Line::styled(err.to_string(), Style::default().fg(Color::Red))),
        None => lines.push(Line::styled(
            format!("Enter {action}   Esc Cancel"),
            Style::default().fg(Color::DarkGray),
        )),
    }

    let area = centered(f.area(), 64, 11);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn render_confirm(f: &mut Frame, task: &Task) {
    let area = centered(f.area(), 52, 5);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(vec![
            Line::from("Are you sure you want to delete this task?"),
            Line::styled(task.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
            Line::from("[y] yes   [n] no"),
        ])
        .block(
            Block::default()
                .title("Delete")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        ),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
