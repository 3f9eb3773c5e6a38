use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::navigator::{BrowseMode, InputFocus, NavigatorViewModel};
use crate::theme::Theme;
use crate::tree::FlatItem;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let show_status_bar = app.config.layout.show_status_bar;
    let constraints = if show_status_bar {
        vec![Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)]
    } else {
        vec![Constraint::Length(3), Constraint::Min(0)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let view = app.navigator.view_model();
    app.sync_list_state();

    draw_search_box(frame, app, &view, chunks[0]);
    draw_list(frame, app, &view, chunks[1]);
    if show_status_bar {
        draw_status_bar(frame, app, chunks[2]);
    }
}

fn border_style(theme: &Theme, active: bool) -> Style {
    if active {
        Style::default().fg(theme.active_border)
    } else {
        Style::default().fg(theme.inactive_border)
    }
}

fn draw_search_box(frame: &mut Frame, app: &App, view: &NavigatorViewModel, area: Rect) {
    let theme = &app.config.theme;
    let is_active = view.input_focus == InputFocus::Search;

    let title = match view.mode {
        BrowseMode::Repos => " Repositories ".to_string(),
        BrowseMode::Files => format!(" {} ", app.navigator.repo_name()),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(theme, is_active));

    let paragraph = if view.input.is_empty() {
        Paragraph::new(view.placeholder.as_str()).style(Style::default().fg(theme.placeholder))
    } else {
        Paragraph::new(view.input.as_str()).style(Style::default().fg(theme.search_text))
    };
    frame.render_widget(paragraph.block(block), area);

    if is_active && area.height > 2 {
        let typed = u16::try_from(view.input.chars().count()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(typed)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}

fn draw_list(frame: &mut Frame, app: &mut App, view: &NavigatorViewModel, area: Rect) {
    let theme = app.config.theme.clone();
    let is_active = view.input_focus == InputFocus::List;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(&theme, is_active));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(message) = &view.empty_message {
        app.list_area = None;
        let paragraph = Paragraph::new(message.as_str()).style(Style::default().fg(theme.empty_message));
        frame.render_widget(paragraph, inner);
        return;
    }

    let (rows_area, footer_area) = match view.footer {
        Some(_) if inner.height > 1 => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(1)])
                .split(inner);
            (parts[0], Some(parts[1]))
        }
        _ => (inner, None),
    };

    let indent_width = usize::from(app.config.layout.indent_width);
    let items: Vec<ListItem> = view
        .items
        .iter()
        .map(|item| {
            let line = match view.mode {
                BrowseMode::Repos => repo_line(item, &theme),
                BrowseMode::Files => file_line(item, &theme, indent_width),
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg)
                .fg(theme.selected_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("");

    app.list_area = Some(rows_area);
    frame.render_stateful_widget(list, rows_area, &mut app.list_state);

    if let (Some(footer), Some(footer_area)) = (&view.footer, footer_area) {
        let paragraph = Paragraph::new(footer.as_str()).style(Style::default().fg(theme.badge));
        frame.render_widget(paragraph, footer_area);
    }
}

fn repo_line<'a>(item: &'a FlatItem, theme: &Theme) -> Line<'a> {
    let label = item.label.as_deref().unwrap_or(&item.name);
    let mut spans = vec![Span::styled(label, Style::default().fg(theme.file_default))];
    if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(description, Style::default().fg(theme.description)));
    }
    Line::from(spans)
}

fn file_line<'a>(item: &'a FlatItem, theme: &Theme, indent_width: usize) -> Line<'a> {
    let indent = " ".repeat(item.depth * indent_width);

    if item.is_sub_repo {
        return Line::from(vec![
            Span::raw(indent),
            Span::styled("◆ ", Style::default().fg(theme.sub_repository)),
            Span::styled(item.name.as_str(), Style::default().fg(theme.sub_repository)),
        ]);
    }

    if item.is_dir {
        let expand_char = if item.is_expanded { "▼ " } else { "▶ " };
        let mut spans = vec![
            Span::raw(indent),
            Span::styled(expand_char, Style::default().fg(theme.directory)),
            Span::styled(
                item.name.as_str(),
                Style::default().fg(theme.directory).add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(count) = item.file_count {
            spans.push(Span::styled(format!(" ({})", count), Style::default().fg(theme.badge)));
        }
        return Line::from(spans);
    }

    // Files align with directory names, after the toggle column
    Line::from(vec![
        Span::raw(format!("{}  ", indent)),
        Span::styled(item.name.as_str(), Style::default().fg(theme.file_default)),
    ])
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.config.theme;
    let status_text = if app.is_loading {
        format!("Loading... | {}", app.status_message)
    } else {
        app.status_message.clone()
    };

    let help_text = match app.navigator.mode() {
        BrowseMode::Repos => "Type: Filter | ↑↓: Move | Enter: Open | Tab: Focus | Esc: Quit",
        BrowseMode::Files => {
            "Type: Filter | ↑↓: Move | →←: Expand/Collapse | Enter: Open | Esc: Back | Ctrl+R: Refresh"
        }
    };

    let status_line = Line::from(vec![
        Span::styled(status_text, Style::default().fg(theme.status_bar_fg)),
        Span::raw(" | "),
        Span::styled(help_text, Style::default().fg(theme.status_help_text)),
    ]);

    let paragraph = Paragraph::new(status_line).style(Style::default().bg(theme.status_bar_bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::navigator::{NavigatorEvent, RepoItem};
    use crate::screenshot::buffer_to_string;
    use crate::session::Session;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        buffer_to_string(terminal.backend().buffer())
    }

    #[test]
    fn test_files_mode_shows_placeholder_and_tree() {
        let mut app = App::from_session(Session::default(), Config::default());
        let screen = render(&mut app, 80, 16);
        assert!(screen.contains("Search files in demo (7 files)"));
        assert!(screen.contains("▶ src (4)"));
        assert!(screen.contains("▶ vendor (1)"));
        assert!(screen.contains("Cargo.toml"));
        assert_eq!(app.list_area, Some(Rect::new(1, 4, 78, 10)));
    }

    #[test]
    fn test_cursor_stays_inside_search_box_for_long_input() {
        let session = Session {
            query: Some("x".repeat(70_000)),
            ..Session::default()
        };
        let mut app = App::from_session(session, Config::default());
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|frame| draw(frame, &mut app)).unwrap();

        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor, Position::new(38, 1));
    }

    #[test]
    fn test_query_expands_matches() {
        let session = Session {
            query: Some("ui".to_string()),
            ..Session::default()
        };
        let mut app = App::from_session(session, Config::default());
        let screen = render(&mut app, 80, 16);
        assert!(screen.contains("▼ src"));
        assert!(screen.contains("▼ ui"));
        assert!(screen.contains("list.rs"));
        assert!(!screen.contains("README.md"));
    }

    #[test]
    fn test_empty_message() {
        let mut app = App::from_session(Session::default(), Config::default());
        app.navigator
            .handle_event(NavigatorEvent::QueryChanged("zzz".to_string()));
        let screen = render(&mut app, 60, 10);
        assert!(screen.contains("No matching files"));
        assert_eq!(app.list_area, None);
    }

    #[test]
    fn test_repository_rows_show_description() {
        let session = Session {
            mode: BrowseMode::Repos,
            repositories: vec![RepoItem {
                path: "/w/api".to_string(),
                label: "api".to_string(),
                description: "work".to_string(),
            }],
            ..Session::default()
        };
        let mut app = App::from_session(session, Config::default());
        let screen = render(&mut app, 60, 10);
        assert!(screen.contains("Search repositories (1)"));
        assert!(screen.contains("api  work"));
    }

    #[test]
    fn test_status_bar_can_be_hidden() {
        let mut config = Config::default();
        config.layout.show_status_bar = false;
        let mut app = App::from_session(Session::default(), config);
        let screen = render(&mut app, 120, 12);
        assert!(!screen.contains("Ctrl+R"));
    }
}
