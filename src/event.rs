use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Instant;

use crate::app::App;
use crate::async_task::Task;
use crate::navigator::NavigatorEvent;

/// Translate one terminal event. Returns a task for the worker when the
/// event asks for a scan or a repository load.
pub fn handle_event(event: Event, app: &mut App, now: Instant) -> Option<Task> {
    match event {
        Event::Key(key) => {
            if key.kind != KeyEventKind::Press {
                return None;
            }

            // Global keybindings
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match key.code {
                    KeyCode::Char('c') => {
                        app.quit();
                        return None;
                    }
                    KeyCode::Char('r') => {
                        log::info!("🔎 Refresh requested");
                        return Some(app.refresh_task());
                    }
                    _ => {}
                }
            }

            let event = key_to_navigator_event(key)?;
            app.dispatch(event, now)
        }
        Event::Mouse(mouse) => handle_mouse_event(mouse, app, now),
        Event::Resize(_, _) => {
            // The next draw picks up the new size
            None
        }
        _ => None,
    }
}

/// Keys the navigator understands, independent of the current focus
pub fn key_to_navigator_event(key: KeyEvent) -> Option<NavigatorEvent> {
    let event = match key.code {
        KeyCode::Tab => NavigatorEvent::ToggleInputFocus,
        KeyCode::Esc => NavigatorEvent::Escape,
        KeyCode::Up => NavigatorEvent::NavigateUp,
        KeyCode::Down => NavigatorEvent::NavigateDown,
        KeyCode::Left => NavigatorEvent::CollapseFocused,
        KeyCode::Right => NavigatorEvent::ExpandFocused,
        KeyCode::Enter => NavigatorEvent::ActivateFocused,
        KeyCode::Backspace => NavigatorEvent::DeleteChar,
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            NavigatorEvent::InsertChar(c)
        }
        _ => return None,
    };
    Some(event)
}

fn handle_mouse_event(mouse: MouseEvent, app: &mut App, now: Instant) -> Option<Task> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let index = app.row_at(mouse.column, mouse.row)?;
            if index >= app.navigator.visible_items().len() {
                return None;
            }
            app.dispatch(NavigatorEvent::ActivateRow(index), now)
        }
        MouseEventKind::ScrollDown => app.dispatch(NavigatorEvent::NavigateDown, now),
        MouseEventKind::ScrollUp => app.dispatch(NavigatorEvent::NavigateUp, now),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::navigator::{HostSignal, InputFocus};
    use crate::session::Session;
    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn app() -> App {
        App::from_session(Session::default(), Config::default())
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        assert!(handle_event(ctrl('c'), &mut app, Instant::now()).is_none());
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_r_reloads() {
        let mut app = app();
        let task = handle_event(ctrl('r'), &mut app, Instant::now());
        assert!(matches!(task, Some(Task::LoadRepository { .. })));
        assert!(!app.should_quit);
    }

    #[test]
    fn test_typed_characters_edit_input() {
        let mut app = app();
        let now = Instant::now();
        handle_event(key(KeyCode::Char('s')), &mut app, now);
        handle_event(key(KeyCode::Char('r')), &mut app, now);
        handle_event(key(KeyCode::Backspace), &mut app, now);
        assert_eq!(app.navigator.input(), "s");
        assert!(app.debouncer.is_pending());
    }

    #[test]
    fn test_ctrl_letters_are_not_typed() {
        assert_eq!(
            key_to_navigator_event(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(
            key_to_navigator_event(KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT)),
            Some(NavigatorEvent::InsertChar('X'))
        );
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut app = app();
        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_event(Event::Key(release), &mut app, Instant::now());
        assert_eq!(app.navigator.input(), "");
    }

    #[test]
    fn test_tab_toggles_focus() {
        let mut app = app();
        handle_event(key(KeyCode::Tab), &mut app, Instant::now());
        assert_eq!(app.navigator.input_focus(), InputFocus::List);
    }

    #[test]
    fn test_click_activates_row() {
        let mut app = app();
        app.list_area = Some(Rect::new(1, 4, 40, 10));
        // Rows: src, tests, vendor, Cargo.toml, README.md
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 7,
            modifiers: KeyModifiers::NONE,
        });
        handle_event(click, &mut app, Instant::now());
        assert!(app.should_quit);
        assert_eq!(
            app.last_signal,
            Some(HostSignal::OpenFile("Cargo.toml".to_string()))
        );
    }

    #[test]
    fn test_click_below_last_row_is_ignored() {
        let mut app = app();
        app.list_area = Some(Rect::new(1, 4, 40, 10));
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 12,
            modifiers: KeyModifiers::NONE,
        });
        assert!(handle_event(click, &mut app, Instant::now()).is_none());
        assert!(app.last_signal.is_none());
        assert_eq!(app.navigator.focused_index(), None);
    }
}
