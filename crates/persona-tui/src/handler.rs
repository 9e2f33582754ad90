use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use persona_core::QuickAsk;
use crate::app::App;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(cols, rows) => app.on_resize(cols, rows),
        AppEvent::Frame => app.on_frame().await,
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('s') if ctrl => {
            app.save_cv();
            return;
        }
        KeyCode::Esc => {
            if app.has_started() {
                app.back();
            } else {
                app.should_quit = true;
            }
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(app.chat_height.max(2) / 2);
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.chat_height.max(2) / 2);
            return;
        }
        KeyCode::Up => {
            app.scroll_up(1);
            return;
        }
        KeyCode::Down => {
            app.scroll_down(1);
            return;
        }
        _ => {}
    }

    // Number keys pick a quick-ask while the landing view is showing
    if let KeyCode::Char(c @ '1'..='5') = key.code {
        if !app.has_started() && app.chat.conversation().input().is_empty() {
            if let Some(ask) = c.to_digit(10).and_then(|d| QuickAsk::from_index(d as usize)) {
                app.quick_ask(ask);
                return;
            }
        }
    }

    if key.code == KeyCode::Enter {
        app.submit_input();
        return;
    }

    // The input line is disabled while a reply is pending
    if app.chat.is_busy() {
        return;
    }

    let input = app.chat.input_mut();
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) if !ctrl => input.insert(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => app.on_pointer(x, y),
        MouseEventKind::Down(MouseButton::Left) => {
            if app.cv_area.is_some_and(|r| point_in_rect(x, y, r)) {
                app.save_cv();
            } else if app.back_area.is_some_and(|r| point_in_rect(x, y, r)) {
                app.back();
            } else if let Some(ask) = app
                .quick_ask_areas
                .iter()
                .find(|(_, r)| point_in_rect(x, y, *r))
                .map(|(ask, _)| *ask)
            {
                app.quick_ask(ask);
            }
        }
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::ScrollDown => app.scroll_down(3),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}
