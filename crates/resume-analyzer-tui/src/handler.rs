use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::UploadFinished { generation, result } => app.on_upload_finished(generation, result),
        AppEvent::ChatFinished { generation, result } => app.on_chat_finished(generation, result),
        AppEvent::HealthChecked { generation, healthy } => app.on_health_checked(generation, healthy),
    }
    Ok(())
}

/// Plain Enter sends. Shift+Enter or Alt+Enter is kept for multi-line input.
pub fn is_submit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter
        && !key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.confirm_reset {
        handle_reset_confirm(app, key);
    } else if app.picker.is_some() {
        handle_picker(app, key);
    } else {
        match app.input_mode {
            InputMode::Normal => handle_normal_mode(app, key),
            InputMode::Editing => handle_editing_mode(app, key),
        }
    }
}

fn handle_reset_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.reset_session(),
        _ => app.confirm_reset = false,
    }
}

fn handle_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.picker = None,
        KeyCode::Char('s') => app.confirm_picker(),
        _ => {
            let Some(picker) = app.picker.as_mut() else {
                return;
            };
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => picker.nav_down(),
                KeyCode::Char('k') | KeyCode::Up => picker.nav_up(),
                KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => picker.activate(),
                KeyCode::Char(' ') => picker.toggle_selected(),
                KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => picker.parent(),
                KeyCode::Char('a') => picker.toggle_show_all(),
                _ => {}
            }
        }
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Tab to switch focus between the two panels
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Upload => FocusPane::Chat,
                FocusPane::Chat => FocusPane::Upload,
            };
        }

        // Upload actions
        KeyCode::Char('f') => app.open_picker(),
        KeyCode::Char('u') => app.start_upload(),

        // Chat actions
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Chat;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter if app.focus == FocusPane::Chat => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter if app.focus == FocusPane::Upload => app.start_upload(),
        KeyCode::Char('j') | KeyCode::Down if app.focus == FocusPane::Chat => app.scroll_chat_down(),
        KeyCode::Char('k') | KeyCode::Up if app.focus == FocusPane::Chat => app.scroll_chat_up(),
        KeyCode::Char('G') if app.focus == FocusPane::Chat => app.scroll_chat_to_bottom(),

        // Session reset asks first
        KeyCode::Char('R') => app.confirm_reset = true,

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if is_submit_key(&key) {
        app.send_message();
        return;
    }

    let compose = app.conversation.compose_mut();
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => compose.newline(),
        KeyCode::Backspace => compose.backspace(),
        KeyCode::Delete => compose.delete(),
        KeyCode::Left => compose.move_left(),
        KeyCode::Right => compose.move_right(),
        KeyCode::Home => compose.move_home(),
        KeyCode::End => compose.move_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => compose.insert(c),
        _ => {}
    }
}
