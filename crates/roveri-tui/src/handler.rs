use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use roveri_core::SessionEvent;
use tracing::info;

use crate::app::{App, InputMode, Screen};
use crate::form::FormState;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Api(outcome) => app.apply(outcome),
        AppEvent::Session(SessionEvent::SignInRequired) => {
            info!("session ended by backend, returning to sign-in");
            app.require_sign_in();
        }
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match app.screen {
        Screen::Login | Screen::Register | Screen::NewPet => handle_form(app, key),
        Screen::Pets => match app.input_mode {
            InputMode::Normal => handle_pets_normal(app, key),
            InputMode::Editing => handle_search_editing(app, key),
        },
        Screen::Chat => match app.input_mode {
            InputMode::Normal => handle_chat_normal(app, key),
            InputMode::Editing => handle_chat_editing(app, key).await,
        },
        Screen::Profile => handle_profile(app, key),
        Screen::Admin => handle_admin(app, key),
    }

    Ok(())
}

/// Screen switching shared by the signed-in screens. Returns true if handled.
fn handle_global_nav(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('1') => app.open_screen(Screen::Pets),
        KeyCode::Char('2') => app.open_screen(Screen::Chat),
        KeyCode::Char('3') => app.open_screen(Screen::Profile),
        KeyCode::Char('4') => app.open_screen(Screen::Admin),
        KeyCode::Char('L') => app.logout(),
        _ => return false,
    }
    true
}

fn handle_form(app: &mut App, key: KeyEvent) {
    let screen = app.screen;
    let form = match screen {
        Screen::Login => &mut app.login_form,
        Screen::Register => &mut app.register_form,
        _ => &mut app.pet_form,
    };

    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left => form.cursor_left(),
        KeyCode::Right => form.cursor_right(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.insert_char(c),
        KeyCode::Enter => {
            if !form.is_last_field() {
                form.next_field();
                return;
            }
            match screen {
                Screen::Login => app.submit_login(),
                Screen::Register => app.submit_register(),
                _ => app.submit_new_pet(),
            }
        }
        KeyCode::F(2) if screen == Screen::Login => {
            app.screen = Screen::Register;
            app.status = None;
        }
        KeyCode::Esc => match screen {
            Screen::Login => app.should_quit = true,
            Screen::Register => {
                app.register_form.reset(FormState::register());
                app.screen = Screen::Login;
                app.status = None;
            }
            _ => app.open_screen(Screen::Pets),
        },
        _ => {}
    }
}

fn handle_pets_normal(app: &mut App, key: KeyEvent) {
    if handle_global_nav(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.pet_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.pet_nav_up(),
        KeyCode::Enter => app.open_pet_detail(),
        KeyCode::Esc => app.pet_detail = None,
        KeyCode::Char('/') => app.input_mode = InputMode::Editing,
        KeyCode::Char('s') => app.cycle_species(),
        KeyCode::Char('c') => app.cycle_city(),
        KeyCode::Char('f') => {
            if let Some(pet) = app.selected_pet().cloned() {
                app.toggle_favorite(pet);
            }
        }
        KeyCode::Char('m') => app.contact_owner(),
        KeyCode::Char('n') => app.open_screen(Screen::NewPet),
        KeyCode::Char('r') => app.load_pets(),
        _ => {}
    }
}

fn handle_search_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            return;
        }
        KeyCode::Char(c) => app.search_input.insert_char(c),
        KeyCode::Backspace => app.search_input.backspace(),
        KeyCode::Left => app.search_input.cursor_left(),
        KeyCode::Right => app.search_input.cursor_right(),
        _ => return,
    }
    app.refilter();
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    if handle_global_nav(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.room_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.room_nav_up(),
        KeyCode::Enter => app.select_room(),
        KeyCode::Char('i') | KeyCode::Tab => {
            if app.chat.active_room().is_some() {
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('r') => app.load_rooms(),
        KeyCode::Esc => app.open_screen(Screen::Pets),
        _ => {}
    }
}

async fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.send_chat_message().await,
        KeyCode::Char(c) => app.chat_input.insert_char(c),
        KeyCode::Backspace => app.chat_input.backspace(),
        KeyCode::Left => app.chat_input.cursor_left(),
        KeyCode::Right => app.chat_input.cursor_right(),
        _ => {}
    }
}

fn handle_profile(app: &mut App, key: KeyEvent) {
    if handle_global_nav(app, key) {
        return;
    }
    match key.code {
        KeyCode::Tab => app.switch_profile_tab(),
        KeyCode::Char('j') | KeyCode::Down => app.profile_nav(true),
        KeyCode::Char('k') | KeyCode::Up => app.profile_nav(false),
        KeyCode::Char('f') => app.remove_selected_favorite(),
        KeyCode::Char('n') => app.open_screen(Screen::NewPet),
        KeyCode::Char('r') => app.load_profile(),
        KeyCode::Esc => app.open_screen(Screen::Pets),
        _ => {}
    }
}

fn handle_admin(app: &mut App, key: KeyEvent) {
    if handle_global_nav(app, key) {
        return;
    }
    match key.code {
        KeyCode::Tab => app.switch_admin_tab(),
        KeyCode::Char('j') | KeyCode::Down => app.admin_nav(true),
        KeyCode::Char('k') | KeyCode::Up => app.admin_nav(false),
        KeyCode::Char('b') => app.moderate_selected_user(),
        KeyCode::Char('d') => app.delete_selected_pet(),
        KeyCode::Char('r') => app.load_admin(),
        KeyCode::Esc => app.open_screen(Screen::Pets),
        _ => {}
    }
}
