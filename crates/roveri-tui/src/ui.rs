use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use roveri_core::Pet;

use crate::app::{AdminTab, App, InputMode, ProfileTab, Screen};
use crate::form::FormState;

/// Ensure the selected item in a list is visible by adjusting the ListState offset.
fn ensure_selected_visible(state: &mut ListState, visible_height: usize) {
    let visible_height = visible_height.max(1);

    if let Some(selected) = state.selected() {
        let min_offset = selected.saturating_sub(visible_height - 1);
        let max_offset = selected;

        let new_offset = state.offset().clamp(min_offset, max_offset);
        if new_offset != state.offset() {
            *state.offset_mut() = new_offset;
        }
    }
}

/// Wrap text to fit within a given width, breaking on word boundaries
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(current_line);
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

fn focus_color(focused: bool) -> Color {
    if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, status, footer
    let [header_area, body_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Login | Screen::Register | Screen::NewPet => render_form_screen(app, frame, body_area),
        Screen::Pets => render_pets_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Profile => render_profile_screen(app, frame, body_area),
        Screen::Admin => render_admin_screen(app, frame, body_area),
    }

    render_status(app, frame, status_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Roveri ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ];

    if app.user.is_some() {
        let tabs = [
            (Screen::Pets, "1 Pets"),
            (Screen::Chat, "2 Chat"),
            (Screen::Profile, "3 Profile"),
            (Screen::Admin, "4 Admin"),
        ];
        for (screen, label) in tabs {
            if screen == Screen::Admin && !app.is_admin() {
                continue;
            }
            let style = if app.screen == screen {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(format!(" {} ", label), style));
        }
    }

    if let Some(user) = &app.user {
        spans.push(Span::styled(
            format!("  {}", user.display_name()),
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let line = if app.loading > 0 {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Line::from(Span::styled(
            format!(" Loading{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        Line::from(Span::styled(format!(" {}", status.text), Style::default().fg(color)))
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Login => " LOGIN ",
        Screen::Register => " REGISTER ",
        Screen::Pets => " PETS ",
        Screen::NewPet => " NEW PET ",
        Screen::Chat => " CHAT ",
        Screen::Profile => " PROFILE ",
        Screen::Admin => " ADMIN ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match (app.screen, app.input_mode) {
        (Screen::Login, _) => &[("Tab", "next"), ("Enter", "sign in"), ("F2", "register"), ("Esc", "quit")],
        (Screen::Register, _) => &[("Tab", "next"), ("Enter", "create"), ("Esc", "back")],
        (Screen::NewPet, _) => &[("Tab", "next"), ("Enter", "publish"), ("Esc", "cancel")],
        (Screen::Pets, InputMode::Editing) => &[("Enter", "done"), ("Esc", "done")],
        (Screen::Pets, InputMode::Normal) => &[
            ("j/k", "nav"),
            ("Enter", "details"),
            ("/", "search"),
            ("s", "species"),
            ("c", "city"),
            ("f", "favorite"),
            ("m", "message"),
            ("n", "new"),
            ("L", "logout"),
            ("q", "quit"),
        ],
        (Screen::Chat, InputMode::Editing) => &[("Enter", "send"), ("Esc", "rooms")],
        (Screen::Chat, InputMode::Normal) => &[
            ("j/k", "nav"),
            ("Enter", "open"),
            ("i", "write"),
            ("r", "reload"),
            ("q", "quit"),
        ],
        (Screen::Profile, _) => &[
            ("Tab", "switch"),
            ("j/k", "nav"),
            ("f", "unfavorite"),
            ("n", "new pet"),
            ("q", "quit"),
        ],
        (Screen::Admin, _) => &[
            ("Tab", "switch"),
            ("j/k", "nav"),
            ("b", "block/unblock"),
            ("d", "delete pet"),
            ("r", "reload"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_form_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let (form, title) = match app.screen {
        Screen::Login => (&app.login_form, " Sign in "),
        Screen::Register => (&app.register_form, " Create account "),
        _ => (&app.pet_form, " Publish a pet "),
    };

    let height = (form.fields.len() as u16) * 3 + 2;
    let [column] = Layout::horizontal([Constraint::Length(60)])
        .flex(Flex::Center)
        .areas(area);
    let [form_area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(column);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    render_form_fields(form, frame, inner);
}

fn render_form_fields(form: &FormState, frame: &mut Frame, area: Rect) {
    let rows = Layout::vertical(vec![Constraint::Length(3); form.fields.len()]).split(area);

    for (i, (field, row)) in form.fields.iter().zip(rows.iter()).enumerate() {
        let focused = i == form.focused;
        let input = Paragraph::new(field.display_value()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(focus_color(focused)))
                .title(format!(" {} ", field.label)),
        );
        frame.render_widget(input, *row);

        if focused {
            frame.set_cursor_position(Position::new(
                row.x + 1 + form.cursor as u16,
                row.y + 1,
            ));
        }
    }
}

fn render_pets_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [stats_area, main_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

    let stats_line = match &app.stats {
        Some(stats) => Line::from(vec![
            Span::styled(format!(" {} ", stats.pets_adopted), Style::default().fg(Color::Green).bold()),
            Span::raw("adopted  "),
            Span::styled(format!("{} ", stats.active_users), Style::default().fg(Color::Green).bold()),
            Span::raw("active users  "),
            Span::styled(format!("{} ", stats.cities_served), Style::default().fg(Color::Green).bold()),
            Span::raw("cities"),
        ]),
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(stats_line), stats_area);

    let [list_column, detail_area] = Layout::horizontal([
        Constraint::Percentage(45),
        Constraint::Percentage(55),
    ])
    .areas(main_area);

    let [search_area, list_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(list_column);

    let editing = app.input_mode == InputMode::Editing;
    let search = Paragraph::new(app.search_input.value.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
            .title(format!(
                " Search | {} | {} ",
                app.pet_filter.species.label(),
                app.pet_filter.city.as_deref().unwrap_or("all cities"),
            )),
    );
    frame.render_widget(search, search_area);
    if editing {
        frame.set_cursor_position(Position::new(
            search_area.x + 1 + app.search_input.cursor as u16,
            search_area.y + 1,
        ));
    }

    let items: Vec<ListItem> = app
        .filtered_pets()
        .iter()
        .map(|pet| {
            let heart = if app.is_favorite(pet.id) { "♥ " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(heart, Style::default().fg(Color::Red)),
                Span::styled(pet.name.clone(), Style::default().bold()),
                Span::styled(
                    format!("  {} · {}", pet.species, pet.city_label()),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();
    let count = items.len();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(focus_color(!editing)))
                .title(format!(" Pets ({}) ", count)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    ensure_selected_visible(&mut app.pet_state, list_area.height.saturating_sub(2) as usize);
    frame.render_stateful_widget(list, list_area, &mut app.pet_state);

    let pet = app.pet_detail.clone().or_else(|| app.selected_pet().cloned());
    render_pet_detail(pet.as_ref(), app.pet_detail.is_some(), frame, detail_area);
}

fn render_pet_detail(pet: Option<&Pet>, full: bool, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Details ");

    let Some(pet) = pet else {
        let empty = Paragraph::new(Span::styled(
            "No pets match the current filters.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::Cyan);
    let mut lines = vec![
        Line::from(Span::styled(pet.name.clone(), Style::default().fg(Color::Yellow).bold())),
        Line::default(),
        Line::from(vec![Span::styled("Species  ", label), Span::raw(pet.species.clone())]),
        Line::from(vec![Span::styled("Breed    ", label), Span::raw(pet.breed.clone())]),
        Line::from(vec![Span::styled("Age      ", label), Span::raw(pet.age_text.clone())]),
        Line::from(vec![Span::styled("City     ", label), Span::raw(pet.city_label().to_string())]),
        Line::from(vec![Span::styled("Owner    ", label), Span::raw(pet.owner_label().to_string())]),
    ];
    if let Some(status) = &pet.status {
        lines.push(Line::from(vec![Span::styled("Status   ", label), Span::raw(status.clone())]));
    }
    if let Some(views) = pet.views {
        lines.push(Line::from(vec![Span::styled("Views    ", label), Span::raw(views.to_string())]));
    }
    if let Some(url) = &pet.image_url {
        lines.push(Line::from(vec![
            Span::styled("Photo    ", label),
            Span::styled(url.clone(), Style::default().fg(Color::DarkGray)),
        ]));
    }
    lines.push(Line::default());

    let width = area.width.saturating_sub(2) as usize;
    for line in wrap_text_to_width(&pet.description, width) {
        lines.push(Line::from(line));
    }
    if !full {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Enter for full details, m to message the owner",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [rooms_area, conversation_area] = Layout::horizontal([
        Constraint::Percentage(30),
        Constraint::Percentage(70),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing;
    let active = app.chat.active_room();

    let items: Vec<ListItem> = app
        .rooms
        .iter()
        .map(|room| {
            let marker = if Some(room.id) == active { "● " } else { "  " };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::styled(room.title(), Style::default().bold()),
                ]),
                Line::from(Span::styled(
                    format!("  {}", room.participants()),
                    Style::default().fg(Color::Gray),
                )),
            ])
        })
        .collect();

    let rooms = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(focus_color(!editing)))
                .title(" Conversations "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");
    frame.render_stateful_widget(rooms, rooms_area, &mut app.room_state);

    let [messages_area, input_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(conversation_area);

    let title = app
        .active_room()
        .map(|room| format!(" {} ", room.title()))
        .unwrap_or_else(|| " No conversation selected ".to_string());

    let view = app.chat_view();
    let inner_width = messages_area.width.saturating_sub(2).max(1) as usize;
    let mut total_lines = 0usize;
    let text = if active.is_none() {
        Text::from(Span::styled(
            "Pick a conversation and press Enter.",
            Style::default().fg(Color::DarkGray),
        ))
    } else if view.messages().is_empty() {
        Text::from(Span::styled("No messages yet.", Style::default().fg(Color::DarkGray)))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for message in view.messages() {
            let mine = app.user.as_ref().is_some_and(|user| message.is_from(user));
            let (who, color) = if mine {
                ("You".to_string(), Color::Cyan)
            } else {
                (
                    message.sender_username.clone().unwrap_or_else(|| "Them".to_string()),
                    Color::Yellow,
                )
            };
            let plain = format!("{} {}: {}", message.time_label(), who, message.content);
            total_lines += wrap_text_to_width(&plain, inner_width).len();
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", message.time_label()), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{}: ", who), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(message.content.clone()),
            ]));
        }
        Text::from(lines)
    };

    // Keep the newest messages in view
    let inner_height = messages_area.height.saturating_sub(2) as usize;
    let scroll = total_lines.saturating_sub(inner_height) as u16;

    let messages = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        )
        .scroll((scroll, 0));
    frame.render_widget(messages, messages_area);

    let input = Paragraph::new(app.chat_input.value.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
            .title(" Message "),
    );
    frame.render_widget(input, input_area);
    if editing {
        frame.set_cursor_position(Position::new(
            input_area.x + 1 + app.chat_input.cursor as u16,
            input_area.y + 1,
        ));
    }
}

fn render_profile_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [info_area, list_area] = Layout::vertical([Constraint::Length(5), Constraint::Min(0)]).areas(area);

    let info = match &app.user {
        Some(user) => Text::from(vec![
            Line::from(Span::styled(user.display_name().to_string(), Style::default().fg(Color::Yellow).bold())),
            Line::from(vec![Span::styled("Email  ", Style::default().fg(Color::Cyan)), Span::raw(user.email.clone())]),
            Line::from(vec![
                Span::styled("Role   ", Style::default().fg(Color::Cyan)),
                Span::raw(if user.is_admin() { "admin" } else { "member" }),
            ]),
        ]),
        None => Text::default(),
    };
    frame.render_widget(
        Paragraph::new(info).block(Block::default().borders(Borders::ALL).title(" Profile ")),
        info_area,
    );

    let title = match app.profile_tab {
        ProfileTab::MyPets => format!(" My pets ({}) | favorites ({}) ", app.my_pets.len(), app.favorites.len()),
        ProfileTab::Favorites => format!(" my pets ({}) | Favorites ({}) ", app.my_pets.len(), app.favorites.len()),
    };
    let items = pet_rows(app.profile_items());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    ensure_selected_visible(&mut app.profile_state, list_area.height.saturating_sub(2) as usize);
    frame.render_stateful_widget(list, list_area, &mut app.profile_state);
}

fn pet_rows(pets: &[Pet]) -> Vec<ListItem<'static>> {
    pets.iter()
        .map(|pet| {
            let published = if pet.is_published { "" } else { " (hidden)" };
            ListItem::new(Line::from(vec![
                Span::styled(pet.name.clone(), Style::default().bold()),
                Span::styled(
                    format!("  {} · {}{}", pet.species, pet.city_label(), published),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect()
}

fn render_admin_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [dashboard_area, table_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let stats = app.dashboard();
    let number = Style::default().fg(Color::Green).bold();
    let dashboard = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", stats.total_users), number),
        Span::raw("users  "),
        Span::styled(format!("{} ", stats.active_users), number),
        Span::raw("active  "),
        Span::styled(format!("{} ", stats.total_pets), number),
        Span::raw("pets  "),
        Span::styled(format!("{} ", stats.available_pets), number),
        Span::raw("available  "),
        Span::styled(format!("{} ", stats.adopted_pets), number),
        Span::raw("adopted  "),
        Span::styled(format!("{} ", stats.total_views), number),
        Span::raw("views"),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Dashboard "));
    frame.render_widget(dashboard, dashboard_area);

    let (title, items) = match app.admin_tab {
        AdminTab::Users => {
            let items: Vec<ListItem> = app
                .admin_users
                .iter()
                .map(|user| {
                    let status = user.status.as_deref().unwrap_or("unknown");
                    let color = if user.is_active() { Color::Green } else { Color::Red };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{:<20}", user.username), Style::default().bold()),
                        Span::styled(format!("{:<30}", user.email), Style::default().fg(Color::Gray)),
                        Span::styled(status.to_string(), Style::default().fg(color)),
                    ]))
                })
                .collect();
            (" Users | pets ", items)
        }
        AdminTab::Pets => (" users | Pets ", pet_rows(&app.admin_pets)),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    ensure_selected_visible(&mut app.admin_state, table_area.height.saturating_sub(2) as usize);
    frame.render_stateful_widget(list, table_area, &mut app.admin_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text_to_width("a friendly dog who loves walks", 10);
        assert_eq!(lines, vec!["a friendly", "dog who", "loves", "walks"]);
        assert_eq!(wrap_text_to_width("", 10), vec![String::new()]);
    }

    #[test]
    fn selection_stays_visible() {
        let mut state = ListState::default();
        state.select(Some(12));
        ensure_selected_visible(&mut state, 5);
        assert_eq!(state.offset(), 8);

        state.select(Some(2));
        ensure_selected_visible(&mut state, 5);
        assert_eq!(state.offset(), 2);
    }
}
