use std::future::Future;
use std::path::PathBuf;

use ratatui::widgets::ListState;
use roveri_core::filter::distinct_cities;
use roveri_core::{
    AdminUser, ApiClient, ApiError, ChatRoom, ChatSync, ChatView, DashboardStats, LoginForm,
    NewPet, Pet, PetFilter, RegisterForm, SiteStats, User, UserAction,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::form::{FormState, LineInput};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Pets,
    NewPet,
    Chat,
    Profile,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileTab {
    #[default]
    MyPets,
    Favorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Users,
    Pets,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// Result of a background API call, delivered through the event loop.
#[derive(Debug)]
pub enum ApiOutcome {
    Restored(Option<User>),
    SignedIn(Result<User, ApiError>),
    Registered(Result<User, ApiError>),
    SignedOut,
    PetsLoaded(Result<Vec<Pet>, ApiError>),
    PetLoaded(Result<Pet, ApiError>),
    StatsLoaded(Result<SiteStats, ApiError>),
    PetCreated(Result<Pet, ApiError>),
    FavoritesLoaded(Result<Vec<Pet>, ApiError>),
    FavoritesUpdated(Result<Vec<Pet>, ApiError>),
    MyPetsLoaded(Result<Vec<Pet>, ApiError>),
    RoomsLoaded(Result<Vec<ChatRoom>, ApiError>),
    RoomOpened(Result<ChatRoom, ApiError>),
    UsersLoaded(Result<Vec<AdminUser>, ApiError>),
    UsersUpdated(Result<Vec<AdminUser>, ApiError>),
    AdminPetsLoaded(Result<Vec<Pet>, ApiError>),
    PetDeleted(Result<i64, ApiError>),
}

impl ApiOutcome {
    /// Outcomes that establish or end a session, accepted while signed out.
    fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiOutcome::Restored(_)
                | ApiOutcome::SignedIn(_)
                | ApiOutcome::Registered(_)
                | ApiOutcome::SignedOut
        )
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub status: Option<StatusLine>,
    pub loading: usize,
    pub animation_frame: u8,

    // Session
    pub client: ApiClient,
    pub user: Option<User>,
    events: mpsc::UnboundedSender<AppEvent>,

    // Forms
    pub login_form: FormState,
    pub register_form: FormState,
    pub pet_form: FormState,

    // Pets screen
    pub pets: Vec<Pet>,
    pub pet_filter: PetFilter,
    pub pet_state: ListState,
    pub search_input: LineInput,
    pub pet_detail: Option<Pet>,
    pub cities: Vec<String>,
    pub stats: Option<SiteStats>,
    pub favorites: Vec<Pet>,

    // Chat screen
    pub chat: ChatSync,
    pub rooms: Vec<ChatRoom>,
    pub room_state: ListState,
    pub chat_input: LineInput,
    pending_room: Option<i64>,

    // Profile screen
    pub profile_tab: ProfileTab,
    pub my_pets: Vec<Pet>,
    pub profile_state: ListState,

    // Admin screen
    pub admin_tab: AdminTab,
    pub admin_users: Vec<AdminUser>,
    pub admin_pets: Vec<Pet>,
    pub admin_state: ListState,
}

impl App {
    pub fn new(client: ApiClient, chat: ChatSync, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Login,
            input_mode: InputMode::Editing,
            status: None,
            loading: 0,
            animation_frame: 0,

            client,
            user: None,
            events,

            login_form: FormState::login(),
            register_form: FormState::register(),
            pet_form: FormState::new_pet(),

            pets: Vec::new(),
            pet_filter: PetFilter::default(),
            pet_state: ListState::default(),
            search_input: LineInput::default(),
            pet_detail: None,
            cities: Vec::new(),
            stats: None,
            favorites: Vec::new(),

            chat,
            rooms: Vec::new(),
            room_state: ListState::default(),
            chat_input: LineInput::default(),
            pending_room: None,

            profile_tab: ProfileTab::default(),
            my_pets: Vec::new(),
            profile_state: ListState::default(),

            admin_tab: AdminTab::default(),
            admin_users: Vec::new(),
            admin_pets: Vec::new(),
            admin_state: ListState::default(),
        }
    }

    /// Re-validate a saved session, if there is one.
    pub fn start(&mut self) {
        if self.client.session().is_authenticated() {
            let client = self.client.clone();
            self.spawn(async move { ApiOutcome::Restored(client.restore().await) });
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ApiOutcome> + Send + 'static,
    {
        self.loading += 1;
        let tx = self.events.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::Api(task.await));
        });
    }

    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: true,
        });
    }

    fn report(&mut self, error: &ApiError) {
        // Expired sessions are handled by the sign-in redirect.
        if !error.is_session_expired() {
            warn!(%error, "request failed");
            self.set_error(error.user_message());
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    // Navigation

    pub fn open_screen(&mut self, screen: Screen) {
        if self.screen == Screen::Chat && screen != Screen::Chat {
            self.chat.stop();
        }
        if screen == Screen::Admin && !self.is_admin() {
            self.set_error("Admin access required");
            return;
        }
        self.screen = screen;
        self.input_mode = InputMode::Normal;

        match screen {
            Screen::Login | Screen::Register => self.input_mode = InputMode::Editing,
            Screen::NewPet => {
                self.pet_form.reset(FormState::new_pet());
                self.input_mode = InputMode::Editing;
            }
            Screen::Pets => self.load_pets(),
            Screen::Chat => self.load_rooms(),
            Screen::Profile => self.load_profile(),
            Screen::Admin => self.load_admin(),
        }
    }

    fn enter_home(&mut self, user: User) {
        info!(user_id = user.id, "session active");
        self.login_form.reset(FormState::login());
        self.register_form.reset(FormState::register());
        self.user = Some(user);
        self.open_screen(Screen::Pets);
    }

    /// The session is gone: stop background work and return to sign-in.
    pub fn require_sign_in(&mut self) {
        self.chat.stop();
        self.user = None;
        self.pets.clear();
        self.cities.clear();
        self.stats = None;
        self.pet_detail = None;
        self.favorites.clear();
        self.rooms.clear();
        self.my_pets.clear();
        self.admin_users.clear();
        self.admin_pets.clear();
        self.pending_room = None;
        self.screen = Screen::Login;
        self.input_mode = InputMode::Editing;
        self.set_error("Session expired, please sign in again");
    }

    // Auth

    pub fn submit_login(&mut self) {
        let form = LoginForm {
            email: self.login_form.value(0).to_string(),
            password: self.login_form.value(1).to_string(),
        };
        if let Err(error) = form.validate() {
            self.set_error(error.user_message());
            return;
        }
        let client = self.client.clone();
        self.set_info("Signing in...");
        self.spawn(async move { ApiOutcome::SignedIn(client.login(&form).await) });
    }

    pub fn submit_register(&mut self) {
        let form = RegisterForm {
            name: self.register_form.value(0).to_string(),
            email: self.register_form.value(1).to_string(),
            phone: self.register_form.value(2).to_string(),
            city: self.register_form.value(3).to_string(),
            password: self.register_form.value(4).to_string(),
            confirm_password: self.register_form.value(5).to_string(),
        };
        if let Err(error) = form.validate() {
            self.set_error(error.user_message());
            return;
        }
        let client = self.client.clone();
        self.set_info("Creating account...");
        self.spawn(async move { ApiOutcome::Registered(client.register(&form).await) });
    }

    pub fn logout(&mut self) {
        self.chat.stop();
        let client = self.client.clone();
        self.spawn(async move {
            client.logout().await;
            ApiOutcome::SignedOut
        });
    }

    // Pets

    pub fn load_pets(&mut self) {
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::PetsLoaded(client.list_pets().await) });
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::StatsLoaded(client.site_stats().await) });
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::FavoritesLoaded(client.list_favorites().await) });
    }

    pub fn filtered_pets(&self) -> Vec<&Pet> {
        self.pet_filter.apply(&self.pets)
    }

    pub fn selected_pet(&self) -> Option<&Pet> {
        let index = self.pet_state.selected()?;
        self.filtered_pets().get(index).copied()
    }

    pub fn is_favorite(&self, pet_id: i64) -> bool {
        self.favorites.iter().any(|fav| fav.id == pet_id)
    }

    pub fn pet_nav_down(&mut self) {
        let len = self.filtered_pets().len();
        if len > 0 {
            let i = self.pet_state.selected().unwrap_or(0);
            self.pet_state.select(Some((i + 1).min(len - 1)));
            self.pet_detail = None;
        }
    }

    pub fn pet_nav_up(&mut self) {
        let i = self.pet_state.selected().unwrap_or(0);
        self.pet_state.select(Some(i.saturating_sub(1)));
        self.pet_detail = None;
    }

    /// Re-clamp the selection after the list or filter changed.
    pub fn refilter(&mut self) {
        self.pet_filter.search = self.search_input.value.clone();
        let len = self.filtered_pets().len();
        if len == 0 {
            self.pet_state.select(None);
        } else {
            let i = self.pet_state.selected().unwrap_or(0).min(len - 1);
            self.pet_state.select(Some(i));
        }
        self.pet_detail = None;
    }

    pub fn cycle_species(&mut self) {
        self.pet_filter.species = self.pet_filter.species.next();
        self.refilter();
    }

    /// all -> first city -> ... -> last city -> all
    pub fn cycle_city(&mut self) {
        let next = match &self.pet_filter.city {
            None => self.cities.first().cloned(),
            Some(current) => self
                .cities
                .iter()
                .position(|city| city == current)
                .and_then(|i| self.cities.get(i + 1))
                .cloned(),
        };
        self.pet_filter.city = next;
        self.refilter();
    }

    pub fn open_pet_detail(&mut self) {
        if let Some(id) = self.selected_pet().map(|pet| pet.id) {
            let client = self.client.clone();
            self.spawn(async move { ApiOutcome::PetLoaded(client.get_pet(id).await) });
        }
    }

    pub fn toggle_favorite(&mut self, pet: Pet) {
        let client = self.client.clone();
        let mut favorites = self.favorites.clone();
        self.spawn(async move {
            let result = client.toggle_favorite(&pet, &mut favorites).await;
            ApiOutcome::FavoritesUpdated(result.map(|_| favorites))
        });
    }

    /// Message the selected pet's owner, opening (or reusing) their room.
    pub fn contact_owner(&mut self) {
        let Some(pet) = self.pet_detail.clone().or_else(|| self.selected_pet().cloned()) else {
            return;
        };
        let Some(owner) = pet.created_by else {
            self.set_error("This pet has no owner to contact");
            return;
        };
        if self.user.as_ref().is_some_and(|user| user.id == owner) {
            self.set_error("You published this pet");
            return;
        }
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::RoomOpened(client.open_room(pet.id, owner).await) });
    }

    pub fn submit_new_pet(&mut self) {
        let image = self.pet_form.value(6).trim();
        let new_pet = NewPet {
            name: self.pet_form.value(0).to_string(),
            species: self.pet_form.value(1).to_string(),
            breed: self.pet_form.value(2).to_string(),
            age_text: self.pet_form.value(3).to_string(),
            city: self.pet_form.value(4).to_string(),
            description: self.pet_form.value(5).to_string(),
            image: (!image.is_empty()).then(|| PathBuf::from(image)),
        };
        let client = self.client.clone();
        self.set_info("Publishing...");
        self.spawn(async move { ApiOutcome::PetCreated(client.create_pet(&new_pet).await) });
    }

    // Chat

    pub fn load_rooms(&mut self) {
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::RoomsLoaded(client.list_rooms().await) });
    }

    pub fn room_nav_down(&mut self) {
        let len = self.rooms.len();
        if len > 0 {
            let i = self.room_state.selected().unwrap_or(0);
            self.room_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn room_nav_up(&mut self) {
        let i = self.room_state.selected().unwrap_or(0);
        self.room_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_room(&mut self) {
        if let Some(room) = self.room_state.selected().and_then(|i| self.rooms.get(i)) {
            let id = room.id;
            if self.chat.active_room() != Some(id) {
                self.chat.select(id);
            }
        }
    }

    pub fn active_room(&self) -> Option<&ChatRoom> {
        let id = self.chat.active_room()?;
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn chat_view(&self) -> ChatView {
        self.chat.view()
    }

    pub async fn send_chat_message(&mut self) {
        let text = self.chat_input.value.clone();
        match self.chat.send(&text).await {
            Ok(Some(_)) => {
                self.chat_input.take();
            }
            Ok(None) => {}
            Err(error) => self.report(&error),
        }
    }

    // Profile

    pub fn load_profile(&mut self) {
        if let Some(user_id) = self.user.as_ref().map(|user| user.id) {
            let client = self.client.clone();
            self.spawn(async move {
                ApiOutcome::MyPetsLoaded(client.list_pets_by_owner(user_id).await)
            });
        }
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::FavoritesLoaded(client.list_favorites().await) });
    }

    pub fn profile_items(&self) -> &[Pet] {
        match self.profile_tab {
            ProfileTab::MyPets => &self.my_pets,
            ProfileTab::Favorites => &self.favorites,
        }
    }

    pub fn switch_profile_tab(&mut self) {
        self.profile_tab = match self.profile_tab {
            ProfileTab::MyPets => ProfileTab::Favorites,
            ProfileTab::Favorites => ProfileTab::MyPets,
        };
        self.profile_state.select(if self.profile_items().is_empty() { None } else { Some(0) });
    }

    pub fn profile_nav(&mut self, down: bool) {
        let len = self.profile_items().len();
        step(&mut self.profile_state, len, down);
    }

    pub fn remove_selected_favorite(&mut self) {
        if self.profile_tab != ProfileTab::Favorites {
            return;
        }
        if let Some(pet) = self.profile_state.selected().and_then(|i| self.favorites.get(i)).cloned() {
            self.toggle_favorite(pet);
        }
    }

    // Admin

    pub fn load_admin(&mut self) {
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::UsersLoaded(client.list_users().await) });
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::AdminPetsLoaded(client.list_all_pets().await) });
    }

    pub fn dashboard(&self) -> DashboardStats {
        DashboardStats::compute(&self.admin_users, &self.admin_pets)
    }

    pub fn switch_admin_tab(&mut self) {
        self.admin_tab = match self.admin_tab {
            AdminTab::Users => AdminTab::Pets,
            AdminTab::Pets => AdminTab::Users,
        };
        let len = self.admin_len();
        self.admin_state.select(if len == 0 { None } else { Some(0) });
    }

    fn admin_len(&self) -> usize {
        match self.admin_tab {
            AdminTab::Users => self.admin_users.len(),
            AdminTab::Pets => self.admin_pets.len(),
        }
    }

    pub fn admin_nav(&mut self, down: bool) {
        let len = self.admin_len();
        step(&mut self.admin_state, len, down);
    }

    pub fn moderate_selected_user(&mut self) {
        if self.admin_tab != AdminTab::Users {
            return;
        }
        let Some(user) = self.admin_state.selected().and_then(|i| self.admin_users.get(i)) else {
            return;
        };
        let action = UserAction::for_user(user);
        let user_id = user.id;
        let client = self.client.clone();
        let mut users = self.admin_users.clone();
        self.spawn(async move {
            let result = client.moderate_user(user_id, action, &mut users).await;
            ApiOutcome::UsersUpdated(result.map(|_| users))
        });
    }

    pub fn delete_selected_pet(&mut self) {
        if self.admin_tab != AdminTab::Pets {
            return;
        }
        if let Some(id) = self.admin_state.selected().and_then(|i| self.admin_pets.get(i)).map(|pet| pet.id) {
            let client = self.client.clone();
            self.spawn(async move { ApiOutcome::PetDeleted(client.delete_pet(id).await.map(|_| id)) });
        }
    }

    // Outcomes

    pub fn apply(&mut self, outcome: ApiOutcome) {
        self.loading = self.loading.saturating_sub(1);
        // Data that lands after sign-out belongs to the old session.
        if self.user.is_none() && !outcome.is_auth() {
            return;
        }
        match outcome {
            ApiOutcome::Restored(Some(user)) => self.enter_home(user),
            ApiOutcome::Restored(None) => {}
            ApiOutcome::SignedIn(result) | ApiOutcome::Registered(result) => match result {
                Ok(user) => {
                    self.status = None;
                    self.enter_home(user);
                }
                Err(error) => {
                    self.login_form.clear_secrets();
                    self.register_form.clear_secrets();
                    self.report(&error);
                }
            },
            ApiOutcome::SignedOut => {
                self.require_sign_in();
                self.set_info("Signed out");
            }
            ApiOutcome::PetsLoaded(result) => match result {
                Ok(pets) => {
                    self.cities = distinct_cities(&pets);
                    self.pets = pets;
                    self.refilter();
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::PetLoaded(result) => match result {
                Ok(pet) => self.pet_detail = Some(pet),
                Err(error) => self.report(&error),
            },
            ApiOutcome::StatsLoaded(result) => match result {
                Ok(stats) => self.stats = Some(stats),
                Err(error) => warn!(%error, "stats unavailable"),
            },
            ApiOutcome::PetCreated(result) => match result {
                Ok(pet) => {
                    self.set_info(format!("{} published", pet.name));
                    self.open_screen(Screen::Pets);
                    self.pet_detail = Some(pet);
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::FavoritesLoaded(result) => match result {
                Ok(favorites) => {
                    self.favorites = favorites;
                    self.clamp_profile_selection();
                }
                Err(error) => warn!(%error, "favorites unavailable"),
            },
            ApiOutcome::FavoritesUpdated(result) => match result {
                Ok(favorites) => {
                    self.favorites = favorites;
                    self.clamp_profile_selection();
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::MyPetsLoaded(result) => match result {
                Ok(pets) => {
                    self.my_pets = pets;
                    self.clamp_profile_selection();
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::RoomsLoaded(result) => match result {
                Ok(rooms) => {
                    self.rooms = rooms;
                    let wanted = self.pending_room.take().or(self.chat.active_room());
                    let index = wanted
                        .and_then(|id| self.rooms.iter().position(|room| room.id == id))
                        .or(if self.rooms.is_empty() { None } else { Some(0) });
                    self.room_state.select(index);
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::RoomOpened(result) => match result {
                Ok(room) => {
                    self.open_screen(Screen::Chat);
                    self.pending_room = Some(room.id);
                    self.chat.select(room.id);
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::UsersLoaded(result) | ApiOutcome::UsersUpdated(result) => match result {
                Ok(users) => {
                    self.admin_users = users;
                    self.clamp_admin_selection();
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::AdminPetsLoaded(result) => match result {
                Ok(pets) => {
                    self.admin_pets = pets;
                    self.clamp_admin_selection();
                }
                Err(error) => self.report(&error),
            },
            ApiOutcome::PetDeleted(result) => match result {
                Ok(id) => {
                    self.admin_pets.retain(|pet| pet.id != id);
                    self.pets.retain(|pet| pet.id != id);
                    self.clamp_admin_selection();
                    self.set_info("Pet removed");
                }
                Err(error) => self.report(&error),
            },
        }
    }

    fn clamp_profile_selection(&mut self) {
        let len = self.profile_items().len();
        clamp(&mut self.profile_state, len);
    }

    fn clamp_admin_selection(&mut self) {
        let len = self.admin_len();
        clamp(&mut self.admin_state, len);
    }
}

fn step(state: &mut ListState, len: usize, down: bool) {
    if len == 0 {
        return;
    }
    let i = state.selected().unwrap_or(0);
    let next = if down { (i + 1).min(len - 1) } else { i.saturating_sub(1) };
    state.select(Some(next));
}

fn clamp(state: &mut ListState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        state.select(Some(state.selected().unwrap_or(0).min(len - 1)));
    }
}
