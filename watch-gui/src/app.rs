use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Color32, RichText};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use watch_core::{
    ApiError, Comment, MediaApi, MediaKey, Notice, Source, StreamingAvailability, UpNextEntry,
};

/// Everything the egui thread consumes: bus notices forwarded by the
/// per-source pump tasks, plus failures from spawned user actions.
#[derive(Debug)]
pub enum UiEvent {
    Changed(Source, Notice),
    ActionFailed(String),
}

pub struct AppInit {
    pub runtime: Arc<Runtime>,
    pub api: Arc<MediaApi>,
    pub events: mpsc::Receiver<UiEvent>,
    pub event_tx: mpsc::Sender<UiEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum View {
    Watchlist,
    Discover,
    UpNext,
}

pub struct WatchApp {
    runtime: Arc<Runtime>,
    api: Arc<MediaApi>,
    events: mpsc::Receiver<UiEvent>,
    event_tx: mpsc::Sender<UiEvent>,
    view: View,
    watchlist: Vec<watch_core::WatchlistEntry>,
    favorites: Vec<watch_core::FavoriteEntry>,
    ratings: Vec<watch_core::Rating>,
    shows: Vec<watch_core::Show>,
    movies: Vec<watch_core::Movie>,
    up_next: Vec<UpNextEntry>,
    search_input: String,
    search_results: Vec<watch_core::SearchResult>,
    // Comment thread for the media picked in the list views.
    selected: Option<(MediaKey, String)>,
    comments: Vec<Comment>,
    comment_input: String,
    sources: Option<StreamingAvailability>,
    status: Option<String>,
}

impl WatchApp {
    pub fn new(init: AppInit) -> Self {
        let app = Self {
            runtime: init.runtime,
            api: init.api,
            events: init.events,
            event_tx: init.event_tx,
            view: View::Watchlist,
            watchlist: Vec::new(),
            favorites: Vec::new(),
            ratings: Vec::new(),
            shows: Vec::new(),
            movies: Vec::new(),
            up_next: Vec::new(),
            search_input: String::new(),
            search_results: Vec::new(),
            selected: None,
            comments: Vec::new(),
            comment_input: String::new(),
            sources: None,
            status: None,
        };
        app.refresh_everything();
        app
    }

    fn refresh_everything(&self) {
        let api = self.api.clone();
        self.spawn_action(async move { api.refresh_watchlist().await.map(|_| ()) });
        let api = self.api.clone();
        self.spawn_action(async move { api.refresh_favorites().await.map(|_| ()) });
        let api = self.api.clone();
        self.spawn_action(async move { api.refresh_ratings().await.map(|_| ()) });
        let api = self.api.clone();
        self.spawn_action(async move { api.refresh_popular_shows().await.map(|_| ()) });
        let api = self.api.clone();
        self.spawn_action(async move { api.refresh_trending_movies().await.map(|_| ()) });
        let api = self.api.clone();
        self.spawn_action(async move { api.refresh_up_next().await.map(|_| ()) });
    }

    /// Run a use-case off the UI thread; failures come back as a status line
    /// while the stale snapshot stays visible.
    fn spawn_action<F>(&self, fut: F)
    where
        F: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        self.runtime.spawn(async move {
            if let Err(err) = fut.await {
                tracing::warn!(error = %err, "action failed");
                let _ = tx.send(UiEvent::ActionFailed(err.to_string())).await;
            }
        });
    }

    /// A notice only says "re-read"; pull the fresh snapshot out of the store.
    fn reload(&mut self, source: Source, notice: &Notice) {
        let stores = self.api.stores().clone();
        match source {
            Source::Watchlist => {
                let mut entries = self.runtime.block_on(stores.watchlist.get_all());
                entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
                self.watchlist = entries;
            }
            Source::Favorites => {
                self.favorites = self.runtime.block_on(stores.favorites.get_all());
            }
            Source::Ratings => {
                self.ratings = self.runtime.block_on(stores.ratings.get_all());
            }
            Source::PopularShows => {
                let mut shows = self.runtime.block_on(stores.shows.get_all());
                shows.sort_by(|a, b| b.watchers.cmp(&a.watchers).then(a.title.cmp(&b.title)));
                self.shows = shows;
            }
            Source::TrendingMovies => {
                let mut movies = self.runtime.block_on(stores.movies.get_all());
                movies.sort_by(|a, b| b.watchers.cmp(&a.watchers).then(a.title.cmp(&b.title)));
                self.movies = movies;
            }
            Source::UpNext => {
                let mut entries = self.runtime.block_on(stores.up_next.get_all());
                entries.sort_by(|a, b| a.show_title.cmp(&b.show_title));
                self.up_next = entries;
            }
            Source::Search => {
                self.search_results = self.runtime.block_on(stores.search.get_all());
            }
            Source::AllComments | Source::CommentDetails => {
                if let Some(key) = self.selected.as_ref().map(|(key, _)| *key) {
                    let mut comments = self.runtime.block_on(stores.comments.get_all());
                    comments.retain(|c| c.key == key);
                    comments.sort_by(|a, b| a.posted_at.cmp(&b.posted_at));
                    self.comments = comments;
                }
            }
            Source::StreamingSources => {
                if let Some(key) = notice.changed {
                    self.sources = self.runtime.block_on(stores.streaming.get(&key));
                }
            }
            Source::Reactions => {}
        }
    }

    fn rating_for(&self, key: MediaKey) -> Option<u8> {
        self.ratings.iter().find(|r| r.key == key).map(|r| r.value)
    }

    fn is_favorite(&self, key: MediaKey) -> bool {
        self.favorites.iter().any(|f| f.key == key)
    }

    fn select_for_comments(&mut self, key: MediaKey, title: &str) {
        self.selected = Some((key, title.to_string()));
        self.comments.clear();
        let api = self.api.clone();
        self.spawn_action(async move { api.refresh_comments(key).await.map(|_| ()) });
    }

    fn media_actions(&mut self, ui: &mut egui::Ui, key: MediaKey, title: &str) {
        let fav = self.is_favorite(key);
        if ui
            .button(if fav { "♥" } else { "♡" })
            .on_hover_text("Toggle favorite")
            .clicked()
        {
            let api = self.api.clone();
            let title = title.to_string();
            self.spawn_action(async move { api.toggle_favorite(key, &title).await.map(|_| ()) });
        }

        let rating_label = match self.rating_for(key) {
            Some(value) => format!("★{value}"),
            None => "Rate".to_string(),
        };
        ui.menu_button(rating_label, |ui| {
            for value in 1..=10u8 {
                if ui.button(value.to_string()).clicked() {
                    let api = self.api.clone();
                    self.spawn_action(async move { api.rate(key, value).await.map(|_| ()) });
                    ui.close_menu();
                }
            }
            if self.rating_for(key).is_some() && ui.button("Clear").clicked() {
                let api = self.api.clone();
                self.spawn_action(async move { api.unrate(key).await });
                ui.close_menu();
            }
        });

        if ui.button("👍").on_hover_text("React").clicked() {
            let api = self.api.clone();
            self.spawn_action(async move { api.react(key, "👍").await });
        }
        if ui.button("💬").on_hover_text("Comments").clicked() {
            self.select_for_comments(key, title);
        }
        if ui.button("Sources").clicked() {
            let api = self.api.clone();
            self.spawn_action(async move {
                api.refresh_streaming_sources(key).await.map(|_| ())
            });
        }
    }

    fn watchlist_view(&mut self, ui: &mut egui::Ui) {
        if self.watchlist.is_empty() {
            ui.label("Nothing on the watchlist yet.");
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for entry in self.watchlist.clone() {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&entry.title).strong());
                    ui.label(
                        RichText::new(entry.added_at.format("%Y-%m-%d").to_string())
                            .weak()
                            .small(),
                    );
                    self.media_actions(ui, entry.key, &entry.title);
                    if ui.button("Remove").clicked() {
                        let api = self.api.clone();
                        let key = entry.key;
                        self.spawn_action(async move { api.remove_from_watchlist(key).await });
                    }
                });
                ui.separator();
            }
        });
    }

    fn discover_view(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let response = ui.text_edit_singleline(&mut self.search_input);
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (ui.button("Search").clicked() || submitted) && !self.search_input.is_empty() {
                let api = self.api.clone();
                let query = self.search_input.clone();
                self.spawn_action(async move { api.search(&query).await.map(|_| ()) });
            }
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            if !self.search_results.is_empty() {
                ui.heading("Results");
                for result in self.search_results.clone() {
                    ui.horizontal(|ui| {
                        ui.label(&result.title);
                        if let Some(year) = result.year {
                            ui.label(RichText::new(year.to_string()).weak());
                        }
                        self.add_to_watchlist_button(ui, result.key, &result.title);
                    });
                }
                ui.separator();
            }

            ui.heading("Popular shows");
            for show in self.shows.clone() {
                ui.horizontal(|ui| {
                    ui.label(&show.title);
                    if let Some(watchers) = show.watchers {
                        ui.label(RichText::new(format!("{watchers} watching")).weak().small());
                    }
                    self.add_to_watchlist_button(ui, show.key(), &show.title);
                    self.media_actions(ui, show.key(), &show.title);
                });
            }
            ui.separator();

            ui.heading("Trending movies");
            for movie in self.movies.clone() {
                ui.horizontal(|ui| {
                    ui.label(&movie.title);
                    self.add_to_watchlist_button(ui, movie.key(), &movie.title);
                    self.media_actions(ui, movie.key(), &movie.title);
                });
            }
        });
    }

    fn add_to_watchlist_button(&mut self, ui: &mut egui::Ui, key: MediaKey, title: &str) {
        let listed = self.watchlist.iter().any(|e| e.key == key);
        if !listed && ui.button("+ Watchlist").clicked() {
            let api = self.api.clone();
            let title = title.to_string();
            self.spawn_action(async move {
                api.add_to_watchlist(key, &title).await.map(|_| ())
            });
        }
    }

    fn up_next_view(&mut self, ui: &mut egui::Ui) {
        if self.up_next.is_empty() {
            ui.label("All caught up.");
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for entry in self.up_next.clone() {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&entry.show_title).strong());
                    if let Some(episode) = &entry.episode {
                        ui.label(format!(
                            "S{:02}E{:02} · {}",
                            episode.season, episode.number, episode.title
                        ));
                        ui.label(
                            RichText::new(format!("{} left", entry.remaining)).weak().small(),
                        );
                        if ui.button("Watched").clicked() {
                            let api = self.api.clone();
                            let show_id = entry.show_id;
                            let episode_id = episode.id;
                            self.spawn_action(async move {
                                api.mark_watched(show_id, episode_id).await
                            });
                        }
                    }
                    self.media_actions(ui, MediaKey::show(entry.show_id), &entry.show_title);
                });
                ui.separator();
            }
        });
    }

    fn comments_panel(&mut self, ctx: &egui::Context) {
        let Some((key, title)) = self.selected.clone() else {
            return;
        };
        egui::SidePanel::right("comments")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(format!("💬 {title}"));
                    if ui.button("✖").clicked() {
                        self.selected = None;
                        self.comments.clear();
                    }
                });
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for comment in &self.comments {
                        ui.label(RichText::new(&comment.author).strong().small());
                        ui.label(&comment.body);
                        if comment.replies > 0 {
                            ui.label(
                                RichText::new(format!("{} replies", comment.replies))
                                    .weak()
                                    .small(),
                            );
                        }
                        ui.separator();
                    }
                });
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.comment_input);
                    if ui.button("Post").clicked() && !self.comment_input.is_empty() {
                        let body = std::mem::take(&mut self.comment_input);
                        let api = self.api.clone();
                        self.spawn_action(async move {
                            api.comment(key, &body).await.map(|_| ())
                        });
                    }
                });
            });
    }

    fn sources_panel(&mut self, ctx: &egui::Context) {
        let Some(availability) = self.sources.clone() else {
            return;
        };
        egui::TopBottomPanel::bottom("sources").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("Watch {}", availability.key)).strong());
                for source in &availability.sources {
                    let label = match &source.offer {
                        Some(offer) => format!("{} ({offer})", source.name),
                        None => source.name.clone(),
                    };
                    if ui.link(label).clicked() {
                        if let Err(err) = webbrowser::open(&source.url) {
                            self.status = Some(format!("could not open browser: {err}"));
                        }
                    }
                }
                if availability.sources.is_empty() {
                    ui.label("No streaming sources found.");
                }
                if ui.button("✖").clicked() {
                    self.sources = None;
                }
            });
        });
    }

    fn logout(&mut self) {
        self.watchlist.clear();
        self.favorites.clear();
        self.ratings.clear();
        self.shows.clear();
        self.movies.clear();
        self.up_next.clear();
        self.search_results.clear();
        self.comments.clear();
        self.selected = None;
        self.sources = None;
        let api = self.api.clone();
        self.runtime.spawn(async move { api.clear_session().await });
    }
}

impl eframe::App for WatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                UiEvent::Changed(source, notice) => self.reload(source, &notice),
                UiEvent::ActionFailed(message) => self.status = Some(message),
            }
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.view, View::Watchlist, "Watchlist");
                ui.selectable_value(&mut self.view, View::Discover, "Discover");
                ui.selectable_value(&mut self.view, View::UpNext, "Up Next");
                ui.separator();
                if ui.button("⟳").on_hover_text("Refresh").clicked() {
                    self.refresh_everything();
                }
                if ui.button("Logout").clicked() {
                    self.logout();
                }
                if let Some(message) = self.status.clone() {
                    if ui
                        .label(RichText::new(message).color(Color32::LIGHT_RED))
                        .clicked()
                    {
                        self.status = None;
                    }
                }
            });
        });

        self.comments_panel(ctx);
        self.sources_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            View::Watchlist => self.watchlist_view(ui),
            View::Discover => self.discover_view(ui),
            View::UpNext => self.up_next_view(ui),
        });

        // Notices arrive on the runtime threads; poll for them regularly.
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}
