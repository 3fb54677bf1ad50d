use std::sync::Arc;

use egui::{Color32, Rounding, Stroke};
use news_core::{
    AuthStore, CommentItem, ConnectionState, NewsDraft, NewsItem, NewsStatus, NewsStore,
    ProfileStore, ProfileUpdate, StatusFilter, StoreEvent, UiState, VoteDir,
};
use tokio::runtime::Runtime;
use tokio::sync::broadcast;
use tracing::info;

pub struct AppInit {
    pub runtime: Arc<Runtime>,
    pub store: NewsStore,
    pub auth: AuthStore,
    pub profile: ProfileStore,
    pub ui_state: UiState,
}

#[derive(Debug, Clone)]
enum AppView {
    NewsList,
    NewsDetail(String),
    CreateNews,
    Login,
    Profile,
}

pub struct NewsApp {
    runtime: Arc<Runtime>,
    store: NewsStore,
    auth: AuthStore,
    profile: ProfileStore,
    ui_state: UiState,
    events: broadcast::Receiver<StoreEvent>,
    current_view: AppView,
    search_input: String,
    list_feedback: Option<(bool, String)>,
    // create-news form
    draft_topic: String,
    draft_short: String,
    draft_full: String,
    draft_image: String,
    draft_link: String,
    create_feedback: Option<(bool, String)>,
    // comments
    comment_input: String,
    editing_comment: Option<(String, String)>,
    comment_feedback: Option<(bool, String)>,
    // login form
    login_username: String,
    login_password: String,
    login_feedback: Option<(bool, String)>,
    // profile form
    profile_name: String,
    profile_surname: String,
    profile_username: String,
    profile_email: String,
    profile_feedback: Option<(bool, String)>,
}

impl NewsApp {
    pub fn new(init: AppInit) -> Self {
        let events = init.store.subscribe();
        Self {
            runtime: init.runtime,
            store: init.store,
            auth: init.auth,
            profile: init.profile,
            ui_state: init.ui_state,
            events,
            current_view: AppView::NewsList,
            search_input: String::new(),
            list_feedback: None,
            draft_topic: String::new(),
            draft_short: String::new(),
            draft_full: String::new(),
            draft_image: String::new(),
            draft_link: String::new(),
            create_feedback: None,
            comment_input: String::new(),
            editing_comment: None,
            comment_feedback: None,
            login_username: String::new(),
            login_password: String::new(),
            login_feedback: None,
            profile_name: String::new(),
            profile_surname: String::new(),
            profile_username: String::new(),
            profile_email: String::new(),
            profile_feedback: None,
        }
    }

    fn setup_dark_theme(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        let bg_color = Color32::from_rgb(26, 27, 30);
        let panel_color = Color32::from_rgb(34, 35, 39);
        let border_color = Color32::from_rgb(58, 60, 66);
        let text_color = Color32::from_rgb(206, 208, 212);
        let accent_color = Color32::from_rgb(222, 107, 72);

        style.visuals.dark_mode = true;
        style.visuals.panel_fill = panel_color;
        style.visuals.window_fill = bg_color;
        style.visuals.extreme_bg_color = Color32::from_rgb(21, 22, 24);
        style.visuals.faint_bg_color = Color32::from_rgb(42, 43, 48);
        style.visuals.override_text_color = Some(text_color);

        style.visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, border_color);
        style.visuals.widgets.inactive.bg_fill = Color32::from_rgb(46, 47, 52);
        style.visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, accent_color);
        style.visuals.widgets.active.bg_fill = accent_color;
        style.visuals.selection.bg_fill = Color32::from_rgba_unmultiplied(222, 107, 72, 60);
        style.visuals.selection.stroke = Stroke::new(1.0, accent_color);

        for widget in [
            &mut style.visuals.widgets.noninteractive,
            &mut style.visuals.widgets.inactive,
            &mut style.visuals.widgets.hovered,
            &mut style.visuals.widgets.active,
        ] {
            widget.rounding = Rounding::same(3.0);
        }

        style.spacing.item_spacing = egui::vec2(10.0, 8.0);
        style.spacing.button_padding = egui::vec2(10.0, 6.0);

        ctx.set_style(style);
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.events.try_recv() {
                Ok(StoreEvent::NewsChanged) => {
                    // The filtered count may have changed under the current page.
                    let total = self.runtime.block_on(self.store.total_pages(&self.ui_state));
                    self.ui_state.set_page(self.ui_state.page(), total);
                    ctx.request_repaint();
                }
                Ok(StoreEvent::ConnectionChanged(state)) => {
                    info!(?state, "connection state changed");
                    ctx.request_repaint();
                }
                Ok(_) => ctx.request_repaint(),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }

    fn status_badge(ui: &mut egui::Ui, status: NewsStatus) {
        let (label, color) = match status {
            NewsStatus::Fake => ("fake", Color32::from_rgb(229, 57, 53)),
            NewsStatus::NonFake => ("non-fake", Color32::from_rgb(67, 160, 71)),
            NewsStatus::Neutral => ("neutral", Color32::from_rgb(158, 158, 158)),
        };
        ui.label(egui::RichText::new(label).color(color).strong().size(13.0));
    }

    fn feedback_label(ui: &mut egui::Ui, feedback: &Option<(bool, String)>) {
        if let Some((ok, msg)) = feedback {
            let color = if *ok {
                Color32::from_rgb(67, 160, 71)
            } else {
                Color32::from_rgb(229, 57, 53)
            };
            ui.label(egui::RichText::new(msg.clone()).color(color).size(13.0));
        }
    }

    fn vote_buttons(&mut self, ui: &mut egui::Ui, news_id: &str) {
        let tally = self.runtime.block_on(self.store.votes_for(news_id));
        ui.horizontal(|ui| {
            let up_selected = tally.my_vote == Some(VoteDir::NotFake);
            let down_selected = tally.my_vote == Some(VoteDir::Fake);
            if ui
                .selectable_label(up_selected, format!("👍 Not fake ({})", tally.up))
                .clicked()
            {
                self.cast_vote(news_id, VoteDir::NotFake);
            }
            if ui
                .selectable_label(down_selected, format!("👎 Fake ({})", tally.down))
                .clicked()
            {
                self.cast_vote(news_id, VoteDir::Fake);
            }
        });
    }

    fn cast_vote(&mut self, news_id: &str, dir: VoteDir) {
        match self.runtime.block_on(self.store.vote(news_id, dir)) {
            Ok(()) => self.list_feedback = None,
            Err(err) => self.list_feedback = Some((false, format!("Voting failed: {err}"))),
        }
    }

    fn draw_left_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("nav_panel")
            .min_width(230.0)
            .max_width(290.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.label(egui::RichText::new("📰 NewsCheck").strong().size(20.0));
                match self.runtime.block_on(self.store.connection()) {
                    ConnectionState::Connected => {
                        ui.label(
                            egui::RichText::new("● live")
                                .color(Color32::from_rgb(67, 160, 71))
                                .size(13.0),
                        );
                    }
                    ConnectionState::Degraded => {
                        ui.label(
                            egui::RichText::new("● offline, read-only")
                                .color(Color32::from_rgb(251, 140, 0))
                                .size(13.0),
                        )
                        .on_hover_text("Showing the bundled snapshot plus your local items");
                    }
                }
                ui.separator();

                let w = ui.available_width();
                if ui
                    .add_sized(egui::vec2(w, 28.0), egui::Button::new("🏠 Home"))
                    .clicked()
                {
                    self.current_view = AppView::NewsList;
                }
                if ui
                    .add_sized(egui::vec2(w, 28.0), egui::Button::new("✏ Report news"))
                    .clicked()
                {
                    self.create_feedback = None;
                    self.current_view = AppView::CreateNews;
                }

                let session = self.runtime.block_on(self.auth.session());
                match session {
                    Some(session) => {
                        if ui
                            .add_sized(egui::vec2(w, 28.0), egui::Button::new("👤 Profile"))
                            .clicked()
                        {
                            self.open_profile();
                        }
                        if ui
                            .add_sized(
                                egui::vec2(w, 28.0),
                                egui::Button::new(format!("🚪 Log out ({})", session.username)),
                            )
                            .clicked()
                        {
                            self.runtime.block_on(self.auth.logout());
                        }
                    }
                    None => {
                        if ui
                            .add_sized(egui::vec2(w, 28.0), egui::Button::new("🔑 Log in"))
                            .clicked()
                        {
                            self.login_feedback = None;
                            self.current_view = AppView::Login;
                        }
                    }
                }

                if ui
                    .add_sized(egui::vec2(w, 28.0), egui::Button::new("⟳ Refresh"))
                    .clicked()
                {
                    self.runtime.block_on(self.store.fetch_news());
                }

                ui.add_space(10.0);
                ui.group(|group| {
                    group.vertical(|ui| {
                        ui.label(egui::RichText::new("Filter").strong().size(15.0));
                        ui.separator();
                        for filter in StatusFilter::ALL {
                            let selected = self.ui_state.filter() == filter;
                            if ui.selectable_label(selected, filter.label()).clicked() {
                                self.ui_state.set_filter(filter);
                            }
                        }
                    });
                });

                ui.add_space(10.0);
                ui.group(|group| {
                    group.vertical(|ui| {
                        ui.label(egui::RichText::new("🔍 Search").strong().size(15.0));
                        ui.separator();
                        if ui.text_edit_singleline(&mut self.search_input).changed() {
                            self.ui_state.set_search(&self.search_input);
                        }
                    });
                });
            });
    }

    fn draw_news_list(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new("Latest news").size(18.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new(format!("filter: {}", self.ui_state.filter().label()))
                        .weak()
                        .size(13.0),
                );
            });
        });
        Self::feedback_label(ui, &self.list_feedback);
        ui.separator();

        let page_items = self.runtime.block_on(self.store.paged_news(&self.ui_state));
        let total = self.runtime.block_on(self.store.total_pages(&self.ui_state));

        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                if page_items.is_empty() {
                    ui.label(egui::RichText::new("Nothing matches this view.").weak());
                }
                for item in &page_items {
                    self.draw_news_card(ui, item);
                    ui.add_space(6.0);
                }
            });

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("◀").clicked() && self.ui_state.page() > 1 {
                self.ui_state.set_page(self.ui_state.page() - 1, total);
            }
            ui.label(format!("page {} / {}", self.ui_state.page(), total));
            if ui.button("▶").clicked() {
                self.ui_state.set_page(self.ui_state.page() + 1, total);
            }
        });
    }

    fn draw_news_card(&mut self, ui: &mut egui::Ui, item: &NewsItem) {
        let status = self.runtime.block_on(self.store.status_for(&item.id));
        ui.group(|group| {
            group.vertical(|ui| {
                ui.horizontal(|ui| {
                    if ui
                        .link(egui::RichText::new(&item.topic).strong().size(16.0))
                        .clicked()
                    {
                        self.comment_input.clear();
                        self.editing_comment = None;
                        self.comment_feedback = None;
                        self.current_view = AppView::NewsDetail(item.id.clone());
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        Self::status_badge(ui, status);
                    });
                });
                ui.label(egui::RichText::new(&item.short_detail).size(14.0));
                ui.label(
                    egui::RichText::new(format!(
                        "{} — {}",
                        item.reporter_name,
                        item.reported_at.format("%Y-%m-%d %H:%M")
                    ))
                    .weak()
                    .size(12.0),
                );
                self.vote_buttons(ui, &item.id);
            });
        });
    }

    fn draw_news_detail(&mut self, ui: &mut egui::Ui, news_id: String) {
        ui.horizontal(|ui| {
            if ui.button("← Back").clicked() {
                self.current_view = AppView::NewsList;
                return;
            }
        });
        ui.separator();

        let Some(item) = self.runtime.block_on(self.store.news_item(&news_id)) else {
            ui.label(egui::RichText::new("This item is gone.").weak());
            return;
        };
        let status = self.runtime.block_on(self.store.status_for(&news_id));

        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new(&item.topic).size(18.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                Self::status_badge(ui, status);
            });
        });
        ui.label(
            egui::RichText::new(format!(
                "{} — {}",
                item.reporter_name,
                item.reported_at.format("%Y-%m-%d %H:%M")
            ))
            .weak()
            .size(12.0),
        );
        ui.add_space(6.0);
        ui.label(egui::RichText::new(&item.full_detail).size(14.0));
        if let Some(link) = &item.link {
            if ui.button("🌐 Open source article").clicked() {
                if let Err(err) = webbrowser::open(link) {
                    self.comment_feedback = Some((false, format!("Could not open link: {err}")));
                }
            }
        }
        ui.add_space(6.0);
        self.vote_buttons(ui, &news_id);
        Self::feedback_label(ui, &self.list_feedback);

        ui.separator();
        ui.label(egui::RichText::new("💬 Comments").strong().size(15.0));
        Self::feedback_label(ui, &self.comment_feedback);

        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.comment_input);
            if ui.button("Post").clicked() && !self.comment_input.trim().is_empty() {
                let text = self.comment_input.trim().to_string();
                match self
                    .runtime
                    .block_on(self.store.add_comment(&news_id, &text, None))
                {
                    Ok(_) => {
                        self.comment_input.clear();
                        self.comment_feedback = None;
                    }
                    Err(err) => {
                        self.comment_feedback =
                            Some((false, format!("Comment failed: {err}")));
                    }
                }
            }
        });

        let comments = self.runtime.block_on(self.store.comments_for(&news_id));
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for comment in &comments {
                    self.draw_comment(ui, comment);
                }
            });
    }

    fn draw_comment(&mut self, ui: &mut egui::Ui, comment: &CommentItem) {
        let editable = self
            .runtime
            .block_on(self.store.is_user_comment(&comment.id));
        ui.group(|group| {
            group.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&comment.author).strong().size(13.0));
                    ui.label(
                        egui::RichText::new(comment.created_at.format("%Y-%m-%d %H:%M").to_string())
                            .weak()
                            .size(12.0),
                    );
                    if comment.updated_at.is_some() {
                        ui.label(egui::RichText::new("(edited)").weak().size(12.0));
                    }
                });

                match self.editing_comment.take() {
                    Some((editing_id, mut buffer)) if editing_id == comment.id => {
                        ui.text_edit_singleline(&mut buffer);
                        let mut done = false;
                        ui.horizontal(|ui| {
                            if ui.small_button("Save").clicked() {
                                let text = buffer.trim().to_string();
                                let result = self
                                    .runtime
                                    .block_on(self.store.edit_comment(&comment.id, &text));
                                match result {
                                    Ok(()) => done = true,
                                    Err(err) => {
                                        self.comment_feedback =
                                            Some((false, format!("Edit failed: {err}")));
                                    }
                                }
                            }
                            if ui.small_button("Cancel").clicked() {
                                done = true;
                            }
                        });
                        if !done {
                            self.editing_comment = Some((editing_id, buffer));
                        }
                    }
                    other => {
                        self.editing_comment = other;
                        ui.label(egui::RichText::new(&comment.text).size(13.0));
                        if editable {
                            ui.horizontal(|ui| {
                                if ui.small_button("Edit").clicked() {
                                    self.editing_comment =
                                        Some((comment.id.clone(), comment.text.clone()));
                                }
                                if ui.small_button("Delete").clicked() {
                                    if let Err(err) = self
                                        .runtime
                                        .block_on(self.store.delete_comment(&comment.id))
                                    {
                                        self.comment_feedback =
                                            Some((false, format!("Delete failed: {err}")));
                                    }
                                }
                            });
                        }
                    }
                }
            });
        });
    }

    fn draw_create_news(&mut self, ui: &mut egui::Ui) {
        ui.heading(egui::RichText::new("Report news").size(18.0));
        ui.separator();

        ui.label("Topic");
        ui.text_edit_singleline(&mut self.draft_topic);
        ui.label("Short detail");
        ui.text_edit_singleline(&mut self.draft_short);
        ui.label("Full detail");
        ui.text_edit_multiline(&mut self.draft_full);
        ui.label("Image URL (optional)");
        ui.text_edit_singleline(&mut self.draft_image);
        ui.label("Source link (optional)");
        ui.text_edit_singleline(&mut self.draft_link);

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("📣 Publish").clicked() {
                self.submit_draft();
            }
            if ui.button("Clear").clicked() {
                self.clear_draft();
                self.create_feedback = None;
            }
        });
        Self::feedback_label(ui, &self.create_feedback);
    }

    fn submit_draft(&mut self) {
        if self.draft_topic.trim().is_empty() {
            self.create_feedback = Some((false, "A topic is required.".to_string()));
            return;
        }
        let optional = |s: &String| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };
        let draft = NewsDraft {
            topic: self.draft_topic.trim().to_string(),
            short_detail: self.draft_short.trim().to_string(),
            full_detail: self.draft_full.trim().to_string(),
            reporter_name: None,
            reported_at: Some(chrono::Utc::now()),
            image_url: optional(&self.draft_image),
            link: optional(&self.draft_link),
        };
        match self.runtime.block_on(self.store.add_news(draft)) {
            Ok(_) => {
                self.clear_draft();
                // Jump back to the first page so the new item is visible.
                self.ui_state.set_filter(StatusFilter::All);
                self.current_view = AppView::NewsList;
            }
            Err(err) => {
                self.create_feedback = Some((false, format!("Publishing failed: {err}")));
            }
        }
    }

    fn clear_draft(&mut self) {
        self.draft_topic.clear();
        self.draft_short.clear();
        self.draft_full.clear();
        self.draft_image.clear();
        self.draft_link.clear();
    }

    fn draw_login(&mut self, ui: &mut egui::Ui) {
        ui.heading(egui::RichText::new("Log in").size(18.0));
        ui.separator();

        ui.label("Username");
        ui.text_edit_singleline(&mut self.login_username);
        ui.label("Password");
        ui.add(egui::TextEdit::singleline(&mut self.login_password).password(true));

        ui.add_space(6.0);
        if ui.button("🔑 Log in").clicked() {
            let result = self
                .runtime
                .block_on(self.auth.login(&self.login_username, &self.login_password));
            match result {
                Ok(_) => {
                    self.login_password.clear();
                    self.login_feedback = None;
                    self.current_view = AppView::NewsList;
                }
                Err(err) => {
                    self.login_feedback = Some((false, format!("Login failed: {err}")));
                }
            }
        }
        Self::feedback_label(ui, &self.login_feedback);
    }

    fn open_profile(&mut self) {
        self.profile_feedback = None;
        match self.runtime.block_on(self.profile.fetch_profile()) {
            Ok(user) => {
                self.profile_name = user.name.unwrap_or_default();
                self.profile_surname = user.surname.unwrap_or_default();
                self.profile_username = user.username.unwrap_or_default();
                self.profile_email = user.email.unwrap_or_default();
            }
            Err(err) => {
                self.profile_feedback = Some((false, format!("Could not load profile: {err}")));
            }
        }
        self.current_view = AppView::Profile;
    }

    fn draw_profile(&mut self, ui: &mut egui::Ui) {
        ui.heading(egui::RichText::new("Profile").size(18.0));
        ui.separator();

        ui.label("Name");
        ui.text_edit_singleline(&mut self.profile_name);
        ui.label("Surname");
        ui.text_edit_singleline(&mut self.profile_surname);
        ui.label("Username");
        ui.text_edit_singleline(&mut self.profile_username);
        ui.label("Email");
        ui.text_edit_singleline(&mut self.profile_email);

        ui.add_space(6.0);
        if ui.button("💾 Save").clicked() {
            let update = ProfileUpdate {
                name: self.profile_name.trim().to_string(),
                surname: self.profile_surname.trim().to_string(),
                username: self.profile_username.trim().to_string(),
                email: self.profile_email.trim().to_string(),
            };
            match self.runtime.block_on(self.profile.update_profile(&update)) {
                Ok(_) => self.profile_feedback = Some((true, "Profile saved.".to_string())),
                Err(err) => {
                    self.profile_feedback = Some((false, format!("Saving failed: {err}")));
                }
            }
        }
        Self::feedback_label(ui, &self.profile_feedback);
    }
}

impl eframe::App for NewsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.setup_dark_theme(ctx);
        self.drain_events(ctx);
        self.draw_left_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| match self.current_view.clone() {
            AppView::NewsList => self.draw_news_list(ui),
            AppView::NewsDetail(news_id) => self.draw_news_detail(ui, news_id),
            AppView::CreateNews => self.draw_create_news(ui),
            AppView::Login => self.draw_login(ui),
            AppView::Profile => self.draw_profile(ui),
        });
    }
}
