mod app;

use std::sync::Arc;
use std::time::Duration;

use eframe::{egui, NativeOptions};
use news_core::{
    client_user_id, ApiClient, AppConfig, AuthStore, LocalStore, NewsStore, ProfileStore, Snapshot,
    UiState,
};
use reqwest::ClientBuilder;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use crate::app::{AppInit, NewsApp};

fn main() -> eframe::Result<()> {
    init_tracing();

    let runtime = Arc::new(Runtime::new().expect("failed to initialise Tokio runtime"));
    let config = AppConfig::load();
    let local = runtime.block_on(LocalStore::open(AppConfig::config_dir()));
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .user_agent("NewsCheck/0.1 (+https://github.com/newscheck/newscheck)")
        .build()
        .expect("failed to build HTTP client");

    let api = config
        .api_base
        .clone()
        .map(|base| ApiClient::new(base, client, local.clone()));
    let user_id = runtime.block_on(client_user_id(&local));
    let store = NewsStore::new(api.clone(), local.clone(), Snapshot::bundled(), user_id);
    let auth = runtime.block_on(AuthStore::load(api.clone(), local.clone()));
    let profile = ProfileStore::new(api, local);

    // Initial load; an unreachable API degrades to the bundled snapshot.
    runtime.block_on(store.fetch_news());

    let mut ui_state = UiState::default();
    ui_state.set_page_size(config.page_size);

    let init = AppInit {
        runtime,
        store,
        auth,
        profile,
        ui_state,
    };

    eframe::run_native(
        "NewsCheck",
        NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1000.0, 760.0])
                .with_min_inner_size([700.0, 500.0]),
            ..Default::default()
        },
        Box::new(move |_cc| Box::new(NewsApp::new(init))),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
