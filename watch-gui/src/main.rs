mod app;

use std::sync::Arc;

use eframe::{egui, NativeOptions};
use reqwest::{redirect, ClientBuilder};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use watch_core::{
    CacheMarker, ClientConfig, MediaApi, RemoteClient, Source, Stores, UpdateBus,
};

use crate::app::{AppInit, UiEvent, WatchApp};

fn main() -> eframe::Result<()> {
    init_tracing();

    let runtime = Arc::new(Runtime::new().expect("failed to initialise Tokio runtime"));
    let config = load_client_config();
    let client = ClientBuilder::new()
        .redirect(redirect::Policy::limited(5))
        .user_agent("WatchLog/0.1 (+https://github.com/watchlog/watchlog)")
        .build()
        .expect("failed to build HTTP client");

    let marker = Arc::new(CacheMarker::new());
    let remote = RemoteClient::new(client, config, Arc::clone(&marker))
        .expect("invalid base url in config");
    let api = Arc::new(MediaApi::new(
        remote,
        Stores::new(),
        UpdateBus::new(),
        marker,
    ));

    let (event_tx, event_rx) = mpsc::channel(64);
    spawn_forwarders(&runtime, &api, event_tx.clone());

    let init = AppInit {
        runtime: runtime.clone(),
        api,
        events: event_rx,
        event_tx,
    };

    eframe::run_native(
        "WatchLog",
        NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([900.0, 700.0])
                .with_min_inner_size([640.0, 480.0]),
            ..Default::default()
        },
        Box::new(move |_cc| Box::new(WatchApp::new(init))),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn config_dir() -> std::path::PathBuf {
    // Linux: ~/.config/watchlog
    let mut dir = dirs::config_dir().unwrap_or_else(|| std::env::current_dir().unwrap());
    dir.push("watchlog");
    dir
}

fn load_client_config() -> ClientConfig {
    let mut path = config_dir();
    path.push("config.json");
    if path.exists() {
        ClientConfig::from_file(&path)
    } else {
        ClientConfig::default()
    }
}

/// One task per bus source, pumping notices into the egui thread's channel.
fn spawn_forwarders(
    runtime: &Arc<Runtime>,
    api: &Arc<MediaApi>,
    tx: mpsc::Sender<UiEvent>,
) {
    for source in Source::ALL {
        let source = *source;
        let mut sub = api.subscribe(source);
        let tx = tx.clone();
        runtime.spawn(async move {
            while let Some(notice) = sub.recv().await {
                if tx.send(UiEvent::Changed(source, notice)).await.is_err() {
                    break;
                }
            }
        });
    }
}
