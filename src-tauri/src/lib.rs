pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod ledger;
pub mod notifier;
pub mod store;
pub mod view;

use std::sync::{Arc, Mutex};

use tauri::{AppHandle, Emitter, Manager, State, WindowEvent};
use tauri_plugin_opener::OpenerExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::{CommandError, StoreError};
use crate::ledger::{LedgerSnapshot, TransferRecord};
use crate::notifier::{LinkOpener, Notifier};
use crate::store::{LedgerStore, SqliteLedgerStore, Subscription};
use crate::view::{PaymentView, ViewModel};

pub const LEDGER_CHANGED_EVENT: &str = "ledger-changed";

struct AppState {
    config: AppConfig,
    store: Arc<SqliteLedgerStore>,
    notifier: Notifier,
    view: Mutex<PaymentView>,
    transfers: Arc<Mutex<Vec<TransferRecord>>>,
    subscription: Mutex<Option<Subscription>>,
}

struct TauriOpener(AppHandle);

impl LinkOpener for TauriOpener {
    fn open_link(&self, url: &str) -> Result<(), String> {
        self.0
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|err| err.to_string())
    }
}

fn render(state: &AppState, view: &PaymentView) -> Result<ViewModel, CommandError> {
    let transfers = state.transfers.lock().map_err(|_| CommandError::Poisoned)?;
    Ok(view.render(&transfers, state.config.total_due))
}

#[tauri::command(rename_all = "snake_case")]
fn current_view(state: State<'_, AppState>) -> Result<ViewModel, CommandError> {
    let view = state.view.lock().map_err(|_| CommandError::Poisoned)?;
    render(&state, &view)
}

#[tauri::command(rename_all = "snake_case")]
fn login(
    state: State<'_, AppState>,
    username: String,
    password: String,
) -> Result<ViewModel, CommandError> {
    let mut view = state.view.lock().map_err(|_| CommandError::Poisoned)?;
    // A rejected login is reported through the rendered error message.
    let _ = view.submit_login(&state.config.credentials, &username, &password);
    render(&state, &view)
}

#[tauri::command(rename_all = "snake_case")]
fn logout(state: State<'_, AppState>) -> Result<ViewModel, CommandError> {
    let mut view = state.view.lock().map_err(|_| CommandError::Poisoned)?;
    view.logout();
    render(&state, &view)
}

#[tauri::command(rename_all = "snake_case")]
fn add_transfer(
    state: State<'_, AppState>,
    date: String,
    amount: String,
) -> Result<ViewModel, CommandError> {
    let mut view = state.view.lock().map_err(|_| CommandError::Poisoned)?;
    // Validation and store failures are shown in the entry form's error line.
    let _ = view.submit_transfer(&*state.store, &state.notifier, &date, &amount);
    render(&state, &view)
}

/// Keeps `cache` equal to the latest delivery and forwards every delivery to
/// the webview.
fn subscribe_ledger(
    app: &AppHandle,
    store: &dyn LedgerStore,
    cache: Arc<Mutex<Vec<TransferRecord>>>,
    total_due: f64,
) -> Result<Subscription, StoreError> {
    let handle = app.clone();
    store.subscribe(Box::new(move |transfers: Vec<TransferRecord>| {
        match cache.lock() {
            Ok(mut cached) => *cached = transfers.clone(),
            Err(_) => warn!("transfer cache lock poisoned"),
        }
        let snapshot = LedgerSnapshot::new(transfers, total_due);
        if let Err(err) = handle.emit(LEDGER_CHANGED_EVENT, &snapshot) {
            warn!(error = %err, "could not emit ledger change");
        }
    }))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let config = AppConfig::from_env()?;
            let store = Arc::new(SqliteLedgerStore::new(db::open_app_connection(
                app.handle(),
            )?)?);
            let transfers = Arc::new(Mutex::new(Vec::new()));
            let subscription = subscribe_ledger(
                app.handle(),
                &*store,
                Arc::clone(&transfers),
                config.total_due,
            )?;
            let notifier = Notifier::new(
                config.recipient_phone.clone(),
                config.app_url.clone(),
                Arc::new(TauriOpener(app.handle().clone())),
            );
            info!(total_due = config.total_due, "payment ledger ready");

            app.manage(AppState {
                config,
                store,
                notifier,
                view: Mutex::new(PaymentView::new()),
                transfers,
                subscription: Mutex::new(Some(subscription)),
            });
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                if let Some(state) = window.try_state::<AppState>() {
                    if let Some(subscription) = state
                        .subscription
                        .lock()
                        .ok()
                        .and_then(|mut slot| slot.take())
                    {
                        subscription.release();
                    }
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            current_view,
            login,
            logout,
            add_transfer
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
