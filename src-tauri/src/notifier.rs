use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::format::{currency_brl, date_br};

/// Opens an external link (browser, WhatsApp, ...).
pub trait LinkOpener: Send + Sync {
    fn open_link(&self, url: &str) -> Result<(), String>;
}

pub struct Notifier {
    recipient_phone: String,
    app_url: String,
    opener: Arc<dyn LinkOpener>,
}

impl Notifier {
    pub fn new(
        recipient_phone: impl Into<String>,
        app_url: impl Into<String>,
        opener: Arc<dyn LinkOpener>,
    ) -> Self {
        Self {
            recipient_phone: recipient_phone.into(),
            app_url: app_url.into(),
            opener,
        }
    }

    pub fn message(&self, date: &NaiveDateTime, amount: f64) -> String {
        format!(
            "Nova transferência realizada!\nData: {}\nValor: {}\nAcesse o sistema com seu login e verifique o histórico completo de transação! {}",
            date_br(date),
            currency_brl(amount),
            self.app_url
        )
    }

    pub fn link(&self, date: &NaiveDateTime, amount: f64) -> String {
        format!(
            "https://wa.me/{}?text={}",
            self.recipient_phone,
            urlencoding::encode(&self.message(date, amount))
        )
    }

    /// Fire and forget: a failure to open the link is only logged.
    pub fn notify(&self, date: &NaiveDateTime, amount: f64) {
        let url = self.link(date, amount);
        match self.opener.open_link(&url) {
            Ok(()) => info!(phone = %self.recipient_phone, "transfer notification opened"),
            Err(err) => warn!(error = %err, "could not open transfer notification"),
        }
    }
}
