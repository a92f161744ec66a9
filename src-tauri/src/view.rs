//! Screen state for the single page: the login form until credentials are
//! accepted, then the ledger with the entry form shown to admins only.

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{Credentials, Role};
use crate::error::{AuthError, ValidationError};
use crate::format::{currency_brl, date_br};
use crate::ledger::{add_transfer, summarize, TransferRecord};
use crate::notifier::Notifier;
use crate::store::LedgerStore;

pub const MSG_INVALID_CREDENTIALS: &str = "Usuário ou senha incorretos";
pub const MSG_MISSING_FIELD: &str = "Preencha todos os campos";
pub const MSG_INVALID_AMOUNT: &str = "Valor inválido";
pub const MSG_INVALID_DATE: &str = "Data inválida";
pub const MSG_PERSISTENCE_FAILED: &str = "Erro ao adicionar transferência";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    LoggedOut,
    LoggedIn(Role),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferForm {
    pub date: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ViewModel {
    Login {
        username: String,
        error: Option<String>,
    },
    Ledger {
        role: Role,
        entry_form: Option<EntryForm>,
        history: Vec<HistoryRow>,
        total_paid: String,
        remaining: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryForm {
    pub date: String,
    pub amount: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub id: i64,
    pub date: String,
    pub amount: String,
}

fn validation_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::MissingField => MSG_MISSING_FIELD,
        ValidationError::InvalidAmount => MSG_INVALID_AMOUNT,
        ValidationError::InvalidDate => MSG_INVALID_DATE,
        ValidationError::PersistenceFailed(_) => MSG_PERSISTENCE_FAILED,
    }
}

#[derive(Debug)]
pub struct PaymentView {
    screen: Screen,
    login_form: LoginForm,
    transfer_form: TransferForm,
    error: Option<String>,
}

impl Default for PaymentView {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentView {
    pub fn new() -> Self {
        Self {
            screen: Screen::LoggedOut,
            login_form: LoginForm::default(),
            transfer_form: TransferForm::default(),
            error: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn role(&self) -> Option<Role> {
        match self.screen {
            Screen::LoggedIn(role) => Some(role),
            Screen::LoggedOut => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login_form
    }

    pub fn transfer_form(&self) -> &TransferForm {
        &self.transfer_form
    }

    pub fn entry_form_visible(&self) -> bool {
        self.role().is_some_and(Role::can_record_transfers)
    }

    pub fn submit_login(
        &mut self,
        credentials: &Credentials,
        username: &str,
        password: &str,
    ) -> Result<Role, AuthError> {
        self.login_form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        match credentials.login(username, password) {
            Ok(role) => {
                info!(?role, "login accepted");
                self.screen = Screen::LoggedIn(role);
                self.error = None;
                Ok(role)
            }
            Err(err) => {
                warn!("login rejected");
                self.error = Some(MSG_INVALID_CREDENTIALS.to_string());
                Err(err)
            }
        }
    }

    pub fn logout(&mut self) {
        if self.screen != Screen::LoggedOut {
            info!("logged out");
        }
        self.screen = Screen::LoggedOut;
        self.login_form = LoginForm::default();
        self.transfer_form = TransferForm::default();
        self.error = None;
    }

    /// Submits the entry form. Returns `Ok(None)` when the current screen has
    /// no entry form, in which case nothing is validated or stored.
    pub fn submit_transfer(
        &mut self,
        store: &dyn LedgerStore,
        notifier: &Notifier,
        date_input: &str,
        amount_input: &str,
    ) -> Result<Option<TransferRecord>, ValidationError> {
        if !self.entry_form_visible() {
            return Ok(None);
        }
        self.transfer_form = TransferForm {
            date: date_input.to_string(),
            amount: amount_input.to_string(),
        };

        match add_transfer(store, date_input, amount_input) {
            Ok(record) => {
                notifier.notify(&record.date, record.amount);
                self.transfer_form = TransferForm::default();
                self.error = None;
                Ok(Some(record))
            }
            Err(err) => {
                if let ValidationError::PersistenceFailed(reason) = &err {
                    warn!(%reason, "transfer not stored");
                }
                self.error = Some(validation_message(&err).to_string());
                Err(err)
            }
        }
    }

    pub fn render(&self, transfers: &[TransferRecord], total_due: f64) -> ViewModel {
        let role = match self.screen {
            Screen::LoggedOut => {
                return ViewModel::Login {
                    username: self.login_form.username.clone(),
                    error: self.error.clone(),
                }
            }
            Screen::LoggedIn(role) => role,
        };

        let summary = summarize(transfers, total_due);
        let entry_form = self.entry_form_visible().then(|| EntryForm {
            date: self.transfer_form.date.clone(),
            amount: self.transfer_form.amount.clone(),
            error: self.error.clone(),
        });
        let history = transfers
            .iter()
            .map(|transfer| HistoryRow {
                id: transfer.id,
                date: date_br(&transfer.date),
                amount: currency_brl(transfer.amount),
            })
            .collect();

        ViewModel::Ledger {
            role,
            entry_form,
            history,
            total_paid: currency_brl(summary.total_paid),
            remaining: currency_brl(summary.remaining),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::CredentialPair;
    use crate::notifier::testing::RecordingOpener;
    use crate::error::StoreError;
    use crate::ledger::NewTransfer;
    use crate::store::{ChangeListener, SqliteLedgerStore, Subscription};

    struct FailingStore;

    impl LedgerStore for FailingStore {
        fn subscribe(&self, _on_change: ChangeListener) -> Result<Subscription, StoreError> {
            Err(StoreError::Poisoned)
        }

        fn append(&self, _transfer: NewTransfer) -> Result<TransferRecord, StoreError> {
            Err(StoreError::Poisoned)
        }

        fn remove(&self, _id: i64) -> Result<bool, StoreError> {
            Err(StoreError::Poisoned)
        }

        fn load_all(&self) -> Result<Vec<TransferRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            admin: CredentialPair::new("admin", "secret"),
            viewer: CredentialPair::new("viewer", "peek"),
        }
    }

    fn notifier(opener: &Arc<RecordingOpener>) -> Notifier {
        let opener: Arc<RecordingOpener> = Arc::clone(opener);
        Notifier::new("5511999999999", "https://ledger.example/", opener)
    }

    fn admin_view() -> PaymentView {
        let mut view = PaymentView::new();
        view.submit_login(&credentials(), "admin", "secret").unwrap();
        view
    }

    #[test]
    fn starts_logged_out() {
        let view = PaymentView::new();
        assert_eq!(view.screen(), Screen::LoggedOut);
        assert_eq!(
            view.render(&[], 25_000.0),
            ViewModel::Login {
                username: String::new(),
                error: None
            }
        );
    }

    #[test]
    fn failed_login_keeps_form_and_shows_single_message() {
        let mut view = PaymentView::new();
        let err = view.submit_login(&credentials(), "admin", "wrong").unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(view.screen(), Screen::LoggedOut);
        assert_eq!(view.error(), Some(MSG_INVALID_CREDENTIALS));
        assert_eq!(view.login_form().username, "admin");

        view.submit_login(&credentials(), "nobody", "secret").unwrap_err();
        assert_eq!(view.error(), Some(MSG_INVALID_CREDENTIALS));
    }

    #[test]
    fn successful_login_clears_error() {
        let mut view = PaymentView::new();
        view.submit_login(&credentials(), "admin", "wrong").unwrap_err();
        view.submit_login(&credentials(), "viewer", "peek").unwrap();
        assert_eq!(view.screen(), Screen::LoggedIn(Role::Viewer));
        assert_eq!(view.error(), None);
    }

    #[test]
    fn logout_is_idempotent_and_clears_fields() {
        let mut view = admin_view();
        view.logout();
        assert_eq!(view.screen(), Screen::LoggedOut);
        assert_eq!(view.login_form(), &LoginForm::default());
        view.logout();
        assert_eq!(view.screen(), Screen::LoggedOut);
    }

    #[test]
    fn admin_entry_clears_form_and_notifies_once() {
        let store = SqliteLedgerStore::open_in_memory().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let notifier = notifier(&opener);
        let mut view = admin_view();

        let record = view
            .submit_transfer(&store, &notifier, "2024-05-01", "1500")
            .unwrap()
            .unwrap();
        assert_eq!(record.amount, 1500.0);
        assert_eq!(view.transfer_form(), &TransferForm::default());
        assert_eq!(view.error(), None);

        let opened = opener.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].contains("01%2F05%2F2024"));
    }

    #[test]
    fn invalid_entry_keeps_form_and_replaces_message() {
        let store = SqliteLedgerStore::open_in_memory().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let notifier = notifier(&opener);
        let mut view = admin_view();

        let err = view
            .submit_transfer(&store, &notifier, "", "100")
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField);
        assert_eq!(view.error(), Some(MSG_MISSING_FIELD));

        let err = view
            .submit_transfer(&store, &notifier, "2024-05-01", "abc")
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidAmount);
        assert_eq!(view.error(), Some(MSG_INVALID_AMOUNT));
        assert_eq!(
            view.transfer_form(),
            &TransferForm {
                date: "2024-05-01".into(),
                amount: "abc".into()
            }
        );
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn viewer_has_no_entry_form() {
        let store = SqliteLedgerStore::open_in_memory().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let notifier = notifier(&opener);
        let mut view = PaymentView::new();
        view.submit_login(&credentials(), "viewer", "peek").unwrap();

        assert!(!view.entry_form_visible());
        let submitted = view
            .submit_transfer(&store, &notifier, "2024-05-01", "100")
            .unwrap();
        assert_eq!(submitted, None);
        assert!(store.load_all().unwrap().is_empty());

        match view.render(&[], 25_000.0) {
            ViewModel::Ledger {
                role, entry_form, ..
            } => {
                assert_eq!(role, Role::Viewer);
                assert_eq!(entry_form, None);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn ledger_render_formats_rows_and_totals() {
        let store = SqliteLedgerStore::open_in_memory().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let notifier = notifier(&opener);
        let mut view = admin_view();
        view.submit_transfer(&store, &notifier, "2024-01-01", "20000").unwrap();
        view.submit_transfer(&store, &notifier, "2024-03-01", "6000.5").unwrap();

        let transfers = store.load_all().unwrap();
        let ViewModel::Ledger {
            history,
            total_paid,
            remaining,
            entry_form,
            ..
        } = view.render(&transfers, 25_000.0)
        else {
            panic!("expected ledger screen");
        };

        assert_eq!(history[0].date, "01/03/2024");
        assert_eq!(history[0].amount, "R$\u{a0}6.000,50");
        assert_eq!(history[1].date, "01/01/2024");
        assert_eq!(total_paid, "R$\u{a0}26.000,50");
        assert_eq!(remaining, "-R$\u{a0}1.000,50");
        assert!(entry_form.is_some());
    }

    #[test]
    fn view_model_is_tagged_by_screen() {
        let view = PaymentView::new();
        let json = serde_json::to_value(view.render(&[], 25_000.0)).unwrap();
        assert_eq!(json["screen"], "login");

        let view = admin_view();
        let json = serde_json::to_value(view.render(&[], 25_000.0)).unwrap();
        assert_eq!(json["screen"], "ledger");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["remaining"], "R$\u{a0}25.000,00");
    }

    #[test]
    fn store_failure_keeps_form_and_skips_notification() {
        let opener = Arc::new(RecordingOpener::default());
        let notifier = notifier(&opener);
        let mut view = admin_view();

        let err = view
            .submit_transfer(&FailingStore, &notifier, "2024-05-01", "1500")
            .unwrap_err();
        assert!(matches!(err, ValidationError::PersistenceFailed(_)));
        assert_eq!(view.error(), Some(MSG_PERSISTENCE_FAILED));
        assert_eq!(
            view.transfer_form(),
            &TransferForm {
                date: "2024-05-01".into(),
                amount: "1500".into()
            }
        );
        assert!(opener.opened.lock().unwrap().is_empty());
    }
}
