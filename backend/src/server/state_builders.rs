//! Builders wiring ledger adapters into the HTTP and WebSocket state.
//!
//! One code path serves both backends: PostgreSQL when a pool is
//! configured, the in-memory store otherwise. Services share a single
//! change feed so every committed change reaches every socket.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use advance_ledger::domain::ports::{
    ChangePublisher, LedgerRepository, LedgerUnitOfWork, NotificationRepository,
};
use advance_ledger::domain::{
    ChangeFeedService, DirectoryLoginService, LedgerPolicy, LedgerService, LedgerSnapshot,
    NotificationService, ReceiptService, ReportService,
};
use advance_ledger::inbound::http::state::{HttpState, SidePorts};
use advance_ledger::inbound::ws::state::{OriginPolicy, WsState};
use advance_ledger::outbound::persistence::{
    DieselLedgerRepository, DieselLedgerUnitOfWork, DieselNotificationRepository,
};
use advance_ledger::outbound::{
    BroadcastChangeFeed, InMemoryLedgerStore, JsonWorkbookExporter, ReceiptDirectory,
};

use super::ServerConfig;

/// Application data shared by every worker.
#[derive(Clone)]
pub(super) struct AppStates {
    pub(super) http: web::Data<HttpState>,
    pub(super) ws: web::Data<WsState>,
}

/// Adapters that do not depend on the ledger backend.
struct SharedAdapters {
    publisher: Arc<dyn ChangePublisher>,
    receipts: Arc<ReceiptDirectory>,
    clock: Arc<dyn Clock>,
    policy: LedgerPolicy,
    dev_login_password: Option<String>,
    origins: OriginPolicy,
}

fn wire_states<R, W, N>(
    repo: Arc<R>,
    unit_of_work: Arc<W>,
    inbox: Arc<N>,
    shared: SharedAdapters,
) -> AppStates
where
    R: LedgerRepository + 'static,
    W: LedgerUnitOfWork + 'static,
    N: NotificationRepository + 'static,
{
    let SharedAdapters {
        publisher,
        receipts,
        clock,
        policy,
        dev_login_password,
        origins,
    } = shared;

    let ledger = Arc::new(LedgerService::new(
        repo.clone(),
        unit_of_work,
        publisher.clone(),
        clock.clone(),
        policy,
    ));
    let side = SidePorts {
        login: Arc::new(DirectoryLoginService::new(repo.clone(), dev_login_password)),
        reports: Arc::new(ReportService::new(
            repo.clone(),
            Arc::new(JsonWorkbookExporter),
            clock,
            policy,
        )),
        receipts: Arc::new(ReceiptService::new(receipts)),
        notifications: Arc::new(NotificationService::new(inbox, publisher.clone())),
    };
    let feed = Arc::new(ChangeFeedService::new(repo, publisher, policy));

    AppStates {
        http: web::Data::new(HttpState::from_ledger(ledger, side)),
        ws: web::Data::new(WsState::new(feed, origins)),
    }
}

/// Build handler state for the configured backend.
///
/// # Errors
/// Fails when the receipt directory cannot be created.
pub(super) fn build_states(config: &ServerConfig) -> std::io::Result<AppStates> {
    let receipts = ReceiptDirectory::open(
        config.ledger.receipt_dir(),
        config.ledger.receipt_base_url(),
    )?;
    let shared = SharedAdapters {
        publisher: Arc::new(BroadcastChangeFeed::default()),
        receipts: Arc::new(receipts),
        clock: Arc::new(DefaultClock),
        policy: config.ledger.policy(),
        dev_login_password: config.ledger.dev_login_password.clone(),
        origins: config.origins.clone(),
    };

    Ok(match &config.db_pool {
        Some(pool) => wire_states(
            Arc::new(DieselLedgerRepository::new(pool.clone())),
            Arc::new(DieselLedgerUnitOfWork::new(pool.clone())),
            Arc::new(DieselNotificationRepository::new(pool.clone())),
            shared,
        ),
        None => {
            let store = Arc::new(InMemoryLedgerStore::seeded(LedgerSnapshot {
                users: config.bootstrap_admin.iter().cloned().collect(),
                ..LedgerSnapshot::default()
            }));
            wire_states(store.clone(), store.clone(), store, shared)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use actix_web::cookie::{Key, SameSite};
    use advance_ledger::domain::{ErrorCode, LoginCredentials, UserId};
    use advance_ledger::settings::LedgerSettings;
    use ortho_config::OrthoConfig;
    use rstest::rstest;

    fn shared(dir: &std::path::Path) -> SharedAdapters {
        SharedAdapters {
            publisher: Arc::new(BroadcastChangeFeed::default()),
            receipts: Arc::new(ReceiptDirectory::open(dir, "/receipts").expect("receipt dir")),
            clock: Arc::new(DefaultClock),
            policy: LedgerPolicy::default(),
            dev_login_password: Some("letmein".to_owned()),
            origins: OriginPolicy::default(),
        }
    }

    fn memory_states(dir: &std::path::Path) -> AppStates {
        let store = Arc::new(InMemoryLedgerStore::new());
        wire_states(store.clone(), store.clone(), store, shared(dir))
    }

    #[rstest]
    #[tokio::test]
    async fn empty_store_knows_no_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        let states = memory_states(dir.path());
        let credentials =
            LoginCredentials::try_from_parts("nobody@example.com", "letmein").expect("shape");

        let err = states
            .http
            .login
            .authenticate(&credentials)
            .await
            .expect_err("unknown user");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn bootstrap_admin_signs_in_to_the_memory_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ledger = LedgerSettings::load_from_iter([OsString::from("advance-ledger")])
            .expect("ledger settings");
        ledger.receipt_dir = Some(dir.path().to_path_buf());
        ledger.dev_login_password = Some("letmein".to_owned());
        ledger.admin_email = Some("noura@example.com".to_owned());
        let admin = ledger.bootstrap_admin().expect("valid admin").expect("configured");
        let config = ServerConfig::new(
            Key::generate(),
            false,
            SameSite::Lax,
            "127.0.0.1:0".parse().expect("addr"),
            ledger,
        )
        .with_bootstrap_admin(Some(admin.clone()));
        let states = build_states(&config).expect("states");
        let credentials =
            LoginCredentials::try_from_parts("noura@example.com", "letmein").expect("shape");

        let signed_in = states
            .http
            .login
            .authenticate(&credentials)
            .await
            .expect("admin signs in");

        assert_eq!(signed_in, admin.id());
    }

    #[rstest]
    #[tokio::test]
    async fn change_feed_shares_the_ledger_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let states = memory_states(dir.path());

        let err = states
            .ws
            .feed
            .watch(&UserId::random())
            .await
            .err()
            .expect("unknown viewer");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
