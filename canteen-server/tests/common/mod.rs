//! Shared fixtures for the integration suites
//!
//! Each test gets its own temporary work dir and SQLite file.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use canteen_server::core::{Config, ServerState};
use canteen_server::db::DbService;
use canteen_server::db::repository::{catalog, user as user_repo};
use canteen_server::services::{MailError, MailMessage, Mailer};
use canteen_server::wallet::PaymentRef;
use shared::Money;
use shared::models::{Category, Item, Role, User};
use tempfile::TempDir;
use tokio::sync::Mutex;

static SEQ: AtomicUsize = AtomicUsize::new(1);

fn next_seq() -> usize {
    SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Mailer that keeps every message for inspection
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

pub struct TestContext {
    pub state: ServerState,
    pub mailer: Arc<RecordingMailer>,
    // dropped last: removes the database file
    _dir: TempDir,
}

pub async fn setup() -> TestContext {
    setup_with(|_| {}).await
}

pub async fn setup_with(configure: impl FnOnce(&mut Config)) -> TestContext {
    let dir = TempDir::new().unwrap();
    let mut config = Config::for_work_dir(dir.path().to_string_lossy().to_string());
    configure(&mut config);
    config.ensure_work_dir_structure().unwrap();

    let db = DbService::new(&config.database_path()).await.unwrap();
    let mailer = Arc::new(RecordingMailer::default());
    let state = ServerState::from_parts(config, db, mailer.clone());

    TestContext {
        state,
        mailer,
        _dir: dir,
    }
}

/// Insert a user directly (no hashing); the account cannot log in by PIN
pub async fn insert_user(state: &ServerState, role: Role) -> User {
    let n = next_seq();
    let user_code = format!("{}{:03}", role.code_prefix(), n);
    user_repo::create(
        state.pool(),
        user_repo::NewUser {
            qr_code: format!("CANTEEN_{user_code}_{n}"),
            user_code,
            name: format!("Test User {n}"),
            email: format!("user{n}@test.local"),
            phone: None,
            photo: None,
            role,
            pin_hash: "unused".into(),
            password_hash: None,
        },
    )
    .await
    .unwrap()
}

/// Student with `rupees` credited through the ledger
pub async fn funded_student(state: &ServerState, rupees: i64) -> User {
    let user = insert_user(state, Role::User).await;
    if rupees > 0 {
        state
            .ledger
            .credit(
                user.id,
                Money::from_major(rupees),
                "Test funding",
                Some(PaymentRef::admin_recharge()),
            )
            .await
            .unwrap();
    }
    user
}

pub async fn create_category(state: &ServerState) -> Category {
    catalog::create_category(state.pool(), &format!("Category {}", next_seq()), None)
        .await
        .unwrap()
}

pub async fn create_item(state: &ServerState, category: &Category, rupees: i64, available: bool) -> Item {
    catalog::create_item(
        state.pool(),
        catalog::NewItem {
            name: format!("Item {}", next_seq()),
            description: None,
            price: Money::from_major(rupees),
            category_id: category.id,
            image: None,
            is_available: available,
        },
    )
    .await
    .unwrap()
}

pub async fn balance_of(state: &ServerState, user_id: i64) -> Money {
    state.ledger.balance(user_id).await.unwrap()
}

pub async fn order_count(state: &ServerState, user_id: i64) -> i64 {
    user_repo::count_orders(state.pool(), user_id).await.unwrap()
}
