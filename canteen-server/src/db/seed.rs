//! Demo data for an empty database
//!
//! Accounts (PIN 1234 for all):
//!
//! | code | role | password |
//! |------|------|----------|
//! | ADM001 | ADMIN | admin123 |
//! | STF001 | STAFF | staff123 |
//! | STU001 | USER | user123 |

use shared::models::Role;
use shared::{AppError, Money};

use crate::core::ServerState;
use crate::db::repository::{catalog, user as user_repo};
use crate::users::{self, NewAccount};
use crate::wallet::PaymentRef;

const DEMO_PIN: &str = "1234";

/// Opening wallet balance of the demo student (rupees)
const DEMO_STUDENT_BALANCE: i64 = 500;

/// (category, [(item, description, price in paise)])
const DEMO_MENU: &[(&str, &[(&str, &str, i64)])] = &[
    (
        "Breakfast",
        &[
            ("Masala Dosa", "Crispy dosa with potato filling", 6000),
            ("Idli Sambar", "Two idlis with sambar and chutney", 4000),
        ],
    ),
    (
        "Meals",
        &[
            ("Veg Thali", "Rice, dal, two curries, roti", 12000),
            ("Chicken Biryani", "Hyderabadi style", 15000),
        ],
    ),
    (
        "Beverages",
        &[
            ("Masala Chai", "", 1500),
            ("Cold Coffee", "", 5000),
        ],
    ),
];

/// Seed accounts and a small menu; does nothing when any user exists
///
/// Returns `true` when data was written. The student's opening balance goes
/// through the ledger so balance and ledger agree from the start.
pub async fn seed_demo_data(state: &ServerState) -> Result<bool, AppError> {
    if user_repo::count_users(state.pool()).await? > 0 {
        tracing::debug!("Database already has users, skipping demo seed");
        return Ok(false);
    }

    let accounts = [
        ("Canteen Admin", "admin@canteen.local", Role::Admin, "admin123"),
        ("Kitchen Staff", "staff@canteen.local", Role::Staff, "staff123"),
        ("Demo Student", "student@canteen.local", Role::User, "user123"),
    ];

    let mut student_id = None;
    for (name, email, role, password) in accounts {
        let user = users::create_account(
            state.pool(),
            NewAccount {
                name: name.to_string(),
                email: email.to_string(),
                phone: None,
                photo: None,
                role,
                pin: DEMO_PIN.to_string(),
                password: Some(password.to_string()),
            },
        )
        .await?;
        if role == Role::User {
            student_id = Some(user.id);
        }
    }

    if let Some(id) = student_id {
        state
            .ledger
            .credit(
                id,
                Money::from_major(DEMO_STUDENT_BALANCE),
                "Opening balance",
                Some(PaymentRef::admin_recharge()),
            )
            .await?;
    }

    for (category_name, items) in DEMO_MENU {
        let category = catalog::create_category(state.pool(), category_name, None).await?;
        for (name, description, price) in *items {
            catalog::create_item(
                state.pool(),
                catalog::NewItem {
                    name: name.to_string(),
                    description: (!description.is_empty()).then(|| description.to_string()),
                    price: Money::from_minor(*price),
                    category_id: category.id,
                    image: None,
                    is_available: true,
                },
            )
            .await?;
        }
    }

    tracing::info!("Demo data seeded (ADM001, STF001, STU001)");
    Ok(true)
}
