//! Capability Definitions
//!
//! Role-based access is expressed as a closed set of capabilities, each
//! mapping to the roles allowed to use it. Handlers, route layers and core
//! operations all check through [`Capability`].

use shared::models::Role;
use shared::{AppError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Place orders against one's own wallet
    PlaceOrder,
    /// See every order in the kitchen queue
    ViewOrderQueue,
    /// Move an order through its status workflow
    AdvanceOrder,
    /// Create, edit and delete categories and items
    ManageCatalog,
    /// Create and edit users, reissue QR credentials
    ManageUsers,
    /// Credit a user's wallet directly
    RechargeWallet,
    /// Send notifications to other users and read delivery stats
    SendNotifications,
}

const EVERYONE: &[Role] = &Role::ALL;
const STAFF_AND_ADMIN: &[Role] = &[Role::Staff, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Capability {
    pub const fn name(self) -> &'static str {
        match self {
            Capability::PlaceOrder => "orders:place",
            Capability::ViewOrderQueue => "orders:queue",
            Capability::AdvanceOrder => "orders:advance",
            Capability::ManageCatalog => "catalog:manage",
            Capability::ManageUsers => "users:manage",
            Capability::RechargeWallet => "wallet:recharge",
            Capability::SendNotifications => "notifications:send",
        }
    }

    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Capability::PlaceOrder => EVERYONE,
            Capability::ViewOrderQueue | Capability::AdvanceOrder => STAFF_AND_ADMIN,
            Capability::ManageCatalog
            | Capability::ManageUsers
            | Capability::RechargeWallet
            | Capability::SendNotifications => ADMIN_ONLY,
        }
    }

    pub fn allows(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// `Ok` when `role` holds this capability, 403 otherwise
    pub fn check(self, role: Role) -> Result<(), AppError> {
        if self.allows(role) {
            return Ok(());
        }
        let code = if self.allowed_roles() == ADMIN_ONLY {
            ErrorCode::AdminRequired
        } else {
            ErrorCode::PermissionDenied
        };
        Err(AppError::with_message(
            code,
            format!("Permission denied: {}", self.name()),
        ))
    }
}
