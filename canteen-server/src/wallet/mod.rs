//! Wallet domain: the ledger, UPI payment intents and callback signatures

mod error;
pub mod ledger;
pub mod signature;
pub mod upi;

pub use error::WalletError;
pub(crate) use error::insufficient_funds;
pub use ledger::{LedgerEntry, MAX_WALLET_BALANCE, PaymentRef, Reconciliation, WalletLedger};
pub use upi::{UpiConfig, build_payment_intent};
