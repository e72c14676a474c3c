//! Wallet Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use shared::models::{
    NotificationKind, PaymentOutcome, PaymentVerification, RechargeRequest, UpiPaymentIntent,
    UpiRequestCreate, WalletBalance, WalletTransaction,
};
use shared::{AppError, ErrorCode, Money};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::notifications::wallet_credit_notice;
use crate::security_log;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_text,
    validate_required_text,
};
use crate::wallet::signature::{SIGNATURE_HEADER, verify_signature};
use crate::wallet::{LedgerEntry, PaymentRef, WalletError, build_payment_intent, upi};

const DEFAULT_TRANSACTION_LIMIT: i64 = 50;
const MAX_TRANSACTION_LIMIT: i64 = 200;

/// Smallest UPI recharge (1 rupee)
const MIN_UPI_RECHARGE: Money = Money::from_major(1);

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub limit: Option<i64>,
}

/// Result of a payment callback
#[derive(Debug, Serialize)]
pub struct PaymentResult {
    pub transaction_id: String,
    pub status: PaymentOutcome,
    /// `false` for failed payments and replays of an already credited payment
    pub credited: bool,
    pub balance: Money,
}

async fn user_by_code(state: &ServerState, user_code: &str) -> Result<shared::models::User, AppError> {
    user_repo::find_by_code(state.pool(), user_code)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound).with_detail("user_code", user_code))
}

/// GET /api/wallet/balance
pub async fn balance(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> Result<Json<WalletBalance>, AppError> {
    let balance = state.ledger.balance(current_user.id).await?;
    Ok(Json(WalletBalance { balance }))
}

/// GET /api/wallet/transactions - 钱包流水 (newest first)
pub async fn transactions(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<WalletTransaction>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
        .clamp(1, MAX_TRANSACTION_LIMIT);
    let rows = state.ledger.transactions(current_user.id, limit).await?;
    Ok(Json(rows))
}

/// POST /api/wallet/recharge - 管理员充值
pub async fn recharge(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<RechargeRequest>,
) -> Result<Json<LedgerEntry>, AppError> {
    validate_required_text(&payload.user_code, "user_code", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_amount(payload.amount, None)?;

    let user = user_by_code(&state, &payload.user_code).await?;
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("Admin wallet recharge");

    let entry = state
        .ledger
        .credit(
            user.id,
            payload.amount,
            description,
            Some(PaymentRef::admin_recharge()),
        )
        .await?;

    tracing::info!(
        operator = %current_user.user_code,
        user_code = %user.user_code,
        amount = %payload.amount,
        balance = %entry.balance,
        "Wallet recharged"
    );
    notify_credit(&state, user.id, payload.amount, entry.balance).await;
    Ok(Json(entry))
}

/// POST /api/wallet/upi-request - 生成 UPI 支付链接与二维码
pub async fn upi_request(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<UpiRequestCreate>,
) -> Result<Json<UpiPaymentIntent>, AppError> {
    validate_amount(payload.amount, Some(state.config.max_upi_recharge))?;
    if payload.amount < MIN_UPI_RECHARGE {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            format!("Amount must be at least {MIN_UPI_RECHARGE}"),
        ));
    }

    let transaction_id = upi::transaction_id(&current_user.user_code, shared::util::now_millis());
    let upi_url = build_payment_intent(&state.config.upi, payload.amount, &transaction_id);
    let qr_code = state.qr_encoder.encode_data_url(&upi_url)?;

    tracing::info!(
        user_code = %current_user.user_code,
        amount = %payload.amount,
        transaction_id = %transaction_id,
        "UPI payment intent created"
    );

    Ok(Json(UpiPaymentIntent {
        upi_url,
        qr_code,
        transaction_id,
        amount: payload.amount,
    }))
}

/// POST /api/wallet/verify-payment - 支付回调
///
/// When `PAYMENT_WEBHOOK_SECRET` is set the raw body must carry a valid
/// `x-payment-signature`. A repeated SUCCESS callback for the same
/// transaction id is acknowledged without crediting again.
pub async fn verify_payment(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PaymentResult>, AppError> {
    if let Some(secret) = state.config.payment_webhook_secret.as_deref() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        let now = chrono::Utc::now().timestamp();
        if let Err(e) = verify_signature(&body, header, secret, now) {
            security_log!("WARN", "payment_signature_rejected", reason = e.to_string());
            return Err(AppError::with_message(
                ErrorCode::PaymentSignatureInvalid,
                e.to_string(),
            ));
        }
    }

    let payment: PaymentVerification = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid payment payload: {e}")))?;
    validate_required_text(&payment.transaction_id, "transaction_id", MAX_SHORT_TEXT_LEN)?;
    validate_amount(payment.amount, Some(state.config.max_upi_recharge))?;

    let user = user_by_code(&state, &payment.user_code).await?;

    if payment.status != PaymentOutcome::Success {
        state
            .ledger
            .record_failed_payment(
                user.id,
                payment.amount,
                "Failed UPI wallet recharge",
                PaymentRef::upi(&payment.transaction_id),
            )
            .await?;
        tracing::warn!(
            user_code = %user.user_code,
            transaction_id = %payment.transaction_id,
            status = ?payment.status,
            "UPI payment not successful"
        );
        return Ok(Json(PaymentResult {
            transaction_id: payment.transaction_id,
            status: payment.status,
            credited: false,
            balance: state.ledger.balance(user.id).await?,
        }));
    }

    let credited = match state
        .ledger
        .credit(
            user.id,
            payment.amount,
            "UPI wallet recharge",
            Some(PaymentRef::upi(&payment.transaction_id)),
        )
        .await
    {
        Ok(entry) => {
            tracing::info!(
                user_code = %user.user_code,
                transaction_id = %payment.transaction_id,
                amount = %payment.amount,
                balance = %entry.balance,
                "UPI payment credited"
            );
            notify_credit(&state, user.id, payment.amount, entry.balance).await;
            true
        }
        Err(WalletError::PaymentAlreadyProcessed(txn)) => {
            tracing::info!(transaction_id = %txn, "UPI payment already credited");
            false
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(PaymentResult {
        transaction_id: payment.transaction_id,
        status: PaymentOutcome::Success,
        credited,
        balance: state.ledger.balance(user.id).await?,
    }))
}

/// Best effort: the credit is already committed
async fn notify_credit(state: &ServerState, user_id: i64, amount: Money, balance: Money) {
    let (title, message) = wallet_credit_notice(amount, balance);
    if let Err(e) = state
        .notifier
        .notify(user_id, NotificationKind::Wallet, &title, &message)
        .await
    {
        tracing::warn!(user_id, error = %e, "Failed to store wallet notification");
    }
}
