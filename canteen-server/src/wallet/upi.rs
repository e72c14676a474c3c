//! UPI deep links for wallet recharge

use reqwest::Url;
use shared::Money;

#[derive(Debug, Clone)]
pub struct UpiConfig {
    /// Payee VPA, e.g. `canteen@paytm`
    pub payee_id: String,
    pub payee_name: String,
}

/// `TXN_{user_code}_{millis}`
pub fn transaction_id(user_code: &str, now_millis: i64) -> String {
    format!("TXN_{user_code}_{now_millis}")
}

/// Build the `upi://pay` intent for a recharge of `amount`
pub fn build_payment_intent(config: &UpiConfig, amount: Money, transaction_id: &str) -> String {
    let note = format!("Wallet Recharge - {transaction_id}");
    let amount = amount.to_string();
    let params = [
        ("pa", config.payee_id.as_str()),
        ("pn", config.payee_name.as_str()),
        ("am", amount.as_str()),
        ("cu", "INR"),
        ("tn", note.as_str()),
        ("tr", transaction_id),
    ];

    match Url::parse_with_params("upi://pay", params) {
        Ok(url) => url.into(),
        // "upi://pay" is a constant and always parses
        Err(_) => String::from("upi://pay"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> UpiConfig {
        UpiConfig {
            payee_id: "canteen@paytm".into(),
            payee_name: "Smart Canteen".into(),
        }
    }

    #[test]
    fn test_transaction_id() {
        assert_eq!(transaction_id("STU001", 1_700_000_000_123), "TXN_STU001_1700000000123");
    }

    #[test]
    fn test_intent_fields() {
        let link = build_payment_intent(&config(), Money::from_major(300), "TXN_STU001_1");
        assert!(link.starts_with("upi://pay?"));

        let url = Url::parse(&link).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("pa"), "canteen@paytm");
        assert_eq!(get("pn"), "Smart Canteen");
        assert_eq!(get("am"), "300.00");
        assert_eq!(get("cu"), "INR");
        assert_eq!(get("tn"), "Wallet Recharge - TXN_STU001_1");
        assert_eq!(get("tr"), "TXN_STU001_1");
    }
}
