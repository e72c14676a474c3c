//! Time and id helpers

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU16, Ordering};

/// 2025-01-01 00:00:00 UTC
const ID_EPOCH_MS: i64 = 1_735_689_600_000;
const TIMESTAMP_MASK: i64 = 0x1FF_FFFF_FFFF;
const SEQUENCE_MASK: u16 = 0x0FFF;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn sequence() -> &'static AtomicU16 {
    static SEQUENCE: OnceLock<AtomicU16> = OnceLock::new();
    SEQUENCE.get_or_init(|| AtomicU16::new(rand::random::<u16>() & SEQUENCE_MASK))
}

/// 生成资源 ID
///
/// 53 位，JSON 数字安全：高 41 位为自纪元起的毫秒数，低 12 位为进程内
/// 递增序号（随机起点），同一毫秒内最多 4096 个互不相同的 ID。
pub fn snowflake_id() -> i64 {
    let ts = (now_millis() - ID_EPOCH_MS) & TIMESTAMP_MASK;
    let seq = sequence().fetch_add(1, Ordering::Relaxed) & SEQUENCE_MASK;
    (ts << 12) | i64::from(seq)
}
