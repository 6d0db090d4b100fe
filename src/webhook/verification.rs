use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// 一次性握手时收到的验证令牌
#[derive(Debug, Clone)]
pub struct StoredToken {
    pub token: String,
    pub received_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.received_at).num_seconds().max(0)
    }
}

/// 验证令牌存储
///
/// 进程内共享，每次收到新令牌时覆盖，供运维人员取回后填入 webhook 配置。
#[derive(Debug, Clone, Default)]
pub struct VerificationStore {
    inner: Arc<Mutex<Option<StoredToken>>>,
}

impl VerificationStore {
    pub fn store(&self, token: impl Into<String>) -> StoredToken {
        let stored = StoredToken {
            token: token.into(),
            received_at: Utc::now(),
        };
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(stored.clone());
        stored
    }

    pub fn latest(&self) -> Option<StoredToken> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
