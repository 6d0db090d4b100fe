use std::time::{Duration, Instant};

/// 可取消的截止时间
///
/// 每次 [`Deadline::arm`] 都会覆盖之前的截止时间，不会排队。
/// 时间由调用方传入，便于在测试中推进。
#[derive(Debug, Default, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// 在 `now + delay` 时触发，覆盖已有的截止时间
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.at = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.at
    }

    /// 到期时返回 `true` 并解除，未到期或未设置时返回 `false`
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.at {
            Some(at) if now >= at => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}
