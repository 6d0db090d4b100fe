/// 页面滚动区域尺寸
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Layout {
    pub viewport_height: f64,
    pub scroll_height: f64,
}

impl Layout {
    pub fn new(viewport_height: f64, scroll_height: f64) -> Self {
        Self {
            viewport_height,
            scroll_height,
        }
    }

    /// 最大滚动距离，不小于 0
    pub fn max_scroll(&self) -> f64 {
        let max = self.scroll_height - self.viewport_height;
        if max.is_finite() { max.max(0.0) } else { 0.0 }
    }

    pub fn clamp_scroll(&self, scroll_top: f64) -> f64 {
        if scroll_top.is_finite() {
            scroll_top.clamp(0.0, self.max_scroll())
        } else {
            0.0
        }
    }
}

/// 滚动进度，范围 [0, 1]
pub fn progress(scroll_top: f64, max_scroll: f64) -> f64 {
    if max_scroll <= 0.0 || !max_scroll.is_finite() || !scroll_top.is_finite() {
        return 0.0;
    }
    (scroll_top / max_scroll).clamp(0.0, 1.0)
}

/// `round(progress * (n - 1))`，`n == 0` 时返回 `None`
pub fn index_for_progress(progress: f64, n: usize) -> Option<usize> {
    match n {
        0 => None,
        1 => Some(0),
        _ => {
            let p = if progress.is_finite() {
                progress.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let index = (p * (n - 1) as f64).round() as usize;
            Some(index.min(n - 1))
        }
    }
}

/// 由轨道位移 `translate_x`（向左为负）计算帧索引，结果限制在 `[0, n - 1]`
pub fn index_for_offset(translate_x: f64, frame_step: f64, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    if frame_step <= 0.0 || !frame_step.is_finite() {
        return Some(0);
    }

    let raw = (-translate_x / frame_step).round();
    if !raw.is_finite() || raw <= 0.0 {
        return Some(0);
    }
    Some((raw as usize).min(n - 1))
}

pub fn offset_for_index(index: usize, frame_step: f64) -> f64 {
    -(index as f64) * frame_step
}

/// 轨道位移对应的滚动进度，用于拖拽时反推页面滚动位置
pub fn progress_for_offset(translate_x: f64, frame_step: f64, n: usize) -> f64 {
    if n < 2 || frame_step <= 0.0 || !frame_step.is_finite() || !translate_x.is_finite() {
        return 0.0;
    }
    (-translate_x / (frame_step * (n - 1) as f64)).clamp(0.0, 1.0)
}

/// 每切换一帧需要的页面滚动距离，帧数不足 2 时没有意义
pub fn scroll_per_slide(max_scroll: f64, n: usize) -> Option<f64> {
    if n < 2 || max_scroll <= 0.0 || !max_scroll.is_finite() {
        return None;
    }
    Some(max_scroll / (n - 1) as f64)
}
