use std::time::{Duration, Instant};

use super::{
    Deadline, Layout, index_for_offset, index_for_progress, offset_for_index, progress,
    progress_for_offset, scroll_per_slide,
};

/// 轮播配置
#[derive(Debug, Clone, Copy)]
pub struct CarouselConfig {
    /// 帧数量
    pub item_count: usize,
    /// 相邻两帧之间的水平距离（像素）
    pub frame_step: f64,
    /// 最后一次滚动之后多久确定当前帧
    pub settle_delay: Duration,
    /// 松开指针后多久恢复页面滚动同步
    pub drag_grace: Duration,
    /// 挂载后多久聚焦第一帧
    pub intro_delay: Duration,
}

impl CarouselConfig {
    pub fn new(item_count: usize, frame_step: f64) -> Self {
        Self {
            item_count,
            frame_step,
            settle_delay: Duration::from_millis(150),
            drag_grace: Duration::from_millis(120),
            intro_delay: Duration::from_millis(100),
        }
    }
}

/// 控制器发给宿主的指令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// 轮播动画滚动到指定帧
    ScrollCarouselTo { index: usize },
    /// 页面滚动到指定位置
    ScrollWindowTo { top: f64, smooth: bool },
    /// 页面按增量滚动
    ScrollWindowBy { delta: f64, smooth: bool },
    /// 阻止当前输入事件的默认行为
    PreventDefault,
    /// 当前帧发生变化，`None` 表示没有聚焦的帧
    ActiveIndexChanged(Option<usize>),
}

/// 轮播状态
///
/// - [`Phase::Idle`]：刚挂载，没有聚焦的帧
/// - [`Phase::Scrolling`]：滚动中，等待停稳
/// - [`Phase::Settled`]：已停在某一帧
/// - [`Phase::Dragging`]：指针拖拽中，`held` 为拖拽开始前的当前帧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scrolling,
    Settled(usize),
    Dragging { held: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// 页面纵向滚动与横向轮播之间的同步状态机
///
/// 页面上有一个很高的不可见滚动区域，纵向滚动位置映射到轮播位置；
/// 拖拽轮播时则反过来把轮播位置写回页面滚动位置。
///
/// 两个方向的同步互相屏蔽以避免回环：
/// - 拖拽期间忽略页面滚动事件
/// - 非拖拽期间轮播自身的滚动只是回声，不写回页面
///
/// 控制器不持有任何计时器，所有时间由调用方传入，
/// 宿主需要定期调用 [`CarouselController::tick`] 推进截止时间。
#[derive(Debug)]
pub struct CarouselController {
    config: CarouselConfig,
    layout: Layout,
    phase: Phase,
    translate_x: f64,
    scroll_top: f64,
    intro: Deadline,
    grace: Deadline,
    settle: Deadline,
    unmounted: bool,
}

impl CarouselController {
    pub fn new(config: CarouselConfig, layout: Layout) -> Self {
        Self {
            config,
            layout,
            phase: Phase::Idle,
            translate_x: 0.0,
            scroll_top: 0.0,
            intro: Deadline::default(),
            grace: Deadline::default(),
            settle: Deadline::default(),
            unmounted: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 当前聚焦的帧
    ///
    /// 拖拽期间保持拖拽前的值不变。
    pub fn active_index(&self) -> Option<usize> {
        match self.phase {
            Phase::Settled(i) => Some(i),
            Phase::Dragging { held } => held,
            Phase::Idle | Phase::Scrolling => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn item_count(&self) -> usize {
        self.config.item_count
    }

    pub fn translate_x(&self) -> f64 {
        self.translate_x
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// 下一个需要 [`CarouselController::tick`] 的时间点
    pub fn next_deadline(&self) -> Option<Instant> {
        [&self.intro, &self.grace, &self.settle]
            .into_iter()
            .filter_map(|d| d.expires_at())
            .min()
    }

    /// 挂载：稍后自动聚焦第一帧
    pub fn mount(&mut self, now: Instant) {
        if self.unmounted {
            return;
        }
        self.intro.arm(now, self.config.intro_delay);
    }

    /// 卸载：取消所有截止时间，之后的事件全部忽略
    pub fn unmount(&mut self) {
        self.unmounted = true;
        self.intro.cancel();
        self.grace.cancel();
        self.settle.cancel();
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
        self.scroll_top = self.layout.clamp_scroll(self.scroll_top);
    }

    /// 帧数量变化时重新截断位移和当前帧
    pub fn set_item_count(&mut self, n: usize) -> Vec<Command> {
        let before = self.active_index();
        self.config.item_count = n;

        if n == 0 {
            self.settle.cancel();
            self.grace.cancel();
            self.translate_x = 0.0;
            self.phase = Phase::Idle;
        } else {
            self.translate_x = self.clamp_offset(self.translate_x);
            self.phase = match self.phase {
                Phase::Settled(i) => Phase::Settled(i.min(n - 1)),
                Phase::Dragging { held } => Phase::Dragging {
                    held: held.map(|i| i.min(n - 1)),
                },
                phase => phase,
            };
        }

        let after = self.active_index();
        if after != before && !self.unmounted {
            vec![Command::ActiveIndexChanged(after)]
        } else {
            vec![]
        }
    }

    /// 页面纵向滚动
    ///
    /// 拖拽期间忽略；否则把滚动进度映射为目标帧并驱动轮播。
    /// 已停稳且目标帧不变时不会重新进入滚动状态。
    pub fn on_window_scroll(&mut self, scroll_top: f64, now: Instant) -> Vec<Command> {
        if self.unmounted || self.is_dragging() {
            return vec![];
        }

        self.scroll_top = self.layout.clamp_scroll(scroll_top);

        let n = self.config.item_count;
        if n < 2 {
            return vec![];
        }

        let progress = progress(self.scroll_top, self.layout.max_scroll());
        let Some(target) = index_for_progress(progress, n) else {
            return vec![];
        };

        let mut commands = vec![];
        if Some(target) != self.carousel_index() {
            commands.push(Command::ScrollCarouselTo { index: target });
            self.translate_x = offset_for_index(target, self.config.frame_step);
        }

        if self.phase == Phase::Settled(target) {
            return commands;
        }

        self.begin_scrolling(now, &mut commands);
        commands
    }

    /// 轮播自身的滚动，`translate_x` 为轨道位移（向左为负）
    ///
    /// 拖拽期间把轮播进度写回页面；非拖拽期间只记录位置。
    pub fn on_carousel_scroll(&mut self, translate_x: f64, now: Instant) -> Vec<Command> {
        if self.unmounted || self.config.item_count == 0 {
            return vec![];
        }

        self.translate_x = self.clamp_offset(translate_x);

        match self.phase {
            Phase::Dragging { .. } => self.sync_window_to_carousel().into_iter().collect(),
            Phase::Scrolling => {
                self.settle.arm(now, self.config.settle_delay);
                vec![]
            }
            Phase::Idle | Phase::Settled(_) => vec![],
        }
    }

    pub fn on_pointer_down(&mut self, _now: Instant) -> Vec<Command> {
        if self.unmounted || self.config.item_count == 0 {
            return vec![];
        }

        let held = self.active_index();
        self.intro.cancel();
        self.grace.cancel();
        self.settle.cancel();
        self.phase = Phase::Dragging { held };
        vec![]
    }

    /// 松开指针后等待惯性结束，截止时间到达后再恢复页面同步
    pub fn on_pointer_up(&mut self, now: Instant) -> Vec<Command> {
        if self.unmounted || !self.is_dragging() {
            return vec![];
        }
        self.grace.arm(now, self.config.drag_grace);
        vec![]
    }

    /// 横向滚轮转换为页面纵向滚动
    pub fn on_wheel(&mut self, delta_x: f64, delta_y: f64) -> Vec<Command> {
        if self.unmounted || self.config.item_count < 2 {
            return vec![];
        }
        if !delta_x.is_finite() || delta_x.abs() <= delta_y.abs() {
            return vec![];
        }
        vec![
            Command::PreventDefault,
            Command::ScrollWindowBy {
                delta: delta_x,
                smooth: false,
            },
        ]
    }

    pub fn on_arrow_key(&mut self, direction: Direction) -> Vec<Command> {
        if self.unmounted {
            return vec![];
        }
        let Some(step) = scroll_per_slide(self.layout.max_scroll(), self.config.item_count) else {
            return vec![];
        };
        let delta = match direction {
            Direction::Previous => -step,
            Direction::Next => step,
        };
        vec![Command::ScrollWindowBy {
            delta,
            smooth: true,
        }]
    }

    /// 浏览器原生的滚动结束事件，跳过剩余的等待时间
    pub fn on_scroll_end(&mut self, _now: Instant) -> Vec<Command> {
        if self.unmounted || self.phase != Phase::Scrolling || !self.settle.is_armed() {
            return vec![];
        }
        self.settle.cancel();
        self.settle_now()
    }

    /// 推进到 `now`，依次处理到期的开场、拖拽宽限和停稳截止时间
    pub fn tick(&mut self, now: Instant) -> Vec<Command> {
        if self.unmounted {
            return vec![];
        }

        let mut commands = vec![];

        if self.intro.fire(now) && self.phase == Phase::Idle && self.config.item_count > 0 {
            self.phase = Phase::Settled(0);
            commands.push(Command::ActiveIndexChanged(Some(0)));
        }

        if self.grace.fire(now) {
            if let Phase::Dragging { .. } = self.phase {
                commands.extend(self.sync_window_to_carousel());
                self.begin_scrolling(now, &mut commands);
            }
        }

        if self.settle.fire(now) && self.phase == Phase::Scrolling {
            commands.extend(self.settle_now());
        }

        commands
    }

    fn carousel_index(&self) -> Option<usize> {
        index_for_offset(
            self.translate_x,
            self.config.frame_step,
            self.config.item_count,
        )
    }

    fn clamp_offset(&self, translate_x: f64) -> f64 {
        let n = self.config.item_count;
        if n < 2 || !translate_x.is_finite() || self.config.frame_step <= 0.0 {
            return 0.0;
        }
        let min = offset_for_index(n - 1, self.config.frame_step);
        translate_x.clamp(min, 0.0)
    }

    fn sync_window_to_carousel(&mut self) -> Option<Command> {
        if self.config.item_count < 2 {
            return None;
        }
        let progress = progress_for_offset(
            self.translate_x,
            self.config.frame_step,
            self.config.item_count,
        );
        self.scroll_top = progress * self.layout.max_scroll();
        Some(Command::ScrollWindowTo {
            top: self.scroll_top,
            smooth: false,
        })
    }

    fn begin_scrolling(&mut self, now: Instant, commands: &mut Vec<Command>) {
        if self.active_index().is_some() {
            commands.push(Command::ActiveIndexChanged(None));
        }
        self.intro.cancel();
        self.phase = Phase::Scrolling;
        self.settle.arm(now, self.config.settle_delay);
    }

    fn settle_now(&mut self) -> Vec<Command> {
        let before = self.active_index();
        self.phase = match self.carousel_index() {
            Some(i) => Phase::Settled(i),
            None => Phase::Idle,
        };

        let after = self.active_index();
        if after != before {
            vec![Command::ActiveIndexChanged(after)]
        } else {
            vec![]
        }
    }
}
