//! 固定窗口移动平均，抑制逐帧抖动

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Smoother {
    history: VecDeque<f64>,
    window: usize,
}

impl Smoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// 追加一帧原始值，返回当前窗口均值
    pub fn update(&mut self, raw: f64) -> f64 {
        self.history.push_back(raw);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
        self.mean()
    }

    pub fn mean(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
