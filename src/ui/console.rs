//! 终端着色。配色开关来自配置，按值传递，不使用全局状态。

use crossterm::style::{Color, Stylize};

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(text, Color::Red)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(text, Color::Green)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, Color::Yellow)
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(text, Color::Blue)
    }

    pub fn magenta(&self, text: &str) -> String {
        self.paint(text, Color::Magenta)
    }
}
