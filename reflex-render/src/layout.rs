/// Axis-aligned screen rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Area {
    pub fn contains(&self, p: (f32, f32)) -> bool {
        p.0 >= self.x && p.0 < self.x + self.width && p.1 >= self.y && p.1 < self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Window position relative to this area's top-left corner, if inside
    pub fn to_local(&self, p: (f32, f32)) -> Option<(f32, f32)> {
        self.contains(p).then(|| (p.0 - self.x, p.1 - self.y))
    }

    /// Area-local position back to window coordinates
    pub fn to_window(&self, p: (f32, f32)) -> (f32, f32) {
        (p.0 + self.x, p.1 + self.y)
    }
}

/// Where things go on a window of a given size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
}

impl Layout {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The test area: aim arena, click box and reaction box all share it
    pub fn arena(&self) -> Area {
        let (w, h) = (self.width as f32, self.height as f32);
        let width = (w - 80.0).clamp(100.0, 800.0);
        let height = (h - 240.0).clamp(100.0, 500.0);
        Area {
            x: ((w - width) / 2.0).floor(),
            y: ((h - height) / 2.0 + 20.0).floor(),
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    pub fn title_pos(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, (self.arena().y - 80.0).max(30.0))
    }

    pub fn stats_pos(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, (self.arena().y - 30.0).max(60.0))
    }

    pub fn prompt_pos(&self) -> (f32, f32) {
        let below = self.arena().bottom() + 40.0;
        (self.width as f32 / 2.0, below.min(self.height as f32 - 20.0))
    }

    /// Maps a window click into the test area
    pub fn to_arena(&self, p: (f32, f32)) -> Option<(f32, f32)> {
        self.arena().to_local(p)
    }
}
