use crate::layout::{Area, Layout};
use crate::scene::{BACKGROUND, Label, Rgba, Scene, Shape, build_scene};
use crate::text::TextCache;
use ab_glyph::FontVec;
use anyhow::{Result, anyhow};
use rand::{Rng, SeedableRng};
use reflex_games::{ResultsSink, Session};
use reflex_timing::Timer;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Stroke, Transform,
};

pub struct FrameStats {
    pub scene: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub shape_count: usize,
    pub label_count: usize,
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn rect(area: &Area) -> Option<Rect> {
    Rect::from_xywh(area.x, area.y, area.width, area.height)
}

/// Draws a session into an RGBA frame buffer
pub struct SkiaRenderer {
    layout: Layout,
    canvas: Pixmap,
    text: TextCache,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("cannot create {width}x{height} canvas"))?;
        Ok(Self {
            layout: Layout::new(width, height),
            canvas,
            text: TextCache::new(font),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width.max(1), new_height.max(1))
            .ok_or_else(|| anyhow!("cannot resize canvas to {new_width}x{new_height}"))?;
        self.layout = Layout::new(new_width, new_height);
        Ok(())
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The last frame drawn, before it was copied out
    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn render_frame<T, R, S, C>(
        &mut self,
        session: &Session<T, R, S>,
        frame_buffer: &mut [u8],
        timer: &mut C,
    ) -> Result<FrameStats>
    where
        T: Timer,
        R: Rng + SeedableRng,
        S: ResultsSink,
        C: Timer,
    {
        let expected = self.canvas.data().len();
        if frame_buffer.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, canvas needs {}",
                frame_buffer.len(),
                expected
            ));
        }

        let t = timer.now();
        let scene = build_scene(session, &self.layout);
        let t_scene = timer.elapsed(t);

        let t = timer.now();
        self.draw_scene(&scene);
        let t_draw = timer.elapsed(t);

        let t = timer.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let t_copy = timer.elapsed(t);

        let total = t_scene + t_draw + t_copy;
        timer.record_frame(total);

        Ok(FrameStats {
            scene: t_scene,
            draw: t_draw,
            copy: t_copy,
            total,
            shape_count: scene.shapes.len(),
            label_count: scene.labels.len(),
        })
    }

    pub fn draw_scene(&mut self, scene: &Scene) {
        self.canvas.fill(Color::from_rgba8(
            BACKGROUND[0],
            BACKGROUND[1],
            BACKGROUND[2],
            BACKGROUND[3],
        ));
        for shape in &scene.shapes {
            self.draw_shape(shape);
        }
        for label in &scene.labels {
            self.draw_label(label);
        }
    }

    fn draw_shape(&mut self, shape: &Shape) {
        match shape {
            Shape::Rect { area, color } => {
                if let Some(r) = rect(area) {
                    self.canvas
                        .fill_rect(r, &paint(*color), Transform::identity(), None);
                }
            }
            Shape::Outline { area, color, width } => {
                if let Some(path) = rect(area).map(PathBuilder::from_rect) {
                    let stroke = Stroke {
                        width: *width,
                        ..Default::default()
                    };
                    self.canvas.stroke_path(
                        &path,
                        &paint(*color),
                        &stroke,
                        Transform::identity(),
                        None,
                    );
                }
            }
            Shape::Circle {
                center,
                radius,
                color,
            } => {
                if let Some(path) = PathBuilder::from_circle(center.0, center.1, *radius) {
                    self.canvas.fill_path(
                        &path,
                        &paint(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            Shape::Cross {
                center,
                size,
                color,
            } => {
                let h = size / 2.0;
                let mut pb = PathBuilder::new();
                pb.move_to(center.0 - h, center.1 - h);
                pb.line_to(center.0 + h, center.1 + h);
                pb.move_to(center.0 + h, center.1 - h);
                pb.line_to(center.0 - h, center.1 + h);
                if let Some(path) = pb.finish() {
                    let stroke = Stroke {
                        width: 3.0,
                        ..Default::default()
                    };
                    self.canvas.stroke_path(
                        &path,
                        &paint(*color),
                        &stroke,
                        Transform::identity(),
                        None,
                    );
                }
            }
        }
    }

    fn draw_label(&mut self, label: &Label) {
        let Some(pm) = self.text.get_or_render(&label.text, label.size, label.color) else {
            return;
        };
        let (w, h) = (pm.width() as i32, pm.height() as i32);
        let (cw, ch) = (self.canvas.width() as i32, self.canvas.height() as i32);

        let x = (label.pos.0 - w as f32 * 0.5) as i32;
        let y = (label.pos.1 - h as f32 * 0.5) as i32;

        // Cull fully off-screen
        if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
            return;
        }

        // Clipping
        let dst_x = x.max(0);
        let dst_y = y.max(0);
        let src_x = dst_x - x;
        let src_y = dst_y - y;
        let copy_w = (w - src_x).min(cw - dst_x) as usize;
        let copy_h = (h - src_y).min(ch - dst_y) as usize;

        let src = pm.pixels();
        let src_stride = w as usize;
        let dst_stride = cw as usize;
        let dst = self.canvas.pixels_mut();

        for row in 0..copy_h {
            let s_row = (src_y as usize + row) * src_stride + src_x as usize;
            let d_row = (dst_y as usize + row) * dst_stride + dst_x as usize;
            for i in 0..copy_w {
                let s = src[s_row + i];
                let sa = s.alpha() as u32;
                if sa == 0 {
                    continue;
                }
                if sa == 255 {
                    dst[d_row + i] = s;
                    continue;
                }
                // Premultiplied "over": out = src + dst * (1 - src.a)
                let d = dst[d_row + i];
                let inv = 255 - sa;
                let mix = |sc: u8, dc: u8| (sc as u32 + (dc as u32 * inv + 127) / 255).min(255) as u8;
                let a = mix(s.alpha(), d.alpha());
                let px = PremultipliedColorU8::from_rgba(
                    mix(s.red(), d.red()).min(a),
                    mix(s.green(), d.green()).min(a),
                    mix(s.blue(), d.blue()).min(a),
                    a,
                );
                if let Some(px) = px {
                    dst[d_row + i] = px;
                }
            }
        }
    }
}
