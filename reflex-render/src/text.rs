use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use string_cache::DefaultAtom as Atom;
use tiny_skia::{Pixmap, PremultipliedColorU8};
use tracing::{debug, warn};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "assets/DejaVuSans.ttf",
];

/// Loads the given font, or the first system font found
pub fn load_font(path: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![p.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };
    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!("Loaded font {}", candidate.display());
                return Some(font);
            }
            Err(e) => warn!("Ignoring font {}: {}", candidate.display(), e),
        }
    }
    warn!("No usable font found; text will not be drawn");
    None
}

/// Rasterises `text` into a tight, premultiplied pixmap
pub fn render_text_pixmap<F: Font>(text: &str, size: f32, font: &F, color: [u8; 4]) -> Option<Pixmap> {
    let scale = PxScale::from(size);
    let sf = font.as_scaled(scale);

    // 1) Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    // 2) Union pixel bounds from outlined glyphs
    let outlined: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlined.is_empty() {
        return None;
    }
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for out in &outlined {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    // 3) Rasterise with premultiplied "over" blending
    for out in &outlined {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x.floor()).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y.floor()).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let inv = 1.0 - a;
            let bg = dst[i];
            let blend = |c: u8, d: u8| ((c as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            let out_a = ((a * 255.0) as u8).saturating_add((bg.alpha() as f32 * inv) as u8);
            let (r, g, bl) = (
                blend(color[0], bg.red()).min(out_a),
                blend(color[1], bg.green()).min(out_a),
                blend(color[2], bg.blue()).min(out_a),
            );
            if let Some(px) = PremultipliedColorU8::from_rgba(r, g, bl, out_a) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

#[derive(Hash, Eq, PartialEq, Clone)]
struct TextKey {
    text: Atom,
    size_bits: u32,
    color: [u8; 4],
}

/// Rasterised strings, keyed by interned text, size and colour
pub struct TextCache {
    font: Option<FontVec>,
    map: HashMap<TextKey, Arc<Pixmap>>,
    max_entries: usize,
}

impl TextCache {
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            map: HashMap::with_capacity(256),
            max_entries: 1024,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get_or_render(&mut self, text: &str, size: f32, color: [u8; 4]) -> Option<Arc<Pixmap>> {
        let font = self.font.as_ref()?;
        let key = TextKey {
            text: Atom::from(text),
            size_bits: size.to_bits(),
            color,
        };
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(text, size, font, color)?);
        // counters produce a new string most frames; start over rather than grow forever
        if self.map.len() >= self.max_entries {
            self.map.clear();
        }
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_without_font_renders_nothing() {
        let mut cache = TextCache::new(None);
        assert!(!cache.has_font());
        assert!(cache.get_or_render("Hits: 3", 18.0, [255, 255, 255, 255]).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_font_file_is_none() {
        assert!(load_font(Some(Path::new("/nonexistent/font.ttf"))).is_none());
    }

    #[test]
    fn system_font_renders_and_caches_when_present() {
        let Some(font) = load_font(None) else {
            return;
        };
        let mut cache = TextCache::new(Some(font));
        let a = cache.get_or_render("CLICK!", 32.0, [255, 255, 255, 255]).unwrap();
        let b = cache.get_or_render("CLICK!", 32.0, [255, 255, 255, 255]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.width() > 10 && a.height() > 10);
        assert!(a.pixels().iter().any(|p| p.alpha() > 0));

        cache.get_or_render("CLICK!", 16.0, [255, 255, 255, 255]).unwrap();
        assert_eq!(cache.len(), 2);
    }
}
