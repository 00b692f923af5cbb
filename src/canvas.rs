use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke, Transform};

pub struct Canvas {
    pub pixmap: Pixmap,
}

pub struct FontState {
    font: fontdue::Font,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(width, height).expect("Failed to create pixmap"),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        self.pixmap.fill(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    }

    pub fn fill_round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: [u8; 4]) {
        let r = radius.min(w / 2.0).min(h / 2.0);
        let mut pb = PathBuilder::new();
        pb.move_to(x + r, y);
        pb.line_to(x + w - r, y);
        pb.quad_to(x + w, y, x + w, y + r);
        pb.line_to(x + w, y + h - r);
        pb.quad_to(x + w, y + h, x + w - r, y + h);
        pb.line_to(x + r, y + h);
        pb.quad_to(x, y + h, x, y + h - r);
        pb.line_to(x, y + r);
        pb.quad_to(x, y, x + r, y);
        pb.close();
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
            paint.anti_alias = true;
            self.pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);
        }
    }

    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: [u8; 4], width: f32) {
        let mut pb = PathBuilder::new();
        pb.move_to(x1, y1);
        pb.line_to(x2, y2);
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
            paint.anti_alias = true;
            let stroke = Stroke { width, ..Stroke::default() };
            self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    pub fn draw_circle(&mut self, cx: f32, cy: f32, r: f32, color: [u8; 4], fill: bool, stroke_width: f32) {
        let mut pb = PathBuilder::new();
        // Approximate circle with 4 cubic bezier curves
        let k = 0.5522847498; // magic constant for cubic bezier circle
        let kr = k * r;
        pb.move_to(cx, cy - r);
        pb.cubic_to(cx + kr, cy - r, cx + r, cy - kr, cx + r, cy);
        pb.cubic_to(cx + r, cy + kr, cx + kr, cy + r, cx, cy + r);
        pb.cubic_to(cx - kr, cy + r, cx - r, cy + kr, cx - r, cy);
        pb.cubic_to(cx - r, cy - kr, cx - kr, cy - r, cx, cy - r);
        pb.close();

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
            paint.anti_alias = true;
            if fill {
                self.pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);
            } else {
                let stroke = Stroke { width: stroke_width, ..Stroke::default() };
                self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    /// Convert RGBA pixels to BGRA (ARGB8888 in little-endian) for wl_shm
    pub fn pixels_argb8888(&self) -> Vec<u8> {
        let data = self.pixmap.data();
        let mut out = vec![0u8; data.len()];
        for i in (0..data.len()).step_by(4) {
            let r = data[i];
            let g = data[i + 1];
            let b = data[i + 2];
            let a = data[i + 3];
            // BGRA order (ARGB8888 little-endian)
            out[i] = b;
            out[i + 1] = g;
            out[i + 2] = r;
            out[i + 3] = a;
        }
        out
    }
}

impl FontState {
    pub fn new(font_name: &str) -> Self {
        // Try loading as a file path first
        if let Ok(data) = std::fs::read(font_name) {
            if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                return Self { font };
            }
        }

        // Search common system font paths for a monospace face. The widget
        // needs CJK coverage for ko/ja labels, but any face with Latin
        // glyphs still renders digits, so plain monospace is acceptable.
        let search_paths = [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/nix/var/nix/profiles/system/sw/share/X11/fonts",
        ];

        for base in &search_paths {
            if let Some(font) = Self::walk_for_font(std::path::Path::new(base)) {
                return Self { font };
            }
        }

        let fallback_fonts = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
            "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
        ];

        for path in &fallback_fonts {
            if let Ok(data) = std::fs::read(path) {
                if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                    log::info!("Using fallback font: {}", path);
                    return Self { font };
                }
            }
        }

        log::warn!("No monospace font found, falling back to any system font");
        Self::with_any_font()
    }

    fn walk_for_font(dir: &std::path::Path) -> Option<fontdue::Font> {
        let entries = std::fs::read_dir(dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Some(f) = Self::walk_for_font(&path) {
                    return Some(f);
                }
            } else if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if (ext == "ttf" || ext == "otf") && path.to_string_lossy().contains("Mono") {
                    if let Ok(data) = std::fs::read(&path) {
                        if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                            log::info!("Found font: {}", path.display());
                            return Some(font);
                        }
                    }
                }
            }
        }
        None
    }

    fn with_any_font() -> Self {
        for base in &["/usr/share/fonts", "/nix/store"] {
            if let Some(font) = Self::walk_for_any_font(std::path::Path::new(base)) {
                return Self { font };
            }
        }
        panic!("No fonts found on system. Please install a TTF font or specify a font path in config.");
    }

    fn walk_for_any_font(dir: &std::path::Path) -> Option<fontdue::Font> {
        let entries = std::fs::read_dir(dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Some(f) = Self::walk_for_any_font(&path) {
                    return Some(f);
                }
            } else if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if ext == "ttf" || ext == "otf" {
                    if let Ok(data) = std::fs::read(&path) {
                        if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                            log::info!("Found fallback font: {}", path.display());
                            return Some(font);
                        }
                    }
                }
            }
        }
        None
    }

    pub fn measure_text(&self, text: &str, size: f32) -> (f32, f32) {
        let mut width = 0.0f32;
        let mut max_height = 0.0f32;
        for ch in text.chars() {
            let metrics = self.font.metrics(ch, size);
            width += metrics.advance_width;
            let h = metrics.height as f32;
            if h > max_height { max_height = h; }
        }
        (width, max_height)
    }

    pub fn draw_text(&self, canvas: &mut Canvas, text: &str, x: f32, y: f32, size: f32, color: [u8; 4]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            if !bitmap.is_empty() && metrics.width > 0 && metrics.height > 0 {
                let gx = cursor_x as i32 + metrics.xmin;
                let gy = y as i32 + size as i32 - metrics.height as i32 - metrics.ymin;
                for row in 0..metrics.height {
                    for col in 0..metrics.width {
                        let coverage = bitmap[row * metrics.width + col];
                        if coverage > 0 {
                            let px = gx + col as i32;
                            let py = gy + row as i32;
                            if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                                let alpha = (coverage as u32 * color[3] as u32) / 255;
                                if alpha > 0 {
                                    blend_pixel(&mut canvas.pixmap, px as u32, py as u32, color, alpha as u8);
                                }
                            }
                        }
                    }
                }
            }
            cursor_x += metrics.advance_width;
        }
    }

    /// Draw text horizontally centred on `cx`.
    pub fn draw_text_centered(&self, canvas: &mut Canvas, text: &str, cx: f32, y: f32, size: f32, color: [u8; 4]) {
        let (tw, _) = self.measure_text(text, size);
        self.draw_text(canvas, text, cx - tw / 2.0, y, size, color);
    }
}

fn blend_pixel(pixmap: &mut Pixmap, x: u32, y: u32, color: [u8; 4], alpha: u8) {
    let w = pixmap.width();
    let idx = ((y * w + x) * 4) as usize;
    let data = pixmap.data_mut();
    if idx + 3 >= data.len() { return; }

    let a = alpha as u32;
    let inv_a = 255 - a;
    data[idx]     = ((color[0] as u32 * a + data[idx] as u32 * inv_a) / 255) as u8;
    data[idx + 1] = ((color[1] as u32 * a + data[idx + 1] as u32 * inv_a) / 255) as u8;
    data[idx + 2] = ((color[2] as u32 * a + data[idx + 2] as u32 * inv_a) / 255) as u8;
    data[idx + 3] = (a + data[idx + 3] as u32 * inv_a / 255).min(255) as u8;
}
