use crate::canvas::{Canvas, FontState};
use crate::renderer::{Frame, Layout};

/// Bottom panel: decorative map with day/night city markers, the rotating
/// terminator line, the localized hint, and the language toggle.
pub fn render(canvas: &mut Canvas, frame: &Frame, font: &FontState, layout: &Layout) {
    let theme = &frame.config.theme;
    let fs = frame.config.clock.font_size.max(16.0);
    let inset = layout.pad * 0.5;

    let map_x = inset;
    let map_y = layout.map_top + inset;
    let map_w = layout.width - inset * 2.0;
    let map_h = (layout.map_h - inset * 2.0).max(0.0);
    canvas.fill_round_rect(map_x, map_y, map_w, map_h, fs * 0.3, theme.map_color);

    draw_graticule(canvas, frame, map_x, map_y, map_w, map_h);
    draw_terminator(canvas, frame, map_x, map_y, map_w, map_h);

    // City markers. Night markers are dimmed, the active city gets a ring.
    for (i, marker) in layout.markers.iter().enumerate() {
        let night = frame.night.get(i).copied().unwrap_or(false);
        let fill = if night { theme.marker_night_color } else { theme.marker_day_color };
        canvas.draw_circle(marker.cx, marker.cy, marker.r, fill, true, 0.0);

        let abbr_color = if night { [0xC8, 0xD2, 0xE8, 0xFF] } else { [0x20, 0x20, 0x20, 0xFF] };
        let abbr_s = marker.r * 0.62;
        font.draw_text_centered(canvas, marker.city.abbr, marker.cx, marker.cy - abbr_s * 0.55, abbr_s, abbr_color);

        if marker.city.id == frame.city.id {
            canvas.draw_circle(marker.cx, marker.cy, marker.r + 3.0, theme.accent_color, false, 2.0);
        }
    }

    // Hint row: localized hint on the left, toggle button on the right.
    let hint_s = fs * 0.28;
    let dimmed = [theme.fg_color[0], theme.fg_color[1], theme.fg_color[2], 0xAA];
    font.draw_text(
        canvas,
        frame.language.map_hint(),
        layout.pad,
        layout.hint_top + (layout.height - layout.hint_top - hint_s) / 2.0,
        hint_s,
        dimmed,
    );

    let (tx, ty, tw, th) = layout.toggle;
    let button_bg = [theme.accent_color[0], theme.accent_color[1], theme.accent_color[2], 0x33];
    canvas.fill_round_rect(tx, ty, tw, th, th / 2.0, button_bg);
    font.draw_text_centered(
        canvas,
        frame.language.label(),
        tx + tw / 2.0,
        ty + (th - hint_s) / 2.0,
        hint_s,
        theme.accent_color,
    );
}

/// Faint latitude/longitude grid, purely decorative.
fn draw_graticule(canvas: &mut Canvas, frame: &Frame, x: f32, y: f32, w: f32, h: f32) {
    let theme = &frame.config.theme;
    let line = [theme.fg_color[0], theme.fg_color[1], theme.fg_color[2], 0x14];
    for i in 1..4 {
        let gy = y + h * i as f32 / 4.0;
        canvas.draw_line(x, gy, x + w, gy, line, 1.0);
    }
    for i in 1..8 {
        let gx = x + w * i as f32 / 8.0;
        canvas.draw_line(gx, y, gx, y + h, line, 1.0);
    }
}

/// Day/night terminator: a line through the panel centre rotated by
/// (UTC minutes / 1440) × 360° − 90°.
fn draw_terminator(canvas: &mut Canvas, frame: &Frame, x: f32, y: f32, w: f32, h: f32) {
    let rad = terminator_rotation_deg(frame.utc_minutes).to_radians();
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let half = (w * w + h * h).sqrt() / 2.0;
    let (dx, dy) = (rad.cos() * half, rad.sin() * half);
    canvas.draw_line(cx - dx, cy - dy, cx + dx, cy + dy, frame.config.theme.terminator_color, 2.0);
}

fn terminator_rotation_deg(utc_minutes: u32) -> f32 {
    utc_minutes as f32 / 1440.0 * 360.0 - 90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_tracks_utc_time() {
        // Midnight UTC points the line straight up, noon straight down,
        // and the rotation advances 0.25° per minute.
        assert_eq!(terminator_rotation_deg(0), -90.0);
        assert_eq!(terminator_rotation_deg(720), 90.0);
        assert_eq!(terminator_rotation_deg(360), 0.0);
        let per_minute = terminator_rotation_deg(1) - terminator_rotation_deg(0);
        assert!((per_minute - 0.25).abs() < 1e-5);
    }

    // The map panel primitives must actually touch the pixmap; text is
    // exercised separately since glyph rendering needs a system font.
    #[test]
    fn panel_primitives_write_pixels() {
        let mut canvas = Canvas::new(100, 100);
        canvas.clear([0, 0, 0, 0xFF]);
        canvas.fill_round_rect(10.0, 10.0, 80.0, 60.0, 8.0, [0x1B, 0x24, 0x40, 0xFF]);
        canvas.draw_circle(50.0, 40.0, 6.0, [0xFF, 0xC9, 0x4D, 0xFF], true, 0.0);
        canvas.draw_line(10.0, 40.0, 90.0, 40.0, [0x8A, 0x9C, 0xC9, 0x66], 2.0);

        let data = canvas.pixmap.data();
        let corner = &data[0..4];
        assert!(data.chunks_exact(4).any(|px| px != corner));
    }
}
