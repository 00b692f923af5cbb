use crate::canvas::{Canvas, FontState};
use crate::renderer::{Frame, Layout};
use crate::state::Highlight;

/// Top panel: headline, time digits with meridiem and millisecond counter,
/// long-form date, and the timezone label.
pub fn render(canvas: &mut Canvas, frame: &Frame, font: &FontState, layout: &Layout) {
    let theme = &frame.config.theme;
    let fs = frame.config.clock.font_size.max(16.0);
    let w = layout.width;
    let cx = w / 2.0;

    let city_name = frame.city.name(frame.language);

    let label_s = fs * 0.38;
    let date_s = fs * 0.34;
    let tz_s = fs * 0.30;

    let mut y = layout.pad;

    // Headline: "{city} local time"
    let headline = frame.language.selected_label(city_name);
    font.draw_text_centered(canvas, &headline, cx, y, label_s, theme.accent_color);
    y += fs * 0.5;

    // Digits row, flanked by the meridiem marker and the ms counter.
    let digit_color = match frame.highlight {
        Highlight::Minute => theme.minute_flash_color,
        Highlight::Second => theme.second_flash_color,
        Highlight::None => theme.fg_color,
    };
    let digits = frame.time.digits();
    let (dw, _) = font.measure_text(&digits, fs);
    let digits_x = cx - dw / 2.0;
    let side_s = fs * 0.38;
    let side_y = y + fs - side_s;

    let meridiem = frame.language.meridiem(frame.time.is_pm);
    let (mw, _) = font.measure_text(meridiem, side_s);
    font.draw_text(canvas, meridiem, digits_x - mw - fs * 0.25, side_y, side_s, theme.accent_color);

    font.draw_text(canvas, &digits, digits_x, y, fs, digit_color);

    if frame.config.clock.show_millis {
        let ms = format!(".{:03}", frame.millis);
        font.draw_text(canvas, &ms, digits_x + dw + fs * 0.1, side_y, side_s, theme.accent_color);
    }
    y += fs * 1.3;

    // Long-form localized date.
    if frame.config.clock.show_date {
        font.draw_text_centered(canvas, &frame.time.date_string, cx, y, date_s, theme.fg_color);
    }
    y += fs * 0.5;

    // "{city} · {zone} (GMT±HH:MM)"
    let dimmed = [theme.fg_color[0], theme.fg_color[1], theme.fg_color[2], 0xAA];
    let tz_line = frame
        .language
        .timezone_label(city_name, frame.city.tz.name(), frame.offset_label);
    font.draw_text_centered(canvas, &tz_line, cx, y, tz_s, dimmed);
}
