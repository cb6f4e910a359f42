use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);

pub const REVENUE_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Fallback when the configured accent is not a `#RRGGBB` value.
pub const DEFAULT_ACCENT: Color = Color::Rgb(0x2E, 0x86, 0xC1);

/// Bar colors for products, assigned in first-seen order.
pub const PRODUCT_PALETTE: &[Color] = &[
    Color::Rgb(0x2E, 0x86, 0xC1),
    Color::Rgb(0x28, 0xB4, 0x63),
    Color::Rgb(0xF3, 0x9C, 0x12),
    Color::Rgb(0xCB, 0x43, 0x35),
    Color::Rgb(0x8E, 0x44, 0xAD),
    Color::Rgb(0x17, 0xA5, 0x89),
    Color::Rgb(0xD3, 0x54, 0x00),
];

/// Format a revenue amount as a green Span.
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 { ERROR_STYLE } else { REVENUE_STYLE };
    Span::styled(money(amount), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

pub fn accent_color(value: &str) -> Color {
    parse_hex_color(value).unwrap_or(DEFAULT_ACCENT)
}

pub fn product_color(index: usize) -> Color {
    PRODUCT_PALETTE[index % PRODUCT_PALETTE.len()]
}

// ---------------------------------------------------------------------------
// Screen infrastructure
// ---------------------------------------------------------------------------

pub enum ScreenAction {
    Continue,
    Close,
}

pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ScreenAction;
}

/// Run an interactive screen until it asks to close. Sets up the terminal,
/// event loop and panic hook, then restores the terminal on exit.
pub fn run_screen(screen: &mut dyn Screen) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| screen.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match screen.handle_key(key.code) {
                    ScreenAction::Close => break Ok(()),
                    ScreenAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#2E86C1"), Some(Color::Rgb(0x2E, 0x86, 0xC1)));
        assert_eq!(parse_hex_color("ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#zz0000"), None);
        assert_eq!(accent_color("blue"), DEFAULT_ACCENT);
    }

    #[test]
    fn test_product_color_wraps() {
        assert_eq!(product_color(0), product_color(PRODUCT_PALETTE.len()));
    }

    #[test]
    fn test_wrap_text() {
        let (wrapped, lines) = wrap_text("one two three four", 9);
        assert_eq!(lines, 3);
        assert_eq!(wrapped, "one two\nthree\nfour");
        assert_eq!(wrap_text("anything", 0).1, 1);
    }
}
