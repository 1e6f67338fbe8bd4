use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const VALUE_STYLE: Style = Style::new()
    .fg(Color::Rgb(233, 141, 44))
    .add_modifier(Modifier::BOLD);

pub const BORDER_STYLE: Style = Style::new().fg(Color::Rgb(148, 168, 176));

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const BAR_STYLE: Style = Style::new().fg(Color::Rgb(80, 160, 220));

/// Slice colors for pie-style breakdowns, cycled.
pub const SLICE_COLORS: &[Color] = &[
    Color::Rgb(80, 160, 220),
    Color::Rgb(233, 141, 44),
    Color::Rgb(80, 220, 100),
    Color::Rgb(200, 90, 200),
    Color::Rgb(220, 200, 60),
    Color::Red,
];

/// A metric value; placeholders are dimmed rather than highlighted.
pub fn value_span(value: &str, placeholder: bool) -> Span<'static> {
    let style = if placeholder {
        FOOTER_STYLE
    } else {
        VALUE_STYLE
    };
    Span::styled(value.to_string(), style)
}

pub enum ScreenAction {
    Continue,
    Close,
}

pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ScreenAction;
}

/// Run an interactive ratatui screen. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
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
