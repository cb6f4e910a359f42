use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::auth::{CredentialGate, Identity, SessionGate, Verdict};
use crate::error::Result;
use crate::tui::{self, ScreenAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

const FIELD_USERNAME: usize = 0;
const FIELD_PASSWORD: usize = 1;

/// Login form in front of the dashboard.
pub struct LoginForm {
    gate: CredentialGate,
    username: String,
    password: String,
    active_field: usize,
    verdict: Verdict,
}

impl LoginForm {
    pub fn new(gate: CredentialGate) -> Self {
        Self {
            gate,
            username: String::new(),
            password: String::new(),
            active_field: FIELD_USERNAME,
            verdict: Verdict::Pending,
        }
    }

    pub fn granted(&self) -> Option<&Identity> {
        match &self.verdict {
            Verdict::Granted(identity) => Some(identity),
            _ => None,
        }
    }

    fn active_value(&mut self) -> &mut String {
        if self.active_field == FIELD_PASSWORD {
            &mut self.password
        } else {
            &mut self.username
        }
    }

    fn submit(&mut self) {
        self.gate.submit(&self.username, &self.password);
        self.password.zeroize();
        self.verdict = self.gate.login();
        self.gate.clear();
        if self.granted().is_none() {
            self.active_field = FIELD_PASSWORD;
        }
    }

    fn draw_field(&self, frame: &mut Frame, area: Rect, label: &str, field_idx: usize) {
        let label_width = 12u16;
        let [label_area, input_area] =
            Layout::horizontal([Constraint::Length(label_width), Constraint::Fill(1)]).areas(area);

        let is_active = self.active_field == field_idx;
        let label_style = if is_active {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{:<width$}", label, width = label_width as usize),
                label_style,
            )),
            label_area,
        );

        let mut display = if field_idx == FIELD_PASSWORD {
            "\u{25cf}".repeat(self.password.chars().count())
        } else {
            self.username.clone()
        };
        if is_active {
            display.push('\u{2588}');
        }
        let padded = format!("{:<width$}", display, width = input_area.width as usize);
        let style = if is_active {
            SELECTED_STYLE
        } else {
            Style::default().fg(Color::DarkGray)
        };
        frame.render_widget(Paragraph::new(Span::styled(padded, style)), input_area);
    }
}

impl tui::Screen for LoginForm {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [_, form_area, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(9),
            Constraint::Fill(1),
        ])
        .areas(area);
        let [_, form_area, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(50),
            Constraint::Fill(1),
        ])
        .areas(form_area);

        let block = Block::default()
            .title(" Login ")
            .title_style(HEADER_STYLE)
            .borders(Borders::ALL)
            .border_style(FOOTER_STYLE);
        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let [user_area, _, pass_area, _, message_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.draw_field(frame, user_area, "Username", FIELD_USERNAME);
        self.draw_field(frame, pass_area, "Password", FIELD_PASSWORD);

        if let Some(msg) = self.verdict.message() {
            let style = match self.verdict {
                Verdict::Denied => ERROR_STYLE,
                _ => Style::default().fg(Color::Yellow),
            };
            frame.render_widget(Paragraph::new(msg).style(style), message_area);
        }
        frame.render_widget(
            Paragraph::new("Tab=switch field  Enter=login  Esc=quit").style(FOOTER_STYLE),
            keys_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ScreenAction {
        match code {
            KeyCode::Esc => return ScreenAction::Close,
            KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
                self.active_field = 1 - self.active_field;
            }
            KeyCode::Enter => {
                if self.active_field == FIELD_USERNAME && self.password.is_empty() {
                    self.active_field = FIELD_PASSWORD;
                } else {
                    self.submit();
                    if self.granted().is_some() {
                        return ScreenAction::Close;
                    }
                }
            }
            KeyCode::Backspace => {
                self.active_value().pop();
            }
            KeyCode::Char(c) => self.active_value().push(c),
            _ => {}
        }
        ScreenAction::Continue
    }
}

impl Drop for LoginForm {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Show the login form until access is granted. `None` means the user quit.
pub fn run(gate: CredentialGate) -> Result<Option<Identity>> {
    let mut form = LoginForm::new(gate);
    tui::run_screen(&mut form)?;
    Ok(form.granted().cloned())
}
