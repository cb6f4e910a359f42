use std::path::PathBuf;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset as ChartDataset,
        GraphType, Paragraph, Row, Table, Tabs,
    },
    Frame,
};

use super::grid::{DataGrid, GridAction};
use super::{credentials_path, login, seed_fn, session_options};
use crate::auth::{load_credentials, CredentialGate, OpenGate};
use crate::editor::EditSurface;
use crate::error::Result;
use crate::export::{export_csv, write_export};
use crate::filter::StatusFilter;
use crate::fmt::{money, number, percent, rating};
use crate::fragment::{html_to_text, load_fragment};
use crate::models::{Dataset, Status};
use crate::session::{Command, DashboardFrame, Session, Tab};
use crate::settings::{load_settings, Settings};
use crate::tui::{
    self, accent_color, money_span, product_color, ScreenAction, ERROR_STYLE, FOOTER_STYLE,
    HEADER_STYLE, SELECTED_STYLE,
};

const TITLE: &str = "Executive Sales Overview";

/// Accent colors offered by the sidebar picker.
const ACCENT_PRESETS: &[&str] = &["#2E86C1", "#28B463", "#CB4335", "#F39C12", "#8E44AD"];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Focus {
    Sidebar,
    Main,
}

#[derive(Clone, PartialEq, Debug)]
enum SidebarItem {
    Region(String),
    Product(String),
    Status,
    ShowEditor,
    Accent,
}

impl SidebarItem {
    fn section(&self) -> &'static str {
        match self {
            Self::Region(_) => "Region",
            Self::Product(_) => "Product",
            Self::Status => "Order Status",
            Self::ShowEditor | Self::Accent => "Display",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DashboardExit {
    Quit,
    Logout,
}

pub struct Dashboard {
    session: Session,
    frame: DashboardFrame,
    title: String,
    fragment: std::result::Result<String, String>,
    tab: Tab,
    focus: Focus,
    sidebar_selection: usize,
    validated: DataGrid,
    plain: DataGrid,
    export_path: PathBuf,
    allow_logout: bool,
    exit: Option<DashboardExit>,
    /// Exit requested while a grid held unsaved edits; the same key again confirms it.
    pending_exit: Option<DashboardExit>,
    status_message: Option<String>,
}

impl Dashboard {
    pub fn new(mut session: Session, settings: &Settings) -> Result<Self> {
        let frame = session.run_pass()?;
        let canonical = session.canonical()?;
        let validated = DataGrid::new(EditSurface::Validated, canonical)?;
        let plain = DataGrid::new(EditSurface::Plain, canonical)?;

        let mvp = session.product_filter_enabled();
        let title = if mvp {
            format!("{TITLE} (MVP)")
        } else {
            TITLE.to_string()
        };
        let fragment = load_fragment(&settings.fragment_path())
            .and_then(|html| html_to_text(&html))
            .map_err(|e| e.to_string());
        if let Err(e) = &fragment {
            log::warn!("{e}");
        }

        Ok(Self {
            session,
            frame,
            title,
            fragment,
            tab: Tab::VisualAnalytics,
            focus: Focus::Sidebar,
            sidebar_selection: 0,
            validated,
            plain,
            export_path: settings.export_path(),
            allow_logout: !mvp,
            exit: None,
            pending_exit: None,
            status_message: None,
        })
    }

    fn sidebar_items(&self) -> Vec<SidebarItem> {
        let canonical = self.session.canonical().ok();
        let mut items: Vec<SidebarItem> = canonical
            .map(Dataset::distinct_regions)
            .unwrap_or_default()
            .into_iter()
            .map(SidebarItem::Region)
            .collect();
        if self.session.product_filter_enabled() {
            items.extend(
                canonical
                    .map(Dataset::distinct_products)
                    .unwrap_or_default()
                    .into_iter()
                    .map(SidebarItem::Product),
            );
        }
        items.extend([SidebarItem::Status, SidebarItem::ShowEditor, SidebarItem::Accent]);
        items
    }

    fn activate(&mut self, item: SidebarItem) {
        let cmd = match item {
            SidebarItem::Region(r) => Command::ToggleRegion(r),
            SidebarItem::Product(p) => Command::ToggleProduct(p),
            SidebarItem::Status => {
                let choices = StatusFilter::CHOICES;
                let next = choices
                    .iter()
                    .position(|c| *c == self.session.selection().status)
                    .map(|i| (i + 1) % choices.len())
                    .unwrap_or(0);
                Command::SetStatus(choices[next])
            }
            SidebarItem::ShowEditor => Command::ToggleEditor,
            SidebarItem::Accent => {
                let current = &self.session.display().accent_color;
                let next = ACCENT_PRESETS
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(current))
                    .map(|i| (i + 1) % ACCENT_PRESETS.len())
                    .unwrap_or(0);
                Command::SetAccent(ACCENT_PRESETS[next].to_string())
            }
        };
        self.apply(cmd);
    }

    fn apply(&mut self, cmd: Command) {
        match self.session.dispatch(cmd) {
            Ok(Some(frame)) => self.show(frame),
            Ok(None) => {}
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    fn show(&mut self, frame: DashboardFrame) {
        self.frame = frame;
        if !self.frame.tabs.contains(&self.tab) {
            self.tab = Tab::VisualAnalytics;
        }
    }

    /// Replace the canonical dataset with a grid's working copy. The other
    /// grid follows the new data unless it holds unsaved edits of its own;
    /// whichever grid saves last wins.
    fn submit(&mut self, surface: EditSurface, snapshot: Dataset) {
        match self.session.dispatch(Command::SubmitEdit { surface, snapshot }) {
            Ok(Some(frame)) => {
                self.show(frame);
                self.status_message = Some(format!(
                    "{} saved: {} transactions",
                    surface.title(),
                    self.session.canonical().map(Dataset::len).unwrap_or(0)
                ));
            }
            Ok(None) => self.status_message = Some("No changes to save".to_string()),
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        }
        if let Ok(canonical) = self.session.canonical() {
            for grid in [&mut self.validated, &mut self.plain] {
                if grid.surface() == surface || !grid.is_dirty() {
                    grid.reset(canonical);
                }
            }
        }
    }

    fn revert(&mut self, surface: EditSurface) {
        if let Ok(canonical) = self.session.canonical() {
            let grid = match surface {
                EditSurface::Validated => &mut self.validated,
                EditSurface::Plain => &mut self.plain,
            };
            grid.reset(canonical);
            grid.set_status("Local edits discarded".to_string());
        }
    }

    fn export(&mut self) {
        let result = export_csv(&self.frame.view).and_then(|bytes| write_export(&bytes, &self.export_path));
        self.status_message = Some(match result {
            Ok(path) => format!("Exported {} rows to {}", self.frame.view.len(), path.display()),
            Err(e) => format!("Export failed: {e}"),
        });
    }

    fn request_exit(
        &mut self,
        exit: DashboardExit,
        pending: Option<DashboardExit>,
    ) -> ScreenAction {
        let dirty = self.validated.is_dirty() || self.plain.is_dirty();
        if dirty && pending != Some(exit) {
            let (key, verb) = match exit {
                DashboardExit::Quit => ("q", "quit"),
                DashboardExit::Logout => ("L", "log out"),
            };
            self.pending_exit = Some(exit);
            self.status_message =
                Some(format!("Unsaved grid edits will be lost. Press {key} again to {verb}"));
            return ScreenAction::Continue;
        }
        self.exit = Some(exit);
        ScreenAction::Close
    }

    fn caption_line(&self) -> String {
        match self.frame.revision {
            0 => format!(" {}", self.frame.caption()),
            1 => format!(" {} 1 saved edit this session.", self.frame.caption()),
            n => format!(" {} {n} saved edits this session.", self.frame.caption()),
        }
    }

    fn active_grid(&mut self) -> Option<&mut DataGrid> {
        match self.tab {
            Tab::DataEditor => Some(&mut self.validated),
            Tab::NewTable => Some(&mut self.plain),
            _ => None,
        }
    }

    fn step_tab(&mut self, forward: bool) {
        let tabs = &self.frame.tabs;
        let pos = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        let next = if forward {
            (pos + 1) % tabs.len()
        } else {
            (pos + tabs.len() - 1) % tabs.len()
        };
        self.tab = tabs[next];
    }

    fn handle_sidebar_key(&mut self, code: KeyCode) {
        let items = self.sidebar_items();
        match code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.sidebar_selection + 1 < items.len() {
                    self.sidebar_selection += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.sidebar_selection = self.sidebar_selection.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(item) = items.get(self.sidebar_selection).cloned() {
                    self.activate(item);
                }
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn accent(&self) -> Color {
        accent_color(&self.session.display().accent_color)
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let name = &self.session.identity().name;
        let mut spans = vec![Span::styled(format!(" {}", self.title), HEADER_STYLE)];
        if !name.is_empty() {
            spans.push(Span::styled(format!("   Welcome, {name}"), FOOTER_STYLE));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_kpis(&self, frame: &mut Frame, area: Rect) {
        let k = &self.frame.kpis;
        let cards = [
            ("Total Revenue", money(k.total_revenue)),
            ("Units Sold", number(k.total_units)),
            ("Avg Customer Rating", rating(k.avg_rating)),
            ("Completion Rate", percent(k.completion_rate_pct)),
        ];
        let areas = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
        let border = Style::default().fg(self.accent());
        for ((label, value), card) in cards.iter().zip(areas.iter()) {
            let block = Block::default().borders(Borders::ALL).border_style(border);
            let lines = vec![
                Line::styled(format!(" {label}"), FOOTER_STYLE),
                Line::styled(format!(" {value}"), Style::default().add_modifier(Modifier::BOLD)),
            ];
            frame.render_widget(Paragraph::new(lines).block(block), *card);
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let border = if self.focus == Focus::Sidebar {
            Style::default().fg(self.accent())
        } else {
            FOOTER_STYLE
        };
        let block = Block::default()
            .title(" Filters ")
            .borders(Borders::ALL)
            .border_style(border);

        let selection = self.session.selection();
        let display = self.session.display();
        let mut lines: Vec<Line> = Vec::new();
        let mut section = "";
        for (i, item) in self.sidebar_items().iter().enumerate() {
            if item.section() != section {
                section = item.section();
                if !lines.is_empty() {
                    lines.push(Line::from(""));
                }
                lines.push(Line::styled(
                    section,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            }
            let check = |on: bool| if on { "[x]" } else { "[ ]" };
            let mut spans = match item {
                SidebarItem::Region(r) => vec![Span::raw(format!(" {} {r}", check(selection.region_selected(r))))],
                SidebarItem::Product(p) => vec![Span::raw(format!(" {} {p}", check(selection.product_selected(p))))],
                SidebarItem::Status => vec![Span::raw(format!(" \u{25c0} {} \u{25b6}", selection.status))],
                SidebarItem::ShowEditor => vec![Span::raw(format!(" {} Show editor", check(display.show_editor)))],
                SidebarItem::Accent => vec![
                    Span::raw(" Accent "),
                    Span::styled("\u{25a0}", Style::default().fg(self.accent())),
                    Span::raw(format!(" {}", display.accent_color)),
                ],
            };
            if self.focus == Focus::Sidebar && i == self.sidebar_selection {
                spans = spans.into_iter().map(|s| s.patch_style(SELECTED_STYLE)).collect();
            }
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<&str> = self.frame.tabs.iter().map(|t| t.title()).collect();
        let selected = self.frame.tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .style(FOOTER_STYLE)
            .highlight_style(
                Style::default()
                    .fg(self.accent())
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_empty(&self, frame: &mut Frame, area: Rect, title: &str) {
        let block = Block::default()
            .title(title.to_string())
            .title_style(Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(
            Paragraph::new("No transactions match the current filters.")
                .style(FOOTER_STYLE)
                .block(block),
            area,
        );
    }

    fn draw_analytics(&self, frame: &mut Frame, area: Rect) {
        let [line_area, bar_area] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        self.draw_revenue_line(frame, line_area);
        self.draw_region_bars(frame, bar_area);
    }

    fn draw_revenue_line(&self, frame: &mut Frame, area: Rect) {
        let title = "Revenue Over Time";
        let series = &self.frame.revenue_series;
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            self.draw_empty(frame, area, title);
            return;
        };

        let points: Vec<(f64, f64)> = series
            .iter()
            .map(|d| ((d.date - first.date).num_days() as f64, d.revenue))
            .collect();
        let span = ((last.date - first.date).num_days() as f64).max(1.0);
        let max_val = series.iter().map(|d| d.revenue).fold(0.0, f64::max);
        let (top, mid) = y_axis_ticks(max_val);

        let line = ChartDataset::default()
            .name("Revenue")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.accent()))
            .data(&points);
        let chart = Chart::new(vec![line])
            .block(
                Block::default()
                    .title(title)
                    .title_style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .legend_position(None)
            .x_axis(
                Axis::default()
                    .style(FOOTER_STYLE)
                    .bounds([0.0, span])
                    .labels(vec![first.date.to_string(), last.date.to_string()]),
            )
            .y_axis(
                Axis::default()
                    .style(FOOTER_STYLE)
                    .bounds([0.0, top])
                    .labels(vec!["$0".to_string(), format_k(mid), format_k(top)]),
            );
        frame.render_widget(chart, area);
    }

    fn draw_region_bars(&self, frame: &mut Frame, area: Rect) {
        let title = "Revenue by Region";
        if self.frame.region_revenue.is_empty() {
            self.draw_empty(frame, area, title);
            return;
        }
        let products = self
            .session
            .canonical()
            .map(Dataset::distinct_products)
            .unwrap_or_default();
        let color_of = |product: &str| {
            product_color(products.iter().position(|p| p == product).unwrap_or(0))
        };

        let [chart_area, legend_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let groups: Vec<BarGroup> = self
            .frame
            .region_revenue
            .iter()
            .map(|r| {
                let bars: Vec<Bar> = r
                    .products
                    .iter()
                    .map(|p| {
                        Bar::default()
                            .value(p.revenue.round() as u64)
                            .text_value(format_k(p.revenue))
                            .style(Style::default().fg(color_of(&p.product)))
                    })
                    .collect();
                BarGroup::default()
                    .label(Line::from(format!("{} ({})", r.region, format_k(r.total))))
                    .bars(&bars)
            })
            .collect();

        let block = Block::default()
            .title(title)
            .title_style(Style::default().add_modifier(Modifier::BOLD))
            .borders(Borders::NONE);
        let mut chart = BarChart::default()
            .block(block)
            .bar_width(5)
            .bar_gap(0)
            .group_gap(2);
        for group in &groups {
            chart = chart.data(group.clone());
        }
        frame.render_widget(chart, chart_area);

        let mut legend = Vec::new();
        for p in &products {
            legend.push(Span::styled(" \u{25a0} ", Style::default().fg(color_of(p))));
            legend.push(Span::raw(p.clone()));
        }
        frame.render_widget(Paragraph::new(Line::from(legend)), legend_area);
    }

    fn draw_deep_dive(&self, frame: &mut Frame, area: Rect) {
        let [top_area, status_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

        let top_title = format!("Top {} Products by Revenue", self.frame.top_products.len());
        if self.frame.top_products.is_empty() {
            self.draw_empty(frame, top_area, &top_title);
        } else {
            let rows: Vec<Row> = self
                .frame
                .top_products
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    Row::new(vec![
                        Cell::from(format!("{}", i + 1)),
                        Cell::from(p.product.clone()),
                        Cell::from(money_span(p.revenue)),
                    ])
                })
                .collect();
            let table = Table::new(
                rows,
                [Constraint::Length(3), Constraint::Fill(1), Constraint::Length(14)],
            )
            .header(Row::new(vec!["#", "Product", "Revenue"]).style(HEADER_STYLE).bottom_margin(1))
            .block(
                Block::default()
                    .title(top_title)
                    .title_style(Style::default().add_modifier(Modifier::BOLD)),
            );
            frame.render_widget(table, top_area);
        }

        let status_title = "Order Status Distribution";
        if self.frame.status_counts.is_empty() {
            self.draw_empty(frame, status_area, status_title);
            return;
        }
        let total: usize = self.frame.status_counts.iter().map(|s| s.count).sum();
        let bars: Vec<Bar> = self
            .frame
            .status_counts
            .iter()
            .map(|s| {
                Bar::default()
                    .label(Line::from(s.status.as_str()))
                    .value(s.count as u64)
                    .text_value(format!(
                        "{} ({})",
                        s.count,
                        percent(s.count as f64 / total as f64 * 100.0)
                    ))
                    .style(Style::default().fg(status_color(s.status)))
            })
            .collect();
        let chart = BarChart::default()
            .block(
                Block::default()
                    .title(status_title)
                    .title_style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .bar_width(12)
            .bar_gap(2)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, status_area);
    }

    fn draw_fragment(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("From HTML")
            .title_style(Style::default().add_modifier(Modifier::BOLD));
        let paragraph = match &self.fragment {
            Ok(text) => {
                let width = area.width.saturating_sub(1) as usize;
                let wrapped: Vec<Line> = text
                    .lines()
                    .map(|l| Line::from(tui::wrap_text(l, width).0))
                    .collect();
                Paragraph::new(wrapped)
            }
            Err(e) => Paragraph::new(format!("Could not load the HTML fragment: {e}")).style(ERROR_STYLE),
        };
        frame.render_widget(paragraph.block(block), area);
    }
}

impl tui::Screen for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let [header_area, kpi_area, caption_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_header(frame, header_area);
        self.draw_kpis(frame, kpi_area);
        frame.render_widget(
            Paragraph::new(self.caption_line()).style(FOOTER_STYLE),
            caption_area,
        );

        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(28), Constraint::Fill(1)]).areas(body_area);
        self.draw_sidebar(frame, sidebar_area);

        let [tabs_area, content_area] =
            Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(main_area);
        self.draw_tabs(frame, tabs_area);
        match self.tab {
            Tab::VisualAnalytics => self.draw_analytics(frame, content_area),
            Tab::DataEditor => self.validated.draw(frame, content_area),
            Tab::NewTable => self.plain.draw(frame, content_area),
            Tab::DeepDive => self.draw_deep_dive(frame, content_area),
            Tab::FromHtml => self.draw_fragment(frame, content_area),
        }

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                footer_area,
            );
        } else {
            let logout = if self.allow_logout { "  L=logout" } else { "" };
            frame.render_widget(
                Paragraph::new(format!(
                    " f=filters/main  Tab=next tab  e=export CSV  r=refresh  q=quit{logout}"
                ))
                .style(FOOTER_STYLE),
                footer_area,
            );
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ScreenAction {
        let focus = self.focus;
        if focus == Focus::Main {
            if let Some(grid) = self.active_grid() {
                if grid.is_editing() {
                    grid.handle_key(code);
                    return ScreenAction::Continue;
                }
            }
        }
        self.status_message = None;
        let pending_exit = self.pending_exit.take();

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                return self.request_exit(DashboardExit::Quit, pending_exit);
            }
            KeyCode::Char('L') if self.allow_logout => {
                return self.request_exit(DashboardExit::Logout, pending_exit);
            }
            KeyCode::Tab => self.step_tab(true),
            KeyCode::BackTab => self.step_tab(false),
            KeyCode::Char('f') => {
                self.focus = match focus {
                    Focus::Sidebar => Focus::Main,
                    Focus::Main => Focus::Sidebar,
                }
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => self.apply(Command::Refresh),
            _ if focus == Focus::Sidebar => self.handle_sidebar_key(code),
            _ => {
                let action = self.active_grid().map(|grid| (grid.surface(), grid.handle_key(code)));
                match action {
                    Some((surface, GridAction::Submit(snapshot))) => self.submit(surface, snapshot),
                    Some((surface, GridAction::Revert)) => self.revert(surface),
                    _ => {}
                }
            }
        }
        ScreenAction::Continue
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Completed => Color::Rgb(80, 220, 100),
        Status::Pending => Color::Yellow,
        Status::Cancelled => Color::Red,
    }
}

/// Pick round y-axis tick values (top and mid) given a max data value.
fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    let steps = [
        100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0,
        250000.0, 500000.0, 1000000.0, 2500000.0, 5000000.0, 10000000.0,
    ];
    let top = steps
        .iter()
        .copied()
        .find(|&s| s >= max_val)
        .unwrap_or(max_val);
    (top, top / 2.0)
}

/// Compact dollar amount: "$Xk" or "$X.Xk" for thousands, "$XM" for millions.
fn format_k(val: f64) -> String {
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("${}M", m as u64)
        } else {
            format!("${:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("${}k", k as u64)
        } else {
            format!("${:.1}k", k)
        }
    } else {
        format!("${}", val.round() as u64)
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(no_auth: bool, credentials: Option<&str>, seed: Option<u64>) -> Result<()> {
    let settings = load_settings();
    let options = session_options(&settings, no_auth);

    if no_auth {
        let session = Session::begin(&mut OpenGate, options, seed_fn(seed))?;
        let mut dashboard = Dashboard::new(session, &settings)?;
        tui::run_screen(&mut dashboard)?;
        dashboard.session.end();
        return Ok(());
    }

    // A broken credential store stops everything before the login form.
    let store = load_credentials(&credentials_path(&settings, credentials))?;
    loop {
        let Some(identity) = login::run(CredentialGate::new(store.clone()))? else {
            return Ok(());
        };
        let session = Session::start(identity, options.clone(), seed_fn(seed));
        let mut dashboard = Dashboard::new(session, &settings)?;
        tui::run_screen(&mut dashboard)?;
        let Dashboard { session, exit, .. } = dashboard;
        session.end();
        if exit != Some(DashboardExit::Logout) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;
    use crate::tui::Screen;

    fn dashboard(no_auth: bool) -> Dashboard {
        let session = Session::start(
            crate::auth::Identity {
                username: "jsmith".to_string(),
                name: "John Smith".to_string(),
            },
            SessionOptions {
                product_filter: no_auth,
                show_editor: true,
                accent_color: "#2E86C1".to_string(),
                top_n: 5,
            },
            seed_fn(Some(21)),
        );
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            fragment_path: dir.path().join("partial.html").to_string_lossy().to_string(),
            export_dir: dir.path().to_string_lossy().to_string(),
            ..Settings::default()
        };
        Dashboard::new(session, &settings).unwrap()
    }

    #[test]
    fn test_title_and_sidebar_by_variant() {
        let gated = dashboard(false);
        assert_eq!(gated.title, TITLE);
        assert!(gated.allow_logout);
        assert!(!gated.sidebar_items().iter().any(|i| matches!(i, SidebarItem::Product(_))));

        let mvp = dashboard(true);
        assert_eq!(mvp.title, "Executive Sales Overview (MVP)");
        assert!(!mvp.allow_logout);
        assert!(mvp.sidebar_items().iter().any(|i| matches!(i, SidebarItem::Product(_))));
    }

    #[test]
    fn test_missing_fragment_is_reported_in_panel() {
        let d = dashboard(false);
        let err = d.fragment.as_ref().unwrap_err();
        assert!(err.contains("partial.html"));
    }

    #[test]
    fn test_toggle_region_from_sidebar() {
        let mut d = dashboard(false);
        let total = d.frame.view.len();
        let first_region = match &d.sidebar_items()[0] {
            SidebarItem::Region(r) => r.clone(),
            other => panic!("unexpected item {other:?}"),
        };
        d.handle_key(KeyCode::Enter);
        assert!(!d.session.selection().region_selected(&first_region));
        assert!(d.frame.view.len() < total);
        assert!(d.frame.view.iter().all(|v| v.row.region != first_region));

        d.handle_key(KeyCode::Char(' '));
        assert_eq!(d.frame.view.len(), total);
    }

    #[test]
    fn test_status_cycles_through_choices() {
        let mut d = dashboard(false);
        let pos = d
            .sidebar_items()
            .iter()
            .position(|i| *i == SidebarItem::Status)
            .unwrap();
        d.sidebar_selection = pos;
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.session.selection().status, StatusFilter::Only(Status::Completed));
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.session.selection().status, StatusFilter::Only(Status::Pending));
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.session.selection().status, StatusFilter::All);
    }

    #[test]
    fn test_hiding_editor_leaves_grid_tab() {
        let mut d = dashboard(false);
        d.handle_key(KeyCode::Tab);
        assert_eq!(d.tab, Tab::DataEditor);

        let pos = d
            .sidebar_items()
            .iter()
            .position(|i| *i == SidebarItem::ShowEditor)
            .unwrap();
        d.sidebar_selection = pos;
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.frame.tabs, vec![Tab::VisualAnalytics, Tab::DeepDive, Tab::FromHtml]);
        assert_eq!(d.tab, Tab::VisualAnalytics);
    }

    #[test]
    fn test_accent_cycles_presets() {
        let mut d = dashboard(false);
        d.sidebar_selection = d.sidebar_items().len() - 1;
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.session.display().accent_color, ACCENT_PRESETS[1]);
    }

    #[test]
    fn test_grid_submit_updates_canonical() {
        let mut d = dashboard(false);
        let before = d.session.canonical().unwrap().len();
        d.handle_key(KeyCode::Tab);
        d.handle_key(KeyCode::Tab);
        assert_eq!(d.tab, Tab::NewTable);
        d.handle_key(KeyCode::Char('f'));
        d.handle_key(KeyCode::Char('x'));
        d.handle_key(KeyCode::Char('s'));
        assert_eq!(d.session.canonical().unwrap().len(), before - 1);
        assert_eq!(d.frame.view.len(), before - 1);
        assert!(d.status_message.as_deref().unwrap().contains("New Table saved"));

        // Saving again without changes is a no-op.
        d.handle_key(KeyCode::Char('s'));
        assert_eq!(d.status_message.as_deref(), Some("No changes to save"));
    }

    #[test]
    fn test_dirty_grid_survives_other_save() {
        let mut d = dashboard(false);
        let before = d.session.canonical().unwrap().len();
        d.focus = Focus::Main;
        d.tab = Tab::DataEditor;
        d.handle_key(KeyCode::Char('a'));
        assert!(d.validated.is_dirty());

        d.tab = Tab::NewTable;
        d.handle_key(KeyCode::Char('x'));
        d.handle_key(KeyCode::Char('s'));
        assert_eq!(d.session.canonical().unwrap().len(), before - 1);
        assert!(d.validated.is_dirty());

        // The editor that saves last wins.
        d.tab = Tab::DataEditor;
        d.handle_key(KeyCode::Char('s'));
        assert_eq!(d.session.canonical().unwrap().len(), before + 1);
        assert!(!d.plain.is_dirty());
    }

    #[test]
    fn test_export_writes_csv() {
        let mut d = dashboard(false);
        let dir = tempfile::tempdir().unwrap();
        d.export_path = dir.path().join("out").join("sales_dashboard_export.csv");
        d.handle_key(KeyCode::Char('e'));
        let content = std::fs::read_to_string(&d.export_path).unwrap();
        assert_eq!(content.lines().count(), d.frame.view.len() + 1);
        assert!(d.status_message.as_deref().unwrap().starts_with("Exported"));
    }

    #[test]
    fn test_quit_and_logout() {
        let mut d = dashboard(false);
        assert!(matches!(d.handle_key(KeyCode::Char('L')), ScreenAction::Close));
        assert_eq!(d.exit, Some(DashboardExit::Logout));

        let mut mvp = dashboard(true);
        assert!(matches!(mvp.handle_key(KeyCode::Char('L')), ScreenAction::Continue));
        assert!(matches!(mvp.handle_key(KeyCode::Char('q')), ScreenAction::Close));
        assert_eq!(mvp.exit, Some(DashboardExit::Quit));
    }

    #[test]
    fn test_quit_with_unsaved_edits_needs_confirmation() {
        let mut d = dashboard(false);
        d.focus = Focus::Main;
        d.tab = Tab::NewTable;
        d.handle_key(KeyCode::Char('x'));
        assert!(d.plain.is_dirty());

        assert!(matches!(d.handle_key(KeyCode::Char('q')), ScreenAction::Continue));
        assert!(d.exit.is_none());
        assert!(d.status_message.as_deref().unwrap().contains("Press q again"));

        // Any other key cancels the pending quit.
        d.handle_key(KeyCode::Char('r'));
        assert!(matches!(d.handle_key(KeyCode::Char('q')), ScreenAction::Continue));
        assert!(matches!(d.handle_key(KeyCode::Char('q')), ScreenAction::Close));
        assert_eq!(d.exit, Some(DashboardExit::Quit));
    }

    #[test]
    fn test_logout_with_unsaved_edits_needs_confirmation() {
        let mut d = dashboard(false);
        d.focus = Focus::Main;
        d.tab = Tab::DataEditor;
        d.handle_key(KeyCode::Char('a'));

        assert!(matches!(d.handle_key(KeyCode::Char('L')), ScreenAction::Continue));
        assert!(d.status_message.as_deref().unwrap().contains("Press L again to log out"));
        // Quit is a different exit and asks again.
        assert!(matches!(d.handle_key(KeyCode::Char('q')), ScreenAction::Continue));
        assert!(matches!(d.handle_key(KeyCode::Char('q')), ScreenAction::Close));
        assert_eq!(d.exit, Some(DashboardExit::Quit));
    }

    #[test]
    fn test_caption_counts_saved_edits() {
        let mut d = dashboard(false);
        assert_eq!(d.caption_line(), " Data snapshot for 100 transactions.");
        d.focus = Focus::Main;
        d.tab = Tab::NewTable;
        d.handle_key(KeyCode::Char('x'));
        d.handle_key(KeyCode::Char('s'));
        assert_eq!(d.frame.revision, 1);
        assert_eq!(
            d.caption_line(),
            " Data snapshot for 99 transactions. 1 saved edit this session."
        );
        d.handle_key(KeyCode::Char('x'));
        d.handle_key(KeyCode::Char('s'));
        assert!(d.caption_line().ends_with("2 saved edits this session."));
    }

    #[test]
    fn test_format_k_and_ticks() {
        assert_eq!(format_k(1500.0), "$1.5k");
        assert_eq!(format_k(2000.0), "$2k");
        assert_eq!(format_k(2_500_000.0), "$2.5M");
        assert_eq!(format_k(42.4), "$42");
        assert_eq!(y_axis_ticks(30_000.0), (50_000.0, 25_000.0));
    }
}
