use std::path::PathBuf;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Paragraph, Row, Table},
    Frame,
};

use crate::clean::clean;
use crate::error::Result;
use crate::filter::{Selection, Selections};
use crate::fmt::number;
use crate::ingest::Ingestor;
use crate::models::CleanedTable;
use crate::present::{render, ChartKind, ChartSeries, DashboardView, LayoutKind, MetricCard};
use crate::settings::load_settings;
use crate::tui::{
    run_screen, value_span, Screen, ScreenAction, BAR_STYLE, BORDER_STYLE, FOOTER_STYLE,
    HEADER_STYLE, SELECTED_STYLE, SLICE_COLORS,
};

use super::{load_table, FilterArgs};

const TABLE_PAGE: usize = 10;
const MAX_COLUMN_WIDTH: usize = 24;

struct Dashboard {
    ingestor: Ingestor,
    path: PathBuf,
    table: CleanedTable,
    selections: Selections,
    layout: LayoutKind,
    view: DashboardView,
    /// Index of the filter that Up/Down act on.
    focus: usize,
    show_table: bool,
    table_offset: usize,
    status_message: Option<String>,
}

impl Dashboard {
    fn new(
        ingestor: Ingestor,
        path: PathBuf,
        table: CleanedTable,
        selections: Selections,
        layout: LayoutKind,
    ) -> Self {
        let view = render(&table, &selections, layout);
        Self {
            ingestor,
            path,
            table,
            selections,
            layout,
            view,
            focus: 0,
            show_table: false,
            table_offset: 0,
            status_message: None,
        }
    }

    fn refresh(&mut self) {
        self.view = render(&self.table, &self.selections, self.layout);
        let max_offset = self.view.detail.rows.len().saturating_sub(1);
        self.table_offset = self.table_offset.min(max_offset);
    }

    /// Step the focused filter to the previous/next option, wrapping around.
    fn cycle_selection(&mut self, delta: isize) {
        let Some(control) = self.view.filters.get(self.focus) else {
            return;
        };
        let len = control.options.len();
        if len == 0 {
            return;
        }
        let current = control.selected.unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        // slot 0 is the "All" sentinel; anything after it is a literal value
        let selection = if next == 0 {
            Selection::All
        } else {
            Selection::Value(control.options[next].clone())
        };
        let dimension = control.dimension;
        self.selections.set(dimension, selection);
        self.table_offset = 0;
        self.refresh();
    }

    fn reset_filters(&mut self) {
        self.selections = Selections::new();
        self.table_offset = 0;
        self.refresh();
    }

    /// Drop the cached sheet and read it again from disk. A failed reload keeps
    /// the previous data on screen.
    fn reload(&mut self) {
        self.ingestor.invalidate(&self.path);
        let result = self
            .ingestor
            .load(&self.path)
            .and_then(|raw| clean(&raw));
        match result {
            Ok(table) => {
                log::debug!("{} sheet(s) cached", self.ingestor.cached_count());
                self.status_message = Some(format!("Reloaded {} rows", number(table.len())));
                self.table = table;
            }
            Err(e) => {
                log::warn!("reload of {} failed: {e}", self.path.display());
                self.status_message = Some(format!("Reload failed: {e}"));
            }
        }
        self.refresh();
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_filters(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(" ")];
        for (i, control) in self.view.filters.iter().enumerate() {
            let label = format!(" {}: \u{2039} {} \u{203a} ", control.dimension.label(), control.current);
            let style = if i == self.focus {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!(
                "{} transactions",
                number(self.view.summary.row_count)
            ),
            FOOTER_STYLE,
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_cards(&self, frame: &mut Frame, area: Rect) {
        let areas = card_areas(area, self.layout);
        for (card, rect) in self.view.cards.iter().zip(areas) {
            draw_card(frame, rect, card, &self.view.updated_at);
        }
    }

    fn draw_charts(&self, frame: &mut Frame, area: Rect) {
        let n = self.view.charts.len().max(1);
        let areas = Layout::horizontal(vec![Constraint::Ratio(1, n as u32); n]).split(area);
        for (chart, rect) in self.view.charts.iter().zip(areas.iter()) {
            match chart.kind {
                ChartKind::Bar => draw_bar_chart(frame, *rect, chart),
                ChartKind::Pie => draw_share_chart(frame, *rect, chart),
            }
        }
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let detail = &self.view.detail;
        let visible = area.height.saturating_sub(3) as usize;
        let rows: Vec<&Vec<String>> = detail
            .rows
            .iter()
            .skip(self.table_offset)
            .take(visible)
            .collect();

        let widths: Vec<Constraint> = detail
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let widest = rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(4);
                Constraint::Length(widest.min(MAX_COLUMN_WIDTH) as u16)
            })
            .collect();

        let header = Row::new(detail.headers.iter().copied())
            .style(Style::default().add_modifier(Modifier::BOLD));
        let body: Vec<Row> = rows
            .iter()
            .map(|r| Row::new(r.iter().map(String::as_str)))
            .collect();

        let title = format!(
            " Transactions {}-{} of {} ",
            (self.table_offset + 1).min(detail.rows.len()),
            (self.table_offset + rows.len()).min(detail.rows.len()),
            number(detail.rows.len())
        );
        let table = Table::new(body, widths)
            .header(header)
            .column_spacing(1)
            .block(Block::bordered().title(title).border_style(BORDER_STYLE));
        frame.render_widget(table, area);
    }
}

fn card_areas(area: Rect, layout: LayoutKind) -> Vec<Rect> {
    match layout {
        LayoutKind::Wide => Layout::horizontal([Constraint::Ratio(1, 4); 4])
            .split(area)
            .to_vec(),
        LayoutKind::Compact => {
            let [top, bottom] = Layout::vertical([Constraint::Ratio(1, 2); 2]).areas(area);
            let mut areas = Layout::horizontal([Constraint::Ratio(1, 2); 2])
                .split(top)
                .to_vec();
            areas.extend(
                Layout::horizontal([Constraint::Ratio(1, 2); 2])
                    .split(bottom)
                    .iter()
                    .copied(),
            );
            areas
        }
    }
}

fn draw_card(frame: &mut Frame, area: Rect, card: &MetricCard, updated_at: &str) {
    let block = Block::bordered()
        .title(Span::styled(
            format!(" {} ", card.title),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .border_style(BORDER_STYLE);
    let lines = vec![
        Line::from(vec![Span::raw(" "), value_span(&card.value, card.is_placeholder())]),
        Line::from(Span::styled(format!(" Updated at {updated_at}"), FOOTER_STYLE)),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn chart_block(chart: &ChartSeries) -> Block<'static> {
    Block::bordered()
        .title(Span::styled(
            format!(" {} ", chart.title),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .border_style(BORDER_STYLE)
}

fn draw_bar_chart(frame: &mut Frame, area: Rect, chart: &ChartSeries) {
    if chart.points.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" No data for this selection", FOOTER_STYLE))
                .block(chart_block(chart)),
            area,
        );
        return;
    }

    let bars: Vec<Bar> = chart
        .points
        .iter()
        .map(|p| {
            Bar::default()
                .value(p.total.max(0.0).round() as u64)
                .label(Line::from(p.key.clone()))
                .text_value(chart.value_label(p.total))
        })
        .collect();

    let n = bars.len() as u16;
    let inner = area.width.saturating_sub(2);
    let bar_width = (inner / n.max(1)).saturating_sub(1).clamp(3, 14);

    let chart_widget = BarChart::default()
        .block(chart_block(chart))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(BAR_STYLE)
        .value_style(Style::default().add_modifier(Modifier::BOLD))
        .label_style(FOOTER_STYLE);
    frame.render_widget(chart_widget, area);
}

/// Pie-style breakdown drawn as proportional strips with percentages.
fn draw_share_chart(frame: &mut Frame, area: Rect, chart: &ChartSeries) {
    let shares = chart.shares();
    if shares.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" No data for this selection", FOOTER_STYLE))
                .block(chart_block(chart)),
            area,
        );
        return;
    }

    let key_width = chart
        .points
        .iter()
        .map(|p| p.key.chars().count())
        .max()
        .unwrap_or(4);
    let strip_width = (area.width as usize).saturating_sub(key_width + 14).max(4);

    let mut lines = Vec::new();
    for (i, (p, (_, pct))) in chart.points.iter().zip(shares.iter()).enumerate() {
        let color = SLICE_COLORS[i % SLICE_COLORS.len()];
        let filled = ((pct / 100.0) * strip_width as f64).round() as usize;
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<width$} ", p.key, width = key_width)),
            Span::styled("\u{2588}".repeat(filled.max(1)), Style::default().fg(color)),
            Span::raw(format!(" {pct:>5.1}%")),
        ]));
        lines.push(Line::from(Span::styled(
            format!(" {:<width$} {}", "", chart.value_label(p.total), width = key_width),
            FOOTER_STYLE,
        )));
    }
    frame.render_widget(Paragraph::new(lines).block(chart_block(chart)), area);
}

impl Screen for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let card_height = match self.layout {
            LayoutKind::Wide => 4,
            LayoutKind::Compact => 8,
        };
        let table_height = if self.show_table {
            Constraint::Percentage(40)
        } else {
            Constraint::Length(0)
        };

        let [header_area, sep, filters_area, cards_area, charts_area, table_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(card_height),
                Constraint::Fill(1),
                table_height,
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}  ({} layout)", self.view.title, self.layout.label()))
                .style(HEADER_STYLE),
            header_area,
        );
        let sep_line = "\u{2501}".repeat(area.width as usize);
        frame.render_widget(Paragraph::new(sep_line).style(BORDER_STYLE), sep);

        self.draw_filters(frame, filters_area);
        self.draw_cards(frame, cards_area);
        self.draw_charts(frame, charts_area);
        if self.show_table {
            self.draw_detail(frame, table_area);
        }

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(ratatui::style::Color::Yellow)),
                hints_area,
            );
        } else {
            frame.render_widget(
                Paragraph::new(
                    " Left/Right=filter  Up/Down=value  a=all  t=table  PgUp/PgDn=scroll  l=layout  r=reload  q=quit",
                )
                .style(FOOTER_STYLE),
                hints_area,
            );
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ScreenAction {
        self.status_message = None;
        let filter_count = self.view.filters.len().max(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ScreenAction::Close,
            KeyCode::Left => self.focus = (self.focus + filter_count - 1) % filter_count,
            KeyCode::Right | KeyCode::Tab => self.focus = (self.focus + 1) % filter_count,
            KeyCode::Up => self.cycle_selection(-1),
            KeyCode::Down => self.cycle_selection(1),
            KeyCode::Char('a') => self.reset_filters(),
            KeyCode::Char('l') => {
                self.layout = self.layout.toggle();
                self.refresh();
            }
            KeyCode::Char('t') => self.show_table = !self.show_table,
            KeyCode::PageDown if self.show_table => {
                let max_offset = self.view.detail.rows.len().saturating_sub(1);
                self.table_offset = (self.table_offset + TABLE_PAGE).min(max_offset);
            }
            KeyCode::PageUp if self.show_table => {
                self.table_offset = self.table_offset.saturating_sub(TABLE_PAGE);
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        ScreenAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Load and clean before touching the terminal so ingest and format errors
/// surface as a plain message and no partial dashboard is drawn.
pub fn run(file: Option<&str>, layout: Option<LayoutKind>, filters: &FilterArgs) -> Result<()> {
    let layout = layout.unwrap_or(load_settings().layout);
    let mut ingestor = Ingestor::new();
    let (path, table) = load_table(&mut ingestor, file)?;

    let mut dashboard = Dashboard::new(ingestor, path, table, filters.selections(), layout);
    run_screen(&mut dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Dimension;
    use crate::testutil::fleet;
    use ratatui::{backend::TestBackend, Terminal};

    fn dashboard(layout: LayoutKind) -> Dashboard {
        Dashboard::new(
            Ingestor::new(),
            PathBuf::from("does-not-exist.xlsx"),
            fleet(),
            Selections::new(),
            layout,
        )
    }

    fn screen_text(dash: &mut Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 48)).unwrap();
        terminal.draw(|f| dash.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_cycle_month_filter() {
        let mut dash = dashboard(LayoutKind::Wide);
        dash.handle_key(KeyCode::Down);
        assert_eq!(
            dash.selections.get(Dimension::Month),
            &Selection::Value("01/2025".into())
        );
        assert_eq!(dash.view.summary.row_count, 3);

        dash.handle_key(KeyCode::Up);
        assert_eq!(dash.selections.get(Dimension::Month), &Selection::All);
        assert_eq!(dash.view.summary.row_count, 6);

        // wraps to the last month
        dash.handle_key(KeyCode::Up);
        assert_eq!(
            dash.selections.get(Dimension::Month),
            &Selection::Value("02/2025".into())
        );
    }

    #[test]
    fn test_focus_company_filter() {
        let mut dash = dashboard(LayoutKind::Wide);
        dash.handle_key(KeyCode::Right);
        dash.handle_key(KeyCode::Down);
        dash.handle_key(KeyCode::Down);
        assert_eq!(
            dash.selections.get(Dimension::Company),
            &Selection::Value("B".into())
        );
        dash.handle_key(KeyCode::Char('a'));
        assert!(dash.selections.is_unrestricted());
    }

    #[test]
    fn test_company_literally_named_all() {
        let table = crate::testutil::table(vec![
            crate::testutil::txn("All", "2025-01-05", "P1", "DIESEL", 10.0, 60.0),
            crate::testutil::txn("B", "2025-01-06", "P2", "DIESEL", 20.0, 120.0),
        ]);
        let mut dash = Dashboard::new(
            Ingestor::new(),
            PathBuf::from("does-not-exist.xlsx"),
            table,
            Selections::new(),
            LayoutKind::Wide,
        );
        dash.handle_key(KeyCode::Right);
        dash.handle_key(KeyCode::Down);
        assert_eq!(
            dash.selections.get(Dimension::Company),
            &Selection::Value("All".into())
        );
        assert_eq!(dash.view.summary.row_count, 1);

        dash.handle_key(KeyCode::Down);
        assert_eq!(
            dash.selections.get(Dimension::Company),
            &Selection::Value("B".into())
        );
        dash.handle_key(KeyCode::Down);
        assert_eq!(dash.selections.get(Dimension::Company), &Selection::All);
        assert_eq!(dash.view.summary.row_count, 2);
    }

    #[test]
    fn test_layout_toggle_rebuilds_charts() {
        let mut dash = dashboard(LayoutKind::Wide);
        assert_eq!(dash.view.charts.len(), 3);
        dash.handle_key(KeyCode::Char('l'));
        assert_eq!(dash.layout, LayoutKind::Compact);
        assert_eq!(dash.view.charts.len(), 2);
    }

    #[test]
    fn test_quit_keys() {
        let mut dash = dashboard(LayoutKind::Wide);
        assert!(matches!(dash.handle_key(KeyCode::Char('q')), ScreenAction::Close));
        assert!(matches!(dash.handle_key(KeyCode::Esc), ScreenAction::Close));
    }

    #[test]
    fn test_failed_reload_keeps_data() {
        let mut dash = dashboard(LayoutKind::Wide);
        dash.handle_key(KeyCode::Char('r'));
        assert_eq!(dash.table.len(), 6);
        assert!(dash
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Reload failed")));
    }

    #[test]
    fn test_draw_wide() {
        let mut dash = dashboard(LayoutKind::Wide);
        let text = screen_text(&mut dash);
        assert!(text.contains("Fuel consumption 2025"));
        assert!(text.contains("Total spend"));
        assert!(text.contains("R$ 1.234,00"));
        assert!(text.contains("Liters by fuel type"));
    }

    #[test]
    fn test_draw_compact_with_table() {
        let mut dash = dashboard(LayoutKind::Compact);
        dash.handle_key(KeyCode::Char('t'));
        let text = screen_text(&mut dash);
        assert!(text.contains("Cost by company"));
        assert!(text.contains("Transactions 1-"));
        assert!(text.contains("AAA1111"));
    }

    #[test]
    fn test_draw_empty_selection() {
        let mut dash = dashboard(LayoutKind::Wide);
        dash.selections.set(Dimension::Company, Selection::Value("Z".into()));
        dash.refresh();
        let text = screen_text(&mut dash);
        assert!(text.contains("No data for this selection"));
        assert!(text.contains(crate::fmt::PLACEHOLDER));
    }
}
