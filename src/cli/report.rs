use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::filter::Selections;
use crate::fmt::number;
use crate::ingest::Ingestor;
use crate::models::CleanedTable;
use crate::present::{render, ChartKind, DashboardView, LayoutKind};

use super::{load_table, FilterArgs};

// ---------------------------------------------------------------------------
// Formatting (pure, used by the commands below and by tests)
// ---------------------------------------------------------------------------

/// The wide view plus any grouped series only the compact layout shows, so
/// the text report carries every breakdown.
pub fn summary_view(table: &CleanedTable, selections: &Selections) -> DashboardView {
    let mut view = render(table, selections, LayoutKind::Wide);
    let compact = render(table, selections, LayoutKind::Compact);
    for chart in compact.charts {
        if !view.charts.iter().any(|c| c.title == chart.title) {
            view.charts.push(chart);
        }
    }
    view
}

pub fn format_summary(view: &DashboardView) -> String {
    let mut out = String::new();

    let mut cards = Table::new();
    cards.set_header(vec!["Metric", "Value"]);
    for card in &view.cards {
        cards.add_row(vec![Cell::new(card.title), Cell::new(&card.value)]);
    }
    cards.add_row(vec![
        Cell::new("Transactions"),
        Cell::new(number(view.summary.row_count)),
    ]);
    cards.add_row(vec![
        Cell::new("Vehicles"),
        Cell::new(number(view.summary.vehicle_count)),
    ]);
    out.push_str(&format!("{}\n{cards}\n", view.title.bold()));

    for chart in &view.charts {
        let mut table = Table::new();
        match chart.kind {
            ChartKind::Bar => {
                table.set_header(vec![chart.x_label, chart.y_label]);
                for p in &chart.points {
                    table.add_row(vec![Cell::new(&p.key), Cell::new(chart.value_label(p.total))]);
                }
            }
            ChartKind::Pie => {
                table.set_header(vec![chart.x_label, chart.y_label, "%"]);
                let shares = chart.shares();
                for (i, p) in chart.points.iter().enumerate() {
                    let pct = shares
                        .get(i)
                        .map(|(_, pct)| format!("{pct:.1}%"))
                        .unwrap_or_default();
                    table.add_row(vec![
                        Cell::new(&p.key),
                        Cell::new(chart.value_label(p.total)),
                        Cell::new(pct),
                    ]);
                }
            }
        }
        out.push_str(&format!("\n{}\n{table}\n", chart.title.bold()));
    }
    out
}

pub fn format_detail(view: &DashboardView, limit: Option<usize>) -> String {
    let mut table = Table::new();
    table.set_header(view.detail.headers.to_vec());
    let shown = limit.unwrap_or(view.detail.rows.len());
    for row in view.detail.rows.iter().take(shown) {
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    let mut out = format!("{table}\n");
    if shown < view.detail.rows.len() {
        out.push_str(&format!(
            "{} of {} rows shown\n",
            number(shown),
            number(view.detail.rows.len())
        ));
    }
    out
}

pub fn format_filters(view: &DashboardView) -> String {
    let mut out = String::new();
    for control in &view.filters {
        out.push_str(&format!(
            "{}: {}\n",
            control.dimension.label().bold(),
            control.options.join(", ")
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn summary(file: Option<&str>, filters: &FilterArgs) -> Result<()> {
    let mut ingestor = Ingestor::new();
    let (_, table) = load_table(&mut ingestor, file)?;
    let selections = filters.selections();
    let view = summary_view(&table, &selections);
    if !selections.is_unrestricted() {
        println!("{}", selections.describe().dimmed());
    }
    print!("{}", format_summary(&view));
    Ok(())
}

pub fn detail(file: Option<&str>, filters: &FilterArgs, limit: Option<usize>) -> Result<()> {
    let mut ingestor = Ingestor::new();
    let (_, table) = load_table(&mut ingestor, file)?;
    let view = render(&table, &filters.selections(), LayoutKind::Wide);
    if view.detail.rows.is_empty() {
        println!("No transactions match {}.", filters.selections().describe());
        return Ok(());
    }
    print!("{}", format_detail(&view, limit));
    Ok(())
}

pub fn filters(file: Option<&str>) -> Result<()> {
    let mut ingestor = Ingestor::new();
    let (_, table) = load_table(&mut ingestor, file)?;
    let view = render(&table, &Default::default(), LayoutKind::Wide);
    print!("{}", format_filters(&view));
    Ok(())
}
