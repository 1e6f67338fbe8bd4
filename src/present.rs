use chrono::Datelike;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, GroupTotal, Summary};
use crate::filter::{filter, filter_options, Dimension, Selections};
use crate::fmt::{format_currency, format_datetime, format_decimal, format_ratio, PLACEHOLDER};
use crate::models::{CleanedTable, Transaction};

/// Which dashboard arrangement to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Four cards in a row, three charts (volume, fuel mix, cost).
    #[default]
    Wide,
    /// Cards in a 2x2 grid, cost charts by month and company.
    Compact,
}

impl LayoutKind {
    pub fn toggle(self) -> Self {
        match self {
            Self::Wide => Self::Compact,
            Self::Compact => Self::Wide,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wide => "wide",
            Self::Compact => "compact",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    pub dimension: Dimension,
    pub options: Vec<String>,
    /// Index of the current selection in `options`; `None` for a stale value.
    pub selected: Option<usize>,
    pub current: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
}

impl MetricCard {
    pub fn is_placeholder(&self) -> bool {
        self.value == PLACEHOLDER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: &'static str,
    pub kind: ChartKind,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub currency: bool,
    pub points: Vec<GroupTotal>,
}

impl ChartSeries {
    pub fn value_label(&self, total: f64) -> String {
        if self.currency {
            format_currency(total)
        } else {
            format_decimal(total)
        }
    }

    /// Slice percentages for pie charts.
    pub fn shares(&self) -> Vec<(String, f64)> {
        aggregate::share(&self.points)
    }
}

pub const DETAIL_HEADERS: &[&str] = &[
    "Company",
    "Date",
    "Plate",
    "Model",
    "Registration",
    "Driver",
    "Product",
    "Fuel",
    "Liters",
    "Price/L",
    "Odometer",
    "Distance",
    "Efficiency",
    "Amount",
    "Station",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DetailTable {
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

/// Everything a front end needs to draw one render cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub title: String,
    pub layout: LayoutKind,
    pub filters: Vec<FilterControl>,
    pub summary: Summary,
    pub cards: Vec<MetricCard>,
    pub charts: Vec<ChartSeries>,
    pub detail: DetailTable,
    pub updated_at: String,
}

fn detail_row(t: &Transaction) -> Vec<String> {
    vec![
        t.company_name.clone(),
        format_datetime(&t.transaction_date),
        t.plate.clone(),
        t.vehicle_model.clone(),
        t.registration.to_string(),
        t.driver_name.clone(),
        t.service.clone(),
        t.fuel_type.clone(),
        format_decimal(t.liters),
        format_currency(t.price_per_liter),
        t.odometer_or_hour_meter.to_string(),
        t.distance_or_hours.to_string(),
        t.efficiency
            .map(format_decimal)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        format_currency(t.amount),
        t.establishment_name.clone(),
    ]
}

pub fn detail_table(rows: &[&Transaction]) -> DetailTable {
    DetailTable {
        headers: DETAIL_HEADERS,
        rows: rows.iter().map(|t| detail_row(t)).collect(),
    }
}

pub fn metric_cards(summary: &Summary) -> Vec<MetricCard> {
    vec![
        MetricCard {
            title: "Total spend",
            value: format_currency(summary.total_amount),
        },
        MetricCard {
            title: "Avg cost / vehicle",
            value: format_ratio(summary.cost_per_vehicle()),
        },
        MetricCard {
            title: "Avg cost / liter",
            value: format_ratio(summary.cost_per_liter()),
        },
        MetricCard {
            title: "Total liters",
            value: format_decimal(summary.total_liters),
        },
    ]
}

fn charts(layout: LayoutKind, rows: &[&Transaction]) -> Vec<ChartSeries> {
    let monthly_cost = ChartSeries {
        title: "Monthly cost",
        kind: ChartKind::Bar,
        x_label: "Month",
        y_label: "R$",
        currency: true,
        points: aggregate::amount_by_month(rows),
    };
    match layout {
        LayoutKind::Wide => vec![
            ChartSeries {
                title: "Monthly consumption (liters)",
                kind: ChartKind::Bar,
                x_label: "Month",
                y_label: "Liters",
                currency: false,
                points: aggregate::liters_by_month(rows),
            },
            ChartSeries {
                title: "Liters by fuel type",
                kind: ChartKind::Pie,
                x_label: "Fuel",
                y_label: "Liters",
                currency: false,
                points: aggregate::liters_by_fuel(rows),
            },
            monthly_cost,
        ],
        LayoutKind::Compact => vec![
            monthly_cost,
            ChartSeries {
                title: "Cost by company",
                kind: ChartKind::Bar,
                x_label: "Company",
                y_label: "R$",
                currency: true,
                points: aggregate::amount_by_company(rows),
            },
        ],
    }
}

/// "Fuel consumption 2025", or a year span when the data covers several.
fn title(table: &CleanedTable) -> String {
    let years = table.rows().map(|t| t.transaction_date.year());
    let (min, max) = years.fold((None, None), |(lo, hi): (Option<i32>, Option<i32>), y| {
        (Some(lo.map_or(y, |l| l.min(y))), Some(hi.map_or(y, |h| h.max(y))))
    });
    match (min, max) {
        (Some(a), Some(b)) if a == b => format!("Fuel consumption {a}"),
        (Some(a), Some(b)) => format!("Fuel consumption {a}\u{2013}{b}"),
        _ => "Fuel consumption".to_string(),
    }
}

/// One full filter → aggregate → format cycle for the current selections.
pub fn render(table: &CleanedTable, selections: &Selections, layout: LayoutKind) -> DashboardView {
    let filters = filter_options(table)
        .into_iter()
        .map(|opt| {
            let current = selections.get(opt.dimension);
            FilterControl {
                dimension: opt.dimension,
                selected: opt.position(current),
                current: current.as_str().to_string(),
                options: opt.values,
            }
        })
        .collect();

    let rows = filter(table.rows(), selections);
    debug!(
        "render: {} of {} rows match ({})",
        rows.len(),
        table.len(),
        selections.describe()
    );

    let summary = aggregate::summarize(&rows);
    DashboardView {
        title: title(table),
        layout,
        filters,
        cards: metric_cards(&summary),
        summary,
        charts: charts(layout, &rows),
        detail: detail_table(&rows),
        updated_at: chrono::Local::now().format("%H:%M").to_string(),
    }
}
