use std::collections::{BTreeMap, BTreeSet};

use crate::error::{FuelError, Result};
use crate::models::Transaction;

// ---------------------------------------------------------------------------
// Scalar summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_amount: f64,
    pub total_liters: f64,
    pub vehicle_count: usize,
    pub row_count: usize,
}

impl Summary {
    /// Spend per liter. Fails when no volume was dispensed.
    pub fn cost_per_liter(&self) -> Result<f64> {
        if self.total_liters == 0.0 {
            return Err(FuelError::DivisionByZero("cost per liter"));
        }
        Ok(self.total_amount / self.total_liters)
    }

    /// Spend per distinct plate. Fails when the subset has no vehicles.
    pub fn cost_per_vehicle(&self) -> Result<f64> {
        if self.vehicle_count == 0 {
            return Err(FuelError::DivisionByZero("cost per vehicle"));
        }
        Ok(self.total_amount / self.vehicle_count as f64)
    }
}

pub fn summarize(rows: &[&Transaction]) -> Summary {
    let plates: BTreeSet<&str> = rows.iter().map(|t| t.plate.as_str()).collect();
    Summary {
        total_amount: rows.iter().map(|t| t.amount).sum(),
        total_liters: rows.iter().map(|t| t.liters).sum(),
        vehicle_count: plates.len(),
        row_count: rows.len(),
    }
}

// ---------------------------------------------------------------------------
// Grouped sums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

/// Sum `value` per `key`, buckets in ascending key order (plain string
/// comparison, so `MM/YYYY` months order by month before year).
pub fn group_sum<K, V>(rows: &[&Transaction], key: K, value: V) -> Vec<GroupTotal>
where
    K: Fn(&Transaction) -> &str,
    V: Fn(&Transaction) -> f64,
{
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for t in rows {
        *sums.entry(key(*t)).or_default() += value(*t);
    }
    sums.into_iter()
        .map(|(k, total)| GroupTotal {
            key: k.to_string(),
            total,
        })
        .collect()
}

pub fn liters_by_month(rows: &[&Transaction]) -> Vec<GroupTotal> {
    group_sum(rows, |t| t.month_year.as_str(), |t| t.liters)
}

pub fn amount_by_month(rows: &[&Transaction]) -> Vec<GroupTotal> {
    group_sum(rows, |t| t.month_year.as_str(), |t| t.amount)
}

pub fn liters_by_fuel(rows: &[&Transaction]) -> Vec<GroupTotal> {
    group_sum(rows, |t| t.fuel_type.as_str(), |t| t.liters)
}

pub fn amount_by_company(rows: &[&Transaction]) -> Vec<GroupTotal> {
    group_sum(rows, |t| t.company_name.as_str(), |t| t.amount)
}

/// Percentage of the grouped total held by each bucket. Empty when the
/// total is zero.
pub fn share(groups: &[GroupTotal]) -> Vec<(String, f64)> {
    let total: f64 = groups.iter().map(|g| g.total).sum();
    if total == 0.0 {
        return Vec::new();
    }
    groups
        .iter()
        .map(|g| (g.key.clone(), g.total / total * 100.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, Selections};
    use crate::testutil::{fleet, table, txn};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_two_row_scenario() {
        let t = table(vec![
            txn("A", "2025-01-10", "AAA1111", "DIESEL", 10.0, 100.0),
            txn("A", "2025-01-20", "AAA2222", "DIESEL", 5.0, 50.0),
        ]);
        let rows: Vec<&Transaction> = t.rows().collect();
        let s = summarize(&rows);
        assert_eq!(s.total_amount, 150.0);
        assert_eq!(s.total_liters, 15.0);
        assert!((s.cost_per_liter().unwrap() - 10.0).abs() < EPS);

        let by_month = amount_by_month(&rows);
        assert_eq!(
            by_month,
            vec![GroupTotal {
                key: "01/2025".into(),
                total: 150.0
            }]
        );
    }

    #[test]
    fn test_empty_subset_reports_division_by_zero() {
        let s = summarize(&[]);
        assert_eq!(s.total_amount, 0.0);
        assert_eq!(s.total_liters, 0.0);
        assert!(matches!(s.cost_per_liter(), Err(FuelError::DivisionByZero(_))));
        assert!(matches!(s.cost_per_vehicle(), Err(FuelError::DivisionByZero(_))));
        assert!(amount_by_month(&[]).is_empty());
    }

    #[test]
    fn test_zero_liters_with_vehicles() {
        let t = table(vec![txn("A", "2025-01-10", "AAA1111", "ARLA", 0.0, 30.0)]);
        let rows: Vec<&Transaction> = t.rows().collect();
        let s = summarize(&rows);
        assert!(s.cost_per_liter().is_err());
        assert_eq!(s.cost_per_vehicle().unwrap(), 30.0);
    }

    #[test]
    fn test_cost_per_liter_times_liters_matches_total() {
        let t = fleet();
        let rows = filter(t.rows(), &Selections::new());
        let s = summarize(&rows);
        let reconstructed = s.cost_per_liter().unwrap() * s.total_liters;
        assert!((reconstructed - s.total_amount).abs() < 1e-6);
    }

    #[test]
    fn test_cost_per_vehicle_uses_distinct_plates() {
        let t = fleet();
        let rows = filter(t.rows(), &Selections::new());
        let s = summarize(&rows);
        assert_eq!(s.vehicle_count, 4);
        assert!((s.cost_per_vehicle().unwrap() - s.total_amount / 4.0).abs() < EPS);
    }

    #[test]
    fn test_grouped_sums_partition_totals() {
        let t = fleet();
        let rows = filter(t.rows(), &Selections::new());
        let s = summarize(&rows);
        let sum = |g: Vec<GroupTotal>| g.iter().map(|x| x.total).sum::<f64>();
        assert!((sum(liters_by_month(&rows)) - s.total_liters).abs() < EPS);
        assert!((sum(amount_by_month(&rows)) - s.total_amount).abs() < EPS);
        assert!((sum(liters_by_fuel(&rows)) - s.total_liters).abs() < EPS);
        assert!((sum(amount_by_company(&rows)) - s.total_amount).abs() < EPS);
    }

    #[test]
    fn test_group_keys_are_sorted() {
        let t = fleet();
        let rows = filter(t.rows(), &Selections::new());
        let fuels: Vec<String> = liters_by_fuel(&rows).into_iter().map(|g| g.key).collect();
        assert_eq!(fuels, vec!["DIESEL", "ETANOL", "GASOLINA"]);
        let companies: Vec<String> = amount_by_company(&rows).into_iter().map(|g| g.key).collect();
        assert_eq!(companies, vec!["A", "B", "C"]);
        assert_eq!(amount_by_company(&rows), amount_by_company(&rows));
    }

    #[test]
    fn test_month_keys_sort_as_text() {
        let t = table(vec![
            txn("A", "2025-01-10", "P1", "DIESEL", 1.0, 1.0),
            txn("A", "2024-12-10", "P1", "DIESEL", 2.0, 2.0),
            txn("A", "2024-02-10", "P1", "DIESEL", 3.0, 3.0),
        ]);
        let rows: Vec<&Transaction> = t.rows().collect();
        let keys: Vec<String> = liters_by_month(&rows).into_iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["01/2025", "02/2024", "12/2024"]);
    }

    #[test]
    fn test_share() {
        let groups = vec![
            GroupTotal { key: "DIESEL".into(), total: 75.0 },
            GroupTotal { key: "ETANOL".into(), total: 25.0 },
        ];
        let pct = share(&groups);
        assert_eq!(pct[0], ("DIESEL".to_string(), 75.0));
        assert_eq!(pct[1], ("ETANOL".to_string(), 25.0));
        assert!(share(&[GroupTotal { key: "X".into(), total: 0.0 }]).is_empty());
    }
}
