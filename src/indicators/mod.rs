//! Block-group indicators derived from the written topic CSVs.
//!
//! Four topics feed a reducer each:
//!
//! - `population`: `total_pop`, `pct_working_age` (ages 15 to 64)
//! - `income`: `total_hh`, `pct_hh_pov` (household income under $25,000)
//! - `race`: `pct_white`, `pct_black`, `pct_other`
//! - `commute_time`: `pct_long_commute` (35 minutes or more) and the share of
//!   each travel mode (`pct_car`, `pct_walk`, `pct_other_mode`, `pct_transit`)
//!
//! Age, income and minute bins are chosen by the numbers that appear in the
//! renamed column headers, so the reducers do not depend on variable codes.
//! A ratio is empty when either side is missing or the denominator is zero.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{Column, GEOID, RunConfig, WideTable};
use crate::error::AppError;
use crate::io::{read_topic_csv, write_table_csv};
use crate::rename::compose_column_name;

static TWO_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\d").expect("two-digit pattern is valid"));

// Dollar amounts with a thousands separator: `10,000`, `124,999`.
static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d.*?\d,\d+").expect("thousands pattern is valid"));

const WORKING_AGE: Range<i64> = 15..65;
const POVERTY_INCOME: Range<i64> = 0..25_000;
const LONG_COMMUTE_MINUTES: Range<i64> = 35..1000;

const TOTAL: &str = "Total";

const COMMUTE_TIMES: [&str; 9] = [
    "Less than 10 minutes",
    "10 to 14 minutes",
    "15 to 19 minutes",
    "20 to 24 minutes",
    "25 to 29 minutes",
    "30 to 34 minutes",
    "35 to 44 minutes",
    "45 to 59 minutes",
    "60 or more minutes",
];

/// Travel-mode label and the indicator it becomes.
const COMMUTE_MODES: [(&str, &str); 4] = [
    ("Car, truck, or van", "pct_car"),
    ("Walked", "pct_walk"),
    ("Taxicab, motorcycle, bicycle, or other means", "pct_other_mode"),
    ("Public transportation (excluding taxicab)", "pct_transit"),
];

pub type Reducer = fn(&WideTable) -> Result<IndicatorTable, AppError>;

/// Topic CSVs read by `link_indicators`, in join order.
pub const REDUCERS: [(&str, Reducer); 4] = [
    ("population", population_indicators),
    ("income", poverty_indicators),
    ("race", race_indicators),
    ("commute_time", commute_indicators),
];

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Numeric indicators keyed by GEOID, one row per block group.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    pub geoids: Vec<String>,
    pub columns: Vec<IndicatorColumn>,
}

impl IndicatorTable {
    pub fn new(geoids: Vec<String>) -> Self {
        Self {
            geoids,
            columns: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, values: Vec<Option<f64>>) {
        self.columns.push(IndicatorColumn {
            name: name.to_string(),
            values,
        });
    }

    pub fn n_rows(&self) -> usize {
        self.geoids.len()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Keep GEOIDs present in both tables, in `self`'s order, with `other`'s
    /// columns appended.
    pub fn inner_join(self, other: &IndicatorTable) -> Result<Self, AppError> {
        if let Some(clash) = other.columns.iter().find(|c| self.column(&c.name).is_some()) {
            return Err(AppError::duplicate_column_name(format!(
                "Indicator column '{}' is produced by more than one topic.",
                clash.name
            )));
        }

        let index: HashMap<&str, usize> = other
            .geoids
            .iter()
            .enumerate()
            .map(|(j, g)| (g.as_str(), j))
            .collect();
        let pairs: Vec<(usize, usize)> = self
            .geoids
            .iter()
            .enumerate()
            .filter_map(|(i, g)| index.get(g.as_str()).map(|&j| (i, j)))
            .collect();

        let pick = |values: &[Option<f64>], left: bool| -> Vec<Option<f64>> {
            pairs
                .iter()
                .map(|&(i, j)| values[if left { i } else { j }])
                .collect()
        };

        let mut joined = IndicatorTable::new(pairs.iter().map(|&(i, _)| self.geoids[i].clone()).collect());
        for column in &self.columns {
            joined.push(&column.name, pick(&column.values, true));
        }
        for column in &other.columns {
            joined.push(&column.name, pick(&column.values, false));
        }
        Ok(joined)
    }

    /// Text form for CSV export; missing values become empty cells.
    pub fn to_wide_table(&self) -> WideTable {
        WideTable {
            id: Column::new(GEOID, self.geoids.clone()),
            label: None,
            columns: self
                .columns
                .iter()
                .map(|c| {
                    Column::new(
                        c.name.clone(),
                        c.values
                            .iter()
                            .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
                            .collect(),
                    )
                })
                .collect(),
            geometry: None,
        }
    }
}

/// Names of columns carrying a number (commas stripped) that falls in `range`.
pub fn columns_in_range<'a>(
    names: impl IntoIterator<Item = &'a str>,
    range: Range<i64>,
    pattern: &Regex,
) -> Vec<&'a str> {
    names
        .into_iter()
        .filter(|name| {
            pattern
                .find_iter(name)
                .filter_map(|m| m.as_str().replace(',', "").parse::<i64>().ok())
                .any(|n| range.contains(&n))
        })
        .collect()
}

pub fn population_indicators(table: &WideTable) -> Result<IndicatorTable, AppError> {
    let topic = "population";
    let total = numeric(table, &compose_column_name(TOTAL, topic))?;
    let working_age = columns_in_range(value_names(table), WORKING_AGE, &TWO_DIGITS);
    let working = sum_columns(table, &working_age)?;

    let mut out = IndicatorTable::new(table.id.values.clone());
    out.push("total_pop", total.clone());
    out.push("pct_working_age", ratio(&working, &total));
    Ok(out)
}

pub fn poverty_indicators(table: &WideTable) -> Result<IndicatorTable, AppError> {
    let topic = "income";
    let total = numeric(table, &compose_column_name(TOTAL, topic))?;
    let poor = columns_in_range(value_names(table), POVERTY_INCOME, &THOUSANDS);
    let poor = sum_columns(table, &poor)?;

    let mut out = IndicatorTable::new(table.id.values.clone());
    out.push("total_hh", total.clone());
    out.push("pct_hh_pov", ratio(&poor, &total));
    Ok(out)
}

pub fn race_indicators(table: &WideTable) -> Result<IndicatorTable, AppError> {
    let topic = "race";
    let total = numeric(table, &compose_column_name(TOTAL, topic))?;
    let white = ratio(&numeric(table, &compose_column_name("White alone", topic))?, &total);
    let black = ratio(
        &numeric(table, &compose_column_name("Black or African American alone", topic))?,
        &total,
    );
    let other = white
        .iter()
        .zip(&black)
        .map(|(w, b)| Some(1.0 - (w.as_ref()? + b.as_ref()?)))
        .collect();

    let mut out = IndicatorTable::new(table.id.values.clone());
    out.push("pct_white", white);
    out.push("pct_black", black);
    out.push("pct_other", other);
    Ok(out)
}

pub fn commute_indicators(table: &WideTable) -> Result<IndicatorTable, AppError> {
    let topic = "commute_time";
    let total = numeric(table, &compose_column_name(TOTAL, topic))?;

    let times: Vec<String> = COMMUTE_TIMES
        .iter()
        .map(|label| compose_column_name(label, topic))
        .collect();
    for name in &times {
        numeric(table, name)?;
    }
    let long = columns_in_range(times.iter().map(String::as_str), LONG_COMMUTE_MINUTES, &TWO_DIGITS);
    let long = sum_columns(table, &long)?;

    let mut out = IndicatorTable::new(table.id.values.clone());
    out.push("pct_long_commute", ratio(&long, &total));
    for (label, indicator) in COMMUTE_MODES {
        let mode = numeric(table, &compose_column_name(label, topic))?;
        out.push(indicator, ratio(&mode, &total));
    }
    Ok(out)
}

/// Read the source topic CSVs under `config`, reduce each and join on GEOID.
pub fn link_indicators(config: &RunConfig) -> Result<IndicatorTable, AppError> {
    let mut linked: Option<IndicatorTable> = None;
    for (topic, reduce) in REDUCERS {
        let table = read_topic_csv(&config.topic_csv_path(topic))?;
        let part = reduce(&table)?;
        debug!(topic, rows = part.n_rows(), "derived indicators");

        linked = Some(match linked {
            None => part,
            Some(acc) => {
                let before = acc.n_rows();
                let joined = acc.inner_join(&part)?;
                if joined.n_rows() < before {
                    warn!(topic, dropped = before - joined.n_rows(), "GEOIDs missing from topic dropped");
                }
                joined
            }
        });
    }
    Ok(linked.unwrap_or_else(|| IndicatorTable::new(Vec::new())))
}

/// Link the indicators and write them to `config.indicators_csv_path()`.
pub fn write_indicators(config: &RunConfig) -> Result<IndicatorTable, AppError> {
    let linked = link_indicators(config)?;
    write_table_csv(&config.indicators_csv_path(), &linked.to_wide_table())?;
    Ok(linked)
}

fn value_names(table: &WideTable) -> impl Iterator<Item = &str> {
    table.columns.iter().map(|c| c.name.as_str())
}

fn numeric(table: &WideTable, name: &str) -> Result<Vec<Option<f64>>, AppError> {
    let column = table
        .columns
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| AppError::missing_column(format!("Indicator input column '{name}' is missing.")))?;
    Ok(column
        .values
        .iter()
        .map(|v| v.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect())
}

// Missing cells count as zero in a row sum.
fn sum_columns(table: &WideTable, names: &[&str]) -> Result<Vec<Option<f64>>, AppError> {
    let mut sums = vec![0.0; table.n_rows()];
    for name in names {
        for (sum, value) in sums.iter_mut().zip(numeric(table, name)?) {
            *sum += value.unwrap_or(0.0);
        }
    }
    Ok(sums.into_iter().map(Some).collect())
}

fn ratio(numerator: &[Option<f64>], denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| match (n, d) {
            (Some(n), Some(d)) if *d != 0.0 => Some(n / d),
            _ => None,
        })
        .collect()
}
