//! Pure derivation of chart-ready series from raw backend payloads.
//!
//! Each series is derived independently: a missing or malformed payload
//! degrades that series alone to its documented sample data, and every
//! fallback emits a warning. Nothing here performs I/O besides logging.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

use crate::backend::{PlayerRecord, ScoreRecord, Snapshot};
use crate::logging::log_fallback;

/// Index-aligned label/value pair sequences; `labels[i]` describes `values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
}

/// A series plus the rendering hints the dashboard attaches to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: &'static str,
    pub kind: ChartKind,
    pub dataset_label: &'static str,
    pub series: ChartSeries,
}

/// Which value the per-player chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMetric {
    GamesPlayed,
    AverageScore,
}

impl PlayerMetric {
    pub fn dataset_label(&self) -> &'static str {
        match self {
            PlayerMetric::GamesPlayed => "Games Played",
            PlayerMetric::AverageScore => "Average Score",
        }
    }
}

impl FromStr for PlayerMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gamesPlayed" | "games_played" => Ok(PlayerMetric::GamesPlayed),
            "averageScore" | "average_score" => Ok(PlayerMetric::AverageScore),
            other => Err(format!("unknown player metric: {}", other)),
        }
    }
}

/// Everything the rendering collaborator needs for one redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub aggregate: ChartSpec,
    pub api_usage: ChartSpec,
    pub per_day: ChartSpec,
    pub per_player: ChartSpec,
    /// Suggested y-axis ceiling for the per-player chart; a hint, not data.
    pub player_axis_max: f64,
    /// Passed through untouched for the renderer's top-scores table.
    pub top_scores: Value,
    pub last_refreshed: DateTime<Utc>,
}

pub fn derive(snapshot: &Snapshot, metric: PlayerMetric) -> Dashboard {
    let per_player = per_player_series(&snapshot.players, &snapshot.scores, metric);
    let player_axis_max = player_axis_max(&per_player.values);
    Dashboard {
        aggregate: ChartSpec {
            title: "Game Statistics",
            kind: ChartKind::Bar,
            dataset_label: "Totals",
            series: aggregate_series(&snapshot.aggregate),
        },
        api_usage: ChartSpec {
            title: "API Usage",
            kind: ChartKind::Pie,
            dataset_label: "API Usage Count",
            series: api_usage_series(&snapshot.aggregate),
        },
        per_day: ChartSpec {
            title: "Games Played Per Day",
            kind: ChartKind::Line,
            dataset_label: "Games Played",
            series: per_day_series(&snapshot.dates),
        },
        per_player: ChartSpec {
            title: "Player Information",
            kind: ChartKind::Bar,
            dataset_label: metric.dataset_label(),
            series: per_player,
        },
        player_axis_max,
        top_scores: snapshot.top_scores.clone(),
        last_refreshed: Utc::now(),
    }
}

/// Total games vs total players; both fields must be numbers.
pub fn aggregate_series(aggregate: &Value) -> ChartSeries {
    let labels = vec!["Total Games".to_string(), "Total Players".to_string()];
    let games = aggregate.get("totalGames").and_then(Value::as_f64);
    let players = aggregate.get("totalPlayers").and_then(Value::as_f64);
    match (games, players) {
        (Some(games), Some(players)) => ChartSeries {
            labels,
            values: vec![games, players],
        },
        _ => {
            log_fallback("aggregate", "totalGames/totalPlayers missing or non-numeric");
            ChartSeries {
                labels,
                values: vec![8.0, 4.0],
            }
        }
    }
}

/// Per-endpoint call counts, keyed in the mapping's own enumeration order.
pub fn api_usage_series(aggregate: &Value) -> ChartSeries {
    if let Some(map) = aggregate.get("apiUsage").and_then(Value::as_object) {
        if !map.is_empty() {
            let mut labels = Vec::with_capacity(map.len());
            let mut values = Vec::with_capacity(map.len());
            let mut numeric = true;
            for (endpoint, count) in map {
                match count.as_f64() {
                    Some(count) => {
                        labels.push(endpoint.clone());
                        values.push(count);
                    }
                    None => {
                        numeric = false;
                        break;
                    }
                }
            }
            if numeric {
                return ChartSeries { labels, values };
            }
        }
    }
    log_fallback("api_usage", "apiUsage mapping missing, empty, or non-numeric");
    ChartSeries {
        labels: vec![
            "dogs".to_string(),
            "cats".to_string(),
            "clouds".to_string(),
            "people".to_string(),
        ],
        values: vec![3.0, 2.0, 1.0, 2.0],
    }
}

/// Games played per calendar day, in input order.
pub fn per_day_series(dates: &Value) -> ChartSeries {
    if dates.as_array().is_some_and(|a| !a.is_empty()) {
        if let Ok(records) = serde_json::from_value::<Vec<crate::backend::DateCount>>(dates.clone())
        {
            return ChartSeries {
                labels: records.iter().map(|r| r.date.clone()).collect(),
                values: records.iter().map(|r| r.count as f64).collect(),
            };
        }
    }
    log_fallback("per_day", "dates payload missing, empty, or malformed");
    sample_week(Utc::now().date_naive())
}

/// The most recent 7 calendar dates ending `today`, oldest first, with
/// fabricated counts in [0, 9].
fn sample_week(today: NaiveDate) -> ChartSeries {
    let mut rng = rand::thread_rng();
    let mut labels = Vec::with_capacity(7);
    let mut values = Vec::with_capacity(7);
    for back in (0..7).rev() {
        let day = today - chrono::Duration::days(back);
        labels.push(day.format("%Y-%m-%d").to_string());
        values.push(rng.gen_range(0..=9) as f64);
    }
    ChartSeries { labels, values }
}

/// One value per player, in player-list order, per the selected metric.
pub fn per_player_series(players: &Value, scores: &Value, metric: PlayerMetric) -> ChartSeries {
    let list: Option<Vec<PlayerRecord>> = serde_json::from_value(players.clone()).ok();
    match list {
        Some(list) if !list.is_empty() => {
            let scores: Vec<ScoreRecord> =
                serde_json::from_value(scores.clone()).unwrap_or_default();
            let labels = list.iter().map(|p| p.username.clone()).collect();
            let values = match metric {
                PlayerMetric::GamesPlayed => list
                    .iter()
                    .map(|p| scores.iter().filter(|s| s.username == p.username).count() as f64)
                    .collect(),
                PlayerMetric::AverageScore => list
                    .iter()
                    .map(|p| {
                        scores
                            .iter()
                            .find(|s| s.username == p.username)
                            .map(|s| s.average_score)
                            .unwrap_or(0.0)
                    })
                    .collect(),
            };
            ChartSeries { labels, values }
        }
        _ => {
            log_fallback("per_player", "players payload missing, empty, or malformed");
            ChartSeries {
                labels: vec![
                    "Player1".to_string(),
                    "Player2".to_string(),
                    "Player3".to_string(),
                    "Player4".to_string(),
                ],
                values: vec![123.0, 312.0, 412.0, 231.0],
            }
        }
    }
}

/// Suggested y-axis ceiling: 10% headroom over the largest value, never
/// below 5 so sparse charts keep a readable scale.
pub fn player_axis_max(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(1.0_f64, f64::max);
    if max < 5.0 {
        5.0
    } else {
        (max * 1.1).ceil()
    }
}
