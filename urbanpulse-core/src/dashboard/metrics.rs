//! Before/after comparison of the metrics returned by a simulation.

use std::fmt;
use urbanpulse_schemas::simulation::{SimulationMetrics, SimulationResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Styling of a delta: rising pollution/congestion is bad, falling is good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendStyle {
    Red,
    Green,
    Gray,
}

impl Trend {
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Trend::Up
        } else if delta < 0.0 {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Neutral => "",
        }
    }

    pub fn style(self) -> TrendStyle {
        match self {
            Trend::Up => TrendStyle::Red,
            Trend::Down => TrendStyle::Green,
            Trend::Neutral => TrendStyle::Gray,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    pub trend: Trend,
    /// Absolute change, already formatted.
    pub magnitude: String,
}

impl Delta {
    pub fn between(before: f64, after: f64, decimals: usize) -> Self {
        let d = after - before;
        Self {
            trend: Trend::of(d),
            magnitude: format!("{:.*}", decimals, d.abs()),
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trend {
            Trend::Neutral => f.write_str("0"),
            trend => write!(f, "{} {}", trend.indicator(), self.magnitude),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Congestion,
    VehicleCount,
    Pm25,
    Aqi,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Congestion,
        MetricKind::VehicleCount,
        MetricKind::Pm25,
        MetricKind::Aqi,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Congestion => "Congestion",
            MetricKind::VehicleCount => "Vehicle Count",
            MetricKind::Pm25 => "PM2.5 (µg/m³)",
            MetricKind::Aqi => "Air Quality Index",
        }
    }

    pub fn value(self, metrics: &SimulationMetrics) -> f64 {
        match self {
            MetricKind::Congestion => metrics.congestion,
            MetricKind::VehicleCount => metrics.total_vehicle_count,
            MetricKind::Pm25 => metrics.pm25,
            MetricKind::Aqi => metrics.aqi,
        }
    }

    fn delta_decimals(self) -> usize {
        match self {
            MetricKind::VehicleCount => 0,
            _ => 2,
        }
    }

    fn format(self, metrics: &SimulationMetrics) -> String {
        let v = self.value(metrics);
        match self {
            MetricKind::Congestion => format!("{:.3}", v),
            MetricKind::VehicleCount => format!("{:.0}", v),
            MetricKind::Pm25 => format!("{:.2}", v),
            MetricKind::Aqi => format!("{:.0} ({})", v, metrics.aqi_category),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub kind: MetricKind,
    pub before: f64,
    pub after: f64,
    pub before_text: String,
    pub after_text: String,
    pub delta: Delta,
}

impl MetricRow {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    pub reduction_pct: f64,
    pub rows: Vec<MetricRow>,
}

impl MetricsTable {
    pub fn from_response(response: &SimulationResponse) -> Self {
        let before = &response.baseline;
        let after = &response.simulated.metrics;
        let rows = MetricKind::ALL
            .iter()
            .map(|&kind| MetricRow {
                kind,
                before: kind.value(before),
                after: kind.value(after),
                before_text: kind.format(before),
                after_text: kind.format(after),
                delta: Delta::between(kind.value(before), kind.value(after), kind.delta_decimals()),
            })
            .collect();

        Self {
            reduction_pct: response.simulated.reduce_vehicles_pct,
            rows,
        }
    }

    pub fn row(&self, kind: MetricKind) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urbanpulse_schemas::simulation::SimulatedMetrics;

    fn response(before: SimulationMetrics, after: SimulationMetrics) -> SimulationResponse {
        SimulationResponse {
            baseline: before,
            simulated: SimulatedMetrics {
                metrics: after,
                reduce_vehicles_pct: 30.0,
            },
        }
    }

    fn metrics(congestion: f64, vehicles: f64, pm25: f64, aqi: f64, category: &str) -> SimulationMetrics {
        SimulationMetrics {
            congestion,
            total_vehicle_count: vehicles,
            pm25,
            aqi,
            aqi_category: category.to_string(),
        }
    }

    #[test]
    fn congestion_drop_renders_down_green_delta() {
        let table = MetricsTable::from_response(&response(
            metrics(0.5, 320.0, 16.0, 59.0, "Moderate"),
            metrics(0.3, 224.0, 11.2, 47.0, "Good"),
        ));
        let row = table.row(MetricKind::Congestion).unwrap();
        assert_eq!(row.delta.magnitude, "0.20");
        assert_eq!(row.delta.trend, Trend::Down);
        assert_eq!(row.delta.trend.style(), TrendStyle::Green);
        assert_eq!(row.delta.to_string(), "↓ 0.20");
        assert_eq!(row.before_text, "0.500");
        assert_eq!(row.after_text, "0.300");
        assert_eq!(table.reduction_pct, 30.0);
    }

    #[test]
    fn vehicle_count_delta_has_no_decimals() {
        let table = MetricsTable::from_response(&response(
            metrics(0.5, 320.0, 16.0, 59.0, "Moderate"),
            metrics(0.3, 224.4, 11.2, 47.0, "Good"),
        ));
        let row = table.row(MetricKind::VehicleCount).unwrap();
        assert_eq!(row.delta.magnitude, "96");
        assert_eq!(row.after_text, "224");
    }

    #[test]
    fn increase_renders_up_red_delta() {
        let table = MetricsTable::from_response(&response(
            metrics(0.2, 100.0, 5.0, 21.0, "Good"),
            metrics(0.2, 100.0, 7.5, 31.0, "Good"),
        ));
        let pm = table.row(MetricKind::Pm25).unwrap();
        assert_eq!(pm.delta.trend, Trend::Up);
        assert_eq!(pm.delta.trend.style(), TrendStyle::Red);
        assert_eq!(pm.delta.to_string(), "↑ 2.50");
    }

    #[test]
    fn equal_values_render_neutral_zero() {
        let table = MetricsTable::from_response(&response(
            metrics(0.2, 100.0, 5.0, 21.0, "Good"),
            metrics(0.2, 100.0, 5.0, 21.0, "Good"),
        ));
        for row in &table.rows {
            assert_eq!(row.delta.trend, Trend::Neutral);
            assert_eq!(row.delta.trend.style(), TrendStyle::Gray);
            assert_eq!(row.delta.to_string(), "0");
        }
    }

    #[test]
    fn aqi_is_shown_with_each_snapshots_category() {
        let table = MetricsTable::from_response(&response(
            metrics(0.5, 320.0, 16.0, 59.0, "Moderate"),
            metrics(0.3, 224.0, 11.2, 47.0, "Good"),
        ));
        let aqi = table.row(MetricKind::Aqi).unwrap();
        assert_eq!(aqi.before_text, "59 (Moderate)");
        assert_eq!(aqi.after_text, "47 (Good)");
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[2].label(), "PM2.5 (µg/m³)");
    }
}
