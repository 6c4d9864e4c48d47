//! Groups loose report batches into storm events.
//!
//! Reports are walked in time order. Each joins the open storm whose latest
//! report is recent enough and whose running bounds centre is close enough;
//! otherwise it opens a new storm.

use chrono::Duration;

use super::{GeoBounds, HailReport, StormEvent};
use crate::contour::geometry::{LatLng, haversine_km};

/// Limits deciding whether a report belongs to an existing storm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingParams {
    /// Largest gap between a storm's latest report and the next one.
    pub max_gap: Duration,
    /// Largest distance from the storm's bounds centre, in whole km.
    pub max_distance_km: u32,
}

impl Default for GroupingParams {
    fn default() -> Self {
        Self {
            max_gap: Duration::minutes(90),
            max_distance_km: 150,
        }
    }
}

#[derive(Debug)]
struct OpenStorm {
    bounds: GeoBounds,
    latest: chrono::DateTime<chrono::Utc>,
    reports: Vec<HailReport>,
}

/// Splits `reports` into storms tagged with `source`.
///
/// Input order does not matter. Storms are returned in order of their
/// first report.
#[must_use]
pub fn group_reports(
    mut reports: Vec<HailReport>,
    source: &str,
    params: &GroupingParams,
) -> Vec<StormEvent> {
    reports.sort_by_key(HailReport::observed_at);
    let max_distance = f64::from(params.max_distance_km);

    let mut open: Vec<OpenStorm> = Vec::new();
    for report in reports {
        let here = LatLng::new(report.lat(), report.lng());
        let target = open.iter_mut().find(|storm| {
            let (lat, lng) = storm.bounds.center();
            report.observed_at() - storm.latest <= params.max_gap
                && haversine_km(LatLng::new(lat, lng), here) <= max_distance
        });
        match target {
            Some(storm) => {
                storm.bounds.extend(report.lat(), report.lng());
                storm.latest = report.observed_at();
                storm.reports.push(report);
            }
            None => open.push(OpenStorm {
                bounds: GeoBounds::point(report.lat(), report.lng()),
                latest: report.observed_at(),
                reports: vec![report],
            }),
        }
    }

    open.into_iter()
        .filter_map(|storm| {
            let name = storm_name(&storm.reports, &storm.bounds);
            StormEvent::from_reports(name, source, storm.reports)
        })
        .collect()
}

fn storm_name(reports: &[HailReport], bounds: &GeoBounds) -> String {
    let Some(first) = reports.first() else {
        return String::from("Storm");
    };
    let date = first.observed_at().format("%Y-%m-%d");
    if let Some(label) = reports.iter().find_map(HailReport::source_label) {
        return format!("{label} {date}");
    }
    let (lat, lng) = bounds.center();
    format!("Storm {date} ({lat:.2}, {lng:.2})")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(minutes: i64) -> chrono::DateTime<Utc> {
        let Some(t0) = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).single() else {
            panic!("valid timestamp");
        };
        t0 + Duration::minutes(minutes)
    }

    #[test]
    fn nearby_reports_form_one_storm() {
        let reports = vec![
            HailReport::new(35.20, -97.45, 1.0, at(10)),
            HailReport::new(35.22, -97.40, 1.75, at(0)),
            HailReport::new(35.25, -97.35, 2.5, at(30)),
        ];
        let storms = group_reports(reports, "spc", &GroupingParams::default());
        assert_eq!(storms.len(), 1);
        let Some(storm) = storms.first() else {
            panic!("storm expected");
        };
        assert_eq!(storm.reports.len(), 3);
        assert_eq!(storm.started_at, at(0));
        assert_eq!(storm.source, "spc");
        assert!(storm.name.starts_with("Storm 2024-05-01"));
    }

    #[test]
    fn time_gap_splits_storms() {
        let reports = vec![
            HailReport::new(35.20, -97.45, 1.0, at(0)),
            HailReport::new(35.21, -97.44, 1.0, at(300)),
        ];
        let storms = group_reports(reports, "spc", &GroupingParams::default());
        assert_eq!(storms.len(), 2);
    }

    #[test]
    fn distance_splits_storms() {
        let reports = vec![
            HailReport::new(35.20, -97.45, 1.0, at(0)),
            HailReport::new(39.10, -94.60, 1.0, at(5)),
        ];
        let storms = group_reports(reports, "spc", &GroupingParams::default());
        assert_eq!(storms.len(), 2);
    }

    #[test]
    fn source_label_names_storm() {
        let reports = vec![HailReport::new(35.2, -97.4, 1.0, at(0)).with_source("Norman, OK")];
        let storms = group_reports(reports, "lsr", &GroupingParams::default());
        let Some(storm) = storms.first() else {
            panic!("storm expected");
        };
        assert_eq!(storm.name, "Norman, OK 2024-05-01");
    }

    #[test]
    fn empty_input_yields_no_storms() {
        assert!(group_reports(vec![], "spc", &GroupingParams::default()).is_empty());
    }
}
