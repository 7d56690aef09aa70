use std::fmt::Write;

use crate::models::{ChartSet, SplitDistribution};

pub fn build_report(charts: &ChartSet, months: &[String], record_count: usize) -> String {
    let mut output = String::new();
    let month_label = charts.month.as_deref().unwrap_or("all months");

    let _ = writeln!(output, "# Crowd Analytics Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} records loaded)",
        month_label, record_count
    );
    if !months.is_empty() {
        let _ = writeln!(output, "Available months: {}", months.join(", "));
    }
    let _ = writeln!(output);

    if charts.is_empty() {
        let _ = writeln!(output, "No records for this selection.");
        return output;
    }

    let _ = writeln!(output, "## Stress Level by Crowd Density");
    for bucket in &charts.density_stress {
        if bucket.stress_counts.is_empty() {
            let _ = writeln!(output, "- {}: no readings", bucket.density.as_str());
            continue;
        }
        let parts: Vec<String> = bucket
            .stress_counts
            .iter()
            .map(|c| format!("{} {}", c.label, c.count))
            .collect();
        let _ = writeln!(output, "- {}: {}", bucket.density.as_str(), parts.join(", "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Busiest Hours");
    let mut hourly = [0usize; 24];
    for row in &charts.hourly_activity {
        if let Some(slot) = hourly.get_mut(row.hour as usize) {
            *slot += row.count;
        }
    }
    let mut busiest: Vec<(usize, usize)> = hourly
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .collect();
    busiest.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if busiest.is_empty() {
        let _ = writeln!(output, "No timestamped activity.");
    }
    for (hour, count) in busiest.iter().take(5) {
        let _ = writeln!(output, "- {:02}:00 with {} records", hour, count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Incidents by Hour");
    if charts.incidents_by_hour.is_empty() {
        let _ = writeln!(output, "No incidents recorded.");
    }
    for row in &charts.incidents_by_hour {
        let _ = writeln!(output, "- {:02}:00: {}", row.hour, row.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Queue Time by Navigation Success");
    write_splits(&mut output, &charts.queue_time_by_navigation, "min");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Satisfaction by Navigation Success");
    write_splits(&mut output, &charts.satisfaction_by_navigation, "");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Health Incidents vs Temperature");
    let mut bubbles = charts.health_bubbles.clone();
    bubbles.sort_by(|a, b| b.incident_count.cmp(&a.incident_count));
    if bubbles.is_empty() {
        let _ = writeln!(output, "No health conditions recorded.");
    }
    for bubble in bubbles.iter().take(10) {
        let mean = bubble
            .mean_time_spent_minutes
            .map(|m| format!("{m:.1} min avg stay"))
            .unwrap_or_else(|| "no stay data".to_string());
        let _ = writeln!(
            output,
            "- {} at {:.1}°: {} incidents, {}",
            bubble.health_condition, bubble.temperature, bubble.incident_count, mean
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Age Group and Health by Nationality");
    if charts.demographics.is_empty() {
        let _ = writeln!(output, "No demographic data.");
    }
    for row in &charts.demographics {
        let _ = writeln!(
            output,
            "- {} / {} / {}: {}",
            row.nationality, row.age_group, row.health_condition, row.count
        );
    }

    output
}

fn write_splits(output: &mut String, splits: &[SplitDistribution], unit: &str) {
    if splits.is_empty() {
        let _ = writeln!(output, "No complete navigation readings.");
        return;
    }
    for split in splits {
        match split.summary {
            Some(s) => {
                let _ = writeln!(
                    output,
                    "- {}: median {:.1}{} (min {:.1}, q1 {:.1}, q3 {:.1}, max {:.1}, n={})",
                    split.navigation_success,
                    s.median,
                    if unit.is_empty() { String::new() } else { format!(" {unit}") },
                    s.min,
                    s.q1,
                    s.q3,
                    s.max,
                    split.values.len()
                );
            }
            None => {
                let _ = writeln!(output, "- {}: no values", split.navigation_success);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::build_charts;
    use crate::models::EventRecord;
    use chrono::NaiveDate;

    fn record(hour: u32, incident: Option<&str>) -> EventRecord {
        EventRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 4, 2).and_then(|d| d.and_hms_opt(hour, 0, 0)),
            crowd_density: Some("high".to_string()),
            stress_level: Some("High".to_string()),
            activity_type: Some("Tawaf".to_string()),
            incident_type: incident.map(str::to_string),
            queue_time_minutes: Some(12.0),
            satisfaction_rating: Some(3.0),
            navigation_success: Some("Yes".to_string()),
            ..EventRecord::default()
        }
    }

    #[test]
    fn empty_selection_renders_placeholder() {
        let charts = build_charts(&[], Some("May"));
        let report = build_report(&charts, &[], 0);
        assert!(report.contains("Generated for May (0 records loaded)"));
        assert!(report.contains("No records for this selection."));
    }

    #[test]
    fn report_lists_each_section() {
        let records = vec![record(9, None), record(9, Some("Fall")), record(17, None)];
        let charts = build_charts(&records, None);
        let report = build_report(&charts, &["April".to_string()], records.len());

        assert!(report.contains("Available months: April"));
        assert!(report.contains("- High: High 3"));
        assert!(report.contains("- Low: no readings"));
        assert!(report.contains("- 09:00 with 2 records"));
        assert!(report.contains("- 09:00: 1"));
        assert!(report.contains("- Yes: median 12.0 min"));
        assert!(report.contains("No health conditions recorded."));
    }
}
