use std::collections::BTreeMap;

use crate::dataset::normalize_category;
use crate::models::{
    BoxSummary, CategoryCount, ChartSet, DemographicCount, DensityBreakdown, DensityLevel,
    EventRecord, HealthBubble, HourCount, HourlyActivity, SplitDistribution,
};

/// Builds every analytics chart, optionally restricted to one month.
///
/// The month filter is an exact match on the full month name. A blank filter
/// means no filter; one that matches nothing produces an empty chart set.
pub fn build_charts(records: &[EventRecord], month: Option<&str>) -> ChartSet {
    let month = month.map(str::trim).filter(|name| !name.is_empty());
    let selected: Vec<&EventRecord> = match month {
        Some(name) => records
            .iter()
            .filter(|record| record.month_name() == Some(name))
            .collect(),
        None => records.iter().collect(),
    };

    tracing::debug!(
        total = records.len(),
        selected = selected.len(),
        month = month.unwrap_or("all"),
        "building charts"
    );

    let (queue_time_by_navigation, satisfaction_by_navigation) = navigation_distributions(&selected);

    ChartSet {
        month: month.map(str::to_string),
        density_stress: density_stress(&selected),
        hourly_activity: hourly_activity(&selected),
        incidents_by_hour: incidents_by_hour(&selected),
        queue_time_by_navigation,
        satisfaction_by_navigation,
        health_bubbles: health_bubbles(&selected),
        demographics: demographics(&selected),
    }
}

/// Month names present in the records, in calendar order.
pub fn available_months(records: &[EventRecord]) -> Vec<String> {
    let months: BTreeMap<u32, &'static str> = records
        .iter()
        .filter_map(|record| Some((record.month_number()?, record.month_name()?)))
        .collect();
    months.into_values().map(str::to_string).collect()
}

fn density_stress(records: &[&EventRecord]) -> Vec<DensityBreakdown> {
    let mut buckets: BTreeMap<DensityLevel, BTreeMap<String, usize>> = DensityLevel::ALL
        .into_iter()
        .map(|level| (level, BTreeMap::new()))
        .collect();

    for record in records {
        let density = record
            .crowd_density
            .as_deref()
            .and_then(normalize_category)
            .and_then(|d| DensityLevel::from_label(&d));
        let stress = record.stress_level.as_deref().and_then(normalize_category);
        let (Some(density), Some(stress)) = (density, stress) else {
            continue;
        };
        if let Some(bucket) = buckets.get_mut(&density) {
            *bucket.entry(stress).or_insert(0) += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(density, counts)| {
            let mut stress_counts: Vec<CategoryCount> = counts
                .into_iter()
                .map(|(label, count)| CategoryCount { label, count })
                .collect();
            stress_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
            DensityBreakdown {
                density,
                stress_counts,
            }
        })
        .collect()
}

fn hourly_activity(records: &[&EventRecord]) -> Vec<HourlyActivity> {
    let mut groups: BTreeMap<(u32, String), usize> = BTreeMap::new();
    for record in records {
        let (Some(hour), Some(activity)) = (record.hour(), record.activity_type.as_ref()) else {
            continue;
        };
        *groups.entry((hour, activity.clone())).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((hour, activity_type), count)| HourlyActivity {
            hour,
            activity_type,
            count,
        })
        .collect()
}

fn incidents_by_hour(records: &[&EventRecord]) -> Vec<HourCount> {
    let mut groups: BTreeMap<u32, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| r.incident_type.is_some()) {
        if let Some(hour) = record.hour() {
            *groups.entry(hour).or_insert(0) += 1;
        }
    }

    groups
        .into_iter()
        .map(|(hour, count)| HourCount { hour, count })
        .collect()
}

fn navigation_distributions(
    records: &[&EventRecord],
) -> (Vec<SplitDistribution>, Vec<SplitDistribution>) {
    let mut queue: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut satisfaction: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for record in records {
        let flag = record.navigation_success.as_deref().and_then(normalize_category);
        let (Some(queue_time), Some(rating), Some(flag)) =
            (record.queue_time_minutes, record.satisfaction_rating, flag)
        else {
            continue;
        };
        queue.entry(flag.clone()).or_default().push(queue_time);
        satisfaction.entry(flag).or_default().push(rating);
    }

    (into_splits(queue), into_splits(satisfaction))
}

fn into_splits(groups: BTreeMap<String, Vec<f64>>) -> Vec<SplitDistribution> {
    groups
        .into_iter()
        .map(|(navigation_success, values)| SplitDistribution {
            summary: box_summary(&values),
            navigation_success,
            values,
        })
        .collect()
}

/// Five-number summary with linearly interpolated quartiles.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Some(BoxSummary {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

fn health_bubbles(records: &[&EventRecord]) -> Vec<HealthBubble> {
    let mut rows: Vec<(&str, f64, Option<f64>)> = records
        .iter()
        .filter_map(|record| {
            Some((
                record.health_condition.as_deref()?,
                record.temperature?,
                record.time_spent_minutes,
            ))
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.total_cmp(&b.1)));

    let mut bubbles: Vec<HealthBubble> = Vec::new();
    let mut time_totals: Vec<(f64, usize)> = Vec::new();

    for (condition, temperature, time_spent) in rows {
        let same_group = bubbles.last().is_some_and(|last| {
            last.health_condition == condition && last.temperature.total_cmp(&temperature).is_eq()
        });
        if !same_group {
            bubbles.push(HealthBubble {
                health_condition: condition.to_string(),
                temperature,
                mean_time_spent_minutes: None,
                incident_count: 0,
            });
            time_totals.push((0.0, 0));
        }
        if let (Some(bubble), Some(totals)) = (bubbles.last_mut(), time_totals.last_mut()) {
            bubble.incident_count += 1;
            if let Some(minutes) = time_spent {
                totals.0 += minutes;
                totals.1 += 1;
            }
        }
    }

    for (bubble, (sum, count)) in bubbles.iter_mut().zip(time_totals) {
        if count > 0 {
            bubble.mean_time_spent_minutes = Some(sum / count as f64);
        }
    }

    bubbles
}

fn demographics(records: &[&EventRecord]) -> Vec<DemographicCount> {
    let mut groups: BTreeMap<(String, String, String), usize> = BTreeMap::new();
    for record in records {
        let (Some(age), Some(nationality), Some(health)) = (
            record.age_group.as_ref(),
            record.nationality.as_ref(),
            record.health_condition.as_ref(),
        ) else {
            continue;
        };
        *groups
            .entry((age.clone(), nationality.clone(), health.clone()))
            .or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((age_group, nationality, health_condition), count)| DemographicCount {
            age_group,
            nationality,
            health_condition,
            count,
        })
        .collect()
}
