use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::EventRecord;

/// Columns the marker map cannot do without.
pub const GEO_COLUMNS: [&str; 3] = ["Location_Lat", "Location_Long", "Crowd_Density"];

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<EventRecord>,
    pub missing_geo_columns: Vec<String>,
}

impl Dataset {
    /// Fails with `MissingColumns` when the source had no geospatial columns.
    pub fn require_geo_columns(&self) -> AppResult<()> {
        if self.missing_geo_columns.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingColumns {
                missing: self.missing_geo_columns.clone(),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Timestamp", default)]
    timestamp: Option<String>,
    #[serde(rename = "Location_Lat", default)]
    latitude: Option<String>,
    #[serde(rename = "Location_Long", default)]
    longitude: Option<String>,
    #[serde(rename = "Crowd_Density", default)]
    crowd_density: Option<String>,
    #[serde(rename = "Stress_Level", default)]
    stress_level: Option<String>,
    #[serde(rename = "Activity_Type", default)]
    activity_type: Option<String>,
    #[serde(rename = "Incident_Type", default)]
    incident_type: Option<String>,
    #[serde(rename = "Queue_Time_minutes", default)]
    queue_time_minutes: Option<String>,
    #[serde(rename = "Satisfaction_Rating", default)]
    satisfaction_rating: Option<String>,
    #[serde(rename = "AR_Navigation_Success", default)]
    navigation_success: Option<String>,
    #[serde(rename = "Health_Condition", default)]
    health_condition: Option<String>,
    #[serde(rename = "Temperature", default)]
    temperature: Option<String>,
    #[serde(rename = "Time_Spent_at_Location_minutes", default)]
    time_spent_minutes: Option<String>,
    #[serde(rename = "Age_Group", default)]
    age_group: Option<String>,
    #[serde(rename = "Nationality", default)]
    nationality: Option<String>,
}

pub fn load_dataset(path: &Path) -> AppResult<Dataset> {
    let file = std::fs::File::open(path)?;
    let dataset = read_dataset(file).map_err(|err| match err {
        AppError::DatasetUnreadable { source, .. } => AppError::DatasetUnreadable {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    tracing::info!(
        path = %path.display(),
        records = dataset.records.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Parses CSV rows permissively: unparseable cells become `None` and rows
/// the reader cannot decode at all are skipped.
pub fn read_dataset<R: Read>(source: R) -> AppResult<Dataset> {
    let unreadable = |source| AppError::DatasetUnreadable {
        path: Default::default(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let headers = reader.headers().map_err(unreadable)?.clone();
    let missing_geo_columns: Vec<String> = GEO_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing_geo_columns.is_empty() {
        tracing::warn!(missing = ?missing_geo_columns, "dataset has no geospatial columns");
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut bad_timestamps = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                tracing::debug!(error = %err, "skipping undecodable row");
                skipped += 1;
                continue;
            }
        };

        let raw_timestamp = text(row.timestamp);
        let timestamp = raw_timestamp.as_deref().and_then(parse_timestamp);
        if raw_timestamp.is_some() && timestamp.is_none() {
            bad_timestamps += 1;
        }

        records.push(EventRecord {
            timestamp,
            latitude: number(row.latitude),
            longitude: number(row.longitude),
            crowd_density: text(row.crowd_density),
            stress_level: text(row.stress_level),
            activity_type: text(row.activity_type),
            incident_type: text(row.incident_type),
            queue_time_minutes: number(row.queue_time_minutes),
            satisfaction_rating: number(row.satisfaction_rating),
            navigation_success: text(row.navigation_success),
            health_condition: text(row.health_condition),
            temperature: number(row.temperature),
            time_spent_minutes: number(row.time_spent_minutes),
            age_group: text(row.age_group),
            nationality: text(row.nationality),
        });
    }

    if skipped > 0 || bad_timestamps > 0 {
        tracing::debug!(skipped, bad_timestamps, "permissive parse summary");
    }

    Ok(Dataset {
        records,
        missing_geo_columns,
    })
}

/// Trims and capitalizes a categorical value (`" low "` -> `"Low"`).
///
/// Every consumer of density, stress and navigation flags goes through here
/// so the charts and the map agree on bucket names.
pub fn normalize_category(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let mut normalized: String = first.to_uppercase().collect();
    normalized.push_str(&chars.as_str().to_lowercase());
    Some(normalized)
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Cell values read as missing, matching the usual CSV tooling defaults.
const NULL_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    NULL_TOKENS.iter().any(|token| *token == trimmed)
}

fn text(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_null_token(v))
}

fn number(value: Option<String>) -> Option<f64> {
    text(value)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Timestamp,Location_Lat,Location_Long,Crowd_Density,Stress_Level,Activity_Type,Incident_Type,Queue_Time_minutes,Satisfaction_Rating,AR_Navigation_Success,Health_Condition,Temperature,Time_Spent_at_Location_minutes,Age_Group,Nationality";

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_category(" low "), Some("Low".to_string()));
        assert_eq!(normalize_category("MEDIUM"), Some("Medium".to_string()));
        assert_eq!(normalize_category("High"), Some("High".to_string()));
        assert_eq!(normalize_category("   "), None);
    }

    #[test]
    fn parses_common_timestamp_shapes() {
        assert!(parse_timestamp("2024-06-14 08:30:00").is_some());
        assert!(parse_timestamp("2024-06-14T08:30:00").is_some());
        assert!(parse_timestamp("2024-06-14T08:30:00+03:00").is_some());
        assert!(parse_timestamp("06/14/2024 08:30").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn malformed_cells_degrade_to_none() {
        let csv = format!(
            "{HEADER}\n\
             garbage,21.42,39.82,High,Low,Tawaf,,12,4,Yes,,38.5,45,18-30,Egypt\n\
             2024-06-14 08:30:00,abc,39.82,Low,High,Sa'i,Fall,n/a,5,No,Asthma,40,30,31-45,India\n"
        );
        let dataset = read_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records.len(), 2);
        assert!(dataset.missing_geo_columns.is_empty());

        let first = &dataset.records[0];
        assert_eq!(first.timestamp, None);
        assert_eq!(first.latitude, Some(21.42));
        assert_eq!(first.incident_type, None);

        let second = &dataset.records[1];
        assert_eq!(second.hour(), Some(8));
        assert_eq!(second.latitude, None);
        assert_eq!(second.queue_time_minutes, None);
        assert_eq!(second.health_condition.as_deref(), Some("Asthma"));
    }

    #[test]
    fn null_markers_are_read_as_missing() {
        let csv = format!(
            "{HEADER}\n\
             2024-06-14 09:10:00,21.42,39.82,High,Low,Tawaf,NA,NaN,4,Yes,N/A,38.5,45,18-30,Egypt\n\
             2024-06-14 09:40:00,21.42,39.82,High,Low,Tawaf,null,12,4,Yes,nan,38.5,45,None,Egypt\n"
        );
        let dataset = read_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records.len(), 2);
        for record in &dataset.records {
            assert_eq!(record.incident_type, None);
            assert_eq!(record.health_condition, None);
        }
        assert_eq!(dataset.records[0].queue_time_minutes, None);
        assert_eq!(dataset.records[1].age_group, None);

        let charts = crate::charts::build_charts(&dataset.records, None);
        assert!(charts.incidents_by_hour.is_empty());
        assert!(charts.health_bubbles.is_empty());
        assert!(charts.demographics.is_empty());
    }

    #[test]
    fn null_token_check_trims() {
        assert!(is_null_token(" NA "));
        assert!(is_null_token("None"));
        assert!(!is_null_token("Asthma"));
        assert!(!is_null_token("na"));
    }

    #[test]
    fn records_missing_geo_columns_without_failing() {
        let csv = "Timestamp,Stress_Level\n2024-01-02 10:00:00,High\n";
        let dataset = read_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.missing_geo_columns.len(), 3);
        assert!(matches!(
            dataset.require_geo_columns(),
            Err(AppError::MissingColumns { .. })
        ));
    }

    #[test]
    fn loads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(
            file,
            "2024-02-01 14:00:00,21.42,39.82,medium,Moderate,Prayer,,20,3,Yes,,35,60,46-60,Pakistan"
        )
        .unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].month_name(), Some("February"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_dataset(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
