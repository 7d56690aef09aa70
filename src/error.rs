use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The dataset lacks one or more of the columns the map needs.
    #[error("dataset is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// Blank questions go in `missing`; answers outside the vocabulary go in `unrecognized`.
    #[error("{}", describe_incomplete(missing, unrecognized))]
    IncompleteAnswers {
        missing: Vec<&'static str>,
        unrecognized: Vec<&'static str>,
    },

    #[error("result store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("an authenticated user is required")]
    Unauthenticated,

    #[error("failed to read dataset {path}: {source}")]
    DatasetUnreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

fn describe_incomplete(missing: &[&str], unrecognized: &[&str]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("quiz answers missing for: {}", missing.join(", ")));
    }
    if !unrecognized.is_empty() {
        parts.push(format!(
            "answers must be Agree, Neutral or Disagree for: {}",
            unrecognized.join(", ")
        ));
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_failures_surface_as_store_unavailable() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert!(err.to_string().starts_with("result store unavailable"));
    }

    #[test]
    fn incomplete_answers_name_each_problem() {
        let err = AppError::IncompleteAnswers {
            missing: vec!["q2"],
            unrecognized: vec!["q4"],
        };
        assert_eq!(
            err.to_string(),
            "quiz answers missing for: q2; answers must be Agree, Neutral or Disagree for: q4"
        );
    }
}
