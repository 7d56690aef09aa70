use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::models::{Answer, Label, QuizAnswers};

const QUESTIONS: [&str; 5] = ["q1", "q2", "q3", "q4", "q5"];

/// Validates five raw form answers. Absent or blank answers are reported as
/// missing, anything outside the vocabulary as unrecognized.
pub fn parse_answers(raw: [Option<&str>; 5]) -> AppResult<QuizAnswers> {
    let parsed: Vec<Option<Answer>> = raw.iter().map(|a| a.and_then(Answer::parse)).collect();
    let mut missing = Vec::new();
    let mut unrecognized = Vec::new();
    for ((question, answer), raw_answer) in QUESTIONS.iter().zip(&parsed).zip(raw) {
        if answer.is_some() {
            continue;
        }
        match raw_answer.map(str::trim) {
            Some(text) if !text.is_empty() => unrecognized.push(*question),
            _ => missing.push(*question),
        }
    }

    match parsed.as_slice() {
        [Some(q1), Some(q2), Some(q3), Some(q4), Some(q5)] => Ok(QuizAnswers {
            q1: *q1,
            q2: *q2,
            q3: *q3,
            q4: *q4,
            q5: *q5,
        }),
        _ => Err(AppError::IncompleteAnswers {
            missing,
            unrecognized,
        }),
    }
}

/// Points per label. Every rule applies independently.
pub fn tally(answers: &QuizAnswers) -> BTreeMap<Label, u32> {
    let mut points: BTreeMap<Label, u32> = Label::ALL.into_iter().map(|l| (l, 0)).collect();
    let mut add = |label: Label, value: u32| {
        if let Some(total) = points.get_mut(&label) {
            *total += value;
        }
    };

    if answers.q3 == Answer::Agree {
        add(Label::Strategist, 2);
    }
    if answers.q1 == Answer::Agree {
        add(Label::Responder, 1);
        add(Label::Explorer, 1);
    }
    if answers.q4 == Answer::Agree {
        add(Label::Follower, 2);
    }
    if answers.q5 == Answer::Agree {
        add(Label::Observer, 2);
    }
    if answers.q2 == Answer::Disagree {
        add(Label::Responder, 2);
    }
    if answers.q2 == Answer::Agree {
        add(Label::Observer, 1);
    }
    if answers.q1 == Answer::Disagree {
        add(Label::Follower, 1);
    }
    if answers.q3 == Answer::Disagree {
        add(Label::Explorer, 1);
    }

    points
}

/// Highest-scoring label; ties go to the label declared first in `Label::ALL`.
pub fn score(answers: &QuizAnswers) -> Label {
    let points = tally(answers);
    let mut best = Label::ALL[0];
    let mut best_points = 0;
    for label in Label::ALL {
        let value = points.get(&label).copied().unwrap_or(0);
        if value > best_points {
            best = label;
            best_points = value;
        }
    }
    best
}

pub fn score_raw(raw: [Option<&str>; 5]) -> AppResult<Label> {
    parse_answers(raw).map(|answers| score(&answers))
}
