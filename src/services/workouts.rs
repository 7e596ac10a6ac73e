use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::SetLog;

/// Sets of one exercise inside a workout session
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSets {
    pub exercise_id: Uuid,
    pub first_performed_at: DateTime<Utc>,
    pub sets: Vec<SetLog>,
}

/// Group a session's sets per exercise.
///
/// Exercises are ordered by when they were first performed (ties by id) and
/// the sets of each exercise by set number.
pub fn group_by_exercise(sets: Vec<SetLog>) -> Vec<ExerciseSets> {
    let mut groups: HashMap<Uuid, Vec<SetLog>> = HashMap::new();
    for set in sets {
        groups.entry(set.exercise_id).or_default().push(set);
    }

    let mut exercises: Vec<ExerciseSets> = groups
        .into_iter()
        .filter_map(|(exercise_id, mut sets)| {
            sets.sort_by_key(|set| set.set_number);
            let first_performed_at = sets.iter().map(|set| set.performed_at).min()?;
            Some(ExerciseSets {
                exercise_id,
                first_performed_at,
                sets,
            })
        })
        .collect();

    exercises.sort_by_key(|group| (group.first_performed_at, group.exercise_id));
    exercises
}
