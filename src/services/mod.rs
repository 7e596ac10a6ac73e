pub mod tonnage;
pub mod workouts;

pub use tonnage::{tonnage_report, Bucket, ReportError, TonnageBucket};
pub use workouts::{group_by_exercise, ExerciseSets};
