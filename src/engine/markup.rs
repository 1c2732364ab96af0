use crate::data_types::workout::{Workout, WorkoutKind};

pub struct Markup;

impl Markup {
    /// List entry for `workout`, generated from the structured data only.
    pub fn workout_entry(workout: &Workout) -> String {
        let workout_type = workout.workout_type();

        let mut html = format!(
            r#"<li class="workout workout--{kind}" data-id="{id}">
  <span class="close__btn">&times;</span>
  <span class="edit__btn">&#9998;</span>
  <h2 class="workout__title">{description}</h2>
"#,
            kind = workout_type,
            id = workout.id,
            description = workout.description,
        );

        html.push_str(&Markup::detail(
            workout_type.emoji(),
            "distance",
            workout.distance,
            "km",
        ));
        html.push_str(&Markup::detail("⏱", "duration", workout.duration, "min"));

        match workout.kind {
            WorkoutKind::Running { cadence, pace } => {
                html.push_str(&Markup::detail("🦶🏼", "cadence", cadence, "spm"));
                html.push_str(&Markup::detail("⚡️", "pace", pace.trunc(), "min/km"));
            }
            WorkoutKind::Cycling {
                elevation_gain,
                speed,
            } => {
                html.push_str(&Markup::detail("⛰", "elevationGain", elevation_gain, "m"));
                html.push_str(&Markup::detail("⚡️", "speed", speed.trunc(), "km/h"));
            }
        }

        html.push_str("</li>\n");
        html
    }

    fn detail(icon: &str, field: &str, value: f64, unit: &str) -> String {
        format!(
            r#"  <div class="workout__details">
    <span class="workout__icon">{icon}</span>
    <span class="workout__value {field}__value">{value}</span>
    <span class="workout__unit">{unit}</span>
  </div>
"#
        )
    }
}
