use crate::domain::ids::{IdProvider, default_id_provider};
use crate::domain::models::{
    ExerciseSet, ExerciseUpdate, Program, SetUpdate, Workout, WorkoutExercise,
};

/// Order-preserving, last-write-wins record of exercises whose local state
/// has diverged from the last known persisted state. Re-upserting an id
/// replaces the snapshot in place, keeping its original position.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    entries: Vec<WorkoutExercise>,
}

impl ChangeSet {
    pub fn upsert(&mut self, exercise: WorkoutExercise) {
        match self.entries.iter_mut().find(|entry| entry.id == exercise.id) {
            Some(slot) => *slot = exercise,
            None => self.entries.push(exercise),
        }
    }

    pub fn remove(&mut self, exercise_id: &str) {
        self.entries.retain(|entry| entry.id != exercise_id);
    }

    pub fn remove_workout(&mut self, workout_number: u32) {
        self.entries.retain(|entry| entry.workout_number != workout_number);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[WorkoutExercise] {
        &self.entries
    }
}

/// The in-memory draft of the program being authored: the single source of
/// truth for one week's workouts, the dirty set, and the three copy/paste
/// clipboards.
///
/// All mutations are synchronous and atomic; anything that changes
/// server-visible exercise state upserts the latest snapshot into the dirty
/// set. Mutations targeting an id that is not loaded are silent no-ops.
/// Holding at most one week in memory is a load boundary: replacing the
/// week never touches the dirty set.
pub struct EditSession {
    program: Option<Program>,
    current_week: u32,
    workouts: Vec<Workout>,
    changes: ChangeSet,
    copied_exercise: Option<WorkoutExercise>,
    copied_workout: Option<Workout>,
    copied_week: Option<Vec<Workout>>,
    id_provider: IdProvider,
}

impl EditSession {
    pub fn new(program: Program) -> Self {
        Self {
            program: Some(program),
            current_week: 1,
            workouts: Vec::new(),
            changes: ChangeSet::default(),
            copied_exercise: None,
            copied_workout: None,
            copied_week: None,
            id_provider: default_id_provider(),
        }
    }

    pub fn with_id_provider(mut self, id_provider: IdProvider) -> Self {
        self.id_provider = id_provider;
        self
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn set_program(&mut self, program: Program) {
        self.program = Some(program);
    }

    pub fn current_week(&self) -> u32 {
        self.current_week
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn workout(&self, workout_number: u32) -> Option<&Workout> {
        self.workouts
            .iter()
            .find(|workout| workout.workout_number == workout_number)
    }

    pub fn exercise(&self, exercise_id: &str) -> Option<&WorkoutExercise> {
        self.workouts
            .iter()
            .flat_map(|workout| workout.exercises.iter())
            .find(|exercise| exercise.id == exercise_id)
    }

    /// Replaces the in-memory workouts with a remote snapshot. A load
    /// boundary, not a mutation: the dirty set is left untouched.
    pub fn replace_week(&mut self, week: u32, workouts: Vec<Workout>) {
        self.current_week = week;
        self.workouts = workouts;
    }

    /// Raises the program's workout counter to `number` if it is higher,
    /// used when the server confirms a batch save.
    pub fn reconcile_last_workout_number(&mut self, number: u32) {
        if let Some(program) = self.program.as_mut() {
            if number > program.last_workout_number {
                program.last_workout_number = number;
            }
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// The dirty set in insertion order, one latest snapshot per exercise.
    pub fn changed_exercises(&self) -> Vec<WorkoutExercise> {
        self.changes.entries().to_vec()
    }

    /// Empties the dirty set without discarding data; called after a
    /// confirmed save.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    /// Resets the whole session: program, week, workouts, clipboards and
    /// dirty set. Used when authoring is finished or abandoned.
    pub fn clear(&mut self) {
        self.program = None;
        self.current_week = 1;
        self.workouts.clear();
        self.changes.clear();
        self.copied_exercise = None;
        self.copied_workout = None;
        self.copied_week = None;
    }

    /// Creates a workout with one exercise per supplied catalog id, each
    /// with a single default set. Allocates the next workout number and
    /// bumps the program counter atomically with the mutation. Returns the
    /// allocated number (0 when the session holds no program).
    pub fn add_workout(&mut self, week: u32, exercise_ids: &[String]) -> u32 {
        let Some(program) = self.program.as_mut() else {
            return 0;
        };
        let workout_number = program.last_workout_number + 1;
        program.last_workout_number = workout_number;
        let program_id = program.id.clone();

        let exercises: Vec<WorkoutExercise> = exercise_ids
            .iter()
            .enumerate()
            .map(|(index, catalog_id)| {
                WorkoutExercise::with_default_set(
                    (self.id_provider)(),
                    &program_id,
                    week,
                    workout_number,
                    index as u32 + 1,
                    catalog_id,
                )
            })
            .collect();

        for exercise in &exercises {
            self.changes.upsert(exercise.clone());
        }
        self.workouts.push(Workout {
            workout_number,
            exercises,
        });
        workout_number
    }

    pub fn add_exercise(&mut self, workout_number: u32, week: u32, exercise_id: &str) {
        self.add_multiple_exercises(workout_number, week, &[exercise_id.to_string()]);
    }

    /// Appends one exercise per catalog id at the next dense order values
    /// of the target workout.
    pub fn add_multiple_exercises(&mut self, workout_number: u32, week: u32, exercise_ids: &[String]) {
        let Some(program_id) = self.program.as_ref().map(|program| program.id.clone()) else {
            return;
        };
        let new_ids: Vec<String> = exercise_ids.iter().map(|_| (self.id_provider)()).collect();

        let Some(workout) = self
            .workouts
            .iter_mut()
            .find(|workout| workout.workout_number == workout_number)
        else {
            return;
        };

        let start_order = workout.exercises.len() as u32 + 1;
        for (index, (catalog_id, id)) in exercise_ids.iter().zip(new_ids).enumerate() {
            let exercise = WorkoutExercise::with_default_set(
                id,
                &program_id,
                week,
                workout_number,
                start_order + index as u32,
                catalog_id,
            );
            self.changes.upsert(exercise.clone());
            workout.exercises.push(exercise);
        }
    }

    /// Appends a set numbered `count + 1` to the target exercise.
    pub fn add_set(&mut self, exercise_id: &str) {
        let Some(exercise) = find_exercise(&mut self.workouts, exercise_id) else {
            return;
        };
        let number = exercise.sets.len() as u32 + 1;
        exercise.sets.push(ExerciseSet::new(number));
        self.changes.upsert(exercise.clone());
    }

    /// Shallow-merges the given fields into the target exercise and records
    /// the new snapshot as dirty.
    pub fn update_exercise(&mut self, exercise_id: &str, update: &ExerciseUpdate) {
        let Some(exercise) = find_exercise(&mut self.workouts, exercise_id) else {
            return;
        };
        exercise.apply_update(update);
        self.changes.upsert(exercise.clone());
    }

    pub fn update_set(&mut self, exercise_id: &str, set_number: u32, update: &SetUpdate) {
        let Some(exercise) = find_exercise(&mut self.workouts, exercise_id) else {
            return;
        };
        if let Some(set) = exercise
            .sets
            .iter_mut()
            .find(|set| set.number == set_number)
        {
            set.apply_update(update);
        }
        self.changes.upsert(exercise.clone());
    }

    /// Removes the set and renumbers the remainder to close the gap.
    pub fn delete_set(&mut self, exercise_id: &str, set_number: u32) {
        let Some(exercise) = find_exercise(&mut self.workouts, exercise_id) else {
            return;
        };
        exercise.sets.retain(|set| set.number != set_number);
        for (index, set) in exercise.sets.iter_mut().enumerate() {
            set.number = index as u32 + 1;
        }
        self.changes.upsert(exercise.clone());
    }

    /// Removes the exercise, renumbers the surviving orders to a dense
    /// 1..N, and prunes the workout if it is now empty. The removal itself
    /// is not a dirty "update": a pending change for the removed id is
    /// superseded, and the coordinator's delete path carries the removal.
    pub fn delete_exercise(&mut self, exercise_id: &str) {
        let mut renumbered: Vec<WorkoutExercise> = Vec::new();
        for workout in &mut self.workouts {
            let before = workout.exercises.len();
            workout.exercises.retain(|exercise| exercise.id != exercise_id);
            if workout.exercises.len() == before {
                continue;
            }
            for (index, exercise) in workout.exercises.iter_mut().enumerate() {
                let order = index as u32 + 1;
                if exercise.order != order {
                    exercise.order = order;
                    renumbered.push(exercise.clone());
                }
            }
        }

        self.changes.remove(exercise_id);
        for exercise in renumbered {
            self.changes.upsert(exercise);
        }
        self.workouts.retain(|workout| !workout.exercises.is_empty());
    }

    /// Removes the whole workout. Its exercises are gone, so any pending
    /// changes for them are dropped rather than flagged.
    pub fn delete_workout(&mut self, workout_number: u32) {
        self.workouts
            .retain(|workout| workout.workout_number != workout_number);
        self.changes.remove_workout(workout_number);
    }

    /// Reassigns each exercise's order to its position in the supplied id
    /// sequence; ids not listed keep their relative order at the end.
    /// Order is server-visible state, so every exercise in the workout is
    /// marked dirty.
    pub fn reorder_exercises(&mut self, workout_number: u32, ordered_ids: &[String]) {
        let Some(workout) = self
            .workouts
            .iter_mut()
            .find(|workout| workout.workout_number == workout_number)
        else {
            return;
        };

        let mut remaining = std::mem::take(&mut workout.exercises);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in ordered_ids {
            if let Some(position) = remaining.iter().position(|exercise| &exercise.id == id) {
                reordered.push(remaining.remove(position));
            }
        }
        reordered.append(&mut remaining);

        for (index, exercise) in reordered.iter_mut().enumerate() {
            exercise.order = index as u32 + 1;
        }
        workout.exercises = reordered;

        for exercise in &workout.exercises {
            self.changes.upsert(exercise.clone());
        }
    }

    /// Reorders the in-memory workout list only. Workout numbers are
    /// identity, not position, so nothing is marked dirty.
    pub fn reorder_workouts(&mut self, ordered_numbers: &[u32]) {
        let mut remaining = std::mem::take(&mut self.workouts);
        let mut reordered = Vec::with_capacity(remaining.len());
        for number in ordered_numbers {
            if let Some(position) = remaining
                .iter()
                .position(|workout| workout.workout_number == *number)
            {
                reordered.push(remaining.remove(position));
            }
        }
        reordered.append(&mut remaining);
        self.workouts = reordered;
    }

    /// Stores a structural snapshot of the exercise; the source is not
    /// mutated and later edits to it do not leak into the clipboard.
    pub fn copy_exercise(&mut self, exercise_id: &str) {
        if let Some(exercise) = self.exercise(exercise_id) {
            self.copied_exercise = Some(exercise.clone());
        }
    }

    pub fn copy_workout(&mut self, workout_number: u32) {
        if let Some(workout) = self.workout(workout_number) {
            self.copied_workout = Some(workout.clone());
        }
    }

    pub fn copy_week(&mut self) {
        self.copied_week = Some(self.workouts.clone());
    }

    pub fn has_copied_exercise(&self) -> bool {
        self.copied_exercise.is_some()
    }

    pub fn has_copied_workout(&self) -> bool {
        self.copied_workout.is_some()
    }

    pub fn has_copied_week(&self) -> bool {
        self.copied_week.is_some()
    }

    /// Clones the clipboard exercise into the target workout under a fresh
    /// identity, appended at the next dense order with its sets renumbered
    /// from 1.
    pub fn paste_exercise(&mut self, workout_number: u32, week: u32) {
        let Some(copied) = self.copied_exercise.clone() else {
            return;
        };
        let Some(program_id) = self.program.as_ref().map(|program| program.id.clone()) else {
            return;
        };
        let new_id = (self.id_provider)();

        let Some(workout) = self
            .workouts
            .iter_mut()
            .find(|workout| workout.workout_number == workout_number)
        else {
            return;
        };

        let pasted = rehome_exercise(
            copied,
            new_id,
            &program_id,
            week,
            workout_number,
            workout.exercises.len() as u32 + 1,
        );
        self.changes.upsert(pasted.clone());
        workout.exercises.push(pasted);
    }

    /// Clones the clipboard workout into `week` under a newly allocated
    /// workout number, every exercise under a fresh identity. Returns the
    /// updated workout counter.
    pub fn paste_workout(&mut self, week: u32) -> u32 {
        let Some(copied) = self.copied_workout.clone() else {
            return self.last_workout_number();
        };
        self.paste_workout_group(copied, week)
    }

    /// Applies the workout paste once per clipboard workout, allocating
    /// sequential numbers. Returns the final workout counter so the caller
    /// can persist the update.
    pub fn paste_week(&mut self, week: u32) -> u32 {
        let Some(copied) = self.copied_week.clone() else {
            return self.last_workout_number();
        };
        let mut last = self.last_workout_number();
        for workout in copied {
            last = self.paste_workout_group(workout, week);
        }
        last
    }

    fn paste_workout_group(&mut self, source: Workout, week: u32) -> u32 {
        let Some(program) = self.program.as_mut() else {
            return 0;
        };
        let workout_number = program.last_workout_number + 1;
        program.last_workout_number = workout_number;
        let program_id = program.id.clone();

        let exercises: Vec<WorkoutExercise> = source
            .exercises
            .into_iter()
            .enumerate()
            .map(|(index, exercise)| {
                let new_id = (self.id_provider)();
                rehome_exercise(
                    exercise,
                    new_id,
                    &program_id,
                    week,
                    workout_number,
                    index as u32 + 1,
                )
            })
            .collect();

        for exercise in &exercises {
            self.changes.upsert(exercise.clone());
        }
        self.workouts.push(Workout {
            workout_number,
            exercises,
        });
        workout_number
    }

    fn last_workout_number(&self) -> u32 {
        self.program
            .as_ref()
            .map(|program| program.last_workout_number)
            .unwrap_or(0)
    }
}

fn find_exercise<'a>(
    workouts: &'a mut [Workout],
    exercise_id: &str,
) -> Option<&'a mut WorkoutExercise> {
    workouts
        .iter_mut()
        .flat_map(|workout| workout.exercises.iter_mut())
        .find(|exercise| exercise.id == exercise_id)
}

fn rehome_exercise(
    mut exercise: WorkoutExercise,
    new_id: String,
    program_id: &str,
    week: u32,
    workout_number: u32,
    order: u32,
) -> WorkoutExercise {
    exercise.id = new_id;
    exercise.program_id = program_id.to_string();
    exercise.week = week;
    exercise.workout_number = workout_number;
    exercise.order = order;
    for (index, set) in exercise.sets.iter_mut().enumerate() {
        set.number = index as u32 + 1;
    }
    exercise
}
