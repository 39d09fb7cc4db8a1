use crate::application::edit_session::EditSession;
use crate::domain::models::Program;
use crate::infrastructure::error::CoreError;
use crate::infrastructure::program_client::{
    CreateProgramRequest, ProgramClient, UpdateProgramRequest,
};
use std::sync::Arc;

/// Translates edit-session state into remote persistence calls and
/// reconciles server-confirmed counters back into the session.
///
/// Every operation surfaces remote failures to the caller unchanged; local
/// session state stays a valid, continuable draft regardless. A failed save
/// keeps the dirty set intact so a retry resends exactly the same payload
/// (the upsert is idempotent by exercise id).
pub struct SyncCoordinator<C>
where
    C: ProgramClient,
{
    client: Arc<C>,
}

impl<C> SyncCoordinator<C>
where
    C: ProgramClient,
{
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn create_program(&self, request: CreateProgramRequest) -> Result<Program, CoreError> {
        self.client.create_program(request).await
    }

    pub async fn delete_program(&self, program_id: &str) -> Result<(), CoreError> {
        self.client.delete_program(program_id).await
    }

    /// Fetches the program and its first week into the session.
    pub async fn load_program(
        &self,
        session: &mut EditSession,
        program_id: &str,
    ) -> Result<(), CoreError> {
        let program = self.client.get_program(program_id).await?;
        session.set_program(program);
        self.load_week(session, program_id, 1).await
    }

    /// Replaces the in-memory workouts with the remote snapshot for `week`.
    /// Nothing is marked dirty; pending changes for the previous week must
    /// be saved first or they are lost with the swap.
    pub async fn load_week(
        &self,
        session: &mut EditSession,
        program_id: &str,
        week: u32,
    ) -> Result<(), CoreError> {
        let response = self.client.get_week(program_id, week).await?;
        session.replace_week(response.week, response.workouts);
        Ok(())
    }

    /// Persists every dirty exercise in one batch upsert, then raises the
    /// local workout counter to the highest number the batch confirmed and
    /// clears the dirty set. No-op when nothing is dirty.
    pub async fn save(&self, session: &mut EditSession, program_id: &str) -> Result<(), CoreError> {
        let changed = session.changed_exercises();
        if changed.is_empty() {
            return Ok(());
        }

        let max_workout_number = changed
            .iter()
            .map(|exercise| exercise.workout_number)
            .chain(session.program().map(|program| program.last_workout_number))
            .max()
            .unwrap_or(0);

        self.client.upsert_exercises(program_id, &changed).await?;

        session.reconcile_last_workout_number(max_workout_number);
        session.clear_changes();
        tracing::debug!(
            program_id = %program_id,
            count = changed.len(),
            "persisted changed exercises"
        );
        Ok(())
    }

    /// Deletes the workout remotely, then removes it from the session only
    /// once the remote call has succeeded.
    pub async fn delete_workout(
        &self,
        session: &mut EditSession,
        program_id: &str,
        workout_number: u32,
    ) -> Result<(), CoreError> {
        self.client
            .delete_workouts(program_id, &[workout_number])
            .await?;
        session.delete_workout(workout_number);
        tracing::debug!(program_id = %program_id, workout_number, "deleted workout");
        Ok(())
    }

    pub async fn delete_exercise(
        &self,
        session: &mut EditSession,
        program_id: &str,
        exercise_id: &str,
    ) -> Result<(), CoreError> {
        self.client
            .delete_exercises(program_id, &[exercise_id.to_string()])
            .await?;
        session.delete_exercise(exercise_id);
        Ok(())
    }

    /// Applies a partial program update and installs the confirmed program
    /// into the session.
    pub async fn update_program(
        &self,
        session: &mut EditSession,
        program_id: &str,
        request: UpdateProgramRequest,
    ) -> Result<Program, CoreError> {
        let program = self.client.update_program(program_id, request).await?;
        session.set_program(program.clone());
        Ok(program)
    }

    /// Marks the program as published, flushing any pending dirty set
    /// first so the published program matches what the author sees.
    pub async fn finish(
        &self,
        session: &mut EditSession,
        program_id: &str,
    ) -> Result<Program, CoreError> {
        if session.has_changes() {
            self.save(session, program_id).await?;
        }
        self.update_program(session, program_id, UpdateProgramRequest::publish())
            .await
    }
}
