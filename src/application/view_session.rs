use crate::domain::models::{Program, Workout};
use crate::infrastructure::error::CoreError;
use crate::infrastructure::program_client::ProgramClient;
use std::sync::Arc;

/// Read-only browse state for someone else's published program. No change
/// tracking, no clipboards, no persistence; discarded on navigation away.
#[derive(Debug)]
pub struct ViewSession {
    program: Option<Program>,
    current_week: u32,
    workouts: Vec<Workout>,
}

impl Default for ViewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSession {
    pub fn new() -> Self {
        Self {
            program: None,
            current_week: 1,
            workouts: Vec::new(),
        }
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
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

    pub fn clear(&mut self) {
        self.program = None;
        self.current_week = 1;
        self.workouts.clear();
    }
}

/// Fetches programs and weeks into a [`ViewSession`].
pub struct ViewLoader<C>
where
    C: ProgramClient,
{
    client: Arc<C>,
}

impl<C> ViewLoader<C>
where
    C: ProgramClient,
{
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn load_program(
        &self,
        session: &mut ViewSession,
        program_id: &str,
    ) -> Result<(), CoreError> {
        let program = self.client.get_program(program_id).await?;
        session.program = Some(program);
        self.load_week(session, program_id, 1).await
    }

    pub async fn load_week(
        &self,
        session: &mut ViewSession,
        program_id: &str,
        week: u32,
    ) -> Result<(), CoreError> {
        let response = self.client.get_week(program_id, week).await?;
        session.current_week = response.week;
        session.workouts = response.workouts;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::WorkoutExercise;
    use crate::infrastructure::program_client::{
        CreateProgramRequest, UpdateProgramRequest, WeekResponse,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T08:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn published_program() -> Program {
        Program {
            id: "prg-9".to_string(),
            name: "Shared Peaking Block".to_string(),
            description: None,
            image_url: None,
            tags: vec!["strength".to_string()],
            total_weeks: 4,
            last_workout_number: 6,
            public: true,
            created_at: Some(fixed_time()),
            updated_at: fixed_time(),
        }
    }

    struct FakeProgramClient {
        weeks: Mutex<Vec<WeekResponse>>,
    }

    impl FakeProgramClient {
        fn with_weeks(weeks: Vec<WeekResponse>) -> Self {
            Self {
                weeks: Mutex::new(weeks),
            }
        }
    }

    #[async_trait]
    impl ProgramClient for FakeProgramClient {
        async fn create_program(&self, _request: CreateProgramRequest) -> Result<Program, CoreError> {
            Err(CoreError::Remote {
                status: 403,
                body: "not available while browsing".to_string(),
            })
        }

        async fn get_program(&self, _program_id: &str) -> Result<Program, CoreError> {
            Ok(published_program())
        }

        async fn update_program(
            &self,
            _program_id: &str,
            _request: UpdateProgramRequest,
        ) -> Result<Program, CoreError> {
            Err(CoreError::Remote {
                status: 403,
                body: "not available while browsing".to_string(),
            })
        }

        async fn delete_program(&self, _program_id: &str) -> Result<(), CoreError> {
            Err(CoreError::Remote {
                status: 403,
                body: "not available while browsing".to_string(),
            })
        }

        async fn get_week(&self, program_id: &str, week: u32) -> Result<WeekResponse, CoreError> {
            let mut weeks = self.weeks.lock().expect("weeks lock");
            if weeks.is_empty() {
                return Ok(WeekResponse {
                    program_id: program_id.to_string(),
                    week,
                    total_weeks: 4,
                    workouts: Vec::new(),
                });
            }
            Ok(weeks.remove(0))
        }

        async fn upsert_exercises(
            &self,
            _program_id: &str,
            _exercises: &[WorkoutExercise],
        ) -> Result<(), CoreError> {
            Err(CoreError::Remote {
                status: 501,
                body: "not implemented in fake".to_string(),
            })
        }

        async fn delete_workouts(
            &self,
            _program_id: &str,
            _workout_numbers: &[u32],
        ) -> Result<(), CoreError> {
            Err(CoreError::Remote {
                status: 501,
                body: "not implemented in fake".to_string(),
            })
        }

        async fn delete_exercises(&self, _program_id: &str, _ids: &[String]) -> Result<(), CoreError> {
            Err(CoreError::Remote {
                status: 501,
                body: "not implemented in fake".to_string(),
            })
        }
    }

    fn week_with_one_workout(week: u32) -> WeekResponse {
        WeekResponse {
            program_id: "prg-9".to_string(),
            week,
            total_weeks: 4,
            workouts: vec![Workout {
                workout_number: week,
                exercises: vec![WorkoutExercise::with_default_set(
                    format!("we-{week}"),
                    "prg-9",
                    week,
                    week,
                    1,
                    "cat-squat",
                )],
            }],
        }
    }

    #[tokio::test]
    async fn load_program_pulls_program_then_first_week() {
        let client = Arc::new(FakeProgramClient::with_weeks(vec![week_with_one_workout(1)]));
        let loader = ViewLoader::new(Arc::clone(&client));
        let mut session = ViewSession::new();

        loader
            .load_program(&mut session, "prg-9")
            .await
            .expect("load program");

        assert_eq!(session.program().expect("program").name, "Shared Peaking Block");
        assert!(session.program().expect("program").is_published());
        assert_eq!(session.current_week(), 1);
        assert_eq!(session.workouts().len(), 1);
        assert!(session.workout(1).is_some());
    }

    #[tokio::test]
    async fn switching_weeks_replaces_workouts_outright() {
        let client = Arc::new(FakeProgramClient::with_weeks(vec![
            week_with_one_workout(1),
            week_with_one_workout(3),
        ]));
        let loader = ViewLoader::new(Arc::clone(&client));
        let mut session = ViewSession::new();

        loader
            .load_program(&mut session, "prg-9")
            .await
            .expect("load program");
        loader
            .load_week(&mut session, "prg-9", 3)
            .await
            .expect("load week");

        assert_eq!(session.current_week(), 3);
        assert!(session.workout(3).is_some());
        assert!(session.workout(1).is_none());
    }

    #[tokio::test]
    async fn clear_resets_the_browse_state() {
        let client = Arc::new(FakeProgramClient::with_weeks(vec![week_with_one_workout(1)]));
        let loader = ViewLoader::new(Arc::clone(&client));
        let mut session = ViewSession::new();
        loader
            .load_program(&mut session, "prg-9")
            .await
            .expect("load program");

        session.clear();

        assert!(session.program().is_none());
        assert!(session.workouts().is_empty());
        assert_eq!(session.current_week(), 1);
    }
}
