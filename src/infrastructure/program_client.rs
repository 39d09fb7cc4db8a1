use crate::domain::models::{ExerciseSet, Program, Workout, WorkoutExercise};
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::CoreError;
use crate::infrastructure::gateway::{ApiRequest, ApiResponse, AuthGateway, HttpMethod, HttpTransport};
use async_trait::async_trait;
use std::sync::Arc;

/// Body for `POST /programs`. The id is client-generated so a retried
/// create stays idempotent.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CreateProgramRequest {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_weeks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
}

/// Body for `PATCH /programs/{id}`; absent fields are left untouched by the
/// service. `created: true` publishes the program and is one-way.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UpdateProgramRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_weeks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
}

impl UpdateProgramRequest {
    pub fn publish() -> Self {
        Self {
            created: Some(true),
            ..Self::default()
        }
    }
}

/// `GET /programs/{id}/workouts?week=N` response.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WeekResponse {
    pub program_id: String,
    pub week: u32,
    pub total_weeks: u32,
    pub workouts: Vec<Workout>,
}

/// The narrow remote contract the sync coordinator and view loader consume.
#[async_trait]
pub trait ProgramClient: Send + Sync {
    async fn create_program(&self, request: CreateProgramRequest) -> Result<Program, CoreError>;
    async fn get_program(&self, program_id: &str) -> Result<Program, CoreError>;
    async fn update_program(
        &self,
        program_id: &str,
        request: UpdateProgramRequest,
    ) -> Result<Program, CoreError>;
    async fn delete_program(&self, program_id: &str) -> Result<(), CoreError>;

    async fn get_week(&self, program_id: &str, week: u32) -> Result<WeekResponse, CoreError>;
    async fn upsert_exercises(
        &self,
        program_id: &str,
        exercises: &[WorkoutExercise],
    ) -> Result<(), CoreError>;
    async fn delete_workouts(
        &self,
        program_id: &str,
        workout_numbers: &[u32],
    ) -> Result<(), CoreError>;
    async fn delete_exercises(&self, program_id: &str, ids: &[String]) -> Result<(), CoreError>;
}

#[derive(Debug, serde::Serialize)]
struct ExercisePayload<'a> {
    id: &'a str,
    week: u32,
    workout_number: u32,
    order: u32,
    exercise_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume_metric: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intensity_metric: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    sets: &'a [ExerciseSet],
}

impl<'a> From<&'a WorkoutExercise> for ExercisePayload<'a> {
    fn from(exercise: &'a WorkoutExercise) -> Self {
        Self {
            id: &exercise.id,
            week: exercise.week,
            workout_number: exercise.workout_number,
            order: exercise.order,
            exercise_id: &exercise.exercise_id,
            volume_metric: exercise.volume_metric.as_deref(),
            intensity_metric: exercise.intensity_metric.as_deref(),
            notes: exercise.notes.as_deref(),
            sets: &exercise.sets,
        }
    }
}

/// HTTP implementation of [`ProgramClient`] routed through the gateway.
pub struct HttpProgramClient<S, T>
where
    S: CredentialStore,
    T: HttpTransport,
{
    gateway: Arc<AuthGateway<S, T>>,
}

impl<S, T> HttpProgramClient<S, T>
where
    S: CredentialStore,
    T: HttpTransport,
{
    pub fn new(gateway: Arc<AuthGateway<S, T>>) -> Self {
        Self { gateway }
    }

    async fn expect_success(&self, request: ApiRequest) -> Result<ApiResponse, CoreError> {
        let response = self.gateway.send(request).await?;
        if !response.is_success() {
            return Err(CoreError::Remote {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl<S, T> ProgramClient for HttpProgramClient<S, T>
where
    S: CredentialStore,
    T: HttpTransport,
{
    async fn create_program(&self, request: CreateProgramRequest) -> Result<Program, CoreError> {
        let body = serde_json::to_value(&request)?;
        let response = self
            .expect_success(ApiRequest::new(HttpMethod::Post, "/programs").with_body(body))
            .await?;
        response.decode()
    }

    async fn get_program(&self, program_id: &str) -> Result<Program, CoreError> {
        let response = self
            .expect_success(ApiRequest::new(
                HttpMethod::Get,
                format!("/programs/{program_id}"),
            ))
            .await?;
        response.decode()
    }

    async fn update_program(
        &self,
        program_id: &str,
        request: UpdateProgramRequest,
    ) -> Result<Program, CoreError> {
        let body = serde_json::to_value(&request)?;
        let response = self
            .expect_success(
                ApiRequest::new(HttpMethod::Patch, format!("/programs/{program_id}"))
                    .with_body(body),
            )
            .await?;
        response.decode()
    }

    async fn delete_program(&self, program_id: &str) -> Result<(), CoreError> {
        self.expect_success(ApiRequest::new(
            HttpMethod::Delete,
            format!("/programs/{program_id}"),
        ))
        .await?;
        Ok(())
    }

    async fn get_week(&self, program_id: &str, week: u32) -> Result<WeekResponse, CoreError> {
        let response = self
            .expect_success(
                ApiRequest::new(HttpMethod::Get, format!("/programs/{program_id}/workouts"))
                    .with_query("week", week.to_string()),
            )
            .await?;
        response.decode()
    }

    async fn upsert_exercises(
        &self,
        program_id: &str,
        exercises: &[WorkoutExercise],
    ) -> Result<(), CoreError> {
        let payload: Vec<ExercisePayload<'_>> =
            exercises.iter().map(ExercisePayload::from).collect();
        let body = serde_json::json!({ "exercises": payload });
        self.expect_success(
            ApiRequest::new(
                HttpMethod::Put,
                format!("/programs/{program_id}/workout-exercises"),
            )
            .with_body(body),
        )
        .await?;
        Ok(())
    }

    async fn delete_workouts(
        &self,
        program_id: &str,
        workout_numbers: &[u32],
    ) -> Result<(), CoreError> {
        let body = serde_json::json!({ "workout_numbers": workout_numbers });
        self.expect_success(
            ApiRequest::new(HttpMethod::Delete, format!("/programs/{program_id}/workouts"))
                .with_body(body),
        )
        .await?;
        Ok(())
    }

    async fn delete_exercises(&self, program_id: &str, ids: &[String]) -> Result<(), CoreError> {
        let body = serde_json::json!({ "ids": ids });
        self.expect_success(
            ApiRequest::new(
                HttpMethod::Delete,
                format!("/programs/{program_id}/workout-exercises"),
            )
            .with_body(body),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::AuthTokens;
    use crate::infrastructure::credential_store::InMemoryCredentialStore;
    use crate::infrastructure::gateway::HttpRequest;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct RecordingTransport {
        responses: Mutex<VecDeque<ApiResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingTransport {
        fn with_responses(responses: Vec<ApiResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn ok(body: &str) -> ApiResponse {
            ApiResponse {
                status: 200,
                body: body.to_string(),
            }
        }

        fn recorded(&self) -> Vec<HttpRequest> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn execute(&self, request: HttpRequest) -> Result<ApiResponse, CoreError> {
            self.requests.lock().expect("requests lock").push(request);
            Ok(self
                .responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Self::ok("{}")))
        }
    }

    fn client(
        transport: Arc<RecordingTransport>,
    ) -> HttpProgramClient<InMemoryCredentialStore, RecordingTransport> {
        let store = Arc::new(InMemoryCredentialStore::default());
        store
            .save_tokens(&AuthTokens {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: None,
            })
            .expect("seed tokens");
        let gateway = AuthGateway::new(
            "http://localhost:3001",
            "http://localhost:3000",
            store,
            transport,
        )
        .expect("gateway");
        HttpProgramClient::new(Arc::new(gateway))
    }

    fn program_body() -> String {
        serde_json::json!({
            "id": "prg-1",
            "name": "Base Block",
            "description": null,
            "image_url": null,
            "tags": [],
            "total_weeks": 8,
            "last_workout_number": 3,
            "public": false,
            "created_at": null,
            "updated_at": "2026-03-02T08:00:00Z"
        })
        .to_string()
    }

    #[tokio::test]
    async fn get_week_addresses_week_query_and_decodes_groups() {
        let body = serde_json::json!({
            "program_id": "prg-1",
            "week": 2,
            "total_weeks": 8,
            "workouts": [{
                "workout_number": 3,
                "exercises": [{
                    "id": "we-1",
                    "program_id": "prg-1",
                    "week": 2,
                    "workout_number": 3,
                    "order": 1,
                    "exercise_id": "cat-squat",
                    "volume_metric": "reps",
                    "intensity_metric": "rpe",
                    "notes": null,
                    "sets": [{"number": 1, "volume_lower": null, "volume_upper": 8.0,
                              "intensity_lower": null, "intensity_upper": 7.5}]
                }]
            }]
        });
        let transport = Arc::new(RecordingTransport::with_responses(vec![
            RecordingTransport::ok(&body.to_string()),
        ]));
        let client = client(Arc::clone(&transport));

        let week = client.get_week("prg-1", 2).await.expect("get week");

        assert_eq!(week.week, 2);
        assert_eq!(week.workouts.len(), 1);
        assert_eq!(week.workouts[0].exercises[0].sets[0].intensity_upper, Some(7.5));

        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, HttpMethod::Get);
        assert_eq!(
            recorded[0].url.as_str(),
            "http://localhost:3001/programs/prg-1/workouts?week=2"
        );
        assert_eq!(recorded[0].bearer.as_deref(), Some("access"));
    }

    #[tokio::test]
    async fn upsert_sends_exercise_shape_without_program_id() {
        let transport = Arc::new(RecordingTransport::with_responses(Vec::new()));
        let client = client(Arc::clone(&transport));

        let mut exercise =
            WorkoutExercise::with_default_set("we-1", "prg-1", 1, 4, 1, "cat-bench");
        exercise.notes = Some("pause reps".to_string());
        client
            .upsert_exercises("prg-1", &[exercise])
            .await
            .expect("upsert");

        let recorded = transport.recorded();
        assert_eq!(recorded[0].method, HttpMethod::Put);
        assert_eq!(
            recorded[0].url.as_str(),
            "http://localhost:3001/programs/prg-1/workout-exercises"
        );
        let body = recorded[0].body.clone().expect("body present");
        let sent = &body["exercises"][0];
        assert_eq!(sent["id"], "we-1");
        assert_eq!(sent["workout_number"], 4);
        assert_eq!(sent["order"], 1);
        assert_eq!(sent["volume_metric"], "reps");
        assert_eq!(sent["notes"], "pause reps");
        assert_eq!(sent["sets"][0]["number"], 1);
        assert!(sent.get("program_id").is_none());
    }

    #[tokio::test]
    async fn delete_bodies_match_the_service_contract() {
        let transport = Arc::new(RecordingTransport::with_responses(Vec::new()));
        let client = client(Arc::clone(&transport));

        client
            .delete_workouts("prg-1", &[4, 7])
            .await
            .expect("delete workouts");
        client
            .delete_exercises("prg-1", &["we-1".to_string()])
            .await
            .expect("delete exercises");

        let recorded = transport.recorded();
        assert_eq!(recorded[0].method, HttpMethod::Delete);
        assert_eq!(
            recorded[0].url.as_str(),
            "http://localhost:3001/programs/prg-1/workouts"
        );
        assert_eq!(
            recorded[0].body,
            Some(serde_json::json!({"workout_numbers": [4, 7]}))
        );
        assert_eq!(
            recorded[1].url.as_str(),
            "http://localhost:3001/programs/prg-1/workout-exercises"
        );
        assert_eq!(recorded[1].body, Some(serde_json::json!({"ids": ["we-1"]})));
    }

    #[tokio::test]
    async fn patch_skips_absent_fields_and_decodes_program() {
        let transport = Arc::new(RecordingTransport::with_responses(vec![
            RecordingTransport::ok(&program_body()),
        ]));
        let client = client(Arc::clone(&transport));

        let program = client
            .update_program("prg-1", UpdateProgramRequest::publish())
            .await
            .expect("update program");

        assert_eq!(program.id, "prg-1");
        let recorded = transport.recorded();
        assert_eq!(recorded[0].method, HttpMethod::Patch);
        assert_eq!(recorded[0].body, Some(serde_json::json!({"created": true})));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_remote_error() {
        let transport = Arc::new(RecordingTransport::with_responses(vec![ApiResponse {
            status: 500,
            body: "boom".to_string(),
        }]));
        let client = client(Arc::clone(&transport));

        let result = client.get_program("prg-1").await;

        match result {
            Err(CoreError::Remote { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }
}
