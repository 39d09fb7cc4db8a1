//! Core engine for the LiftPlan mobile app: the in-memory edit session for
//! a workout program draft, the sync coordinator that persists it, and the
//! authenticated gateway every remote call goes through. Screens render
//! this crate's state and call into it; they own no data of their own.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::edit_session::EditSession;
pub use application::sync::SyncCoordinator;
pub use application::view_session::{ViewLoader, ViewSession};
pub use domain::ids::{IdProvider, default_id_provider, generate_entity_id};
pub use domain::models::{
    AuthTokens, ExerciseSet, ExerciseUpdate, Program, SetKey, SetUpdate, Workout, WorkoutExercise,
};
pub use infrastructure::config::{ApiConfig, ensure_default_config, load_api_config};
pub use infrastructure::credential_store::{
    CredentialStore, InMemoryCredentialStore, KeyringCredentialStore,
};
pub use infrastructure::error::CoreError;
pub use infrastructure::gateway::{
    ApiRequest, ApiResponse, AuthGateway, HttpMethod, HttpTransport, ReqwestTransport,
};
pub use infrastructure::program_client::{
    CreateProgramRequest, HttpProgramClient, ProgramClient, UpdateProgramRequest, WeekResponse,
};
