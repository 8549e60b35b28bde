use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::AuthConfig;
use crate::store::ProgressStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub progress: Arc<dyn ProgressStore>,
    pub auth: AuthConfig,
    pub allow_admin_setup: bool,
}
