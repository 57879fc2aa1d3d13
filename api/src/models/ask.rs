use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ask {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub video_url: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateAsk {
    pub video_url: String,
    #[serde(default)]
    pub title: Option<String>,
}
