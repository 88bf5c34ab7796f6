// src/routes/health.rs

// GET /api/v1/health-check
pub async fn health_check() -> &'static str {
    "Ok"
}
