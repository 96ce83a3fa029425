//! Daily briefing service: binary entrypoint.
//! Boots the Axum HTTP server (via Shuttle) with the podcast pipeline wired from env.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    daily_briefing::init_tracing();

    let router = daily_briefing::app()
        .await
        .map_err(shuttle_runtime::Error::Custom)?;

    Ok(router.into())
}
