use backend::{
    catchers::{bad_request, forbidden, internal_error, not_found, unauthorized},
    cors::CORS,
    routes::{
        active_polls, all_options, create_choice, create_poll, create_question, delete_choice,
        delete_poll, delete_question, get_choice, get_poll, get_question, list_polls,
        submit_vote, update_choice, update_poll, update_question, voted_polls, AppState,
    },
};
use rocket::{catchers, routes};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("🗳️ Starting polls server");

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("📋 Migrations complete");

    rocket::build()
        .attach(CORS)
        .manage(AppState::new(pool))
        .mount(
            "/api",
            routes![
                list_polls,
                create_poll,
                get_poll,
                update_poll,
                delete_poll,
                create_question,
                get_question,
                update_question,
                delete_question,
                create_choice,
                get_choice,
                update_choice,
                delete_choice,
                active_polls,
                submit_vote,
                voted_polls,
                all_options
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                internal_error
            ],
        )
        .launch()
        .await?;

    Ok(())
}
