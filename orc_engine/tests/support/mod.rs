use orc_common::Secret;
use orc_engine::{
    events::EventProducers,
    helpers::SignatureVerifier,
    OrderFlowApi,
    SqliteDatabase,
};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const TEST_SECRET: &str = "integration-test-secret";

fn random_db_path() -> String {
    let suffix = rand::thread_rng().sample_iter(&Alphanumeric).take(10).map(char::from).collect::<String>();
    format!("/tmp/orc_test_{suffix}.db")
}

/// Create a fresh, fully-migrated sqlite database for a single test.
pub async fn prepare_test_db() -> SqliteDatabase {
    let _ = dotenvy::dotenv();
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}", random_db_path());
    Sqlite::create_database(&url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    sqlx::migrate!("./src/db/sqlite/migrations").run(db.pool()).await.expect("Error running migrations");
    db
}

pub fn new_api(db: SqliteDatabase) -> OrderFlowApi<SqliteDatabase> {
    let verifier = SignatureVerifier::new(Some(Secret::new(TEST_SECRET.to_string())), false, None);
    OrderFlowApi::new(db, verifier, EventProducers::default())
}
