//! Shared test helpers for `PostgreSQL` integration tests.
//!
//! Every test copies a template database that already carries the task
//! review schema and the seed rows, so each test starts from the same state.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use labtask::review::adapters::postgres::PostgresTaskReviewRepository;
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// SQL creating the task review schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-14-000000_create_task_review_tables/up.sql");

/// Seed rows: one task with a lipid panel and a glucose test, two
/// pathologists, and samples resolving both tests to visit `VIS-9100`.
pub const SEED_SQL: &str = r"
INSERT INTO users (id, name, user_type, lis_user_id, system_user_id) VALUES
    (21, 'Dr. Rao', 'pathologist', '7001', 'sys-21'),
    (22, 'Dr. Iyer', 'pathologist', '7002', 'sys-22');
INSERT INTO tasks (id, order_ref, city_code, status, created_by, updated_by) VALUES
    (7, 'OMS-ORDER-88', 'PUN', 'pending', 1, 1);
INSERT INTO test_details
    (id, task_id, status, lab_id, processing_lab_id, external_test_id, lis_code,
     created_by, updated_by) VALUES
    (300, 7, 'result_saved', 3, 3, 'OMS-300', 'LIPID', 1, 1),
    (400, 7, 'result_saved', 3, 3, 'OMS-400', 'GLU', 1, 1);
INSERT INTO investigation_results
    (id, test_detail_id, master_investigation_id, name, value, device_value,
     result_representation_type, lis_code, status, created_by, updated_by) VALUES
    (3001, 300, 3001, 'Cholesterol', '182', '182', 'numeric', 'CHOL', 'pending', 1, 1),
    (3002, 300, 3002, 'Triglycerides', '140', '140', 'numeric', 'TRIG', 'pending', 1, 1),
    (4001, 400, 4001, 'Glucose', '4.8', '4.8', 'numeric', 'GLU', 'pending', 1, 1);
INSERT INTO task_pathologist_mapping (task_id, pathologist_id, is_active) VALUES
    (7, 21, TRUE);
INSERT INTO samples (id, visit_id, lab_id) VALUES
    (1, 'VIS-9100', 3),
    (2, 'VIS-OLD', 3);
INSERT INTO test_sample_mapping (external_test_id, sample_id, is_rejected) VALUES
    ('OMS-300', 1, FALSE),
    ('OMS-400', 1, FALSE),
    ('OMS-400', 2, TRUE);
SELECT setval('remarks_id_seq', 500);
";

/// Template database name for the migrated and seeded schema.
pub const TEMPLATE_DB: &str = "labtask_test_template";

/// Creates a runtime for driving the async repository from sync tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
pub fn test_runtime() -> eyre::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Into::into)
}

/// Ensures the template database exists with the schema and seed applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("schema: {e}"))?;
            conn.batch_execute(SEED_SQL)
                .map_err(|e| eyre::eyre!("seed: {e}"))?;
            Ok(())
        })
        .map_err(|e| eyre::eyre!("template setup: {e}"))
}

/// Guard that drops the test database even if the test panics.
pub struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.db_name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.db_name);
        }
    }
}

/// Database copied from the template, with a repository over it.
pub struct PreparedRepo {
    /// Repository under test.
    pub repo: PostgresTaskReviewRepository,
    url: String,
    _guard: CleanupGuard,
}

impl PreparedRepo {
    /// Counts rows of a table, optionally with a `WHERE` clause appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, table: &str) -> eyre::Result<i64> {
        #[derive(QueryableByName)]
        struct Count {
            #[diesel(sql_type = diesel::sql_types::BigInt)]
            total: i64,
        }

        let mut conn = PgConnection::establish(&self.url)?;
        let row = diesel::sql_query(format!("SELECT COUNT(*) AS total FROM {table}"))
            .get_result::<Count>(&mut conn)?;
        Ok(row.total)
    }
}

/// Creates a test database from the template and returns it with a repository.
///
/// # Errors
///
/// Returns an error if template setup, database creation, or pool
/// construction fails.
pub fn setup_repository(cluster: &'static TestCluster) -> eyre::Result<PreparedRepo> {
    ensure_template(cluster)?;
    let db_name = format!("test_review_{}", Uuid::new_v4().simple());
    cluster
        .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
        .map_err(|e| eyre::eyre!("create database: {e}"))?;
    let guard = CleanupGuard {
        cluster,
        db_name: db_name.clone(),
    };

    let url = cluster.connection().database_url(&db_name);
    let manager = ConnectionManager::<PgConnection>::new(url.clone());
    let pool = Pool::builder().max_size(2).build(manager)?;
    Ok(PreparedRepo {
        repo: PostgresTaskReviewRepository::new(pool),
        url,
        _guard: guard,
    })
}
