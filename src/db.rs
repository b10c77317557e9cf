use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlConnection, MySqlPool};

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Takes the employee's row lock in `employee_locks`.
///
/// `conn` must be inside a transaction; the lock is held until that
/// transaction commits or rolls back, so concurrent attendance and device
/// writes for one employee run one after another.
pub async fn lock_employee(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO employee_locks (employee_id) VALUES (?) \
         ON DUPLICATE KEY UPDATE employee_id = employee_id",
    )
    .bind(employee_id)
    .execute(conn)
    .await?;
    Ok(())
}
