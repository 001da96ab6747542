use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create trainers table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trainers (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            service_type VARCHAR(32) NOT NULL,
            package_kind VARCHAR(32) NOT NULL,
            capacity INT NOT NULL DEFAULT 1 CHECK (capacity >= 0),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create trainer_availability table (weekly template hours)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trainer_availability (
            trainer_id UUID NOT NULL REFERENCES trainers(id),
            location VARCHAR(255) NOT NULL,
            weekday SMALLINT NOT NULL CHECK (weekday BETWEEN 0 AND 6),
            hour SMALLINT NOT NULL CHECK (hour BETWEEN 0 AND 23),
            PRIMARY KEY (trainer_id, location, weekday, hour)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create customers table (membership inlined)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            package_kind VARCHAR(32) NULL,
            price BIGINT NULL,
            membership_starts_at TIMESTAMP WITH TIME ZONE NULL,
            membership_ends_at TIMESTAMP WITH TIME ZONE NULL,
            sessions_remaining INT NOT NULL DEFAULT 0 CHECK (sessions_remaining >= 0),
            sessions_consumed INT NOT NULL DEFAULT 0 CHECK (sessions_consumed >= 0),
            sessions_total INT NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create appointments table (append-only ledger)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            trainer_id UUID NOT NULL REFERENCES trainers(id),
            customer_id UUID NOT NULL REFERENCES customers(id),
            date DATE NOT NULL,
            time SMALLINT NOT NULL CHECK (time BETWEEN 0 AND 23),
            location VARCHAR(255) NOT NULL,
            status VARCHAR(16) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // A customer may hold at most one Confirmed entry per
    // (trainer, date, time); cancelled entries stay behind as audit rows.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_no_double_book
        ON appointments(customer_id, trainer_id, date, time)
        WHERE status = 'Confirmed';
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_appointments_slot ON appointments(trainer_id, date, time, location);
        CREATE INDEX IF NOT EXISTS idx_appointments_customer_id ON appointments(customer_id);
        CREATE INDEX IF NOT EXISTS idx_trainer_availability_location ON trainer_availability(location);
        CREATE INDEX IF NOT EXISTS idx_trainers_service_type ON trainers(service_type);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
