use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use eyre::eyre;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use gymbook_core::errors::{BookingError, BookingResult};
use gymbook_core::models::appointment::{Appointment, AppointmentStatus, BookingRequest};
use gymbook_core::models::customer::Customer;
use gymbook_core::models::time_label::TimeLabel;
use gymbook_core::models::trainer::{ServiceType, Trainer, WeeklyTemplate};
use gymbook_core::store::BookingStore;

use crate::models::{time_label_from_db, DbAppointment, DbAvailability, DbCustomer, DbTrainer};

/// PostgreSQL-backed [`BookingStore`].
///
/// The atomic commits run as single transactions: the customer row and
/// the trainer row are locked `FOR UPDATE` (customer first, then
/// trainer, always in that order), which serializes balance traffic
/// per customer and capacity checks per trainer. Serialization
/// failures surface as `StorageContention` for the engines to retry.
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_templates(
        &self,
        trainer_id: Uuid,
    ) -> BookingResult<HashMap<String, WeeklyTemplate>> {
        let rows = sqlx::query_as::<_, DbAvailability>(
            r#"
            SELECT trainer_id, location, weekday, hour
            FROM trainer_availability
            WHERE trainer_id = $1
            "#,
        )
        .bind(trainer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut templates: HashMap<String, WeeklyTemplate> = HashMap::new();
        for row in rows {
            let template = templates.entry(row.location.clone()).or_default();
            row.apply_to(template)?;
        }
        Ok(templates)
    }

    async fn assemble_trainer(&self, row: DbTrainer) -> BookingResult<Trainer> {
        let templates = self.load_templates(row.id).await?;
        Ok(Trainer {
            id: row.id,
            name: row.name,
            service_type: row.service_type.parse().map_err(|e: String| eyre!(e))?,
            package_kind: row.package_kind.parse().map_err(|e: String| eyre!(e))?,
            capacity: u32::try_from(row.capacity).map_err(|_| eyre!("negative capacity"))?,
            templates,
        })
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_trainer(&self, id: Uuid) -> BookingResult<Option<Trainer>> {
        tracing::debug!("Getting trainer by id: {}", id);

        let row = sqlx::query_as::<_, DbTrainer>(
            r#"
            SELECT id, name, service_type, package_kind, capacity, created_at
            FROM trainers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(row) => Ok(Some(self.assemble_trainer(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_customer(&self, id: Uuid) -> BookingResult<Option<Customer>> {
        tracing::debug!("Getting customer by id: {}", id);

        let row = sqlx::query_as::<_, DbCustomer>(
            r#"
            SELECT id, name, package_kind, price, membership_starts_at, membership_ends_at,
                   sessions_remaining, sessions_consumed, sessions_total, created_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(|r| r.into_domain().map_err(BookingError::Database))
            .transpose()
    }

    async fn find_appointment(&self, id: Uuid) -> BookingResult<Option<Appointment>> {
        let row = sqlx::query_as::<_, DbAppointment>(
            r#"
            SELECT id, trainer_id, customer_id, date, time, location, status, created_at
            FROM appointments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(|r| r.into_domain().map_err(BookingError::Database))
            .transpose()
    }

    async fn trainers_for(
        &self,
        service_type: ServiceType,
        location: &str,
    ) -> BookingResult<Vec<Trainer>> {
        tracing::debug!(
            "Listing trainers: service_type={}, location={}",
            service_type,
            location
        );

        let rows = sqlx::query_as::<_, DbTrainer>(
            r#"
            SELECT DISTINCT t.id, t.name, t.service_type, t.package_kind, t.capacity, t.created_at
            FROM trainers t
            JOIN trainer_availability a ON a.trainer_id = t.id AND a.location = $2
            WHERE t.service_type = $1
            "#,
        )
        .bind(service_type.as_str())
        .bind(location)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut trainers = Vec::with_capacity(rows.len());
        for row in rows {
            trainers.push(self.assemble_trainer(row).await?);
        }
        Ok(trainers)
    }

    async fn confirmed_counts(
        &self,
        trainer_id: Uuid,
        date: NaiveDate,
        location: &str,
    ) -> BookingResult<HashMap<TimeLabel, u32>> {
        let rows = sqlx::query_as::<_, (i16, i64)>(
            r#"
            SELECT time, COUNT(*)
            FROM appointments
            WHERE trainer_id = $1 AND date = $2 AND location = $3 AND status = 'Confirmed'
            GROUP BY time
            "#,
        )
        .bind(trainer_id)
        .bind(date)
        .bind(location)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut counts = HashMap::with_capacity(rows.len());
        for (hour, count) in rows {
            counts.insert(
                time_label_from_db(hour)?,
                u32::try_from(count).unwrap_or(u32::MAX),
            );
        }
        Ok(counts)
    }

    async fn commit_booking(
        &self,
        request: &BookingRequest,
        capacity: u32,
    ) -> BookingResult<Appointment> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // Lock the customer row first, then the trainer row. Every
        // commit takes the locks in this order.
        let customer_exists = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM customers WHERE id = $1 FOR UPDATE"#,
        )
        .bind(request.customer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        if customer_exists.is_none() {
            return Err(BookingError::NotFound(format!(
                "Customer {} not found",
                request.customer_id
            )));
        }

        let trainer_exists = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM trainers WHERE id = $1 FOR UPDATE"#,
        )
        .bind(request.trainer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        if trainer_exists.is_none() {
            return Err(BookingError::NotFound(format!(
                "Trainer {} not found",
                request.trainer_id
            )));
        }

        let duplicate = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM appointments
                WHERE customer_id = $1 AND trainer_id = $2 AND date = $3 AND time = $4
                  AND status = 'Confirmed'
            )
            "#,
        )
        .bind(request.customer_id)
        .bind(request.trainer_id)
        .bind(request.date)
        .bind(i16::from(request.time.hour()))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        if duplicate {
            return Err(BookingError::Conflict(
                "Customer already holds this slot".to_string(),
            ));
        }

        let confirmed = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE trainer_id = $1 AND date = $2 AND time = $3 AND location = $4
              AND status = 'Confirmed'
            "#,
        )
        .bind(request.trainer_id)
        .bind(request.date)
        .bind(i16::from(request.time.hour()))
        .bind(&request.location)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        if confirmed >= i64::from(capacity) {
            return Err(BookingError::Conflict("Slot is fully booked".to_string()));
        }

        // Guarded debit: the WHERE clause is the balance recheck.
        let debited = sqlx::query(
            r#"
            UPDATE customers
            SET sessions_remaining = sessions_remaining - 1,
                sessions_consumed = sessions_consumed + 1
            WHERE id = $1 AND sessions_remaining >= 1
            "#,
        )
        .bind(request.customer_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?
        .rows_affected();
        if debited == 0 {
            return Err(BookingError::NoSessionsLeft);
        }

        let row = sqlx::query_as::<_, DbAppointment>(
            r#"
            INSERT INTO appointments (id, trainer_id, customer_id, date, time, location, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'Confirmed', $7)
            RETURNING id, trainer_id, customer_id, date, time, location, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.trainer_id)
        .bind(request.customer_id)
        .bind(request.date)
        .bind(i16::from(request.time.hour()))
        .bind(&request.location)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        row.into_domain().map_err(BookingError::Database)
    }

    async fn commit_cancellation(&self, appointment_id: Uuid) -> BookingResult<Appointment> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let row = sqlx::query_as::<_, DbAppointment>(
            r#"
            SELECT id, trainer_id, customer_id, date, time, location, status, created_at
            FROM appointments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(appointment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?
        .ok_or_else(|| {
            BookingError::NotFound(format!("Appointment {appointment_id} not found"))
        })?;

        let mut appointment = row.into_domain().map_err(BookingError::Database)?;
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }

        lock_customer(&mut tx, appointment.customer_id).await?;

        sqlx::query(r#"UPDATE appointments SET status = 'Cancelled' WHERE id = $1"#)
            .bind(appointment_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        sqlx::query(
            r#"
            UPDATE customers
            SET sessions_remaining = sessions_remaining + 1,
                sessions_consumed = GREATEST(sessions_consumed - 1, 0)
            WHERE id = $1
            "#,
        )
        .bind(appointment.customer_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        appointment.status = AppointmentStatus::Cancelled;
        Ok(appointment)
    }
}

async fn lock_customer(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: Uuid,
) -> BookingResult<()> {
    sqlx::query_scalar::<_, Uuid>(r#"SELECT id FROM customers WHERE id = $1 FOR UPDATE"#)
        .bind(customer_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_err)?;
    Ok(())
}

/// Maps sqlx failures into the engine taxonomy: serialization and
/// deadlock SQLSTATEs become retryable contention, unique-index hits
/// on the no-double-book constraint become conflicts, everything else
/// is an opaque database error.
fn map_sqlx_err(err: sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            match code.as_ref() {
                "40001" | "40P01" => return BookingError::StorageContention,
                "23505" => {
                    return BookingError::Conflict("Customer already holds this slot".to_string())
                }
                _ => {}
            }
        }
    }
    BookingError::Database(eyre::Report::new(err))
}
