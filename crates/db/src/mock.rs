use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;
use uuid::Uuid;

use gymbook_core::errors::BookingResult;
use gymbook_core::models::appointment::{Appointment, BookingRequest};
use gymbook_core::models::customer::Customer;
use gymbook_core::models::time_label::TimeLabel;
use gymbook_core::models::trainer::{ServiceType, Trainer};
use gymbook_core::store::BookingStore;

// Mock store for testing
mock! {
    pub Store {}

    #[async_trait]
    impl BookingStore for Store {
        async fn find_trainer(&self, id: Uuid) -> BookingResult<Option<Trainer>>;

        async fn find_customer(&self, id: Uuid) -> BookingResult<Option<Customer>>;

        async fn find_appointment(&self, id: Uuid) -> BookingResult<Option<Appointment>>;

        async fn trainers_for(
            &self,
            service_type: ServiceType,
            location: &str,
        ) -> BookingResult<Vec<Trainer>>;

        async fn confirmed_counts(
            &self,
            trainer_id: Uuid,
            date: NaiveDate,
            location: &str,
        ) -> BookingResult<HashMap<TimeLabel, u32>>;

        async fn commit_booking(
            &self,
            request: &BookingRequest,
            capacity: u32,
        ) -> BookingResult<Appointment>;

        async fn commit_cancellation(&self, appointment_id: Uuid) -> BookingResult<Appointment>;
    }
}
