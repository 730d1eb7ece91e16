#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use salesfunnel::application::FunnelService;
use salesfunnel::domain::funnel::{ClientCategory, FunnelStatus, NewCapture};
use salesfunnel::domain::identity::Identity;
use salesfunnel::domain::metrics::SemaphoreThresholds;
use salesfunnel::infrastructure::{Database, Metrics};
use uuid::Uuid;

pub struct Fixture {
    pub database: Database,
    pub service: FunnelService,
    pub admin: Identity,
    pub ana: Identity,
    pub luis: Identity,
}

/// Fresh in-memory database with the default catalogue and one admin.
pub async fn setup() -> Fixture {
    let admin = Identity::new(Uuid::new_v4(), "boss@example.com");
    let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
    let luis = Identity::new(Uuid::new_v4(), "luis@example.com");

    let database = Database::in_memory().await.expect("in-memory database");
    database
        .seed(Some(admin.user_id))
        .await
        .expect("seed reference data");

    let service = FunnelService::new(
        &database,
        SemaphoreThresholds::default(),
        Metrics::new().expect("metrics"),
    );

    Fixture {
        database,
        service,
        admin,
        ana,
        luis,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn intake(client: &str, expected: Decimal, captured: NaiveDate) -> NewCapture {
    NewCapture {
        client: client.to_string(),
        reference: None,
        product: "Leasing".to_string(),
        expected_amount: expected,
        expected_close_month: date(2025, 7, 1),
        capture_date: Some(captured),
        visit_date: None,
        category: ClientCategory::New,
        status: FunnelStatus::Prospect,
        probability_adjusted: None,
        realized_amount: None,
    }
}

pub fn client_intake(
    client: &str,
    expected: Decimal,
    realized: Decimal,
    captured: NaiveDate,
) -> NewCapture {
    NewCapture {
        status: FunnelStatus::Client,
        realized_amount: Some(realized),
        ..intake(client, expected, captured)
    }
}
