#![allow(dead_code)]
use std::net::SocketAddr;

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use amenity_backend::{
    api,
    auth::{create_token, Role},
    crypto::FieldCipher,
    AppState,
};

pub const JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars-long!!";
const JWT_EXPIRY_HOURS: u64 = 12;
pub const PII_KEY_HEX: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f00112233445566778899aabbccddeeff0";

/// Spin up a real Axum server on a random port, returning its address, the
/// database pool and the PII cipher. Tests share one database; isolation
/// comes from unique rows per test plus cleanup afterwards.
///
/// Returns `None` (test becomes a no-op) when TEST_DATABASE_URL is unset,
/// so the suite stays green on machines without Postgres.
pub async fn setup_test_app() -> Option<(SocketAddr, PgPool, FieldCipher)> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping integration test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let cipher = FieldCipher::from_hex_key(PII_KEY_HEX).expect("test key is valid");

    let state = AppState {
        pool: pool.clone(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: JWT_EXPIRY_HOURS,
        cipher: cipher.clone(),
    };

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some((addr, pool, cipher))
}

/// Create a facility. `status` is one of open/closed/maintenance;
/// operating hours are 08:00-22:00.
pub async fn create_test_facility(
    pool: &PgPool,
    suffix: &str,
    capacity: i32,
    status: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    let name = format!("Test Facility {} {}", suffix, &id.to_string()[..8]);

    sqlx::query(
        "INSERT INTO facilities (id, name, capacity, status, open_time, close_time) \
         VALUES ($1, $2, $3, $4::facility_status, '08:00', '22:00')",
    )
    .bind(id)
    .bind(&name)
    .bind(capacity)
    .bind(status)
    .execute(pool)
    .await
    .expect("Failed to create test facility");

    id
}

/// Create a resident with encrypted contact fields. Returns the id; the
/// plaintext email is `<suffix>@test.local`.
pub async fn create_test_resident(pool: &PgPool, cipher: &FieldCipher, suffix: &str) -> Uuid {
    let id = Uuid::new_v4();
    let email_enc = cipher
        .encrypt(&format!("{}@test.local", suffix))
        .expect("encrypt");
    let phone_enc = cipher.encrypt("555-0100").expect("encrypt");

    sqlx::query(
        "INSERT INTO residents (id, first_name, last_name, unit_number, email_enc, phone_enc) \
         VALUES ($1, 'Test', 'Resident', '12B', $2, $3)",
    )
    .bind(id)
    .bind(email_enc)
    .bind(phone_enc)
    .execute(pool)
    .await
    .expect("Failed to create test resident");

    id
}

pub async fn create_test_staff(pool: &PgPool, cipher: &FieldCipher, is_admin: bool) -> Uuid {
    let id = Uuid::new_v4();
    let email_enc = cipher.encrypt("staff@test.local").expect("encrypt");

    sqlx::query(
        "INSERT INTO staff (id, first_name, last_name, is_admin, email_enc) \
         VALUES ($1, 'Test', 'Staff', $2, $3)",
    )
    .bind(id)
    .bind(is_admin)
    .bind(email_enc)
    .execute(pool)
    .await
    .expect("Failed to create test staff");

    id
}

pub async fn assign_staff(pool: &PgPool, staff_id: Uuid, facility_id: Uuid) {
    sqlx::query(
        "INSERT INTO staff_facility_assignments (id, staff_id, facility_id) VALUES ($1, $2, $3)",
    )
    .bind(Uuid::new_v4())
    .bind(staff_id)
    .bind(facility_id)
    .execute(pool)
    .await
    .expect("Failed to create test assignment");
}

/// Insert a booking row directly, bypassing admission, for listing tests.
pub async fn create_test_booking(
    pool: &PgPool,
    facility_id: Uuid,
    resident_id: Uuid,
    date: &str,
    start: &str,
    end: &str,
    status: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO bookings (id, facility_id, resident_id, date, start_time, end_time, status, attendees, purpose) \
         VALUES ($1, $2, $3, $4::date, $5::time, $6::time, $7::booking_status, 2, 'Test booking fixture')",
    )
    .bind(id)
    .bind(facility_id)
    .bind(resident_id)
    .bind(date)
    .bind(start)
    .bind(end)
    .bind(status)
    .execute(pool)
    .await
    .expect("Failed to create test booking");

    id
}

pub fn resident_token(resident_id: Uuid) -> String {
    create_token(resident_id, Role::Resident, JWT_SECRET, JWT_EXPIRY_HOURS)
        .expect("Failed to mint resident token")
}

pub fn staff_token(staff_id: Uuid) -> String {
    create_token(staff_id, Role::Staff, JWT_SECRET, JWT_EXPIRY_HOURS)
        .expect("Failed to mint staff token")
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Delete everything the test created, children first.
pub async fn cleanup(
    pool: &PgPool,
    facility_ids: &[Uuid],
    resident_ids: &[Uuid],
    staff_ids: &[Uuid],
) {
    let cleanup_queries = [
        "DELETE FROM facility_ratings WHERE facility_id = ANY($1)",
        "DELETE FROM maintenance_reports WHERE facility_id = ANY($1)",
        "DELETE FROM bookings WHERE facility_id = ANY($1)",
        "DELETE FROM staff_facility_assignments WHERE facility_id = ANY($1)",
        "DELETE FROM facilities WHERE id = ANY($1)",
    ];
    for q in cleanup_queries {
        let _ = sqlx::query(q).bind(facility_ids).execute(pool).await;
    }
    let _ = sqlx::query("DELETE FROM residents WHERE id = ANY($1)")
        .bind(resident_ids)
        .execute(pool)
        .await;
    let _ = sqlx::query("DELETE FROM staff_facility_assignments WHERE staff_id = ANY($1)")
        .bind(staff_ids)
        .execute(pool)
        .await;
    let _ = sqlx::query("DELETE FROM staff WHERE id = ANY($1)")
        .bind(staff_ids)
        .execute(pool)
        .await;
}
