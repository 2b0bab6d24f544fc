mod common;

const DATE: &str = "2030-07-01";

async fn list_bookings(addr: std::net::SocketAddr, token: &str) -> serde_json::Value {
    let resp = common::http_client()
        .get(format!("http://{}/api/bookings", addr))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("list request failed");
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn staff_sees_only_assigned_facilities() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let mine = common::create_test_facility(&pool, "scope-mine", 10, "open").await;
    let other = common::create_test_facility(&pool, "scope-other", 10, "open").await;
    let resident = common::create_test_resident(&pool, &cipher, "scope-res").await;
    let staff = common::create_test_staff(&pool, &cipher, false).await;
    common::assign_staff(&pool, staff, mine).await;

    common::create_test_booking(&pool, mine, resident, DATE, "09:00", "10:00", "pending").await;
    common::create_test_booking(&pool, other, resident, DATE, "09:00", "10:00", "pending").await;
    // Past bookings are excluded from staff listings.
    common::create_test_booking(&pool, mine, resident, "2020-01-01", "09:00", "10:00", "approved")
        .await;

    let body = list_bookings(addr, &common::staff_token(staff)).await;
    assert_eq!(body["success"], true);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["facility_id"].as_str().unwrap(), mine.to_string());

    common::cleanup(&pool, &[mine, other], &[resident], &[staff]).await;
}

#[tokio::test]
async fn staff_with_no_assignments_gets_empty_success() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let facility = common::create_test_facility(&pool, "noscope", 10, "open").await;
    let resident = common::create_test_resident(&pool, &cipher, "noscope-res").await;
    let staff = common::create_test_staff(&pool, &cipher, false).await;
    common::create_test_booking(&pool, facility, resident, DATE, "09:00", "10:00", "pending").await;

    let body = list_bookings(addr, &common::staff_token(staff)).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Same for maintenance and facility listings.
    let resp = common::http_client()
        .get(format!("http://{}/api/maintenance", addr))
        .header("Authorization", format!("Bearer {}", common::staff_token(staff)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    common::cleanup(&pool, &[facility], &[resident], &[staff]).await;
}

#[tokio::test]
async fn admin_sees_all_facilities() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let a = common::create_test_facility(&pool, "admin-a", 10, "open").await;
    let b = common::create_test_facility(&pool, "admin-b", 10, "open").await;
    let resident = common::create_test_resident(&pool, &cipher, "admin-res").await;
    let admin = common::create_test_staff(&pool, &cipher, true).await;

    common::create_test_booking(&pool, a, resident, DATE, "09:00", "10:00", "pending").await;
    common::create_test_booking(&pool, b, resident, DATE, "11:00", "12:00", "pending").await;

    let body = list_bookings(addr, &common::staff_token(admin)).await;
    let facilities: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["facility_id"].as_str().unwrap())
        .collect();
    assert!(facilities.contains(&a.to_string().as_str()));
    assert!(facilities.contains(&b.to_string().as_str()));

    common::cleanup(&pool, &[a, b], &[resident], &[admin]).await;
}

#[tokio::test]
async fn staff_cannot_mutate_out_of_scope_booking() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let assigned = common::create_test_facility(&pool, "mut-assigned", 10, "open").await;
    let unassigned = common::create_test_facility(&pool, "mut-unassigned", 10, "open").await;
    let resident = common::create_test_resident(&pool, &cipher, "mut-res").await;
    let staff = common::create_test_staff(&pool, &cipher, false).await;
    common::assign_staff(&pool, staff, assigned).await;

    let booking =
        common::create_test_booking(&pool, unassigned, resident, DATE, "09:00", "10:00", "pending")
            .await;

    let resp = common::http_client()
        .patch(format!("http://{}/api/bookings/{}/status", addr, booking))
        .header("Authorization", format!("Bearer {}", common::staff_token(staff)))
        .json(&serde_json::json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], "forbidden");

    common::cleanup(&pool, &[assigned, unassigned], &[resident], &[staff]).await;
}

#[tokio::test]
async fn resident_sees_only_own_bookings() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let facility = common::create_test_facility(&pool, "own", 10, "open").await;
    let me = common::create_test_resident(&pool, &cipher, "own-me").await;
    let them = common::create_test_resident(&pool, &cipher, "own-them").await;

    common::create_test_booking(&pool, facility, me, DATE, "09:00", "10:00", "pending").await;
    common::create_test_booking(&pool, facility, them, DATE, "11:00", "12:00", "pending").await;

    let body = list_bookings(addr, &common::resident_token(me)).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["resident_id"].as_str().unwrap(), me.to_string());

    common::cleanup(&pool, &[facility], &[me, them], &[]).await;
}

#[tokio::test]
async fn contact_fields_decrypted_for_staff_only() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let facility = common::create_test_facility(&pool, "pii", 10, "open").await;
    let resident = common::create_test_resident(&pool, &cipher, "pii-res").await;
    let staff = common::create_test_staff(&pool, &cipher, false).await;
    common::assign_staff(&pool, staff, facility).await;

    let booking =
        common::create_test_booking(&pool, facility, resident, DATE, "09:00", "10:00", "pending")
            .await;

    let get = |token: String| {
        let url = format!("http://{}/api/bookings/{}", addr, booking);
        async move {
            let resp = common::http_client()
                .get(url)
                .header("Authorization", format!("Bearer {}", token))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
            resp.json::<serde_json::Value>().await.unwrap()
        }
    };

    let staff_view = get(common::staff_token(staff)).await;
    assert_eq!(staff_view["data"]["resident_email"], "pii-res@test.local");
    assert_eq!(staff_view["data"]["resident_phone"], "555-0100");

    let resident_view = get(common::resident_token(resident)).await;
    assert!(resident_view["data"].get("resident_email").is_none());
    assert!(resident_view["data"].get("resident_phone").is_none());

    common::cleanup(&pool, &[facility], &[resident], &[staff]).await;
}

#[tokio::test]
async fn corrupt_ciphertext_degrades_to_null() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let facility = common::create_test_facility(&pool, "corrupt", 10, "open").await;
    let resident = common::create_test_resident(&pool, &cipher, "corrupt-res").await;
    let staff = common::create_test_staff(&pool, &cipher, false).await;
    common::assign_staff(&pool, staff, facility).await;

    sqlx::query("UPDATE residents SET phone_enc = 'not-a-ciphertext' WHERE id = $1")
        .bind(resident)
        .execute(&pool)
        .await
        .unwrap();

    let booking =
        common::create_test_booking(&pool, facility, resident, DATE, "09:00", "10:00", "pending")
            .await;

    let resp = common::http_client()
        .get(format!("http://{}/api/bookings/{}", addr, booking))
        .header("Authorization", format!("Bearer {}", common::staff_token(staff)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "a corrupt field must not abort the response");
    let body: serde_json::Value = resp.json().await.unwrap();
    // email still decrypts, phone degrades to absent
    assert_eq!(body["data"]["resident_email"], "corrupt-res@test.local");
    assert!(body["data"].get("resident_phone").is_none());

    common::cleanup(&pool, &[facility], &[resident], &[staff]).await;
}

#[tokio::test]
async fn duplicate_assignment_rejected() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let facility = common::create_test_facility(&pool, "dup-assign", 10, "open").await;
    let staff = common::create_test_staff(&pool, &cipher, false).await;
    let admin = common::create_test_staff(&pool, &cipher, true).await;

    let body = serde_json::json!({ "staff_id": staff, "facility_id": facility });
    let post = || {
        common::http_client()
            .post(format!("http://{}/api/assignments", addr))
            .header("Authorization", format!("Bearer {}", common::staff_token(admin)))
            .json(&body)
            .send()
    };

    let resp = post().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = post().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["reason"], "duplicate assignment");

    common::cleanup(&pool, &[facility], &[], &[staff, admin]).await;
}

#[tokio::test]
async fn non_admin_cannot_manage_assignments() {
    let Some((addr, pool, cipher)) = common::setup_test_app().await else {
        return;
    };
    let facility = common::create_test_facility(&pool, "assign-403", 10, "open").await;
    let staff = common::create_test_staff(&pool, &cipher, false).await;

    let resp = common::http_client()
        .post(format!("http://{}/api/assignments", addr))
        .header("Authorization", format!("Bearer {}", common::staff_token(staff)))
        .json(&serde_json::json!({ "staff_id": staff, "facility_id": facility }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    common::cleanup(&pool, &[facility], &[], &[staff]).await;
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let Some((addr, pool, _cipher)) = common::setup_test_app().await else {
        return;
    };

    let resp = common::http_client()
        .get(format!("http://{}/api/bookings", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = common::http_client()
        .get(format!("http://{}/api/bookings", addr))
        .header("Authorization", format!("Bearer {}", "garbage.token.here"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    drop(pool);
}
