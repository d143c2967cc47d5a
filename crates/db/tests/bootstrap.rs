use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify seeded lookup tables.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    cinebook_db::health_check(&pool).await.unwrap();

    let tables = [
        ("payment_statuses", 3),
        ("booking_statuses", 3),
        ("booking_payment_statuses", 2),
    ];

    for (table, expected) in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, expected, "{table} seed row count");
    }
}

/// Seeded names line up with the status enums.
#[sqlx::test(migrations = "./migrations")]
async fn test_status_names_match_enums(pool: PgPool) {
    use cinebook_db::models::status::{BookingPaymentStatus, BookingStatus, PaymentStatus};

    let rows: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM payment_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    for (id, name) in rows {
        assert_eq!(PaymentStatus::name_of(id), name);
    }

    let rows: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM booking_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    for (id, name) in rows {
        assert_eq!(BookingStatus::name_of(id), name);
    }

    let rows: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM booking_payment_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    for (id, name) in rows {
        assert_eq!(BookingPaymentStatus::name_of(id), name);
    }
}
