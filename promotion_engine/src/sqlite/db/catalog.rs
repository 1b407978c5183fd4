use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{NewPackage, PackageType, PromotionPackage};

pub async fn fetch_active_packages(conn: &mut SqliteConnection) -> Result<Vec<PromotionPackage>, sqlx::Error> {
    let packages = sqlx::query_as(
        "SELECT * FROM promotion_pricing WHERE is_active = TRUE ORDER BY duration_days ASC, package_type ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(packages)
}

pub async fn fetch_active_package(
    package_type: PackageType,
    conn: &mut SqliteConnection,
) -> Result<Option<PromotionPackage>, sqlx::Error> {
    let package = sqlx::query_as("SELECT * FROM promotion_pricing WHERE package_type = $1 AND is_active = TRUE")
        .bind(package_type)
        .fetch_optional(conn)
        .await?;
    Ok(package)
}

pub async fn upsert_package(
    package: NewPackage,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PromotionPackage, sqlx::Error> {
    let rows: Vec<PromotionPackage> = sqlx::query_as(
        r#"
            INSERT INTO promotion_pricing (package_type, price, duration_days, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (package_type) DO UPDATE SET
                price = excluded.price,
                duration_days = excluded.duration_days,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(package.package_type)
    .bind(package.price)
    .bind(package.duration_days)
    .bind(package.is_active)
    .bind(now)
    .fetch_all(conn)
    .await?;
    rows.into_iter().next().ok_or(sqlx::Error::RowNotFound)
}
