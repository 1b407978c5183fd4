use sqlx::SqliteConnection;

use crate::db_types::{ListingId, ListingSummary};

pub async fn fetch_listing(
    listing_id: &ListingId,
    conn: &mut SqliteConnection,
) -> Result<Option<ListingSummary>, sqlx::Error> {
    let listing = sqlx::query_as("SELECT id, seller_id, status, title FROM listings WHERE id = $1")
        .bind(listing_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(listing)
}

/// Mirrors a marketplace listing into the local table.
pub async fn upsert_listing(listing: ListingSummary, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO listings (id, seller_id, status, title) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                seller_id = excluded.seller_id,
                status = excluded.status,
                title = excluded.title;
        "#,
    )
    .bind(listing.id)
    .bind(listing.seller_id)
    .bind(listing.status)
    .bind(listing.title)
    .execute(conn)
    .await?;
    Ok(())
}
