use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{ListingId, NewPromotion, PaymentDetails, Promotion, PromotionId, SellerId},
    helpers::derive_order_code,
    traits::PromotionError,
};

// Statements with `RETURNING` are drained with `fetch_all`. SQLite only commits the implicit transaction once the
// statement has run to completion, so stopping at the first row leaves other connections reading the old data.

/// How many fresh ids to try before giving up on finding an unused order code.
pub const MAX_ORDER_CODE_ATTEMPTS: usize = 5;

/// Inserts a new `Pending` promotion, unless the listing already has a live one.
///
/// The id is random and the order code is derived from it. If the code is already taken, a new id is generated and
/// the insert retried, up to [`MAX_ORDER_CODE_ATTEMPTS`] times.
pub async fn insert_promotion(
    promotion: NewPromotion,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Promotion, PromotionError> {
    for attempt in 1..=MAX_ORDER_CODE_ATTEMPTS {
        let id = PromotionId::random();
        let order_code = derive_order_code(&id);
        match try_insert(&id, order_code, &promotion, now, &mut *conn).await {
            Ok(Some(p)) => {
                debug!("🗃️ Promotion {id} inserted with order code {order_code}");
                return Ok(p);
            },
            Ok(None) => return Err(PromotionError::ActivePromotionExists(promotion.listing_id)),
            Err(e) if is_unique_violation(&e) => {
                warn!("🗃️ Order code {order_code} is taken (attempt {attempt}/{MAX_ORDER_CODE_ATTEMPTS}). Retrying.");
            },
            Err(e) => return Err(e.into()),
        }
    }
    Err(PromotionError::OrderCodeCollision(MAX_ORDER_CODE_ATTEMPTS))
}

async fn try_insert(
    id: &PromotionId,
    order_code: i64,
    promotion: &NewPromotion,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Promotion>, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO listing_promotions (
                id,
                listing_id,
                seller_id,
                package_type,
                amount,
                end_date,
                payment_reference,
                status,
                payment_status,
                created_at,
                updated_at
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, 'Pending', 'Pending', $8, $8
            WHERE NOT EXISTS (
                SELECT 1 FROM listing_promotions
                WHERE listing_id = $2 AND status = 'Active' AND julianday(end_date) > julianday($8)
            )
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(promotion.listing_id.as_str())
    .bind(promotion.seller_id.as_str())
    .bind(promotion.package_type)
    .bind(promotion.amount)
    .bind(promotion.end_date)
    .bind(order_code)
    .bind(now)
    .fetch_all(conn)
    .await
    .map(|rows: Vec<Promotion>| rows.into_iter().next())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub async fn fetch_promotion(id: &PromotionId, conn: &mut SqliteConnection) -> Result<Option<Promotion>, sqlx::Error> {
    let promotion = sqlx::query_as("SELECT * FROM listing_promotions WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(promotion)
}

pub async fn fetch_promotion_by_reference(
    order_code: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Promotion>, sqlx::Error> {
    let promotion = sqlx::query_as("SELECT * FROM listing_promotions WHERE payment_reference = $1")
        .bind(order_code)
        .fetch_optional(conn)
        .await?;
    Ok(promotion)
}

/// Active promotions whose end date is after `now`, ordered by end date.
pub async fn fetch_live_promotions(
    listing_id: Option<ListingId>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Promotion>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT * FROM listing_promotions WHERE status = 'Active' AND julianday(end_date) > julianday(",
    );
    builder.push_bind(now);
    builder.push(")");
    if let Some(listing_id) = listing_id {
        builder.push(" AND listing_id = ");
        builder.push_bind(listing_id.to_string());
    }
    builder.push(" ORDER BY end_date ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let promotions = builder.build_query_as::<Promotion>().fetch_all(conn).await?;
    Ok(promotions)
}

pub async fn fetch_promotions_for_seller(
    seller_id: &SellerId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Promotion>, sqlx::Error> {
    let promotions = sqlx::query_as("SELECT * FROM listing_promotions WHERE seller_id = $1 ORDER BY created_at DESC")
        .bind(seller_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(promotions)
}

/// Single-statement `Pending | Cancelled -> Active` transition. Returns `None` if the row was in any other state, or if
/// another promotion for the same listing is already live.
pub async fn activate(
    id: &PromotionId,
    payment: &PaymentDetails,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Promotion>, sqlx::Error> {
    let promotion: Vec<Promotion> = sqlx::query_as(
        r#"
            UPDATE listing_promotions SET
                status = 'Active',
                payment_status = 'Completed',
                start_date = $2,
                payment_method = COALESCE($3, payment_method),
                payment_transaction_id = COALESCE($4, payment_transaction_id),
                updated_at = $2
            WHERE id = $1 AND status IN ('Pending', 'Cancelled') AND NOT EXISTS (
                SELECT 1 FROM listing_promotions o
                WHERE o.listing_id = listing_promotions.listing_id
                    AND o.id <> $1
                    AND o.status = 'Active'
                    AND julianday(o.end_date) > julianday($2)
            )
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(now)
    .bind(payment.method.as_deref())
    .bind(payment.transaction_id.as_deref())
    .fetch_all(conn)
    .await?;
    Ok(promotion.into_iter().next())
}

/// Single-statement `Pending -> Cancelled` transition with a failed payment. Returns `None` if the row was not
/// `Pending`.
pub async fn mark_failed(
    id: &PromotionId,
    payment: &PaymentDetails,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Promotion>, sqlx::Error> {
    let promotion: Vec<Promotion> = sqlx::query_as(
        r#"
            UPDATE listing_promotions SET
                status = 'Cancelled',
                payment_status = 'Failed',
                payment_method = COALESCE($2, payment_method),
                updated_at = $3
            WHERE id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(payment.method.as_deref())
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(promotion.into_iter().next())
}

/// Expires all active promotions with `end_date <= now`. Rows are re-checked inside the `UPDATE`, so a promotion
/// activated concurrently is only touched if it too has run its course.
pub async fn expire_promotions(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Promotion>, sqlx::Error> {
    let promotions = sqlx::query_as(
        r#"
            UPDATE listing_promotions SET status = 'Expired', updated_at = $1
            WHERE status = 'Active' AND julianday(end_date) <= julianday($1)
            RETURNING *;
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(promotions)
}
