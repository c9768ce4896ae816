use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::{
    db::traits::StoreError,
    db_types::{
        LineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatus,
        Paise,
        Payment,
        PaymentConfirmation,
        ShippingAddress,
        StatusGuard,
        UserId,
    },
    helpers::new_order_number,
};

/// Order numbers are random enough that a collision is practically impossible, but a unique index backs them up and a
/// colliding insert is simply retried with a fresh number.
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;

const ORDER_COLUMNS: &str = "id, order_number, owner_id, total, status, payment_method, payment_status, \
                             payment_reference, payment_proof, paid_at, payment_method_hint, ship_name, ship_address, \
                             ship_phone, ship_email, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    owner_id: String,
    total: i64,
    status: String,
    payment_method: Option<String>,
    payment_status: Option<String>,
    payment_reference: Option<String>,
    payment_proof: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    payment_method_hint: String,
    ship_name: String,
    ship_address: String,
    ship_phone: String,
    ship_email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct LineItemRow {
    order_id: i64,
    product_id: String,
    title: Option<String>,
    image: Option<String>,
    category: Option<String>,
    quantity: i64,
    unit_price: i64,
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        Self {
            product_id: row.product_id,
            title: row.title,
            image: row.image,
            category: row.category,
            quantity: row.quantity,
            unit_price: Paise::from(row.unit_price),
        }
    }
}

impl OrderRow {
    fn into_order(self, products: Vec<LineItem>) -> Result<Order, StoreError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::DataIntegrity(format!("Order {}: {e}", self.id)))?;
        let payment = match self.payment_status {
            None => None,
            Some(s) => {
                let status = s.parse().map_err(|e| StoreError::DataIntegrity(format!("Order {}: {e}", self.id)))?;
                let method = match self.payment_method {
                    Some(m) => m.parse().map_err(|e| StoreError::DataIntegrity(format!("Order {}: {e}", self.id)))?,
                    None => Default::default(),
                };
                Some(Payment {
                    method,
                    status,
                    reference: self.payment_reference,
                    proof_data_url: self.payment_proof,
                    paid_at: self.paid_at,
                })
            },
        };
        Ok(Order {
            id: OrderId(self.id),
            order_number: self.order_number,
            owner_id: UserId(self.owner_id),
            products,
            total: Paise::from(self.total),
            status,
            payment,
            payment_method: self.payment_method_hint,
            shipping_address: ShippingAddress {
                name: self.ship_name,
                address: self.ship_address,
                phone: self.ship_phone,
                email: self.ship_email,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Inserts a new order and its line items using the given connection. This is not atomic. Run it inside a
/// transaction, passing `&mut *tx` as the connection argument, so that an order is never visible without its items.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let now = Utc::now();
    let mut attempt = 0;
    let id = loop {
        attempt += 1;
        let order_number = new_order_number(&order.owner_id);
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO orders (
                order_number,
                owner_id,
                total,
                status,
                payment_method,
                payment_status,
                payment_method_hint,
                ship_name,
                ship_address,
                ship_phone,
                ship_email,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING id;
        "#,
        )
        .bind(&order_number)
        .bind(order.owner_id.as_str())
        .bind(order.total.value())
        .bind(order.payment.method.as_str())
        .bind(order.payment.status.as_str())
        .bind(&order.payment_method)
        .bind(&order.shipping_address.name)
        .bind(&order.shipping_address.address)
        .bind(&order.shipping_address.phone)
        .bind(&order.shipping_address.email)
        .bind(now)
        .fetch_one(&mut *conn)
        .await;
        match result {
            Ok(id) => break id,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                warn!("🗃️ Order number {order_number} collided on attempt {attempt}");
                if attempt >= MAX_ORDER_NUMBER_ATTEMPTS {
                    return Err(StoreError::OrderNumberExhausted(attempt));
                }
            },
            Err(e) => return Err(e.into()),
        }
    };
    insert_line_items(id, &order.products, conn).await?;
    trace!("🗃️ Order #{id} stored with {} line items", order.products.len());
    fetch_order(OrderId(id), conn)
        .await?
        .ok_or_else(|| StoreError::DataIntegrity(format!("Order {id} vanished straight after it was inserted")))
}

async fn insert_line_items(order_id: i64, items: &[LineItem], conn: &mut SqliteConnection) -> Result<(), StoreError> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::<Sqlite>::new(
        "INSERT INTO order_items (order_id, position, product_id, title, image, category, quantity, unit_price) ",
    );
    builder.push_values(items.iter().enumerate(), |mut row, (position, item)| {
        row.push_bind(order_id)
            .push_bind(position as i64)
            .push_bind(item.product_id.clone())
            .push_bind(item.title.clone())
            .push_bind(item.image.clone())
            .push_bind(item.category.clone())
            .push_bind(item.quantity)
            .push_bind(item.unit_price.value());
    });
    builder.build().execute(&mut *conn).await?;
    Ok(())
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(id.value()).fetch_optional(&mut *conn).await?;
    attach_items(row, conn).await
}

pub async fn fetch_order_for_owner(
    id: OrderId,
    owner: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND owner_id = $2");
    let row =
        sqlx::query_as::<_, OrderRow>(&sql).bind(id.value()).bind(owner.as_str()).fetch_optional(&mut *conn).await?;
    attach_items(row, conn).await
}

async fn attach_items(row: Option<OrderRow>, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let Some(row) = row else {
        return Ok(None);
    };
    let items = sqlx::query_as::<_, LineItemRow>(
        "SELECT order_id, product_id, title, image, category, quantity, unit_price FROM order_items WHERE order_id = \
         $1 ORDER BY position",
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;
    let products = items.into_iter().map(LineItem::from).collect();
    row.into_order(products).map(Some)
}

/// Fetches orders, newest first. If `owner` is given, only that user's orders are returned.
pub async fn fetch_orders(owner: Option<&UserId>, conn: &mut SqliteConnection) -> Result<Vec<Order>, StoreError> {
    let owner = owner.map(|o| o.as_str());
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE ($1 IS NULL OR owner_id = $1) ORDER BY id DESC");
    let rows = sqlx::query_as::<_, OrderRow>(&sql).bind(owner).fetch_all(&mut *conn).await?;
    let items = sqlx::query_as::<_, LineItemRow>(
        r#"
            SELECT i.order_id, i.product_id, i.title, i.image, i.category, i.quantity, i.unit_price
            FROM order_items i JOIN orders o ON o.id = i.order_id
            WHERE ($1 IS NULL OR o.owner_id = $1)
            ORDER BY i.order_id, i.position
        "#,
    )
    .bind(owner)
    .fetch_all(&mut *conn)
    .await?;
    let mut items_by_order = items.into_iter().fold(HashMap::<i64, Vec<LineItem>>::new(), |mut map, row| {
        map.entry(row.order_id).or_default().push(row.into());
        map
    });
    rows.into_iter()
        .map(|row| {
            let products = items_by_order.remove(&row.id).unwrap_or_default();
            row.into_order(products)
        })
        .collect()
}

/// Writes the new status in a single conditional update. Returns the id of the order if a row was changed.
pub async fn update_order_status(
    id: OrderId,
    status: OrderStatus,
    guard: &StatusGuard,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderId>, StoreError> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET status = ");
    builder.push_bind(status.as_str()).push(", updated_at = ").push_bind(Utc::now());
    builder.push(" WHERE id = ").push_bind(id.value());
    if let StatusGuard::From(allowed) = guard {
        if allowed.is_empty() {
            debug!("🗃️ No status may transition to {status}. Order {id} is unchanged");
            return Ok(None);
        }
        builder.push(" AND status IN (");
        let mut list = builder.separated(", ");
        for s in allowed {
            list.push_bind(s.as_str());
        }
        list.push_unseparated(")");
    }
    builder.push(" RETURNING id");
    let row = builder.build().fetch_optional(&mut *conn).await?;
    let id = row.map(|r| r.try_get::<i64, _>("id")).transpose()?;
    Ok(id.map(OrderId))
}

pub async fn initiate_payment(id: OrderId, owner: &UserId, conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                payment_method = 'upi',
                payment_status = 'pending',
                updated_at = $1
            WHERE id = $2 AND owner_id = $3 AND payment_status IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(id.value())
    .bind(owner.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn confirm_payment(
    id: OrderId,
    owner: &UserId,
    confirmation: PaymentConfirmation,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderId>, StoreError> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            UPDATE orders SET
                payment_method = $1,
                payment_status = 'paid',
                payment_reference = COALESCE($2, payment_reference),
                payment_proof = COALESCE($3, payment_proof),
                paid_at = $4,
                status = 'processing',
                updated_at = $4
            WHERE id = $5 AND owner_id = $6
            RETURNING id
        "#,
    )
    .bind(confirmation.method.as_str())
    .bind(confirmation.reference)
    .bind(confirmation.proof_data_url)
    .bind(now)
    .bind(id.value())
    .bind(owner.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id.map(OrderId))
}

pub async fn select_cod(id: OrderId, owner: &UserId, conn: &mut SqliteConnection) -> Result<Option<OrderId>, StoreError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            UPDATE orders SET
                payment_method = 'cod',
                payment_status = 'cod',
                status = 'processing',
                updated_at = $1
            WHERE id = $2 AND owner_id = $3
            RETURNING id
        "#,
    )
    .bind(Utc::now())
    .bind(id.value())
    .bind(owner.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id.map(OrderId))
}

pub async fn decline_payment(
    id: OrderId,
    owner: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderId>, StoreError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            UPDATE orders SET
                payment_method = COALESCE(payment_method, 'upi'),
                payment_status = 'failed',
                updated_at = $1
            WHERE id = $2 AND owner_id = $3
            RETURNING id
        "#,
    )
    .bind(Utc::now())
    .bind(id.value())
    .bind(owner.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id.map(OrderId))
}
