//! Database service: connection pool plus every SQL operation.
//!
//! Invoice create/update/delete run as one transaction covering the
//! invoice row, its line items, the sequence allocation and the customer
//! ledger write; a failure anywhere rolls all of them back.

use chrono::{FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::{
    CreatedInvoice, Customer, CustomerPayload, CustomerWithStats, DashboardStats, Invoice,
    InvoiceDetail, InvoiceItem, InvoicePayload, InvoiceType, InvoiceWithCustomer, Item, ItemGroup,
    ItemGroupPayload, ItemPayload, ItemWithGroup, CreateReminder, Reminder, ReminderWithContext,
    RepaymentOutcome, RepaymentPayload, UpdatedInvoice, User,
};
use crate::services::ledger::{self, PostingInput};
use crate::services::metrics::{DB_QUERY_DURATION, INVOICE_OPERATIONS_TOTAL};
use crate::services::numbering;
use crate::utils::money::round_currency;
use crate::utils::password::hash_password;

/// The shop runs on Indian Standard Time; "today" for invoice dates,
/// financial-year numbering and dashboard figures is the IST calendar day.
fn ist_today() -> NaiveDate {
    let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is valid");
    Utc::now().with_timezone(&ist).date_naive()
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Seed the admin user on first startup if it does not exist yet.
    #[instrument(skip(self, auth))]
    pub async fn ensure_default_admin(&self, auth: &AuthConfig) -> Result<(), AppError> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(&auth.admin_username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to look up admin: {}", e)))?;

        if existing.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(&auth.admin_password)?;
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, 'admin')
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(&auth.admin_username)
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to seed admin user: {}", e)))?;

        info!(username = %auth.admin_username, "Seeded default admin user");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    /// List customers with derived aggregates. `filter` narrows to GST or
    /// regular (non-GST) customers.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<CustomerWithStats>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let where_clause = match filter {
            Some("gst") => "WHERE c.is_gst = TRUE",
            Some("regular") => "WHERE c.is_gst = FALSE",
            _ => "",
        };

        let query = format!(
            r#"
            SELECT c.id, c.name, c.mobile, c.alt_mobile, c.email,
                   c.address_line1, c.address_line2, c.city, c.state, c.pincode,
                   c.country, c.image_url, c.ledger_balance, c.is_gst,
                   c.created_at, c.updated_at,
                   COALESCE(SUM(i.balance_amount), 0) AS total_pending,
                   COUNT(i.id) AS total_invoices
            FROM customers c
            LEFT JOIN invoices i ON i.customer_id = c.id
            {}
            GROUP BY c.id
            ORDER BY c.created_at DESC
            "#,
            where_clause
        );

        let customers = sqlx::query_as::<_, CustomerWithStats>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e))
            })?;

        timer.observe_duration();
        Ok(customers)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: i64) -> Result<Option<CustomerWithStats>, AppError> {
        let customer = sqlx::query_as::<_, CustomerWithStats>(
            r#"
            SELECT c.id, c.name, c.mobile, c.alt_mobile, c.email,
                   c.address_line1, c.address_line2, c.city, c.state, c.pincode,
                   c.country, c.image_url, c.ledger_balance, c.is_gst,
                   c.created_at, c.updated_at,
                   COALESCE(SUM(i.balance_amount), 0) AS total_pending,
                   COUNT(i.id) AS total_invoices
            FROM customers c
            LEFT JOIN invoices i ON i.customer_id = c.id
            WHERE c.id = $1
            GROUP BY c.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        Ok(customer)
    }

    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_customer(&self, payload: &CustomerPayload) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                name, mobile, alt_mobile, email, address_line1, address_line2,
                city, state, pincode, country, image_url, ledger_balance, is_gst
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, name, mobile, alt_mobile, email, address_line1, address_line2,
                      city, state, pincode, country, image_url, ledger_balance, is_gst,
                      created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.mobile)
        .bind(&payload.alt_mobile)
        .bind(&payload.email)
        .bind(&payload.address_line1)
        .bind(&payload.address_line2)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.pincode)
        .bind(payload.country.as_deref().unwrap_or("India"))
        .bind(&payload.image_url)
        .bind(round_currency(payload.ledger_balance.unwrap_or_default()))
        .bind(payload.is_gst)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)))?;

        info!(customer_id = customer.id, "Customer created");
        Ok(customer)
    }

    #[instrument(skip(self, payload), fields(customer_id = id))]
    pub async fn update_customer(
        &self,
        id: i64,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = $1, mobile = $2, alt_mobile = $3, email = $4,
                address_line1 = $5, address_line2 = $6, city = $7, state = $8,
                pincode = $9, country = $10,
                image_url = COALESCE($11, image_url),
                ledger_balance = COALESCE($12, ledger_balance),
                is_gst = $13, updated_at = now()
            WHERE id = $14
            RETURNING id, name, mobile, alt_mobile, email, address_line1, address_line2,
                      city, state, pincode, country, image_url, ledger_balance, is_gst,
                      created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.mobile)
        .bind(&payload.alt_mobile)
        .bind(&payload.email)
        .bind(&payload.address_line1)
        .bind(&payload.address_line2)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.pincode)
        .bind(payload.country.as_deref().unwrap_or("India"))
        .bind(&payload.image_url)
        .bind(payload.ledger_balance.map(round_currency))
        .bind(payload.is_gst)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", id)))?;

        Ok(customer)
    }

    /// Delete a customer. Rejected while the customer still has invoices.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: i64) -> Result<(), AppError> {
        let invoice_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE customer_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
                })?;

        if invoice_count > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Cannot delete customer with existing invoices. Delete all invoices for this customer first."
            )));
        }

        let deleted: Option<i64> =
            sqlx::query_scalar("DELETE FROM customers WHERE id = $1 RETURNING id")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e))
                })?;

        deleted
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", id)))
    }

    /// All invoices for one customer, newest first.
    #[instrument(skip(self))]
    pub async fn customer_transactions(&self, customer_id: i64) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, type, invoice_date, subtotal,
                   discount_type, discount_value, discount_amount, gst_amount,
                   total_amount, payment_method, amount_paying, paid_amount,
                   balance_amount, payment_status, status, old_item_type,
                   old_item_value, previous_balance, current_outstanding,
                   created_at, updated_at
            FROM invoices
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list transactions: {}", e))
        })?;

        Ok(invoices)
    }

    /// Record a direct repayment against the ledger, without an invoice
    /// row. This is a second repayment path, distinct from creating a
    /// `repayment`-type invoice, and intentionally kept that way.
    #[instrument(skip(self, payload), fields(customer_id = customer_id))]
    pub async fn record_repayment(
        &self,
        customer_id: i64,
        payload: &RepaymentPayload,
    ) -> Result<RepaymentOutcome, AppError> {
        if payload.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid repayment amount"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_repayment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let ledger_balance: Option<Decimal> =
            sqlx::query_scalar("SELECT ledger_balance FROM customers WHERE id = $1 FOR UPDATE")
                .bind(customer_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e))
                })?;

        let Some(ledger_balance) = ledger_balance else {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                customer_id
            )));
        };

        let previous_balance = round_currency(ledger_balance);
        let new_balance = round_currency(previous_balance - payload.amount);

        sqlx::query("UPDATE customers SET ledger_balance = $1, updated_at = now() WHERE id = $2")
            .bind(new_balance)
            .bind(customer_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update balance: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            customer_id = customer_id,
            amount = %payload.amount,
            new_balance = %new_balance,
            "Repayment recorded"
        );

        Ok(RepaymentOutcome {
            previous_balance,
            repayment_amount: round_currency(payload.amount),
            new_balance,
            payment_method: payload
                .payment_method
                .clone()
                .unwrap_or_else(|| "cash".to_string()),
        })
    }

    // -------------------------------------------------------------------------
    // Item Group Operations
    // -------------------------------------------------------------------------

    pub async fn list_item_groups(&self) -> Result<Vec<ItemGroup>, AppError> {
        let groups = sqlx::query_as::<_, ItemGroup>(
            "SELECT id, name, description, created_at, updated_at FROM item_groups ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list item groups: {}", e)))?;

        Ok(groups)
    }

    pub async fn create_item_group(&self, payload: &ItemGroupPayload) -> Result<ItemGroup, AppError> {
        let group = sqlx::query_as::<_, ItemGroup>(
            r#"
            INSERT INTO item_groups (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create item group: {}", e))
        })?;

        Ok(group)
    }

    pub async fn update_item_group(
        &self,
        id: i64,
        payload: &ItemGroupPayload,
    ) -> Result<ItemGroup, AppError> {
        let group = sqlx::query_as::<_, ItemGroup>(
            r#"
            UPDATE item_groups SET name = $1, description = $2, updated_at = now()
            WHERE id = $3
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update item group: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item group {} not found", id)))?;

        Ok(group)
    }

    /// Delete an item group. Rejected while it still contains items.
    pub async fn delete_item_group(&self, id: i64) -> Result<(), AppError> {
        let item_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE group_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count items: {}", e)))?;

        if item_count > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Cannot delete item group that contains items. Delete or move the items first."
            )));
        }

        let deleted: Option<i64> =
            sqlx::query_scalar("DELETE FROM item_groups WHERE id = $1 RETURNING id")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete item group: {}", e))
                })?;

        deleted
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item group {} not found", id)))
    }

    // -------------------------------------------------------------------------
    // Item Operations
    // -------------------------------------------------------------------------

    pub async fn list_items(&self) -> Result<Vec<ItemWithGroup>, AppError> {
        let items = sqlx::query_as::<_, ItemWithGroup>(
            r#"
            SELECT i.id, i.name, i.group_id, g.name AS group_name, i.price,
                   i.description, i.created_at, i.updated_at
            FROM items i
            LEFT JOIN item_groups g ON g.id = i.group_id
            ORDER BY i.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))?;

        Ok(items)
    }

    pub async fn create_item(&self, payload: &ItemPayload) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, group_id, price, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, group_id, price, description, created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(payload.group_id)
        .bind(round_currency(payload.price.unwrap_or_default()))
        .bind(&payload.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create item: {}", e)))?;

        Ok(item)
    }

    pub async fn update_item(&self, id: i64, payload: &ItemPayload) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET name = $1, group_id = $2, price = $3, description = $4,
                             updated_at = now()
            WHERE id = $5
            RETURNING id, name, group_id, price, description, created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(payload.group_id)
        .bind(round_currency(payload.price.unwrap_or_default()))
        .bind(&payload.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update item: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item {} not found", id)))?;

        Ok(item)
    }

    pub async fn delete_item(&self, id: i64) -> Result<(), AppError> {
        let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM items WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete item: {}", e)))?;

        deleted
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item {} not found", id)))
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceWithCustomer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, InvoiceWithCustomer>(
            r#"
            SELECT i.id, i.invoice_number, i.customer_id, c.name AS customer_name,
                   i.type, i.invoice_date, i.subtotal, i.total_amount, i.paid_amount,
                   i.balance_amount, i.payment_method, i.payment_status, i.created_at
            FROM invoices i
            LEFT JOIN customers c ON c.id = i.customer_id
            ORDER BY i.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();
        Ok(invoices)
    }

    /// Single invoice with the customer's *current* contact fields joined
    /// in (display/print view) plus all line items.
    #[instrument(skip(self))]
    pub async fn get_invoice(
        &self,
        id: i64,
    ) -> Result<Option<(InvoiceDetail, Vec<InvoiceItem>)>, AppError> {
        let invoice = sqlx::query_as::<_, InvoiceDetail>(
            r#"
            SELECT i.id, i.invoice_number, i.customer_id, i.type, i.invoice_date,
                   i.subtotal, i.discount_type, i.discount_value, i.discount_amount,
                   i.gst_amount, i.total_amount, i.payment_method, i.amount_paying,
                   i.paid_amount, i.balance_amount, i.payment_status, i.status,
                   i.old_item_type, i.old_item_value, i.previous_balance,
                   i.current_outstanding, i.created_at, i.updated_at,
                   c.name AS customer_name, c.mobile, c.address_line1, c.address_line2,
                   c.city, c.state, c.pincode
            FROM invoices i
            LEFT JOIN customers c ON c.id = i.customer_id
            WHERE i.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        let Some(invoice) = invoice else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, item_id, item_name, stamp, remarks, hsn, unit, pc,
                   gross_weight, less, net_weight, add_weight, making_charges, rate,
                   labour, discount, total, created_at
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice items: {}", e))
        })?;

        Ok(Some((invoice, items)))
    }

    /// Create an invoice: allocate its number, post it against the ledger,
    /// insert the line items and persist the new customer balance, all in
    /// one transaction.
    #[instrument(skip(self, payload), fields(customer_id = payload.customer_id, invoice_type = payload.invoice_type.as_str()))]
    pub async fn create_invoice(&self, payload: &InvoicePayload) -> Result<CreatedInvoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let ledger_balance: Option<Decimal> =
            sqlx::query_scalar("SELECT ledger_balance FROM customers WHERE id = $1 FOR UPDATE")
                .bind(payload.customer_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e))
                })?;

        let Some(ledger_balance) = ledger_balance else {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                payload.customer_id
            )));
        };

        let today = ist_today();
        let invoice_number =
            numbering::allocate_invoice_number(&mut tx, payload.invoice_type, today).await?;

        // Ledger balance at submission time: the caller-captured value
        // wins, otherwise the row we just locked.
        let previous_balance =
            round_currency(payload.previous_balance.unwrap_or(ledger_balance));

        let posting = ledger::post_invoice(&PostingInput {
            invoice_type: payload.invoice_type,
            total_amount: round_currency(payload.total_amount),
            paid_amount: round_currency(payload.paid_amount.unwrap_or_default()),
            previous_balance,
            status_override: payload.payment_status,
        });

        let invoice_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (
                invoice_number, customer_id, type, invoice_date, subtotal,
                discount_type, discount_value, discount_amount, gst_amount,
                total_amount, payment_method, amount_paying, paid_amount,
                balance_amount, payment_status, status, old_item_type,
                old_item_value, previous_balance, current_outstanding
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20)
            RETURNING id
            "#,
        )
        .bind(&invoice_number)
        .bind(payload.customer_id)
        .bind(payload.invoice_type.as_str())
        .bind(payload.invoice_date.unwrap_or(today))
        .bind(round_currency(payload.subtotal))
        .bind(payload.discount_type.as_deref().unwrap_or("none"))
        .bind(payload.discount_value.unwrap_or_default())
        .bind(round_currency(payload.discount_amount.unwrap_or_default()))
        .bind(round_currency(payload.gst_amount.unwrap_or_default()))
        .bind(round_currency(payload.total_amount))
        .bind(payload.payment_method.as_deref().unwrap_or("cash"))
        .bind(round_currency(payload.amount_paying.unwrap_or_default()))
        .bind(round_currency(payload.paid_amount.unwrap_or_default()))
        .bind(posting.balance_amount)
        .bind(posting.payment_status.as_str())
        .bind(posting.payment_status.as_str())
        .bind(&payload.old_item_type)
        .bind(round_currency(payload.old_item_value.unwrap_or_default()))
        .bind(previous_balance)
        .bind(posting.current_outstanding)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice number {} already exists",
                    invoice_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)),
        })?;

        Self::insert_invoice_items(&mut tx, invoice_id, payload).await?;

        // GST invoices never post to the ledger unless the caller supplied
        // an explicit target balance.
        let ledger_write = payload
            .new_ledger_balance
            .map(round_currency)
            .or(posting.new_ledger_balance);

        if let Some(value) = ledger_write {
            sqlx::query("UPDATE customers SET ledger_balance = $1, updated_at = now() WHERE id = $2")
                .bind(value)
                .bind(payload.customer_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to update balance: {}", e))
                })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        INVOICE_OPERATIONS_TOTAL
            .with_label_values(&[payload.invoice_type.as_str(), "create"])
            .inc();

        info!(
            invoice_id = invoice_id,
            invoice_number = %invoice_number,
            payment_status = posting.payment_status.as_str(),
            "Invoice created"
        );

        Ok(CreatedInvoice {
            id: invoice_id,
            invoice_number,
            payment_status: posting.payment_status.as_str().to_string(),
            new_ledger_balance: ledger_write.unwrap_or(Decimal::ZERO),
        })
    }

    /// Update an invoice with full-replace semantics: reverse the stored
    /// posting, re-post with the submitted values, replace all line items.
    /// The invoice number is immutable.
    #[instrument(skip(self, payload), fields(invoice_id = id))]
    pub async fn update_invoice(
        &self,
        id: i64,
        payload: &InvoicePayload,
    ) -> Result<UpdatedInvoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let original = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, type, invoice_date, subtotal,
                   discount_type, discount_value, discount_amount, gst_amount,
                   total_amount, payment_method, amount_paying, paid_amount,
                   balance_amount, payment_status, status, old_item_type,
                   old_item_value, previous_balance, current_outstanding,
                   created_at, updated_at
            FROM invoices
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id)))?;

        // An edit naming a different customer would reverse the original
        // posting out of the wrong ledger.
        if payload.customer_id != original.customer_id {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invoice cannot be moved to a different customer"
            )));
        }

        let ledger_balance: Option<Decimal> =
            sqlx::query_scalar("SELECT ledger_balance FROM customers WHERE id = $1 FOR UPDATE")
                .bind(payload.customer_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e))
                })?;

        let Some(ledger_balance) = ledger_balance else {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                payload.customer_id
            )));
        };

        // Phase 1: reverse. Undo the original posting using its stored
        // ledger snapshots, yielding the balance as if the invoice had
        // never existed. Correct under a single writer only.
        let original_type = InvoiceType::from_string(&original.invoice_type);
        let adjusted_balance = ledger::reversed_ledger_balance(
            original_type,
            ledger_balance,
            original.previous_balance,
            original.current_outstanding,
            original.balance_amount,
            original.total_amount,
        );

        // Phase 2: re-post with the submitted values.
        let posting = ledger::post_invoice(&PostingInput {
            invoice_type: payload.invoice_type,
            total_amount: round_currency(payload.total_amount),
            paid_amount: round_currency(payload.paid_amount.unwrap_or_default()),
            previous_balance: adjusted_balance,
            status_override: payload.payment_status,
        });

        sqlx::query(
            r#"
            UPDATE invoices SET
                customer_id = $1, type = $2, invoice_date = $3, subtotal = $4,
                discount_type = $5, discount_value = $6, discount_amount = $7,
                gst_amount = $8, total_amount = $9, payment_method = $10,
                amount_paying = $11, paid_amount = $12, balance_amount = $13,
                payment_status = $14, status = $15, old_item_type = $16,
                old_item_value = $17, previous_balance = $18,
                current_outstanding = $19, updated_at = now()
            WHERE id = $20
            "#,
        )
        .bind(payload.customer_id)
        .bind(payload.invoice_type.as_str())
        .bind(payload.invoice_date.unwrap_or(original.invoice_date))
        .bind(round_currency(payload.subtotal))
        .bind(payload.discount_type.as_deref().unwrap_or("none"))
        .bind(payload.discount_value.unwrap_or_default())
        .bind(round_currency(payload.discount_amount.unwrap_or_default()))
        .bind(round_currency(payload.gst_amount.unwrap_or_default()))
        .bind(round_currency(payload.total_amount))
        .bind(payload.payment_method.as_deref().unwrap_or("cash"))
        .bind(round_currency(payload.amount_paying.unwrap_or_default()))
        .bind(round_currency(payload.paid_amount.unwrap_or_default()))
        .bind(posting.balance_amount)
        .bind(posting.payment_status.as_str())
        .bind(posting.payment_status.as_str())
        .bind(&payload.old_item_type)
        .bind(round_currency(payload.old_item_value.unwrap_or_default()))
        .bind(adjusted_balance)
        .bind(posting.current_outstanding)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete old items: {}", e))
            })?;

        Self::insert_invoice_items(&mut tx, id, payload).await?;

        // The ledger is rewritten for non-GST edits only; repayment edits
        // do not touch it, a quirk carried over from the original system.
        let new_ledger_balance = if payload.invoice_type == InvoiceType::NonGst {
            let value = payload
                .new_ledger_balance
                .map(round_currency)
                .unwrap_or(posting.current_outstanding);
            sqlx::query("UPDATE customers SET ledger_balance = $1, updated_at = now() WHERE id = $2")
                .bind(value)
                .bind(payload.customer_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to update balance: {}", e))
                })?;
            Some(value)
        } else {
            None
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        INVOICE_OPERATIONS_TOTAL
            .with_label_values(&[payload.invoice_type.as_str(), "update"])
            .inc();

        info!(
            invoice_id = id,
            payment_status = posting.payment_status.as_str(),
            "Invoice updated"
        );

        Ok(UpdatedInvoice {
            id,
            payment_status: posting.payment_status.as_str().to_string(),
            new_ledger_balance,
        })
    }

    /// Delete an invoice and reverse its ledger effect. Returns the
    /// customer's updated ledger balance.
    #[instrument(skip(self), fields(invoice_id = id))]
    pub async fn delete_invoice(&self, id: i64) -> Result<Decimal, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, type, invoice_date, subtotal,
                   discount_type, discount_value, discount_amount, gst_amount,
                   total_amount, payment_method, amount_paying, paid_amount,
                   balance_amount, payment_status, status, old_item_type,
                   old_item_value, previous_balance, current_outstanding,
                   created_at, updated_at
            FROM invoices
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id)))?;

        let ledger_balance: Option<Decimal> =
            sqlx::query_scalar("SELECT ledger_balance FROM customers WHERE id = $1 FOR UPDATE")
                .bind(invoice.customer_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e))
                })?;

        let Some(ledger_balance) = ledger_balance else {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                invoice.customer_id
            )));
        };

        let invoice_type = InvoiceType::from_string(&invoice.invoice_type);
        let new_balance = ledger::reversed_ledger_balance(
            invoice_type,
            ledger_balance,
            invoice.previous_balance,
            invoice.current_outstanding,
            invoice.balance_amount,
            invoice.total_amount,
        );

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice items: {}", e))
            })?;

        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        sqlx::query("UPDATE customers SET ledger_balance = $1, updated_at = now() WHERE id = $2")
            .bind(new_balance)
            .bind(invoice.customer_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update balance: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        INVOICE_OPERATIONS_TOTAL
            .with_label_values(&[invoice_type.as_str(), "delete"])
            .inc();

        info!(
            invoice_id = id,
            invoice_number = %invoice.invoice_number,
            new_balance = %new_balance,
            "Invoice deleted"
        );

        Ok(new_balance)
    }

    async fn insert_invoice_items(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        invoice_id: i64,
        payload: &InvoicePayload,
    ) -> Result<(), AppError> {
        for item in &payload.items {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, item_id, item_name, stamp, remarks, hsn, unit, pc,
                    gross_weight, less, net_weight, add_weight, making_charges,
                    rate, labour, discount, total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                        $14, $15, $16, $17)
                "#,
            )
            .bind(invoice_id)
            .bind(item.item_id)
            .bind(&item.item_name)
            .bind(&item.stamp)
            .bind(&item.remarks)
            .bind(&item.hsn)
            .bind(item.unit.as_deref().unwrap_or("GM"))
            .bind(item.pc.unwrap_or(1))
            .bind(item.gross_weight.unwrap_or_default())
            .bind(item.less.unwrap_or_default())
            .bind(item.effective_net_weight())
            .bind(item.add_weight.unwrap_or_default())
            .bind(item.making_charges.unwrap_or_default())
            .bind(item.rate.unwrap_or_default())
            .bind(item.labour.unwrap_or_default())
            .bind(item.discount.unwrap_or_default())
            .bind(item.effective_total())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice item: {}", e))
            })?;
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reminder Operations
    // -------------------------------------------------------------------------

    pub async fn list_pending_reminders(&self) -> Result<Vec<ReminderWithContext>, AppError> {
        let reminders = sqlx::query_as::<_, ReminderWithContext>(
            r#"
            SELECT r.id, r.customer_id, c.name AS customer_name, c.mobile,
                   r.invoice_id, i.invoice_number, r.reminder_date,
                   r.amount_promised, r.notes, r.status, r.created_at
            FROM reminders r
            LEFT JOIN customers c ON c.id = r.customer_id
            LEFT JOIN invoices i ON i.id = r.invoice_id
            WHERE r.status = 'pending'
            ORDER BY r.reminder_date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list reminders: {}", e)))?;

        Ok(reminders)
    }

    /// Pending reminders whose promise date is today (IST).
    pub async fn list_today_reminders(&self) -> Result<Vec<ReminderWithContext>, AppError> {
        let reminders = sqlx::query_as::<_, ReminderWithContext>(
            r#"
            SELECT r.id, r.customer_id, c.name AS customer_name, c.mobile,
                   r.invoice_id, i.invoice_number, r.reminder_date,
                   r.amount_promised, r.notes, r.status, r.created_at
            FROM reminders r
            LEFT JOIN customers c ON c.id = r.customer_id
            LEFT JOIN invoices i ON i.id = r.invoice_id
            WHERE r.status = 'pending' AND r.reminder_date = $1
            ORDER BY r.reminder_date ASC
            "#,
        )
        .bind(ist_today())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list today's reminders: {}", e))
        })?;

        Ok(reminders)
    }

    pub async fn create_reminder(&self, payload: &CreateReminder) -> Result<Reminder, AppError> {
        let customer_exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM customers WHERE id = $1")
                .bind(payload.customer_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e))
                })?;

        if customer_exists.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                payload.customer_id
            )));
        }

        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (customer_id, invoice_id, reminder_date, amount_promised, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, customer_id, invoice_id, reminder_date, amount_promised,
                      notes, status, created_at, updated_at
            "#,
        )
        .bind(payload.customer_id)
        .bind(payload.invoice_id)
        .bind(payload.reminder_date)
        .bind(round_currency(payload.amount_promised))
        .bind(payload.notes.as_deref().unwrap_or(""))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create reminder: {}", e)))?;

        Ok(reminder)
    }

    pub async fn complete_reminder(&self, id: i64) -> Result<(), AppError> {
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE reminders SET status = 'completed', updated_at = now() WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to complete reminder: {}", e))
        })?;

        updated
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reminder {} not found", id)))
    }

    pub async fn delete_reminder(&self, id: i64) -> Result<(), AppError> {
        let deleted: Option<i64> =
            sqlx::query_scalar("DELETE FROM reminders WHERE id = $1 RETURNING id")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete reminder: {}", e))
                })?;

        deleted
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reminder {} not found", id)))
    }

    // -------------------------------------------------------------------------
    // Dashboard
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["dashboard_stats"])
            .start_timer();

        let total_customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_gst = FALSE")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count customers: {}", e))
                })?;

        let total_invoices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
            })?;

        let pending_amount: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(balance_amount), 0) FROM invoices WHERE balance_amount > 0",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to sum pending amount: {}", e))
        })?;

        let today_sales: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount), 0)
            FROM invoices
            WHERE (created_at AT TIME ZONE 'Asia/Kolkata')::date =
                  (now() AT TIME ZONE 'Asia/Kolkata')::date
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to sum today sales: {}", e)))?;

        timer.observe_duration();

        Ok(DashboardStats {
            total_customers,
            total_invoices,
            pending_amount,
            today_sales,
        })
    }
}
