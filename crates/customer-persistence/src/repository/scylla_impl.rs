//! ScyllaDB Store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use scylla::{Session, SessionBuilder};

use super::traits::CustomerRepository;
use crate::error::{PersistenceError, Result};
use customer_domain::{Customer, CustomerId};

/// CQL schema expected by [`ScyllaCustomerRepository`].
///
/// The email index backs `find_by_email`; email is not unique.
pub const SCHEMA: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS customers (
        id text PRIMARY KEY,
        name text,
        email text,
        address text
    )",
    "CREATE INDEX IF NOT EXISTS customers_email_idx ON customers (email)",
];

type CustomerRow = (String, String, String, String);

fn store_err(err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Store(err.to_string())
}

fn from_row((id, name, email, address): CustomerRow) -> Customer {
    Customer {
        id: Some(CustomerId::new(id)),
        name,
        email,
        address,
    }
}

// =============================================================================
// SCYLLA CONFIGURATION
// =============================================================================

/// ScyllaDB connection configuration.
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:9042".to_string()],
            keyspace: "customer_service".to_string(),
            username: None,
            password: None,
        }
    }
}

// =============================================================================
// SCYLLA CLIENT
// =============================================================================

/// ScyllaDB client wrapper.
pub struct ScyllaClient {
    session: Arc<Session>,
    pub config: ScyllaConfig,
}

impl ScyllaClient {
    /// Create a new ScyllaDB client bound to the configured keyspace.
    pub async fn new(config: ScyllaConfig) -> Result<Self> {
        let mut builder = SessionBuilder::new().known_nodes(&config.hosts);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.user(user, pass);
        }

        let session = builder.build().await.map_err(store_err)?;

        session
            .query_unpaged(format!("USE {}", config.keyspace), ())
            .await
            .map_err(store_err)?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    /// Create the `customers` table and email index if missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            self.session
                .query_unpaged(*statement, ())
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }
}

// =============================================================================
// CUSTOMER REPOSITORY
// =============================================================================

/// CQL-backed customer Store.
pub struct ScyllaCustomerRepository {
    client: Arc<ScyllaClient>,
}

impl ScyllaCustomerRepository {
    pub fn new(client: Arc<ScyllaClient>) -> Self {
        Self { client }
    }

    async fn select(
        &self,
        query: &str,
        values: impl scylla::serialize::row::SerializeRow,
    ) -> Result<Vec<Customer>> {
        let rows = self
            .client
            .session
            .query_unpaged(query, values)
            .await
            .map_err(store_err)?
            .into_rows_result()
            .map_err(store_err)?;

        rows.rows::<CustomerRow>()
            .map_err(store_err)?
            .map(|row| row.map(from_row).map_err(store_err))
            .collect()
    }
}

#[async_trait]
impl CustomerRepository for ScyllaCustomerRepository {
    async fn find_all(&self) -> Result<Vec<Customer>> {
        self.select("SELECT id, name, email, address FROM customers", ())
            .await
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>> {
        let mut found = self
            .select(
                "SELECT id, name, email, address FROM customers WHERE id = ?",
                (id.as_str(),),
            )
            .await?;
        Ok(found.pop())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>> {
        self.select(
            "SELECT id, name, email, address FROM customers WHERE email = ?",
            (email,),
        )
        .await
    }

    async fn exists_by_id(&self, id: &CustomerId) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn save(&self, mut customer: Customer) -> Result<Customer> {
        let id = customer.id.get_or_insert_with(CustomerId::generate).clone();

        // INSERT in CQL is an upsert, which is exactly the save contract.
        let query = r"
            INSERT INTO customers (id, name, email, address)
            VALUES (?, ?, ?, ?)
        ";

        self.client
            .session
            .query_unpaged(
                query,
                (
                    id.as_str(),
                    customer.name.as_str(),
                    customer.email.as_str(),
                    customer.address.as_str(),
                ),
            )
            .await
            .map_err(store_err)?;

        Ok(customer)
    }

    async fn delete_by_id(&self, id: &CustomerId) -> Result<()> {
        self.client
            .session
            .query_unpaged("DELETE FROM customers WHERE id = ?", (id.as_str(),))
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_become_persisted_customers() {
        let customer = from_row((
            "c-1".to_string(),
            "Alice Smith".to_string(),
            "alice@example.com".to_string(),
            "123 Main St".to_string(),
        ));

        assert_eq!(customer.id, Some(CustomerId::new("c-1")));
        assert_eq!(customer.name, "Alice Smith");
        assert_eq!(customer.email, "alice@example.com");
        assert_eq!(customer.address, "123 Main St");
    }

    #[test]
    fn test_schema_indexes_email() {
        assert_eq!(SCHEMA.len(), 2);
        assert!(SCHEMA[0].contains("CREATE TABLE IF NOT EXISTS customers"));
        assert!(SCHEMA[0].contains("id text PRIMARY KEY"));
        for column in ["name text", "email text", "address text"] {
            assert!(SCHEMA[0].contains(column), "missing column {column}");
        }
        assert!(SCHEMA[1].contains("ON customers (email)"));
    }

    #[test]
    fn test_driver_errors_are_store_unavailable() {
        let err = store_err("connection reset");
        assert!(err.is_store_unavailable());
        assert_eq!(err.to_string(), "Store unavailable: connection reset");
    }

    #[test]
    fn test_default_config() {
        let config = ScyllaConfig::default();
        assert_eq!(config.hosts, vec!["localhost:9042".to_string()]);
        assert_eq!(config.keyspace, "customer_service");
        assert!(config.username.is_none() && config.password.is_none());
    }
}
