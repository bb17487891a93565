//! Repository ports.
//!
//! Handlers depend on these traits rather than on a concrete database so the
//! same routes run against `PostgreSQL` in production and against the
//! in-process [`MemoryDatabase`](crate::db::MemoryDatabase) in tests. Each
//! method is a single logical unit of work: adapters that touch several
//! tables wrap the writes in one transaction.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use shopapp_core::{GroupId, OrderId, PermissionCode, ProductId, UserId, Username};

use crate::db::{
    MemoryDatabase, PgGroupRepository, PgHealthCheck, PgOrderRepository, PgProductRepository,
    PgUserRepository, RepositoryError,
};
use crate::models::{
    Group, GroupWithPermissions, NewOrder, Order, OrderWithRelations, Permission, Product,
    ProductInput, ProductScope, User,
};

/// Catalog persistence.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// List products in insertion order.
    async fn list(&self, scope: ProductScope) -> Result<Vec<Product>, RepositoryError>;

    /// Fetch a product by id, archived or not.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a new product.
    async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError>;

    /// Overwrite the editable fields of a product.
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    async fn update(&self, id: ProductId, input: &ProductInput)
    -> Result<Product, RepositoryError>;

    /// Set `archived = true`. The row is kept.
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    async fn archive(&self, id: ProductId) -> Result<Product, RepositoryError>;

    /// Return the oldest product with this name, creating one if none exists.
    ///
    /// The boolean is `true` when a row was inserted.
    async fn get_or_create_by_name(&self, name: &str) -> Result<(Product, bool), RepositoryError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// All orders with owners and products, oldest first.
    async fn list_with_relations(&self) -> Result<Vec<OrderWithRelations>, RepositoryError>;

    /// One order with owner and products.
    async fn get_with_relations(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithRelations>, RepositoryError>;

    /// Insert an order and its product links atomically.
    ///
    /// Returns `RepositoryError::Conflict` if the owner or a product does not exist.
    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError>;
}

/// User accounts and their permissions.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users ordered by username.
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError>;

    /// Fetch a user by id.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user by username.
    async fn get_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user together with their password hash, for login.
    async fn get_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Create an account.
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        is_superuser: bool,
    ) -> Result<User, RepositoryError>;

    /// Direct permissions plus those inherited from groups.
    ///
    /// Inactive users have none. Superuser status is not expanded here.
    async fn granted_permissions(
        &self,
        id: UserId,
    ) -> Result<BTreeSet<PermissionCode>, RepositoryError>;

    /// Grant a permission directly to a user. Granting twice is a no-op.
    async fn grant_permission(
        &self,
        id: UserId,
        code: &PermissionCode,
    ) -> Result<(), RepositoryError>;

    /// Add a user to a group. Adding twice is a no-op.
    async fn add_to_group(&self, id: UserId, group_id: GroupId) -> Result<(), RepositoryError>;
}

/// Groups and the permission catalogue.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// All groups with permissions, ordered by id.
    async fn list_with_permissions(&self) -> Result<Vec<GroupWithPermissions>, RepositoryError>;

    /// Fetch a group by exact name.
    async fn get_by_name(&self, name: &str) -> Result<Option<Group>, RepositoryError>;

    /// Create a group.
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    async fn create(&self, name: &str) -> Result<Group, RepositoryError>;

    /// Grant a permission to a group. Granting twice is a no-op.
    async fn grant_permission(
        &self,
        id: GroupId,
        code: &PermissionCode,
    ) -> Result<(), RepositoryError>;

    /// Every known permission ordered by codename.
    async fn list_permissions(&self) -> Result<Vec<Permission>, RepositoryError>;
}

/// Store liveness for the readiness endpoint.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Succeeds if the store can serve queries.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The full set of repositories a request may need.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    /// `PostgreSQL`-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            products: Arc::new(PgProductRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
            health: Arc::new(PgHealthCheck::new(pool.clone())),
        }
    }

    /// In-process repositories sharing one [`MemoryDatabase`].
    #[must_use]
    pub fn in_memory(db: &Arc<MemoryDatabase>) -> Self {
        Self {
            products: db.clone(),
            orders: db.clone(),
            users: db.clone(),
            groups: db.clone(),
            health: db.clone(),
        }
    }
}
