//! In-process implementation of every repository port.
//!
//! Mirrors the `PostgreSQL` adapters closely enough for the HTTP layer to be
//! exercised without a database: serial ids, insertion ordering, unique
//! names, and foreign-key checks all behave the same way.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use shopapp_core::{
    GroupId, OrderId, PermissionCode, PermissionId, ProductId, UserId, Username,
};

use super::RepositoryError;
use crate::models::{
    Group, GroupWithPermissions, NewOrder, Order, OrderWithRelations, Permission, Product,
    ProductInput, ProductScope, User,
};
use crate::ports::{
    GroupRepository, HealthCheck, OrderRepository, ProductRepository, UserRepository,
};

/// Permissions installed by the auth migration, in the same order.
const BUILTIN_PERMISSIONS: [(&str, &str); 8] = [
    ("shopapp.add_product", "Can add product"),
    ("shopapp.change_product", "Can change product"),
    ("shopapp.delete_product", "Can delete product"),
    ("shopapp.view_product", "Can view product"),
    ("shopapp.add_order", "Can add order"),
    ("shopapp.change_order", "Can change order"),
    ("shopapp.delete_order", "Can delete order"),
    ("shopapp.view_order", "Can view order"),
];

#[derive(Default)]
struct State {
    products: Vec<Product>,
    orders: Vec<(Order, BTreeSet<ProductId>)>,
    users: Vec<(User, String)>,
    groups: Vec<Group>,
    permissions: Vec<Permission>,
    group_permissions: BTreeSet<(GroupId, PermissionId)>,
    user_groups: BTreeSet<(UserId, GroupId)>,
    user_permissions: BTreeSet<(UserId, PermissionId)>,
    sequences: HashMap<&'static str, i32>,
}

impl State {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let next = self.sequences.entry(table).or_insert(0);
        *next += 1;
        *next
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().map(|(u, _)| u).find(|u| u.id == id)
    }

    fn permission_id(&self, code: &PermissionCode) -> Option<PermissionId> {
        self.permissions
            .iter()
            .find(|p| &p.code == code)
            .map(|p| p.id)
    }

    fn with_relations(
        &self,
        order: &Order,
        product_ids: &BTreeSet<ProductId>,
    ) -> Result<OrderWithRelations, RepositoryError> {
        let owner = self.user(order.user_id).cloned().ok_or_else(|| {
            RepositoryError::DataCorruption(format!("order {} has no owner", order.id))
        })?;
        let products = self
            .products
            .iter()
            .filter(|p| product_ids.contains(&p.id))
            .cloned()
            .collect();

        Ok(OrderWithRelations {
            order: order.clone(),
            owner,
            products,
        })
    }
}

/// Shared in-memory store.
///
/// Wrap in an `Arc` and hand to [`crate::ports::Repositories::in_memory`].
pub struct MemoryDatabase {
    state: RwLock<State>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Create an empty store holding only the built-in permissions.
    #[must_use]
    pub fn new() -> Self {
        let mut state = State::default();
        for (code, name) in BUILTIN_PERMISSIONS {
            let id = state.next_id("permission");
            if let Ok(code) = PermissionCode::parse(code) {
                state.permissions.push(Permission {
                    id: PermissionId::new(id),
                    code,
                    name: name.to_owned(),
                });
            }
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Activate or deactivate an account.
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn set_user_active(&self, id: UserId, active: bool) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let (user, _) = state
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.is_active = active;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryDatabase {
    async fn list(&self, scope: ProductScope) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .filter(|p| scope.includes(p))
            .cloned()
            .collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        let id = state.next_id("product");
        let product = Product {
            id: ProductId::new(id),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            discount: input.discount,
            created_at: Utc::now(),
            archived: false,
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        product.name.clone_from(&input.name);
        product.description.clone_from(&input.description);
        product.price = input.price;
        product.discount = input.discount;
        Ok(product.clone())
    }

    async fn archive(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        product.archived = true;
        Ok(product.clone())
    }

    async fn get_or_create_by_name(&self, name: &str) -> Result<(Product, bool), RepositoryError> {
        // Holding the write lock across lookup and insert keeps this atomic.
        let mut state = self.state.write().await;
        if let Some(existing) = state.products.iter().find(|p| p.name == name) {
            return Ok((existing.clone(), false));
        }

        let input = ProductInput::named(name);
        let id = state.next_id("product");
        let product = Product {
            id: ProductId::new(id),
            name: input.name,
            description: input.description,
            price: input.price,
            discount: input.discount,
            created_at: Utc::now(),
            archived: false,
        };
        state.products.push(product.clone());
        Ok((product, true))
    }
}

#[async_trait]
impl OrderRepository for MemoryDatabase {
    async fn list_with_relations(&self) -> Result<Vec<OrderWithRelations>, RepositoryError> {
        let state = self.state.read().await;
        state
            .orders
            .iter()
            .map(|(order, products)| state.with_relations(order, products))
            .collect()
    }

    async fn get_with_relations(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithRelations>, RepositoryError> {
        let state = self.state.read().await;
        state
            .orders
            .iter()
            .find(|(order, _)| order.id == id)
            .map(|(order, products)| state.with_relations(order, products))
            .transpose()
    }

    async fn create(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let mut state = self.state.write().await;
        if state.user(new.user_id).is_none() {
            return Err(RepositoryError::Conflict(
                "order owner references a missing row".to_owned(),
            ));
        }
        let known: BTreeSet<ProductId> = state.products.iter().map(|p| p.id).collect();
        if new.product_ids.iter().any(|id| !known.contains(id)) {
            return Err(RepositoryError::Conflict(
                "order product references a missing row".to_owned(),
            ));
        }

        let id = state.next_id("order");
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(id),
            user_id: new.user_id,
            delivery_address: new.delivery_address.clone(),
            promocode: new.promocode.clone(),
            created_at: now,
            updated_at: now,
        };
        let products = new.product_ids.iter().copied().collect();
        state.orders.push((order.clone(), products));
        Ok(order)
    }
}

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.iter().map(|(u, _)| u.clone()).collect();
        users.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(users)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.user(id).cloned())
    }

    async fn get_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .map(|(u, _)| u)
            .find(|u| &u.username == username)
            .cloned())
    }

    async fn get_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|(u, _)| &u.username == username)
            .cloned())
    }

    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        is_superuser: bool,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|(u, _)| &u.username == username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let id = state.next_id("user");
        let user = User {
            id: UserId::new(id),
            username: username.clone(),
            is_superuser,
            is_active: true,
            date_joined: Utc::now(),
        };
        state.users.push((user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn granted_permissions(
        &self,
        id: UserId,
    ) -> Result<BTreeSet<PermissionCode>, RepositoryError> {
        let state = self.state.read().await;
        if !state.user(id).is_some_and(|u| u.is_active) {
            return Ok(BTreeSet::new());
        }

        let groups: BTreeSet<GroupId> = state
            .user_groups
            .iter()
            .filter(|(user, _)| *user == id)
            .map(|(_, group)| *group)
            .collect();
        let direct = state
            .user_permissions
            .iter()
            .filter(|(user, _)| *user == id)
            .map(|(_, perm)| *perm);
        let inherited = state
            .group_permissions
            .iter()
            .filter(|(group, _)| groups.contains(group))
            .map(|(_, perm)| *perm);
        let ids: BTreeSet<PermissionId> = direct.chain(inherited).collect();

        Ok(state
            .permissions
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| p.code.clone())
            .collect())
    }

    async fn grant_permission(
        &self,
        id: UserId,
        code: &PermissionCode,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let permission = state.permission_id(code).ok_or(RepositoryError::NotFound)?;
        if state.user(id).is_none() {
            return Err(RepositoryError::Conflict(
                "user permission references a missing row".to_owned(),
            ));
        }
        state.user_permissions.insert((id, permission));
        Ok(())
    }

    async fn add_to_group(&self, id: UserId, group_id: GroupId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.user(id).is_none() || !state.groups.iter().any(|g| g.id == group_id) {
            return Err(RepositoryError::Conflict(
                "group membership references a missing row".to_owned(),
            ));
        }
        state.user_groups.insert((id, group_id));
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryDatabase {
    async fn list_with_permissions(&self) -> Result<Vec<GroupWithPermissions>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .iter()
            .map(|group| {
                let mut permissions: Vec<Permission> = state
                    .permissions
                    .iter()
                    .filter(|p| state.group_permissions.contains(&(group.id, p.id)))
                    .cloned()
                    .collect();
                permissions.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
                GroupWithPermissions {
                    group: group.clone(),
                    permissions,
                }
            })
            .collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Group>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|g| g.name == name).cloned())
    }

    async fn create(&self, name: &str) -> Result<Group, RepositoryError> {
        let mut state = self.state.write().await;
        if state.groups.iter().any(|g| g.name == name) {
            return Err(RepositoryError::Conflict("group already exists".to_owned()));
        }

        let id = state.next_id("group");
        let group = Group {
            id: GroupId::new(id),
            name: name.to_owned(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn grant_permission(
        &self,
        id: GroupId,
        code: &PermissionCode,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let permission = state.permission_id(code).ok_or(RepositoryError::NotFound)?;
        if !state.groups.iter().any(|g| g.id == id) {
            return Err(RepositoryError::Conflict(
                "group permission references a missing row".to_owned(),
            ));
        }
        state.group_permissions.insert((id, permission));
        Ok(())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, RepositoryError> {
        let state = self.state.read().await;
        let mut permissions = state.permissions.clone();
        permissions.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
        Ok(permissions)
    }
}

#[async_trait]
impl HealthCheck for MemoryDatabase {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> PermissionCode {
        PermissionCode::parse(s).unwrap()
    }

    async fn user(db: &MemoryDatabase, name: &str) -> User {
        UserRepository::create(db, &Username::parse(name).unwrap(), "hash", false)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn archive_hides_product_from_live_scope_only() {
        let db = MemoryDatabase::new();
        let laptop = ProductRepository::create(&db, &ProductInput::named("Laptop"))
            .await
            .unwrap();
        ProductRepository::create(&db, &ProductInput::named("Desktop"))
            .await
            .unwrap();

        let archived = db.archive(laptop.id).await.unwrap();
        assert!(archived.archived);

        let live = db.list(ProductScope::Live).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].name, "Desktop");
        assert_eq!(db.list(ProductScope::All).await.unwrap().len(), 2);
        assert!(db.get(laptop.id).await.unwrap().unwrap().archived);
    }

    #[tokio::test]
    async fn archive_unknown_product_is_not_found() {
        let db = MemoryDatabase::new();
        let err = db.archive(ProductId::new(99)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let db = MemoryDatabase::new();
        let (first, created) = db.get_or_create_by_name("Laptop").await.unwrap();
        assert!(created);
        let (second, created) = db.get_or_create_by_name("Laptop").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(db.list(ProductScope::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn group_names_are_unique() {
        let db = MemoryDatabase::new();
        GroupRepository::create(&db, "managers").await.unwrap();
        let err = GroupRepository::create(&db, "managers").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn permissions_are_inherited_from_groups() {
        let db = MemoryDatabase::new();
        let jane = user(&db, "jane").await;
        let group = GroupRepository::create(&db, "order-viewers").await.unwrap();
        GroupRepository::grant_permission(&db, group.id, &code("shopapp.view_order"))
            .await
            .unwrap();
        UserRepository::grant_permission(&db, jane.id, &code("shopapp.add_product"))
            .await
            .unwrap();

        assert_eq!(db.granted_permissions(jane.id).await.unwrap().len(), 1);

        db.add_to_group(jane.id, group.id).await.unwrap();
        let granted = db.granted_permissions(jane.id).await.unwrap();
        assert!(granted.contains(&code("shopapp.view_order")));
        assert!(granted.contains(&code("shopapp.add_product")));
    }

    #[tokio::test]
    async fn inactive_users_have_no_permissions() {
        let db = MemoryDatabase::new();
        let jane = user(&db, "jane").await;
        UserRepository::grant_permission(&db, jane.id, &code("shopapp.view_order"))
            .await
            .unwrap();
        db.set_user_active(jane.id, false).await.unwrap();

        assert!(db.granted_permissions(jane.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_permission_is_not_found() {
        let db = MemoryDatabase::new();
        let jane = user(&db, "jane").await;
        let err = UserRepository::grant_permission(&db, jane.id, &code("shopapp.fly"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn order_with_unknown_product_is_rejected() {
        let db = MemoryDatabase::new();
        let jane = user(&db, "jane").await;
        let order = NewOrder {
            user_id: jane.id,
            product_ids: vec![ProductId::new(7)],
            delivery_address: None,
            promocode: String::new(),
        };

        let err = OrderRepository::create(&db, &order).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(db.list_with_relations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_load_owner_and_products() {
        let db = MemoryDatabase::new();
        let jane = user(&db, "jane").await;
        let (laptop, _) = db.get_or_create_by_name("Laptop").await.unwrap();
        let order = OrderRepository::create(
            &db,
            &NewOrder {
                user_id: jane.id,
                product_ids: vec![laptop.id],
                delivery_address: Some("1 Main St".to_owned()),
                promocode: "SALE".to_owned(),
            },
        )
        .await
        .unwrap();

        let loaded = db.get_with_relations(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.owner.username.as_str(), "jane");
        assert_eq!(loaded.products.len(), 1);
        assert_eq!(loaded.products[0].name, "Laptop");
    }
}
