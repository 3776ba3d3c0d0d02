//! In-memory implementation of every driven store port.
//!
//! One mutex guards the whole store, so each port call observes and mutates a
//! consistent snapshot, matching the transactional behaviour of the
//! PostgreSQL adapters. Used by tests and by the server when no database URL
//! is configured.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    CartRepository, CartRepositoryError, LedgerRepository, LedgerRepositoryError, NewUser,
    ProductRepository, ProductRepositoryError, ProductSlice, RoleRepository, RoleRepositoryError,
    Settlement, SettlementLine, SettlementOutcome, StockAdjustment, StoredCredentials,
    UserRepository, UserRepositoryError,
};
use crate::domain::{
    AddToCartOutcome, CartLine, LeaderboardEntry, Money, Multiplier, PasswordHash, Product,
    ProductDraft, ProductId, ProductSearch, PurchaseRecord, RoleName, RoleSet, SortColumn,
    SortDirection, User, UserId, Username,
};

const POISONED: &str = "in-memory store lock poisoned";

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: PasswordHash,
}

#[derive(Debug, Clone)]
struct Purchase {
    user_id: UserId,
    product_id: ProductId,
    quantity: u32,
    purchased_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
struct State {
    next_user_id: i64,
    next_product_id: i64,
    users: BTreeMap<UserId, UserRecord>,
    defined_roles: BTreeSet<RoleName>,
    grants: BTreeMap<UserId, RoleSet>,
    products: BTreeMap<ProductId, Product>,
    cart: BTreeMap<(UserId, ProductId), u32>,
    purchases: Vec<Purchase>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_user_id: 1,
            next_product_id: 1,
            users: BTreeMap::new(),
            defined_roles: [RoleName::user(), RoleName::admin()].into_iter().collect(),
            grants: BTreeMap::new(),
            products: BTreeMap::new(),
            cart: BTreeMap::new(),
            purchases: Vec::new(),
        }
    }
}

impl State {
    fn user_by_name(&self, username: &Username) -> Option<&UserRecord> {
        self.users
            .values()
            .find(|record| record.user.username == *username)
    }

    fn cart_lines(&self, user_id: UserId) -> Vec<CartLine> {
        self.cart
            .range((user_id, ProductId::new(i64::MIN))..=(user_id, ProductId::new(i64::MAX)))
            .filter_map(|(&(_, product_id), &quantity)| {
                self.products.get(&product_id).map(|product| CartLine {
                    product_id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity,
                    remaining_stock: product.quantity,
                })
            })
            .collect()
    }

    fn is_referenced(&self, id: ProductId) -> bool {
        self.cart.keys().any(|&(_, product_id)| product_id == id)
            || self.purchases.iter().any(|p| p.product_id == id)
    }
}

/// Thread-safe in-memory store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Empty store with the `user` and `admin` roles defined.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, String> {
        self.state.lock().map_err(|_| POISONED.to_owned())
    }
}

fn compare_optional<T: Ord>(left: Option<&T>, right: Option<&T>) -> Ordering {
    // NULLs sort last in ascending order, as in PostgreSQL.
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_products(column: SortColumn, a: &Product, b: &Product) -> Ordering {
    match column {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortColumn::Description => a
            .description
            .to_lowercase()
            .cmp(&b.description.to_lowercase()),
        SortColumn::Price => compare_optional(a.price.as_ref(), b.price.as_ref()),
        SortColumn::Quantity => compare_optional(a.quantity.as_ref(), b.quantity.as_ref()),
    }
}

fn matches_search(product: &Product, search: &ProductSearch, term: Option<&str>) -> bool {
    if !search.include_unlisted && !product.is_listed() {
        return false;
    }
    term.is_none_or(|term| {
        product.name.to_lowercase().contains(term)
            || product.description.to_lowercase().contains(term)
    })
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.user_by_name(username).map(|record| record.user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.user_by_name(username).map(|record| StoredCredentials {
            user: record.user.clone(),
            password_hash: record.password_hash.clone(),
        }))
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if state.user_by_name(&user.username).is_some() {
            return Err(UserRepositoryError::username_taken(user.username.as_str()));
        }
        let id = UserId::new(state.next_user_id);
        state.next_user_id += 1;
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            balance: Money::ZERO,
            multiplier: Multiplier::BASE,
        };
        state.users.insert(
            id,
            UserRecord {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn update_email(&self, id: UserId, email: &str) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state
            .users
            .get_mut(&id)
            .map(|record| record.user.email = email.to_owned())
            .is_some())
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state
            .users
            .get_mut(&id)
            .map(|record| record.password_hash = password_hash.clone())
            .is_some())
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.grants.remove(&id);
        state.cart.retain(|&(user_id, _), _| user_id != id);
        state.purchases.retain(|purchase| purchase.user_id != id);
        Ok(true)
    }

    async fn top_by_balance(
        &self,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        let mut users: Vec<&User> = state.users.values().map(|record| &record.user).collect();
        users.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(users
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|user| LeaderboardEntry {
                username: user.username.clone(),
                balance: user.balance,
            })
            .collect())
    }

    async fn credit_balance(
        &self,
        id: UserId,
        amount: Money,
    ) -> Result<Option<Money>, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        let Some(record) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        let balance = record
            .user
            .balance
            .checked_add(amount)
            .ok_or_else(|| UserRepositoryError::query("balance overflow"))?;
        record.user.balance = balance;
        Ok(Some(balance))
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn grant(&self, user_id: UserId, role: &RoleName) -> Result<bool, RoleRepositoryError> {
        let mut state = self.lock().map_err(RoleRepositoryError::query)?;
        if !state.users.contains_key(&user_id) {
            return Err(RoleRepositoryError::user_not_found(user_id.get()));
        }
        if !state.defined_roles.contains(role) {
            return Err(RoleRepositoryError::role_not_found(role.as_str()));
        }
        Ok(state
            .grants
            .entry(user_id)
            .or_default()
            .insert(role.clone()))
    }

    async fn revoke(&self, user_id: UserId, role: &RoleName) -> Result<bool, RoleRepositoryError> {
        let mut state = self.lock().map_err(RoleRepositoryError::query)?;
        if !state.users.contains_key(&user_id) {
            return Err(RoleRepositoryError::user_not_found(user_id.get()));
        }
        if !state.defined_roles.contains(role) {
            return Err(RoleRepositoryError::role_not_found(role.as_str()));
        }
        Ok(state
            .grants
            .get_mut(&user_id)
            .is_some_and(|roles| roles.remove(role)))
    }

    async fn roles_for(&self, user_id: UserId) -> Result<RoleSet, RoleRepositoryError> {
        let state = self.lock().map_err(RoleRepositoryError::query)?;
        Ok(state.grants.get(&user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn search(&self, search: &ProductSearch) -> Result<ProductSlice, ProductRepositoryError> {
        let state = self.lock().map_err(ProductRepositoryError::query)?;
        let term = search.normalised_term();
        let mut matches: Vec<&Product> = state
            .products
            .values()
            .filter(|product| matches_search(product, search, term.as_deref()))
            .collect();
        matches.sort_by(|a, b| {
            let ordering = compare_products(search.order_by, a, b);
            let ordering = match search.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });
        let total = u64::try_from(matches.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(search.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(search.page.limit()).unwrap_or(usize::MAX);
        Ok(ProductSlice {
            items: matches
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
            total,
        })
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        let state = self.lock().map_err(ProductRepositoryError::query)?;
        Ok(state.products.get(&id).cloned())
    }

    async fn insert(&self, draft: &ProductDraft) -> Result<Product, ProductRepositoryError> {
        let mut state = self.lock().map_err(ProductRepositoryError::query)?;
        let id = ProductId::new(state.next_product_id);
        state.next_product_id += 1;
        let product = draft.clone().into_product(id);
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, ProductRepositoryError> {
        let mut state = self.lock().map_err(ProductRepositoryError::query)?;
        let Some(slot) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        *slot = draft.clone().into_product(id);
        Ok(Some(slot.clone()))
    }

    async fn adjust_stock(
        &self,
        id: ProductId,
        delta: i64,
    ) -> Result<StockAdjustment, ProductRepositoryError> {
        let mut state = self.lock().map_err(ProductRepositoryError::query)?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| ProductRepositoryError::not_found(id.get()))?;
        let Some(current) = product.quantity else {
            return Ok(StockAdjustment::Unlimited);
        };
        // Mirrors the INTEGER column: results outside 0..=i32::MAX are refused.
        let adjusted = i64::from(current)
            .checked_add(delta)
            .filter(|quantity| *quantity <= i64::from(i32::MAX))
            .and_then(|quantity| u32::try_from(quantity).ok());
        match adjusted {
            Some(quantity) => {
                product.quantity = Some(quantity);
                Ok(StockAdjustment::Applied { quantity })
            }
            None => Ok(StockAdjustment::Rejected { quantity: current }),
        }
    }

    async fn delete(&self, id: ProductId, force: bool) -> Result<(), ProductRepositoryError> {
        let mut state = self.lock().map_err(ProductRepositoryError::query)?;
        if !state.products.contains_key(&id) {
            return Err(ProductRepositoryError::not_found(id.get()));
        }
        if state.is_referenced(id) {
            if !force {
                return Err(ProductRepositoryError::referenced(id.get()));
            }
            state.cart.retain(|&(_, product_id), _| product_id != id);
            state.purchases.retain(|purchase| purchase.product_id != id);
        }
        state.products.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn reserve(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddToCartOutcome, CartRepositoryError> {
        let mut guard = self.lock().map_err(CartRepositoryError::query)?;
        let state = &mut *guard;
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| CartRepositoryError::product_not_found(product_id.get()))?;
        if product.price.is_none() {
            return Err(CartRepositoryError::not_purchasable(product_id.get()));
        }
        let remaining_stock = match product.quantity {
            Some(available) if available < quantity => {
                return Ok(AddToCartOutcome::OutOfStock {
                    requested: quantity,
                    available,
                });
            }
            Some(available) => Some(available - quantity),
            None => None,
        };
        let line = state.cart.entry((user_id, product_id)).or_insert(0);
        let quantity_in_cart = line
            .checked_add(quantity)
            .ok_or_else(|| CartRepositoryError::query("cart quantity overflow"))?;
        *line = quantity_in_cart;
        product.quantity = remaining_stock;
        Ok(AddToCartOutcome::Reserved {
            quantity_in_cart,
            remaining_stock,
        })
    }

    async fn release(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<u32>, CartRepositoryError> {
        let mut state = self.lock().map_err(CartRepositoryError::query)?;
        let Some(quantity) = state.cart.remove(&(user_id, product_id)) else {
            return Ok(None);
        };
        if let Some(product) = state.products.get_mut(&product_id)
            && let Some(stock) = product.quantity.as_mut()
        {
            *stock = stock.saturating_add(quantity);
        }
        Ok(Some(quantity))
    }

    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartRepositoryError> {
        let state = self.lock().map_err(CartRepositoryError::query)?;
        Ok(state.cart_lines(user_id))
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, CartRepositoryError> {
        let mut state = self.lock().map_err(CartRepositoryError::query)?;
        let before = state.cart.len();
        state.cart.retain(|&(owner, _), _| owner != user_id);
        Ok(u64::try_from(before - state.cart.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStore {
    async fn settle(
        &self,
        settlement: &Settlement,
    ) -> Result<SettlementOutcome, LedgerRepositoryError> {
        let mut state = self.lock().map_err(LedgerRepositoryError::query)?;
        let user_id = settlement.user_id;
        let Some(balance) = state.users.get(&user_id).map(|record| record.user.balance) else {
            return Err(LedgerRepositoryError::user_not_found(user_id.get()));
        };
        let current: Option<Vec<SettlementLine>> = state
            .cart_lines(user_id)
            .into_iter()
            .map(|line| {
                line.unit_price.map(|unit_price| SettlementLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price,
                })
            })
            .collect();
        if current.as_ref() != Some(&settlement.lines) {
            return Err(LedgerRepositoryError::cart_changed());
        }
        let Some(remaining) = balance.checked_sub(settlement.total) else {
            return Ok(SettlementOutcome::InsufficientFunds { balance });
        };

        for line in &settlement.lines {
            state.purchases.push(Purchase {
                user_id,
                product_id: line.product_id,
                quantity: line.quantity,
                purchased_at: settlement.purchased_at,
            });
        }
        state.cart.retain(|&(owner, _), _| owner != user_id);
        let record = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| LedgerRepositoryError::user_not_found(user_id.get()))?;
        record.user.balance = remaining;
        record.user.multiplier = record.user.multiplier.raised_by(settlement.multiplier_bonus);
        Ok(SettlementOutcome::Settled {
            balance: remaining,
            multiplier: record.user.multiplier,
        })
    }

    async fn balance(&self, user_id: UserId) -> Result<Option<Money>, LedgerRepositoryError> {
        let state = self.lock().map_err(LedgerRepositoryError::query)?;
        Ok(state.users.get(&user_id).map(|record| record.user.balance))
    }

    async fn history(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PurchaseRecord>, LedgerRepositoryError> {
        let state = self.lock().map_err(LedgerRepositoryError::query)?;
        let mut records: Vec<PurchaseRecord> = state
            .purchases
            .iter()
            .filter(|purchase| purchase.user_id == user_id)
            .map(|purchase| PurchaseRecord {
                product_id: purchase.product_id,
                product_name: state
                    .products
                    .get(&purchase.product_id)
                    .map(|product| product.name.clone())
                    .unwrap_or_default(),
                quantity: purchase.quantity,
                purchased_at: purchase.purchased_at,
            })
            .collect();
        records.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(records)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
