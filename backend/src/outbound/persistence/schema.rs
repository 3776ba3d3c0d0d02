//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts with their spendable balance.
    users (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        /// Bcrypt hash; never leaves the persistence layer except for
        /// verification.
        password_hash -> Varchar,
        /// Balance in cents, never negative.
        balance_cents -> Int8,
        /// Earn multiplier, at least one.
        multiplier -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Defined role names. Seeded with `user` and `admin`.
    roles (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    /// User-role grants.
    user_roles (user_id, role_id) {
        user_id -> Int8,
        role_id -> Int4,
    }
}

diesel::table! {
    /// Catalogue products.
    products (id) {
        id -> Int8,
        name -> Varchar,
        description -> Varchar,
        /// Unit price in cents; NULL means not for sale.
        price_cents -> Nullable<Int8>,
        /// Remaining stock; NULL means unlimited.
        quantity -> Nullable<Int4>,
    }
}

diesel::table! {
    /// Reserved cart lines, one per user and product.
    cart_items (id) {
        id -> Int8,
        user_id -> Int8,
        product_id -> Int8,
        quantity -> Int4,
    }
}

diesel::table! {
    /// Append-only purchase records.
    purchases (id) {
        id -> Int8,
        user_id -> Int8,
        product_id -> Int8,
        quantity -> Int4,
        purchased_at -> Timestamptz,
    }
}

diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(user_roles -> roles (role_id));
diesel::joinable!(cart_items -> users (user_id));
diesel::joinable!(cart_items -> products (product_id));
diesel::joinable!(purchases -> users (user_id));
diesel::joinable!(purchases -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    users, roles, user_roles, products, cart_items, purchases,
);
