//! Invariants of the reservation model under concurrent use.
//!
//! Runs the domain services over the in-memory store on a multi-threaded
//! runtime so reservations and checkouts genuinely race.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::{fixture, rstest};
use storefront::domain::{
    AddToCartOutcome, CheckoutOutcome, Money, ProductDraft, ProductId, SignupForm, User,
};
use storefront::inbound::http::state::{HttpStatePorts, Repositories};
use storefront::outbound::hashing::BcryptPasswordHasher;
use storefront::outbound::memory::InMemoryStore;
use zeroize::Zeroizing;

#[fixture]
fn ports() -> HttpStatePorts {
    let store = Arc::new(InMemoryStore::new());
    HttpStatePorts::from_repositories(
        Repositories {
            users: store.clone(),
            roles: store.clone(),
            products: store.clone(),
            carts: store.clone(),
            ledger: store,
        },
        Arc::new(BcryptPasswordHasher::with_cost(4)),
        Arc::new(DefaultClock),
    )
}

async fn shopper(ports: &HttpStatePorts, username: &str) -> User {
    ports
        .accounts
        .signup(SignupForm {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password: Zeroizing::new("hunter22".to_owned()),
            confirm_password: Zeroizing::new("hunter22".to_owned()),
        })
        .await
        .expect("signup")
}

async fn product(ports: &HttpStatePorts, price_cents: i64, stock: Option<u32>) -> ProductId {
    let price = Money::from_cents(price_cents).expect("price");
    let draft = ProductDraft::new("Mug", None, Some(price), stock).expect("draft");
    ports
        .catalogue
        .create_product(draft)
        .await
        .expect("created")
        .id
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_never_oversell(ports: HttpStatePorts) {
    let mug = product(&ports, 500, Some(5)).await;
    let mut shoppers = Vec::new();
    for index in 0..12 {
        shoppers.push(shopper(&ports, &format!("racer{index:02}")).await);
    }

    let attempts = shoppers.into_iter().map(|user| {
        let cart = ports.cart.clone();
        tokio::spawn(async move { cart.add_to_cart(user.id, mug, 1).await })
    });
    let mut reserved = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        match attempt.await.expect("task").expect("store call") {
            AddToCartOutcome::Reserved { .. } => reserved += 1,
            AddToCartOutcome::OutOfStock { available, .. } => assert_eq!(available, 0),
        }
    }

    assert_eq!(reserved, 5);
    let remaining = ports.catalogue.product(mug).await.expect("product").quantity;
    assert_eq!(remaining, Some(0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reserved_plus_remaining_stock_is_conserved(ports: HttpStatePorts) {
    let mug = product(&ports, 500, Some(20)).await;
    let alice = shopper(&ports, "alice1").await;
    let bobby = shopper(&ports, "bobby1").await;

    let mut tasks = Vec::new();
    for (user, quantity) in [(alice.id, 3), (bobby.id, 4), (alice.id, 2), (bobby.id, 30)] {
        let cart = ports.cart.clone();
        tasks.push(tokio::spawn(async move {
            cart.add_to_cart(user, mug, quantity).await
        }));
    }
    for task in tasks {
        task.await.expect("task").expect("store call");
    }
    let released = ports
        .cart
        .remove_from_cart(alice.id, mug)
        .await
        .expect("alice removes");

    let held: u32 = ports
        .cart
        .cart_items(bobby.id)
        .await
        .expect("bobby's cart")
        .iter()
        .map(|line| line.quantity)
        .sum();
    let remaining = ports
        .catalogue
        .product(mug)
        .await
        .expect("product")
        .quantity
        .expect("tracked stock");
    assert_eq!(released, 5);
    assert_eq!(held, 4);
    assert_eq!(held + remaining, 20);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_cart_is_paid_for_once(ports: HttpStatePorts) {
    let mug = product(&ports, 1_000, Some(3)).await;
    let buyer = shopper(&ports, "buyer1").await;
    ports
        .accounts
        .earn(&buyer.username, 50)
        .await
        .expect("funded");
    ports
        .cart
        .add_to_cart(buyer.id, mug, 2)
        .await
        .expect("reserved");

    let first = {
        let checkout = ports.checkout.clone();
        tokio::spawn(async move { checkout.checkout(buyer.id, None).await })
    };
    let second = {
        let checkout = ports.checkout.clone();
        tokio::spawn(async move { checkout.checkout(buyer.id, None).await })
    };
    let outcomes = [
        first.await.expect("task"),
        second.await.expect("task"),
    ];

    let completed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Ok(CheckoutOutcome::Completed(_))))
        .count();
    assert_eq!(completed, 1);
    let preview = ports.checkout.preview(buyer.id).await.expect("preview");
    assert_eq!(preview.balance, Money::from_cents(3_000).expect("amount"));
    let history = ports
        .checkout
        .purchase_history(buyer.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].total_quantity, 2);
}

#[rstest]
#[tokio::test]
async fn refused_checkout_leaves_everything_in_place(ports: HttpStatePorts) {
    let mug = product(&ports, 1_000, Some(3)).await;
    let buyer = shopper(&ports, "buyer2").await;
    ports.accounts.earn(&buyer.username, 9).await.expect("funded");
    ports
        .cart
        .add_to_cart(buyer.id, mug, 1)
        .await
        .expect("reserved");

    let outcome = ports
        .checkout
        .checkout(buyer.id, None)
        .await
        .expect("checkout");

    assert!(matches!(outcome, CheckoutOutcome::InsufficientFunds { .. }));
    let preview = ports.checkout.preview(buyer.id).await.expect("preview");
    assert_eq!(preview.lines.len(), 1);
    assert_eq!(preview.balance, Money::from_cents(900).expect("amount"));
    let remaining = ports.catalogue.product(mug).await.expect("product").quantity;
    assert_eq!(remaining, Some(2));
}
