//! Client-resident shopping cart.
//!
//! The cart lives with the session or view that owns it and is handed by
//! reference to checkout. It is never stored server-side; each book appears at
//! most once and carries a snapshot of its display fields taken when added.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::orders::CreateOrderRequest,
    models::{Address, Book, Category},
    pricing::round_to_cents,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub book_id: Uuid,
    pub title: String,
    pub category: Category,
    pub new_price: f64,
    pub cover_image: Option<String>,
}

impl From<&Book> for CartEntry {
    fn from(book: &Book) -> Self {
        Self {
            book_id: book.id,
            title: book.title.clone(),
            category: book.category,
            new_price: book.new_price,
            cover_image: book.cover_image.clone(),
        }
    }
}

/// Contact and shipping details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart is empty")]
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    entries: Vec<CartEntry>,
}

/// Cart as read back from client storage, before duplicate ids are dropped.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    entries: Vec<CartEntry>,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Cart::new();
        for entry in stored.entries {
            if !cart.contains(entry.book_id) {
                cart.entries.push(entry);
            }
        }
        cart
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snapshot of `book`. Returns `false` when the book is already present.
    pub fn add(&mut self, book: &Book) -> bool {
        if self.contains(book.id) {
            return false;
        }
        self.entries.push(CartEntry::from(book));
        true
    }

    /// Remove the entry for `book_id`. Returns `false` when it was not present.
    pub fn remove(&mut self, book_id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.book_id != book_id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, book_id: Uuid) -> bool {
        self.entries.iter().any(|entry| entry.book_id == book_id)
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of `newPrice` over all entries, rounded to cents.
    pub fn total(&self) -> f64 {
        round_to_cents(self.entries.iter().map(|entry| entry.new_price).sum())
    }

    pub fn book_ids(&self) -> Vec<Uuid> {
        self.entries.iter().map(|entry| entry.book_id).collect()
    }

    /// Build the order submission for this cart. The cart itself is left as-is;
    /// callers clear it once the order has been accepted.
    pub fn checkout(&self, customer: Customer) -> Result<CreateOrderRequest, CartError> {
        if self.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(CreateOrderRequest {
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            address: customer.address,
            product_ids: self.book_ids(),
            total_price: self.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn book(title: &str, price: f64) -> Book {
        let now = Utc::now();
        Book {
            id: Uuid::new_v4(),
            title: title.into(),
            author: "Anon".into(),
            description: "A book".into(),
            category: Category::Fiction,
            old_price: None,
            new_price: price,
            cover_image: Some("cover.png".into()),
            trending: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn customer() -> Customer {
        Customer {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
            address: Address {
                city: "Bath".into(),
                country: "UK".into(),
                state: "Somerset".into(),
                zipcode: "12345".into(),
            },
        }
    }

    #[test]
    fn add_is_idempotent() {
        let b = book("Emma", 9.99);
        let mut once = Cart::new();
        once.add(&b);

        let mut twice = Cart::new();
        assert!(twice.add(&b));
        assert!(!twice.add(&b));

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn add_keeps_first_snapshot() {
        let mut b = book("Emma", 9.99);
        let mut cart = Cart::new();
        cart.add(&b);
        b.new_price = 1.0;
        cart.add(&b);
        assert_eq!(cart.entries()[0].new_price, 9.99);
    }

    #[test]
    fn remove_and_clear() {
        let a = book("A", 1.0);
        let b = book("B", 2.0);
        let mut cart = Cart::new();
        cart.add(&a);
        cart.add(&b);

        assert!(cart.remove(a.id));
        assert!(!cart.remove(a.id));
        assert_eq!(cart.book_ids(), vec![b.id]);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0.0);
    }

    #[test]
    fn total_sums_and_rounds() {
        let mut cart = Cart::new();
        for price in [0.1, 0.2, 10.554, 4.0] {
            cart.add(&book("x", price));
        }
        assert_eq!(cart.total(), 14.85);
    }

    #[test]
    fn checkout_carries_ids_in_cart_order_and_total() {
        let a = book("A", 12.5);
        let b = book("B", 33.0);
        let mut cart = Cart::new();
        cart.add(&a);
        cart.add(&b);

        let request = cart.checkout(customer()).unwrap();
        assert_eq!(request.product_ids, vec![a.id, b.id]);
        assert_eq!(request.total_price, 45.5);
        assert_eq!(request.email, "jane@example.com");
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn checkout_refuses_empty_cart() {
        assert_eq!(Cart::new().checkout(customer()), Err(CartError::Empty));
    }

    #[test]
    fn cart_round_trips_through_json_storage() {
        let mut cart = Cart::new();
        cart.add(&book("Persisted", 3.5));
        let stored = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn restored_cart_keeps_one_entry_per_book() {
        let dune = book("Dune", 10.0);
        let emma = book("Emma", 2.5);
        let entry = serde_json::to_value(CartEntry::from(&dune)).unwrap();
        let other = serde_json::to_value(CartEntry::from(&emma)).unwrap();
        let raw = serde_json::json!({ "entries": [entry.clone(), other, entry] });

        let cart: Cart = serde_json::from_value(raw).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.book_ids(), vec![dune.id, emma.id]);
        assert_eq!(cart.total(), 12.5);
    }
}
