//! Row identifiers and slug helpers.
//!
//! Every table uses a `SERIAL` primary key, so ids are plain `i32`s.

pub type UserId = i32;
pub type CategoryId = i32;
pub type ProductId = i32;
pub type CartItemId = i32;
pub type OrderId = i32;
pub type OrderItemId = i32;

/// Build a URL slug from a display name.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
