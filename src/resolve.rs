//! Category resolution.
//!
//! Category tokens name a category by id (`category:5`), by slug (`#bugs`) or
//! by parent and slug (`#support:bugs`). Turning those into a [`CategoryRef`]
//! is the host's job; the engine only relies on the [`CategoryResolver`]
//! contract below. Lookups are synchronous and total: a miss is `None`.

use crate::CategoryRef;
use std::sync::Arc;

pub trait CategoryResolver {
    fn resolve_by_id(&self, id: u64) -> Option<CategoryRef>;
    fn resolve_by_slug(&self, slug: &str) -> Option<CategoryRef>;
    fn resolve_by_parent_and_slug(&self, parent_slug: &str, slug: &str) -> Option<CategoryRef>;
}

impl<R: CategoryResolver + ?Sized> CategoryResolver for &R {
    fn resolve_by_id(&self, id: u64) -> Option<CategoryRef> {
        (**self).resolve_by_id(id)
    }

    fn resolve_by_slug(&self, slug: &str) -> Option<CategoryRef> {
        (**self).resolve_by_slug(slug)
    }

    fn resolve_by_parent_and_slug(&self, parent_slug: &str, slug: &str) -> Option<CategoryRef> {
        (**self).resolve_by_parent_and_slug(parent_slug, slug)
    }
}

impl<R: CategoryResolver + ?Sized> CategoryResolver for Box<R> {
    fn resolve_by_id(&self, id: u64) -> Option<CategoryRef> {
        (**self).resolve_by_id(id)
    }

    fn resolve_by_slug(&self, slug: &str) -> Option<CategoryRef> {
        (**self).resolve_by_slug(slug)
    }

    fn resolve_by_parent_and_slug(&self, parent_slug: &str, slug: &str) -> Option<CategoryRef> {
        (**self).resolve_by_parent_and_slug(parent_slug, slug)
    }
}

impl<R: CategoryResolver + ?Sized> CategoryResolver for Arc<R> {
    fn resolve_by_id(&self, id: u64) -> Option<CategoryRef> {
        (**self).resolve_by_id(id)
    }

    fn resolve_by_slug(&self, slug: &str) -> Option<CategoryRef> {
        (**self).resolve_by_slug(slug)
    }

    fn resolve_by_parent_and_slug(&self, parent_slug: &str, slug: &str) -> Option<CategoryRef> {
        (**self).resolve_by_parent_and_slug(parent_slug, slug)
    }
}

/// Resolve the stripped payload of a category token.
///
/// ```text
/// "support:bugs" ──▶ resolve_by_parent_and_slug("support", "bugs")
/// "bugs"         ──▶ resolve_by_slug("bugs")
/// "5"            ──▶ resolve_by_id(5)
/// ```
pub(crate) fn resolve_category_payload<R: CategoryResolver + ?Sized>(
    resolver: &R,
    payload: &str,
) -> Option<CategoryRef> {
    let mut parts = payload.split(':');
    let first = parts.next().unwrap_or_default();

    if let Some(second) = parts.next() {
        return resolver.resolve_by_parent_and_slug(first, second);
    }

    match first.parse::<u64>() {
        Ok(id) => resolver.resolve_by_id(id),
        Err(_) => resolver.resolve_by_slug(first),
    }
}

// --- In-memory catalog -------------------------------------------------------

/// A simple in-memory category list.
///
/// Slugs compare ASCII case-insensitively. A bare slug only resolves to a
/// top-level category; subcategories need their parent slug.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    categories: Vec<CategoryRef>,
}

impl CategoryCatalog {
    pub fn new(categories: Vec<CategoryRef>) -> Self {
        Self { categories }
    }

    pub fn insert(&mut self, category: CategoryRef) {
        self.categories.retain(|c| c.id != category.id);
        self.categories.push(category);
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<CategoryRef> for CategoryCatalog {
    fn from_iter<I: IntoIterator<Item = CategoryRef>>(iter: I) -> Self {
        Self { categories: iter.into_iter().collect() }
    }
}

impl CategoryResolver for CategoryCatalog {
    fn resolve_by_id(&self, id: u64) -> Option<CategoryRef> {
        self.categories.iter().find(|c| c.id == id).cloned()
    }

    fn resolve_by_slug(&self, slug: &str) -> Option<CategoryRef> {
        self.categories.iter().find(|c| c.parent_slug.is_none() && c.slug.eq_ignore_ascii_case(slug)).cloned()
    }

    fn resolve_by_parent_and_slug(&self, parent_slug: &str, slug: &str) -> Option<CategoryRef> {
        self.categories
            .iter()
            .find(|c| {
                c.slug.eq_ignore_ascii_case(slug)
                    && c.parent_slug.as_deref().is_some_and(|p| p.eq_ignore_ascii_case(parent_slug))
            })
            .cloned()
    }
}
