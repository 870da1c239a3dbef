//! Catalog inspection commands.

use super::{CommandError, Context, print_json};

/// Print every product in the configured catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn list(ctx: &Context) -> Result<(), CommandError> {
    let products = ctx.catalog()?.products();
    tracing::info!(products = products.len(), "Listing catalog");
    print_json(&products)
}
