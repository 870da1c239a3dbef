//! Cart commands.
//!
//! Mutations print the outcome message followed by the new cart state.
//! Rejections print the message and fail the command.

use till_core::ProductId;

use super::{CommandError, Context, print_json};

/// Print the current cart.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn show(ctx: &Context) -> Result<(), CommandError> {
    print_json(&ctx.cart.snapshot())
}

/// Add `quantity` units of a catalog product.
///
/// # Errors
///
/// Returns an error if the product is unknown or the cart rejects the add.
pub fn add(ctx: &Context, product_id: &str, quantity: u32) -> Result<(), CommandError> {
    let product = ctx.product(product_id)?;
    let result = ctx.cart.add_item(&product, quantity);
    finish(ctx, result)
}

/// Set the quantity of a line.
///
/// # Errors
///
/// Returns an error if the cart rejects the update.
pub fn update(ctx: &Context, product_id: &str, quantity: u32) -> Result<(), CommandError> {
    let result = ctx
        .cart
        .update_item_quantity(&ProductId::new(product_id), quantity);
    finish(ctx, result)
}

/// Remove a line. Removing an absent product succeeds quietly.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn remove(ctx: &Context, product_id: &str) -> Result<(), CommandError> {
    ctx.cart.remove_item(&ProductId::new(product_id));
    finish(ctx, Ok(()))
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn clear(ctx: &Context) -> Result<(), CommandError> {
    ctx.cart.clear_cart();
    finish(ctx, Ok(()))
}

/// Refresh line snapshots from the catalog.
///
/// # Errors
///
/// Returns [`CommandError::StockConflicts`] if any line exceeds current stock.
pub fn refresh(ctx: &Context) -> Result<(), CommandError> {
    let catalog = ctx.catalog()?;
    let conflicts = ctx.cart.refresh_snapshots(&catalog);
    finish(ctx, Ok(()))?;

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(CommandError::StockConflicts(conflicts.len()))
    }
}

/// Print an order draft for the current cart.
///
/// # Errors
///
/// Returns an error if the cart is empty.
pub fn checkout(ctx: &Context) -> Result<(), CommandError> {
    let draft = ctx.cart.order_draft();
    ctx.flush_notifications();
    print_json(&draft?)
}

fn finish(ctx: &Context, result: Result<(), till_cart::CartError>) -> Result<(), CommandError> {
    ctx.flush_notifications();
    result?;
    show(ctx)
}
