//! Catalogue and cart command handlers.

use clap::Subcommand;
use pharmacart_cart::{PresentationMode, PricingBreakdown};
use pharmacart_core::{CartLineItem, Product, ProductId};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::session::Session;

/// Sub-commands available under `cart`.
#[derive(Debug, Subcommand)]
pub enum CartCommands {
    /// Show cart lines and totals
    Show {
        /// Price as a VIP customer
        #[arg(long)]
        vip: bool,
        /// Show the checkout summary (tax included) instead of the live cart
        #[arg(long)]
        summary: bool,
    },
    /// Add a catalogue product to the cart
    Add {
        product_id: ProductId,
        #[arg(long, short, default_value = "1")]
        quantity: u32,
    },
    /// Set a line's quantity exactly; zero or less removes it
    Set {
        product_id: ProductId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove { product_id: ProductId },
    /// Empty the cart
    Clear,
    /// Re-read prices and details of cart products from the catalogue
    Refresh,
}

/// Formats a whole-unit amount with thousands separators, e.g. `1,250,000`.
pub(crate) fn fmt_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < Decimal::ZERO {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub(crate) fn print_breakdown(breakdown: &PricingBreakdown) {
    println!("{:<14}{:>14}", "Subtotal", fmt_money(breakdown.subtotal));
    println!("{:<14}{:>14}", "Shipping", fmt_money(breakdown.shipping_fee));
    if !breakdown.vip_discount.is_zero() {
        println!(
            "{:<14}{:>14}",
            "VIP discount",
            format!("-{}", fmt_money(breakdown.vip_discount))
        );
    }
    if !breakdown.discount.is_zero() {
        println!(
            "{:<14}{:>14}",
            "Discount",
            format!("-{}", fmt_money(breakdown.discount))
        );
    }
    if !breakdown.tax.is_zero() {
        println!("{:<14}{:>14}", "Tax", fmt_money(breakdown.tax));
    }
    println!("{:<14}{:>14}", "Total", fmt_money(breakdown.total));
}

/// Price times quantity; `None` for an unparsable price or an overflow.
fn line_amount(line: &CartLineItem) -> Option<Decimal> {
    line.product
        .unit_price()
        .and_then(|p| p.checked_mul(Decimal::from(line.quantity)))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_owned()
    }
}

/// List the product catalogue.
///
/// # Errors
///
/// Returns an error if the catalogue cannot be fetched.
pub(crate) async fn run_products(session: &Session) -> anyhow::Result<()> {
    let products = session.client.list_products().await?;
    if products.is_empty() {
        println!("catalogue is empty");
        return Ok(());
    }

    println!("{:<6}{:<36}{:>12}{:>8}  RX", "ID", "NAME", "PRICE", "STOCK");
    for p in &products {
        let price = p
            .unit_price()
            .map_or_else(|| p.price.clone(), fmt_money);
        let stock = p.stock.map_or_else(|| "-".to_owned(), |s| s.to_string());
        let rx = if p.requires_prescription { "yes" } else { "" };
        println!(
            "{:<6}{:<36}{:>12}{:>8}  {}",
            p.id,
            truncate(&p.name, 32),
            price,
            stock,
            rx
        );
    }
    Ok(())
}

/// Dispatch a `cart` sub-command.
///
/// # Errors
///
/// Returns an error if a catalogue lookup fails, the product does not exist,
/// or a cart price cannot be parsed.
pub(crate) async fn run_cart(session: &Session, command: CartCommands) -> anyhow::Result<()> {
    match command {
        CartCommands::Show { vip, summary } => show(session, vip, summary),
        CartCommands::Add {
            product_id,
            quantity,
        } => {
            let product = find_product(session, product_id).await?;
            if !product.is_available {
                anyhow::bail!("product {product_id} ({}) is not available", product.name);
            }
            session.cart.add_quantity(product, quantity);
            println!("cart now holds {} item(s)", session.cart.cart_item_count());
            Ok(())
        }
        CartCommands::Set {
            product_id,
            quantity,
        } => {
            if !session.cart.is_in_cart(product_id) {
                anyhow::bail!("product {product_id} is not in the cart");
            }
            session.cart.update_quantity(product_id, quantity);
            println!("cart now holds {} item(s)", session.cart.cart_item_count());
            Ok(())
        }
        CartCommands::Remove { product_id } => {
            session.cart.remove_from_cart(product_id);
            println!("cart now holds {} item(s)", session.cart.cart_item_count());
            Ok(())
        }
        CartCommands::Clear => {
            session.cart.clear_cart();
            println!("cart cleared");
            Ok(())
        }
        CartCommands::Refresh => {
            let catalog = session.client.list_products().await?;
            session.cart.refresh_products(&catalog);
            println!("cart total is now {}", fmt_money(session.cart.cart_total()?));
            Ok(())
        }
    }
}

fn show(session: &Session, vip: bool, summary: bool) -> anyhow::Result<()> {
    let snapshot = session.cart.snapshot();
    if snapshot.is_empty() {
        println!("cart is empty");
        return Ok(());
    }

    println!("{:<6}{:<36}{:>6}{:>14}", "ID", "NAME", "QTY", "AMOUNT");
    for line in &snapshot.lines {
        let amount = line_amount(line).map_or_else(|| "?".to_owned(), fmt_money);
        println!(
            "{:<6}{:<36}{:>6}{:>14}",
            line.product.id,
            truncate(&line.product.name, 32),
            line.quantity,
            amount
        );
    }
    println!();

    let mode = if summary {
        PresentationMode::CheckoutSummary
    } else {
        PresentationMode::LiveCart
    };
    let breakdown = session
        .pricing
        .compute_breakdown(&snapshot.lines, vip, mode)?;
    println!("{} item(s)", snapshot.item_count);
    print_breakdown(&breakdown);
    Ok(())
}

async fn find_product(session: &Session, product_id: ProductId) -> anyhow::Result<Product> {
    session
        .client
        .list_products()
        .await?
        .into_iter()
        .find(|p| p.id == product_id)
        .ok_or_else(|| anyhow::anyhow!("product {product_id} not found in the catalogue"))
}
