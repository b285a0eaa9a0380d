//! `order` command handlers.

use clap::Subcommand;
use pharmacart_core::OrderStatus;
use pharmacart_orders::OrderItemResponse;
use rust_decimal::Decimal;

use crate::cart::fmt_money;
use crate::session::Session;

/// Sub-commands available under `order`.
#[derive(Debug, Subcommand)]
pub enum OrderCommands {
    /// Show an order and its items
    Show { order_id: u64 },
    /// List the statuses the order may move to next
    Transitions { order_id: u64 },
    /// Request a status change
    Transition {
        order_id: u64,
        /// pending, processing, completed or cancelled
        status: OrderStatus,
    },
    /// Show the server-computed total
    Total { order_id: u64 },
    /// List a customer's orders
    History { customer_id: u64 },
}

/// The server's line total, or unit price times quantity when it sent none.
fn line_amount(item: &OrderItemResponse) -> Option<Decimal> {
    item.total_price
        .or_else(|| item.unit_price.checked_mul(Decimal::from(item.quantity)))
}

/// Dispatch an `order` sub-command.
///
/// # Errors
///
/// Returns an error if the order service request fails or a transition is
/// refused.
pub(crate) async fn run_order(session: &Session, command: OrderCommands) -> anyhow::Result<()> {
    let tracker = session.tracker();
    match command {
        OrderCommands::Show { order_id } => {
            let order = tracker.status(order_id).await?;
            println!(
                "{} ({}) status={} total={}",
                order.order_number,
                order.order_type,
                order.status,
                fmt_money(order.total_amount)
            );
            if let Some(name) = &order.customer_name {
                println!("customer: {name}");
            }
            if let Some(address) = &order.delivery_address {
                println!("deliver to: {address}");
            }
            for item in &order.items {
                println!(
                    "  {:<36}x{:<4}{:>14}",
                    item.product_name,
                    item.quantity,
                    line_amount(item).map_or_else(|| "?".to_owned(), fmt_money)
                );
            }
            Ok(())
        }
        OrderCommands::Transitions { order_id } => {
            let next = tracker.available_transitions(order_id).await?;
            if next.is_empty() {
                println!("order {order_id} cannot change status");
            } else {
                let names: Vec<String> = next.iter().map(ToString::to_string).collect();
                println!("order {order_id} may move to: {}", names.join(", "));
            }
            Ok(())
        }
        OrderCommands::Transition { order_id, status } => {
            let order = tracker.request_transition(order_id, status).await?;
            println!("order {} is now {}", order.order_number, order.status);
            Ok(())
        }
        OrderCommands::Total { order_id } => {
            let pending = session
                .confirmations
                .peek()
                .filter(|c| c.order_id == order_id);
            match pending {
                Some(c) => {
                    let breakdown = pharmacart_cart::PricingBreakdown {
                        subtotal: c.subtotal,
                        shipping_fee: c.shipping_fee,
                        discount: c.discount,
                        vip_discount: c.vip_discount,
                        tax: c.tax,
                        total: c.total,
                    };
                    let r = tracker.reconcile(order_id, &breakdown).await?;
                    println!("server total: {}", fmt_money(r.server_total));
                    println!("checkout estimate: {}", fmt_money(r.client_total));
                    if !r.matches() {
                        println!("difference: {}", fmt_money(r.difference()));
                    }
                }
                None => {
                    let total = session.client.calculate_total(order_id).await?;
                    println!("server total: {}", fmt_money(total.total));
                    if let Some(breakdown) = total.breakdown {
                        println!("{}", serde_json::to_string_pretty(&breakdown)?);
                    }
                }
            }
            Ok(())
        }
        OrderCommands::History { customer_id } => {
            let orders = tracker.history(customer_id).await?;
            if orders.is_empty() {
                println!("no orders for customer {customer_id}");
                return Ok(());
            }
            println!("{:<8}{:<14}{:<13}{:<12}{:>14}", "ID", "NUMBER", "TYPE", "STATUS", "TOTAL");
            for o in &orders {
                println!(
                    "{:<8}{:<14}{:<13}{:<12}{:>14}",
                    o.id,
                    o.order_number,
                    o.order_type.to_string(),
                    o.status.to_string(),
                    fmt_money(o.total_amount)
                );
            }
            Ok(())
        }
    }
}
