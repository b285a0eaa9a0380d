//! `checkout` and `last-order` command handlers.

use clap::{Args, ValueEnum};
use pharmacart_checkout::{CustomerInfo, PaymentInfo};
use pharmacart_core::{CustomerTier, PaymentMethod};

use crate::cart::{fmt_money, print_breakdown};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaymentArg {
    Cash,
    Card,
    Momo,
    BankTransfer,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::Cash => PaymentMethod::Cash,
            PaymentArg::Card => PaymentMethod::Card,
            PaymentArg::Momo => PaymentMethod::Momo,
            PaymentArg::BankTransfer => PaymentMethod::BankTransfer,
        }
    }
}

/// Checkout form fields.
///
/// Pass `--customer-id` for a registered customer, or `--name` and
/// `--phone` to check out as a walk-in shopper.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Registered customer id
    #[arg(long, conflicts_with = "name")]
    pub customer_id: Option<u64>,
    /// The registered customer is VIP
    #[arg(long, requires = "customer_id")]
    pub vip: bool,
    /// Walk-in shopper name
    #[arg(long)]
    pub name: Option<String>,
    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,
    /// Walk-in shopper email
    #[arg(long)]
    pub email: Option<String>,
    /// Delivery address; omit for in-store pickup
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub instructions: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Prescription the order fills
    #[arg(long)]
    pub prescription_id: Option<u64>,
    #[arg(long, value_enum, default_value = "cash")]
    pub payment: PaymentArg,
    #[arg(long)]
    pub transaction_id: Option<String>,
}

impl CheckoutArgs {
    pub(crate) fn customer_info(&self) -> CustomerInfo {
        let mut info = match self.customer_id {
            Some(id) => {
                let tier = if self.vip {
                    CustomerTier::Vip
                } else {
                    CustomerTier::Regular
                };
                let info = CustomerInfo::registered(id, tier);
                match &self.phone {
                    Some(phone) => info.with_contact(phone.clone()),
                    None => info,
                }
            }
            None => {
                let info = CustomerInfo::walk_in(
                    self.name.clone().unwrap_or_default(),
                    self.phone.clone().unwrap_or_default(),
                );
                match &self.email {
                    Some(email) => info.with_contact(email.clone()),
                    None => info,
                }
            }
        };
        info.delivery_address.clone_from(&self.address);
        info.delivery_instructions.clone_from(&self.instructions);
        info.notes.clone_from(&self.notes);
        info.prescription_id = self.prescription_id;
        info
    }
}

/// Place an order for the current cart.
///
/// # Errors
///
/// Returns an error if validation fails or the order service refuses the order.
pub(crate) async fn run_checkout(session: &Session, args: &CheckoutArgs) -> anyhow::Result<()> {
    let orchestrator = session.orchestrator();
    let customer = args.customer_info();

    let summary = orchestrator.summary(&customer)?;
    let mut payment = PaymentInfo::new(args.payment.into(), summary.total);
    if let Some(txn) = &args.transaction_id {
        payment = payment.with_transaction_id(txn.clone());
    }

    let order = orchestrator.checkout(&customer, &payment).await?;

    println!(
        "order {} placed ({}, {})",
        order.order_number, order.order_type, order.status
    );
    println!("server total: {}", fmt_money(order.total_amount));
    println!("run `pharmacart last-order` to view the confirmation");
    Ok(())
}

/// Print and consume the last order confirmation.
pub(crate) fn run_last_order(session: &Session) {
    let Some(c) = session.confirmations.take() else {
        println!("no pending order confirmation");
        return;
    };

    println!("Order {} (#{})", c.order_number, c.order_id);
    println!("Placed:             {}", c.order_date.format("%Y-%m-%d %H:%M"));
    println!("Estimated delivery: {}", c.estimated_delivery.format("%Y-%m-%d"));
    println!("Payment:            {}", c.payment_method);
    if let Some(address) = &c.delivery_address {
        println!("Deliver to:         {address}");
    }
    if let Some(phone) = &c.delivery_phone {
        println!("Phone:              {phone}");
    }
    println!();
    for item in &c.items {
        let rx = if item.requires_prescription { " [Rx]" } else { "" };
        println!(
            "  {} x{} @ {}{rx}",
            item.name,
            item.quantity,
            fmt_money(item.price)
        );
    }
    println!();
    print_breakdown(&pharmacart_cart::PricingBreakdown {
        subtotal: c.subtotal,
        shipping_fee: c.shipping_fee,
        discount: c.discount,
        vip_discount: c.vip_discount,
        tax: c.tax,
        total: c.total,
    });
    if c.server_total != c.total {
        println!("{:<14}{:>14}", "Charged", fmt_money(c.server_total));
    }
}
