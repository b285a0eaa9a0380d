//! Cart-to-order submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pharmacart_cart::{CartStore, PresentationMode, PricingBreakdown, PricingCalculator};
use pharmacart_core::CartLineItem;
use pharmacart_orders::{OrderResponse, OrdersClient, OrdersError};
use tokio::task::JoinHandle;

use crate::confirmation::{ConfirmationStore, OrderConfirmation};
use crate::draft::{CustomerInfo, OrderDraft, PaymentInfo};
use crate::error::{CheckoutError, ValidationError};

/// Submits orders built from the session cart.
///
/// Holds the cart it clears on success, the order client, and the local
/// confirmation store. One submission may be in flight at a time.
#[derive(Debug)]
pub struct CheckoutOrchestrator {
    cart: Arc<CartStore>,
    client: OrdersClient,
    confirmations: ConfirmationStore,
    pricing: PricingCalculator,
    branch_id: u64,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutOrchestrator {
    #[must_use]
    pub fn new(
        cart: Arc<CartStore>,
        client: OrdersClient,
        confirmations: ConfirmationStore,
        pricing: PricingCalculator,
        branch_id: u64,
    ) -> Self {
        Self {
            cart,
            client,
            confirmations,
            pricing,
            branch_id,
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }

    /// The checkout summary for the current cart, tax included.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] if a price cannot be parsed.
    pub fn summary(&self, customer: &CustomerInfo) -> Result<PricingBreakdown, CheckoutError> {
        Ok(self.pricing.compute_breakdown(
            &self.cart.lines(),
            customer.is_vip(),
            PresentationMode::CheckoutSummary,
        )?)
    }

    /// Submits the current contents of the session cart.
    ///
    /// # Errors
    ///
    /// See [`CheckoutOrchestrator::submit_order`].
    pub async fn checkout(
        &self,
        customer: &CustomerInfo,
        payment: &PaymentInfo,
    ) -> Result<OrderResponse, CheckoutError> {
        let lines = self.cart.lines();
        self.submit_order(&lines, customer, payment).await
    }

    /// Places an order for `lines`.
    ///
    /// Everything is validated before the first request. Walk-in shoppers are
    /// registered with the server first. On success the confirmation and
    /// payment records are stored and the cart is cleared last; on failure the
    /// cart is left untouched.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`] for an empty cart, missing walk-in
    ///   details, or an unparsable price. No request is sent. Checked before
    ///   the in-flight guard.
    /// - [`CheckoutError::SubmissionInProgress`] if another submission on this
    ///   orchestrator has not finished.
    /// - [`CheckoutError::OrderCreationFailed`] for any network, timeout, or
    ///   server failure, with the server's message when it gave one.
    pub async fn submit_order(
        &self,
        lines: &[CartLineItem],
        customer: &CustomerInfo,
        payment: &PaymentInfo,
    ) -> Result<OrderResponse, CheckoutError> {
        let draft = OrderDraft::build(lines, customer, payment, self.branch_id)?;
        let breakdown = self
            .pricing
            .compute_breakdown(lines, customer.is_vip(), PresentationMode::CheckoutSummary)
            .map_err(ValidationError::from)?;

        let _guard = self.begin_submission()?;

        let customer_id = match draft.walk_in_registration() {
            Some(new_customer) => {
                let created = self
                    .client
                    .create_customer(&new_customer)
                    .await
                    .map_err(creation_failed)?;
                Some(created.id)
            }
            None => draft.registered_customer_id(),
        };

        let order_type = draft.order_type;
        let request = draft.into_request(customer_id);
        let order = self
            .client
            .create_order(&request)
            .await
            .map_err(creation_failed)?;

        tracing::info!(
            order_id = order.id,
            order_number = %order.order_number,
            %order_type,
            items = lines.len(),
            server_total = %order.total_amount,
            client_total = %breakdown.total,
            "order placed"
        );

        let confirmation =
            OrderConfirmation::new(&order, lines, &breakdown, payment, customer.phone());
        if let Err(e) = self.confirmations.save(&confirmation) {
            tracing::warn!(order_id = order.id, error = %e, "failed to store order confirmation");
        }
        if let Err(e) = self.confirmations.save_payment(order.id, payment) {
            tracing::warn!(order_id = order.id, error = %e, "failed to store payment record");
        }

        self.cart.clear_cart();
        Ok(order)
    }

    /// Runs [`submit_order`](Self::submit_order) as a background task.
    ///
    /// The submission completes even if the returned handle is dropped, e.g.
    /// when the screen that started it goes away.
    pub fn submit_detached(
        self: &Arc<Self>,
        lines: Vec<CartLineItem>,
        customer: CustomerInfo,
        payment: PaymentInfo,
    ) -> JoinHandle<Result<OrderResponse, CheckoutError>> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let result = this.submit_order(&lines, &customer, &payment).await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, "detached order submission failed");
            }
            result
        })
    }

    /// The confirmation left by the last successful submission, consumed.
    #[must_use]
    pub fn take_confirmation(&self) -> Option<OrderConfirmation> {
        self.confirmations.take()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin_submission(&self) -> Result<InFlightGuard<'_>, CheckoutError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CheckoutError::SubmissionInProgress)?;
        Ok(InFlightGuard(&self.in_flight))
    }
}

fn creation_failed(err: OrdersError) -> CheckoutError {
    tracing::warn!(error = %err, "order submission failed");
    CheckoutError::OrderCreationFailed {
        message: err.user_message(),
    }
}
