//! Everything a command needs, wired from [`AppConfig`].

use std::sync::Arc;

use anyhow::Context;
use pharmacart_cart::{cart_key, CartStore, FileStore, PricingCalculator};
use pharmacart_checkout::{CheckoutOrchestrator, ConfirmationStore, OrderTracker};
use pharmacart_core::{load_pricing_policy, AppConfig, PricingPolicy};
use pharmacart_orders::OrdersClient;

pub(crate) struct Session {
    pub(crate) config: AppConfig,
    pub(crate) cart: Arc<CartStore>,
    pub(crate) client: OrdersClient,
    pub(crate) confirmations: ConfirmationStore,
    pub(crate) pricing: PricingCalculator,
}

impl Session {
    /// Opens local storage and the user's cart and builds the order client.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created, the pricing
    /// file is invalid, or the API base URL is unusable.
    pub(crate) fn open(config: AppConfig, user: Option<&str>) -> anyhow::Result<Self> {
        let storage = Arc::new(FileStore::open(&config.data_dir).with_context(|| {
            format!("failed to open data directory {}", config.data_dir.display())
        })?);

        let policy = match &config.pricing_path {
            Some(path) => load_pricing_policy(path)?,
            None => PricingPolicy::default(),
        };

        let client = OrdersClient::from_config(&config)?;
        let cart = Arc::new(CartStore::open(storage.clone(), cart_key(user)));

        tracing::debug!(
            data_dir = %config.data_dir.display(),
            cart_key = cart.key(),
            api = %client.base_url(),
            "session opened"
        );

        Ok(Self {
            config,
            cart,
            client,
            confirmations: ConfirmationStore::new(storage),
            pricing: PricingCalculator::new(policy),
        })
    }

    pub(crate) fn orchestrator(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(
            Arc::clone(&self.cart),
            self.client.clone(),
            self.confirmations.clone(),
            self.pricing.clone(),
            self.config.branch_id,
        )
    }

    pub(crate) fn tracker(&self) -> OrderTracker {
        OrderTracker::new(self.client.clone())
    }

    pub(crate) fn close(&self) {
        self.cart.close();
    }
}
