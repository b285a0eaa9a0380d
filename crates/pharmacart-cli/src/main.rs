mod cart;
mod checkout;
mod orders;
mod session;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cart::CartCommands;
use crate::checkout::CheckoutArgs;
use crate::orders::OrderCommands;

#[derive(Debug, Parser)]
#[command(name = "pharmacart")]
#[command(about = "Pharmacy storefront cart and checkout")]
struct Cli {
    /// Signed-in user whose cart to use; omit for the anonymous cart
    #[arg(long, global = true, env = "PHARMACART_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the product catalogue
    Products,
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Place an order for the current cart
    Checkout(CheckoutArgs),
    /// Follow a placed order
    Order {
        #[command(subcommand)]
        command: OrderCommands,
    },
    /// Show the confirmation of the last order placed, once
    LastOrder,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pharmacart ready; run with --help to see commands");
        return Ok(());
    };

    let config = pharmacart_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let session = session::Session::open(config, cli.user.as_deref())?;

    let result = match command {
        Commands::Products => cart::run_products(&session).await,
        Commands::Cart { command } => cart::run_cart(&session, command).await,
        Commands::Checkout(args) => checkout::run_checkout(&session, &args).await,
        Commands::Order { command } => orders::run_order(&session, command).await,
        Commands::LastOrder => {
            checkout::run_last_order(&session);
            Ok(())
        }
    };

    session.close();
    result
}
