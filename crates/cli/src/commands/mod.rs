//! Commands shared by one-shot invocations and the interactive shell.

pub mod account;
pub mod catalog;
pub mod shopping;

use std::io::Write;
use std::str::FromStr;

use clap::Subcommand;
use the_shop_client::SessionManager;
use the_shop_core::{OrderId, ProductId};

use crate::error::CliError;

/// One order line given as `ID` or `ID:QTY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpec {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, quantity) = s.split_once(':').unwrap_or((s, "1"));
        let product_id: ProductId = id
            .parse()
            .map_err(|e| format!("invalid product id {id:?}: {e}"))?;
        let quantity: u32 = quantity
            .trim()
            .parse()
            .map_err(|e| format!("invalid quantity {quantity:?}: {e}"))?;
        if quantity == 0 {
            return Err("quantity must be at least 1".to_string());
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }
}

#[derive(Subcommand)]
pub enum ShopCommand {
    /// Check that the API is reachable
    Health,
    /// List product categories
    Categories,
    /// List products
    Products {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product with its reviews
    Product { id: ProductId },
    /// Sign in and keep the token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHOP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Review a product
    Review {
        id: ProductId,

        /// Stars from 1 to 5
        #[arg(short, long, default_value_t = 5)]
        rating: i64,

        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Place an order
    Order {
        /// Line as `ID` or `ID:QTY`; repeat for more lines
        #[arg(short, long = "item", required = true)]
        items: Vec<ItemSpec>,
    },
    /// List orders, or show one
    Orders {
        #[arg(long)]
        id: Option<OrderId>,
    },
    /// Show the profile: user, orders and reviews
    Profile,
}

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Add the product if missing, remove it otherwise
    Toggle { id: ProductId },
    /// Ask the server whether the product is listed
    Check { id: ProductId },
}

/// Run one command against `manager`, writing results to `out`.
pub async fn execute(
    manager: &mut SessionManager,
    command: ShopCommand,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        ShopCommand::Health => catalog::health(manager, out).await,
        ShopCommand::Categories => catalog::categories(manager, out).await,
        ShopCommand::Products { category } => {
            catalog::products(manager, category.as_deref(), out).await
        }
        ShopCommand::Product { id } => catalog::product(manager, id, out).await,
        ShopCommand::Login { email, password } => {
            account::login(manager, &email, password, out).await
        }
        ShopCommand::Register {
            email,
            password,
            name,
        } => account::register(manager, &email, password, name.as_deref(), out).await,
        ShopCommand::Logout => account::logout(manager, out),
        ShopCommand::Whoami => account::whoami(manager, out).await,
        ShopCommand::Wishlist { action } => shopping::wishlist(manager, action, out).await,
        ShopCommand::Review {
            id,
            rating,
            comment,
        } => shopping::review(manager, id, rating, comment.as_deref(), out).await,
        ShopCommand::Order { items } => shopping::order(manager, &items, out).await,
        ShopCommand::Orders { id } => shopping::orders(manager, id, out).await,
        ShopCommand::Profile => shopping::profile(manager, out).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_spec() {
        assert_eq!(
            "4".parse::<ItemSpec>().unwrap(),
            ItemSpec {
                product_id: ProductId::new(4),
                quantity: 1
            }
        );
        assert_eq!("4:3".parse::<ItemSpec>().unwrap().quantity, 3);
        assert!("4:0".parse::<ItemSpec>().is_err());
        assert!("x:1".parse::<ItemSpec>().is_err());
        assert!("4:-1".parse::<ItemSpec>().is_err());
    }
}
