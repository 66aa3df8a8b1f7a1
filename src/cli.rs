use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::{
    api::{ApiClient, CatalogApi},
    config::ClientConfig,
    dto::{
        categories::{CategoryUpdate, NewCategory},
        products::{NewProduct, ProductUpdate},
    },
    models::{Category, CategoryId, Product, ProductId},
    services::{
        cart_service::{AddOutcome, CartStore, ProductSnapshot},
        catalog_service::{Catalog, LOW_STOCK_THRESHOLD, StoreAnalytics, StoreOverview},
        checkout_service::{CheckoutSequencer, SkipReason, SubmitOutcome},
    },
    storage::{FileStore, KeyValueStore},
};

#[derive(Debug, Parser)]
#[command(name = "haze", about = "Haze Online storefront client", long_about = None)]
pub struct Cli {
    /// Base URL of the storefront API, e.g. http://127.0.0.1:8000/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the saved cart
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(subcommand)]
    Categories(CategoryCommand),
    #[command(subcommand)]
    Products(ProductCommand),
    #[command(subcommand)]
    Cart(CartCommand),
    /// Latest arrivals and a few categories to start browsing
    Overview,
    /// Product count, low-stock warnings and inventory value
    Analytics,
    /// Place an order for everything in the cart
    Checkout {
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
enum CategoryCommand {
    List,
    Show { id: i64 },
    /// List the products of one category
    Products { id: i64 },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum ProductCommand {
    List {
        /// Only products with stock left
        #[arg(long)]
        available: bool,
    },
    Show {
        id: i64,
    },
    Create(CreateProductArgs),
    Update(UpdateProductArgs),
    Delete {
        id: i64,
    },
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: Decimal,
    #[arg(long)]
    category_id: i64,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, default_value_t = 0)]
    stock: u32,
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateProductArgs {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<Decimal>,
    #[arg(long)]
    stock: Option<u32>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    Show,
    /// Add one unit of a product
    Add { product_id: i64 },
    Remove { product_id: i64 },
    /// Raise a line's quantity by one
    Inc { product_id: i64 },
    /// Lower a line's quantity by one
    Dec { product_id: i64 },
    Clear,
}

impl Cli {
    pub async fn run(self, config: ClientConfig) -> anyhow::Result<()> {
        let config = config.with_overrides(self.api_url, self.data_dir);
        tracing::debug!(
            api_url = %config.api_url,
            data_dir = %config.data_dir.display(),
            "client configured"
        );

        let api = ApiClient::new(config.api_url.clone());
        let store = FileStore::new(config.data_dir.clone());

        match self.command {
            Commands::Categories(command) => run_categories(&Catalog::new(api), command).await,
            Commands::Products(command) => run_products(&Catalog::new(api), command).await,
            Commands::Cart(command) => run_cart(&Catalog::new(api), store, command).await,
            Commands::Overview => {
                print_overview(&Catalog::new(api).overview().await);
                Ok(())
            }
            Commands::Analytics => {
                print_analytics(&Catalog::new(api).analytics().await);
                Ok(())
            }
            Commands::Checkout { name } => {
                let mut cart = CartStore::load(store);
                let mut sequencer = CheckoutSequencer::new(api)
                    .with_display_duration(config.order_placed_display);
                match sequencer.submit(&name, &mut cart).await? {
                    SubmitOutcome::Skipped(SkipReason::EmptyCart) => {
                        println!("Your cart is empty.");
                    }
                    SubmitOutcome::Skipped(SkipReason::BlankCustomerName) => {
                        bail!("a customer name is required to place an order");
                    }
                    SubmitOutcome::Placed(order) => {
                        println!(
                            "Order placed! #{} for KSh {} ({} units on {} lines) at {}.",
                            order.order_id,
                            order.total,
                            order.units,
                            order.item_ids.len(),
                            order.placed_at.format("%Y-%m-%d %H:%M UTC")
                        );
                        println!("Thank you for your purchase.");
                    }
                }
                Ok(())
            }
        }
    }
}

async fn run_categories<A: CatalogApi>(
    catalog: &Catalog<A>,
    command: CategoryCommand,
) -> anyhow::Result<()> {
    let mut changes = catalog.subscribe();
    match command {
        CategoryCommand::List => print_categories(&catalog.categories().await),
        CategoryCommand::Show { id } => match catalog.category(CategoryId(id)).await {
            Some(category) => print_categories(&[category]),
            None => println!("Category not found."),
        },
        CategoryCommand::Products { id } => {
            print_products(&catalog.category_products(CategoryId(id)).await);
        }
        CategoryCommand::Create { name, description } => {
            let id = catalog
                .create_category(NewCategory { name, description })
                .await
                .context("failed to create category")?;
            println!("Category created: #{id}");
        }
        CategoryCommand::Update {
            id,
            name,
            description,
        } => {
            let update = CategoryUpdate { name, description };
            if update.is_empty() {
                bail!("nothing to update");
            }
            catalog
                .update_category(CategoryId(id), update)
                .await
                .context("failed to update category")?;
            println!("Category updated: #{id}");
        }
        CategoryCommand::Delete { id } => {
            catalog
                .delete_category(CategoryId(id))
                .await
                .context("failed to delete category")?;
            println!("Category deleted: #{id}");
        }
    }

    if let Ok(event) = changes.try_recv() {
        tracing::debug!(event = ?event, "refreshing category list");
        print_categories(&catalog.categories().await);
    }
    Ok(())
}

async fn run_products<A: CatalogApi>(
    catalog: &Catalog<A>,
    command: ProductCommand,
) -> anyhow::Result<()> {
    let mut changes = catalog.subscribe();
    match command {
        ProductCommand::List { available } => {
            let products = if available {
                catalog.available_products().await
            } else {
                catalog.products().await
            };
            print_products(&products);
        }
        ProductCommand::Show { id } => match catalog.product(ProductId(id)).await {
            Some(product) => print_products(&[product]),
            None => println!("Product not found."),
        },
        ProductCommand::Create(args) => {
            let id = catalog
                .create_product(NewProduct {
                    name: args.name,
                    price: args.price,
                    category_id: CategoryId(args.category_id),
                    description: args.description,
                    stock: args.stock,
                    image_url: args.image_url,
                })
                .await
                .context("failed to create product")?;
            println!("Product created: #{id}");
        }
        ProductCommand::Update(args) => {
            let update = ProductUpdate {
                name: args.name,
                price: args.price,
                stock: args.stock,
                description: args.description,
                image_url: args.image_url,
            };
            if update.is_empty() {
                bail!("nothing to update");
            }
            catalog
                .update_product(ProductId(args.id), update)
                .await
                .context("failed to update product")?;
            println!("Product updated: #{}", args.id);
        }
        ProductCommand::Delete { id } => {
            catalog
                .delete_product(ProductId(id))
                .await
                .context("failed to delete product")?;
            println!("Product deleted: #{id}");
        }
    }

    if let Ok(event) = changes.try_recv() {
        tracing::debug!(event = ?event, "refreshing product list");
        print_products(&catalog.products().await);
    }
    Ok(())
}

async fn run_cart<A: CatalogApi, S: KeyValueStore>(
    catalog: &Catalog<A>,
    store: S,
    command: CartCommand,
) -> anyhow::Result<()> {
    let mut cart = CartStore::load(store);
    match command {
        CartCommand::Show => {}
        CartCommand::Add { product_id } => {
            let Some(product) = catalog.product(ProductId(product_id)).await else {
                bail!("product #{product_id} not found");
            };
            match cart.add_item(ProductSnapshot::from(&product)) {
                AddOutcome::Added => println!("Added {} to cart.", product.name),
                AddOutcome::Incremented { quantity } => {
                    println!("{} × {quantity} in cart.", product.name);
                }
                AddOutcome::AtStockLimit { quantity } => {
                    println!("Cannot add more. Stock limit reached ({quantity}).");
                }
                AddOutcome::OutOfStock => println!("Sorry, {} is out of stock.", product.name),
            }
        }
        CartCommand::Remove { product_id } => {
            if !cart.remove_item(ProductId(product_id)) {
                println!("Product #{product_id} is not in the cart.");
            }
        }
        CartCommand::Inc { product_id } => {
            if !cart.adjust_quantity(ProductId(product_id), 1) {
                println!("Quantity unchanged.");
            }
        }
        CartCommand::Dec { product_id } => {
            if !cart.adjust_quantity(ProductId(product_id), -1) {
                println!("Quantity unchanged.");
            }
        }
        CartCommand::Clear => cart.clear(),
    }
    print_cart(&cart);
    Ok(())
}

fn print_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories yet.");
        return;
    }
    for category in categories {
        println!(
            "#{:<4} {:<24} {}",
            category.id.0,
            category.name,
            category.description.as_deref().unwrap_or("")
        );
    }
}

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products yet.");
        return;
    }
    for product in products {
        let stock = if product.in_stock() {
            format!("{} in stock", product.stock)
        } else {
            "Out of stock".to_string()
        };
        println!(
            "#{:<4} {:<24} KSh {:>10}  {}",
            product.id.0, product.name, product.price, stock
        );
    }
}

fn print_overview(overview: &StoreOverview) {
    println!("Welcome to Haze Online");
    println!("{} categories", overview.category_count);
    print_categories(&overview.featured_categories);
    println!();
    println!("New arrivals");
    print_products(&overview.new_arrivals);
}

fn print_analytics(analytics: &StoreAnalytics) {
    println!("Total products: {}", analytics.product_count);
    println!("Inventory value: KSh {:.2}", analytics.inventory_value);
    if analytics.low_stock.is_empty() {
        println!("All stock levels are healthy.");
        return;
    }
    println!("Low stock (fewer than {LOW_STOCK_THRESHOLD} left):");
    for product in &analytics.low_stock {
        println!("- {} ({} left)", product.name, product.stock);
    }
}

fn print_cart<S: KeyValueStore>(cart: &CartStore<S>) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    println!("Cart items ({})", cart.len());
    for line in cart.lines() {
        println!(
            "#{:<4} {:<24} KSh {} × {} = KSh {}",
            line.id.0,
            line.name,
            line.price,
            line.quantity,
            line.subtotal()
        );
    }
    println!("Total: KSh {}", cart.total());
}
