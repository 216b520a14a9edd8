use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use storefront_sync::api::params::{
  CustomersListParams, OrdersListParams, ProductsListParams, SummaryParams,
};
use storefront_sync::api::types::{
  AdjustmentKind, CreditRequest, InventoryAdjustment, InventoryUpdate, OrderStatus,
  OrderStatusUpdate, Period, PriceUpdate,
};
use storefront_sync::config::Config;
use storefront_sync::{logging, Storefront};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Manage a storefront from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storefront/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in
  Login {
    #[arg(short, long)]
    email: String,
    #[arg(short, long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Sign out and forget local credentials
  Logout,
  /// List accessible stores
  Stores,
  /// Select the store requests are scoped to
  UseStore {
    /// Store id or slug
    store: String,
  },
  /// List orders
  Orders {
    #[arg(long, value_parser = parse_status)]
    status: Option<OrderStatus>,
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    page: Option<u32>,
    /// Follow pagination to the last page
    #[arg(long)]
    all: bool,
  },
  /// Show one order
  Order { id: String },
  /// Change an order's status
  OrderStatus {
    id: String,
    #[arg(value_parser = parse_status)]
    status: OrderStatus,
    /// Email the customer about the change
    #[arg(long)]
    notify: bool,
  },
  /// List products
  Products {
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    low_stock: bool,
    #[arg(long)]
    all: bool,
  },
  /// Show one product
  Product { id: String },
  /// Set or adjust stock
  Inventory {
    id: String,
    #[arg(long, group = "change")]
    set: Option<i64>,
    #[arg(long, group = "change")]
    add: Option<i64>,
    #[arg(long, group = "change")]
    subtract: Option<i64>,
    #[arg(long)]
    variant: Option<String>,
  },
  /// Change a price
  Price {
    id: String,
    price: f64,
    #[arg(long, conflicts_with = "clear_compare")]
    compare: Option<f64>,
    #[arg(long)]
    clear_compare: bool,
    #[arg(long)]
    variant: Option<String>,
  },
  /// Look a product up by barcode
  Barcode { code: String },
  /// List customers
  Customers {
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    all: bool,
  },
  /// Show one customer
  Customer { id: String },
  /// Add store credit to a customer
  Credit {
    id: String,
    amount: f64,
    reason: String,
  },
  /// Sales summary
  Dashboard {
    #[arg(long, value_parser = parse_enum::<Period>, default_value = "today")]
    period: Period,
  },
}

/// Parse a lowercase wire name into one of the API's enums.
fn parse_enum<T: DeserializeOwned>(value: &str) -> std::result::Result<T, String> {
  serde_json::from_value(serde_json::Value::String(value.to_string()))
    .map_err(|_| format!("unknown value '{}'", value))
}

fn parse_status(value: &str) -> std::result::Result<OrderStatus, String> {
  match parse_enum(value)? {
    OrderStatus::Unknown => Err(format!("unknown value '{}'", value)),
    status => Ok(status),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _guard = logging::init(&config)?;

  let storefront = Storefront::new(&config)?;
  run(&storefront, args.command).await
}

async fn run(sf: &Storefront, command: Command) -> Result<()> {
  match command {
    Command::Login { email, password } => {
      let response = sf.auth().login(&email, &password, None).await?;
      if !response.success {
        return Err(eyre!("Sign-in was rejected"));
      }
      let state = sf.session().state();
      match state.current_store {
        Some(store) => println!("Signed in, using store {}", store.slug),
        None => println!(
          "Signed in. {} stores available, pick one with `storefront use-store`",
          state.stores.len()
        ),
      }
    }
    Command::Logout => {
      sf.auth().logout().await?;
      println!("Signed out");
    }
    Command::Stores => {
      require_session(sf)?;
      let state = sf.session().state();
      let current = state.current_store.map(|s| s.id);
      for store in state.stores {
        let marker = if current.as_deref() == Some(store.id.as_str()) { "*" } else { " " };
        println!("{} {:<24} {:<20} {}", marker, store.slug, store.name, store.role);
      }
    }
    Command::UseStore { store } => {
      require_session(sf)?;
      let found = sf
        .session()
        .state()
        .stores
        .into_iter()
        .find(|s| s.id == store || s.slug == store)
        .ok_or_else(|| eyre!("No accessible store matches '{}'", store))?;
      let slug = found.slug.clone();
      sf.auth().select_store(found)?;
      println!("Using store {}", slug);
    }
    Command::Orders {
      status,
      search,
      page,
      all,
    } => {
      require_store(sf)?;
      let params = OrdersListParams {
        status,
        search,
        page,
        ..Default::default()
      };
      let orders = if all {
        let list = sf.orders().infinite(&params);
        list.fetch().await?;
        while list.fetch_next_page().await? {}
        list.items()
      } else {
        sf.orders().list(&params).await?.items
      };
      for order in orders {
        println!(
          "{:<10} {:<12} {:>10.2} {}  {}",
          order.order_number,
          order.status.as_str(),
          order.total,
          order.currency,
          order.customer_name
        );
      }
    }
    Command::Order { id } => {
      require_store(sf)?;
      let detail = sf.orders().detail(&id).await?;
      let order = &detail.order;
      println!("Order {} ({})", order.order_number, order.status.as_str());
      println!("  customer:    {} <{}>", order.customer_name, order.customer_email);
      println!("  fulfillment: {}", order.fulfillment_status.as_str());
      println!("  total:       {:.2} {}", order.total, order.currency);
      for item in &detail.items {
        println!("  {:>3} x {} @ {:.2}", item.quantity, item.name, item.price);
      }
      if !order.is_read {
        sf.orders().mark_as_read(&id).await?;
      }
    }
    Command::OrderStatus { id, status, notify } => {
      require_store(sf)?;
      let update = OrderStatusUpdate {
        status: Some(status),
        notify_customer: notify.then_some(true),
        ..Default::default()
      };
      sf.orders().update_status(&id, &update).await?;
      println!("Order {} is now {}", id, status.as_str());
    }
    Command::Products {
      search,
      low_stock,
      all,
    } => {
      require_store(sf)?;
      let params = ProductsListParams {
        search,
        low_stock,
        ..Default::default()
      };
      let products = if all {
        let list = sf.products().infinite(&params);
        list.fetch().await?;
        while list.fetch_next_page().await? {}
        list.items()
      } else {
        sf.products().list(&params).await?.items
      };
      for product in products {
        println!(
          "{:<24} {:>10} {:>6}  {}",
          product.id,
          product.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
          product.inventory.map(|i| i.to_string()).unwrap_or_else(|| "-".into()),
          product.name
        );
      }
    }
    Command::Product { id } => {
      require_store(sf)?;
      let detail = sf.products().detail(&id).await?;
      let product = &detail.product;
      println!("{} ({})", product.name, if product.is_active { "active" } else { "draft" });
      if let Some(price) = product.price {
        println!("  price:     {:.2}", price);
      }
      if let Some(inventory) = product.inventory {
        println!("  inventory: {}", inventory);
      }
      for variant in &detail.variants {
        println!(
          "  - {:<20} {:>8.2} {:>6}",
          variant.title,
          variant.price,
          variant.inventory.map(|i| i.to_string()).unwrap_or_else(|| "-".into())
        );
      }
    }
    Command::Inventory {
      id,
      set,
      add,
      subtract,
      variant,
    } => {
      require_store(sf)?;
      let (kind, value) = match (set, add, subtract) {
        (Some(v), _, _) => (AdjustmentKind::Set, v),
        (_, Some(v), _) => (AdjustmentKind::Add, v),
        (_, _, Some(v)) => (AdjustmentKind::Subtract, v),
        _ => return Err(eyre!("One of --set, --add or --subtract is required")),
      };
      let update = InventoryUpdate {
        adjustment: Some(InventoryAdjustment {
          kind,
          value,
          variant_id: variant,
        }),
        ..Default::default()
      };
      let response = sf.products().update_inventory(&id, &update).await?;
      match response.product.and_then(|p| p.inventory) {
        Some(stock) => println!("Stock is now {}", stock),
        None => println!("Stock updated"),
      }
    }
    Command::Price {
      id,
      price,
      compare,
      clear_compare,
      variant,
    } => {
      require_store(sf)?;
      let compare_price = if clear_compare { Some(None) } else { compare.map(Some) };
      let update = PriceUpdate {
        price: Some(price),
        compare_price,
        variant_id: variant,
      };
      sf.products().update_price(&id, &update).await?;
      println!("Price updated");
    }
    Command::Barcode { code } => {
      require_store(sf)?;
      match sf.products().barcode(&code).await? {
        None => println!("Barcode too short, at least 8 characters are needed"),
        Some(lookup) => match lookup.product {
          Some(product) if lookup.found => println!("{} ({})", product.name, product.id),
          _ => println!("No product with barcode {}", code),
        },
      }
    }
    Command::Customers { search, all } => {
      require_store(sf)?;
      let params = CustomersListParams {
        search,
        ..Default::default()
      };
      let customers = if all {
        let list = sf.customers().infinite(&params);
        list.fetch().await?;
        while list.fetch_next_page().await? {}
        list.items()
      } else {
        sf.customers().list(&params).await?.items
      };
      for customer in customers {
        let name = [customer.first_name, customer.last_name]
          .into_iter()
          .flatten()
          .collect::<Vec<_>>()
          .join(" ");
        println!(
          "{:<32} {:<24} {:>4} orders {:>10.2}",
          customer.email, name, customer.total_orders, customer.total_spent
        );
      }
    }
    Command::Customer { id } => {
      require_store(sf)?;
      let detail = sf.customers().detail(&id).await?;
      let customer = &detail.customer;
      println!("{}", customer.email);
      println!("  orders: {}  spent: {:.2}", customer.total_orders, customer.total_spent);
      println!("  credit: {:.2}", customer.credit_balance);
      for order in &detail.orders {
        println!("  {:<10} {:<12} {:>10.2}", order.order_number, order.status.as_str(), order.total);
      }
    }
    Command::Credit { id, amount, reason } => {
      require_store(sf)?;
      let response = sf
        .customers()
        .add_credit(&id, &CreditRequest { amount, reason })
        .await?;
      match response.customer {
        Some(balance) => println!("Credit balance is now {:.2}", balance.credit_balance),
        None => println!("Credit added"),
      }
    }
    Command::Dashboard { period } => {
      require_store(sf)?;
      let summary = sf
        .dashboard()
        .summary(&SummaryParams {
          period: Some(period),
          ..Default::default()
        })
        .await?;
      println!("Revenue ({}): {:.2}", period.as_str(), summary.revenue.total);
      println!(
        "Orders: {} ({} pending, {} processing)",
        summary.orders.total, summary.orders.pending, summary.orders.processing
      );
      println!(
        "Products: {} active, {} low on stock, {} out of stock",
        summary.products.active, summary.products.low_stock, summary.products.out_of_stock
      );
      for product in &summary.top_products {
        println!("  {:<24} {:>6} sold {:>10.2}", product.name, product.quantity, product.revenue);
      }
      let chart: Vec<(&str, f64)> = summary
        .revenue_chart
        .iter()
        .map(|p| (p.date.as_str(), p.revenue))
        .collect();
      print_chart(&chart);
    }
  }
  Ok(())
}

fn require_session(sf: &Storefront) -> Result<()> {
  if sf.session().is_authenticated() {
    Ok(())
  } else {
    Err(eyre!("Not signed in, run `storefront login` first"))
  }
}

fn require_store(sf: &Storefront) -> Result<()> {
  require_session(sf)?;
  if sf.session().current_store().is_none() {
    return Err(eyre!("No store selected, run `storefront use-store <slug>`"));
  }
  Ok(())
}

fn print_chart(points: &[(&str, f64)]) {
  let max = points.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
  if max <= 0.0 {
    return;
  }
  for (date, value) in points {
    let width = ((value / max) * 40.0).round() as usize;
    println!("  {:<10} {:<40} {:.2}", date, "#".repeat(width), value);
  }
}
