use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use studio_ledger::config::LedgerConfig;
use studio_ledger::dates;
use studio_ledger::model::{
    ExpenseCategory, ExpenseEntry, PaymentMethod, RevenueSubmission, Service,
};
use studio_ledger::report::{MonthFilter, format_currency};
use studio_ledger::{Ledger, LedgerError, Result, load_ledger};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| LedgerError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let mut ledger = load_ledger(&config)?;

    match cli.command {
        Command::Revenue(args) => {
            ledger.record_revenue(args.into_submission())?;
            println!("Service recorded.");
        }
        Command::Expense(args) => {
            ledger.record_expense(args.into_entry())?;
            println!("Expense recorded.");
        }
        Command::List { collection } => print_collection(&ledger, collection),
        Command::Clients => print_clients(&ledger),
        Command::Months => {
            for month in ledger.available_months() {
                println!("{month}");
            }
        }
        Command::Report { month, json } => print_report(&ledger, month, json)?,
    }
    Ok(())
}

fn print_collection(ledger: &Ledger, collection: ListKind) {
    match collection {
        ListKind::Revenues => {
            if ledger.list_revenues().is_empty() {
                println!("No services recorded yet.");
                return;
            }
            let rows = ledger.list_revenues().iter().map(|entry| RevenueRow {
                date: dates::format(entry.date),
                client: entry.client_name.clone(),
                service: entry.service.to_string(),
                amount: format_currency(entry.amount),
                paid: if entry.paid { "yes" } else { "no" }.to_string(),
                payment: entry.payment_method.to_string(),
                note: entry.note.clone().unwrap_or_default(),
            });
            print_table(rows);
        }
        ListKind::Expenses => {
            if ledger.list_expenses().is_empty() {
                println!("No expenses recorded yet.");
                return;
            }
            let rows = ledger.list_expenses().iter().map(|entry| ExpenseRow {
                date: dates::format(entry.date),
                category: entry.category.to_string(),
                description: entry.description.clone(),
                amount: format_currency(entry.amount),
                payment: entry.payment_method.to_string(),
                note: entry.note.clone().unwrap_or_default(),
            });
            print_table(rows);
        }
    }
}

fn print_clients(ledger: &Ledger) {
    if ledger.clients().is_empty() {
        println!("No clients yet.");
        return;
    }
    let rows = ledger.clients().iter().map(|client| ClientRow {
        name: client.name.clone(),
        phone: client.phone.clone().unwrap_or_default(),
        last_visit: dates::format(client.last_service_date),
        service: client.last_service.map(|service| service.to_string()).unwrap_or_default(),
    });
    print_table(rows);
}

fn print_table<R: Tabled>(rows: impl IntoIterator<Item = R>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

#[derive(Tabled)]
struct RevenueRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Paid")]
    paid: String,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Last visit")]
    last_visit: String,
    #[tabled(rename = "Service")]
    service: String,
}

fn print_report(ledger: &Ledger, month: MonthFilter, json: bool) -> Result<()> {
    let totals = ledger.totals(month);
    let categories = ledger.by_category();

    if json {
        let by_category: serde_json::Map<String, serde_json::Value> = categories
            .iter()
            .map(|(category, amount)| (category.label().to_string(), amount.to_string().into()))
            .collect();
        let document = serde_json::json!({
            "month": month.to_string(),
            "totals": totals,
            "is_loss": totals.is_loss(),
            "by_category": by_category,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("Month:          {month}");
    println!("Total revenue:  {}", format_currency(totals.total_revenue));
    println!("Total expenses: {}", format_currency(totals.total_expense));
    let marker = if totals.is_loss() { "  (loss)" } else { "" };
    println!("Net profit:     {}{marker}", format_currency(totals.net_profit));

    if !categories.is_empty() {
        println!();
        println!("Expenses by category:");
        print_table(categories.iter().map(|(category, amount)| CategoryRow {
            category: category.to_string(),
            amount: format_currency(*amount),
        }));
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    dates::normalize(raw)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Record studio services and expenses and report monthly results."
)]
struct Cli {
    /// Directory holding the ledger workbooks.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Optional JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn resolve_config(&self) -> Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => LedgerConfig::from_file(path)?,
            None => LedgerConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Record a client service.
    Revenue(RevenueArgs),
    /// Record an expense.
    Expense(ExpenseArgs),
    /// List recorded entries in insertion order.
    List {
        #[arg(value_enum)]
        collection: ListKind,
    },
    /// Show the client roster.
    Clients,
    /// Show the months that have revenue.
    Months,
    /// Show totals and the expense breakdown.
    Report {
        /// `All` or a `MM/YYYY` month.
        #[arg(long, default_value = "All")]
        month: MonthFilter,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ListKind {
    Revenues,
    Expenses,
}

#[derive(clap::Args)]
struct RevenueArgs {
    /// Client name.
    #[arg(long)]
    client: String,

    #[arg(long)]
    phone: Option<String>,

    /// Makeup, Lash Extension, Eyebrow or Other.
    #[arg(long)]
    service: Service,

    #[arg(long)]
    amount: Decimal,

    /// Mark the service as not yet paid.
    #[arg(long)]
    unpaid: bool,

    /// Pix, Cash, Card or Other.
    #[arg(long, default_value = "Pix")]
    payment: PaymentMethod,

    /// Service date (DD/MM/YYYY or YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    #[arg(long)]
    note: Option<String>,
}

impl RevenueArgs {
    fn into_submission(self) -> RevenueSubmission {
        RevenueSubmission {
            date: self.date.unwrap_or_else(today),
            client_name: self.client,
            phone: self.phone,
            service: self.service,
            amount: self.amount,
            paid: !self.unpaid,
            payment_method: self.payment,
            note: self.note,
        }
    }
}

#[derive(clap::Args)]
struct ExpenseArgs {
    /// Materials, Rent, Salaries, Maintenance or Other.
    #[arg(long)]
    category: ExpenseCategory,

    #[arg(long)]
    description: String,

    #[arg(long)]
    amount: Decimal,

    /// Pix, Cash, Card or Other.
    #[arg(long, default_value = "Pix")]
    payment: PaymentMethod,

    /// Expense date (DD/MM/YYYY or YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    #[arg(long)]
    note: Option<String>,
}

impl ExpenseArgs {
    fn into_entry(self) -> ExpenseEntry {
        ExpenseEntry {
            date: self.date.unwrap_or_else(today),
            category: self.category,
            description: self.description,
            amount: self.amount,
            payment_method: self.payment,
            note: self.note,
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
