use chrono::{Local, NaiveDate};
use clap::Parser;
use crm::records::parse_date;
use crm::{export_report, ClientDraft, Dataset, DataPaths, Session};
use env_logger::Env;
use log::error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Mini-CRM for event ticket sales
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding clientes.csv, eventos.csv and ventas.csv
    #[arg(short, long, default_value = crm::config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
}

const MENU: &str = "\
============================================================
 Mini-CRM: events
============================================================
1) Load CSV data
2) List clients
3) List events
4) List sales
5) Add client
6) Filter sales by date range
7) Statistics
8) Export report
0) Exit";

struct Console<I> {
    lines: I,
}

impl<I: Iterator<Item = io::Result<String>>> Console<I> {
    /// `None` once input is exhausted.
    fn ask(&mut self, label: &str) -> Option<String> {
        print!("{label}");
        io::stdout().flush().ok()?;
        self.lines.next()?.ok().map(|line| line.trim().to_string())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn list<T: std::fmt::Display>(title: &str, items: &[T]) {
    if items.is_empty() {
        println!("No {title} loaded.\n");
        return;
    }
    println!("{}\n{}", "=".repeat(60), title.to_uppercase());
    items.iter().for_each(|item| println!("{item}"));
    println!("{}\n", "=".repeat(60));
}

fn show_statistics(dataset: &Dataset) {
    let stats = dataset.statistics(today());
    println!("=== Statistics ===");
    println!("Total revenue: {:.2}", stats.total_revenue.round_dp(2));
    for (event_id, revenue) in &stats.revenue_per_event {
        println!("  - {}: {:.2}", dataset.event_name(*event_id), revenue.round_dp(2));
    }
    let categories: Vec<&str> = stats.categories.iter().map(String::as_str).collect();
    println!("Categories: {}", categories.join(", "));
    match stats.days_to_nearest_event {
        Some(days) => println!("Days until next event: {days}"),
        None => println!("Days until next event: N/A"),
    }
    println!(
        "Prices (min, max, mean): ({:.2}, {:.2}, {:.2})\n",
        stats.prices.min.round_dp(2),
        stats.prices.max.round_dp(2),
        stats.prices.mean.round_dp(2)
    );
}

fn filter_sales<I>(console: &mut Console<I>, dataset: &Dataset)
where
    I: Iterator<Item = io::Result<String>>,
{
    println!("=== Sales by date range ===");
    let (Some(start), Some(end)) = (
        console.ask("Start date (YYYY-MM-DD): "),
        console.ask("End date (YYYY-MM-DD): "),
    ) else {
        return;
    };
    let lines = parse_date(&start)
        .and_then(|start| Ok((start, parse_date(&end)?)))
        .and_then(|(start, end)| dataset.sales_between(start, end));
    match lines {
        Ok(lines) => {
            println!("\nResults ({} sales):", lines.len());
            lines.iter().for_each(|line| println!("- {line}"));
            println!();
        }
        Err(err) => println!("Invalid dates: {err}\n"),
    }
}

fn add_client<I>(console: &mut Console<I>, session: &mut Session)
where
    I: Iterator<Item = io::Result<String>>,
{
    println!("=== New client ===");
    let Some(name) = console.ask("Name: ") else { return };
    let Some(email) = console.ask("Email: ") else { return };
    let Some(signup_date) = console.ask("Signup date (YYYY-MM-DD): ") else { return };
    let Some(active) = console.ask("Active? (y/n): ") else { return };

    let draft = ClientDraft {
        name,
        email,
        signup_date,
        active,
    };
    match session.create_client(draft) {
        Ok(client) => println!("Client created: {client}\n"),
        Err(err) => println!("Client not created: {err}\n"),
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut session = Session::new(DataPaths::new(args.data_dir));
    let stdin = io::stdin();
    let mut console = Console {
        lines: stdin.lock().lines(),
    };

    loop {
        println!("{MENU}");
        let Some(choice) = console.ask("Option: ") else { break };

        match choice.as_str() {
            "0" => {
                println!("Goodbye!");
                break;
            }
            "1" => match session.load() {
                Ok(dataset) => println!(
                    "Loaded {} clients, {} events, {} sales.\n",
                    dataset.clients().len(),
                    dataset.events().len(),
                    dataset.sales().len()
                ),
                Err(err) => error!("loading failed: {}", err),
            },
            "5" => add_client(&mut console, &mut session),
            "2" | "3" | "4" | "6" | "7" | "8" => {
                let Some(dataset) = session.dataset() else {
                    println!("No data loaded, choose option 1 first.\n");
                    continue;
                };
                match choice.as_str() {
                    "2" => list("clients", dataset.clients()),
                    "3" => list("events", dataset.events()),
                    "4" => list("sales", dataset.sales()),
                    "6" => filter_sales(&mut console, dataset),
                    "7" => show_statistics(dataset),
                    _ => {
                        let path = session.paths().report();
                        match export_report(dataset.events(), dataset.sales(), &path) {
                            Ok(rows) => {
                                println!("Report exported ({rows} rows): {}\n", path.display())
                            }
                            Err(err) => error!("export failed: {}", err),
                        }
                    }
                }
            }
            _ => println!("Invalid option.\n"),
        }
    }
}
