//! # dex-cli
//!
//! Inspect the routing core against live RPC endpoints.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin dex-cli -- chains
//! cargo run --bin dex-cli -- tokens --chain 3888
//! cargo run --bin dex-cli -- route --chain 56 CAKE ETH
//! cargo run --bin dex-cli -- quote --chain 3888 KLC USDT 1000
//! cargo run --bin dex-cli -- preview-swap --chain 3888 KLC USDT 1000 --recipient 0x...
//! ```
//!
//! RPC endpoints come from `Config.toml` (`[rpc.endpoints]`) or
//! `SDK_RPC_URL_<CHAIN_ID>`.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ethers::types::Address;
use rust_decimal::Decimal;

use dex_router_sdk::{
    chains::{self, ChainId},
    dispatcher::AdapterRegistry,
    metrics,
    settings::Settings,
    swap_executor::SwapParams,
    tokens::{self, Token},
    types::conversions::parse_decimal,
};

#[derive(Parser)]
#[command(name = "dex-cli")]
#[command(version, about = "Multi-chain DEX routing and quoting")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print collected metrics before exiting (observability builds only)
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported chains and their deployments
    Chains,

    /// List the token directory of a chain
    Tokens {
        #[arg(short, long)]
        chain: ChainId,
    },

    /// Show the pool for two tokens
    Pair {
        #[arg(short, long)]
        chain: ChainId,
        token_a: String,
        token_b: String,
    },

    /// Find the swap route between two tokens
    Route {
        #[arg(short, long)]
        chain: ChainId,
        token_in: String,
        token_out: String,
    },

    /// Quote an exact-input swap
    Quote {
        #[arg(short, long)]
        chain: ChainId,
        token_in: String,
        token_out: String,
        amount: String,
    },

    /// Quote a swap and print the router call without sending it
    #[command(name = "preview-swap")]
    PreviewSwap {
        #[arg(short, long)]
        chain: ChainId,
        token_in: String,
        token_out: String,
        amount: String,
        #[arg(long)]
        recipient: String,
        /// Slippage tolerance in percent (defaults to settings)
        #[arg(long)]
        slippage: Option<String>,
        /// Deadline in minutes (defaults to settings)
        #[arg(long)]
        deadline: Option<u64>,
    },
}

fn init_logging(level: &str) {
    #[cfg(feature = "observability")]
    {
        let level = level.parse().unwrap_or(tracing::Level::INFO);
        tracing_subscriber::fmt().with_max_level(level).init();
    }
    #[cfg(not(feature = "observability"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }
}

#[cfg(feature = "observability")]
fn install_metrics() -> Option<metrics_exporter_prometheus::PrometheusHandle> {
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("⚠️  Failed to install metrics recorder: {}", e);
            None
        }
    }
}

/// Symbol or address; unlisted addresses are accepted as-is.
fn resolve_token(query: &str, chain_id: ChainId) -> Result<Address> {
    if let Some(token) = tokens::find_token(query, chain_id) {
        return Ok(token.address);
    }
    query
        .parse()
        .map_err(|_| anyhow!("unknown token '{}' on chain {}", query, chain_id))
}

fn listed_token(query: &str, chain_id: ChainId) -> Result<Token> {
    tokens::find_token(query, chain_id)
        .cloned()
        .ok_or_else(|| anyhow!("'{}' is not in the token list of chain {}", query, chain_id))
}

fn symbol(chain_id: ChainId, address: Address) -> String {
    tokens::token_by_address(chain_id, address)
        .map(|t| t.symbol.clone())
        .unwrap_or_else(|| format!("{:?}", address))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::new().context("loading settings")?;
    init_logging(&settings.log.level);

    #[cfg(feature = "observability")]
    let metrics_handle = if cli.metrics { install_metrics() } else { None };
    metrics::describe_metrics();

    let registry = AdapterRegistry::from_settings(&settings)?;
    run(&cli, &registry, &settings).await?;

    #[cfg(feature = "observability")]
    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }
    #[cfg(not(feature = "observability"))]
    if cli.metrics {
        eprintln!("⚠️  Built without the observability feature; no metrics recorded");
    }
    Ok(())
}

async fn run(cli: &Cli, registry: &AdapterRegistry, settings: &Settings) -> Result<()> {
    match &cli.command {
        Commands::Chains => {
            let configs: Vec<_> = registry
                .supported_chains()
                .into_iter()
                .filter_map(chains::get_config)
                .collect();
            if cli.json {
                return print_json(&configs);
            }
            for config in configs {
                let endpoint = settings.rpc_url(config.chain_id).unwrap_or("-");
                println!(
                    "{} {} ({}) fee {}/{}  rpc: {}",
                    format!("{:>6}", config.chain_id).bold(),
                    config.chain_name,
                    config.protocol_name().cyan(),
                    config.fee.numerator,
                    config.fee.denominator,
                    endpoint
                );
                println!("       router  {:?}", config.router);
                println!("       factory {:?}", config.factory);
            }
        }

        Commands::Tokens { chain } => {
            let list = registry.get_token_list(*chain)?;
            if cli.json {
                return print_json(&list);
            }
            for token in list {
                let marker = if token.is_native { " (native)".yellow().to_string() } else { String::new() };
                println!("{:<8} {:?} {:>2} decimals  {}{}", token.symbol.bold(), token.address, token.decimals, token.name, marker);
            }
        }

        Commands::Pair { chain, token_a, token_b } => {
            let a = resolve_token(token_a, *chain)?;
            let b = resolve_token(token_b, *chain)?;
            let info = registry.get_pair_info(*chain, a, b).await?;
            if cli.json {
                return print_json(&info);
            }
            if !info.exists {
                println!("{} no pool for {}/{}", "✗".red(), symbol(*chain, a), symbol(*chain, b));
                return Ok(());
            }
            println!("{} pool {:?}", "✅".green(), info.address);
            println!("   {} reserve {}", symbol(*chain, info.token0), info.reserve0);
            println!("   {} reserve {}", symbol(*chain, info.token1), info.reserve1);
            println!("   LP supply {}", info.total_supply);
        }

        Commands::Route { chain, token_in, token_out } => {
            let a = resolve_token(token_in, *chain)?;
            let b = resolve_token(token_out, *chain)?;
            let route = registry.get_swap_route(*chain, a, b).await?;
            if cli.json {
                return print_json(&route);
            }
            if route.is_empty() {
                println!("{} no route", "✗".red());
            } else {
                let hops: Vec<String> = route.iter().map(|t| symbol(*chain, *t)).collect();
                println!("{} {}", "✅".green(), hops.join(" → "));
            }
        }

        Commands::Quote { chain, token_in, token_out, amount } => {
            let a = resolve_token(token_in, *chain)?;
            let b = resolve_token(token_out, *chain)?;
            let amount = parse_decimal(amount)?;
            let quote = registry.get_quote(*chain, a, b, amount).await?;
            if cli.json {
                return print_json(&quote);
            }
            let hops: Vec<String> = quote.route.iter().map(|t| symbol(*chain, *t)).collect();
            println!(
                "{} {} {} → {} {}",
                "✅".green(),
                quote.amount_in,
                symbol(*chain, a),
                quote.amount_out.to_string().bold(),
                symbol(*chain, b)
            );
            println!("   route        {}", hops.join(" → "));
            println!("   price impact {}%", quote.price_impact_pct.round_dp(4));
        }

        Commands::PreviewSwap {
            chain,
            token_in,
            token_out,
            amount,
            recipient,
            slippage,
            deadline,
        } => {
            let recipient: Address = recipient
                .parse()
                .map_err(|_| anyhow!("invalid recipient address '{}'", recipient))?;
            let token_in = listed_token(token_in, *chain)?;
            let token_out = listed_token(token_out, *chain)?;
            let amount = parse_decimal(amount)?;
            let slippage: Decimal = match slippage {
                Some(s) => parse_decimal(s)?,
                None => settings.default_slippage(),
            };
            let quote = registry.get_quote(*chain, token_in.address, token_out.address, amount).await?;
            let params = SwapParams::from_quote(token_in, token_out, &quote, recipient)
                .with_slippage(slippage)
                .with_deadline_minutes(deadline.unwrap_or(settings.swap.deadline_minutes));
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let tx = registry.build_swap_transaction(*chain, &params, &quote.route, now)?;
            if cli.json {
                return print_json(&tx);
            }
            println!("📝 {} on {:?}", tx.function.bold(), tx.to);
            println!("   value          {}", tx.value);
            println!("   amountOutMin   {}", tx.amount_out_min);
            println!("   deadline       {}", tx.deadline);
            println!("   data           0x{}", hex::encode(&tx.data));
        }
    }
    Ok(())
}
