use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use rust_decimal::Decimal;

use crate::application::pagination::PageRequest;
use crate::application::repos::ProductQueryFilter;
use crate::domain::types::{SortField, SortOrder};

/// Command-line arguments for the Vitrina binary.
#[derive(Debug, Parser)]
#[command(name = "vitrina", version, about = "Query the Vitrina product catalog")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "VITRINA_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List products with filters, sorting and pagination.
    List(ListArgs),
    /// Show one product by id.
    Show(ShowArgs),
    /// Free-text search over name, description and category.
    Search(SearchArgs),
    /// List the category vocabulary.
    Categories,
    /// List active products of one category.
    #[command(name = "by-category")]
    ByCategory(ByCategoryArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Toggle simulated store latency.
    #[arg(
        long = "simulate-latency",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub simulate_latency: Option<bool>,

    /// Toggle accent-insensitive search matching.
    #[arg(
        long = "accent-insensitive",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub accent_insensitive: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListArgs {
    /// Substring of the name or description, case-insensitive.
    #[arg(long)]
    pub search: Option<String>,

    /// Exact category.
    #[arg(long)]
    pub category: Option<String>,

    /// Inclusive lower price bound.
    #[arg(long = "min-price", value_name = "PRICE")]
    pub min_price: Option<Decimal>,

    /// Inclusive upper price bound.
    #[arg(long = "max-price", value_name = "PRICE")]
    pub max_price: Option<Decimal>,

    /// Only active (true) or inactive (false) products.
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub active: Option<bool>,

    /// Page number, starting at 1.
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Sort field, e.g. `price` or `createdAt`.
    #[arg(long = "sort-by", value_name = "FIELD")]
    pub sort_by: Option<SortField>,

    /// Sort direction (asc|desc).
    #[arg(long = "sort-order", value_name = "ORDER")]
    pub sort_order: Option<SortOrder>,
}

impl ListArgs {
    pub fn filter(&self) -> ProductQueryFilter {
        ProductQueryFilter {
            search: self.search.clone(),
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            is_active: self.active,
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Product id.
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// Text to look for.
    pub query: String,
}

#[derive(Debug, Args, Clone)]
pub struct ByCategoryArgs {
    /// Category name.
    pub category: String,
}
