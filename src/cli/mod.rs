//! Command-line interface for solrq.

mod browse;
mod render;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use console::style;

use solrpage::{SearchError, SearchQuery, Session, Settings};

/// Search a Solr core with cursor pagination.
#[derive(Debug, Parser)]
#[command(name = "solrq", version, about)]
pub struct Cli {
    /// Solr request handler URL (overrides config).
    #[arg(long, env = "SOLRPAGE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print one or more pages of results.
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Number of pages to walk forward.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Page through results interactively.
    Browse {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print facet suggestion lists.
    Suggest {
        /// Facet field (repeatable; defaults to configured facet fields).
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query text (empty matches everything).
    pub text: Vec<String>,

    /// Results per page.
    #[arg(long)]
    pub rows: Option<u32>,

    /// Sort, e.g. "id asc".
    #[arg(long)]
    pub sort: Option<String>,

    /// Filter as field=value (field must be a configured filter field).
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Skip facet counts.
    #[arg(long)]
    pub no_facet: bool,
}

impl QueryArgs {
    /// Build a query from settings, with command-line overrides.
    pub fn to_query(&self, settings: &Settings) -> anyhow::Result<SearchQuery> {
        let mut query = settings.query(&self.text.join(" "))?;

        if let Some(rows) = self.rows {
            query.rows = rows;
        }
        if let Some(ref sort) = self.sort {
            query.sort = sort.parse()?;
        }
        if self.no_facet {
            query.facet = false;
        }

        for filter in &self.filters {
            let (field, value) = filter
                .split_once('=')
                .with_context(|| format!("filter must be FIELD=VALUE: {}", filter))?;
            if !query.filters.set_field(field, Some(value.to_string())) {
                bail!(
                    "{} is not a filter field (configured: {})",
                    field,
                    settings.filter_fields.join(", ")
                );
            }
        }

        Ok(query)
    }
}

/// Dispatch a parsed command.
pub async fn run(command: Commands, settings: Settings) -> anyhow::Result<()> {
    let builder = settings.query_builder()?;
    let transport = settings.transport()?;
    let mut session = Session::new(builder, transport);

    match command {
        Commands::Search { query, pages } => {
            let query = query.to_query(&settings)?;
            let mut page = session.submit(query).await?;
            render::print_page(&page, &settings);

            for _ in 1..pages {
                page = match session.next().await {
                    Ok(page) => page,
                    Err(SearchError::NoNextPage) => {
                        println!("{}", style("No more results.").dim());
                        break;
                    }
                    Err(e) => return Err(e.into()),
                };
                render::print_page(&page, &settings);
            }
            Ok(())
        }
        Commands::Browse { query } => {
            let query = query.to_query(&settings)?;
            browse::run(&mut session, query, &settings).await
        }
        Commands::Suggest { fields } => {
            let fields = if fields.is_empty() {
                settings.facet_fields.clone()
            } else {
                fields
            };
            let facets = session.load_suggestions(&fields).await?;
            render::print_suggestions(&facets, &fields);
            Ok(())
        }
    }
}
