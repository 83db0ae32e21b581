//! Interactive paging.

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use solrpage::{SearchError, SearchPage, SearchQuery, Session, Settings, Transport};

const HELP: &str = "n next · p previous · r refresh · s <text> new search · q quit";

enum Action {
    Next,
    Prev,
    Refresh,
    Search(String),
    Quit,
    Help,
}

fn parse_action(line: &str) -> Option<Action> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    match cmd {
        "" | "n" | "next" => Some(Action::Next),
        "p" | "prev" => Some(Action::Prev),
        "r" | "refresh" => Some(Action::Refresh),
        "s" | "search" => Some(Action::Search(rest.trim().to_string())),
        "q" | "quit" | "exit" => Some(Action::Quit),
        "h" | "help" | "?" => Some(Action::Help),
        _ => None,
    }
}

fn report(result: Result<SearchPage, SearchError>, settings: &Settings) {
    match result {
        Ok(page) => super::render::print_page(&page, settings),
        Err(e) if e.is_boundary() => println!("{}", style(e).yellow()),
        Err(e) => println!("{} {}", style("error:").red().bold(), e),
    }
}

pub async fn run<T: Transport>(
    session: &mut Session<T>,
    query: SearchQuery,
    settings: &Settings,
) -> anyhow::Result<()> {
    let template = query.clone();
    report(session.submit(query).await, settings);
    println!("{}", style(HELP).dim());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(action) = parse_action(&line) else {
            println!("{}", style(HELP).dim());
            continue;
        };

        let result = match action {
            Action::Next => session.next().await,
            Action::Prev => session.prev().await,
            Action::Refresh => session.refresh().await,
            Action::Search(text) => {
                let mut query = session
                    .controller()
                    .query()
                    .cloned()
                    .unwrap_or_else(|| template.clone());
                query.clear_input();
                query.text = text;
                session.submit(query).await
            }
            Action::Quit => break,
            Action::Help => {
                println!("{}", style(HELP).dim());
                continue;
            }
        };

        debug!(
            position = session.controller().cursor_cache().position(),
            pages_known = session.controller().cursor_cache().len(),
            "Navigation finished"
        );
        report(result, settings);
    }

    Ok(())
}
