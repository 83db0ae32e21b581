//! Plain terminal output for result pages and suggestion lists.

use console::style;

use solrpage::{FacetCounts, SearchPage, Settings};

pub fn print_page(page: &SearchPage, settings: &Settings) {
    println!(
        "{} {} ({} found)",
        style("Page").bold(),
        style(page.page_number).bold().cyan(),
        page.num_found
    );

    if page.documents.is_empty() {
        println!("  {}", style("no documents").dim());
    }

    for doc in &page.documents {
        let title = doc.title.as_deref().unwrap_or(&doc.id);
        println!();
        println!("  {}", style(title).green().bold());
        if let Some(link) = doc.link(&settings.link_prefix) {
            println!("  {}", style(link).underlined());
        }
        if let Some(snippet) = doc.snippet(settings.snippet_chars) {
            println!("  {}", snippet);
        }
    }

    let mut nav = Vec::new();
    if page.has_previous {
        nav.push("[p]rev");
    }
    if page.has_next {
        nav.push("[n]ext");
    }
    if !nav.is_empty() {
        println!();
        println!("{}", style(nav.join("  ")).dim());
    }
}

pub fn print_suggestions(facets: &FacetCounts, fields: &[String]) {
    for field in fields {
        println!("{}", style(field).bold());
        match facets.get(field) {
            Some(values) if !values.is_empty() => {
                for value in values {
                    println!("  {} ({})", value.value, value.count);
                }
            }
            _ => println!("  {}", style("none").dim()),
        }
    }
}
