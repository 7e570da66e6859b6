//! Search and autocomplete from the command line.

use marys_fashion_storefront::search::ProductSearch;

use super::{CliError, Context, print_json};

pub async fn search(ctx: &Context, query: &str) -> Result<(), CliError> {
    let results = ProductSearch::new(ctx.gateways.data.clone(), &ctx.search)
        .search_by_name(query)
        .await;
    tracing::info!("{} match(es) for {:?}", results.len(), query);
    print_json(&results)
}

pub async fn suggest(ctx: &Context, query: &str) -> Result<(), CliError> {
    let suggestions = ProductSearch::new(ctx.gateways.data.clone(), &ctx.search)
        .autocomplete_suggestions(query)
        .await;
    print_json(&suggestions)
}
