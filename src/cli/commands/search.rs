use crate::cli::SearchArgs;
use crate::config::Config;
use crate::models::SearchParams;
use crate::state::SharedState;

pub async fn cmd_search(config: &Config, args: SearchArgs) -> anyhow::Result<()> {
    let params = SearchParams::new(
        args.term,
        args.location,
        args.sort_by,
        args.limit,
        args.max_results,
    );

    println!(
        "Searching for '{}' in '{}' (sort: {}, max: {})",
        params.term, params.location, params.sort_by, params.max_results
    );

    let state = SharedState::new(config.clone()).await?;
    let results = state.search_service.resolve(&params).await;
    state.store.close().await?;
    let businesses = results?;

    if businesses.is_empty() {
        println!("No businesses found.");
        return Ok(());
    }

    println!();
    println!("{:-<72}", "");
    for (i, b) in businesses.iter().enumerate() {
        let price = b.price.as_deref().unwrap_or("-");
        println!(
            "{:>3}. {} ({:.1}★, {} reviews, {})",
            i + 1,
            b.name,
            b.rating,
            b.review_count,
            price
        );
        let address = b.location.address1.as_deref().unwrap_or_default();
        if address.is_empty() {
            println!("     {}", b.location.city);
        } else {
            println!("     {address}, {}", b.location.city);
        }
    }
    println!("{:-<72}", "");
    println!("{} businesses", businesses.len());

    Ok(())
}
