//! Offline catalog search.

use ecomify_storefront::catalog::builtin_products;
use ecomify_storefront::catalog::search::{SearchQuery, SearchSort, search};

use super::brl;

/// Search the built-in catalog and print the hits.
#[allow(clippy::print_stdout)]
pub fn run(query: &str, limit: usize, sort: SearchSort) {
    let products = builtin_products();
    let hits = search(
        &products,
        &SearchQuery {
            sort,
            limit: Some(limit),
            ..SearchQuery::text(query)
        },
    );

    if hits.is_empty() {
        println!("Nenhum produto encontrado para \"{query}\"");
        return;
    }

    for hit in hits {
        let p = &hit.product;
        println!(
            "{:>3}  {:<40} {:<10} {:>14}  score {:.1}",
            p.id,
            p.name,
            p.brand,
            brl(p.price),
            hit.score
        );
    }
}
