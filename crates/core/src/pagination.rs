//! Drives multi-page reads to completion.

use std::future::Future;

use crate::request::{normalize_limit, PageRequest};
use crate::store::Page;

/// Fetches pages until the store reports no continuation cursor or `limit`
/// records have been collected.
///
/// Pages are fetched strictly one after another, each resuming from the
/// previous page's cursor and asking only for the records still wanted.
/// Once the limit is reached the cursor is dropped and the result truncated
/// to exactly `limit` records. The first error aborts the read and the pages
/// gathered so far are discarded.
///
/// A limit of `None` or `Some(0)` fetches every page.
pub async fn paginate<R, C, E, F, Fut>(limit: Option<u32>, mut fetch: F) -> Result<Vec<R>, E>
where
    F: FnMut(PageRequest<C>) -> Fut,
    Fut: Future<Output = Result<Page<R, C>, E>>,
{
    let limit = normalize_limit(limit).map(|limit| limit as usize);
    let mut items = Vec::new();
    let mut cursor: Option<C> = None;
    let mut pages = 0usize;

    loop {
        let remaining = limit.map(|limit| (limit - items.len()) as u32);
        let page = fetch(PageRequest {
            start: cursor.take(),
            limit: remaining,
        })
        .await?;
        pages += 1;

        tracing::debug!(
            page = pages,
            items = page.items.len(),
            more = page.cursor.is_some(),
            "Fetched page"
        );

        items.extend(page.items);
        cursor = page.cursor;

        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                break;
            }
        }
        if cursor.is_none() {
            break;
        }
    }

    Ok(items)
}
