use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, info, instrument, warn};

use super::error::QuoteError;
use crate::api_keys::repo::ApiKey;
use crate::assets::{repo_types::Asset, services::normalize_tag};
use crate::state::AppState;

/// Trim, upper-case and de-duplicate symbols, keeping at most `limit`.
pub fn normalize_symbols(symbols: &[String], limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(symbols.len().min(limit));
    for symbol in symbols.iter().map(|s| normalize_tag(s)) {
        if out.len() == limit {
            break;
        }
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

/// Normalised batch for an explicit refresh plus how many distinct symbols
/// fell past `limit`.
pub fn refresh_batch(symbols: &[String], limit: usize) -> (Vec<String>, usize) {
    let mut distinct = normalize_symbols(symbols, usize::MAX);
    let dropped = distinct.len().saturating_sub(limit);
    distinct.truncate(limit);
    (distinct, dropped)
}

/// Fetch quotes for `symbols` with the user's key and write them to the
/// user's rows. Returns the number of rows updated.
#[instrument(skip(state))]
pub async fn refresh_symbols(
    state: &AppState,
    user_id: i64,
    symbols: &[String],
) -> Result<u64, QuoteError> {
    if symbols.is_empty() {
        return Ok(0);
    }

    let api_key = ApiKey::find(&state.db, user_id)
        .await?
        .ok_or(QuoteError::MissingApiKey)?;

    let quotes = state.quotes.fetch_quotes(symbols, &api_key).await?;

    let now = OffsetDateTime::now_utc();
    let mut updated = 0;
    for mut quote in quotes {
        quote.symbol = normalize_tag(&quote.symbol);
        let rows = Asset::apply_quote(&state.db, user_id, &quote, now).await?;
        debug!(symbol = %quote.symbol, price = quote.price, rows, "quote applied");
        updated += rows;
    }

    info!(user_id, requested = symbols.len(), updated, "quotes refreshed");
    Ok(updated)
}

/// Refresh the user's oldest symbols when their newest update is older
/// than the configured threshold.
#[instrument(skip(state))]
pub async fn refresh_if_stale(state: &AppState, user_id: i64) -> Result<u64, QuoteError> {
    let Some(last) = Asset::last_updated(&state.db, user_id).await? else {
        return Ok(0);
    };

    let threshold = TimeDuration::seconds(state.config.quotes.stale_after_secs);
    let age = OffsetDateTime::now_utc() - last;
    if age < threshold {
        debug!(user_id, age_secs = age.whole_seconds(), "quotes fresh, skipping refresh");
        return Ok(0);
    }

    let symbols = Asset::stale_symbols(&state.db, user_id, state.config.quotes.batch_limit).await?;
    refresh_symbols(state, user_id, &symbols).await
}

/// Run a refresh for the caller; failures are logged and swallowed so the
/// surrounding request still answers with stored data.
pub async fn try_refresh(state: &AppState, user_id: i64, symbols: &[String]) {
    if let Err(e) = refresh_symbols(state, user_id, symbols).await {
        warn!(user_id, error = %e, "quote refresh failed");
    }
}

pub async fn try_refresh_if_stale(state: &AppState, user_id: i64) {
    if let Err(e) = refresh_if_stale(state, user_id).await {
        warn!(user_id, error = %e, "stale quote refresh failed");
    }
}
