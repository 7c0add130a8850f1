// ── Issuance orchestrator ──
//
// Drives the per-coupon vendor workflows, strictly sequentially: the
// vendor documents no concurrency guarantees for related items, and the
// ledger file has no lock. One run = resolve contract (fatal on failure)
// -> expire ledgered coupons (warn on failure) -> issue every spec,
// collecting per-coupon outcomes into a summary that is returned, never
// thrown.

use std::time::Duration;

use chrono::Local;
use tracing::{debug, info, warn};

use wingman_api::types::{
    DownloadCouponRequest, InstantCouponRequest, RequestStatus, RequestStatusContent,
};
use wingman_api::OpenApiClient;

use crate::error::CoreError;
use crate::ledger::{IssuanceRecord, Ledger};
use crate::model::{Coupon, CouponKind, DEFAULT_ISSUE_COUNT, DEFAULT_MIN_PURCHASE_PRICE};
use crate::schedule::{self, WINDOW_FORMAT};

// ── Polling policy ───────────────────────────────────────────────────

/// Budget for polling asynchronous FMS requests. Injected so tests can
/// shrink the interval to nothing.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// How many status fetches before giving up.
    pub max_attempts: u32,
    /// Pause between consecutive fetches.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_secs(3),
        }
    }
}

impl PollPolicy {
    /// Time actually spent sleeping across a full poll budget. There is
    /// no sleep after the final fetch, so this is one interval short of
    /// `interval * max_attempts`.
    fn total_wait(self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

// ── Batch result ─────────────────────────────────────────────────────

/// Outcome of one coupon spec. Failures are data here, not errors.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CouponResult {
    pub name: String,
    pub kind: CouponKind,
    pub success: bool,
    pub message: String,
}

/// Every spec's outcome, in spreadsheet order.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IssueSummary {
    pub results: Vec<CouponResult>,
}

impl IssueSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

// ── Issuer ───────────────────────────────────────────────────────────

/// The issuance engine for one run. Owns the signed client, the ledger,
/// and the polling budget.
pub struct Issuer {
    client: OpenApiClient,
    ledger: Ledger,
    poll: PollPolicy,
}

impl Issuer {
    pub fn new(client: OpenApiClient, ledger: Ledger, poll: PollPolicy) -> Self {
        Self {
            client,
            ledger,
            poll,
        }
    }

    /// Run the whole batch: contract resolution and ledger expiry first,
    /// then one attempt per coupon. Only initialization failures surface
    /// as `Err`; per-coupon failures land in the summary.
    pub async fn issue_all(&self, coupons: &[Coupon]) -> Result<IssueSummary, CoreError> {
        let contract_id = self.resolve_contract().await?;
        info!(contract_id, "billing contract resolved");

        self.expire_previous().await;

        let mut summary = IssueSummary::default();
        for (index, coupon) in coupons.iter().enumerate() {
            info!(
                "[{}/{}] issuing {} ({})",
                index + 1,
                coupons.len(),
                coupon.name,
                coupon.kind.label()
            );

            let outcome = match coupon.kind {
                CouponKind::Instant => self.issue_instant(contract_id, coupon).await,
                CouponKind::Download => self.issue_download(contract_id, coupon).await,
            };

            summary.results.push(match outcome {
                Ok(message) => CouponResult {
                    name: coupon.name.clone(),
                    kind: coupon.kind,
                    success: true,
                    message,
                },
                Err(err) => {
                    warn!("coupon '{}' failed: {err}", coupon.name);
                    CouponResult {
                        name: coupon.name.clone(),
                        kind: coupon.kind,
                        success: false,
                        message: err.to_string(),
                    }
                }
            });
        }

        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "issuance run finished"
        );
        Ok(summary)
    }

    // ── Initialization ───────────────────────────────────────────────

    /// Promotions are always booked under the seller's free-form
    /// contract: type `NON_CONTRACT_BASED`, sentinel code -1. Anything
    /// other than exactly one match aborts the run.
    async fn resolve_contract(&self) -> Result<i64, CoreError> {
        let contracts = self.client.list_contracts().await?;
        let mut matches = contracts.iter().filter(|c| c.is_non_contract_based());

        match (matches.next(), matches.next()) {
            (Some(contract), None) => Ok(contract.contract_id),
            (first, _) => Err(CoreError::ContractResolution {
                found: contracts
                    .iter()
                    .filter(|c| c.is_non_contract_based())
                    .count()
                    .max(usize::from(first.is_some())),
            }),
        }
    }

    // ── Ledger expiry pre-step ───────────────────────────────────────

    /// Expire everything issued on previous runs. Nothing here is fatal:
    /// a failed expiry is logged and the run proceeds, and the ledger is
    /// cleared regardless so it cannot grow without bound.
    async fn expire_previous(&self) {
        let records = match self.ledger.load() {
            Ok(records) => records,
            Err(err) => {
                warn!("could not read the issued-coupon ledger: {err}");
                return;
            }
        };
        if records.is_empty() {
            debug!("ledger empty, nothing to expire");
            return;
        }

        info!("expiring {} previously issued download coupons", records.len());
        let ids: Vec<i64> = records.iter().map(|r| r.coupon_id).collect();

        match self.client.expire_download_coupons(&ids).await {
            Ok(outcomes) => {
                for (record, outcome) in records.iter().zip(&outcomes) {
                    let id = outcome.coupon_id().unwrap_or(record.coupon_id);
                    if outcome.is_success() {
                        info!("expired coupon {id} ({})", record.name);
                    } else {
                        warn!(
                            "vendor refused to expire coupon {id} ({}): {}",
                            record.name,
                            outcome
                                .error_message
                                .as_deref()
                                .unwrap_or("no reason given")
                        );
                    }
                }
            }
            Err(err) => warn!("batch expiry call failed, continuing with issuance: {err}"),
        }

        if let Err(err) = self.ledger.clear() {
            warn!("could not clear the issued-coupon ledger: {err}");
        }
    }

    // ── Instant workflow (asynchronous, 4 vendor calls) ──────────────

    async fn issue_instant(&self, contract_id: i64, coupon: &Coupon) -> Result<String, CoreError> {
        let window = schedule::instant_window(Local::now().naive_local(), coupon.validity_days);

        // 1. Create -> ticket.
        let created = self
            .client
            .create_instant_coupon(&InstantCouponRequest {
                contract_id,
                name: coupon.name.clone(),
                max_discount_price: coupon.max_discount_price,
                discount: coupon.discount_value,
                start_at: window.start,
                end_at: window.end,
                discount_type: coupon.discount_mode.wire(),
            })
            .await?;
        let ticket = created
            .requested_id
            .ok_or_else(|| CoreError::issuance("creation returned no requestedId"))?;

        // 2. Poll creation to completion.
        let status = self.poll_until_settled(&ticket).await?;
        if status.status != Some(RequestStatus::Done) {
            return Err(CoreError::issuance(format!(
                "creation finished with status {:?}",
                status.status
            )));
        }
        let coupon_id = status
            .coupon_id
            .ok_or_else(|| CoreError::issuance("creation completed without a couponId"))?;
        debug!(coupon_id, "instant coupon created");

        // 3. Apply items -> second ticket.
        let applied = self
            .client
            .apply_instant_coupon_items(coupon_id, &coupon.vendor_item_ids)
            .await?;
        let ticket = applied
            .requested_id
            .ok_or_else(|| CoreError::issuance("item application returned no requestedId"))?;

        // 4. Poll application. A DONE status can still carry per-item
        //    failures, which make the whole coupon a failure for this row.
        let status = self.poll_until_settled(&ticket).await?;
        if status.status != Some(RequestStatus::Done) {
            return Err(CoreError::issuance(format!(
                "item application finished with status {:?}",
                status.status
            )));
        }
        if !status.failed_vendor_items.is_empty() {
            let details: Vec<String> = status
                .failed_vendor_items
                .iter()
                .map(|item| {
                    format!(
                        "{}: {}",
                        item.vendor_item_id
                            .map_or_else(|| "?".to_owned(), |id| id.to_string()),
                        item.reason.as_deref().unwrap_or("no reason given")
                    )
                })
                .collect();
            return Err(CoreError::issuance(format!(
                "some items were not applied ({})",
                details.join(", ")
            )));
        }

        Ok(format!(
            "instant coupon {coupon_id} created, {} item(s) applied",
            coupon.vendor_item_ids.len()
        ))
    }

    /// Poll an FMS ticket until DONE or FAIL. `REQUESTED` (and any status
    /// this client does not know) keeps polling; exhausting the budget is
    /// a timeout for this coupon.
    async fn poll_until_settled(&self, ticket: &str) -> Result<RequestStatusContent, CoreError> {
        for attempt in 1..=self.poll.max_attempts {
            let content = self.client.instant_request_status(ticket).await?;
            match content.status {
                Some(RequestStatus::Done | RequestStatus::Fail) => return Ok(content),
                _ => debug!(ticket, attempt, "request still pending"),
            }
            if attempt < self.poll.max_attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }
        Err(CoreError::PollTimeout {
            attempts: self.poll.max_attempts,
            waited_secs: self.poll.total_wait().as_secs(),
        })
    }

    // ── Download workflow (synchronous, 2 vendor calls) ──────────────

    async fn issue_download(&self, contract_id: i64, coupon: &Coupon) -> Result<String, CoreError> {
        let now = Local::now().naive_local();
        let window = schedule::download_window(now, coupon.validity_days);

        // 1. Create: synchronous, the coupon id comes back directly.
        let created = self
            .client
            .create_download_coupon(&DownloadCouponRequest {
                title: coupon.name.clone(),
                contract_id,
                start_date: window.start,
                end_date: window.end,
                discount_type: coupon.discount_mode.wire(),
                description: format!("{} ({}일간 유효)", coupon.name, coupon.validity_days),
                minimum_price: coupon.min_purchase_price.unwrap_or(DEFAULT_MIN_PURCHASE_PRICE),
                discount: coupon.discount_value,
                maximum_discount_price: coupon.max_discount_price,
                maximum_per_daily: coupon.issue_count.unwrap_or(DEFAULT_ISSUE_COUNT),
            })
            .await?;
        let coupon_id = created
            .coupon_id
            .ok_or_else(|| CoreError::issuance("creation returned no couponId"))?;
        debug!(coupon_id, "download coupon created");

        // 2. Apply items: the response is an array, first element decides.
        let results = self
            .client
            .apply_download_coupon_items(coupon_id, &coupon.vendor_item_ids)
            .await?;
        let first = results
            .first()
            .ok_or_else(|| CoreError::issuance("item application returned no results"))?;
        if !first.is_success() {
            return Err(CoreError::issuance(format!(
                "item application rejected: {}",
                first.error_message.as_deref().unwrap_or("no reason given")
            )));
        }

        // 3. Record in the ledger before touching the next coupon. The
        //    coupon exists on the vendor side either way, so a ledger
        //    write failure downgrades to a warning: next run simply won't
        //    expire this one.
        let record = IssuanceRecord {
            name: coupon.name.clone(),
            coupon_id,
            issued_at: now.format(WINDOW_FORMAT).to_string(),
        };
        if let Err(err) = self.ledger.append(record) {
            warn!("coupon {coupon_id} issued but not recorded in the ledger: {err}");
        }

        Ok(format!(
            "download coupon {coupon_id} created, {} item(s) applied",
            coupon.vendor_item_ids.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_wait_excludes_the_trailing_sleep() {
        let policy = PollPolicy {
            max_attempts: 20,
            interval: Duration::from_secs(3),
        };
        assert_eq!(policy.total_wait(), Duration::from_secs(57));
    }

    #[test]
    fn single_attempt_budget_waits_nothing() {
        let policy = PollPolicy {
            max_attempts: 1,
            interval: Duration::from_secs(3),
        };
        assert_eq!(policy.total_wait(), Duration::ZERO);
    }
}
