//! Order-line status transitions
//!
//! A transition never edits an interval: it closes the open row of the line
//! (`end_date := now`) and inserts a successor that starts at the same
//! instant, so every line keeps a gapless chain of intervals with exactly one
//! open row at the end.
//!
//! A batch runs in two phases inside one transaction:
//!
//! 1. **prepare**: lock every open row (ascending line id), check guards and
//!    compute successors. Nothing is written, so a missing line or a refused
//!    transition leaves the store untouched.
//! 2. **apply**: conditional close, then insert. A close that affects no row
//!    means another writer got there first and the batch fails with a
//!    conflict; the caller drops the transaction.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use shared::models::{OrderLineRecord, OrderStatus, TransitionResult};
use shared::util::open_end;

use super::error::{HistoryError, HistoryResult};
use super::store::LineHistoryStore;

/// What happens to one line
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Move to another non-terminal status; every other field is copied.
    ChangeStatus { next: OrderStatus },
    Cancel { cancel_reason_id: i32 },
    RequestRefund {
        refund_reason_id: i32,
        detail_reason: Option<String>,
        refund_amount: Decimal,
    },
    CompleteRefund,
    /// Back to the status held before the refund request.
    WithdrawRefund,
}

impl Transition {
    fn name(&self) -> &'static str {
        match self {
            Self::ChangeStatus { .. } => "change_status",
            Self::Cancel { .. } => "cancel",
            Self::RequestRefund { .. } => "request_refund",
            Self::CompleteRefund => "complete_refund",
            Self::WithdrawRefund => "withdraw_refund",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineTransition {
    pub line_id: i64,
    pub transition: Transition,
}

/// Validated, non-empty batch of line transitions without duplicate lines
#[derive(Debug, Clone)]
pub struct TransitionBatch {
    items: Vec<LineTransition>,
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> HistoryResult<()> {
    if expected != actual {
        return Err(HistoryError::BatchLengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

impl TransitionBatch {
    pub fn new(items: Vec<LineTransition>) -> HistoryResult<Self> {
        if items.is_empty() {
            return Err(HistoryError::BatchEmpty);
        }
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.line_id) {
                return Err(HistoryError::DuplicateLine(item.line_id));
            }
        }
        Ok(Self { items })
    }

    pub fn change_status(line_ids: &[i64], next_status: i32) -> HistoryResult<Self> {
        let next = OrderStatus::try_from(next_status)
            .map_err(|e| HistoryError::InvalidStatus(e.0))?;
        Self::uniform(line_ids, Transition::ChangeStatus { next })
    }

    pub fn cancel(line_ids: &[i64], cancel_reason_ids: &[i32]) -> HistoryResult<Self> {
        check_len("cancel_reason_ids", line_ids.len(), cancel_reason_ids.len())?;
        Self::new(
            line_ids
                .iter()
                .zip(cancel_reason_ids)
                .map(|(&line_id, &cancel_reason_id)| LineTransition {
                    line_id,
                    transition: Transition::Cancel { cancel_reason_id },
                })
                .collect(),
        )
    }

    pub fn request_refund(
        line_ids: &[i64],
        refund_reason_ids: &[i32],
        detail_reasons: &[Option<String>],
        refund_amounts: &[Decimal],
    ) -> HistoryResult<Self> {
        check_len("refund_reason_ids", line_ids.len(), refund_reason_ids.len())?;
        check_len("refund_detail_reasons", line_ids.len(), detail_reasons.len())?;
        check_len("refund_amounts", line_ids.len(), refund_amounts.len())?;
        let items = line_ids
            .iter()
            .enumerate()
            .map(|(i, &line_id)| LineTransition {
                line_id,
                transition: Transition::RequestRefund {
                    refund_reason_id: refund_reason_ids[i],
                    detail_reason: detail_reasons[i].clone(),
                    refund_amount: refund_amounts[i],
                },
            })
            .collect();
        Self::new(items)
    }

    pub fn complete_refund(line_ids: &[i64]) -> HistoryResult<Self> {
        Self::uniform(line_ids, Transition::CompleteRefund)
    }

    pub fn withdraw_refund(line_ids: &[i64]) -> HistoryResult<Self> {
        Self::uniform(line_ids, Transition::WithdrawRefund)
    }

    fn uniform(line_ids: &[i64], transition: Transition) -> HistoryResult<Self> {
        Self::new(
            line_ids
                .iter()
                .map(|&line_id| LineTransition {
                    line_id,
                    transition: transition.clone(),
                })
                .collect(),
        )
    }

    /// Phase 1: lock, guard, compute successors. Writes nothing.
    pub async fn prepare<S>(&self, store: &mut S, now: NaiveDateTime) -> HistoryResult<Plan>
    where
        S: LineHistoryStore + ?Sized,
    {
        // Lock in ascending line order so overlapping batches cannot deadlock.
        let mut ordered: Vec<&LineTransition> = self.items.iter().collect();
        ordered.sort_by_key(|item| item.line_id);

        let mut steps = Vec::with_capacity(ordered.len());
        for item in ordered {
            let prior = store
                .lock_open(item.line_id)
                .await?
                .ok_or(HistoryError::LineNotFound(item.line_id))?;

            let restore = match item.transition {
                Transition::WithdrawRefund
                    if prior.order_status_id == OrderStatus::RefundRequested =>
                {
                    let status = store
                        .status_before_refund(item.line_id, prior.start_date)
                        .await?
                        .unwrap_or(OrderStatus::PaymentComplete);
                    Some(status)
                }
                _ => None,
            };

            let successor = successor(&prior, &item.transition, restore, now)?;
            steps.push(PlannedStep {
                line_id: item.line_id,
                prior_id: prior.id,
                successor,
            });
        }

        Ok(Plan { steps, now })
    }
}

#[derive(Debug, Clone)]
struct PlannedStep {
    line_id: i64,
    prior_id: i64,
    successor: OrderLineRecord,
}

/// Prepared batch, ready to be written
#[derive(Debug, Clone)]
pub struct Plan {
    steps: Vec<PlannedStep>,
    now: NaiveDateTime,
}

impl Plan {
    /// Phase 2: close every prior interval and insert its successor.
    pub async fn apply<S>(self, store: &mut S) -> HistoryResult<TransitionResult>
    where
        S: LineHistoryStore + ?Sized,
    {
        let transitioned = self.steps.len();
        // Successors never start before their prior interval, so a line
        // whose open row starts after `now` moves the reported start too.
        let valid_from = self
            .steps
            .iter()
            .map(|step| step.successor.start_date)
            .max()
            .unwrap_or(self.now);
        for step in self.steps {
            let closed = store
                .close(step.prior_id, step.successor.start_date)
                .await?;
            if closed != 1 {
                tracing::warn!(line_id = step.line_id, "Open interval was closed concurrently");
                return Err(HistoryError::Conflict(step.line_id));
            }
            let id = store.insert(&step.successor).await?;
            tracing::debug!(
                line_id = step.line_id,
                record_id = id,
                status = step.successor.order_status_id.id(),
                "Order line interval opened"
            );
        }

        Ok(TransitionResult {
            transitioned,
            valid_from,
        })
    }
}

/// Prepare and apply in one go.
pub async fn execute<S>(
    store: &mut S,
    batch: &TransitionBatch,
    now: NaiveDateTime,
) -> HistoryResult<TransitionResult>
where
    S: LineHistoryStore + ?Sized,
{
    let kind = batch.items[0].transition.name();
    let result = batch.prepare(store, now).await?.apply(store).await?;
    tracing::info!(
        transition = kind,
        lines = result.transitioned,
        "Order lines transitioned"
    );
    Ok(result)
}

/// Successor interval for `prior` under `transition`.
///
/// `restore` is the status to return to for `WithdrawRefund`.
fn successor(
    prior: &OrderLineRecord,
    transition: &Transition,
    restore: Option<OrderStatus>,
    now: NaiveDateTime,
) -> HistoryResult<OrderLineRecord> {
    let line_id = prior.order_detail_id;
    let from = prior.order_status_id;
    if from.is_terminal() {
        return Err(HistoryError::Terminal {
            line_id,
            status: from,
        });
    }

    // Never start before the interval being closed.
    let valid_from = now.max(prior.start_date);
    let mut next = OrderLineRecord {
        id: 0,
        start_date: valid_from,
        end_date: open_end(),
        ..prior.clone()
    };

    let refuse = |to: OrderStatus| HistoryError::InvalidTransition { line_id, from, to };

    match transition {
        Transition::ChangeStatus { next: to } => {
            // Refund requests carry a reason and amount; only RequestRefund opens them.
            if to.is_terminal() || *to == OrderStatus::RefundRequested || *to == from {
                return Err(refuse(*to));
            }
            next.order_status_id = *to;
        }
        Transition::Cancel { cancel_reason_id } => {
            next.order_status_id = OrderStatus::CancelComplete;
            next.cancel_reason_id = Some(*cancel_reason_id);
            next.complete_cancellation_date = Some(valid_from);
        }
        Transition::RequestRefund {
            refund_reason_id,
            detail_reason,
            refund_amount,
        } => {
            if from == OrderStatus::RefundRequested {
                return Err(refuse(OrderStatus::RefundRequested));
            }
            next.order_status_id = OrderStatus::RefundRequested;
            next.refund_request_date = Some(valid_from);
            next.refund_reason_id = Some(*refund_reason_id);
            next.detail_reason = detail_reason.clone();
            next.refund_amount = Some(*refund_amount);
            next.refund_complete_date = None;
        }
        Transition::CompleteRefund => {
            if from != OrderStatus::RefundRequested {
                return Err(refuse(OrderStatus::RefundComplete));
            }
            next.order_status_id = OrderStatus::RefundComplete;
            next.refund_complete_date = Some(valid_from);
        }
        Transition::WithdrawRefund => {
            let Some(to) = restore.filter(|_| from == OrderStatus::RefundRequested) else {
                return Err(refuse(OrderStatus::PaymentComplete));
            };
            next.order_status_id = to;
            next.refund_request_date = None;
            next.refund_complete_date = None;
            next.refund_reason_id = None;
            next.refund_amount = None;
            next.refund_shipping_fee = None;
            next.detail_reason = None;
            next.bank = None;
            next.account_holder = None;
            next.account_number = None;
        }
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::memory::MemoryLineHistory;
    use chrono::{Duration, NaiveDate};

    fn t(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn store_with(lines: &[(i64, OrderStatus)]) -> MemoryLineHistory {
        let mut store = MemoryLineHistory::default();
        for &(line_id, status) in lines {
            store.seed(line_id, status, t(8));
        }
        store
    }

    #[tokio::test]
    async fn test_change_status_closes_and_opens_interval() {
        let mut store = store_with(&[(4821, OrderStatus::Preparing)]);
        let prior = store.open_row(4821).unwrap();

        let batch = TransitionBatch::change_status(&[4821], 3).unwrap();
        let result = execute(&mut store, &batch, t(10)).await.unwrap();
        assert_eq!(result.transitioned, 1);
        assert_eq!(result.valid_from, t(10));

        let history = store.history(4821);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].end_date, t(10));

        let current = &history[1];
        assert_eq!(current.start_date, t(10));
        assert_eq!(current.end_date, open_end());
        assert_eq!(current.order_status_id, OrderStatus::Shipping);

        // every other field is carried over unchanged
        let expected = OrderLineRecord {
            id: current.id,
            order_status_id: OrderStatus::Shipping,
            start_date: t(10),
            end_date: open_end(),
            ..prior
        };
        assert_eq!(current, &expected);
    }

    #[tokio::test]
    async fn test_single_open_interval_and_contiguity() {
        let mut store = store_with(&[(1, OrderStatus::PaymentComplete)]);

        let steps = [
            TransitionBatch::change_status(&[1], 2).unwrap(),
            TransitionBatch::change_status(&[1], 3).unwrap(),
            TransitionBatch::change_status(&[1], 4).unwrap(),
            TransitionBatch::request_refund(&[1], &[2], &[None], &[Decimal::new(15000, 0)])
                .unwrap(),
            TransitionBatch::complete_refund(&[1]).unwrap(),
        ];
        for (i, batch) in steps.iter().enumerate() {
            execute(&mut store, batch, t(9) + Duration::minutes(i as i64))
                .await
                .unwrap();
        }

        let history = store.history(1);
        assert_eq!(history.len(), 6);
        assert_eq!(history.iter().filter(|r| r.end_date == open_end()).count(), 1);
        for pair in history.windows(2) {
            assert_eq!(pair[0].end_date, pair[1].start_date);
            assert!(pair[0].start_date <= pair[0].end_date);
        }
        assert_eq!(
            history.last().unwrap().order_status_id,
            OrderStatus::RefundComplete
        );
    }

    #[tokio::test]
    async fn test_cancel_sets_reason_and_date() {
        let mut store = store_with(&[(5, OrderStatus::PaymentComplete)]);
        let batch = TransitionBatch::cancel(&[5], &[3]).unwrap();
        execute(&mut store, &batch, t(11)).await.unwrap();

        let current = store.open_row(5).unwrap();
        assert_eq!(current.order_status_id, OrderStatus::CancelComplete);
        assert_eq!(current.cancel_reason_id, Some(3));
        assert_eq!(current.complete_cancellation_date, Some(t(11)));
    }

    #[tokio::test]
    async fn test_refund_request_then_complete_keeps_reason() {
        let mut store = store_with(&[(9, OrderStatus::Delivered)]);
        let batch = TransitionBatch::request_refund(
            &[9],
            &[4],
            &[Some("wrong size".into())],
            &[Decimal::new(32000, 0)],
        )
        .unwrap();
        execute(&mut store, &batch, t(10)).await.unwrap();

        let requested = store.open_row(9).unwrap();
        assert_eq!(requested.order_status_id, OrderStatus::RefundRequested);
        assert_eq!(requested.refund_request_date, Some(t(10)));
        assert_eq!(requested.refund_complete_date, None);

        let batch = TransitionBatch::complete_refund(&[9]).unwrap();
        execute(&mut store, &batch, t(12)).await.unwrap();

        let done = store.open_row(9).unwrap();
        assert_eq!(done.order_status_id, OrderStatus::RefundComplete);
        assert_eq!(done.refund_complete_date, Some(t(12)));
        assert_eq!(done.refund_reason_id, Some(4));
        assert_eq!(done.refund_amount, Some(Decimal::new(32000, 0)));
        assert_eq!(done.detail_reason.as_deref(), Some("wrong size"));
    }

    #[tokio::test]
    async fn test_withdraw_refund_restores_previous_status() {
        let mut store = store_with(&[(12, OrderStatus::Shipping)]);
        let batch =
            TransitionBatch::request_refund(&[12], &[1], &[None], &[Decimal::new(9900, 0)])
                .unwrap();
        execute(&mut store, &batch, t(10)).await.unwrap();

        let batch = TransitionBatch::withdraw_refund(&[12]).unwrap();
        execute(&mut store, &batch, t(11)).await.unwrap();

        let current = store.open_row(12).unwrap();
        assert_eq!(current.order_status_id, OrderStatus::Shipping);
        assert_eq!(current.refund_request_date, None);
        assert_eq!(current.refund_reason_id, None);
        assert_eq!(current.refund_amount, None);
        assert_eq!(store.history(12).len(), 3);
    }

    #[tokio::test]
    async fn test_missing_line_fails_whole_batch_before_writing() {
        let mut store = store_with(&[(1, OrderStatus::Preparing), (3, OrderStatus::Preparing)]);
        let before = store.row_count();

        let batch = TransitionBatch::change_status(&[1, 2, 3], 3).unwrap();
        let err = execute(&mut store, &batch, t(10)).await.unwrap_err();
        assert!(matches!(err, HistoryError::LineNotFound(2)));

        assert_eq!(store.row_count(), before);
        assert_eq!(store.open_row(1).unwrap().order_status_id, OrderStatus::Preparing);
        assert_eq!(store.open_row(3).unwrap().order_status_id, OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn test_concurrent_transition_yields_one_conflict() {
        let mut store = store_with(&[(4821, OrderStatus::Preparing)]);

        // Both writers observe the same open interval.
        let first = TransitionBatch::change_status(&[4821], 3).unwrap();
        let second = TransitionBatch::cancel(&[4821], &[1]).unwrap();
        let plan_a = first.prepare(&mut store, t(10)).await.unwrap();
        let plan_b = second.prepare(&mut store, t(10)).await.unwrap();

        plan_a.apply(&mut store).await.unwrap();
        let err = plan_b.apply(&mut store).await.unwrap_err();
        assert!(matches!(err, HistoryError::Conflict(4821)));

        let history = store.history(4821);
        assert_eq!(history.iter().filter(|r| r.end_date == open_end()).count(), 1);
        assert_eq!(store.open_row(4821).unwrap().order_status_id, OrderStatus::Shipping);
    }

    #[tokio::test]
    async fn test_terminal_lines_reject_transitions() {
        let mut store = store_with(&[(7, OrderStatus::CancelComplete)]);
        let batch = TransitionBatch::change_status(&[7], 2).unwrap();
        let err = execute(&mut store, &batch, t(10)).await.unwrap_err();
        assert!(matches!(err, HistoryError::Terminal { line_id: 7, .. }));
    }

    #[tokio::test]
    async fn test_guards() {
        let mut store = store_with(&[(1, OrderStatus::Preparing)]);

        // same status
        let batch = TransitionBatch::change_status(&[1], 2).unwrap();
        assert!(matches!(
            execute(&mut store, &batch, t(10)).await,
            Err(HistoryError::InvalidTransition { .. })
        ));

        // terminal target through change_status
        let batch = TransitionBatch::change_status(&[1], 7).unwrap();
        assert!(matches!(
            execute(&mut store, &batch, t(10)).await,
            Err(HistoryError::InvalidTransition { .. })
        ));

        // refund request without reason or amount
        let batch = TransitionBatch::change_status(&[1], OrderStatus::RefundRequested.id()).unwrap();
        assert!(matches!(
            execute(&mut store, &batch, t(10)).await,
            Err(HistoryError::InvalidTransition { .. })
        ));

        // refund completion without a request
        let batch = TransitionBatch::complete_refund(&[1]).unwrap();
        assert!(matches!(
            execute(&mut store, &batch, t(10)).await,
            Err(HistoryError::InvalidTransition { .. })
        ));

        // withdraw without a request
        let batch = TransitionBatch::withdraw_refund(&[1]).unwrap();
        assert!(matches!(
            execute(&mut store, &batch, t(10)).await,
            Err(HistoryError::InvalidTransition { .. })
        ));

        assert_eq!(store.history(1).len(), 1);
    }

    #[tokio::test]
    async fn test_clock_behind_prior_start_keeps_intervals_ordered() {
        let mut store = store_with(&[(1, OrderStatus::Preparing)]);
        let batch = TransitionBatch::change_status(&[1], 3).unwrap();
        // now is earlier than the open interval's start
        let result = execute(&mut store, &batch, t(6)).await.unwrap();
        assert_eq!(result.valid_from, t(8));

        let history = store.history(1);
        assert_eq!(history[0].end_date, t(8));
        assert_eq!(history[1].start_date, t(8));
    }

    #[test]
    fn test_batch_validation() {
        assert!(matches!(
            TransitionBatch::complete_refund(&[]),
            Err(HistoryError::BatchEmpty)
        ));
        assert!(matches!(
            TransitionBatch::cancel(&[1, 2], &[1]),
            Err(HistoryError::BatchLengthMismatch {
                field: "cancel_reason_ids",
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            TransitionBatch::request_refund(&[1], &[1], &[], &[Decimal::ONE]),
            Err(HistoryError::BatchLengthMismatch {
                field: "refund_detail_reasons",
                ..
            })
        ));
        assert!(matches!(
            TransitionBatch::change_status(&[1, 1], 3),
            Err(HistoryError::DuplicateLine(1))
        ));
        assert!(matches!(
            TransitionBatch::change_status(&[1], 9),
            Err(HistoryError::InvalidStatus(9))
        ));
    }
}
