//! Notification scheduler.
//!
//! Expands occurrences into absolute notification instants. Instants at or
//! before "now" are never returned.

use cadence_core::constants::NOTIFICATION_ID_NAMESPACE;
use cadence_core::model::{NotificationConfig, NotificationTiming, Reminder, TimingKind};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use uuid::Uuid;

use crate::context::{EvalContext, Instant};
use crate::generator::{Occurrence, anchor_occurrence, generate, generate_before};

/// When to alert for one occurrence under one timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationInstant<'a> {
    /// Stable across recomputation; see [`notification_id`].
    pub id: Uuid,
    pub at: Instant,
    pub occurrence: Occurrence<'a>,
    pub timing: NotificationTiming,
}

/// ## Summary
/// Identifier for the notification of `reminder_id` under `timing` on the
/// occurrence dated `date`.
///
/// A UUIDv5 over those values, so recomputing a schedule yields the same ids
/// and delivery can deduplicate or cancel by id.
#[must_use]
pub fn notification_id(reminder_id: &str, timing: &NotificationTiming, date: NaiveDate) -> Uuid {
    let name = format!(
        "{reminder_id}:{}:{}:{}",
        timing.kind,
        timing.offset_minutes,
        date.format("%Y-%m-%d")
    );
    Uuid::new_v5(&NOTIFICATION_ID_NAMESPACE, name.as_bytes())
}

/// ## Summary
/// Notification instants for one occurrence, future only, sorted.
///
/// Sorted by instant, then timing kind, then offset. A disabled config yields
/// nothing.
#[must_use]
pub fn expand<'a>(
    occurrence: &Occurrence<'a>,
    config: &NotificationConfig,
    ctx: &EvalContext,
) -> Vec<NotificationInstant<'a>> {
    if !config.enabled {
        return Vec::new();
    }

    let mut instants: Vec<NotificationInstant<'a>> = config
        .timings
        .iter()
        .filter_map(|timing| {
            let at = occurrence.instant.checked_add_signed(timing.shift()?)?;
            (at.with_timezone(&Utc) > ctx.now).then(|| NotificationInstant {
                id: notification_id(&occurrence.reminder.id, timing, occurrence.date),
                at,
                occurrence: occurrence.clone(),
                timing: *timing,
            })
        })
        .collect();
    sort_instants(&mut instants);
    instants
}

fn sort_instants(instants: &mut [NotificationInstant<'_>]) {
    instants.sort_by(|a, b| {
        a.at.cmp(&b.at)
            .then(a.timing.kind.cmp(&b.timing.kind))
            .then(a.timing.offset_minutes.cmp(&b.timing.offset_minutes))
    });
}

/// ## Summary
/// Every future notification instant of `reminder` across the lookahead
/// window, sorted, at most `limit`.
///
/// Recurring reminders are expanded over the next
/// `lookahead_occurrences` occurrences from today. Occurrences on earlier
/// days are added separately, reaching back as far as the largest "after"
/// offset, so a late trigger of an occurrence that has already passed is
/// still found without crowding out upcoming ones.
#[tracing::instrument(skip(reminder, ctx), fields(reminder_id = %reminder.id))]
#[must_use]
pub fn upcoming_notifications<'a>(
    reminder: &'a Reminder,
    limit: usize,
    ctx: &EvalContext,
) -> Vec<NotificationInstant<'a>> {
    let Some(config) = reminder.notifications.as_ref().filter(|config| config.is_active()) else {
        return Vec::new();
    };

    let occurrences = if reminder.active_rule().is_some() {
        let reach = latest_after_offset(config);
        let mut occurrences = if reach > TimeDelta::zero() {
            let search_start = ctx
                .now
                .checked_sub_signed(reach)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            generate_before(reminder, search_start, ctx.today(), ctx)
        } else {
            Vec::new()
        };
        occurrences.extend(generate(reminder, ctx.limits.lookahead_occurrences, ctx));
        occurrences
    } else {
        anchor_occurrence(reminder, ctx).into_iter().collect()
    };

    let mut instants: Vec<NotificationInstant<'a>> = occurrences
        .iter()
        .flat_map(|occurrence| expand(occurrence, config, ctx))
        .collect();
    sort_instants(&mut instants);
    instants.truncate(limit);

    tracing::trace!(count = instants.len(), "computed upcoming notifications");
    instants
}

/// ## Summary
/// The earliest future notification instant of `reminder`, if any.
#[must_use]
pub fn next_notification<'a>(
    reminder: &'a Reminder,
    ctx: &EvalContext,
) -> Option<NotificationInstant<'a>> {
    upcoming_notifications(reminder, 1, ctx).into_iter().next()
}

/// Largest shift past an occurrence among the "after" timings.
fn latest_after_offset(config: &NotificationConfig) -> TimeDelta {
    config
        .timings
        .iter()
        .filter(|timing| timing.kind == TimingKind::After)
        .filter_map(NotificationTiming::shift)
        .max()
        .unwrap_or_default()
        .max(TimeDelta::zero())
}
