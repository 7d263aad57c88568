use super::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct BroadcastReport {
    pub(super) delivered: usize,
    pub(super) failed: usize,
}

impl BroadcastReport {
    pub(super) fn summary(&self) -> String {
        format!(
            "📢 Broadcast finished: {} delivered, {} failed.",
            self.delivered, self.failed
        )
    }
}

/// Sends `text` once to every known user outside `exclude`.
///
/// Sequential and best-effort: a failed recipient is logged and counted, never retried,
/// and never stops the loop.
pub(super) async fn broadcast<G: Gateway + ?Sized>(
    gateway: &G,
    known_users: &BTreeSet<i64>,
    exclude: &BTreeSet<i64>,
    text: &str,
) -> BroadcastReport {
    let message = Surface::text(text, InlineKeyboardMarkup::default());
    let mut report = BroadcastReport::default();
    for user_id in known_users.difference(exclude) {
        match gateway.send(ChatId(*user_id), &message).await {
            Ok(_) => report.delivered += 1,
            Err(err) => {
                warn!("broadcast to {} failed: {:#}", user_id, err);
                report.failed += 1;
            }
        }
    }
    info!(
        "broadcast done: {} delivered, {} failed",
        report.delivered, report.failed
    );
    report
}
