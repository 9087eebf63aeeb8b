//! SQL review advice aggregation.

use crate::backend::{Advice, AdviceStatus};
use crate::notify::NotificationStyle;

/// Computes the worst severity across a batch of advices.
///
/// Starts at `Success`; any non-success finding raises it to `Warning`, and
/// an `Error` finding wins regardless of order.
pub fn aggregate_status(advices: &[Advice]) -> AdviceStatus {
    let mut aggregate = AdviceStatus::Success;
    for advice in advices {
        match advice.status {
            AdviceStatus::Success => {}
            AdviceStatus::Error => aggregate = AdviceStatus::Error,
            AdviceStatus::Warning | AdviceStatus::StatusUnspecified => {
                if aggregate != AdviceStatus::Error {
                    aggregate = AdviceStatus::Warning;
                }
            }
        }
    }
    aggregate
}

/// Builds the review notification for a batch of advices.
///
/// Returns `None` when every advice passed. The message holds one
/// `LABEL: title` line per finding, followed by its content if any.
pub fn review_message(advices: &[Advice]) -> Option<(NotificationStyle, String)> {
    let style = match aggregate_status(advices) {
        AdviceStatus::Success => return None,
        AdviceStatus::Error => NotificationStyle::Critical,
        _ => NotificationStyle::Warn,
    };

    let mut message = String::new();
    for advice in advices.iter().filter(|a| a.status != AdviceStatus::Success) {
        message.push_str(&format!("{}: {}\n", advice.status, advice.title));
        if !advice.content.is_empty() {
            message.push_str(&advice.content);
            message.push('\n');
        }
    }

    Some((style, message))
}
