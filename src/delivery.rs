//! Delivery-status lifecycle for outbound messages.
//!
//! Statuses only ever move forward. Any jump up the lattice is accepted
//! (`Sent -> Read` without passing through `Delivered`); anything at or
//! below the current rank is ignored, which makes provider receipts safe
//! to replay or deliver out of order.

use crate::message::DeliveryStatus;

/// Returns the status to store if `target` moves `current` forward, or
/// `None` when applying it would be a no-op. An unset status ranks below
/// `Sending`.
pub fn advance(current: Option<DeliveryStatus>, target: DeliveryStatus) -> Option<DeliveryStatus> {
    match current {
        Some(cur) if target <= cur => None,
        _ => Some(target),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkShape {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkTone {
    Muted,
    Solid,
    Neutral,
    /// The accent colour of the message's channel.
    Accent,
}

/// How a consumer should draw the receipt indicator next to a coach message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMark {
    pub shape: MarkShape,
    pub tone: MarkTone,
}

pub fn status_mark(status: Option<DeliveryStatus>) -> StatusMark {
    let (shape, tone) = match status {
        None | Some(DeliveryStatus::Sending) => (MarkShape::Single, MarkTone::Muted),
        Some(DeliveryStatus::Sent) => (MarkShape::Single, MarkTone::Solid),
        Some(DeliveryStatus::Delivered) => (MarkShape::Double, MarkTone::Neutral),
        Some(DeliveryStatus::Read) => (MarkShape::Double, MarkTone::Accent),
    };
    StatusMark { shape, tone }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use crate::message::DeliveryStatus::*;

    #[rstest]
    #[case(None, Sending, Some(Sending))]
    #[case(None, Read, Some(Read))]
    #[case(Some(Sending), Sent, Some(Sent))]
    #[case(Some(Sent), Read, Some(Read))]
    #[case(Some(Sent), Sent, None)]
    #[case(Some(Delivered), Sent, None)]
    #[case(Some(Read), Delivered, None)]
    #[case(Some(Read), Read, None)]
    fn advance_only_moves_forward(
        #[case] current: Option<DeliveryStatus>,
        #[case] target: DeliveryStatus,
        #[case] expected: Option<DeliveryStatus>,
    ) {
        assert_eq!(advance(current, target), expected);
    }

    #[rstest]
    #[case(None, MarkShape::Single, MarkTone::Muted)]
    #[case(Some(Sending), MarkShape::Single, MarkTone::Muted)]
    #[case(Some(Sent), MarkShape::Single, MarkTone::Solid)]
    #[case(Some(Delivered), MarkShape::Double, MarkTone::Neutral)]
    #[case(Some(Read), MarkShape::Double, MarkTone::Accent)]
    fn marks_follow_rendering_contract(
        #[case] status: Option<DeliveryStatus>,
        #[case] shape: MarkShape,
        #[case] tone: MarkTone,
    ) {
        assert_eq!(status_mark(status), StatusMark { shape, tone });
    }

    fn any_status() -> impl Strategy<Value = DeliveryStatus> {
        prop_oneof![Just(Sending), Just(Sent), Just(Delivered), Just(Read)]
    }

    proptest! {
        /// Whatever order receipts arrive in, the realized status is the
        /// highest one ever applied.
        #[test]
        fn realized_status_is_max_applied(updates in prop::collection::vec(any_status(), 1..20)) {
            let mut current = None;
            for &target in &updates {
                let before = current;
                match advance(current, target) {
                    Some(next) => {
                        prop_assert!(before.map_or(true, |b| next > b));
                        current = Some(next);
                    }
                    None => prop_assert!(before.is_some_and(|b| target <= b)),
                }
            }
            prop_assert_eq!(current, updates.iter().copied().max());
        }
    }
}
