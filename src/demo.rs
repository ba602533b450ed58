//! Dummy clients and message history for running the terminal client
//! without a real gateway or snapshot.

use chrono::{DateTime, Duration, Utc};

use crate::directory::{ClientDirectory, ClientProfile};
use crate::error::Result;
use crate::message::{Channel, DeliveryStatus, Message};
use crate::store::MessageStore;

struct Seed {
    client: &'static str,
    minutes_ago: i64,
    from_coach: bool,
    channel: Option<Channel>,
    text: &'static str,
}

const CLIENTS: &[(&str, &str, &str)] = &[
    ("client-sarah", "Sarah Johnson", "Premium"),
    ("client-mike", "Mike Chen", "Standard"),
    ("client-emma", "Emma Davis", "Premium"),
    ("client-james", "James Wilson", "Starter"),
    ("client-olivia", "Olivia Brown", "Standard"),
];

const HISTORY: &[Seed] = &[
    Seed { client: "client-sarah", minutes_ago: 300, from_coach: true, channel: Some(Channel::Whatsapp), text: "Morning Sarah! Today is heavy squat day, remember to warm up properly." },
    Seed { client: "client-sarah", minutes_ago: 12, from_coach: false, channel: Some(Channel::Whatsapp), text: "Just hit a new PR on squats, 100kg!" },
    Seed { client: "client-mike", minutes_ago: 1500, from_coach: false, channel: Some(Channel::Telegram), text: "Can we move Friday's session?" },
    Seed { client: "client-mike", minutes_ago: 1440, from_coach: true, channel: Some(Channel::Telegram), text: "Sure, Saturday 10am works." },
    Seed { client: "client-mike", minutes_ago: 45, from_coach: false, channel: Some(Channel::Telegram), text: "My shoulder still hurts after bench day" },
    Seed { client: "client-emma", minutes_ago: 2880, from_coach: true, channel: Some(Channel::Email), text: "Here's your new 4-week block. Let me know what you think." },
    Seed { client: "client-emma", minutes_ago: 200, from_coach: false, channel: Some(Channel::Email), text: "Sorry, I missed two workouts this week" },
    Seed { client: "client-james", minutes_ago: 4000, from_coach: false, channel: None, text: "Signed up through the website" },
    Seed { client: "client-james", minutes_ago: 3900, from_coach: true, channel: Some(Channel::Instagram), text: "Welcome James! Excited to work with you." },
    Seed { client: "client-olivia", minutes_ago: 90, from_coach: false, channel: Some(Channel::Instagram), text: "Loved today's workout!" },
    Seed { client: "client-olivia", minutes_ago: 80, from_coach: true, channel: Some(Channel::Instagram), text: "Great to hear, keep it up!" },
];

/// Directory and message log for demo mode, timestamped relative to `now`.
/// Older coach messages come pre-acknowledged so every receipt mark shows up.
pub fn seed(now: DateTime<Utc>) -> Result<(MessageStore, ClientDirectory)> {
    let directory: ClientDirectory = CLIENTS
        .iter()
        .map(|&(id, name, plan)| {
            (id, ClientProfile { name: name.to_string(), plan: Some(plan.to_string()) })
        })
        .collect();

    let mut store = MessageStore::new();
    for seed in HISTORY {
        let at = now - Duration::minutes(seed.minutes_ago);
        let msg = if seed.from_coach {
            let channel = seed.channel.unwrap_or(Channel::Telegram);
            Message::outbound(seed.client, seed.text, channel, at)?.on_channel(seed.channel)
        } else {
            Message::inbound(seed.client, seed.text, seed.channel, at)?
        };
        let id = msg.id();
        store.append(msg);
        if seed.from_coach {
            let status = if seed.minutes_ago > 1000 {
                DeliveryStatus::Read
            } else {
                DeliveryStatus::Delivered
            };
            store.apply_status(id, status)?;
        }
    }

    // Older conversations have been looked at already.
    for &(id, _, _) in CLIENTS {
        let stale = store
            .latest_timestamp(id)
            .is_some_and(|ts| now - ts > Duration::minutes(1000));
        if stale {
            store.mark_read(id);
        }
    }

    Ok((store, directory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::index;
    use crate::templates::{suggest_for, TemplateCategory};

    #[test]
    fn seed_covers_every_template_and_channel() {
        let (store, directory) = seed(Utc::now()).unwrap();
        let convs = index(store.messages());
        assert_eq!(convs.len(), CLIENTS.len());
        assert_eq!(directory.len(), CLIENTS.len());

        let categories: Vec<_> = convs.iter().filter_map(suggest_for).map(|t| t.category).collect();
        assert!(categories.contains(&TemplateCategory::PersonalRecord));
        assert!(categories.contains(&TemplateCategory::Pain));
        assert!(categories.contains(&TemplateCategory::Consistency));

        for channel in Channel::ALL {
            assert!(convs.iter().any(|c| c.active_channel == channel), "{channel} unused");
        }
    }

    #[test]
    fn seed_order_and_unread() {
        let (store, _) = seed(Utc::now()).unwrap();
        let convs = index(store.messages());
        let order: Vec<&str> = convs.iter().map(|c| c.client_id.as_str()).collect();
        assert_eq!(
            order,
            ["client-sarah", "client-mike", "client-olivia", "client-emma", "client-james"]
        );
        let james = convs.iter().find(|c| c.client_id == "client-james").unwrap();
        assert_eq!(james.unread_count, 0);
        // James never wrote on a channel, so the coach's Instagram reply decides.
        assert_eq!(james.active_channel, Channel::Instagram);
    }
}
