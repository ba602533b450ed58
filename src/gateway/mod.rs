//! Boundary with the services that actually move messages over Telegram,
//! WhatsApp, email and Instagram. The engine only sees the events and
//! commands defined in [`types`]; [`loopback`] is an in-process stand-in
//! used by the terminal client.

pub mod loopback;
pub mod types;
