//! Synchronous in-process event bus
//!
//! Every component publishes and observes through this bus rather than
//! holding direct references to each other. Dispatch is synchronous and in
//! registration order; a handler that returns an error is logged and skipped,
//! never allowed to abort the rest of the chain. Emits that happen inside a
//! handler are queued and drained after the current dispatch finishes, so
//! delivery order stays well defined.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::settings::SettingValue;

/// Where a change came from. Carried on every change event so observers can
/// tell a user edit apart from a palette, template, or server-driven update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Palette,
    Template,
    Server,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Origin::User => "user",
            Origin::Palette => "palette",
            Origin::Template => "template",
            Origin::Server => "server",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    SettingChanged,
    BundleApplied,
    BundleRejected,
    ValidationWarning,
    SettingsLoaded,
    SettingsSaved,
    SettingsSaveFailed,
    SettingsReset,
    PaletteApplyStarted,
    PaletteApplied,
    PaletteApplyFailed,
    PaletteSaveStarted,
    PaletteSaved,
    PaletteSaveFailed,
    PaletteDeleteStarted,
    PaletteDeleted,
    PaletteDeleteFailed,
    TemplateApplyStarted,
    TemplateApplied,
    TemplateApplyFailed,
    TemplateSaveStarted,
    TemplateSaved,
    TemplateSaveFailed,
    TemplateDeleteStarted,
    TemplateDeleted,
    TemplateDeleteFailed,
    PreviewEnabled,
    PreviewDisabled,
    PreviewUpdated,
}

/// A single setting transition
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub key: String,
    pub old: Option<SettingValue>,
    pub new: SettingValue,
    pub origin: Origin,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Change(ChangeEvent),
    Bundle { origin: Origin, keys: Vec<String> },
    Warning { key: String, message: String },
    Operation { id: String },
    Failure { id: String, message: String },
    Saved { saved_at: DateTime<Utc> },
}

pub type Handler = Box<dyn FnMut(&Payload) -> anyhow::Result<()>>;

/// Handle returned by `subscribe`; carries the topic so cancellation needs
/// nothing but the token itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToken {
    topic: Topic,
    id: u64,
}

struct Subscriber {
    token: SubscriptionToken,
    handler: Rc<RefCell<Handler>>,
}

#[derive(Default)]
struct BusInner {
    subscribers: HashMap<Topic, Vec<Subscriber>>,
    next_token: u64,
    dispatching: bool,
    queued: VecDeque<(Topic, Payload)>,
}

/// Shared via `Rc<EventBus>`; interior mutability keeps subscribe/emit
/// callable from handlers without a mutable bus reference.
#[derive(Default)]
pub struct EventBus {
    inner: RefCell<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionToken
    where
        F: FnMut(&Payload) -> anyhow::Result<()> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_token += 1;
        let token = SubscriptionToken {
            topic,
            id: inner.next_token,
        };
        inner.subscribers.entry(topic).or_default().push(Subscriber {
            token,
            handler: Rc::new(RefCell::new(Box::new(handler))),
        });
        token
    }

    /// Remove a subscription. Unknown or already-removed tokens are a no-op.
    pub fn unsubscribe(&self, token: SubscriptionToken) {
        let mut inner = self.inner.borrow_mut();
        if let Some(list) = inner.subscribers.get_mut(&token.topic) {
            list.retain(|s| s.token != token);
        }
    }

    /// Deliver `payload` to every subscriber of `topic`, in subscription
    /// order. Re-entrant emits from inside a handler are queued and drained
    /// once the outer dispatch completes.
    pub fn emit(&self, topic: Topic, payload: Payload) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.dispatching {
                inner.queued.push_back((topic, payload));
                return;
            }
            inner.dispatching = true;
        }

        self.dispatch(topic, &payload);

        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                match inner.queued.pop_front() {
                    Some(pair) => pair,
                    None => {
                        inner.dispatching = false;
                        break;
                    }
                }
            };
            self.dispatch(next.0, &next.1);
        }
    }

    fn dispatch(&self, topic: Topic, payload: &Payload) {
        // Snapshot the list under a short borrow so handlers may subscribe or
        // unsubscribe while we are calling them.
        let subscribers: Vec<(SubscriptionToken, Rc<RefCell<Handler>>)> = {
            let inner = self.inner.borrow();
            match inner.subscribers.get(&topic) {
                Some(list) => list
                    .iter()
                    .map(|s| (s.token, Rc::clone(&s.handler)))
                    .collect(),
                None => return,
            }
        };

        debug!(topic = ?topic, subscribers = subscribers.len(), "dispatching event");

        for (token, handler) in subscribers {
            // A handler removed mid-dispatch must not be called.
            let still_live = {
                let inner = self.inner.borrow();
                inner
                    .subscribers
                    .get(&topic)
                    .is_some_and(|list| list.iter().any(|s| s.token == token))
            };
            if !still_live {
                continue;
            }
            if let Err(err) = (handler.borrow_mut())(payload) {
                error!(topic = ?topic, error = %err, "event handler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_in_subscription_order() {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        for i in 0..4 {
            let seen = Rc::clone(&seen);
            bus.subscribe(Topic::SettingsSaved, move |_| {
                seen.borrow_mut().push(i);
                Ok(())
            });
        }
        bus.emit(Topic::SettingsSaved, Payload::None);
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_handler_error_does_not_stop_chain() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0));
        bus.subscribe(Topic::SettingsSaved, |_| anyhow::bail!("boom"));
        {
            let seen = Rc::clone(&seen);
            bus.subscribe(Topic::SettingsSaved, move |_| {
                *seen.borrow_mut() += 1;
                Ok(())
            });
        }
        bus.emit(Topic::SettingsSaved, Payload::None);
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0));
        let token = {
            let seen = Rc::clone(&seen);
            bus.subscribe(Topic::SettingsSaved, move |_| {
                *seen.borrow_mut() += 1;
                Ok(())
            })
        };
        bus.unsubscribe(token);
        bus.unsubscribe(token);
        bus.emit(Topic::SettingsSaved, Payload::None);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_handler_removed_mid_dispatch_is_skipped() {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let victim = Rc::new(RefCell::new(None::<SubscriptionToken>));

        {
            let bus_inner = Rc::clone(&bus);
            let victim = Rc::clone(&victim);
            let seen = Rc::clone(&seen);
            bus.subscribe(Topic::SettingsSaved, move |_| {
                seen.borrow_mut().push("first");
                if let Some(token) = victim.borrow_mut().take() {
                    bus_inner.unsubscribe(token);
                }
                Ok(())
            });
        }
        let token = {
            let seen = Rc::clone(&seen);
            bus.subscribe(Topic::SettingsSaved, move |_| {
                seen.borrow_mut().push("second");
                Ok(())
            })
        };
        *victim.borrow_mut() = Some(token);

        bus.emit(Topic::SettingsSaved, Payload::None);
        assert_eq!(*seen.borrow(), vec!["first"]);
    }

    #[test]
    fn test_reentrant_emit_is_queued() {
        let bus = Rc::new(EventBus::new());
        let order = Rc::new(RefCell::new(Vec::new()));

        {
            let bus_inner = Rc::clone(&bus);
            let order = Rc::clone(&order);
            bus.subscribe(Topic::SettingsSaved, move |_| {
                order.borrow_mut().push("outer-a");
                bus_inner.emit(Topic::PreviewUpdated, Payload::None);
                Ok(())
            });
        }
        {
            let order = Rc::clone(&order);
            bus.subscribe(Topic::SettingsSaved, move |_| {
                order.borrow_mut().push("outer-b");
                Ok(())
            });
        }
        {
            let order = Rc::clone(&order);
            bus.subscribe(Topic::PreviewUpdated, move |_| {
                order.borrow_mut().push("inner");
                Ok(())
            });
        }

        bus.emit(Topic::SettingsSaved, Payload::None);
        // Inner emit drains only after the outer chain completes
        assert_eq!(*order.borrow(), vec!["outer-a", "outer-b", "inner"]);
    }
}
