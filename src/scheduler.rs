use crate::content::ContentType;
use crate::db::GuildSettings;
use crate::delivery::DeliverySink;
use crate::error::PipelineError;
use crate::services::acquisition::AcquisitionService;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A daily delivery of one content type to one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub guild_id: String,
    pub channel_id: String,
    pub kind: ContentType,
    pub hour: u8,
}

/// The triggers a guild's settings call for. Content types without a
/// configured channel get none.
pub fn triggers_for(settings: &GuildSettings) -> Vec<Trigger> {
    let planned = [
        (
            ContentType::Quote,
            &settings.quote_channel_id,
            settings.quote_hour,
        ),
        (
            ContentType::Question,
            &settings.question_channel_id,
            settings.question_hour,
        ),
    ];

    planned
        .into_iter()
        .filter_map(|(kind, channel, hour)| {
            channel.as_ref().map(|channel_id| Trigger {
                guild_id: settings.guild_id.clone(),
                channel_id: channel_id.clone(),
                kind,
                hour,
            })
        })
        .collect()
}

/// Next `hour:00:00` UTC strictly after `now`.
pub fn next_fire(now: DateTime<Utc>, hour: u8) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(u32::from(hour.min(23)), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Resolves, acquires and sends for a single trigger.
struct Dispatcher {
    acquisition: Arc<AcquisitionService>,
    sink: Arc<dyn DeliverySink>,
}

impl Dispatcher {
    async fn fire(&self, trigger: &Trigger) -> Result<(), PipelineError> {
        // Resolve first so a dead channel never burns the day's record
        let channel = self
            .sink
            .resolve_channel(&trigger.guild_id, &trigger.channel_id)
            .await?;

        let item = self
            .acquisition
            .acquire(&trigger.guild_id, trigger.kind)
            .await?;

        self.sink.send(&channel, &item).await?;

        info!(
            "Scheduler: delivered daily {} to #{} in guild {}",
            trigger.kind, channel.name, trigger.guild_id
        );
        Ok(())
    }

    async fn run(self: Arc<Self>, trigger: Trigger) {
        loop {
            let now = Utc::now();
            let at = next_fire(now, trigger.hour);
            debug!(
                "Scheduler: next {} for guild {} at {}",
                trigger.kind, trigger.guild_id, at
            );
            tokio::time::sleep((at - now).to_std().unwrap_or_default()).await;

            self.clone().fire_detached(trigger.clone()).await;
        }
    }

    /// Fires on a task of its own. Aborting the timer that awaits it leaves
    /// the delivery running to completion.
    async fn fire_detached(self: Arc<Self>, trigger: Trigger) {
        let fired = tokio::spawn(async move {
            match self.fire(&trigger).await {
                Ok(()) => {}
                Err(e @ PipelineError::ChannelResolution { .. }) => {
                    warn!("Scheduler: skipping {}: {}", trigger.kind, e);
                }
                Err(e) => {
                    error!(
                        "Scheduler: daily {} for guild {} failed: {}",
                        trigger.kind, trigger.guild_id, e
                    );
                }
            }
        });
        if let Err(e) = fired.await {
            error!("Scheduler: delivery task ended abnormally: {}", e);
        }
    }
}

struct ActiveTrigger {
    trigger: Trigger,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SchedulerState {
    guilds: HashMap<String, Vec<ActiveTrigger>>,
}

impl SchedulerState {
    fn remove(&mut self, guild_id: &str) -> bool {
        match self.guilds.remove(guild_id) {
            Some(previous) => {
                abort_all(previous);
                true
            }
            None => false,
        }
    }
}

fn abort_all(triggers: Vec<ActiveTrigger>) {
    for active in triggers {
        active.handle.abort();
    }
}

/// Owns one timer task per registered trigger.
pub struct Scheduler {
    dispatcher: Arc<Dispatcher>,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    pub fn new(acquisition: Arc<AcquisitionService>, sink: Arc<dyn DeliverySink>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher { acquisition, sink }),
            state: Mutex::new(SchedulerState::default()),
        }
    }

    /// Registers every configured guild.
    pub fn start(&self, all: &[GuildSettings]) {
        let total: usize = all.iter().map(|settings| self.register(settings)).sum();
        info!(
            "Scheduler: registered {} trigger(s) across {} guild(s)",
            total,
            all.len()
        );
    }

    /// Replaces the guild's triggers with the ones `settings` calls for.
    /// Unchanged triggers keep their running task. Returns how many are now active.
    pub fn register(&self, settings: &GuildSettings) -> usize {
        let mut state = self.state.lock().unwrap();
        let mut previous = state
            .guilds
            .remove(&settings.guild_id)
            .unwrap_or_default();

        let active: Vec<ActiveTrigger> = triggers_for(settings)
            .into_iter()
            .map(|trigger| match previous.iter().position(|a| a.trigger == trigger) {
                Some(index) => previous.swap_remove(index),
                None => ActiveTrigger {
                    handle: tokio::spawn(self.dispatcher.clone().run(trigger.clone())),
                    trigger,
                },
            })
            .collect();
        let count = active.len();

        if !active.is_empty() {
            state.guilds.insert(settings.guild_id.clone(), active);
        }
        drop(state);
        abort_all(previous);

        debug!(
            "Scheduler: guild {} now has {} trigger(s)",
            settings.guild_id, count
        );
        count
    }

    pub fn unregister(&self, guild_id: &str) -> bool {
        let removed = self.state.lock().unwrap().remove(guild_id);
        if removed {
            info!("Scheduler: unregistered guild {}", guild_id);
        }
        removed
    }

    pub fn registered(&self, guild_id: &str) -> Vec<Trigger> {
        self.state
            .lock()
            .unwrap()
            .guilds
            .get(guild_id)
            .map(|active| active.iter().map(|a| a.trigger.clone()).collect())
            .unwrap_or_default()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            for active in state.guilds.values().flatten() {
                active.handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItem, Quote};
    use crate::db::Database;
    use crate::delivery::ChannelHandle;
    use crate::providers::ContentSource;
    use crate::services::acquisition::DEFAULT_MAX_ATTEMPTS;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct FixedSource(&'static str);

    #[async_trait]
    impl ContentSource for FixedSource {
        async fn next_item(&self, _kind: ContentType) -> ContentItem {
            ContentItem::Quote(Quote {
                text: self.0.to_string(),
                author: "Author".to_string(),
                source: "Fixed".to_string(),
            })
        }
    }

    /// Records sends; channel "404" never resolves.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(ChannelHandle, ContentItem)>>,
        send_delay: Duration,
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn resolve_channel(
            &self,
            guild_id: &str,
            channel_id: &str,
        ) -> Result<ChannelHandle, PipelineError> {
            if channel_id == "404" {
                return Err(PipelineError::ChannelResolution {
                    guild_id: guild_id.to_string(),
                    channel_id: channel_id.to_string(),
                    reason: "unknown channel".to_string(),
                });
            }
            Ok(ChannelHandle {
                guild_id: guild_id.to_string(),
                channel_id: channel_id.parse().unwrap(),
                name: "daily".to_string(),
            })
        }

        async fn send(
            &self,
            channel: &ChannelHandle,
            item: &ContentItem,
        ) -> Result<(), PipelineError> {
            tokio::time::sleep(self.send_delay).await;
            self.sent
                .lock()
                .unwrap()
                .push((channel.clone(), item.clone()));
            Ok(())
        }
    }

    fn setup(text: &'static str) -> (Database, Arc<RecordingSink>, Scheduler) {
        setup_with_delay(text, Duration::ZERO)
    }

    fn setup_with_delay(
        text: &'static str,
        send_delay: Duration,
    ) -> (Database, Arc<RecordingSink>, Scheduler) {
        let db = Database::open(":memory:").unwrap();
        db.execute_init().unwrap();
        let acquisition = Arc::new(AcquisitionService::new(
            db.clone(),
            Arc::new(FixedSource(text)),
            DEFAULT_MAX_ATTEMPTS,
        ));
        let sink = Arc::new(RecordingSink {
            send_delay,
            ..Default::default()
        });
        let scheduler = Scheduler::new(acquisition, sink.clone());
        (db, sink, scheduler)
    }

    fn settings(quote_channel: Option<&str>, question_channel: Option<&str>) -> GuildSettings {
        GuildSettings {
            guild_id: "g1".to_string(),
            quote_channel_id: quote_channel.map(str::to_string),
            quote_hour: 9,
            question_channel_id: question_channel.map(str::to_string),
            question_hour: 10,
        }
    }

    fn trigger(channel_id: &str) -> Trigger {
        Trigger {
            guild_id: "g1".to_string(),
            channel_id: channel_id.to_string(),
            kind: ContentType::Quote,
            hour: 9,
        }
    }

    /// Sets a flag when its task is aborted and the future dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn idle_task() -> (JoinHandle<()>, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(dropped.clone());
        let handle = tokio::spawn(async move {
            let _flag = flag;
            std::future::pending::<()>().await;
        });
        (handle, dropped)
    }

    fn install(scheduler: &Scheduler, trigger: Trigger, handle: JoinHandle<()>) {
        scheduler
            .state
            .lock()
            .unwrap()
            .guilds
            .entry(trigger.guild_id.clone())
            .or_default()
            .push(ActiveTrigger { trigger, handle });
    }

    #[test]
    fn test_next_fire_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 8, 59, 59).unwrap();
        assert_eq!(
            next_fire(now, 9),
            Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_fire_at_hour_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        assert_eq!(
            next_fire(now, 9),
            Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_fire_crosses_month_end() {
        let now = Utc.with_ymd_and_hms(2026, 4, 30, 23, 30, 0).unwrap();
        assert_eq!(
            next_fire(now, 0),
            Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_triggers_skip_unset_channels() {
        let triggers = triggers_for(&settings(Some("111"), None));
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].kind, ContentType::Quote);
        assert_eq!(triggers[0].channel_id, "111");
        assert_eq!(triggers[0].hour, 9);

        assert!(triggers_for(&settings(None, None)).is_empty());
    }

    #[tokio::test]
    async fn test_register_replaces_previous_triggers() {
        let (_db, _sink, scheduler) = setup("q");

        assert_eq!(scheduler.register(&settings(Some("111"), Some("222"))), 2);

        let mut moved = settings(Some("111"), Some("222"));
        moved.quote_hour = 14;
        assert_eq!(scheduler.register(&moved), 2);

        let registered = scheduler.registered("g1");
        assert_eq!(registered.len(), 2);
        assert!(registered
            .iter()
            .any(|t| t.kind == ContentType::Quote && t.hour == 14));
        assert!(!registered.iter().any(|t| t.hour == 9));
    }

    #[tokio::test]
    async fn test_unregister_clears_guild() {
        let (_db, _sink, scheduler) = setup("q");
        scheduler.start(&[settings(Some("111"), None)]);

        assert!(scheduler.unregister("g1"));
        assert!(scheduler.registered("g1").is_empty());
        assert!(!scheduler.unregister("g1"));
    }

    #[tokio::test]
    async fn test_fire_sends_committed_item() {
        let (db, sink, scheduler) = setup("Stay hungry.");

        scheduler.dispatcher.fire(&trigger("111")).await.unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.channel_id, 111);
        let stored = db.last_sent("g1", ContentType::Quote).unwrap();
        assert_eq!(stored.as_ref(), Some(&sent[0].1));
    }

    #[tokio::test]
    async fn test_unresolvable_channel_skips_without_commit() {
        let (db, sink, scheduler) = setup("Stay hungry.");

        let result = scheduler.dispatcher.fire(&trigger("404")).await;

        assert!(matches!(
            result,
            Err(PipelineError::ChannelResolution { .. })
        ));
        assert!(sink.sent.lock().unwrap().is_empty());
        assert!(db.last_sent("g1", ContentType::Quote).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_content_means_nothing_sent() {
        let (_db, sink, scheduler) = setup("   ");

        let result = scheduler.dispatcher.fire(&trigger("111")).await;

        assert!(matches!(result, Err(PipelineError::NoContentAvailable)));
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_only_restarts_changed_triggers() {
        let (_db, _sink, scheduler) = setup("q");
        let configured = settings(Some("111"), Some("222"));
        let planned = triggers_for(&configured);

        let (quote_task, quote_dropped) = idle_task();
        let (question_task, question_dropped) = idle_task();
        install(&scheduler, planned[0].clone(), quote_task);
        install(&scheduler, planned[1].clone(), question_task);

        let mut moved = configured.clone();
        moved.question_hour = 15;
        assert_eq!(scheduler.register(&moved), 2);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!quote_dropped.load(Ordering::SeqCst), "unchanged quote task was restarted");
        assert!(question_dropped.load(Ordering::SeqCst), "stale question task still running");
        assert!(scheduler
            .registered("g1")
            .iter()
            .any(|t| t.kind == ContentType::Question && t.hour == 15));
    }

    #[tokio::test]
    async fn test_reload_does_not_cancel_delivery_in_flight() {
        let (db, sink, scheduler) = setup_with_delay("Stay hungry.", Duration::from_millis(200));
        let in_flight = trigger("111");
        let handle = tokio::spawn(scheduler.dispatcher.clone().fire_detached(in_flight.clone()));
        install(&scheduler, in_flight, handle);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Moving the quote hour aborts the task that is mid-send
        let mut moved = settings(Some("111"), None);
        moved.quote_hour = 14;
        scheduler.register(&moved);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(db.last_sent("g1", ContentType::Quote).unwrap().is_some());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }
}
