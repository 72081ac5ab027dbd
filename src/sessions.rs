use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use eye_gesture_core::{
    DetectorConfig, Event, EventSink, EyeGestureSession, LandmarkSet, SessionStatus, Timestamp,
};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::response::AppError;

/// Rolling one-second frame counter.
#[derive(Debug, Default)]
struct FrameRate {
    recent: VecDeque<Instant>,
}

impl FrameRate {
    const WINDOW: Duration = Duration::from_secs(1);

    fn tick(&mut self, now: Instant) {
        self.recent.push_back(now);
        while let Some(front) = self.recent.front() {
            if now.duration_since(*front) > Self::WINDOW {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }

    fn fps(&self) -> f64 {
        self.recent.len() as f64
    }

    fn clear(&mut self) {
        self.recent.clear();
    }
}

#[derive(Debug)]
struct SessionHandle {
    detector: EyeGestureSession,
    /// 会话单调时钟起点，事件时间戳均相对于此
    origin: Instant,
    last_active: Instant,
    frame_rate: FrameRate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub fps: f64,
    pub config: DetectorConfig,
    #[serde(flatten)]
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutcome {
    pub events: Vec<Event>,
    pub status: SessionView,
}

/// Collects events for the HTTP reply while fanning them out to SSE subscribers.
struct BroadcastSink<'a> {
    tx: &'a broadcast::Sender<Event>,
    events: Vec<Event>,
}

impl EventSink for BroadcastSink<'_> {
    fn emit(&mut self, event: Event) {
        // 没有订阅者时 send 返回 Err，属于正常情况
        let _ = self.tx.send(event);
        self.events.push(event);
    }
}

#[derive(Debug)]
pub struct SessionEntry {
    id: String,
    created_at: DateTime<Utc>,
    inner: Mutex<SessionHandle>,
    events_tx: broadcast::Sender<Event>,
}

impl SessionEntry {
    fn new(id: String, detector: EyeGestureSession, channel_capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(channel_capacity.max(1));
        let now = Instant::now();
        Self {
            id,
            created_at: Utc::now(),
            inner: Mutex::new(SessionHandle {
                detector,
                origin: now,
                last_active: now,
                frame_rate: FrameRate::default(),
            }),
            events_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events_tx.subscribe()
    }

    fn view(&self, handle: &SessionHandle) -> SessionView {
        SessionView {
            id: self.id.clone(),
            created_at: self.created_at,
            fps: handle.frame_rate.fps(),
            config: *handle.detector.config(),
            status: handle.detector.status(),
        }
    }

    /// Run one frame through the detector. The per-session lock serializes
    /// concurrent requests, so frames are applied strictly one at a time.
    pub async fn process_frame(
        &self,
        landmarks: Option<LandmarkSet>,
    ) -> Result<FrameOutcome, AppError> {
        let mut handle = self.inner.lock().await;

        if let Some(set) = &landmarks {
            // 拒绝的帧不触碰会话状态
            handle.detector.check_frame(set)?;
        }

        let now = Instant::now();
        handle.last_active = now;
        handle.frame_rate.tick(now);
        let ts = Timestamp::from_duration(now.duration_since(handle.origin));

        let mut sink = BroadcastSink {
            tx: &self.events_tx,
            events: Vec::new(),
        };
        handle
            .detector
            .process_into(landmarks.as_ref(), ts, &mut sink);

        for event in &sink.events {
            tracing::debug!(session_id = %self.id, event = event.name(), "detector event");
        }

        Ok(FrameOutcome {
            events: sink.events,
            status: self.view(&handle),
        })
    }

    pub async fn status(&self) -> SessionView {
        let handle = self.inner.lock().await;
        self.view(&handle)
    }

    pub async fn reset(&self) -> SessionView {
        let mut handle = self.inner.lock().await;
        handle.detector.reset();
        handle.frame_rate.clear();
        handle.last_active = Instant::now();
        tracing::info!(session_id = %self.id, "Session reset, recalibrating");
        self.view(&handle)
    }

    async fn idle_for(&self, now: Instant) -> Duration {
        let handle = self.inner.lock().await;
        now.saturating_duration_since(handle.last_active)
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionEntry>>>,
    defaults: DetectorConfig,
    max_sessions: usize,
    channel_capacity: usize,
}

impl SessionRegistry {
    pub fn new(defaults: DetectorConfig, max_sessions: usize, channel_capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            defaults,
            max_sessions,
            channel_capacity,
        }
    }

    pub fn defaults(&self) -> &DetectorConfig {
        &self.defaults
    }

    pub async fn create(
        &self,
        config: Option<DetectorConfig>,
    ) -> Result<Arc<SessionEntry>, AppError> {
        let config = config.unwrap_or(self.defaults);
        let detector = EyeGestureSession::new(config)?;

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(AppError::too_many_requests("Too many active sessions"));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let entry = Arc::new(SessionEntry::new(
            id.clone(),
            detector,
            self.channel_capacity,
        ));
        sessions.insert(id.clone(), entry.clone());
        tracing::info!(session_id = %id, active = sessions.len(), "Session created");
        Ok(entry)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<SessionEntry>, AppError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::session_not_found(id))
    }

    /// Dropping the entry drops its broadcast sender, which ends every open
    /// event stream for the session.
    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(_) => {
                tracing::info!(session_id = %id, "Session removed");
                Ok(())
            }
            None => Err(AppError::session_not_found(id)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove sessions that have seen no frame or reset for longer than `max_idle`.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let candidates = self.idle_candidates(max_idle).await;
        if candidates.is_empty() {
            return 0;
        }
        self.evict_idle(&candidates, max_idle).await
    }

    async fn idle_candidates(&self, max_idle: Duration) -> Vec<String> {
        let snapshot: Vec<Arc<SessionEntry>> =
            self.sessions.read().await.values().cloned().collect();

        let now = Instant::now();
        let mut stale = Vec::new();
        for entry in snapshot {
            if entry.idle_for(now).await > max_idle {
                stale.push(entry.id.clone());
            }
        }
        stale
    }

    /// 持写锁再确认一次空闲时长，快照之后收到帧的会话保留
    async fn evict_idle(&self, candidates: &[String], max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let mut removed = 0;
        for id in candidates {
            let still_idle = match sessions.get(id) {
                Some(entry) => entry.idle_for(now).await > max_idle,
                None => false,
            };
            if still_idle {
                sessions.remove(id);
                removed += 1;
            }
        }
        removed
    }
}
