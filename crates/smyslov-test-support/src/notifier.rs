//! Test notifier: records every delivery and can fail for chosen users.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use smyslov_core::model::{RoomCode, UserId};
use smyslov_core::notifier::{DeliveryError, Notice, Notifier};

/// A recorded delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Sent to one user.
    Player(UserId, Notice),
    /// Sent to a room, optionally excluding one member.
    Room {
        /// Target room.
        room_code: RoomCode,
        /// Member left out of the broadcast.
        exclude: Option<UserId>,
        /// The notice.
        notice: Notice,
    },
}

/// A notifier that records successful deliveries. Deliveries to users marked
/// with [`RecordingNotifier::fail_for`] return `DeliveryError::Unreachable`
/// and are not recorded.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
    unreachable: Mutex<HashSet<UserId>>,
}

impl RecordingNotifier {
    /// Create a notifier that delivers everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries to `user_id` fail from now on.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_for(&self, user_id: UserId) {
        self.unreachable.lock().unwrap().insert(user_id);
    }

    /// Snapshot of all recorded deliveries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    /// Notices delivered directly to `user_id`.
    pub fn notices_for(&self, user_id: UserId) -> Vec<Notice> {
        self.deliveries()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Player(to, notice) if to == user_id => Some(notice),
                _ => None,
            })
            .collect()
    }

    /// Notices broadcast to `room_code`.
    pub fn room_notices(&self, room_code: &RoomCode) -> Vec<Notice> {
        self.deliveries()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Room {
                    room_code: to,
                    notice,
                    ..
                } if &to == room_code => Some(notice),
                _ => None,
            })
            .collect()
    }

    /// Waits (in real time, up to five seconds) until `predicate` holds over
    /// the recorded deliveries.
    ///
    /// # Panics
    ///
    /// Panics if the predicate does not hold in time.
    pub async fn wait_until<F>(&self, predicate: F)
    where
        F: Fn(&[Delivery]) -> bool,
    {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while !predicate(&self.deliveries()) {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "condition not met; deliveries: {:?}",
            self.deliveries()
        );
    }

    fn reachable(&self, user_id: UserId) -> Result<(), DeliveryError> {
        if self.unreachable.lock().unwrap().contains(&user_id) {
            return Err(DeliveryError::Unreachable(user_id));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_player(&self, user_id: UserId, notice: &Notice) -> Result<(), DeliveryError> {
        self.reachable(user_id)?;
        self.deliveries
            .lock()
            .unwrap()
            .push(Delivery::Player(user_id, notice.clone()));
        Ok(())
    }

    async fn notify_room(
        &self,
        room_code: &RoomCode,
        notice: &Notice,
        exclude: Option<UserId>,
    ) -> Result<(), DeliveryError> {
        self.deliveries.lock().unwrap().push(Delivery::Room {
            room_code: room_code.clone(),
            exclude,
            notice: notice.clone(),
        });
        Ok(())
    }
}
