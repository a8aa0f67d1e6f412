use web_time::{Duration, Instant};

use crate::{EntityId, StateKey, Value};

pub(crate) struct PendingWrite {
    pub key: StateKey,
    pub value: Value,
}

/// Buffer of deferred writes plus the deadline of the flush that will
/// deliver them.
///
/// A deadline exists iff the buffer is non-empty. Keys keep the position of
/// their first insertion; later writes only replace the value.
#[derive(Default)]
pub(crate) struct UpdateScheduler {
    buffer: Vec<PendingWrite>,
    deadline: Option<Instant>,
}

impl UpdateScheduler {
    /// Buffers a write. Returns true if this write scheduled a new flush.
    pub fn enqueue(
        &mut self,
        owner: EntityId,
        name: &str,
        value: Value,
        now: Instant,
        window: Duration,
    ) -> bool {
        match self.buffer.iter_mut().find(|w| w.key.matches(owner, name)) {
            Some(w) => w.value = value,
            None => self.buffer.push(PendingWrite {
                key: StateKey::new(owner, name),
                value,
            }),
        }
        if self.deadline.is_none() {
            self.deadline = Some(now + window);
            return true;
        }
        false
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Swaps out the buffer if its flush is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<PendingWrite>> {
        match self.deadline {
            Some(at) if at <= now => self.take(),
            _ => None,
        }
    }

    /// Swaps out the buffer regardless of the deadline.
    pub fn take(&mut self) -> Option<Vec<PendingWrite>> {
        self.deadline.take()?;
        Some(std::mem::take(&mut self.buffer))
    }

    pub fn purge_owner(&mut self, owner: EntityId) {
        self.buffer.retain(|w| w.key.owner != owner);
        if self.buffer.is_empty() {
            self.deadline = None;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use slotmap::SlotMap;

    #[test]
    fn last_write_wins_and_first_insertion_order_is_kept() {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        let owner = map.insert(());
        let t0 = Instant::now();
        let window = Duration::from_millis(1);
        let mut s = UpdateScheduler::default();

        assert!(s.enqueue(owner, "a", value(1), t0, window));
        assert!(!s.enqueue(owner, "b", value(10), t0, window));
        assert!(!s.enqueue(owner, "a", value(3), t0, window));

        assert!(s.take_due(t0).is_none());
        let writes = s.take_due(t0 + window).expect("due");
        let got: Vec<(String, i32)> = writes
            .iter()
            .map(|w| (w.key.name.to_string(), w.value.get::<i32>().unwrap()))
            .collect();
        assert_eq!(got, [("a".to_string(), 3), ("b".to_string(), 10)]);
        assert!(s.deadline().is_none());
        assert_eq!(s.len(), 0);
    }
}
