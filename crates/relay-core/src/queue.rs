//! Fixed-capacity slotted queues shared by the TX scheduler and RX dispatcher.
//!
//! Slot position carries no meaning: selection is always by priority, then
//! by age (smallest sequence number). A `Vec<Option<T>>` gives the
//! empty/occupied transition for free via [`Option::take`] and keeps the scan
//! cost-bounded by `capacity`, which is small by design.

use relay_proto::Message;

use crate::{error::QueueError, status::StatusTracker};

/// An entry with a priority and a sequence number, the two fields every
/// slotted queue selects on.
pub trait Slotted {
    /// Selection priority; higher is more urgent.
    fn priority(&self) -> u8;
    /// Monotonic sequence number; smaller is older.
    fn sequence(&self) -> u32;
}

/// A fixed-capacity collection of optionally-occupied slots.
#[derive(Debug)]
pub struct SlotQueue<T> {
    slots: Vec<Option<T>>,
}

impl<T: Slotted> SlotQueue<T> {
    /// Construct an empty queue with `capacity` slots.
    #[must_use]
    pub fn new(capacity: u16) -> Self {
        Self { slots: (0..capacity).map(|_| None).collect() }
    }

    /// Total slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Count of occupied slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Insert `entry` into the first empty slot.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`]-shaped information via `Err(entry)` if no
    /// slot is empty; the caller regains ownership of `entry`.
    pub fn try_insert(&mut self, entry: T) -> Result<(), T> {
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => {
                *slot = Some(entry);
                Ok(())
            },
            None => Err(entry),
        }
    }

    /// Grow or shrink capacity.
    ///
    /// Growing preserves all existing entries; shrinking below the current
    /// occupancy is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::WouldTruncate`] if `new_capacity < self.occupied()`.
    pub fn resize(&mut self, new_capacity: u16) -> Result<(), QueueError> {
        let new_capacity = new_capacity as usize;
        let occupied = self.occupied();
        if new_capacity < occupied {
            return Err(QueueError::WouldTruncate { requested: new_capacity, occupied });
        }
        if new_capacity > self.slots.len() {
            self.slots.resize_with(new_capacity, || None);
        } else {
            self.slots.truncate(new_capacity);
        }
        Ok(())
    }

    /// Remove and return the entry at `index`, leaving the slot empty.
    pub fn take(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Borrow the entry at `index`, if occupied.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutably borrow the entry at `index`, if occupied.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Iterate over `(index, entry)` for every occupied slot.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| s.as_ref().map(|e| (i, e)))
    }

    /// Iterate mutably over `(index, entry)` for every occupied slot.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| s.as_mut().map(|e| (i, e)))
    }

    /// Find the index of the slot matching `predicate` with the highest
    /// priority, breaking ties by smallest sequence number (oldest).
    pub fn select<F: Fn(&T) -> bool>(&self, predicate: F) -> Option<usize> {
        self.iter()
            .filter(|(_, entry)| predicate(entry))
            .max_by_key(|(_, entry)| (entry.priority(), std::cmp::Reverse(entry.sequence())))
            .map(|(i, _)| i)
    }
}

/// A queued outbound message awaiting (re)transmission.
#[derive(Debug)]
pub struct TxEntry {
    /// The message being sent.
    pub message: Message,
    /// Sequence number assigned at enqueue time.
    pub sequence: u32,
    /// Whether the peer must acknowledge this message.
    pub receipt_required: bool,
    /// Number of times this entry has been transmitted so far.
    pub n_transmissions: u8,
    /// Milliseconds timestamp of the most recent transmission.
    pub last_tx_timestamp_ms: u64,
    /// Current lifecycle status.
    pub status: crate::status::Status,
    /// Optional shared cell mirroring `status` for the application to observe.
    pub tracker: Option<StatusTracker>,
}

impl TxEntry {
    /// Update `status` and mirror the change into `tracker`, if present.
    pub fn set_status(&mut self, status: crate::status::Status) {
        self.status = status;
        if let Some(tracker) = &self.tracker {
            if let Ok(mut guard) = tracker.lock() {
                *guard = status;
            }
        }
    }
}

impl Slotted for TxEntry {
    fn priority(&self) -> u8 {
        self.message.priority()
    }

    fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// A delivered inbound message awaiting collection via [`crate::Communicator::receive`].
#[derive(Debug)]
pub struct RxEntry {
    /// The received message.
    pub message: Message,
    /// Sequence number as assigned by the sender's communicator.
    pub sequence: u32,
}

impl Slotted for RxEntry {
    fn priority(&self) -> u8 {
        self.message.priority()
    }

    fn sequence(&self) -> u32 {
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    fn entry(sequence: u32, priority: u8) -> TxEntry {
        TxEntry {
            message: Message::empty(1).with_priority(priority),
            sequence,
            receipt_required: false,
            n_transmissions: 0,
            last_tx_timestamp_ms: 0,
            status: Status::Queued,
            tracker: None,
        }
    }

    #[test]
    fn insert_into_empty_slot_then_full() {
        let mut q: SlotQueue<TxEntry> = SlotQueue::new(2);
        assert!(q.try_insert(entry(0, 0)).is_ok());
        assert!(q.try_insert(entry(1, 0)).is_ok());
        let rejected = q.try_insert(entry(2, 0));
        assert!(rejected.is_err());
        assert_eq!(q.occupied(), 2);
    }

    #[test]
    fn select_picks_highest_priority_then_oldest() {
        let mut q: SlotQueue<TxEntry> = SlotQueue::new(4);
        q.try_insert(entry(5, 2)).unwrap();
        q.try_insert(entry(9, 7)).unwrap();
        q.try_insert(entry(1, 7)).unwrap();

        let chosen = q.select(|_| true).unwrap();
        let chosen_entry = q.get(chosen).unwrap();
        assert_eq!(chosen_entry.priority(), 7);
        assert_eq!(chosen_entry.sequence(), 1);
    }

    #[test]
    fn resize_rejects_truncation_below_occupancy() {
        let mut q: SlotQueue<TxEntry> = SlotQueue::new(2);
        q.try_insert(entry(0, 0)).unwrap();
        q.try_insert(entry(1, 0)).unwrap();
        assert!(matches!(q.resize(1), Err(QueueError::WouldTruncate { .. })));
        assert!(q.resize(3).is_ok());
        assert_eq!(q.capacity(), 3);
    }

    #[test]
    fn take_frees_the_slot() {
        let mut q: SlotQueue<TxEntry> = SlotQueue::new(1);
        q.try_insert(entry(0, 0)).unwrap();
        assert_eq!(q.occupied(), 1);
        assert!(q.take(0).is_some());
        assert_eq!(q.occupied(), 0);
    }
}
