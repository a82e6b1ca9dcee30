use crate::cache::Resolution;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;

/// The role a caller takes for a word that missed the cache.
pub(crate) enum Flight {
    /// No load was running; the caller must run it and call [`InFlight::complete`].
    Leader,
    /// A load is already running; its result arrives on this channel. A
    /// closed channel means the leader went away before finishing.
    Waiter(oneshot::Receiver<Resolution>),
}

/// Registry of loads currently in progress, one per word.
///
/// When several callers miss the cache for the same word, only the first one
/// runs the loader and the rest are handed its result.
#[derive(Default)]
pub(crate) struct InFlight {
    pending: DashMap<String, Vec<oneshot::Sender<Resolution>>>,
}

impl InFlight {
    pub(crate) fn join(&self, word: &str) -> Flight {
        match self.pending.entry(word.to_string()) {
            Entry::Occupied(mut entry) => {
                log::debug!("Load already pending for word '{}'", word);
                let (tx, rx) = oneshot::channel();
                entry.get_mut().push(tx);
                Flight::Waiter(rx)
            }
            Entry::Vacant(entry) => {
                entry.insert(Vec::new());
                Flight::Leader
            }
        }
    }

    /// Ends the flight for `word` and returns whoever is waiting on it.
    pub(crate) fn complete(&self, word: &str) -> Vec<oneshot::Sender<Resolution>> {
        self.pending
            .remove(word)
            .map(|(_, waiters)| waiters)
            .unwrap_or_default()
    }

    /// Ends the flight for `word` without a result. Dropping the senders wakes
    /// every waiter so one of them can take over the load.
    pub(crate) fn abandon(&self, word: &str) {
        if let Some((_, waiters)) = self.pending.remove(word) {
            log::debug!(
                "Load for word '{}' abandoned with {} waiters",
                word,
                waiters.len()
            );
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn waiters(&self) -> usize {
        self.pending.iter().map(|entry| entry.value().len()).sum()
    }
}

/// Abandons the flight unless the leader reaches [`FlightGuard::disarm`],
/// so a cancelled leader never strands its waiters.
pub(crate) struct FlightGuard<'a> {
    in_flight: &'a InFlight,
    word: &'a str,
    armed: bool,
}

impl<'a> FlightGuard<'a> {
    pub(crate) fn new(in_flight: &'a InFlight, word: &'a str) -> Self {
        Self {
            in_flight,
            word,
            armed: true,
        }
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.in_flight.abandon(self.word);
        }
    }
}
