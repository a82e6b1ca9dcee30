//! Ordered, bounded-concurrency dispatch of tokens through the cache.
//!
//! `concurrency` workers pull tokens from one shared source. Each token gets
//! its sequence number at the moment it is pulled, so numbering follows input
//! order. Workers resolve their words concurrently, then wait for their turn:
//! a shared counter holds the sequence number allowed to emit next. The
//! worker whose number matches emits (or skips an empty resolution) and
//! advances the counter, passing the turn to the next position. Resolution
//! is never gated by the turn, only emission is.

use crate::cache::{Resolution, SharedLemmaCache};
use crate::error::Error;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

/// What the pipeline sends downstream to the reader.
#[derive(Debug)]
pub(crate) enum Emission {
    Lemma(String),
    Failed(Error),
    /// Sent once, after every worker has exited.
    Finished,
}

/// Hands out tokens with their sequence numbers, in arrival order.
struct Sequencer<I> {
    tokens: I,
    next_seq: usize,
}

impl<I: Iterator<Item = String>> Sequencer<I> {
    fn next(&mut self) -> Option<(usize, String)> {
        let word = self.tokens.by_ref().find(|token| !token.is_empty())?;
        let seq = self.next_seq;
        self.next_seq += 1;
        Some((seq, word))
    }
}

type SharedSequencer<I> = Arc<Mutex<Sequencer<I>>>;

fn next_token<I: Iterator<Item = String>>(input: &SharedSequencer<I>) -> Option<(usize, String)> {
    input.lock().unwrap_or_else(PoisonError::into_inner).next()
}

/// The right to emit, expressed as "the sequence number whose turn it is".
#[derive(Clone)]
struct Turn {
    tx: Arc<watch::Sender<usize>>,
    rx: watch::Receiver<usize>,
}

impl Turn {
    fn new() -> Self {
        let (tx, rx) = watch::channel(0);
        Self { tx: Arc::new(tx), rx }
    }

    async fn wait_for(&mut self, seq: usize) {
        // the sender lives in `self`, so the channel can't close under us
        if self.rx.wait_for(|turn| *turn == seq).await.is_err() {
            log::error!("Turn channel closed while waiting for turn {}", seq);
        }
    }

    fn pass(&self, seq: usize) {
        self.tx.send_replace(seq + 1);
    }
}

/// Start the pipeline for `tokens`. Results arrive on `out` in input order,
/// followed by a single [`Emission::Finished`].
pub(crate) fn spawn<I>(
    tokens: I,
    cache: SharedLemmaCache,
    concurrency: usize,
    out: mpsc::Sender<Emission>,
) -> JoinHandle<()>
where
    I: Iterator<Item = String> + Send + 'static,
{
    let input = Arc::new(Mutex::new(Sequencer {
        tokens,
        next_seq: 0,
    }));
    let turn = Turn::new();

    tokio::spawn(async move {
        let mut workers = JoinSet::new();
        for id in 0..concurrency.max(1) {
            workers.spawn(run_worker(
                id,
                input.clone(),
                cache.clone(),
                turn.clone(),
                out.clone(),
            ));
        }

        while let Some(joined) = workers.join_next().await {
            let Err(err) = joined else { continue };

            // The failed worker held a turn it will never pass; nobody after
            // it can emit, so stop the rest and report in its place.
            log::error!("Lemmatizer worker failed: {}", err);
            workers.abort_all();
            while workers.join_next().await.is_some() {}

            let _ = out
                .send(Emission::Failed(Error::WorkerFailed(err.to_string())))
                .await;
            break;
        }

        log::debug!("All workers finished");
        let _ = out.send(Emission::Finished).await;
    })
}

async fn run_worker<I>(
    id: usize,
    input: SharedSequencer<I>,
    cache: SharedLemmaCache,
    mut turn: Turn,
    out: mpsc::Sender<Emission>,
) where
    I: Iterator<Item = String>,
{
    let mut downstream_open = true;

    while let Some((seq, word)) = next_token(&input) {
        log::debug!("worker #{} word '{}' (#{}): get from cache", id, word, seq);
        let resolution = cache.get(&word).await;

        log::debug!("worker #{} word '{}': waiting for turn {}", id, word, seq);
        turn.wait_for(seq).await;

        if let Some(emission) = emission_for(resolution) {
            if downstream_open && out.send(emission).await.is_err() {
                log::debug!("worker #{}: reader dropped, discarding output", id);
                downstream_open = false;
            }
        }

        log::debug!("worker #{} word '{}': passing turn to {}", id, word, seq + 1);
        turn.pass(seq);
    }

    log::debug!("worker #{}: input exhausted, exiting", id);
}

fn emission_for(resolution: Resolution) -> Option<Emission> {
    match resolution {
        Ok(Some(lemma)) if !lemma.is_empty() => Some(Emission::Lemma(lemma)),
        Ok(_) => None,
        Err(err) => Some(Emission::Failed(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LemmaCache;
    use crate::retry::{LemmaLoader, RetryPolicy};
    use crate::tests::MockLookup;
    use std::time::Duration;

    async fn drain(mut rx: mpsc::Receiver<Emission>) -> (Vec<String>, usize) {
        let mut lemmas = vec![];
        let mut finished = 0;
        while let Some(emission) = rx.recv().await {
            match emission {
                Emission::Lemma(lemma) => lemmas.push(lemma),
                Emission::Failed(err) => panic!("unexpected failure: {}", err),
                Emission::Finished => finished += 1,
            }
        }
        (lemmas, finished)
    }

    fn cache_for(lookup: Arc<MockLookup>) -> SharedLemmaCache {
        let loader = LemmaLoader::new(lookup, RetryPolicy::default());
        Arc::new(LemmaCache::new(100, loader).unwrap())
    }

    #[test]
    fn test_sequencer_numbers_in_arrival_order() {
        let tokens = vec!["et".to_string(), String::new(), "est".to_string()];
        let mut sequencer = Sequencer {
            tokens: tokens.into_iter(),
            next_seq: 0,
        };

        assert_eq!(sequencer.next(), Some((0, "et".to_string())));
        assert_eq!(sequencer.next(), Some((1, "est".to_string())));
        assert_eq!(sequencer.next(), None);
    }

    #[tokio::test]
    async fn test_turn_only_opens_in_order() {
        let mut first = Turn::new();
        let mut second = first.clone();

        let waiting = tokio::spawn(async move {
            second.wait_for(1).await;
        });
        tokio::task::yield_now().await;
        assert!(!waiting.is_finished());

        first.wait_for(0).await;
        first.pass(0);
        waiting.await.unwrap();
        assert_eq!(*first.rx.borrow(), 1);
    }

    #[tokio::test]
    async fn test_finished_is_sent_once_after_all_output() {
        let lookup = Arc::new(MockLookup::latin().with_latency(0, 20));
        let (tx, rx) = mpsc::channel(1);
        let tokens = ["et", "oratio", "conviciis", "est"].map(String::from);

        let handle = spawn(tokens.into_iter(), cache_for(lookup), 3, tx);
        let (lemmas, finished) = drain(rx).await;
        handle.await.unwrap();

        assert_eq!(lemmas, vec!["et", "oratio", "convicium", "sum"]);
        assert_eq!(finished, 1);
    }

    #[tokio::test]
    async fn test_more_workers_than_tokens() {
        let lookup = Arc::new(MockLookup::latin());
        let (tx, rx) = mpsc::channel(1);

        spawn(vec!["est".to_string()].into_iter(), cache_for(lookup), 10, tx);
        let (lemmas, finished) = drain(rx).await;

        assert_eq!(lemmas, vec!["sum"]);
        assert_eq!(finished, 1);
    }

    struct PanicsOn(&'static str);

    #[async_trait::async_trait]
    impl crate::client::LemmaLookup for PanicsOn {
        async fn lookup(
            &self,
            word: &str,
        ) -> std::result::Result<Option<String>, crate::error::LookupError> {
            if word == self.0 {
                panic!("lookup of '{}' blew up", word);
            }
            Ok(Some(word.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_failed_worker_reports_in_place_and_finishes() {
        let loader = LemmaLoader::new(Arc::new(PanicsOn("b")), RetryPolicy::default());
        let cache = Arc::new(LemmaCache::new(100, loader).unwrap());
        let (tx, mut rx) = mpsc::channel(1);
        let tokens = ["a", "b", "c"].map(String::from);

        let handle = spawn(tokens.into_iter(), cache, 2, tx);

        let emissions = tokio::time::timeout(Duration::from_secs(5), async {
            let mut emissions = vec![];
            while let Some(emission) = rx.recv().await {
                emissions.push(emission);
            }
            emissions
        })
        .await
        .expect("pipeline hung after a worker failure");
        handle.await.unwrap();

        assert_eq!(emissions.len(), 3, "{:?}", emissions);
        assert!(matches!(&emissions[0], Emission::Lemma(lemma) if lemma == "A"));
        assert!(matches!(&emissions[1], Emission::Failed(Error::WorkerFailed(_))));
        assert!(matches!(emissions[2], Emission::Finished));
    }

    #[tokio::test]
    async fn test_empty_input_only_finishes() {
        let lookup = Arc::new(MockLookup::latin());
        let (tx, rx) = mpsc::channel(1);

        spawn(Vec::new().into_iter(), cache_for(lookup.clone()), 4, tx);
        let (lemmas, finished) = drain(rx).await;

        assert!(lemmas.is_empty());
        assert_eq!(finished, 1);
        assert_eq!(lookup.total_calls(), 0);
    }
}
