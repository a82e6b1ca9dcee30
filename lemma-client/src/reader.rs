use crate::error::Result;
use crate::pipeline::Emission;
use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pull-based view over one lemmatization run.
///
/// Lemmas come out in the order their words appeared in the input; words
/// without a lemma are skipped. Once the input is exhausted [`next`] returns
/// `None`, and keeps returning `None`. A reader can't be restarted: lemmatize
/// the input again to get a fresh one.
///
/// Dropping the reader stops its pipeline.
///
/// [`next`]: LemmaReader::next
pub struct LemmaReader {
    rx: mpsc::Receiver<Emission>,
    pipeline: JoinHandle<()>,
    done: bool,
}

impl LemmaReader {
    pub(crate) fn new(rx: mpsc::Receiver<Emission>, pipeline: JoinHandle<()>) -> Self {
        Self {
            rx,
            pipeline,
            done: false,
        }
    }

    /// Wait for the next lemma. `None` means the input is exhausted.
    ///
    /// An `Err` item appears with a bounded retry policy, and takes the place
    /// of the word that could not be resolved. A failed worker also shows up
    /// as an `Err`, after which the reader is done.
    pub async fn next(&mut self) -> Option<Result<String>> {
        if self.done {
            return None;
        }

        match self.rx.recv().await {
            Some(Emission::Lemma(lemma)) => Some(Ok(lemma)),
            Some(Emission::Failed(err)) => Some(Err(err)),
            Some(Emission::Finished) | None => {
                self.done = true;
                None
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Drain the reader, stopping at the first error.
    pub async fn collect_lemmas(mut self) -> Result<Vec<String>> {
        let mut lemmas = vec![];
        while let Some(lemma) = self.next().await {
            lemmas.push(lemma?);
        }
        Ok(lemmas)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<String>> + Send + Unpin {
        Box::pin(stream::unfold(self, |mut reader| async move {
            let item = reader.next().await?;
            Some((item, reader))
        }))
    }
}

impl Drop for LemmaReader {
    fn drop(&mut self) {
        if !self.done {
            self.pipeline.abort();
        }
    }
}
