//! Single writer for the sqlite database.
//!
//! sqlite only tolerates one writer at a time, so every mutation in the
//! process is sent here as a job and run on one dedicated thread that owns the
//! only writeable connection. Jobs run strictly one at a time in the order they
//! were queued. A failing job never stops the writer.
//!
//! There is no graceful drain, jobs still queued when the process exits are
//! lost.

use crate::errors::{Error, Result};
use crate::{Database, WriteableConn};

use log::{error, info, warn};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type Job = Box<dyn FnOnce(&mut WriteableConn) + Send>;

/// Handle for queueing writes, cheap to clone.
#[derive(Debug, Clone)]
pub struct Writer {
    sender: mpsc::UnboundedSender<Job>,
}

/// Result of a queued job, resolves once the writer has run it.
#[derive(Debug)]
#[must_use = "the job still runs if dropped, but its result is lost"]
pub struct Pending<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::JobDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Writer {
    /// Opens the writeable connection and starts the writer thread. Should be
    /// called once at startup, the thread lives until every `Writer` clone is
    /// dropped.
    pub fn start(database: &Database) -> Result<Writer> {
        let mut conn = database.writeable()?;
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        thread::Builder::new()
            .name(String::from("db-writer"))
            .spawn(move || {
                info!("db writer started");
                while let Some(job) = receiver.blocking_recv() {
                    if panic::catch_unwind(AssertUnwindSafe(|| job(&mut conn))).is_err() {
                        error!("db write job panicked, moving on to next job");
                    }
                }
                info!("db writer stopped");
            })?;

        Ok(Writer { sender })
    }

    /// Queues a job. The job runs whether or not the returned [`Pending`] is
    /// awaited.
    pub fn submit<F, T>(&self, f: F) -> Pending<T>
    where
        F: FnOnce(&mut WriteableConn) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, receiver) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // receiver may be gone if nobody cares about the result
            let _ = tx.send(f(conn));
        });

        if self.sender.send(job).is_err() {
            // job (and its sender) dropped here, so the Pending resolves to JobDropped
            warn!("db writer is not running, dropping write job");
        }

        Pending { receiver }
    }

    /// Queues a job and waits until the writer has run it.
    #[inline]
    pub async fn submit_sync<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteableConn) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(f).await
    }

    /// Queues a job and returns straight away. Errors are logged with `label`
    /// and otherwise dropped. The returned handle can be ignored, it only
    /// resolves after the job ran.
    pub fn submit_async<F, T>(&self, label: &'static str, f: F) -> JoinHandle<()>
    where
        F: FnOnce(&mut WriteableConn) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pending = self.submit(f);
        tokio::spawn(async move {
            if let Err(why) = pending.await {
                error!("Error processing write {label}: {why}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::GetConnectionImmutable;
    use crate::test_utils::TestDb;
    use crate::{ReadOnlyDb, WriteableDb};
    use serenity::model::id::{ChannelId, GuildId, MessageId};

    fn insert(conn: &mut WriteableConn, message: u64, link: &str) -> Result<bool> {
        Ok(conn.insert_message_link(
            MessageId(message),
            ChannelId(1),
            GuildId(1),
            link,
            None,
        )?)
    }

    #[tokio::test]
    async fn test_submit_sync_returns_job_result() {
        let test_db = TestDb::new();
        let writer = Writer::start(&test_db.db).unwrap();

        let created = writer
            .submit_sync(|conn| insert(conn, 1, "link"))
            .await
            .unwrap();
        assert!(created);

        let created = writer
            .submit_sync(|conn| insert(conn, 1, "link"))
            .await
            .unwrap();
        assert!(!created);
    }

    #[tokio::test]
    async fn test_job_error_does_not_stop_writer() {
        let test_db = TestDb::new();
        let writer = Writer::start(&test_db.db).unwrap();

        let result = writer
            .submit_sync(|conn| {
                conn.execute("INSERT INTO no_such_table VALUES (1)", [])?;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::Rusqlite(_))));

        let result = writer
            .submit_sync(|_conn| -> Result<()> { panic!("job blew up") })
            .await;
        assert!(matches!(result, Err(Error::JobDropped)));

        // writer is still alive and processing
        assert!(writer
            .submit_sync(|conn| insert(conn, 1, "after"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_submit_async_runs_in_order() {
        let test_db = TestDb::new();
        let writer = Writer::start(&test_db.db).unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| writer.submit_async("test insert", move |conn| insert(conn, 1, &i.to_string())))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let links: Vec<String> = test_db
            .db
            .read_only()
            .unwrap()
            .get_message_links(MessageId(1))
            .unwrap()
            .into_iter()
            .map(|l| l.link)
            .collect();
        let expected: Vec<String> = (0..20).map(|i: i32| i.to_string()).collect();
        assert_eq!(links, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_jobs_never_interleave() {
        let test_db = TestDb::new();
        let writer = Writer::start(&test_db.db).unwrap();

        // each job writes a begin and an end row, if two jobs interleaved the
        // rows of one would be split by rows of another
        let mut producers = Vec::new();
        for producer in 0..8u64 {
            let writer = writer.clone();
            producers.push(tokio::spawn(async move {
                let mut observers = Vec::new();
                for job in 0..10u64 {
                    let id = producer * 100 + job;
                    observers.push(writer.submit_async("paired insert", move |conn| {
                        insert(conn, 1, &format!("{id}-begin"))?;
                        std::thread::yield_now();
                        insert(conn, 1, &format!("{id}-end"))
                    }));
                }
                for observer in observers {
                    observer.await.unwrap();
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        let links = test_db
            .db
            .read_only()
            .unwrap()
            .get_message_links(MessageId(1))
            .unwrap();
        assert_eq!(links.len(), 8 * 10 * 2);
        for pair in links.chunks(2) {
            let begin = pair[0].link.strip_suffix("-begin").unwrap();
            let end = pair[1].link.strip_suffix("-end").unwrap();
            assert_eq!(begin, end);
        }
    }

    #[tokio::test]
    async fn test_submit_after_writer_gone() {
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        drop(receiver);
        let writer = Writer { sender };

        let result = writer.submit_sync(|_conn| Ok(())).await;
        assert!(matches!(result, Err(Error::JobDropped)));
    }
}
