use crate::config::DUPLICATE_MESSAGE;
use crate::domain::early_access::{ClientInfo, EarlyAccessEntry, EmailAddress, normalize_email};
use crate::domain::ports::{EntryRepository, EntryRepositoryBox};
use crate::error::{AppError, Result};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

/// Number of requests that may wait for the writer before senders back off.
const QUEUE_DEPTH: usize = 64;

enum Command {
    Submit {
        email: EmailAddress,
        client: ClientInfo,
        reply: oneshot::Sender<Result<EarlyAccessEntry>>,
    },
    List {
        reply: oneshot::Sender<Result<Vec<EarlyAccessEntry>>>,
    },
}

/// The deduplicated early-access list.
///
/// A single writer task owns the repository and drains a FIFO queue, so at most
/// one load-check-append-replace sequence runs at a time no matter how many
/// callers submit concurrently. Handles are cheap to clone and all talk to the
/// same writer.
#[derive(Clone)]
pub struct EarlyAccessList {
    sender: mpsc::Sender<Command>,
}

impl EarlyAccessList {
    /// Starts the writer task. Must be called from within a tokio runtime.
    pub fn spawn(repository: EntryRepositoryBox) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(run_writer(repository, receiver));
        Self { sender }
    }

    /// Adds an email to the list.
    ///
    /// Malformed addresses are rejected with `InvalidInput` before the queue or
    /// the disk are touched; an address already on file yields `Duplicate` and
    /// leaves the store unchanged. Once queued, the write completes even if the
    /// caller stops waiting.
    pub async fn submit(&self, email: &str, client: ClientInfo) -> Result<EarlyAccessEntry> {
        let email = EmailAddress::parse(email)?;
        let (reply, response) = oneshot::channel();
        self.send(Command::Submit {
            email,
            client,
            reply,
        })
        .await?;
        response.await.map_err(|_| writer_gone())?
    }

    /// Returns all stored entries in insertion order.
    pub async fn entries(&self) -> Result<Vec<EarlyAccessEntry>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::List { reply }).await?;
        response.await.map_err(|_| writer_gone())?
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.sender.send(command).await.map_err(|_| writer_gone())
    }
}

fn writer_gone() -> AppError {
    AppError::Internal("early-access writer is not running".to_string())
}

async fn run_writer(repository: EntryRepositoryBox, mut receiver: mpsc::Receiver<Command>) {
    while let Some(command) = receiver.recv().await {
        match command {
            Command::Submit {
                email,
                client,
                reply,
            } => {
                let outcome = append_entry(repository.as_ref(), email, client).await;
                if let Err(e) = &outcome
                    && !matches!(e, AppError::Duplicate(_))
                {
                    tracing::error!(error = %e, "failed to store early-access signup");
                }
                let _ = reply.send(outcome);
            }
            Command::List { reply } => {
                let _ = reply.send(repository.load().await);
            }
        }
    }
}

async fn append_entry(
    repository: &dyn EntryRepository,
    email: EmailAddress,
    client: ClientInfo,
) -> Result<EarlyAccessEntry> {
    let mut entries = repository.load().await?;

    if entries
        .iter()
        .any(|e| normalize_email(&e.email) == email.as_str())
    {
        tracing::debug!(%email, "early-access email already on file");
        return Err(AppError::Duplicate(DUPLICATE_MESSAGE.to_string()));
    }

    let entry = EarlyAccessEntry::new(email, client, Utc::now());
    entries.push(entry.clone());
    repository.replace(&entries).await?;

    tracing::info!(email = %entry.email, total = entries.len(), "new early-access signup");
    Ok(entry)
}
