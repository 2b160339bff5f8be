use crate::config::ImapSettings;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::io::{AsyncRead, AsyncWrite};
use futures::StreamExt;
use std::fmt::Debug;
use std::future::Future;
use tokio::net::TcpStream;
use tokio_native_tls::native_tls::TlsConnector;
use tokio_util::compat::TokioAsyncReadCompatExt;

/// A fully downloaded message, still in wire format.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub seq: u32,
    pub uid: Option<u32>,
    pub body: Vec<u8>,
}

/// Where unseen mail comes from. Fetching is expected to mark the returned
/// messages as seen.
pub trait MailSource: Send + Sync {
    fn fetch_unseen(&self) -> impl Future<Output = Result<Vec<RawMessage>>> + Send;
}

#[derive(Clone)]
pub struct ImapMailbox {
    settings: ImapSettings,
}

impl ImapMailbox {
    pub fn new(settings: ImapSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ImapSettings {
        &self.settings
    }

    async fn connect_and_fetch(&self) -> Result<Vec<RawMessage>> {
        let s = &self.settings;
        tracing::debug!(host = %s.host, port = s.port, tls = s.tls, "Connecting to IMAP");

        let tcp = TcpStream::connect((s.host.as_str(), s.port)).await?;
        if s.tls {
            let tls = TlsConnector::builder().build()?;
            let tls = tokio_native_tls::TlsConnector::from(tls);
            let tls_stream = tls.connect(&s.host, tcp).await?;
            let client = async_imap::Client::new(tls_stream.compat());
            let session = client
                .login(&s.user, &s.password)
                .await
                .map_err(|(e, _)| e)?;
            fetch_unseen_with(session, s).await
        } else {
            let client = async_imap::Client::new(tcp.compat());
            let session = client
                .login(&s.user, &s.password)
                .await
                .map_err(|(e, _)| e)?;
            fetch_unseen_with(session, s).await
        }
    }
}

impl MailSource for ImapMailbox {
    async fn fetch_unseen(&self) -> Result<Vec<RawMessage>> {
        let limit = self.settings.timeout;
        tokio::time::timeout(limit, self.connect_and_fetch())
            .await
            .map_err(|_| Error::Timeout(format!("IMAP session exceeded {:?}", limit)))?
    }
}

/// Select the mailbox read-write, search UNSEEN and pull the newest
/// `fetch_limit` messages. `RFC822` (not `BODY.PEEK[]`) so the server sets
/// `\Seen` on everything fetched.
async fn fetch_unseen_with<T>(mut session: Session<T>, s: &ImapSettings) -> Result<Vec<RawMessage>>
where
    T: AsyncRead + AsyncWrite + Unpin + Debug + Send,
{
    session.select(&s.mailbox).await?;

    let unseen: Vec<u32> = session.search("UNSEEN").await?.into_iter().collect();
    let total = unseen.len();
    let batch = newest(unseen, s.fetch_limit);

    tracing::info!(
        mailbox = %s.mailbox,
        unseen = total,
        fetching = batch.len(),
        "IMAP search complete"
    );

    let mut messages = Vec::with_capacity(batch.len());
    if !batch.is_empty() {
        let seq_set = batch
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let fetches = session.fetch(&seq_set, "(UID RFC822)").await?;
        futures::pin_mut!(fetches);
        while let Some(item) = fetches.next().await {
            let fetch = item?;
            match fetch.body() {
                Some(body) => messages.push(RawMessage {
                    seq: fetch.message,
                    uid: fetch.uid,
                    body: body.to_vec(),
                }),
                None => tracing::warn!(seq = fetch.message, "FETCH response without body"),
            }
        }
    }

    if let Err(e) = session.logout().await {
        tracing::debug!(error = %e, "IMAP logout failed");
    }
    Ok(messages)
}

/// The `limit` highest sequence numbers, ascending.
pub fn newest(mut unseen: Vec<u32>, limit: usize) -> Vec<u32> {
    unseen.sort_unstable();
    let skip = unseen.len().saturating_sub(limit);
    unseen.split_off(skip)
}
