//! Téléchargement de l'archive

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

/// Erreurs du téléchargement
#[derive(Debug, Error)]
pub enum FetchError {
    /// Erreur réseau ou HTTP
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Réponse non 2xx
    #[error("HTTP request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Lecture d'un fichier local
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source de l'archive: retourne le contenu complet
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// GET HTTP unique, sans retry
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        debug!(url, status = %status, content_length = ?resp.content_length(), "Response received");
        let body = resp.bytes().await?;
        info!(url, bytes = body.len(), "Download complete");
        Ok(body)
    }
}

/// Lecture d'un fichier local (`file://` ou chemin)
pub struct FileFetcher;

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        let data = tokio::fs::read(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), bytes = data.len(), "Archive read from disk");
        Ok(Bytes::from(data))
    }
}

/// Choisit le fetcher selon le schéma de l'URL
pub fn fetcher_for(url: &str) -> Result<Box<dyn Fetcher>, FetchError> {
    if is_http_url(url) {
        Ok(Box::new(HttpFetcher::new()?))
    } else {
        Ok(Box::new(FileFetcher))
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serveur HTTP minimal qui répond une seule fois avec `response`
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/tl_2020_us_zcta520.zip", addr)
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://www2.census.gov/geo/tiger/x.zip"));
        assert!(is_http_url("HTTP://localhost/x.zip"));
        assert!(!is_http_url("file:///tmp/x.zip"));
        assert!(!is_http_url("data/x.zip"));
    }

    #[tokio::test]
    async fn test_http_fetch_success() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nPK\x03\x04!",
        )
        .await;

        let body = HttpFetcher::new().unwrap().fetch(&url).await.unwrap();
        assert_eq!(&body[..], b"PK\x03\x04!");
    }

    #[tokio::test]
    async fn test_http_fetch_rejects_404() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nNot Found",
        )
        .await;

        let result = HttpFetcher::new().unwrap().fetch(&url).await;
        match result {
            Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
            other => panic!("Expected Status error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn test_file_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        std::fs::write(&path, b"zip bytes").unwrap();

        let plain = FileFetcher.fetch(path.to_str().unwrap()).await.unwrap();
        let url = format!("file://{}", path.display());
        let prefixed = FileFetcher.fetch(&url).await.unwrap();

        assert_eq!(&plain[..], b"zip bytes");
        assert_eq!(plain, prefixed);
    }

    #[tokio::test]
    async fn test_file_fetch_missing() {
        let result = FileFetcher.fetch("/nonexistent/archive.zip").await;
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }
}
