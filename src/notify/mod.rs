// src/notify/mod.rs
pub mod slack;

use std::time::Duration;

use anyhow::{Context, Result};

pub use slack::SlackNotifier;

/// Delivery boundary: one blocking send per pre-chunked text block.
#[async_trait::async_trait]
pub trait Notifier {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Send chunks in order with a short pause between them. A failed chunk
/// aborts the remainder and surfaces the error; partial delivery must never
/// be silent.
pub async fn deliver_chunks(
    notifier: &dyn Notifier,
    chunks: &[String],
    pause: Duration,
) -> Result<()> {
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(pause).await;
        }
        notifier
            .send(chunk)
            .await
            .with_context(|| format!("delivering digest chunk {}/{}", i + 1, chunks.len()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakySink {
        sent: Mutex<Vec<String>>,
        fail_at: usize,
    }

    #[async_trait::async_trait]
    impl Notifier for FlakySink {
        async fn send(&self, text: &str) -> Result<()> {
            let mut sent = self.sent.lock().unwrap();
            if sent.len() == self.fail_at {
                anyhow::bail!("webhook returned 500");
            }
            sent.push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn chunks_go_out_in_order() {
        let sink = FlakySink {
            sent: Mutex::new(Vec::new()),
            fail_at: usize::MAX,
        };
        let chunks = vec!["one".to_string(), "two".to_string()];
        deliver_chunks(&sink, &chunks, Duration::ZERO).await.unwrap();
        assert_eq!(*sink.sent.lock().unwrap(), chunks);
    }

    #[tokio::test]
    async fn a_failed_chunk_aborts_the_remainder() {
        let sink = FlakySink {
            sent: Mutex::new(Vec::new()),
            fail_at: 1,
        };
        let chunks = vec!["one".into(), "two".into(), "three".into()];
        let err = deliver_chunks(&sink, &chunks, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("chunk 2/3"));
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }
}
